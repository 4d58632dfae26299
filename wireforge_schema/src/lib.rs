//! 契约描述模型
//!
//! 以显式描述符表达序列化语义：类型通过 [`WireContract`] 选择参与序列化，
//! 成员声明自己的线位号，基/派生类型通过保留槽位建立包含链接。
//! 描述符取代了源语言里基于注解反射的发现方式，语义保持一致：
//! 类型主动选入，成员可以选出，线位号显式给出。

use thiserror::Error;

pub mod adapter;
pub mod contract;
pub mod include;
pub mod member;
pub mod token;

pub use adapter::WireFormat;
pub use contract::{ContractDescriptor, WireContract};
pub use include::{InclusionDirection, InclusionLink};
pub use member::{MemberDescriptor, MemberKind};
pub use token::TypeToken;

/// 契约层错误类型
#[derive(Error, Debug)]
pub enum SchemaError {
    /// 线位号为 0
    #[error("非法的线位号: 类型 {0} 的成员 {1} 使用了 0 号位")]
    ZeroTag(&'static str, &'static str),

    /// 同一类型内线位号重复
    #[error("重复的线位号: 类型 {0} 中 {1} 号位被多次声明")]
    DuplicateTag(&'static str, u32),

    /// 同一类型内包含槽位重复
    #[error("重复的包含槽位: 类型 {0} 中 {1} 号槽位被多次声明")]
    DuplicateSlot(&'static str, u32),

    /// 类型将自身声明为包含关系
    #[error("类型 {0} 不能将自身声明为包含关系")]
    SelfInclude(&'static str),

    /// 包含槽位与已绑定的子类型冲突
    #[error("包含槽位冲突: 基类型 {0} 的 {1} 号槽位已被占用")]
    SlotConflict(&'static str, u32),

    /// 子类型链接构成环
    #[error("包含链接成环: {0} 已在 {1} 的子类型闭包中")]
    InclusionCycle(&'static str, &'static str),

    /// 契约重复提交
    #[error("契约已存在: {0}")]
    DuplicateContract(&'static str),

    /// 类型未提交到线上模型
    #[error("未注册的类型: {0}")]
    UnknownType(String),

    /// 运行时类型与契约不匹配
    #[error("类型不匹配: 期望 {0}")]
    TypeMismatch(&'static str),

    /// 编码失败
    #[error("编码失败: {0}")]
    Encode(String),

    /// 解码失败
    #[error("解码失败: {0}")]
    Decode(String),

    /// 底层线格式解码失败
    #[error("解码失败: {0}")]
    Prost(#[from] prost::DecodeError),

    /// 解码嵌套深度超限
    #[error("解码嵌套深度超过上限 {0}")]
    DepthExceeded(usize),

    /// 单个负载超出字节上限
    #[error("负载长度 {0} 超过上限 {1}")]
    ValueTooLarge(usize, usize),
}

impl SchemaError {
    /// 创建未注册类型错误
    pub fn unknown_type(name: impl Into<String>) -> Self {
        SchemaError::UnknownType(name.into())
    }

    /// 创建类型不匹配错误
    pub fn type_mismatch(expected: &'static str) -> Self {
        SchemaError::TypeMismatch(expected)
    }

    /// 创建编码错误
    pub fn encode(msg: impl Into<String>) -> Self {
        SchemaError::Encode(msg.into())
    }

    /// 创建解码错误
    pub fn decode(msg: impl Into<String>) -> Self {
        SchemaError::Decode(msg.into())
    }
}

/// 契约层 Result 类型
pub type Result<T> = std::result::Result<T, SchemaError>;

// 预导出
pub mod prelude {
    pub use crate::adapter::WireFormat;
    pub use crate::contract::{ContractDescriptor, WireContract};
    pub use crate::include::InclusionLink;
    pub use crate::member::MemberDescriptor;
    pub use crate::token::TypeToken;
}
