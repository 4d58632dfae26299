//! WireForge 类型注册表
//!
//! 有状态核心：给定一个起始类型，沿契约描述的成员图和嵌套类型
//! 递归发现可序列化类型，处理循环引用和基/派生链接，把一致的
//! 线上模式提交给编解码模型。注册是幂等的，重复注册安全返回。

use thiserror::Error;

pub mod preknown;
pub mod registry;
pub mod walker;

pub use preknown::PreknownTypes;
pub use registry::SchemaRegistry;

use wireforge_schema::SchemaError;

/// 注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 注册请求缺少类型引用（编程错误，立即失败）
    #[error("无效的类型引用: 注册请求缺少类型")]
    InvalidType,

    /// 契约或线上模型错误
    #[error("契约错误: {0}")]
    Schema(#[from] SchemaError),
}

/// 注册表 Result 类型
pub type Result<T> = std::result::Result<T, RegistryError>;

// 预导出
pub mod prelude {
    pub use crate::preknown::PreknownTypes;
    pub use crate::registry::SchemaRegistry;
}
