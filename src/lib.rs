//! # WireForge - 基于显式契约的 Protobuf 类型注册与序列化框架
//!
//! WireForge 把"运行时类型注册"和"Protobuf 线格式编解码"组合成一个
//! 自洽的序列化栈：类型以显式契约声明成员、嵌套类型和基/派生链接，
//! 注册表沿类型图递归发现并提交模式，编解码模型据此完成线上读写。
//!
//! ## 特性
//!
//! - 显式契约描述（标签、成员编解码、嵌套、基/派生链接）
//! - 幂等、循环安全的递归类型注册
//! - proto3 线格式编解码（基于 prost 编码原语）
//! - 经保留槽位的多态编解码（以基类型读写派生值）
//! - 可配置的解码深度与值大小上限
//!
//! ## 快速开始
//!
//! ```rust,no_run,ignore
//! use wireforge::prelude::*;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register::<MyMessage>()?;
//!
//! let wire = registry.encode(&MyMessage::default())?;
//! let back: MyMessage = registry.decode(&wire)?;
//! ```
//!
//! ## 模块组织
//!
//! ### 配置模块
//! - CodecConfig - 编解码限制配置
//!
//! ### 模式模块
//! - WireContract - 契约声明 trait
//! - ContractDescriptor - 契约描述
//! - MemberDescriptor - 成员描述与编解码
//! - InclusionLink - 基/派生链接
//! - TypeToken - 运行时类型标记
//!
//! ### 编解码模块
//! - ProstWireModel - proto3 线上模型
//!
//! ### 注册表模块
//! - SchemaRegistry - 类型注册与编解码入口
//! - PreknownTypes - 预知类型集合
//!
//! ### 服务模块
//! - SerializerService - 可克隆的线程安全序列化门面

pub mod service;

pub use crate::service::SerializerService;

// ============================================================================
// Crate Re-exports (for advanced users)
// ============================================================================

pub use wireforge_codec;
pub use wireforge_config;
pub use wireforge_registry;
pub use wireforge_schema;

// ============================================================================
// Prelude Module
// ============================================================================

/// 预导出常用类型
///
/// 通过 `use wireforge::prelude::*;` 导入所有常用类型
pub mod prelude {
    // Common types
    pub use std::result::Result as StdResult;

    pub use wireforge_config::{CodecConfig, ConfigError};

    pub use wireforge_schema::prelude::*;

    pub use wireforge_codec::ProstWireModel;

    pub use wireforge_registry::prelude::*;

    pub use crate::service::SerializerService;

    pub use crate::{Error, Result};
}

// ============================================================================
// Error Types
// ============================================================================

/// WireForge 统一 Result 类型
pub type Result<T> = std::result::Result<T, Error>;

/// WireForge 统一错误枚举
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 注册表错误
    #[error(transparent)]
    Registry(#[from] wireforge_registry::RegistryError),

    /// 契约或线上模型错误
    #[error(transparent)]
    Schema(#[from] wireforge_schema::SchemaError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] wireforge_config::ConfigError),

    /// 共享注册表互斥锁中毒
    #[error("序列化服务互斥锁中毒")]
    LockPoisoned,

    /// 自定义错误
    #[error("{0}")]
    Custom(String),
}

// ============================================================================
// Version Information
// ============================================================================

/// WireForge 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WireForge 包名
pub const NAME: &str = env!("CARGO_PKG_NAME");
