//! WireForge 线上模型
//!
//! 提供 [`ProstWireModel`]：一个运行时构建的、模式驱动的 Protobuf
//! 线格式模型。字节级编码完全由 prost 的线格式原语完成（varint、
//! 字段键、长度前缀），本 crate 只负责维护"类型 → 线位映射 →
//! 子类型链接"的模式状态并在其上调度。

pub mod model;

pub use model::ProstWireModel;

// 预导出
pub mod prelude {
    pub use crate::model::ProstWireModel;
}
