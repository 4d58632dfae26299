//! 编解码适配边界
//!
//! 注册表只通过 [`WireFormat`] 与底层二进制编解码库打交道：
//! 提交类型及其线位映射、在保留槽位建立子类型链接、查询类型是否
//! 已为模型所知。字节级编码不在注册表内实现，任何支持字段编号、
//! 嵌套消息和保留槽位子类型链接的模式驱动编解码器都可以接入。

use std::any::{Any, TypeId};

use bytes::{Bytes, BytesMut};

use crate::SchemaError;
use crate::contract::ContractDescriptor;
use crate::token::TypeToken;

/// 模式驱动的线格式模型
pub trait WireFormat {
    /// 提交一个类型及其有序线位映射
    fn add_contract(&mut self, contract: ContractDescriptor) -> Result<(), SchemaError>;

    /// 在基类型的保留槽位上登记子类型链接
    ///
    /// 相同的 `(slot, derived)` 重复登记是幂等的；冲突的登记是错误。
    fn add_subtype(
        &mut self,
        base: TypeId,
        slot: u32,
        derived: TypeToken,
    ) -> Result<(), SchemaError>;

    /// 查询类型是否已为模型所知
    fn is_known(&self, type_id: TypeId) -> bool;

    /// 以 `type_id` 的模式编码一个值
    ///
    /// 值的动态类型可以是 `type_id` 本身，也可以是其已链接的
    /// （传递）子类型；后者会被包装在对应的保留槽位中。
    fn encode_value(
        &self,
        type_id: TypeId,
        value: &dyn Any,
        dst: &mut BytesMut,
    ) -> Result<(), SchemaError>;

    /// 以 `type_id` 的模式解码一个值
    ///
    /// 若负载中出现保留槽位，返回值的动态类型是对应的派生类型。
    /// `depth` 是当前嵌套深度，由实现方用于限制递归。
    fn decode_value(
        &self,
        type_id: TypeId,
        src: &mut Bytes,
        depth: usize,
    ) -> Result<Box<dyn Any>, SchemaError>;
}
