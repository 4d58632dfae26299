//! 模式注册表
//!
//! 注册表独占持有"语言类型 → 线上模式条目"的映射状态。单次注册
//! 沿类型图递归推进，状态机为 `未见 → 在册 → 已提交`：在册状态
//! 在递归下降*之前*写入，循环引用回到起点时看到在册标记即返回，
//! 这是击破循环的唯一机制，对调用方完全不可见。

use std::any::{Any, TypeId};
use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use wireforge_codec::ProstWireModel;
use wireforge_config::CodecConfig;
use wireforge_schema::{
    ContractDescriptor, InclusionDirection, InclusionLink, SchemaError, TypeToken, WireContract,
    WireFormat,
};

use crate::preknown::PreknownTypes;
use crate::walker;
use crate::{RegistryError, Result};

/// 单个类型的注册状态
///
/// 没有失败终态：失败按调用报告，不针对类型持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegState {
    /// 正在注册（循环防护标记，外部不可观测）
    InProgress,
    /// 已提交到线上模型
    Committed,
}

/// 模式注册表
///
/// 进程级单例用法：启动时创建一次并完成全部注册，之后只读。
/// 若注册可能并发，调用方应将实例置于单一互斥边界之内。
pub struct SchemaRegistry<M: WireFormat = ProstWireModel> {
    model: M,
    preknown: PreknownTypes,
    state: HashMap<TypeId, RegState>,
}

impl SchemaRegistry<ProstWireModel> {
    /// 创建使用默认线上模型的注册表（永不失败）
    pub fn new() -> Self {
        Self::with_model(ProstWireModel::new())
    }

    /// 创建使用指定编解码配置的注册表
    pub fn with_config(config: CodecConfig) -> Self {
        Self::with_model(ProstWireModel::with_config(config))
    }
}

impl Default for SchemaRegistry<ProstWireModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: WireFormat> SchemaRegistry<M> {
    /// 创建使用指定线上模型的注册表
    pub fn with_model(model: M) -> Self {
        Self {
            model,
            preknown: PreknownTypes::standard(),
            state: HashMap::new(),
        }
    }

    /// 注册类型 `T`
    ///
    /// 仅当 `T` 由本次调用新提交到模式时返回 `Ok(true)`；预知类型
    /// 和已提交类型返回 `Ok(false)`，不报错。
    pub fn register<T: WireContract>(&mut self) -> Result<bool> {
        self.register_token(Some(&TypeToken::of::<T>()))
    }

    /// 以类型标记注册（动态入口）
    ///
    /// 缺少标记（`None`）是编程错误，立即返回
    /// [`RegistryError::InvalidType`]，不会被吞成布尔结果。
    pub fn register_token(&mut self, token: Option<&TypeToken>) -> Result<bool> {
        let token = token.ok_or(RegistryError::InvalidType)?;
        self.register_inner(token)
    }

    fn register_inner(&mut self, token: &TypeToken) -> Result<bool> {
        let type_id = token.type_id();

        // 预知类型：编解码器天生认识，无事可做
        if self.preknown.contains(type_id) {
            trace!(type_name = token.name(), "预知类型，跳过注册");
            return Ok(false);
        }

        // 已提交或在册（循环引用回到起点）：幂等返回
        if self.state.contains_key(&type_id) {
            trace!(type_name = token.name(), "已在册，跳过注册");
            return Ok(false);
        }

        // 未选入序列化的类型：普通结果，不是错误
        let Some(contract) = token.contract() else {
            trace!(type_name = token.name(), "缺少序列化契约，跳过注册");
            return Ok(false);
        };

        contract.validate()?;

        // 先写在册标记再递归，循环引用在下降过程中看到它即止步
        self.state.insert(type_id, RegState::InProgress);

        // 失败按调用报告，不针对类型持久化：中途出错时撤掉本帧的
        // 在册标记，后续调用可以重新尝试注册
        if let Err(err) = self.commit_type(type_id, token, contract) {
            self.state.remove(&type_id);
            return Err(err);
        }

        Ok(true)
    }

    fn commit_type(
        &mut self,
        type_id: TypeId,
        token: &TypeToken,
        contract: ContractDescriptor,
    ) -> Result<()> {
        // 成员值类型：尽力而为，未选入的类型静默跳过
        for member_type in walker::collect_member_types(&contract) {
            self.register_inner(&member_type)?;
        }

        // 嵌套契约类型
        for nested in walker::collect_nested_types(&contract) {
            self.register_inner(nested)?;
        }

        let name = contract.name();
        let includes: Vec<InclusionLink> = contract.includes().to_vec();

        // 提交类型及其线位映射
        self.model.add_contract(contract).map_err(RegistryError::from)?;

        // 登记基/派生链接，链接另一端同样经由本算法注册
        for link in &includes {
            self.apply_include(type_id, token, link)?;
        }

        self.state.insert(type_id, RegState::Committed);
        debug!(type_name = name, "类型已提交到线上模式");
        Ok(())
    }

    fn apply_include(
        &mut self,
        self_id: TypeId,
        self_token: &TypeToken,
        link: &InclusionLink,
    ) -> Result<()> {
        let related = link.related();

        match link.direction() {
            InclusionDirection::Subtype => {
                // 纯别名链接只要求模型认识另一端，否则完整注册
                if link.needs_own_contract() || !self.model.is_known(related.type_id()) {
                    self.register_inner(&related)?;
                }
                if !self.model.is_known(related.type_id()) {
                    return Err(RegistryError::Schema(SchemaError::unknown_type(
                        related.name(),
                    )));
                }
                self.model.add_subtype(self_id, link.slot(), related)?;
            }
            InclusionDirection::Base => {
                // 反向声明：本类型是 related 的子类型
                self.register_inner(&related)?;
                if !self.model.is_known(related.type_id()) {
                    return Err(RegistryError::Schema(SchemaError::unknown_type(
                        related.name(),
                    )));
                }
                self.model
                    .add_subtype(related.type_id(), link.slot(), *self_token)?;
            }
        }

        Ok(())
    }

    /// 类型是否已提交
    ///
    /// 在册（注册中）状态对外不可见，只有已提交算注册完成。
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        matches!(self.state.get(&type_id), Some(RegState::Committed))
    }

    /// 底层线上模型
    pub fn model(&self) -> &M {
        &self.model
    }

    /// 以 `T` 的模式编码一个值
    pub fn encode<T: WireContract>(&self, value: &T) -> Result<Bytes> {
        self.encode_as::<T>(value)
    }

    /// 以基类型 `B` 的模式编码一个值
    ///
    /// 值的动态类型可以是 `B` 或其已链接的子类型，后者走保留槽位。
    pub fn encode_as<B: WireContract>(&self, value: &dyn Any) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.model
            .encode_value(TypeId::of::<B>(), value, &mut dst)?;
        Ok(dst.freeze())
    }

    /// 以基类型 `B` 的模式解码
    ///
    /// 返回值的动态类型可能是 `B` 已链接的子类型，由调用方向下转型。
    pub fn decode_as<B: WireContract>(&self, src: &[u8]) -> Result<Box<dyn Any>> {
        let mut buf = Bytes::copy_from_slice(src);
        Ok(self.model.decode_value(TypeId::of::<B>(), &mut buf, 0)?)
    }

    /// 以 `T` 的模式解码并期望得到 `T` 本身
    pub fn decode<T: WireContract>(&self, src: &[u8]) -> Result<T> {
        let boxed = self.decode_as::<T>(src)?;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| RegistryError::Schema(SchemaError::type_mismatch(std::any::type_name::<T>())))
    }
}
