//! 运行时 Protobuf 模式模型
//!
//! 模型持有已提交类型的契约和子类型链接表。编码时按线位号升序
//! 输出字段；解码时按字段键分派到成员或子类型槽位，未知字段按
//! 线类型跳过。输出字节序对同一模式是确定的。

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::encoding::{self, DecodeContext, WireType};
use tracing::debug;

use wireforge_config::CodecConfig;
use wireforge_schema::{ContractDescriptor, SchemaError, TypeToken, WireFormat};

/// 单个类型的线上模式条目
struct MessageModel {
    contract: ContractDescriptor,
    /// 保留槽位 → 子类型，BTreeMap 保证遍历顺序确定
    subtypes: BTreeMap<u32, TypeToken>,
}

/// 基于 prost 线格式原语的模式模型
pub struct ProstWireModel {
    config: CodecConfig,
    types: HashMap<TypeId, MessageModel>,
}

impl ProstWireModel {
    /// 创建使用默认配置的模型
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// 创建使用指定配置的模型
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            types: HashMap::new(),
        }
    }

    /// 已提交的类型数量
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// 当前配置
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn model(&self, type_id: TypeId) -> Result<&MessageModel, SchemaError> {
        self.types
            .get(&type_id)
            .ok_or_else(|| SchemaError::unknown_type(format!("{:?}", type_id)))
    }

    /// `root` 的子类型闭包中是否包含 `dynamic`
    ///
    /// 显式工作栈加已访问集合，链接表即使成环也保证终止。
    fn covers(&self, root: TypeId, dynamic: TypeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id == dynamic {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(model) = self.types.get(&id) {
                stack.extend(model.subtypes.values().map(|token| token.type_id()));
            }
        }
        false
    }

    fn read_delimited(&self, src: &mut Bytes) -> Result<Bytes, SchemaError> {
        let len = encoding::decode_varint(src)? as usize;
        if len > self.config.max_value_bytes {
            return Err(SchemaError::ValueTooLarge(len, self.config.max_value_bytes));
        }
        if len > src.remaining() {
            return Err(SchemaError::decode("长度前缀超出剩余缓冲".to_string()));
        }
        Ok(src.split_to(len))
    }
}

impl Default for ProstWireModel {
    fn default() -> Self {
        Self::new()
    }
}

impl WireFormat for ProstWireModel {
    fn add_contract(&mut self, mut contract: ContractDescriptor) -> Result<(), SchemaError> {
        if self.types.contains_key(&contract.type_id()) {
            return Err(SchemaError::DuplicateContract(contract.name()));
        }

        // 线位号显式给出，升序排列让输出字节序确定
        contract.sort_members();

        debug!(type_name = contract.name(), "提交类型契约");
        self.types.insert(
            contract.type_id(),
            MessageModel {
                contract,
                subtypes: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn add_subtype(
        &mut self,
        base: TypeId,
        slot: u32,
        derived: TypeToken,
    ) -> Result<(), SchemaError> {
        if !self.types.contains_key(&derived.type_id()) {
            return Err(SchemaError::unknown_type(derived.name()));
        }

        // 基类型已在 derived 的闭包中，新链接会让闭包成环
        if self.covers(derived.type_id(), base) {
            let base_name = self.model(base)?.contract.name();
            return Err(SchemaError::InclusionCycle(base_name, derived.name()));
        }

        let model = self
            .types
            .get_mut(&base)
            .ok_or_else(|| SchemaError::unknown_type(format!("{:?}", base)))?;

        // 保留槽位不能与基类型自己的成员线位冲突
        if model.contract.member_by_tag(slot).is_some() {
            return Err(SchemaError::SlotConflict(model.contract.name(), slot));
        }

        match model.subtypes.get(&slot) {
            Some(existing) if existing.type_id() == derived.type_id() => Ok(()),
            Some(_) => Err(SchemaError::SlotConflict(model.contract.name(), slot)),
            None => {
                debug!(
                    base = model.contract.name(),
                    slot,
                    derived = derived.name(),
                    "登记子类型链接"
                );
                model.subtypes.insert(slot, derived);
                Ok(())
            }
        }
    }

    fn is_known(&self, type_id: TypeId) -> bool {
        self.types.contains_key(&type_id)
    }

    fn encode_value(
        &self,
        type_id: TypeId,
        value: &dyn Any,
        dst: &mut BytesMut,
    ) -> Result<(), SchemaError> {
        let model = self.model(type_id)?;

        // 动态类型与模式根一致：直接按线位输出成员
        if value.type_id() == type_id {
            for member in model.contract.members() {
                member.encode_into(value, dst, self)?;
            }
            return Ok(());
        }

        // 动态类型是某个已链接的（传递）子类型：包装进保留槽位
        for (slot, token) in &model.subtypes {
            if self.covers(token.type_id(), value.type_id()) {
                let mut payload = BytesMut::new();
                self.encode_value(token.type_id(), value, &mut payload)?;
                if payload.len() > self.config.max_value_bytes {
                    return Err(SchemaError::ValueTooLarge(
                        payload.len(),
                        self.config.max_value_bytes,
                    ));
                }
                encoding::encode_key(*slot, WireType::LengthDelimited, dst);
                encoding::encode_varint(payload.len() as u64, dst);
                dst.put_slice(&payload);
                return Ok(());
            }
        }

        Err(SchemaError::encode(format!(
            "值的动态类型不是 {} 或其已链接的子类型",
            model.contract.name()
        )))
    }

    fn decode_value(
        &self,
        type_id: TypeId,
        src: &mut Bytes,
        depth: usize,
    ) -> Result<Box<dyn Any>, SchemaError> {
        if depth > self.config.max_decode_depth {
            return Err(SchemaError::DepthExceeded(self.config.max_decode_depth));
        }

        let model = self.model(type_id)?;
        let mut instance = model.contract.new_instance();
        let mut decoded_as_subtype = false;

        while src.has_remaining() {
            let (tag, wire_type) = encoding::decode_key(src)?;

            if let Some(token) = model.subtypes.get(&tag) {
                if wire_type != WireType::LengthDelimited {
                    return Err(SchemaError::decode(format!(
                        "槽位 {} 需要长度前缀编码",
                        tag
                    )));
                }
                let mut payload = self.read_delimited(src)?;
                instance = self.decode_value(token.type_id(), &mut payload, depth + 1)?;
                decoded_as_subtype = true;
                continue;
            }

            match model.contract.member_by_tag(tag) {
                // 实例已切换为派生类型时，基类型成员无处可并，按未知字段跳过
                Some(member) if member.is_encodable() && !decoded_as_subtype => {
                    member.merge_from(instance.as_mut(), wire_type, src, self, depth)?;
                }
                _ => {
                    encoding::skip_field(wire_type, tag, src, DecodeContext::default())?;
                }
            }
        }

        Ok(instance)
    }
}
