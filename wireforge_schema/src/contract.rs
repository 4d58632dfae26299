//! 契约描述符
//!
//! [`WireContract`] 是类型级的"参与序列化"标记。实现它的类型通过
//! [`ContractDescriptor`] 声明自己的成员、嵌套类型和包含链接，
//! 注册表据此构建线上模式。

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;

use crate::SchemaError;
use crate::include::InclusionLink;
use crate::member::MemberDescriptor;
use crate::token::TypeToken;

/// 类型级序列化标记
///
/// 实现该 trait 即声明"此类型参与序列化"。`Default` 约束让线上
/// 模型能在解码时构造空实例再逐字段合并。
pub trait WireContract: Any + Default {
    /// 构建该类型的契约描述符
    fn contract() -> ContractDescriptor;
}

fn new_boxed<T: WireContract>() -> Box<dyn Any> {
    Box::new(T::default())
}

/// 契约描述符
///
/// 一个类型的完整序列化声明：有序成员集合、嵌套契约类型、
/// 包含链接。由注册表独占消费，提交后归线上模型所有。
pub struct ContractDescriptor {
    name: &'static str,
    type_id: TypeId,
    new_instance: fn() -> Box<dyn Any>,
    members: Vec<MemberDescriptor>,
    nested: Vec<TypeToken>,
    includes: Vec<InclusionLink>,
}

impl ContractDescriptor {
    /// 为类型 `T` 创建空描述符
    pub fn new<T: WireContract>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            new_instance: new_boxed::<T>,
            members: Vec::new(),
            nested: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// 追加一个成员声明
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// 追加一个嵌套契约类型声明
    pub fn nested(mut self, token: TypeToken) -> Self {
        self.nested.push(token);
        self
    }

    /// 追加一个包含链接声明
    pub fn include(mut self, link: InclusionLink) -> Self {
        self.includes.push(link);
        self
    }

    /// 校验描述符的结构约束
    ///
    /// 线位号必须为正且在本类型内唯一；包含槽位必须唯一且不得
    /// 指向自身。
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut tags = HashSet::new();
        for member in &self.members {
            if member.tag() == 0 {
                return Err(SchemaError::ZeroTag(self.name, member.name()));
            }
            if !tags.insert(member.tag()) {
                return Err(SchemaError::DuplicateTag(self.name, member.tag()));
            }
        }

        let mut slots = HashSet::new();
        for link in &self.includes {
            if link.slot() == 0 {
                return Err(SchemaError::ZeroTag(self.name, "include"));
            }
            if !slots.insert(link.slot()) {
                return Err(SchemaError::DuplicateSlot(self.name, link.slot()));
            }
            if link.related().type_id() == self.type_id {
                return Err(SchemaError::SelfInclude(self.name));
            }
        }

        Ok(())
    }

    /// 类型展示名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 类型身份
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 构造一个默认实例
    pub fn new_instance(&self) -> Box<dyn Any> {
        (self.new_instance)()
    }

    /// 有序成员集合
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// 按线位号查找成员
    pub fn member_by_tag(&self, tag: u32) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.tag() == tag)
    }

    /// 声明的嵌套契约类型
    pub fn nested_types(&self) -> &[TypeToken] {
        &self.nested
    }

    /// 声明的包含链接
    pub fn includes(&self) -> &[InclusionLink] {
        &self.includes
    }

    /// 将成员按线位号升序排列
    ///
    /// 线位号显式给出，因此排序后的输出字节序是确定的。
    pub fn sort_members(&mut self) {
        self.members.sort_by_key(|m| m.tag());
    }
}

impl fmt::Debug for ContractDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractDescriptor")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("nested", &self.nested.len())
            .field("includes", &self.includes.len())
            .finish()
    }
}
