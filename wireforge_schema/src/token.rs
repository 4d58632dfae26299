//! 类型标记
//!
//! [`TypeToken`] 是对某个语言类型的轻量引用，携带类型身份、展示名称
//! 和可选的契约来源。注册表用它驱动动态注册，成员描述符用它声明
//! 自己的值类型。

use std::any::{Any, TypeId};

use crate::contract::{ContractDescriptor, WireContract};

/// 类型标记
///
/// 未携带契约来源的标记代表"未选入序列化"的类型，注册表遇到时
/// 静默跳过。
#[derive(Debug, Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
    contract: Option<fn() -> ContractDescriptor>,
}

impl TypeToken {
    /// 为选入序列化的类型创建标记
    pub fn of<T: WireContract>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            contract: Some(T::contract),
        }
    }

    /// 为未选入序列化的类型创建标记
    pub fn opaque<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            contract: None,
        }
    }

    /// 类型身份
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// 类型展示名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 是否携带序列化契约
    pub fn is_marked(&self) -> bool {
        self.contract.is_some()
    }

    /// 构建该类型的契约描述符
    ///
    /// 未选入序列化的类型返回 `None`。
    pub fn contract(&self) -> Option<ContractDescriptor> {
        self.contract.map(|build| build())
    }
}
