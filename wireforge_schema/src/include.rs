//! 包含链接
//!
//! 声明"在保留槽位 K 上，类型 X 是本类型可达的子类型"，或反向的
//! "本类型在槽位 K 上是 X 的子类型"。链接表（而非语言继承）决定
//! 多态行为：序列化基类型槽位里的派生值时，保留槽位承载类型判别，
//! 反序列化据此恢复派生类型的运行时身份。

use crate::token::TypeToken;

/// 链接方向：`related` 在关系中扮演的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionDirection {
    /// `related` 是本类型的子类型
    Subtype,
    /// `related` 是本类型的基类型（反向声明，本类型是子类型）
    Base,
}

/// 包含链接声明
///
/// 槽位号在基类型的所有子类型链接中必须唯一，且不能与基类型
/// 自己的成员线位号冲突。
#[derive(Debug, Clone, Copy)]
pub struct InclusionLink {
    slot: u32,
    related: TypeToken,
    direction: InclusionDirection,
    own_contract: bool,
}

impl InclusionLink {
    /// 声明子类型：`related` 在槽位 `slot` 上可达
    pub fn subtype(slot: u32, related: TypeToken) -> Self {
        Self {
            slot,
            related,
            direction: InclusionDirection::Subtype,
            own_contract: true,
        }
    }

    /// 反向声明：本类型在 `related` 的槽位 `slot` 上可达
    pub fn base(slot: u32, related: TypeToken) -> Self {
        Self {
            slot,
            related,
            direction: InclusionDirection::Base,
            own_contract: true,
        }
    }

    /// 标记链接另一端不需要独立契约（纯多态别名）
    pub fn without_own_contract(mut self) -> Self {
        self.own_contract = false;
        self
    }

    /// 保留槽位号
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// 链接另一端的类型标记
    pub fn related(&self) -> TypeToken {
        self.related
    }

    /// 链接方向
    pub fn direction(&self) -> InclusionDirection {
        self.direction
    }

    /// 链接另一端是否需要独立契约
    pub fn needs_own_contract(&self) -> bool {
        self.own_contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_link_defaults() {
        let link = InclusionLink::subtype(1, TypeToken::opaque::<u8>());
        assert_eq!(link.slot(), 1);
        assert_eq!(link.direction(), InclusionDirection::Subtype);
        assert!(link.needs_own_contract());
    }

    #[test]
    fn test_without_own_contract() {
        let link = InclusionLink::base(2, TypeToken::opaque::<u8>()).without_own_contract();
        assert_eq!(link.direction(), InclusionDirection::Base);
        assert!(!link.needs_own_contract());
    }
}
