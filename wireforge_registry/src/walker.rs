//! 类型图遍历
//!
//! 从契约描述符里收集成员序列、成员值类型和嵌套类型。遍历本身
//! 不递归也不持有状态，循环防护完全由注册表的在册状态承担。

use wireforge_schema::{ContractDescriptor, MemberDescriptor, MemberKind, TypeToken};

/// 收集类型声明的有序成员序列
pub fn collect_members(contract: &ContractDescriptor) -> &[MemberDescriptor] {
    contract.members()
}

/// 收集成员值类型中需要进一步注册的候选
///
/// 只有消息类成员的值类型是候选；不可表示成员的值类型也会给出，
/// 由注册表按"缺少契约"静默跳过。
pub fn collect_member_types(contract: &ContractDescriptor) -> Vec<TypeToken> {
    contract
        .members()
        .iter()
        .filter(|member| {
            matches!(member.kind(), MemberKind::Message | MemberKind::Opaque)
        })
        .map(|member| member.value_type())
        .collect()
}

/// 收集类型声明的嵌套契约类型
pub fn collect_nested_types(contract: &ContractDescriptor) -> &[TypeToken] {
    contract.nested_types()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireforge_schema::WireContract;

    #[derive(Default)]
    struct Inner {
        value: i32,
    }

    impl WireContract for Inner {
        fn contract() -> ContractDescriptor {
            ContractDescriptor::new::<Self>().member(MemberDescriptor::int32(
                2,
                "value",
                |i: &Inner| i.value,
                |i, v| i.value = v,
            ))
        }
    }

    #[derive(Default)]
    struct Outer {
        count: i32,
        inner: Option<Inner>,
    }

    impl WireContract for Outer {
        fn contract() -> ContractDescriptor {
            ContractDescriptor::new::<Self>()
                .member(MemberDescriptor::int32(
                    1,
                    "count",
                    |o: &Outer| o.count,
                    |o, v| o.count = v,
                ))
                .member(MemberDescriptor::message(
                    2,
                    "inner",
                    |o: &Outer| o.inner.as_ref(),
                    |o, v| o.inner = Some(v),
                ))
                .nested(TypeToken::of::<Inner>())
        }
    }

    #[test]
    fn test_collect_members_keeps_declared_order() {
        let contract = Outer::contract();
        let members = collect_members(&contract);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name(), "count");
        assert_eq!(members[1].name(), "inner");
    }

    #[test]
    fn test_member_types_only_contains_message_candidates() {
        let contract = Outer::contract();
        let candidates = collect_member_types(&contract);
        // 标量成员的值类型不是注册候选
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].type_id(), std::any::TypeId::of::<Inner>());
    }

    #[test]
    fn test_nested_types_are_reported() {
        let contract = Outer::contract();
        let nested = collect_nested_types(&contract);
        assert_eq!(nested.len(), 1);
        assert!(nested[0].is_marked());
    }

    #[test]
    fn test_opaque_member_type_is_reported_unmarked() {
        #[derive(Default)]
        struct WithOpaque;
        impl WireContract for WithOpaque {
            fn contract() -> ContractDescriptor {
                ContractDescriptor::new::<Self>()
                    .member(MemberDescriptor::opaque::<std::net::TcpListener>(1, "handle"))
            }
        }

        let contract = WithOpaque::contract();
        let candidates = collect_member_types(&contract);
        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].is_marked());
    }
}
