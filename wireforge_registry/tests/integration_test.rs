//! 注册表集成测试
//!
//! 从公共 API 走完整注册流程：预知类型、嵌套类型图、循环引用、
//! 基/派生链接，以及链接驱动的多态编解码。

use std::any::TypeId;

use wireforge_registry::prelude::*;
use wireforge_registry::RegistryError;
use wireforge_schema::{
    ContractDescriptor, InclusionLink, MemberDescriptor, TypeToken, WireContract,
};

#[derive(Default, Debug, PartialEq)]
struct SomeClass {
    some_field: i32,
}

impl WireContract for SomeClass {
    fn contract() -> ContractDescriptor {
        ContractDescriptor::new::<Self>().member(MemberDescriptor::int32(
            2,
            "some_field",
            |c: &SomeClass| c.some_field,
            |c, v| c.some_field = v,
        ))
    }
}

#[derive(Default, Debug, PartialEq)]
struct NestedMessage {
    int_field: i32,
    some_class: Option<SomeClass>,
}

impl WireContract for NestedMessage {
    fn contract() -> ContractDescriptor {
        ContractDescriptor::new::<Self>()
            .member(MemberDescriptor::int32(
                1,
                "int_field",
                |m: &NestedMessage| m.int_field,
                |m, v| m.int_field = v,
            ))
            .member(MemberDescriptor::message(
                2,
                "some_class",
                |m: &NestedMessage| m.some_class.as_ref(),
                |m, v| m.some_class = Some(v),
            ))
            .nested(TypeToken::of::<SomeClass>())
    }
}

// 基类型通过链接声明派生类型，槽位 1
#[derive(Default, Debug)]
struct BaseEvent {
    base_field: i32,
}

#[derive(Default, Debug)]
struct ChildEvent {
    base_field: i32,
    int_field: i32,
}

impl WireContract for BaseEvent {
    fn contract() -> ContractDescriptor {
        ContractDescriptor::new::<Self>()
            .member(MemberDescriptor::int32(
                2,
                "base_field",
                |b: &BaseEvent| b.base_field,
                |b, v| b.base_field = v,
            ))
            .include(InclusionLink::subtype(1, TypeToken::of::<ChildEvent>()))
    }
}

impl WireContract for ChildEvent {
    fn contract() -> ContractDescriptor {
        ContractDescriptor::new::<Self>()
            .member(MemberDescriptor::int32(
                1,
                "int_field",
                |c: &ChildEvent| c.int_field,
                |c, v| c.int_field = v,
            ))
            .member(MemberDescriptor::int32(
                2,
                "base_field",
                |c: &ChildEvent| c.base_field,
                |c, v| c.base_field = v,
            ))
    }
}

// 派生类型反向声明自己的基类型，并声明基类型无需独立契约
#[derive(Default, Debug)]
struct RootCommand {
    kind: i32,
}

#[derive(Default, Debug, PartialEq)]
struct MoveCommand {
    int_field: i32,
}

impl WireContract for RootCommand {
    fn contract() -> ContractDescriptor {
        ContractDescriptor::new::<Self>().member(MemberDescriptor::int32(
            1,
            "kind",
            |r: &RootCommand| r.kind,
            |r, v| r.kind = v,
        ))
    }
}

impl WireContract for MoveCommand {
    fn contract() -> ContractDescriptor {
        ContractDescriptor::new::<Self>()
            .member(MemberDescriptor::int32(
                1,
                "int_field",
                |m: &MoveCommand| m.int_field,
                |m, v| m.int_field = v,
            ))
            .include(
                InclusionLink::base(2, TypeToken::of::<RootCommand>()).without_own_contract(),
            )
    }
}

#[test]
fn test_registry_construction_doesnt_throw() {
    let registry = SchemaRegistry::new();
    assert!(!registry.is_registered(TypeId::of::<SomeClass>()));
}

#[test]
fn test_register_none_fails_loudly() {
    let mut registry = SchemaRegistry::new();
    assert!(matches!(
        registry.register_token(None),
        Err(RegistryError::InvalidType)
    ));
}

#[test]
fn test_preknown_types_need_no_registration() {
    let mut registry = SchemaRegistry::new();
    for token in [
        TypeToken::opaque::<String>(),
        TypeToken::opaque::<i32>(),
        TypeToken::opaque::<i64>(),
        TypeToken::opaque::<u32>(),
        TypeToken::opaque::<u64>(),
        TypeToken::opaque::<f32>(),
        TypeToken::opaque::<f64>(),
        TypeToken::opaque::<bool>(),
        TypeToken::opaque::<Vec<u8>>(),
        TypeToken::opaque::<prost_types::Timestamp>(),
    ] {
        assert!(
            !registry.register_token(Some(&token)).unwrap(),
            "{} 不应被视为新注册",
            token.name()
        );
    }
}

#[test]
fn test_nested_graph_registers_transitively() {
    let mut registry = SchemaRegistry::new();
    assert!(registry.register::<NestedMessage>().unwrap());
    assert!(registry.is_registered(TypeId::of::<NestedMessage>()));
    assert!(registry.is_registered(TypeId::of::<SomeClass>()));
    assert!(!registry.register::<SomeClass>().unwrap());
}

#[test]
fn test_nested_roundtrip_preserves_tagged_members() {
    let mut registry = SchemaRegistry::new();
    registry.register::<NestedMessage>().unwrap();

    let original = NestedMessage {
        int_field: 5,
        some_class: Some(SomeClass { some_field: 8 }),
    };
    let wire = registry.encode(&original).unwrap();
    let decoded: NestedMessage = registry.decode(&wire).unwrap();

    assert_eq!(decoded, original);
}

#[test]
fn test_base_registration_links_declared_subtype() {
    let mut registry = SchemaRegistry::new();
    assert!(registry.register::<BaseEvent>().unwrap());
    // 链接另一端随基类型一并注册
    assert!(registry.is_registered(TypeId::of::<ChildEvent>()));
}

#[test]
fn test_polymorphic_roundtrip_through_base_slot() {
    let mut registry = SchemaRegistry::new();
    registry.register::<BaseEvent>().unwrap();

    let child = ChildEvent {
        base_field: 3,
        int_field: 5068,
    };
    // 以基类型模式编码派生值
    let wire = registry.encode_as::<BaseEvent>(&child).unwrap();
    let decoded = registry.decode_as::<BaseEvent>(&wire).unwrap();

    let restored = decoded
        .downcast::<ChildEvent>()
        .expect("应还原为派生类型");
    assert_eq!(restored.int_field, 5068);
    assert_eq!(restored.base_field, 3);
}

#[test]
fn test_backwards_include_links_self_under_base() {
    let mut registry = SchemaRegistry::new();
    assert!(registry.register::<MoveCommand>().unwrap());
    // 反向链接要求基类型契约存在，随之注册
    assert!(registry.is_registered(TypeId::of::<RootCommand>()));

    let cmd = MoveCommand { int_field: 5068 };
    let wire = registry.encode_as::<RootCommand>(&cmd).unwrap();
    let decoded = registry.decode_as::<RootCommand>(&wire).unwrap();
    let restored = decoded
        .downcast::<MoveCommand>()
        .expect("应还原为派生类型");
    assert_eq!(*restored, MoveCommand { int_field: 5068 });
}

#[test]
fn test_mutual_includes_rejected_without_crash() {
    #[derive(Default, Debug)]
    struct Alpha {
        left: i32,
    }

    #[derive(Default, Debug)]
    struct Beta {
        right: i32,
    }

    #[derive(Default, Debug)]
    struct Gamma {
        value: i32,
    }

    impl WireContract for Alpha {
        fn contract() -> ContractDescriptor {
            ContractDescriptor::new::<Self>()
                .member(MemberDescriptor::int32(
                    2,
                    "left",
                    |a: &Alpha| a.left,
                    |a, v| a.left = v,
                ))
                .include(InclusionLink::subtype(1, TypeToken::of::<Beta>()))
        }
    }

    impl WireContract for Beta {
        fn contract() -> ContractDescriptor {
            ContractDescriptor::new::<Self>()
                .member(MemberDescriptor::int32(
                    2,
                    "right",
                    |b: &Beta| b.right,
                    |b, v| b.right = v,
                ))
                .include(InclusionLink::subtype(1, TypeToken::of::<Alpha>()))
        }
    }

    impl WireContract for Gamma {
        fn contract() -> ContractDescriptor {
            ContractDescriptor::new::<Self>().member(MemberDescriptor::int32(
                1,
                "value",
                |g: &Gamma| g.value,
                |g, v| g.value = v,
            ))
        }
    }

    let mut registry = SchemaRegistry::new();
    // 互相声明对方为子类型，闭包成环，注册以错误收场
    assert!(registry.register::<Alpha>().is_err());

    // 闭包查询对任何动态类型都终止并报错，而不是无限下降
    registry.register::<Gamma>().unwrap();
    let gamma = Gamma { value: 7 };
    assert!(registry.encode_as::<Beta>(&gamma).is_err());
}

#[test]
fn test_reregistration_is_idempotent() {
    let mut registry = SchemaRegistry::new();
    assert!(registry.register::<BaseEvent>().unwrap());
    assert!(!registry.register::<BaseEvent>().unwrap());
    assert!(!registry.register::<ChildEvent>().unwrap());
}
