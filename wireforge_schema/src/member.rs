//! 成员描述符
//!
//! 每个成员携带一个正整数线位号（同一类型内唯一，不要求连续或从 1 开始）
//! 和对所属类型字段的读写访问器。字节级编码完全委托给 prost 的线格式
//! 原语，本模块只负责把字段值接到这些原语上。

use std::any::{Any, TypeId};
use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::encoding::{self, DecodeContext, WireType};

use crate::SchemaError;
use crate::adapter::WireFormat;
use crate::contract::WireContract;
use crate::token::TypeToken;

type EncodeFn =
    Box<dyn Fn(&dyn Any, &mut BytesMut, &dyn WireFormat) -> Result<(), SchemaError> + Send + Sync>;
type DecodeFn = Box<
    dyn Fn(&mut dyn Any, WireType, &mut Bytes, &dyn WireFormat, usize) -> Result<(), SchemaError>
        + Send
        + Sync,
>;

/// 成员值的线上种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// 32 位有符号整数
    Int32,
    /// 64 位有符号整数
    Int64,
    /// 32 位无符号整数
    UInt32,
    /// 64 位无符号整数
    UInt64,
    /// 单精度浮点数
    Float,
    /// 双精度浮点数
    Double,
    /// 布尔值
    Bool,
    /// 文本字符串
    Str,
    /// 原始字节
    Bytes,
    /// 日期时间（well-known Timestamp）
    Timestamp,
    /// 嵌套契约类型
    Message,
    /// 声明了线位号但值类型不可表示的成员
    Opaque,
}

struct MemberCodec {
    encode: EncodeFn,
    decode: DecodeFn,
}

/// 成员描述符
pub struct MemberDescriptor {
    tag: u32,
    name: &'static str,
    value_type: TypeToken,
    kind: MemberKind,
    codec: Option<MemberCodec>,
}

fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T, SchemaError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| SchemaError::type_mismatch(std::any::type_name::<T>()))
}

fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, SchemaError> {
    value
        .downcast_mut::<T>()
        .ok_or_else(|| SchemaError::type_mismatch(std::any::type_name::<T>()))
}

macro_rules! scalar_member {
    ($(#[$meta:meta])* $fn_name:ident, $module:ident, $ty:ty, $kind:expr, $zero:expr) => {
        $(#[$meta])*
        pub fn $fn_name<T: Any>(
            tag: u32,
            name: &'static str,
            get: fn(&T) -> $ty,
            set: fn(&mut T, $ty),
        ) -> Self {
            let encode: EncodeFn = Box::new(move |value, dst, _model| {
                let target = downcast_ref::<T>(value)?;
                let v = get(target);
                // proto3 惯例：默认值不上线
                if v != $zero {
                    encoding::$module::encode(tag, &v, dst);
                }
                Ok(())
            });
            let decode: DecodeFn = Box::new(move |value, wire_type, src, _model, _depth| {
                let target = downcast_mut::<T>(value)?;
                let mut v: $ty = $zero;
                encoding::$module::merge(wire_type, &mut v, src, DecodeContext::default())?;
                set(target, v);
                Ok(())
            });
            Self {
                tag,
                name,
                value_type: TypeToken::opaque::<$ty>(),
                kind: $kind,
                codec: Some(MemberCodec { encode, decode }),
            }
        }
    };
}

impl MemberDescriptor {
    scalar_member!(
        /// 32 位有符号整数成员
        int32, int32, i32, MemberKind::Int32, 0i32
    );
    scalar_member!(
        /// 64 位有符号整数成员
        int64, int64, i64, MemberKind::Int64, 0i64
    );
    scalar_member!(
        /// 32 位无符号整数成员
        uint32, uint32, u32, MemberKind::UInt32, 0u32
    );
    scalar_member!(
        /// 64 位无符号整数成员
        uint64, uint64, u64, MemberKind::UInt64, 0u64
    );
    scalar_member!(
        /// 单精度浮点成员
        float, float, f32, MemberKind::Float, 0f32
    );
    scalar_member!(
        /// 双精度浮点成员
        double, double, f64, MemberKind::Double, 0f64
    );
    scalar_member!(
        /// 布尔成员
        boolean, bool, bool, MemberKind::Bool, false
    );

    /// 字符串成员
    pub fn string<T: Any>(
        tag: u32,
        name: &'static str,
        get: fn(&T) -> &str,
        set: fn(&mut T, String),
    ) -> Self {
        let encode: EncodeFn = Box::new(move |value, dst, _model| {
            let target = downcast_ref::<T>(value)?;
            let s = get(target);
            if !s.is_empty() {
                encoding::encode_key(tag, WireType::LengthDelimited, dst);
                encoding::encode_varint(s.len() as u64, dst);
                dst.put_slice(s.as_bytes());
            }
            Ok(())
        });
        let decode: DecodeFn = Box::new(move |value, wire_type, src, _model, _depth| {
            let target = downcast_mut::<T>(value)?;
            let mut s = String::new();
            encoding::string::merge(wire_type, &mut s, src, DecodeContext::default())?;
            set(target, s);
            Ok(())
        });
        Self {
            tag,
            name,
            value_type: TypeToken::opaque::<String>(),
            kind: MemberKind::Str,
            codec: Some(MemberCodec { encode, decode }),
        }
    }

    /// 原始字节成员
    pub fn bytes<T: Any>(
        tag: u32,
        name: &'static str,
        get: fn(&T) -> &[u8],
        set: fn(&mut T, Vec<u8>),
    ) -> Self {
        let encode: EncodeFn = Box::new(move |value, dst, _model| {
            let target = downcast_ref::<T>(value)?;
            let b = get(target);
            if !b.is_empty() {
                encoding::encode_key(tag, WireType::LengthDelimited, dst);
                encoding::encode_varint(b.len() as u64, dst);
                dst.put_slice(b);
            }
            Ok(())
        });
        let decode: DecodeFn = Box::new(move |value, wire_type, src, _model, _depth| {
            let target = downcast_mut::<T>(value)?;
            let mut b: Vec<u8> = Vec::new();
            encoding::bytes::merge(wire_type, &mut b, src, DecodeContext::default())?;
            set(target, b);
            Ok(())
        });
        Self {
            tag,
            name,
            value_type: TypeToken::opaque::<Vec<u8>>(),
            kind: MemberKind::Bytes,
            codec: Some(MemberCodec { encode, decode }),
        }
    }

    /// 日期时间成员（well-known Timestamp）
    pub fn timestamp<T: Any>(
        tag: u32,
        name: &'static str,
        get: fn(&T) -> Option<&prost_types::Timestamp>,
        set: fn(&mut T, prost_types::Timestamp),
    ) -> Self {
        let encode: EncodeFn = Box::new(move |value, dst, _model| {
            let target = downcast_ref::<T>(value)?;
            if let Some(ts) = get(target) {
                encoding::message::encode(tag, ts, dst);
            }
            Ok(())
        });
        let decode: DecodeFn = Box::new(move |value, wire_type, src, _model, _depth| {
            let target = downcast_mut::<T>(value)?;
            let mut ts = prost_types::Timestamp::default();
            encoding::message::merge(wire_type, &mut ts, src, DecodeContext::default())?;
            set(target, ts);
            Ok(())
        });
        Self {
            tag,
            name,
            value_type: TypeToken::opaque::<prost_types::Timestamp>(),
            kind: MemberKind::Timestamp,
            codec: Some(MemberCodec { encode, decode }),
        }
    }

    /// 嵌套契约类型成员
    ///
    /// 字段值的编解码经由线上模型完成，因此字段类型必须先被注册。
    pub fn message<T: Any, F: WireContract>(
        tag: u32,
        name: &'static str,
        get: fn(&T) -> Option<&F>,
        set: fn(&mut T, F),
    ) -> Self {
        let encode: EncodeFn = Box::new(move |value, dst, model| {
            let target = downcast_ref::<T>(value)?;
            if let Some(field) = get(target) {
                let mut payload = BytesMut::new();
                model.encode_value(TypeId::of::<F>(), field, &mut payload)?;
                encoding::encode_key(tag, WireType::LengthDelimited, dst);
                encoding::encode_varint(payload.len() as u64, dst);
                dst.put_slice(&payload);
            }
            Ok(())
        });
        let decode: DecodeFn = Box::new(move |value, wire_type, src, model, depth| {
            let target = downcast_mut::<T>(value)?;
            if wire_type != WireType::LengthDelimited {
                return Err(SchemaError::decode(format!(
                    "字段 {} 需要长度前缀编码",
                    tag
                )));
            }
            let len = encoding::decode_varint(src)? as usize;
            if len > src.remaining() {
                return Err(SchemaError::decode("长度前缀超出剩余缓冲".to_string()));
            }
            let mut payload = src.split_to(len);
            let boxed = model.decode_value(TypeId::of::<F>(), &mut payload, depth + 1)?;
            let field = boxed
                .downcast::<F>()
                .map_err(|_| SchemaError::type_mismatch(std::any::type_name::<F>()))?;
            set(target, *field);
            Ok(())
        });
        Self {
            tag,
            name,
            value_type: TypeToken::of::<F>(),
            kind: MemberKind::Message,
            codec: Some(MemberCodec { encode, decode }),
        }
    }

    /// 值类型不可表示的成员
    ///
    /// 保留声明但不参与编解码，对应"部分模式优于整体失败"的策略：
    /// 该成员在线上模式中缺席，而不是让整个类型注册失败。
    pub fn opaque<V: Any>(tag: u32, name: &'static str) -> Self {
        Self {
            tag,
            name,
            value_type: TypeToken::opaque::<V>(),
            kind: MemberKind::Opaque,
            codec: None,
        }
    }

    /// 线位号
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// 成员名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 成员值类型的标记
    pub fn value_type(&self) -> TypeToken {
        self.value_type
    }

    /// 线上种类
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// 该成员是否参与编解码
    pub fn is_encodable(&self) -> bool {
        self.codec.is_some()
    }

    /// 将成员值编码进输出缓冲
    ///
    /// 不可表示的成员直接跳过。
    pub fn encode_into(
        &self,
        value: &dyn Any,
        dst: &mut BytesMut,
        model: &dyn WireFormat,
    ) -> Result<(), SchemaError> {
        match &self.codec {
            Some(codec) => (codec.encode)(value, dst, model),
            None => Ok(()),
        }
    }

    /// 从输入缓冲合并成员值
    pub fn merge_from(
        &self,
        value: &mut dyn Any,
        wire_type: WireType,
        src: &mut Bytes,
        model: &dyn WireFormat,
        depth: usize,
    ) -> Result<(), SchemaError> {
        match &self.codec {
            Some(codec) => (codec.decode)(value, wire_type, src, model, depth),
            None => Err(SchemaError::decode(format!(
                "成员 {} 不参与编解码",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
