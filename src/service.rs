//! 序列化服务门面
//!
//! 把注册表包进 `Arc<Mutex<…>>`，得到一个可克隆、可跨线程共享的
//! 序列化入口。所有克隆共享同一份模式：任一处完成的注册对全部
//! 克隆立即可见。

use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use wireforge_config::CodecConfig;
use wireforge_registry::SchemaRegistry;
use wireforge_schema::{TypeToken, WireContract};

use crate::{Error, Result};

/// 线程安全的序列化服务
///
/// `Clone` 共享底层注册表。典型用法是启动阶段注册全部消息类型，
/// 随后把克隆分发给各工作线程只做编解码。
#[derive(Clone)]
pub struct SerializerService {
    registry: Arc<Mutex<SchemaRegistry>>,
}

impl SerializerService {
    /// 创建使用默认配置的服务
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(SchemaRegistry::new())),
        }
    }

    /// 创建使用指定编解码配置的服务
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(SchemaRegistry::with_config(config))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SchemaRegistry>> {
        self.registry.lock().map_err(|_| Error::LockPoisoned)
    }

    /// 注册类型 `T` 及其可达类型图
    pub fn register<T: WireContract>(&self) -> Result<bool> {
        Ok(self.lock()?.register::<T>()?)
    }

    /// 以类型标记注册（动态入口）
    pub fn register_token(&self, token: Option<&TypeToken>) -> Result<bool> {
        Ok(self.lock()?.register_token(token)?)
    }

    /// 类型是否已提交到模式
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.registry
            .lock()
            .map(|registry| registry.is_registered(type_id))
            .unwrap_or(false)
    }

    /// 编码一个 `T` 值
    pub fn encode<T: WireContract>(&self, value: &T) -> Result<Bytes> {
        Ok(self.lock()?.encode(value)?)
    }

    /// 以基类型 `B` 的模式编码动态值
    pub fn encode_as<B: WireContract>(&self, value: &dyn Any) -> Result<Bytes> {
        Ok(self.lock()?.encode_as::<B>(value)?)
    }

    /// 解码一个 `T` 值
    pub fn decode<T: WireContract>(&self, src: &[u8]) -> Result<T> {
        Ok(self.lock()?.decode::<T>(src)?)
    }

    /// 以基类型 `B` 的模式解码，动态类型可能是已链接的子类型
    pub fn decode_as<B: WireContract>(&self, src: &[u8]) -> Result<Box<dyn Any>> {
        Ok(self.lock()?.decode_as::<B>(src)?)
    }
}

impl Default for SerializerService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireforge_schema::{ContractDescriptor, MemberDescriptor};

    #[derive(Default, Debug, PartialEq)]
    struct Ping {
        sequence: i32,
    }

    impl WireContract for Ping {
        fn contract() -> ContractDescriptor {
            ContractDescriptor::new::<Self>().member(MemberDescriptor::int32(
                1,
                "sequence",
                |p: &Ping| p.sequence,
                |p, v| p.sequence = v,
            ))
        }
    }

    #[test]
    fn test_service_roundtrip() {
        let service = SerializerService::new();
        assert!(service.register::<Ping>().unwrap());

        let wire = service.encode(&Ping { sequence: 7 }).unwrap();
        let back: Ping = service.decode(&wire).unwrap();
        assert_eq!(back, Ping { sequence: 7 });
    }

    #[test]
    fn test_clones_share_schema() {
        let service = SerializerService::new();
        let clone = service.clone();

        assert!(service.register::<Ping>().unwrap());
        // 克隆看到同一份模式，重复注册幂等
        assert!(!clone.register::<Ping>().unwrap());
        assert!(clone.is_registered(TypeId::of::<Ping>()));
    }
}
