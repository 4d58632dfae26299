//! 预知类型集合
//!
//! 底层编解码器无需注册即可处理的类型。构造时一次性播种，
//! 之后只读。注册流程用它做第一道短路。

use std::any::TypeId;
use std::collections::HashSet;

/// 预知类型集合
#[derive(Debug, Clone)]
pub struct PreknownTypes {
    ids: HashSet<TypeId>,
}

impl PreknownTypes {
    /// 播种 prost 线格式原生支持的标准类型集
    ///
    /// 数值原语、文本、原始字节和 well-known 日期时间。
    pub fn standard() -> Self {
        let mut ids = HashSet::new();
        ids.insert(TypeId::of::<i32>());
        ids.insert(TypeId::of::<i64>());
        ids.insert(TypeId::of::<u32>());
        ids.insert(TypeId::of::<u64>());
        ids.insert(TypeId::of::<f32>());
        ids.insert(TypeId::of::<f64>());
        ids.insert(TypeId::of::<bool>());
        ids.insert(TypeId::of::<String>());
        ids.insert(TypeId::of::<Vec<u8>>());
        ids.insert(TypeId::of::<bytes::Bytes>());
        ids.insert(TypeId::of::<prost_types::Timestamp>());
        Self { ids }
    }

    /// 查询类型是否预知
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.ids.contains(&type_id)
    }

    /// 集合大小
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 集合是否为空
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for PreknownTypes {
    fn default() -> Self {
        Self::standard()
    }
}
