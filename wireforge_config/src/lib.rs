//! 编解码配置管理
//!
//! 提供线上模型的运行时配置，支持 TOML 文件和环境变量覆盖。

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析配置文件失败: {0}")]
    Parse(String),

    /// 验证错误
    #[error("配置验证失败: {0}")]
    Validation(String),

    /// 环境变量错误
    #[error("环境变量解析失败: {0}")]
    EnvVar(String),
}

/// 配置 Result 类型
pub type Result<T> = std::result::Result<T, ConfigError>;

/// 编解码配置
///
/// 约束线上模型在解码不可信负载时的资源消耗。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodecConfig {
    /// 解码时允许的最大嵌套深度
    #[serde(default = "default_max_decode_depth")]
    pub max_decode_depth: usize,

    /// 单个长度前缀负载的最大字节数
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
}

fn default_max_decode_depth() -> usize {
    64
}

fn default_max_value_bytes() -> usize {
    // 与典型帧体上限一致（16MB）
    16 * 1024 * 1024
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_decode_depth: default_max_decode_depth(),
            max_value_bytes: default_max_value_bytes(),
        }
    }
}

impl CodecConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("读取配置文件失败: {}", e)))?;

        let config: CodecConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("解析配置文件失败: {}", e)))?;

        Ok(config)
    }

    /// 从环境变量加载配置并覆盖
    ///
    /// 支持的环境变量：
    /// - WIREFORGE_MAX_DECODE_DEPTH: 最大解码嵌套深度
    /// - WIREFORGE_MAX_VALUE_BYTES: 单个负载最大字节数
    pub fn load_with_env_override(mut self) -> Result<Self> {
        // 最大嵌套深度
        if let Ok(depth) = std::env::var("WIREFORGE_MAX_DECODE_DEPTH") {
            self.max_decode_depth = depth.parse().map_err(|_| {
                ConfigError::EnvVar("WIREFORGE_MAX_DECODE_DEPTH 必须是有效的 usize 数字".to_string())
            })?;
        }

        // 负载字节上限
        if let Ok(bytes) = std::env::var("WIREFORGE_MAX_VALUE_BYTES") {
            self.max_value_bytes = bytes.parse().map_err(|_| {
                ConfigError::EnvVar("WIREFORGE_MAX_VALUE_BYTES 必须是有效的 usize 数字".to_string())
            })?;
        }

        Ok(self)
    }

    /// 从文件加载并应用环境变量覆盖
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file(path)?.load_with_env_override()
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.max_decode_depth == 0 {
            return Err(ConfigError::Validation("最大嵌套深度不能为 0".to_string()));
        }

        if self.max_value_bytes == 0 {
            return Err(ConfigError::Validation("负载字节上限不能为 0".to_string()));
        }

        Ok(())
    }

    /// 获取配置摘要信息
    pub fn summary(&self) -> String {
        format!(
            "CodecConfig {{ max_decode_depth: {}, max_value_bytes: {} }}",
            self.max_decode_depth, self.max_value_bytes
        )
    }
}
