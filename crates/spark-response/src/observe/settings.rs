//! 收尾日志配置：按终态选择日志级别，从 TOML 加载。

use serde::Deserialize;

use crate::{error::ResponseError, signal::CloseKind};

/// 收尾日志的输出级别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 不输出。
    Off,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 按终态配置的收尾日志级别。
///
/// # 教案式说明
/// - **意图 (Why)**：取消通常由客户端主动发起，不应与上游失败混在同一告警级别；
///   运维需要在不改代码的情况下调整三种终态的日志噪音。
/// - **契约 (What)**：
///   - 缺省字段取默认值：`success = "debug"`、`failure = "warn"`、`cancelled = "info"`；
///   - 未知字段视为配置错误，解析返回 [`ResponseError::InvalidSettings`]。
///
/// ```toml
/// success = "off"
/// failure = "error"
/// cancelled = "debug"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloseLogSettings {
    /// 正常结束时的级别。
    pub success: LogLevel,
    /// 失败时的级别。
    pub failure: LogLevel,
    /// 取消时的级别。
    pub cancelled: LogLevel,
}

impl Default for CloseLogSettings {
    fn default() -> Self {
        Self {
            success: LogLevel::Debug,
            failure: LogLevel::Warn,
            cancelled: LogLevel::Info,
        }
    }
}

impl CloseLogSettings {
    /// 从 TOML 文本解析配置。
    pub fn from_toml_str(input: &str) -> Result<Self, ResponseError> {
        Ok(toml::from_str(input)?)
    }

    /// 终态对应的日志级别。
    pub fn level_for(&self, kind: CloseKind) -> LogLevel {
        match kind {
            CloseKind::Success => self.success,
            CloseKind::Failure => self.failure,
            CloseKind::Cancelled => self.cancelled,
        }
    }
}
