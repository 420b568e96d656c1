//! 响应收尾契约的错误分层。
//!
//! # 教案式说明
//! - **意图 (Why)**：收尾观测只会遇到三类异常：结构性缺陷（能力违约）、上游失败与取消。
//!   其中只有能力违约需要在调用点同步返回，其余两类经由 [`CloseOutcome`](crate::CloseOutcome)
//!   交付给监听者，因此本模块只为同步路径定义错误枚举。
//! - **逻辑 (How)**：[`ResponseError`] 借助 `thiserror` 生成 `Display`/`Error`，并通过
//!   [`ResponseError::code`] 暴露稳定错误码，便于日志与告警按码聚合；上游失败统一收敛为
//!   [`ErrorCause`]，可在多个监听者之间零拷贝共享。
//! - **契约 (What)**：错误码遵循 `<域>.<语义>` 命名，登记在 [`codes`] 中，新增变体必须同步登记。

use std::{error::Error, sync::Arc};

/// 稳定错误码表。
pub mod codes {
    /// 响应既不是流式响应也不是单值响应。
    pub const CAPABILITY_VIOLATION: &str = "response.capability_violation";
    /// 收尾日志配置无法解析。
    pub const INVALID_SETTINGS: &str = "response.invalid_settings";
}

/// 上游失败的共享载体。
///
/// 同一个失败原因需要同时交给流的消费者与任意数量的收尾监听者，因此以 [`Arc`] 包裹，
/// 克隆只增加引用计数。
pub type ErrorCause = Arc<dyn Error + Send + Sync + 'static>;

/// 同步返回给调用方的错误。
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResponseError {
    /// 具体响应类型没有声明任何收尾能力。
    ///
    /// 该错误反映的是实现方的编程缺陷，而非运行期事件；调用方不应重试。
    #[error("response must be a StreamingResponse or a UnaryResponse: {type_name}")]
    CapabilityViolation {
        /// 违约的具体类型名，来自 [`core::any::type_name`]。
        type_name: &'static str,
    },
    /// 收尾日志配置解析失败。
    #[error("invalid close log settings: {source}")]
    InvalidSettings {
        #[from]
        source: toml::de::Error,
    },
}

impl ResponseError {
    /// 构造能力违约错误。
    pub fn capability_violation(type_name: &'static str) -> Self {
        Self::CapabilityViolation { type_name }
    }

    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::CapabilityViolation { .. } => codes::CAPABILITY_VIOLATION,
            Self::InvalidSettings { .. } => codes::INVALID_SETTINGS,
        }
    }
}

/// 带有“取消”语义的失败原因。
///
/// # 教案式说明
/// - **意图 (Why)**：部分单值协作方没有独立的取消原语，只能以失败结束数值；
///   使用该类型作为失败原因即可让收尾观测识别出取消，而不会把它当作错误记录。
/// - **契约 (What)**：[`CloseOutcome::from_failure`](crate::CloseOutcome::from_failure)
///   遇到该类型（含 `Arc`/`Box` 包裹后的动态类型）时返回 `Cancelled`。
#[derive(Debug, Default, Clone, PartialEq, Eq, thiserror::Error)]
#[error("response cancelled")]
pub struct ResponseCancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_violation_names_type_and_code() {
        let err = ResponseError::capability_violation("demo::Opaque");
        assert_eq!(err.code(), codes::CAPABILITY_VIOLATION);
        assert!(err.to_string().contains("demo::Opaque"));
    }

    #[test]
    fn invalid_settings_wraps_toml_error() {
        let source = toml::from_str::<toml::Value>("= broken").expect_err("非法 TOML 应解析失败");
        let err = ResponseError::from(source);
        assert_eq!(err.code(), codes::INVALID_SETTINGS);
        assert!(err.source().is_some(), "应保留底层 TOML 错误");
    }
}
