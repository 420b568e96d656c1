//! 收尾访问日志：每个响应结束时输出一条结构化 `tracing` 事件。

use std::{borrow::Cow, sync::Arc};

use tracing::Level;

use super::settings::{CloseLogSettings, LogLevel};
use crate::{
    error::ResponseError,
    response::Response,
    signal::{CloseOutcome, CompletionSignal},
};

/// 收尾访问日志。
///
/// # 教案式说明
/// - **意图 (Why)**：每个响应结束时输出一条结构化事件，字段固定为
///   `response`（调用方给出的标签）、`outcome`（`success|failure|cancelled`）与 `error`（失败原因）。
/// - **逻辑 (How)**：[`attach`](Self::attach) 取得收尾信号并登记一个监听者；
///   监听者按 [`CloseLogSettings`] 选择级别，`Off` 时不输出。
/// - **契约 (What)**：能力违约原样返回给调用方，不登记任何监听者。
#[derive(Clone, Debug, Default)]
pub struct CloseLogger {
    settings: Arc<CloseLogSettings>,
}

impl CloseLogger {
    /// 以给定配置创建。
    pub fn new(settings: CloseLogSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// 当前生效的配置。
    pub fn settings(&self) -> &CloseLogSettings {
        &self.settings
    }

    /// 为响应挂接收尾日志，返回所观察的信号。
    pub fn attach<R>(
        &self,
        response: &R,
        label: impl Into<Cow<'static, str>>,
    ) -> Result<CompletionSignal, ResponseError>
    where
        R: Response + ?Sized,
    {
        let signal = response.close_signal()?;
        let settings = Arc::clone(&self.settings);
        let label = label.into();
        signal.register(move |outcome| {
            emit(settings.level_for(outcome.kind()), &label, outcome);
        });
        Ok(signal)
    }
}

fn emit(level: LogLevel, label: &str, outcome: &CloseOutcome) {
    let error = outcome.failure().map(ToString::to_string);
    macro_rules! close_event {
        ($level:expr) => {
            tracing::event!(
                $level,
                response = label,
                outcome = outcome.kind().as_str(),
                error = error.as_deref(),
                "response closed"
            )
        };
    }
    match level {
        LogLevel::Off => {}
        LogLevel::Trace => close_event!(Level::TRACE),
        LogLevel::Debug => close_event!(Level::DEBUG),
        LogLevel::Info => close_event!(Level::INFO),
        LogLevel::Warn => close_event!(Level::WARN),
        LogLevel::Error => close_event!(Level::ERROR),
    }
}
