//! 收尾信号的下游消费者。
//!
//! # 教案式说明
//! - **意图 (Why)**：访问日志与连接排空是收尾契约最典型的消费者，它们只依赖
//!   [`Response::close_signal`](crate::Response::close_signal)，从不检查响应形态。
//! - **结构 (How)**：
//!   - `settings`：从 TOML 读取的日志级别配置；
//!   - `logging`：按终态输出一条 `tracing` 事件；
//!   - `inflight`：统计尚未结束的响应，供连接排空判断。

mod inflight;
mod logging;
mod settings;

pub use inflight::{InflightResponses, InflightSnapshot};
pub use logging::CloseLogger;
pub use settings::{CloseLogSettings, LogLevel};
