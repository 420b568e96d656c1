#![deny(unsafe_code)]
#![doc = "spark-response: 统一流式响应与单值响应的收尾（close）观测契约。"]
#![doc = ""]
#![doc = "== 契约概览 =="]
#![doc = "1. 一个响应恰好具备两种能力之一：流式（数据块序列 + 终止事件）或单值（延迟产出的一个值）。"]
#![doc = "2. 基础设施只调用 `Response::close_signal`，得到统一的一次性收尾信号，从不检查响应形态。"]
#![doc = "3. 信号终态为成功、失败（携带原因）或取消三者之一，写入恰好一次；任意时刻登记的监听者恰好收到一次通知。"]
#![doc = ""]
#![doc = "== 非目标 =="]
#![doc = "本 Crate 不实现流缓冲、需求信号、重试、超时策略或值变换管线，这些属于两类协作方各自的职责。"]

//! # 模块结构
//! - [`signal`]：收尾信号与终态；
//! - [`streaming`]：流式能力与基于 `futures::Stream` 的参考实现；
//! - [`unary`]：单值能力与可写入一次的参考实现；
//! - [`response`]：按能力派发的统一入口；
//! - [`observe`]：收尾日志与在途计数等下游消费者；
//! - [`error`]：同步错误与稳定错误码。
//!
//! # 示例
//! ```rust
//! use spark_response::{CloseOutcome, DeferredResponse, Response};
//!
//! let response = DeferredResponse::<String>::new();
//! let signal = response.close_signal().expect("单值响应具备收尾能力");
//! signal.register(|outcome| assert!(outcome.is_success()));
//! response.complete("hello".to_owned());
//! assert_eq!(signal.outcome(), Some(CloseOutcome::Success));
//! ```

pub mod error;
pub mod observe;
mod oneshot;
pub mod response;
pub mod signal;
pub mod streaming;
mod sync;
pub mod unary;

pub use error::{ErrorCause, ResponseCancelled, ResponseError};
pub use observe::{CloseLogSettings, CloseLogger, InflightResponses, InflightSnapshot, LogLevel};
pub use response::{AnyResponse, Response, ResponseShape};
pub use signal::{CloseKind, CloseOutcome, Closed, CompletionSignal};
pub use streaming::{StreamResponse, StreamingResponse};
pub use unary::{DeferredResponse, Settle, Settled, SettledListener, UnaryClose, UnaryResponse};
