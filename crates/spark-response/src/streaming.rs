//! 流式响应能力与参考实现。
//!
//! # 教案式说明
//! - **意图 (Why)**：服务端流、分块传输等场景以“若干数据块 + 一个终止事件”描述响应；
//!   收尾观测只需要终止事件，不触碰数据块本身。
//! - **逻辑 (How)**：[`StreamingResponse`] 只要求暴露流自带的收尾信号；[`StreamResponse`]
//!   则把任意 `Stream<Item = Result<T, E>>` 包装为满足该能力的响应，在透传数据块的同时
//!   根据终止方式写入信号。
//! - **契约 (What)**：包装层不缓冲、不发出需求信号，也不改变被包装流的所有权与背压语义——
//!   数据块在被消费者拉取时才向上游拉取。

use std::{
    error::Error,
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures_util::{
    Stream, StreamExt,
    stream::{BoxStream, FusedStream},
};
use parking_lot::Mutex;

use crate::{
    error::ErrorCause,
    response::{Response, ResponseShape},
    signal::{CloseOutcome, CompletionSignal},
};

/// 流式响应能力：暴露流自身的收尾信号。
///
/// # 契约说明（What）
/// - 返回的信号必须是流自己的终止信号本身（或其克隆句柄），多次调用观察同一个终态；
/// - 终态语义：正常结尾为 `Success`，上游/传输错误为 `Failure(cause)`，
///   消费者在自然终止前取消订阅为 `Cancelled`。
pub trait StreamingResponse: Send + Sync {
    /// 返回流自身的终止信号。
    fn stream_close_signal(&self) -> CompletionSignal;
}

/// 基于 `futures::Stream` 的流式响应。
///
/// # 教案式说明
/// - **意图 (Why)**：生产方通常已经拥有一个结果流（例如解码后的帧序列），
///   只需在其上附加终止观测即可接入收尾契约。
/// - **逻辑 (How)**：
///   1. 上游返回 `Ok(item)` 时原样透传；
///   2. 首个 `Err(e)` 被包装为 [`ErrorCause`]，同一份原因既交给消费者又写入信号，随后流进入熔断态；
///   3. 上游返回 `None` 时写入 `Success`；
///   4. 消费者调用 [`cancel`](Self::cancel) 或在终止前丢弃本对象时写入 `Cancelled`。
/// - **契约 (What)**：
///   - 生产方应先通过 [`close_handle`](Self::close_handle) 把信号交给基础设施，再把流本身交给消费者；
///   - 熔断后继续轮询恒返回 `None`。
/// - **风险提示 (Trade-offs)**：内部流以互斥锁包裹只是为了满足 `Sync`，实际访问全部经由
///   `&mut self`（`get_mut`），不会产生锁竞争。
pub struct StreamResponse<T> {
    upstream: Mutex<Option<BoxStream<'static, Result<T, ErrorCause>>>>,
    signal: CompletionSignal,
}

impl<T: 'static> StreamResponse<T> {
    /// 包装以具体错误类型结束的流。
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::from_causes(stream.map(|item| item.map_err(|err| Arc::new(err) as ErrorCause)))
    }

    /// 包装错误已经是 [`ErrorCause`] 的流。
    pub fn from_causes<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, ErrorCause>> + Send + 'static,
    {
        Self {
            upstream: Mutex::new(Some(stream.boxed())),
            signal: CompletionSignal::new(),
        }
    }
}

impl<T> StreamResponse<T> {
    /// 返回流的收尾信号句柄。
    pub fn close_handle(&self) -> CompletionSignal {
        self.signal.clone()
    }

    /// 流是否仍可产出数据。
    pub fn is_open(&self) -> bool {
        self.upstream.lock().is_some()
    }

    /// 消费者主动取消订阅；返回 `true` 表示本次调用终止了流。
    pub fn cancel(&mut self) -> bool {
        if self.upstream.get_mut().take().is_none() {
            return false;
        }
        self.signal.resolve(CloseOutcome::Cancelled)
    }
}

impl<T> Stream for StreamResponse<T> {
    type Item = Result<T, ErrorCause>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let slot = this.upstream.get_mut();
        let Some(upstream) = slot.as_mut() else {
            return Poll::Ready(None);
        };
        match upstream.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(cause))) => {
                *slot = None;
                this.signal
                    .resolve(CloseOutcome::from_failure(Arc::clone(&cause)));
                Poll::Ready(Some(Err(cause)))
            }
            Poll::Ready(None) => {
                *slot = None;
                this.signal.resolve(CloseOutcome::Success);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> FusedStream for StreamResponse<T> {
    fn is_terminated(&self) -> bool {
        self.upstream.lock().is_none()
    }
}

impl<T> Drop for StreamResponse<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> StreamingResponse for StreamResponse<T> {
    fn stream_close_signal(&self) -> CompletionSignal {
        self.close_handle()
    }
}

impl<T> Response for StreamResponse<T> {
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Streaming(self)
    }
}

impl<T> fmt::Debug for StreamResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}
