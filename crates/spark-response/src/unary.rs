//! 单值响应能力与参考实现。

use std::{
    error::Error,
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, OnceLock},
    task::{Context, Poll},
};

use crate::{
    error::ErrorCause,
    oneshot::{OneShot, WaitKey},
    response::{Response, ResponseShape},
    signal::{CloseOutcome, CompletionSignal},
};

/// 单值响应的终态，携带产出的值。
#[derive(Debug)]
pub enum Settled<T> {
    /// 成功产出的值。
    Value(T),
    /// 计算失败，携带原始原因。
    Failed(ErrorCause),
    /// 结果被显式取消。
    Cancelled,
}

impl<T> Settled<T> {
    /// 丢弃值，仅保留终止方式。
    ///
    /// 失败原因若带取消语义（见 [`ResponseCancelled`](crate::ResponseCancelled)）则映射为 `Cancelled`。
    pub fn outcome(&self) -> CloseOutcome {
        match self {
            Settled::Value(_) => CloseOutcome::Success,
            Settled::Failed(cause) => CloseOutcome::from_failure(Arc::clone(cause)),
            Settled::Cancelled => CloseOutcome::Cancelled,
        }
    }

    /// 成功值（仅 `Value` 时存在）。
    pub fn value(&self) -> Option<&T> {
        match self {
            Settled::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// 单值响应就绪时触发的回调。
pub type SettledListener<T> = Box<dyn FnOnce(&Settled<T>) + Send + 'static>;

/// 单值响应能力。
///
/// # 教案式说明
/// - **意图 (Why)**：简单的请求/响应 RPC 以一个延迟值表达结果；收尾观测只关心“值已就绪或计算失败”，
///   与值的类型、内容无关。
/// - **逻辑 (How)**：实现方只需提供延续登记 [`on_settled`](Self::on_settled) 与完成查询；
///   默认的 [`derive_close_signal`](Self::derive_close_signal) 每次调用创建新信号并登记一个丢弃值的监听者。
/// - **契约 (What)**：
///   - `on_settled`：就绪后立即回调，否则在就绪时回调，恰好一次；
///   - `derive_close_signal`：不要求返回同一对象，但所有返回信号携带相同终态；实现方可以覆盖为缓存版本。
pub trait UnaryResponse: Send + Sync {
    /// 响应产出的值类型。
    type Value;

    /// 登记就绪回调。
    fn on_settled(&self, listener: SettledListener<Self::Value>);

    /// 是否已经就绪（成功、失败或取消）。
    fn is_settled(&self) -> bool;

    /// 派生收尾信号。
    fn derive_close_signal(&self) -> CompletionSignal {
        let signal = CompletionSignal::new();
        let resolver = signal.clone();
        self.on_settled(Box::new(move |settled| {
            resolver.resolve(settled.outcome());
        }));
        signal
    }
}

/// [`UnaryResponse`] 的对象安全视图，擦除了值类型。
///
/// 所有 `UnaryResponse` 自动实现该 Trait；[`ResponseShape::Unary`] 借此在不知道值类型的情况下完成派发。
pub trait UnaryClose: Send + Sync {
    /// 转发至 [`UnaryResponse::derive_close_signal`]。
    fn close_signal_dyn(&self) -> CompletionSignal;

    /// 转发至 [`UnaryResponse::is_settled`]。
    fn is_settled_dyn(&self) -> bool;
}

impl<U> UnaryClose for U
where
    U: UnaryResponse + ?Sized,
{
    fn close_signal_dyn(&self) -> CompletionSignal {
        self.derive_close_signal()
    }

    fn is_settled_dyn(&self) -> bool {
        UnaryResponse::is_settled(self)
    }
}

/// 可写入一次的单值响应。
///
/// # 教案式说明
/// - **意图 (Why)**：为服务端处理器与客户端传输提供现成的单值协作方：一端写入结果，
///   另一端（以及任意数量的基础设施组件）观察结果。
/// - **逻辑 (How)**：句柄克隆后共享同一个一次性单元；`complete`/`fail`/`cancel` 竞争首次写入，
///   只有胜出者返回 `true`。收尾信号在首次请求时创建并缓存，之后的调用返回同一个信号。
/// - **契约 (What)**：
///   - 终态只写入一次；
///   - [`settled`](Self::settled) 与 [`wait`](Self::wait) 共享同一份 `Arc<Settled<T>>`，值不会被复制；
///   - 显式取消映射为 `Cancelled` 终态，与失败严格区分。
pub struct DeferredResponse<T> {
    inner: Arc<DeferredInner<T>>,
}

struct DeferredInner<T> {
    cell: OneShot<Settled<T>>,
    close: OnceLock<CompletionSignal>,
}

impl<T> DeferredResponse<T>
where
    T: Send + Sync + 'static,
{
    /// 创建尚未就绪的响应。
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DeferredInner {
                cell: OneShot::new(),
                close: OnceLock::new(),
            }),
        }
    }

    /// 创建已经成功就绪的响应。
    pub fn completed(value: T) -> Self {
        let response = Self::new();
        response.complete(value);
        response
    }

    /// 以成功值就绪。
    pub fn complete(&self, value: T) -> bool {
        self.settle(Settled::Value(value))
    }

    /// 以具体错误失败。
    pub fn fail<E>(&self, err: E) -> bool
    where
        E: Error + Send + Sync + 'static,
    {
        self.fail_with(Arc::new(err))
    }

    /// 以共享的失败原因失败。
    pub fn fail_with(&self, cause: ErrorCause) -> bool {
        self.settle(Settled::Failed(cause))
    }

    /// 显式取消。
    pub fn cancel(&self) -> bool {
        self.settle(Settled::Cancelled)
    }

    /// 读取终态；尚未就绪返回 `None`。
    pub fn settled(&self) -> Option<Arc<Settled<T>>> {
        self.inner.cell.get()
    }

    /// 返回在就绪时完成的 Future。
    pub fn wait(&self) -> Settle<T> {
        Settle {
            inner: Arc::clone(&self.inner),
            slot: None,
        }
    }

    /// 返回缓存的收尾信号。
    pub fn close_handle(&self) -> CompletionSignal {
        self.inner
            .close
            .get_or_init(|| {
                let signal = CompletionSignal::new();
                let resolver = signal.clone();
                self.inner.cell.subscribe(Box::new(move |settled| {
                    resolver.resolve(settled.outcome());
                }));
                signal
            })
            .clone()
    }

    fn settle(&self, settled: Settled<T>) -> bool {
        self.inner.cell.set(settled)
    }
}

impl<T> Default for DeferredResponse<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for DeferredResponse<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> UnaryResponse for DeferredResponse<T>
where
    T: Send + Sync + 'static,
{
    type Value = T;

    fn on_settled(&self, listener: SettledListener<T>) {
        self.inner.cell.subscribe(listener);
    }

    fn is_settled(&self) -> bool {
        self.inner.cell.is_set()
    }

    fn derive_close_signal(&self) -> CompletionSignal {
        self.close_handle()
    }
}

impl<T> Response for DeferredResponse<T>
where
    T: Send + Sync + 'static,
{
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Unary(self)
    }
}

impl<T> fmt::Debug for DeferredResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredResponse")
            .field("settled", &self.inner.cell.is_set())
            .finish()
    }
}

/// [`DeferredResponse::wait`] 返回的 Future。
#[must_use = "futures do nothing unless polled"]
pub struct Settle<T> {
    inner: Arc<DeferredInner<T>>,
    slot: Option<WaitKey>,
}

impl<T> Future for Settle<T> {
    type Output = Arc<Settled<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.inner.cell.poll_get(&mut this.slot, cx)
    }
}

impl<T> Drop for Settle<T> {
    fn drop(&mut self) {
        if let Some(key) = self.slot.take() {
            self.inner.cell.forget(key);
        }
    }
}
