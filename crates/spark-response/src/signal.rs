//! 收尾信号：统一流式与单值响应的一次性终止通知。

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use crate::{
    error::{ErrorCause, ResponseCancelled},
    oneshot::{OneShot, WaitKey},
};

/// 响应的终态。
///
/// # 教案式说明
/// - **意图 (Why)**：日志、指标、连接排空等下游只关心“响应以何种方式结束”，
///   三态划分让取消与失败可区分，避免把客户端主动取消记录为错误。
/// - **契约 (What)**：
///   - `Success`：流到达正常结尾，或单值成功产出；
///   - `Failure(cause)`：上游/传输失败，携带原始原因；
///   - `Cancelled`：消费者在自然终止前取消。
/// - **比较语义**：`Failure` 仅在两侧共享同一个 [`ErrorCause`] 分配时相等，
///   这正是“同一次终止被多个观察者看到”的判据。
#[derive(Clone, Debug)]
pub enum CloseOutcome {
    /// 正常结束。
    Success,
    /// 上游或传输失败，携带原始原因。
    Failure(ErrorCause),
    /// 消费者在自然终止前取消。
    Cancelled,
}

/// [`CloseOutcome`] 的无负载标签，供配置与日志字段使用。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloseKind {
    /// 对应 [`CloseOutcome::Success`]。
    Success,
    /// 对应 [`CloseOutcome::Failure`]。
    Failure,
    /// 对应 [`CloseOutcome::Cancelled`]。
    Cancelled,
}

impl CloseKind {
    /// 小写标签，与配置键及日志字段取值一致。
    pub fn as_str(self) -> &'static str {
        match self {
            CloseKind::Success => "success",
            CloseKind::Failure => "failure",
            CloseKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CloseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CloseOutcome {
    /// 将失败原因映射为终态；带取消语义的原因（[`ResponseCancelled`]）映射为 `Cancelled`。
    pub fn from_failure(cause: ErrorCause) -> Self {
        if cause.downcast_ref::<ResponseCancelled>().is_some() {
            CloseOutcome::Cancelled
        } else {
            CloseOutcome::Failure(cause)
        }
    }

    /// 丢弃失败原因后的标签。
    pub fn kind(&self) -> CloseKind {
        match self {
            CloseOutcome::Success => CloseKind::Success,
            CloseOutcome::Failure(_) => CloseKind::Failure,
            CloseOutcome::Cancelled => CloseKind::Cancelled,
        }
    }

    /// 是否正常结束。
    pub fn is_success(&self) -> bool {
        matches!(self, CloseOutcome::Success)
    }

    /// 是否以失败结束；取消不算失败。
    pub fn is_failure(&self) -> bool {
        matches!(self, CloseOutcome::Failure(_))
    }

    /// 是否被取消。
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CloseOutcome::Cancelled)
    }

    /// 失败原因（仅 `Failure` 时存在）。
    pub fn failure(&self) -> Option<&ErrorCause> {
        match self {
            CloseOutcome::Failure(cause) => Some(cause),
            _ => None,
        }
    }
}

impl PartialEq for CloseOutcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CloseOutcome::Success, CloseOutcome::Success) => true,
            (CloseOutcome::Cancelled, CloseOutcome::Cancelled) => true,
            (CloseOutcome::Failure(a), CloseOutcome::Failure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for CloseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseOutcome::Failure(cause) => write!(f, "failure: {cause}"),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

/// 一次性收尾信号。
///
/// # 教案式说明
/// - **意图 (Why)**：基础设施持有响应引用时不应关心其具体形态；收尾信号把“流结束/值就绪”抹平为同一种
///   可监听的对象，并且可以在任意线程、任意时刻（终止前后均可）挂接监听者。
/// - **逻辑 (How)**：句柄内部以 [`Arc`] 共享一次性单元，`clone` 得到的句柄观察同一个终态；
///   `resolve` 与 `register` 在同一把锁下判定状态，注册与终止之间没有竞态窗口。
/// - **契约 (What)**：
///   - `resolve`：终态只写入一次，后续调用返回 `false`，从不 panic；
///   - `register`：已终止则立即回调，否则在终止时回调，恰好一次；
///   - `wait`：返回不阻塞线程的 Future，仅登记唤醒器；
///   - 信号本身不可取消，只有被观察对象的取消会以 `Cancelled` 终态体现。
/// - **资源 (Trade-offs)**：信号不持有需显式释放的资源，最后一个句柄与监听者释放后即被回收。
#[derive(Clone)]
pub struct CompletionSignal {
    cell: Arc<OneShot<CloseOutcome>>,
}

impl CompletionSignal {
    /// 创建处于开放态的信号。
    pub fn new() -> Self {
        Self {
            cell: Arc::new(OneShot::new()),
        }
    }

    /// 创建已经终止的信号，常用于“构造即完成”的响应。
    pub fn closed(outcome: CloseOutcome) -> Self {
        Self {
            cell: Arc::new(OneShot::with_value(outcome)),
        }
    }

    /// 写入终态；返回 `true` 表示本次调用完成了终止。
    pub fn resolve(&self, outcome: CloseOutcome) -> bool {
        self.cell.set(outcome)
    }

    /// 登记终止监听者。
    pub fn register<F>(&self, listener: F)
    where
        F: FnOnce(&CloseOutcome) + Send + 'static,
    {
        self.cell.subscribe(Box::new(listener));
    }

    /// 读取终态；开放态返回 `None`。
    pub fn outcome(&self) -> Option<CloseOutcome> {
        self.cell.get().map(|outcome| (*outcome).clone())
    }

    /// 是否已写入终态。
    pub fn is_closed(&self) -> bool {
        self.cell.is_set()
    }

    /// 两个句柄是否指向同一个信号。
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// 返回在终止时完成的 Future。
    pub fn wait(&self) -> Closed {
        Closed {
            cell: Arc::clone(&self.cell),
            slot: None,
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// [`CompletionSignal::wait`] 返回的 Future。
#[must_use = "futures do nothing unless polled"]
pub struct Closed {
    cell: Arc<OneShot<CloseOutcome>>,
    slot: Option<WaitKey>,
}

impl Future for Closed {
    type Output = CloseOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.cell
            .poll_get(&mut this.slot, cx)
            .map(|outcome| (*outcome).clone())
    }
}

impl Drop for Closed {
    fn drop(&mut self) {
        if let Some(key) = self.slot.take() {
            self.cell.forget(key);
        }
    }
}

impl fmt::Debug for Closed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closed")
            .field("ready", &self.cell.is_set())
            .finish()
    }
}
