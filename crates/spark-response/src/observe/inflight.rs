//! 在途响应计数：连接排空前确认所有响应均已结束。

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use crate::{error::ResponseError, response::Response, signal::CloseKind};

/// 尚未结束的响应计数器，供连接排空判断。
///
/// # 教案式说明
/// - **意图 (Why)**：优雅关闭连接前需要知道还有多少响应在途；计数器只依赖收尾信号，
///   对流式与单值响应一视同仁。
/// - **逻辑 (How)**：[`track`](Self::track) 先递增在途计数，再登记监听者；监听者在终止时按终态
///   递增对应累计值并递减在途计数。若响应已经结束，监听者立即执行，计数随即回落。
/// - **契约 (What)**：每个被追踪的响应恰好递增、递减各一次；[`snapshot`](Self::snapshot)
///   的各字段分别原子读取，并发更新时字段之间可能存在瞬时不一致。
#[derive(Clone, Debug, Default)]
pub struct InflightResponses {
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    inflight: AtomicUsize,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

/// 计数器快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InflightSnapshot {
    /// 尚未结束的响应数。
    pub inflight: usize,
    /// 累计成功数。
    pub succeeded: u64,
    /// 累计失败数。
    pub failed: u64,
    /// 累计取消数。
    pub cancelled: u64,
}

impl InflightResponses {
    /// 创建空计数器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始追踪响应。
    pub fn track<R>(&self, response: &R) -> Result<(), ResponseError>
    where
        R: Response + ?Sized,
    {
        let signal = response.close_signal()?;
        self.counters.inflight.fetch_add(1, Ordering::AcqRel);
        let counters = Arc::clone(&self.counters);
        signal.register(move |outcome| {
            let total = match outcome.kind() {
                CloseKind::Success => &counters.succeeded,
                CloseKind::Failure => &counters.failed,
                CloseKind::Cancelled => &counters.cancelled,
            };
            total.fetch_add(1, Ordering::AcqRel);
            counters.inflight.fetch_sub(1, Ordering::AcqRel);
        });
        Ok(())
    }

    /// 当前在途响应数。
    pub fn inflight(&self) -> usize {
        self.counters.inflight.load(Ordering::Acquire)
    }

    /// 所有被追踪的响应是否都已结束。
    pub fn is_drained(&self) -> bool {
        self.inflight() == 0
    }

    /// 读取全部计数。
    pub fn snapshot(&self) -> InflightSnapshot {
        InflightSnapshot {
            inflight: self.inflight(),
            succeeded: self.counters.succeeded.load(Ordering::Acquire),
            failed: self.counters.failed.load(Ordering::Acquire),
            cancelled: self.counters.cancelled.load(Ordering::Acquire),
        }
    }
}
