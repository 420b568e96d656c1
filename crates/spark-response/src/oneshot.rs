//! 一次性结果单元：[`CompletionSignal`](crate::CompletionSignal) 与
//! [`DeferredResponse`](crate::DeferredResponse) 共享的底座。
//!
//! # 教案式说明
//! - **意图 (Why)**：收尾信号与单值响应都满足“创建时为空、至多写入一次、任意时刻注册的观察者恰好收到一次通知”
//!   的语义，差别只在于承载的值类型，因此抽出泛型单元统一实现，避免两套锁逻辑各自演化。
//! - **逻辑 (How)**：值、监听者与唤醒器全部放在同一把锁内，`set` 与 `subscribe` 在锁内完成“是否已写入”的判定，
//!   保证注册与写入之间不存在窗口；真正的回调在释放锁之后执行，允许监听者重入本单元。
//!   值以 [`Arc`] 保存，使锁外回调与后续查询都能共享同一份数据。
//! - **契约 (What)**：
//!   - `set` 首次调用返回 `true` 并派发所有已登记监听者，之后调用返回 `false` 且无副作用；
//!   - `subscribe` 在已写入时立即回调，否则在写入时回调，恰好一次；
//!   - 每个等待中的 Future 持有一个 [`WaitKey`] 槽位：重复轮询原地替换唤醒器，Future 释放时槽位随之移除，
//!     反复创建又丢弃的等待者不会在单元内累积；
//!   - 单个监听者 panic 会被捕获并记录日志，不影响其余监听者。

use std::{
    mem,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    task::{Context, Poll, Waker},
};

use crate::sync::Mutex;

/// 单元写入时触发的回调。
pub(crate) type Listener<T> = Box<dyn FnOnce(&T) + Send + 'static>;

/// 等待者在单元内的槽位编号。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WaitKey(u64);

struct State<T> {
    value: Option<Arc<T>>,
    listeners: Vec<Listener<T>>,
    wakers: Vec<(WaitKey, Waker)>,
    next_key: u64,
}

pub(crate) struct OneShot<T> {
    state: Mutex<State<T>>,
}

impl<T> OneShot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                value: None,
                listeners: Vec::new(),
                wakers: Vec::new(),
                next_key: 0,
            }),
        }
    }

    pub(crate) fn with_value(value: T) -> Self {
        let cell = Self::new();
        cell.set(value);
        cell
    }

    /// 写入终态值；仅首次调用生效。
    pub(crate) fn set(&self, value: T) -> bool {
        let (value, listeners, wakers) = {
            let mut state = self.state.lock();
            if state.value.is_some() {
                return false;
            }
            let value = Arc::new(value);
            state.value = Some(Arc::clone(&value));
            (
                value,
                mem::take(&mut state.listeners),
                mem::take(&mut state.wakers),
            )
        };
        for listener in listeners {
            invoke(listener, &value);
        }
        for (_, waker) in wakers {
            waker.wake();
        }
        true
    }

    /// 登记监听者；已写入时在当前调用栈上立即回调。
    pub(crate) fn subscribe(&self, listener: Listener<T>) {
        let value = {
            let mut state = self.state.lock();
            match state.value.clone() {
                Some(value) => value,
                None => {
                    state.listeners.push(listener);
                    return;
                }
            }
        };
        invoke(listener, &value);
    }

    pub(crate) fn get(&self) -> Option<Arc<T>> {
        self.state.lock().value.clone()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.state.lock().value.is_some()
    }

    /// 供 Future 使用：未写入时登记唤醒器。
    ///
    /// `slot` 由调用方 Future 持有：首次挂起时分配槽位，之后的轮询只在原槽位上替换唤醒器。
    pub(crate) fn poll_get(
        &self,
        slot: &mut Option<WaitKey>,
        cx: &mut Context<'_>,
    ) -> Poll<Arc<T>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(value) = &state.value {
            *slot = None;
            return Poll::Ready(Arc::clone(value));
        }
        let registered = match *slot {
            Some(key) => state.wakers.iter_mut().find(|(k, _)| *k == key),
            None => None,
        };
        match registered {
            Some((_, waker)) => {
                if !waker.will_wake(cx.waker()) {
                    *waker = cx.waker().clone();
                }
            }
            None => {
                let key = WaitKey(state.next_key);
                state.next_key += 1;
                state.wakers.push((key, cx.waker().clone()));
                *slot = Some(key);
            }
        }
        Poll::Pending
    }

    /// 释放等待者槽位；单元已写入或槽位不存在时无副作用。
    pub(crate) fn forget(&self, key: WaitKey) {
        let mut state = self.state.lock();
        if let Some(index) = state.wakers.iter().position(|(k, _)| *k == key) {
            state.wakers.swap_remove(index);
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_waiters(&self) -> usize {
        self.state.lock().wakers.len()
    }
}

fn invoke<T>(listener: Listener<T>, value: &T) {
    if panic::catch_unwind(AssertUnwindSafe(|| listener(value))).is_err() {
        tracing::error!("completion listener panicked; remaining listeners still run");
    }
}
