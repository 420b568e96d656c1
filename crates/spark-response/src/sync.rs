//! 同步原语垫片。
//!
//! 教案级说明：为了让 Loom 在模型检查阶段捕获一次性单元内部锁的所有调度交错，
//! 启用 `--cfg loom`（或 `--cfg spark_loom`）时切换到 Loom 提供的互斥锁；
//! 常规构建使用 `parking_lot`，避免中毒语义带来的额外分支。`Arc` 保持标准实现，
//! 以维持 `Arc::ptr_eq` 等 API 在两条轨道上的一致性。

#[cfg(not(any(loom, spark_loom)))]
mod imp {
    pub(crate) type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

    #[derive(Debug, Default)]
    pub(crate) struct Mutex<T>(parking_lot::Mutex<T>);

    impl<T> Mutex<T> {
        pub(crate) fn new(value: T) -> Self {
            Self(parking_lot::Mutex::new(value))
        }

        pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock()
        }
    }
}

#[cfg(any(loom, spark_loom))]
mod imp {
    use std::sync::PoisonError;

    pub(crate) type MutexGuard<'a, T> = loom::sync::MutexGuard<'a, T>;

    #[derive(Debug)]
    pub(crate) struct Mutex<T>(loom::sync::Mutex<T>);

    impl<T> Mutex<T> {
        pub(crate) fn new(value: T) -> Self {
            Self(loom::sync::Mutex::new(value))
        }

        // 监听者在锁外执行，锁内不会 panic；中毒时直接取回内部状态。
        pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

pub(crate) use imp::Mutex;
