//! 收尾信号的 Loom 并发模型。
//!
//! 运行方式：`RUSTFLAGS="--cfg spark_loom" cargo test -p spark-response --features loom-model --test loom_signal`。
#![cfg(any(loom, spark_loom))]

use loom::{
    model,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};
use spark_response::{CloseOutcome, CompletionSignal};

#[test]
fn register_racing_resolve_fires_exactly_once() {
    //
    // 教案级说明：登记与终止并发发生时，监听者要么在终止时被派发，要么在登记时立即执行；
    // 两条路径互斥，因此无论调度如何交错，计数都必须恰好为 1。
    model(|| {
        let signal = CompletionSignal::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let resolver = {
            let signal = signal.clone();
            thread::spawn(move || signal.resolve(CloseOutcome::Success))
        };
        let listener = {
            let signal = signal.clone();
            let fired = Arc::clone(&fired);
            thread::spawn(move || {
                signal.register(move |outcome| {
                    assert!(outcome.is_success());
                    fired.fetch_add(1, Ordering::SeqCst);
                });
            })
        };

        assert!(resolver.join().expect("终止线程不应 panic"));
        listener.join().expect("登记线程不应 panic");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn competing_resolutions_agree_on_first_outcome() {
    model(|| {
        let signal = CompletionSignal::new();

        let success = {
            let signal = signal.clone();
            thread::spawn(move || signal.resolve(CloseOutcome::Success))
        };
        let cancel = {
            let signal = signal.clone();
            thread::spawn(move || signal.resolve(CloseOutcome::Cancelled))
        };

        let won_success = success.join().expect("线程不应 panic");
        let won_cancel = cancel.join().expect("线程不应 panic");
        assert!(won_success ^ won_cancel, "恰好一个终止调用胜出");

        let expected = if won_success {
            CloseOutcome::Success
        } else {
            CloseOutcome::Cancelled
        };
        assert_eq!(signal.outcome(), Some(expected));
    });
}
