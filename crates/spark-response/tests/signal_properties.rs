//! 收尾信号的性质测试。
//!
//! # 教案级说明
//! - **核心目标 (Why)**：监听者可以在终止前、终止后任意穿插登记，终止调用也可能被重复发起；
//!   无论顺序如何，每个监听者都必须恰好收到一次通知，且看到的是首个终止调用写入的终态。
//! - **设计手法 (How)**：用 Proptest 生成 `Register`/`Resolve` 事件序列，逐个施加到真实信号上，
//!   再与“首个 Resolve 决定终态”的影子模型比对。
//! - **边界 (What)**：序列可能不包含任何 `Resolve`，此时所有监听者都不得被触发。

use std::{io, sync::Arc};

use parking_lot::Mutex;
use proptest::prelude::*;
use spark_response::{CloseKind, CloseOutcome, CompletionSignal, ErrorCause};

#[derive(Clone, Debug)]
enum Event {
    Register,
    Resolve(CloseKind),
}

fn events() -> impl Strategy<Value = Vec<Event>> {
    let kind = prop_oneof![
        Just(CloseKind::Success),
        Just(CloseKind::Failure),
        Just(CloseKind::Cancelled),
    ];
    let event = prop_oneof![
        3 => Just(Event::Register),
        1 => kind.prop_map(Event::Resolve),
    ];
    prop::collection::vec(event, 0..32)
}

fn outcome_for(kind: CloseKind, cause: &ErrorCause) -> CloseOutcome {
    match kind {
        CloseKind::Success => CloseOutcome::Success,
        CloseKind::Failure => CloseOutcome::Failure(Arc::clone(cause)),
        CloseKind::Cancelled => CloseOutcome::Cancelled,
    }
}

proptest! {
    #[test]
    fn prop_every_listener_sees_first_outcome_once(events in events()) {
        let cause: ErrorCause = Arc::new(io::Error::other("property failure"));
        let signal = CompletionSignal::new();
        let mut listeners: Vec<Arc<Mutex<Vec<CloseOutcome>>>> = Vec::new();
        let mut first: Option<CloseOutcome> = None;

        for event in &events {
            match event {
                Event::Register => {
                    let seen = Arc::new(Mutex::new(Vec::new()));
                    let sink = Arc::clone(&seen);
                    signal.register(move |outcome| sink.lock().push(outcome.clone()));
                    listeners.push(seen);
                }
                Event::Resolve(kind) => {
                    let outcome = outcome_for(*kind, &cause);
                    let won = signal.resolve(outcome.clone());
                    prop_assert_eq!(won, first.is_none(), "只有首个终止调用胜出");
                    first.get_or_insert(outcome);
                }
            }
        }

        prop_assert_eq!(signal.outcome(), first.clone());
        for seen in &listeners {
            let seen = seen.lock();
            match &first {
                Some(expected) => prop_assert_eq!(seen.as_slice(), std::slice::from_ref(expected)),
                None => prop_assert!(seen.is_empty(), "未终止时监听者不得触发"),
            }
        }
    }
}
