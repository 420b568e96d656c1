use std::{io, sync::Arc, thread};

use spark_response::{CloseOutcome, CompletionSignal, ErrorCause, Response};

use crate::{ResponseHarness, TckCase, support::Recorder};

pub(crate) fn cases<H: ResponseHarness>() -> [TckCase<H>; 7] {
    [
        TckCase {
            name: "signal_stays_open_until_termination",
            test: signal_stays_open_until_termination::<H>,
        },
        TckCase {
            name: "success_reported_exactly_once",
            test: success_reported_exactly_once::<H>,
        },
        TckCase {
            name: "failure_carries_original_cause",
            test: failure_carries_original_cause::<H>,
        },
        TckCase {
            name: "cancellation_is_distinct_from_failure",
            test: cancellation_is_distinct_from_failure::<H>,
        },
        TckCase {
            name: "repeated_calls_agree_on_outcome",
            test: repeated_calls_agree_on_outcome::<H>,
        },
        TckCase {
            name: "late_listener_observes_outcome",
            test: late_listener_observes_outcome::<H>,
        },
        TckCase {
            name: "concurrent_calls_register_independently",
            test: concurrent_calls_register_independently::<H>,
        },
    ]
}

fn signal_of<R: Response>(response: &R) -> CompletionSignal {
    response
        .close_signal()
        .expect("被测响应必须声明流式或单值能力")
}

fn upstream_cause() -> ErrorCause {
    Arc::new(io::Error::other("spark-response-tck upstream failure"))
}

/// 终止前信号必须保持开放：`close_signal` 是观察操作，不能触发终止。
fn signal_stays_open_until_termination<H: ResponseHarness>(harness: &H) {
    let mut response = harness.open();
    let signal = signal_of(&response);
    assert!(!signal.is_closed(), "新建响应的信号必须处于开放态");
    assert!(signal.outcome().is_none());
    harness.succeed(&mut response);
    assert!(signal.is_closed(), "终止后信号必须关闭");
}

/// 终止前登记的多个监听者各收到一次成功通知。
fn success_reported_exactly_once<H: ResponseHarness>(harness: &H) {
    let mut response = harness.open();
    let signal = signal_of(&response);
    let first = Recorder::default();
    let second = Recorder::default();
    first.listen(&signal);
    second.listen(&signal);

    harness.succeed(&mut response);

    assert_eq!(first.outcomes(), vec![CloseOutcome::Success]);
    assert_eq!(second.outcomes(), vec![CloseOutcome::Success]);
}

/// 失败终态必须携带原始原因（同一份分配），不做分类或包装。
fn failure_carries_original_cause<H: ResponseHarness>(harness: &H) {
    let mut response = harness.open();
    let signal = signal_of(&response);
    let cause = upstream_cause();

    harness.fail(&mut response, Arc::clone(&cause));

    let outcome = signal.outcome().expect("失败后信号必须关闭");
    let reported = outcome.failure().expect("终态必须为失败");
    assert!(Arc::ptr_eq(reported, &cause), "失败原因必须原样透传");
}

/// 取消是独立终态，不得表现为失败。
fn cancellation_is_distinct_from_failure<H: ResponseHarness>(harness: &H) {
    let mut response = harness.open();
    let signal = signal_of(&response);
    let recorder = Recorder::default();
    recorder.listen(&signal);

    harness.cancel(&mut response);

    assert_eq!(recorder.outcomes(), vec![CloseOutcome::Cancelled]);
    assert!(signal.outcome().is_some_and(|o| !o.is_failure()));
}

/// 终止前多次调用得到的信号（不要求同一对象）报告相同终态。
fn repeated_calls_agree_on_outcome<H: ResponseHarness>(harness: &H) {
    let mut response = harness.open();
    let a = signal_of(&response);
    let b = signal_of(&response);
    let cause = upstream_cause();

    harness.fail(&mut response, Arc::clone(&cause));

    let expected = CloseOutcome::Failure(cause);
    assert_eq!(a.outcome(), Some(expected.clone()));
    assert_eq!(b.outcome(), Some(expected));
}

/// 终止之后才调用 `close_signal` 与登记监听者，仍能收到正确终态。
fn late_listener_observes_outcome<H: ResponseHarness>(harness: &H) {
    let mut response = harness.open();
    harness.succeed(&mut response);

    let signal = signal_of(&response);
    let recorder = Recorder::default();
    recorder.listen(&signal);
    assert_eq!(recorder.outcomes(), vec![CloseOutcome::Success]);
}

/// 多线程并发调用 `close_signal`：每个调用方的监听者恰好触发一次，不多不少。
fn concurrent_calls_register_independently<H: ResponseHarness>(harness: &H) {
    const CALLERS: usize = 8;

    let mut response = harness.open();
    let recorder = Recorder::default();
    thread::scope(|scope| {
        for _ in 0..CALLERS {
            let recorder = recorder.clone();
            let response = &response;
            scope.spawn(move || recorder.listen(&signal_of(response)));
        }
    });

    harness.succeed(&mut response);

    let outcomes = recorder.outcomes();
    assert_eq!(outcomes.len(), CALLERS, "每个调用方的监听者必须恰好触发一次");
    assert!(outcomes.iter().all(CloseOutcome::is_success));
}
