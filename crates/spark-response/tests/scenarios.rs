//! 端到端场景：基础设施只通过 `Response::close_signal` 观察响应结束。

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::{StreamExt, executor::block_on, stream};
use spark_response::{
    AnyResponse, CloseKind, CloseOutcome, DeferredResponse, ErrorCause, InflightResponses,
    Response, ResponseError, StreamResponse, StreamingResponse, UnaryResponse, error::codes,
};
use spark_response_tck::assert_capability_violation;

#[test]
fn unary_success_is_observed_exactly_once() {
    let response = DeferredResponse::<String>::new();
    let signal = response.close_signal().expect("单值响应具备收尾能力");
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    signal.register(move |outcome| {
        assert!(outcome.is_success());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!signal.is_closed());
    response.complete("body".to_owned());
    response.complete("ignored".to_owned());

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    let settled = response.settled().expect("应已就绪");
    assert_eq!(settled.value().map(String::as_str), Some("body"));
}

#[test]
fn streaming_error_after_chunks_reports_original_cause() {
    let mut response = StreamResponse::new(stream::iter([
        Ok(b"a".to_vec()),
        Ok(b"b".to_vec()),
        Ok(b"c".to_vec()),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")),
    ]));
    let signal = response.close_signal().expect("流式响应具备收尾能力");
    let observed = Arc::new(parking_lot::Mutex::new(None));
    let sink = Arc::clone(&observed);
    signal.register(move |outcome| *sink.lock() = Some(outcome.clone()));

    let (chunks, consumer_cause) = block_on(async {
        let mut chunks = 0;
        let mut cause: Option<ErrorCause> = None;
        while let Some(item) = response.next().await {
            match item {
                Ok(_) => {
                    assert!(!signal.is_closed(), "数据块透传期间信号必须开放");
                    chunks += 1;
                }
                Err(err) => cause = Some(err),
            }
        }
        (chunks, cause)
    });

    assert_eq!(chunks, 3);
    let consumer_cause = consumer_cause.expect("消费者应收到上游错误");
    let outcome = observed.lock().clone().expect("监听者应已触发");
    assert_eq!(outcome.kind(), CloseKind::Failure);
    let reported = outcome.failure().expect("终态应为失败");
    assert!(Arc::ptr_eq(reported, &consumer_cause), "信号与消费者共享同一份原因");
    assert!(reported.to_string().contains("peer reset"));
}

#[test]
fn consumer_cancellation_is_not_a_failure() {
    let mut response = StreamResponse::new(stream::iter([Ok::<_, io::Error>(1u8), Ok(2), Ok(3)]));
    let signal = response.close_signal().expect("流式响应具备收尾能力");

    block_on(async {
        assert_eq!(response.next().await.and_then(Result::ok), Some(1));
    });
    drop(response);

    let outcome = signal.outcome().expect("丢弃流应终止信号");
    assert_eq!(outcome, CloseOutcome::Cancelled);
    assert!(!outcome.is_failure());
}

#[test]
fn response_without_capability_is_rejected() {
    struct Legacy;

    impl Response for Legacy {}

    assert_capability_violation(&Legacy, "Legacy");

    let err = Legacy.close_signal().expect_err("应违约");
    assert_eq!(err.code(), codes::CAPABILITY_VIOLATION);
    assert!(matches!(err, ResponseError::CapabilityViolation { .. }));
}

#[test]
fn mixed_responses_drain_through_a_single_entry_point() {
    let inflight = InflightResponses::new();

    let unary = DeferredResponse::<u64>::new();
    let mut streaming = StreamResponse::new(stream::iter([Ok::<_, io::Error>(7u64)]));
    let failing = DeferredResponse::<u64>::new();

    let responses: Vec<AnyResponse> = vec![AnyResponse::unary(unary.clone())];
    for response in &responses {
        inflight.track(response).expect("封闭枚举不会违约");
    }
    inflight.track(&streaming).expect("流式响应具备收尾能力");
    inflight.track(&failing).expect("单值响应具备收尾能力");
    assert_eq!(inflight.inflight(), 3);

    unary.complete(42);
    block_on(async { while streaming.next().await.is_some() {} });
    failing.fail(io::Error::other("backend unavailable"));

    assert!(inflight.is_drained());
    let snapshot = inflight.snapshot();
    assert_eq!(snapshot.succeeded, 2);
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.cancelled, 0);
}

#[test]
fn entry_point_stays_unambiguous_with_every_contract_in_scope() {
    let streaming = StreamResponse::new(stream::iter([Ok::<_, io::Error>(0u8)]));
    let unified = streaming.close_signal().expect("流式响应具备收尾能力");
    assert!(unified.ptr_eq(&streaming.stream_close_signal()), "流式分支必须纯委托");

    let unary = DeferredResponse::<u8>::new();
    let unified = unary.close_signal().expect("单值响应具备收尾能力");
    let derived = unary.derive_close_signal();
    unary.complete(1);
    assert_eq!(unified.outcome(), derived.outcome());
}
