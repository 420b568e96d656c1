use parking_lot::Mutex;
use spark_response::{CloseOutcome, CompletionSignal};
use std::{any::Any, sync::Arc};

/// 把捕获的 panic 载荷整理为一行失败描述：`[spark-response-tck::<实现>::<用例>] <原因>`。
pub(crate) fn describe_failure(
    subject: &str,
    case: &str,
    payload: &(dyn Any + Send),
) -> String {
    let reason = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<非文本 panic 载荷>");
    format!("[spark-response-tck::{subject}::{case}] {reason}")
}

/// 记录监听者收到的终态，用于断言“恰好一次”。
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    seen: Arc<Mutex<Vec<CloseOutcome>>>,
}

impl Recorder {
    pub(crate) fn listen(&self, signal: &CompletionSignal) {
        let seen = Arc::clone(&self.seen);
        signal.register(move |outcome| seen.lock().push(outcome.clone()));
    }

    pub(crate) fn outcomes(&self) -> Vec<CloseOutcome> {
        self.seen.lock().clone()
    }
}
