//! `Response`：基于能力派发的统一收尾入口。
//!
//! # 教案式说明
//! - **意图 (Why)**：超时监督、访问日志、指标与连接排空只依赖“响应何时结束”，不应检查响应的具体形态；
//!   新的响应类型可随时加入，而消费侧代码无需改动。
//! - **逻辑 (How)**：
//!   - 每个具体类型通过 [`Response::shape`] 声明自己具备的唯一能力。该方法只能返回一个分支，
//!     “同时具备两种能力”在类型层面无法表达；
//!   - [`Response::close_signal`] 依据能力派发：流式直接委托（同一个信号），单值则派生信号；
//!   - 未声明能力的类型在首次调用时同步返回 [`ResponseError::CapabilityViolation`]。
//!   - 对于由基础设施自行构造的响应，[`AnyResponse`] 以两个构造器把“二选一”固化为封闭枚举。
//! - **契约 (What)**：`close_signal` 是观察操作而非状态迁移：不阻塞、可重复调用，
//!   唯一副作用是单值分支中登记一个监听者。

use std::{any, fmt, sync::Arc};

use crate::{
    error::ResponseError,
    signal::CompletionSignal,
    streaming::StreamingResponse,
    unary::{UnaryClose, UnaryResponse},
};

/// 具体响应声明的收尾能力。
#[derive(Clone, Copy)]
pub enum ResponseShape<'a> {
    /// 流式响应：收尾信号即流自身的终止信号。
    Streaming(&'a dyn StreamingResponse),
    /// 单值响应：收尾信号由值的就绪派生。
    Unary(&'a dyn UnaryClose),
    /// 未声明能力；对其调用 `close_signal` 属于能力违约。
    Unsupported,
}

impl ResponseShape<'_> {
    /// 能力标签：`streaming`、`unary` 或 `unsupported`。
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseShape::Streaming(_) => "streaming",
            ResponseShape::Unary(_) => "unary",
            ResponseShape::Unsupported => "unsupported",
        }
    }
}

impl fmt::Debug for ResponseShape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseShape").field(&self.kind()).finish()
    }
}

/// 流式响应或单值响应二者之一。
///
/// # 契约说明（What）
/// - **前置条件**：实现方必须覆盖 [`shape`](Self::shape)，返回 `Streaming` 或 `Unary`；
///   保留默认实现意味着类型没有收尾能力。
/// - **后置条件**：[`close_signal`](Self::close_signal) 对同一实例的多次调用携带相同终态；
///   调用方只能依赖终态等价，不能依赖信号对象的同一性。
/// - **并发**：可从任意线程并发调用，不会破坏信号的一次性终止语义。
///
/// # 风险提示（Trade-offs）
/// - `close_signal` 与 `type_name` 为派发逻辑的一部分，实现方不应覆盖；
///   包装类型（如 `Arc<R>`）通过转发 `type_name` 保证违约信息指向真实类型。
pub trait Response: Send + Sync {
    /// 声明收尾能力。
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Unsupported
    }

    /// 具体类型名，用于能力违约诊断。
    fn type_name(&self) -> &'static str {
        any::type_name::<Self>()
    }

    /// 返回在响应结束时终止的信号。
    ///
    /// # 执行逻辑（How）
    /// 1. 流式能力：返回流自身的信号，不包装、不复制；
    /// 2. 单值能力：返回派生信号（可能是缓存的同一信号，也可能是新信号）；
    /// 3. 无能力：记录错误日志并返回 [`ResponseError::CapabilityViolation`]，不返回信号。
    fn close_signal(&self) -> Result<CompletionSignal, ResponseError> {
        match self.shape() {
            ResponseShape::Streaming(streaming) => Ok(streaming.stream_close_signal()),
            ResponseShape::Unary(unary) => Ok(unary.close_signal_dyn()),
            ResponseShape::Unsupported => {
                let err = ResponseError::capability_violation(self.type_name());
                tracing::error!(
                    code = err.code(),
                    response = self.type_name(),
                    "response declares neither streaming nor unary capability"
                );
                Err(err)
            }
        }
    }
}

impl<R> Response for &R
where
    R: Response + ?Sized,
{
    fn shape(&self) -> ResponseShape<'_> {
        (**self).shape()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

impl<R> Response for Box<R>
where
    R: Response + ?Sized,
{
    fn shape(&self) -> ResponseShape<'_> {
        (**self).shape()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

impl<R> Response for Arc<R>
where
    R: Response + ?Sized,
{
    fn shape(&self) -> ResponseShape<'_> {
        (**self).shape()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

/// 以封闭枚举表达的响应。
///
/// # 教案式说明
/// - **意图 (Why)**：当基础设施自己负责构造响应时，可以直接在类型层面固化“恰好一种能力”，
///   彻底排除能力违约分支。
/// - **契约 (What)**：两个构造器分别接受流式与单值能力；`shape` 永不返回 `Unsupported`，
///   因此 `close_signal` 永远返回 `Ok`。
#[derive(Clone)]
pub enum AnyResponse {
    /// 流式响应。
    Streaming(Arc<dyn StreamingResponse>),
    /// 擦除值类型后的单值响应。
    Unary(Arc<dyn UnaryClose>),
}

impl AnyResponse {
    /// 以流式能力构造。
    pub fn streaming<S>(response: S) -> Self
    where
        S: StreamingResponse + 'static,
    {
        AnyResponse::Streaming(Arc::new(response))
    }

    /// 以单值能力构造，值类型在此擦除。
    pub fn unary<U>(response: U) -> Self
    where
        U: UnaryResponse + 'static,
    {
        AnyResponse::Unary(Arc::new(response))
    }

    /// 直接返回收尾信号，无需处理能力违约。
    pub fn close_handle(&self) -> CompletionSignal {
        match self {
            AnyResponse::Streaming(streaming) => streaming.stream_close_signal(),
            AnyResponse::Unary(unary) => unary.close_signal_dyn(),
        }
    }
}

impl Response for AnyResponse {
    fn shape(&self) -> ResponseShape<'_> {
        match self {
            AnyResponse::Streaming(streaming) => ResponseShape::Streaming(streaming.as_ref()),
            AnyResponse::Unary(unary) => ResponseShape::Unary(unary.as_ref()),
        }
    }
}

impl fmt::Debug for AnyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyResponse").field(&self.shape().kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::codes, signal::CloseOutcome, unary::DeferredResponse};
    use tracing_test::traced_test;

    struct Opaque;

    impl Response for Opaque {}

    struct Publisher {
        signal: CompletionSignal,
    }

    impl StreamingResponse for Publisher {
        fn stream_close_signal(&self) -> CompletionSignal {
            self.signal.clone()
        }
    }

    impl Response for Publisher {
        fn shape(&self) -> ResponseShape<'_> {
            ResponseShape::Streaming(self)
        }
    }

    #[test]
    #[traced_test]
    fn missing_capability_is_reported_with_type_name() {
        let err = Opaque.close_signal().expect_err("无能力的响应必须违约");
        assert_eq!(err.code(), codes::CAPABILITY_VIOLATION);
        assert!(err.to_string().contains("Opaque"), "错误信息应包含具体类型: {err}");
        assert!(logs_contain("neither streaming nor unary"));
    }

    #[test]
    fn wrappers_forward_type_name_and_shape() {
        let boxed: Box<dyn Response> = Box::new(Opaque);
        let err = boxed.close_signal().expect_err("包装后仍应违约");
        assert!(err.to_string().contains("Opaque"));
        assert!(!err.to_string().contains("Box"), "违约信息应指向真实类型");

        let shared: Arc<dyn Response> = Arc::new(DeferredResponse::<u8>::new());
        assert_eq!(shared.shape().kind(), "unary");
        assert!(shared.close_signal().is_ok());
    }

    #[test]
    fn streaming_dispatch_returns_identical_signal() {
        let publisher = Publisher {
            signal: CompletionSignal::new(),
        };
        let a = publisher.stream_close_signal();
        let b = publisher.close_signal().expect("流式响应应返回信号");
        assert!(a.ptr_eq(&b));
        assert!(a.ptr_eq(&publisher.signal), "流式分支必须纯委托");
    }

    #[test]
    fn any_response_never_violates() {
        let deferred = DeferredResponse::<u8>::new();
        let response = AnyResponse::unary(deferred.clone());
        let signal = response.close_signal().expect("封闭枚举不会违约");
        deferred.complete(1);
        assert_eq!(signal.outcome(), Some(CloseOutcome::Success));

        let publisher = Publisher {
            signal: CompletionSignal::new(),
        };
        let expected = publisher.signal.clone();
        let response = AnyResponse::streaming(publisher);
        assert!(response.close_handle().ptr_eq(&expected));
        assert_eq!(format!("{response:?}"), "AnyResponse(\"streaming\")");
    }
}
