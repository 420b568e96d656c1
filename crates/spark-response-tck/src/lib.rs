//! spark-response 收尾契约测试套件（TCK）入口。
//!
//! # 教案式综述（Why / How / What）
//! - **为什么存在**：`Response` 是开放扩展点，新的响应类型可以随时加入；
//!   本 crate 把收尾契约沉淀为可复用的用例，任何实现只需提供一个 [`ResponseHarness`] 即可一键回归。
//! - **如何集成**：在目标仓库的 `tests` 目录下实现 `ResponseHarness`，并在 `#[test]` 中调用
//!   [`run_close_contract`]；若实现声称不具备任何能力（例如故意的负面样例），可使用
//!   [`assert_capability_violation`] 校验违约诊断。
//! - **覆盖内容**：开放态、成功恰好一次、失败原因透传、取消与失败区分、多次调用终态一致、
//!   迟到监听者、并发调用。
//!
//! # 风险提示（Trade-offs）
//! - 并发用例使用标准线程模拟多调用方，要求被测类型满足 `Send + Sync`（已由 `Response` 约束）。
//! - 用例假设 harness 的终止操作是同步完成的：方法返回时被测响应必须已经写入终态。

mod close;
mod support;

use std::panic;

use spark_response::{ErrorCause, Response, ResponseError};

/// 驱动被测响应的适配器。
///
/// # 契约说明（What）
/// - `open`：返回一个全新的、尚未终止的响应；
/// - `succeed` / `fail` / `cancel`：以对应方式终止响应，返回时终态必须已写入；
///   `fail` 必须原样使用给定的 `cause`；
/// - 三个终止方法对每个响应至多调用一次。
pub trait ResponseHarness {
    /// 被测响应类型。
    type Response: Response;

    /// 供失败信息使用的实现名称。
    fn name(&self) -> &'static str;

    fn open(&self) -> Self::Response;

    fn succeed(&self, response: &mut Self::Response);

    fn fail(&self, response: &mut Self::Response, cause: ErrorCause);

    fn cancel(&self, response: &mut Self::Response);
}

/// 单个 TCK 用例。
///
/// # 教案式说明
/// - **意图 (Why)**：以结构体封装用例名称与测试函数，便于统一遍历并在失败时附加上下文。
/// - **契约 (What)**：`test` 必须在失败时 `panic`。
pub struct TckCase<H> {
    /// 用例的人类可读名称。
    pub name: &'static str,
    /// 实际执行的断言逻辑。
    pub test: fn(&H),
}

/// 返回收尾契约的全部用例名称，顺序与执行顺序一致。
pub fn case_names() -> Vec<&'static str> {
    close::cases::<NameOnly>()
        .iter()
        .map(|case| case.name)
        .collect()
}

/// 对 harness 运行完整收尾契约。
///
/// # 执行逻辑（How）
/// - 每个用例独立捕获 panic，单个用例失败不会阻止后续用例执行；
/// - 全部执行完毕后，若存在失败，则一次性 panic，逐行列出
///   `[spark-response-tck::<实现>::<用例>] <原因>`。
pub fn run_close_contract<H: ResponseHarness>(harness: &H) {
    let failures: Vec<String> = close::cases::<H>()
        .into_iter()
        .filter_map(|case| {
            panic::catch_unwind(panic::AssertUnwindSafe(|| (case.test)(harness)))
                .err()
                .map(|payload| {
                    support::describe_failure(harness.name(), case.name, payload.as_ref())
                })
        })
        .collect();
    if !failures.is_empty() {
        panic!(
            "{} 条收尾契约用例失败：\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}

/// 断言响应因未声明能力而违约，且诊断信息包含具体类型名。
pub fn assert_capability_violation<R>(response: &R, type_fragment: &str)
where
    R: Response + ?Sized,
{
    match response.close_signal() {
        Err(err @ ResponseError::CapabilityViolation { .. }) => {
            assert!(
                err.to_string().contains(type_fragment),
                "违约信息应包含 `{type_fragment}`：{err}"
            );
        }
        Err(other) => panic!("期望能力违约，实际得到其他错误：{other}"),
        Ok(_) => panic!("未声明能力的响应不应返回收尾信号"),
    }
}

/// 仅用于枚举用例名称的占位 harness，从不被调用。
struct NameOnly;

impl ResponseHarness for NameOnly {
    type Response = spark_response::AnyResponse;

    fn name(&self) -> &'static str {
        "name-only"
    }

    fn open(&self) -> Self::Response {
        unreachable!("NameOnly 仅用于枚举用例名称")
    }

    fn succeed(&self, _: &mut Self::Response) {}

    fn fail(&self, _: &mut Self::Response, _: ErrorCause) {}

    fn cancel(&self, _: &mut Self::Response) {}
}
