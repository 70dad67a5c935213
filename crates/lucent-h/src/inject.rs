use chromiumoxide::Page;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use lucent_common::DriverError;
use lucent_common::error_mapping::map_protocol_error;
use serde_json::Value;
use std::time::Duration;

/// Bound on evaluations whose caller gives none.
/// Keeps a dialog that slipped past auto-accept from hanging the session.
const EVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Evaluate `expression`, awaiting it if it yields a promise.
///
/// `undefined` and `null` both come back as `Value::Null`.
pub async fn evaluate(page: &Page, expression: &str) -> Result<Value, DriverError> {
    evaluate_within(page, expression, EVAL_TIMEOUT).await
}

/// As `evaluate`, failing with `DriverError::Timeout` once `bound` has passed.
pub async fn evaluate_within(
    page: &Page,
    expression: &str,
    bound: Duration,
) -> Result<Value, DriverError> {
    let params = EvaluateParams::builder()
        .expression(expression)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(DriverError::Protocol)?;

    let result = match tokio::time::timeout(bound, page.evaluate_expression(params)).await {
        Err(_) => return Err(DriverError::Timeout(bound)),
        Ok(Err(e)) => return Err(map_protocol_error(&e.to_string(), None)),
        Ok(Ok(result)) => result,
    };

    Ok(result.object().value.clone().unwrap_or(Value::Null))
}

/// Wrap a callback-style function so its callback resolves a promise.
///
/// The function receives `args` followed by the completion callback.
pub fn callback_expression(function: &str, args: &[Value]) -> Result<String, DriverError> {
    let args = serde_json::to_string(args)?;
    Ok(format!(
        "new Promise((resolve) => {{ const fn = ({}); fn(...{}, resolve); }})",
        function.trim(),
        args
    ))
}

pub async fn evaluate_async(
    page: &Page,
    function: &str,
    args: &[Value],
    bound: Duration,
) -> Result<Value, DriverError> {
    evaluate_within(page, &callback_expression(function, args)?, bound).await
}
