use async_trait::async_trait;
use lucent_common::{AccessibleSnapshot, JudgeError, JudgmentResult, Screenshot};

/// What the judge is asked to decide.
#[derive(Debug, Clone, Copy)]
pub struct JudgmentRequest<'a> {
    pub statement: &'a str,
    pub snapshot: &'a AccessibleSnapshot,
    pub screenshot: Option<&'a Screenshot>,
}

/// External classifier deciding whether a statement holds for a page.
///
/// Treated as an opaque, possibly nondeterministic black box.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, request: JudgmentRequest<'_>) -> Result<JudgmentResult, JudgeError>;
}
