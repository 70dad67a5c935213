//! Judgment and loading classification delegated to an HTTP service.
//!
//! `POST {endpoint}/verify` receives the statement and page context and answers
//! `{"result": bool, "explanation": string}`. `POST {endpoint}/loading` receives
//! the page context and answers `{"loading": bool}`.

use crate::judge::{Judge, JudgmentRequest};
use crate::loading::LoadingClassifier;
use async_trait::async_trait;
use lucent_common::{AccessibleSnapshot, AccessibleTree, JudgeError, JudgmentResult, Screenshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Serialize)]
struct PageContext<'a> {
    title: &'a str,
    url: &'a str,
    tree: &'a AccessibleTree,
    /// Base64-encoded PNG.
    #[serde(skip_serializing_if = "Option::is_none")]
    screenshot: Option<String>,
}

impl<'a> PageContext<'a> {
    fn new(snapshot: &'a AccessibleSnapshot, screenshot: Option<&Screenshot>) -> Self {
        Self {
            title: &snapshot.title,
            url: &snapshot.url,
            tree: &snapshot.tree,
            screenshot: screenshot.map(Screenshot::to_base64),
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyPayload<'a> {
    statement: &'a str,
    #[serde(flatten)]
    page: PageContext<'a>,
}

#[derive(Debug, Deserialize)]
struct LoadingResponse {
    loading: bool,
}

#[derive(Debug, Clone)]
pub struct HttpJudge {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpJudge {
    pub fn new(endpoint: &str) -> Result<Self, JudgeError> {
        let mut endpoint =
            Url::parse(endpoint).map_err(|e| JudgeError::Transport(e.to_string()))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn route(&self, name: &str) -> Result<Url, JudgeError> {
        self.endpoint
            .join(name)
            .map_err(|e| JudgeError::Transport(e.to_string()))
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<T, JudgeError> {
        let url = self.route(route)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| JudgeError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Judge for HttpJudge {
    async fn judge(&self, request: JudgmentRequest<'_>) -> Result<JudgmentResult, JudgeError> {
        let payload = VerifyPayload {
            statement: request.statement,
            page: PageContext::new(request.snapshot, request.screenshot),
        };
        self.post("verify", &payload).await
    }
}

#[async_trait]
impl LoadingClassifier for HttpJudge {
    async fn is_loading(
        &self,
        snapshot: &AccessibleSnapshot,
        screenshot: Option<&Screenshot>,
    ) -> Result<bool, JudgeError> {
        let response: LoadingResponse = self
            .post("loading", &PageContext::new(snapshot, screenshot))
            .await?;
        Ok(response.loading)
    }
}
