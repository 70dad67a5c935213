use crate::config::LoadingConfig;
use async_trait::async_trait;
use lucent_common::{AccessibleSnapshot, JudgeError, Screenshot};
use std::time::Duration;
use tracing::info;

/// External classifier deciding whether a captured page is still loading.
#[async_trait]
pub trait LoadingClassifier: Send + Sync {
    async fn is_loading(
        &self,
        snapshot: &AccessibleSnapshot,
        screenshot: Option<&Screenshot>,
    ) -> Result<bool, JudgeError>;
}

/// Loading detection: a classifier plus the timing constants the retry loop runs on.
pub struct LoadingDetector<C> {
    classifier: C,
    config: LoadingConfig,
}

impl<C: LoadingClassifier> LoadingDetector<C> {
    pub fn new(classifier: C, config: LoadingConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &LoadingConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    pub fn delay(&self) -> Duration {
        self.config.delay()
    }

    pub async fn is_loading(
        &self,
        snapshot: &AccessibleSnapshot,
        screenshot: Option<&Screenshot>,
    ) -> Result<bool, JudgeError> {
        let loading = self.classifier.is_loading(snapshot, screenshot).await?;
        info!("  <- Loading: {}", loading);
        Ok(loading)
    }
}
