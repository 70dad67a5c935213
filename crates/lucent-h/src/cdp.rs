use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig as ChromeConfig, Page};
use futures::StreamExt;
use lucent_common::DriverError;
use lucent_engine::config::BrowserConfig;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: PathBuf,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(config: &BrowserConfig) -> Result<Self, DriverError> {
        let mut builder = ChromeConfig::builder().no_sandbox();
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir(config)?;
        builder = builder.user_data_dir(&user_data_dir);

        if config.visible {
            tracing::info!("Launching browser in visible mode");
            builder = builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Some(chrome_bin) = resolve_chrome_bin(config) {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin.display());
            builder = builder.chrome_executable(chrome_bin);
        }

        let chrome_config = builder
            .build()
            .map_err(|e| DriverError::Launch(format!("Failed to build browser config: {}", e)))?;
        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(format!("Failed to create page: {}", e)))?;

        // A pending alert/confirm blocks every evaluation on the page.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| DriverError::Launch(format!("Failed to subscribe to dialogs: {}", e)))?;
        let dialog_page = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!(
                    "Accepting JavaScript dialog: {} ({:?})",
                    event.message,
                    event.r#type
                );
                if let Err(e) = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                {
                    tracing::error!("Failed to accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir,
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), DriverError> {
        self.browser
            .close()
            .await
            .map_err(|e| DriverError::Protocol(format!("Error closing browser: {}", e)))?;
        self.handler_task
            .await
            .map_err(|e| DriverError::Protocol(format!("Error awaiting handler: {}", e)))?;

        if self.cleanup_user_data_dir
            && let Err(e) = std::fs::remove_dir_all(&self.user_data_dir)
        {
            tracing::debug!(
                "Failed to clean up user-data-dir {}: {}",
                self.user_data_dir.display(),
                e
            );
        }
        Ok(())
    }
}

/// `CHROME_BIN` wins over the configured binary.
fn resolve_chrome_bin(config: &BrowserConfig) -> Option<PathBuf> {
    std::env::var_os("CHROME_BIN")
        .map(PathBuf::from)
        .or_else(|| config.chrome_bin.clone())
}

/// Returns the profile directory and whether it is ours to delete on close.
fn resolve_user_data_dir(config: &BrowserConfig) -> Result<(PathBuf, bool), DriverError> {
    let configured = std::env::var_os("LUCENT_USER_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| config.user_data_dir.clone());
    if let Some(path) = configured {
        std::fs::create_dir_all(&path)?;
        tracing::info!("Using user data dir: {}", path.display());
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| DriverError::Launch(format!("System clock error: {}", e)))?
        .as_nanos();
    let unique = format!("lucent-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
