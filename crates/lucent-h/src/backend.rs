use crate::cdp::CdpClient;
use crate::page::CdpPage;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::accessibility::GetFullAxTreeParams;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::page::ScreenshotParams;
use lucent_common::error_mapping::map_protocol_error;
use lucent_common::{AccessibleTree, DriverError, Key, NodeRef, Screenshot};
use lucent_engine::config::LucentConfig;
use lucent_engine::driver::{Driver, NavigationResult};
use lucent_engine::resolution::Interactor;
use lucent_engine::waiter::PageLoadWaiter;
use tracing::info;

struct Session {
    client: CdpClient,
    interactor: Interactor<CdpPage>,
}

/// `Driver` over a locally launched Chromium.
pub struct HeadlessDriver {
    session: Option<Session>,
    config: LucentConfig,
    waiter: PageLoadWaiter,
}

impl HeadlessDriver {
    pub fn new(config: LucentConfig) -> Self {
        let waiter = PageLoadWaiter::new(config.waiter);
        Self {
            session: None,
            config,
            waiter,
        }
    }

    pub fn config(&self) -> &LucentConfig {
        &self.config
    }

    fn session(&self) -> Result<&Session, DriverError> {
        self.session.as_ref().ok_or(DriverError::NotReady)
    }

    fn page(&self) -> Result<&CdpPage, DriverError> {
        Ok(self.session()?.interactor.page())
    }

    async fn press(&self, key: Key, down: bool) -> Result<(), DriverError> {
        let kind = if down {
            DispatchKeyEventType::KeyDown
        } else {
            DispatchKeyEventType::KeyUp
        };
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key.as_str())
            .code(key.as_str());
        // Enter only submits forms when the key event carries its text.
        if down && key == Key::Enter {
            builder = builder.text("\r");
        }
        let params = builder
            .build()
            .map_err(|e| DriverError::Protocol(format!("Failed to build key event: {}", e)))?;
        self.page()?
            .inner()
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(())
    }
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new(LucentConfig::default())
    }
}

#[async_trait]
impl Driver for HeadlessDriver {
    async fn launch(&mut self) -> Result<(), DriverError> {
        info!("Launching headless driver (Chromium)...");
        let client = CdpClient::launch(&self.config.browser).await?;
        let page = CdpPage::new(client.page.clone());
        let interactor = Interactor::new(page, &self.config.resolver);
        info!(
            "Marking resolved nodes with attribute {}",
            interactor.resolver().marker_attribute()
        );
        self.session = Some(Session { client, interactor });
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(session) = self.session.take() {
            session.client.close().await?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, DriverError> {
        let page = self.page()?.inner();
        info!("Navigating to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(NavigationResult {
            url: self.url().await?,
            title: self.title().await?,
        })
    }

    async fn wait_for_load(&self) -> Result<(), DriverError> {
        self.waiter.wait(self.page()?).await
    }

    async fn title(&self) -> Result<String, DriverError> {
        let title = self
            .page()?
            .inner()
            .get_title()
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(title.unwrap_or_default())
    }

    async fn url(&self) -> Result<String, DriverError> {
        let url = self
            .page()?
            .inner()
            .url()
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(url.unwrap_or_default())
    }

    async fn accessible_tree(&self) -> Result<AccessibleTree, DriverError> {
        self.wait_for_load().await?;
        let response = self
            .page()?
            .inner()
            .execute(GetFullAxTreeParams::builder().build())
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        let nodes = response
            .result
            .nodes
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AccessibleTree::new(nodes))
    }

    async fn screenshot(&self) -> Result<Screenshot, DriverError> {
        let bytes = self
            .page()?
            .inner()
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| DriverError::Protocol(format!("Screenshot failed: {}", e)))?;
        Ok(Screenshot(bytes))
    }

    async fn click(&self, id: NodeRef) -> Result<(), DriverError> {
        self.session()?.interactor.click(id).await
    }

    async fn hover(&self, id: NodeRef) -> Result<(), DriverError> {
        self.session()?.interactor.hover(id).await
    }

    async fn type_text(&self, id: NodeRef, text: &str) -> Result<(), DriverError> {
        self.session()?.interactor.type_text(id, text).await
    }

    async fn select(&self, id: NodeRef, value: &str) -> Result<(), DriverError> {
        self.session()?.interactor.select(id, value).await
    }

    async fn drag_and_drop(&self, from: NodeRef, to: NodeRef) -> Result<(), DriverError> {
        self.session()?.interactor.drag_and_drop(from, to).await
    }

    async fn press_key(&self, key: Key) -> Result<(), DriverError> {
        info!("Pressing {}", key.as_str());
        self.press(key, true).await?;
        self.press(key, false).await
    }
}
