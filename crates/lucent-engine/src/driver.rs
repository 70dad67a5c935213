use async_trait::async_trait;
use lucent_common::{
    AccessibleSnapshot, AccessibleTree, DriverError, Key, LiveNode, Locator, NodeRef, Screenshot,
    SelectBy,
};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// Low-level DOM primitives needed to turn a snapshot node id into a live node.
#[async_trait]
pub trait DomProtocol: Send + Sync {
    /// Turn on DOM observation. Safe to call repeatedly.
    async fn enable_dom(&self) -> Result<(), DriverError>;

    /// Request the whole flattened document so backend ids can be pushed to the frontend.
    async fn request_flattened_document(&self) -> Result<(), DriverError>;

    /// Translate a snapshot id into the live id space. Fails with `NotFound` when
    /// the node no longer exists.
    async fn push_backend_node(&self, id: NodeRef) -> Result<LiveNode, DriverError>;

    async fn set_attribute(&self, node: &LiveNode, name: &str, value: &str)
    -> Result<(), DriverError>;

    /// Fails with `NotFound` when the node has left the document.
    async fn remove_attribute(&self, node: &LiveNode, name: &str) -> Result<(), DriverError>;
}

/// Native element actions addressed through a `Locator`.
#[async_trait]
pub trait ElementActions: Send + Sync {
    /// Lower-cased tag name.
    async fn tag_name(&self, locator: &Locator) -> Result<String, DriverError>;

    async fn text_content(&self, locator: &Locator) -> Result<String, DriverError>;

    async fn click(&self, locator: &Locator) -> Result<(), DriverError>;

    async fn hover(&self, locator: &Locator) -> Result<(), DriverError>;

    /// Replace the element's current value with `text`.
    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    /// Fails with `TypeMismatch` when the located element is not a `<select>`.
    async fn select_option(&self, locator: &Locator, option: &SelectBy)
    -> Result<(), DriverError>;

    async fn drag_to(&self, from: &Locator, to: &Locator) -> Result<(), DriverError>;
}

/// Script injection into the page's execution context.
///
/// Implementations report a navigation racing the evaluation as
/// `DriverError::ContextDestroyed`.
#[async_trait]
pub trait ScriptRuntime: Send + Sync {
    /// Evaluate an expression for its side effects and value.
    async fn evaluate(&self, expression: &str) -> Result<Value, DriverError>;

    /// Call `function` with `args` followed by a completion callback, and wait up to
    /// `timeout` for the value the callback receives. Running out of time is
    /// `DriverError::Timeout`.
    async fn evaluate_async(
        &self,
        function: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value, DriverError>;
}

/// The surface exposed to whatever issues actions or requests verifications.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Launch the driver (start browser, connect to remote, etc.)
    async fn launch(&mut self) -> Result<(), DriverError>;

    /// Close the driver and cleanup resources.
    async fn close(&mut self) -> Result<(), DriverError>;

    async fn is_ready(&self) -> bool;

    async fn navigate(&self, url: &str) -> Result<NavigationResult, DriverError>;

    /// Block until the page is observably settled, or its settle check gives up.
    async fn wait_for_load(&self) -> Result<(), DriverError>;

    async fn title(&self) -> Result<String, DriverError>;

    async fn url(&self) -> Result<String, DriverError>;

    /// Full accessibility tree, captured after waiting for the page to load.
    async fn accessible_tree(&self) -> Result<AccessibleTree, DriverError>;

    async fn screenshot(&self) -> Result<Screenshot, DriverError>;

    /// Capture tree, title and url together.
    async fn snapshot(&self) -> Result<AccessibleSnapshot, DriverError> {
        let tree = self.accessible_tree().await?;
        let title = self.title().await?;
        let url = self.url().await?;
        Ok(AccessibleSnapshot { tree, title, url })
    }

    async fn click(&self, id: NodeRef) -> Result<(), DriverError>;

    async fn hover(&self, id: NodeRef) -> Result<(), DriverError>;

    async fn type_text(&self, id: NodeRef, text: &str) -> Result<(), DriverError>;

    async fn select(&self, id: NodeRef, value: &str) -> Result<(), DriverError>;

    async fn drag_and_drop(&self, _from: NodeRef, _to: NodeRef) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("drag_and_drop".into()))
    }

    async fn press_key(&self, _key: Key) -> Result<(), DriverError> {
        Err(DriverError::NotSupported("press_key".into()))
    }
}
