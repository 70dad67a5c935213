//! Transient element resolution.
//!
//! A snapshot node id is turned into a live element by pushing it to the
//! protocol's frontend id space and tagging the node with a marker attribute.
//! Actions then address the node through a selector over that marker. The
//! marker is removed when the scoped operation ends, whatever its outcome.

use crate::config::ResolverConfig;
use crate::driver::DomProtocol;
use lucent_common::{DriverError, LiveNode, Locator, NodeRef};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

static DEFAULT_MARKER: LazyLock<String> =
    LazyLock::new(|| format!("data-lucent-id-{:x}", std::process::id()));

/// Marker attribute name private to this process.
pub fn default_marker_attribute() -> &'static str {
    &DEFAULT_MARKER
}

/// A live element, valid while its marker attribute is on the document.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    node: LiveNode,
    locator: Locator,
}

impl ElementHandle {
    pub fn id(&self) -> NodeRef {
        self.node.id
    }

    pub fn node(&self) -> &LiveNode {
        &self.node
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

pub struct ElementResolver<P> {
    protocol: P,
    marker: String,
    node_locks: Mutex<HashMap<NodeRef, Arc<Mutex<()>>>>,
}

impl<P: DomProtocol> ElementResolver<P> {
    pub fn new(protocol: P, config: &ResolverConfig) -> Self {
        let marker = config
            .marker_attribute
            .clone()
            .unwrap_or_else(|| default_marker_attribute().to_string());
        Self {
            protocol,
            marker,
            node_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn marker_attribute(&self) -> &str {
        &self.marker
    }

    /// Resolve `id`, run `body` against the live handle, then release the handle.
    ///
    /// Release runs on every exit path. When `body` fails, its error wins over a
    /// release error. Operations on the same node are serialized; nesting two
    /// scopes over one node deadlocks.
    pub async fn scoped<T, F, Fut>(&self, id: NodeRef, body: F) -> Result<T, DriverError>
    where
        F: FnOnce(ElementHandle) -> Fut,
        Fut: Future<Output = Result<T, DriverError>>,
    {
        let guard = self.lock_node(id).await;
        let outcome = match self.attach(id).await {
            Ok(handle) => {
                let node = handle.node;
                let outcome = body(handle).await;
                match (outcome, self.detach(&node).await) {
                    (Ok(value), Ok(())) => Ok(value),
                    (Ok(_), Err(release)) => Err(release),
                    (Err(err), Ok(())) => Err(err),
                    (Err(err), Err(release)) => {
                        warn!("Failed to release node {} after error: {}", id, release);
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        };
        drop(guard);
        self.prune_lock(id).await;
        outcome
    }

    async fn attach(&self, id: NodeRef) -> Result<ElementHandle, DriverError> {
        self.protocol.enable_dom().await?;
        self.protocol.request_flattened_document().await?;
        let node = self.protocol.push_backend_node(id).await?;
        let value = id.to_string();
        self.protocol
            .set_attribute(&node, &self.marker, &value)
            .await?;
        debug!("Marked node {} as {}={}", id, self.marker, value);
        Ok(ElementHandle {
            node,
            locator: Locator::marker(self.marker.as_str(), value),
        })
    }

    async fn detach(&self, node: &LiveNode) -> Result<(), DriverError> {
        match self.protocol.remove_attribute(node, &self.marker).await {
            Ok(()) => {
                debug!("Unmarked node {}", node.id);
                Ok(())
            }
            // The node was removed, or the page navigated away, while in use.
            Err(err) if err.is_not_found() => {
                debug!("Node {} left the document before release", node.id);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn lock_node(&self, id: NodeRef) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.node_locks.lock().await;
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    async fn prune_lock(&self, id: NodeRef) {
        let mut locks = self.node_locks.lock().await;
        if let Some(lock) = locks.get(&id)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(&id);
        }
    }
}
