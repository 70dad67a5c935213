use super::resolver::{ElementHandle, ElementResolver};
use super::role::{ClickPlan, NodeRole, RolePolicy, SelectPlan};
use crate::config::ResolverConfig;
use crate::driver::{DomProtocol, ElementActions};
use lucent_common::{DriverError, NodeRef, SelectBy};
use tracing::{debug, info};

/// The id-addressed action surface: every action resolves its target(s)
/// through the `ElementResolver` and acts on the marked element.
pub struct Interactor<P> {
    resolver: ElementResolver<P>,
    policy: RolePolicy,
}

impl<P: DomProtocol + ElementActions> Interactor<P> {
    pub fn new(page: P, config: &ResolverConfig) -> Self {
        Self {
            resolver: ElementResolver::new(page, config),
            policy: RolePolicy::from(config),
        }
    }

    pub fn with_policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn resolver(&self) -> &ElementResolver<P> {
        &self.resolver
    }

    pub fn page(&self) -> &P {
        self.resolver.protocol()
    }

    async fn role_of(&self, element: &ElementHandle) -> Result<NodeRole, DriverError> {
        let tag = self.page().tag_name(element.locator()).await?;
        Ok(NodeRole::from_tag(&tag))
    }

    pub async fn click(&self, id: NodeRef) -> Result<(), DriverError> {
        info!("Clicking node {}", id);
        self.resolver
            .scoped(id, |element| async move {
                match self.policy.plan_click(self.role_of(&element).await?) {
                    ClickPlan::Click => self.page().click(element.locator()).await,
                    ClickPlan::SelectInOwnerByLabel => {
                        let label = self.page().text_content(element.locator()).await?;
                        let label = label.trim().to_string();
                        debug!("Node {} is an option, selecting {:?} instead", id, label);
                        let select = element.locator().clone().owning_select();
                        self.page()
                            .select_option(&select, &SelectBy::Label(label))
                            .await
                    }
                }
            })
            .await
    }

    pub async fn hover(&self, id: NodeRef) -> Result<(), DriverError> {
        info!("Hovering node {}", id);
        self.resolver
            .scoped(id, |element| async move {
                self.page().hover(element.locator()).await
            })
            .await
    }

    pub async fn type_text(&self, id: NodeRef, text: &str) -> Result<(), DriverError> {
        info!("Typing into node {}", id);
        self.resolver
            .scoped(id, |element| async move {
                self.page().fill(element.locator(), text).await
            })
            .await
    }

    pub async fn select(&self, id: NodeRef, value: &str) -> Result<(), DriverError> {
        info!("Selecting {:?} in node {}", value, id);
        let option = SelectBy::Value(value.to_string());
        self.resolver
            .scoped(id, |element| async move {
                let target = match self.policy.plan_select(self.role_of(&element).await?) {
                    SelectPlan::SelectInElement => element.locator().clone(),
                    SelectPlan::SelectInOwner => element.locator().clone().owning_select(),
                };
                self.page().select_option(&target, &option).await
            })
            .await
    }

    pub async fn drag_and_drop(&self, from: NodeRef, to: NodeRef) -> Result<(), DriverError> {
        if from == to {
            debug!("Dragging node {} onto itself, nothing to do", from);
            return Ok(());
        }
        info!("Dragging node {} to node {}", from, to);
        self.resolver
            .scoped(from, |source| async move {
                self.resolver
                    .scoped(to, |target| async move {
                        self.page()
                            .drag_to(source.locator(), target.locator())
                            .await
                    })
                    .await
            })
            .await
    }
}
