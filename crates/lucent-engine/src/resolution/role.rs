use crate::config::ResolverConfig;

/// The kinds of node that change how an action is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Generic,
    /// An `<option>` inside a `<select>`.
    Option,
}

impl NodeRole {
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("option") {
            NodeRole::Option
        } else {
            NodeRole::Generic
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPlan {
    Click,
    /// Select the option in its owning `<select>` by visible text.
    SelectInOwnerByLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPlan {
    SelectInElement,
    /// Select by value in the option's owning `<select>`.
    SelectInOwner,
}

/// Decides how actions aimed at each role are carried out.
///
/// Planners address options and their owning selects interchangeably, so by
/// default both clicks and selections on an option go through the select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    pub redirect_options: bool,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            redirect_options: true,
        }
    }
}

impl From<&ResolverConfig> for RolePolicy {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            redirect_options: config.redirect_option_actions,
        }
    }
}

impl RolePolicy {
    pub fn plan_click(&self, role: NodeRole) -> ClickPlan {
        match role {
            NodeRole::Option if self.redirect_options => ClickPlan::SelectInOwnerByLabel,
            NodeRole::Option | NodeRole::Generic => ClickPlan::Click,
        }
    }

    pub fn plan_select(&self, role: NodeRole) -> SelectPlan {
        match role {
            NodeRole::Option if self.redirect_options => SelectPlan::SelectInOwner,
            NodeRole::Option | NodeRole::Generic => SelectPlan::SelectInElement,
        }
    }
}
