use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a node as it existed in a previously captured accessibility
/// snapshot (the protocol's backend node id). It is not guaranteed to resolve
/// against the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub i64);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeRef {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(NodeRef)
    }
}

/// Node id in the protocol's live (frontend) id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontendNodeId(pub i64);

/// A node translated into the live document: the snapshot id it came from plus
/// the id the protocol currently knows it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiveNode {
    pub id: NodeRef,
    pub node_id: FrontendNodeId,
}

/// Raw accessibility nodes as reported by the browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessibleTree {
    pub nodes: Vec<serde_json::Value>,
}

impl AccessibleTree {
    pub fn new(nodes: Vec<serde_json::Value>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Point-in-time capture of a page's semantic structure. Always captured
/// wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibleSnapshot {
    pub tree: AccessibleTree,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot(pub Vec<u8>);

impl Screenshot {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

/// Outcome of judging a statement against a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentResult {
    pub result: bool,
    pub explanation: String,
}

impl JudgmentResult {
    pub fn pass(explanation: impl Into<String>) -> Self {
        Self {
            result: true,
            explanation: explanation.into(),
        }
    }

    pub fn fail(explanation: impl Into<String>) -> Self {
        Self {
            result: false,
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Backspace,
    Enter,
    Escape,
    Tab,
}

impl Key {
    /// DOM `KeyboardEvent.key` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Backspace => "Backspace",
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::Tab => "Tab",
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backspace" => Ok(Key::Backspace),
            "enter" | "return" => Ok(Key::Enter),
            "escape" | "esc" => Ok(Key::Escape),
            "tab" => Ok(Key::Tab),
            other => Err(format!("Unknown key: {}", other)),
        }
    }
}

/// How an option is chosen inside a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "text", rename_all = "snake_case")]
pub enum SelectBy {
    /// Visible option text.
    Label(String),
    /// Option `value` attribute.
    Value(String),
}

impl SelectBy {
    pub fn text(&self) -> &str {
        match self {
            SelectBy::Label(s) | SelectBy::Value(s) => s,
        }
    }
}

/// Where an element action lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// The element carrying `attribute="value"`.
    Marker { attribute: String, value: String },
    /// The closest `<select>` ancestor of the located element.
    OwningSelect(Box<Locator>),
}

impl Locator {
    pub fn marker(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Locator::Marker {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn owning_select(self) -> Self {
        Locator::OwningSelect(Box::new(self))
    }

    /// CSS selector for the located element. `<select>` elements never nest, so the
    /// owning select is the only one that `:has()` the marked option.
    pub fn selector(&self) -> String {
        match self {
            Locator::Marker { attribute, value } => {
                format!("[{}='{}']", attribute, value.replace('\'', "\\'"))
            }
            Locator::OwningSelect(inner) => format!("select:has({})", inner.selector()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Marker { .. } => write!(f, "css={}", self.selector()),
            Locator::OwningSelect(inner) => write!(f, "select owning {}", inner),
        }
    }
}
