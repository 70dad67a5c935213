#![allow(dead_code)]

use async_trait::async_trait;
use lucent_engine::config::{LoadingConfig, ResolverConfig, VerificationConfig};
use lucent_engine::driver::{DomProtocol, Driver, ElementActions, NavigationResult};
use lucent_engine::judge::{Judge, JudgmentRequest};
use lucent_engine::loading::{LoadingClassifier, LoadingDetector};
use lucent_engine::protocol::{
    AccessibleSnapshot, AccessibleTree, FrontendNodeId, JudgmentResult, Key, LiveNode, Locator,
    NodeRef, Screenshot, SelectBy,
};
use lucent_engine::resolution::Interactor;
use lucent_engine::verifier::{Sleeper, Verifier};
use lucent_engine::{DriverError, JudgeError};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MARKER: &str = "data-test-marker";

pub fn resolver_config() -> ResolverConfig {
    ResolverConfig {
        marker_attribute: Some(MARKER.to_string()),
        redirect_option_actions: true,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub tag: String,
    pub text: String,
    pub value: String,
    pub parent: Option<NodeRef>,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: HashMap<NodeRef, FakeNode>,
    document_requested: bool,
    enable_calls: usize,
    remove_failure: Option<String>,
    actions: Vec<String>,
}

/// In-memory document standing in for a live page. Clones share the document.
#[derive(Debug, Clone, Default)]
pub struct FakeDom {
    state: Arc<Mutex<DomState>>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: i64, tag: &str, text: &str, value: &str, parent: Option<i64>) {
        let node = FakeNode {
            tag: tag.to_string(),
            text: text.to_string(),
            value: value.to_string(),
            parent: parent.map(NodeRef),
            attributes: HashMap::new(),
        };
        self.state.lock().unwrap().nodes.insert(NodeRef(id), node);
    }

    /// A `<select>` (id 10) with options 11 (Low/lo) and 12 (High/hi), plus a button (id 1).
    pub fn with_form() -> Self {
        let dom = Self::new();
        dom.add(1, "BUTTON", "Submit", "", None);
        dom.add(10, "SELECT", "", "lo", None);
        dom.add(11, "OPTION", " Low ", "lo", Some(10));
        dom.add(12, "OPTION", "High", "hi", Some(10));
        dom
    }

    pub fn remove(&self, id: i64) {
        self.state.lock().unwrap().nodes.remove(&NodeRef(id));
    }

    pub fn fail_removal(&self, message: &str) {
        self.state.lock().unwrap().remove_failure = Some(message.to_string());
    }

    pub fn node(&self, id: i64) -> Option<FakeNode> {
        self.state.lock().unwrap().nodes.get(&NodeRef(id)).cloned()
    }

    pub fn value_of(&self, id: i64) -> String {
        self.node(id).map(|n| n.value).unwrap_or_default()
    }

    /// Number of nodes currently carrying any marker attribute.
    pub fn marker_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .nodes
            .values()
            .filter(|n| n.attributes.contains_key(MARKER))
            .count()
    }

    pub fn enable_calls(&self) -> usize {
        self.state.lock().unwrap().enable_calls
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    fn locate(state: &DomState, locator: &Locator) -> Result<NodeRef, DriverError> {
        match locator {
            Locator::Marker { attribute, value } => state
                .nodes
                .iter()
                .find(|(_, n)| n.attributes.get(attribute) == Some(value))
                .map(|(id, _)| *id)
                .ok_or_else(|| DriverError::Protocol(format!("No element matches {}", locator))),
            Locator::OwningSelect(inner) => {
                let mut current = Self::locate(state, inner)?;
                loop {
                    let node = &state.nodes[&current];
                    if node.tag.eq_ignore_ascii_case("select") {
                        return Ok(current);
                    }
                    current = node.parent.ok_or_else(|| {
                        DriverError::Protocol(format!("No element matches {}", locator))
                    })?;
                }
            }
        }
    }

    fn record(&self, locator: &Locator, action: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let id = Self::locate(&state, locator)?;
        state.actions.push(format!("{}:{}", action, id));
        Ok(())
    }
}

#[async_trait]
impl DomProtocol for FakeDom {
    async fn enable_dom(&self) -> Result<(), DriverError> {
        self.state.lock().unwrap().enable_calls += 1;
        Ok(())
    }

    async fn request_flattened_document(&self) -> Result<(), DriverError> {
        self.state.lock().unwrap().document_requested = true;
        Ok(())
    }

    async fn push_backend_node(&self, id: NodeRef) -> Result<LiveNode, DriverError> {
        let state = self.state.lock().unwrap();
        if !state.document_requested {
            return Err(DriverError::Protocol("Document needs to be requested first".into()));
        }
        if !state.nodes.contains_key(&id) {
            return Err(DriverError::NotFound { id });
        }
        Ok(LiveNode {
            id,
            node_id: FrontendNodeId(id.0 + 1000),
        })
    }

    async fn set_attribute(
        &self,
        node: &LiveNode,
        name: &str,
        value: &str,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .nodes
            .get_mut(&node.id)
            .ok_or(DriverError::NotFound { id: node.id })?;
        entry.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_attribute(&self, node: &LiveNode, name: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.remove_failure.take() {
            return Err(DriverError::Protocol(message));
        }
        let entry = state
            .nodes
            .get_mut(&node.id)
            .ok_or(DriverError::NotFound { id: node.id })?;
        entry.attributes.remove(name);
        Ok(())
    }
}

#[async_trait]
impl ElementActions for FakeDom {
    async fn tag_name(&self, locator: &Locator) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        let id = Self::locate(&state, locator)?;
        Ok(state.nodes[&id].tag.to_ascii_lowercase())
    }

    async fn text_content(&self, locator: &Locator) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        let id = Self::locate(&state, locator)?;
        Ok(state.nodes[&id].text.clone())
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        self.record(locator, "click")
    }

    async fn hover(&self, locator: &Locator) -> Result<(), DriverError> {
        self.record(locator, "hover")
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let id = Self::locate(&state, locator)?;
        state.nodes.get_mut(&id).unwrap().value = text.to_string();
        Ok(())
    }

    async fn select_option(
        &self,
        locator: &Locator,
        option: &SelectBy,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let id = Self::locate(&state, locator)?;
        let tag = state.nodes[&id].tag.to_ascii_lowercase();
        if tag != "select" {
            return Err(DriverError::TypeMismatch {
                expected: "select".into(),
                got: tag,
            });
        }
        let chosen = state
            .nodes
            .values()
            .filter(|n| n.parent == Some(id) && n.tag.eq_ignore_ascii_case("option"))
            .find(|n| match option {
                SelectBy::Label(label) => n.text.trim() == label,
                SelectBy::Value(value) => &n.value == value,
            })
            .map(|n| n.value.clone())
            .ok_or_else(|| DriverError::OptionNotFound {
                value: option.text().to_string(),
            })?;
        state.nodes.get_mut(&id).unwrap().value = chosen;
        Ok(())
    }

    async fn drag_to(&self, from: &Locator, to: &Locator) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let source = Self::locate(&state, from)?;
        let target = Self::locate(&state, to)?;
        state.actions.push(format!("drag:{}->{}", source, target));
        Ok(())
    }
}

pub fn interactor(dom: &FakeDom) -> Interactor<FakeDom> {
    Interactor::new(dom.clone(), &resolver_config())
}

/// Driver double: fixed page, counts captures, records actions.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    snapshots: Arc<AtomicUsize>,
    screenshots: Arc<AtomicUsize>,
    waits: Arc<AtomicUsize>,
    actions: Arc<Mutex<Vec<String>>>,
    broken: bool,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver whose page can no longer be read.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    pub fn screenshots(&self) -> usize {
        self.screenshots.load(Ordering::SeqCst)
    }

    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, action: String) -> Result<(), DriverError> {
        self.actions.lock().unwrap().push(action);
        Ok(())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn launch(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
    async fn is_ready(&self) -> bool {
        true
    }
    async fn navigate(&self, url: &str) -> Result<NavigationResult, DriverError> {
        self.record(format!("goto:{}", url))?;
        Ok(NavigationResult {
            url: url.to_string(),
            title: "Calculator".into(),
        })
    }
    async fn wait_for_load(&self) -> Result<(), DriverError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    async fn title(&self) -> Result<String, DriverError> {
        Ok("Calculator".into())
    }
    async fn url(&self) -> Result<String, DriverError> {
        Ok("https://example.test/calculator".into())
    }
    async fn accessible_tree(&self) -> Result<AccessibleTree, DriverError> {
        if self.broken {
            return Err(DriverError::Protocol("Target closed".into()));
        }
        self.wait_for_load().await?;
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(AccessibleTree::new(vec![
            json!({"nodeId": "1", "role": {"value": "textbox"}, "name": {"value": "2"}}),
        ]))
    }
    async fn screenshot(&self) -> Result<Screenshot, DriverError> {
        self.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(Screenshot(vec![0x89, b'P', b'N', b'G']))
    }
    async fn click(&self, id: NodeRef) -> Result<(), DriverError> {
        self.record(format!("click:{}", id))
    }
    async fn hover(&self, id: NodeRef) -> Result<(), DriverError> {
        self.record(format!("hover:{}", id))
    }
    async fn type_text(&self, id: NodeRef, text: &str) -> Result<(), DriverError> {
        self.record(format!("type:{}:{}", id, text))
    }
    async fn select(&self, id: NodeRef, value: &str) -> Result<(), DriverError> {
        self.record(format!("select:{}:{}", id, value))
    }
    async fn press_key(&self, key: Key) -> Result<(), DriverError> {
        self.record(format!("press:{}", key.as_str()))
    }
}

/// Judge double answering from a script; the last answer repeats.
#[derive(Debug, Clone, Default)]
pub struct ScriptedJudge {
    script: Arc<Mutex<VecDeque<bool>>>,
    last: Arc<Mutex<bool>>,
    calls: Arc<AtomicUsize>,
    screenshots: Arc<Mutex<Vec<bool>>>,
    error: Option<String>,
}

impl ScriptedJudge {
    pub fn always(result: bool) -> Self {
        Self::sequence(&[result])
    }

    pub fn sequence(results: &[bool]) -> Self {
        Self {
            script: Arc::new(Mutex::new(results.iter().copied().collect())),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn screenshots_seen(&self) -> Vec<bool> {
        self.screenshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(&self, request: JudgmentRequest<'_>) -> Result<JudgmentResult, JudgeError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.screenshots
            .lock()
            .unwrap()
            .push(request.screenshot.is_some());
        if let Some(message) = &self.error {
            return Err(JudgeError::Transport(message.clone()));
        }
        let result = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            *last
        };
        Ok(JudgmentResult {
            result,
            explanation: format!("attempt {} on {}", attempt, request.snapshot.title),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedClassifier {
    loading: bool,
    calls: Arc<AtomicUsize>,
    screenshots: Arc<Mutex<Vec<bool>>>,
}

impl FixedClassifier {
    pub fn new(loading: bool) -> Self {
        Self {
            loading,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn screenshots_seen(&self) -> Vec<bool> {
        self.screenshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl LoadingClassifier for FixedClassifier {
    async fn is_loading(
        &self,
        _snapshot: &AccessibleSnapshot,
        screenshot: Option<&Screenshot>,
    ) -> Result<bool, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.screenshots.lock().unwrap().push(screenshot.is_some());
        Ok(self.loading)
    }
}

/// Records requested pauses without waiting.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub fn loading_config(timeout_ms: u64, delay_ms: u64) -> LoadingConfig {
    LoadingConfig {
        timeout_ms,
        delay_ms,
    }
}

pub fn verifier(
    judge: &ScriptedJudge,
    classifier: &FixedClassifier,
    loading: LoadingConfig,
    config: VerificationConfig,
    sleeper: &RecordingSleeper,
) -> Verifier<ScriptedJudge, FixedClassifier> {
    Verifier::new(
        judge.clone(),
        LoadingDetector::new(classifier.clone(), loading),
        config,
    )
    .with_sleeper(sleeper.clone())
}
