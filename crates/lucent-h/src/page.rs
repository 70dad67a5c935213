//! CDP-backed implementations of the engine's page seams.

use crate::inject;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::dom::{
    BackendNodeId, EnableParams, GetDocumentParams, NodeId, PushNodesByBackendIdsToFrontendParams,
    RemoveAttributeParams, SetAttributeValueParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    CallFunctionOnParams, EvaluateParams, ExceptionDetails, RemoteObjectId,
};
use chromiumoxide::layout::Point;
use lucent_common::error_mapping::map_protocol_error;
use lucent_common::{DriverError, FrontendNodeId, LiveNode, Locator, NodeRef, SelectBy};
use lucent_engine::driver::{DomProtocol, ElementActions, ScriptRuntime};
use serde_json::Value;
use std::time::Duration;

/// A browser tab, addressed through raw DOM commands, element handles and scripts.
#[derive(Debug, Clone)]
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Remote handle to the located element, searched through shadow roots and frames.
    async fn element(&self, locator: &Locator) -> Result<RemoteObjectId, DriverError> {
        let params = EvaluateParams::builder()
            .expression(lookup_expression(locator)?)
            .return_by_value(false)
            .build()
            .map_err(DriverError::Protocol)?;
        let returns = self
            .page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?
            .result;
        if let Some(details) = returns.exception_details {
            return Err(exception_error(&details));
        }
        returns
            .result
            .object_id
            .ok_or_else(|| DriverError::Protocol(format!("No element matches {}", locator)))
    }

    /// Run `function` with `this` bound to the located element and return its result.
    async fn call_value(&self, locator: &Locator, function: &str) -> Result<Value, DriverError> {
        let object_id = self.element(locator).await?;
        let params = CallFunctionOnParams::builder()
            .function_declaration(function)
            .object_id(object_id)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(DriverError::Protocol)?;
        let returns = self
            .page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?
            .result;
        if let Some(details) = returns.exception_details {
            return Err(exception_error(&details));
        }
        Ok(returns.result.value.unwrap_or(Value::Null))
    }

    async fn call_on(&self, locator: &Locator, function: &str) -> Result<String, DriverError> {
        Ok(match self.call_value(locator, function).await? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    async fn center_of(&self, locator: &Locator) -> Result<Point, DriverError> {
        let center = self.call_value(locator, CENTER_FN).await?;
        match (center["x"].as_f64(), center["y"].as_f64()) {
            (Some(x), Some(y)) => Ok(Point { x, y }),
            _ => Err(DriverError::Protocol(format!("{} has no layout box", locator))),
        }
    }

    async fn mouse(&self, kind: DispatchMouseEventType, at: Point) -> Result<(), DriverError> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(at.x)
            .y(at.y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(DriverError::Protocol)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(())
    }
}

/// Finds the first element matching `selector` in the document, then in open shadow
/// roots and same-origin frames. `owning` moves to the closest `<select>` that many times.
const LOCATE_FN: &str = r#"(selector, owning) => {
    const search = (root) => {
        const hit = root.querySelector(selector);
        if (hit) return hit;
        for (const el of root.querySelectorAll('*')) {
            if (el.shadowRoot) {
                const found = search(el.shadowRoot);
                if (found) return found;
            }
            if (el.tagName === 'IFRAME' || el.tagName === 'FRAME') {
                let doc = null;
                try { doc = el.contentDocument; } catch (e) {}
                if (doc) {
                    const found = search(doc);
                    if (found) return found;
                }
            }
        }
        return null;
    };
    let el = search(document);
    for (let i = 0; el && i < owning; i++) {
        el = el.closest('select');
    }
    return el;
}"#;

/// Viewport center of `this` in top-level coordinates, after scrolling it into view.
const CENTER_FN: &str = r#"function() {
    this.scrollIntoView({ block: 'center', inline: 'center' });
    const rect = this.getBoundingClientRect();
    if (rect.width === 0 && rect.height === 0) return null;
    let x = rect.left + rect.width / 2;
    let y = rect.top + rect.height / 2;
    let view = this.ownerDocument.defaultView;
    while (view && view.frameElement) {
        const frame = view.frameElement;
        const box = frame.getBoundingClientRect();
        x += box.left + frame.clientLeft;
        y += box.top + frame.clientTop;
        view = view.parent;
    }
    return { x, y };
}"#;

fn lookup_expression(locator: &Locator) -> Result<String, DriverError> {
    let mut owning = 0u32;
    let mut target = locator;
    while let Locator::OwningSelect(inner) = target {
        owning += 1;
        target = inner;
    }
    let selector = serde_json::to_string(&target.selector())?;
    Ok(format!("({})({}, {})", LOCATE_FN, selector, owning))
}

fn exception_error(details: &ExceptionDetails) -> DriverError {
    let message = details
        .exception
        .as_ref()
        .and_then(|e| e.description.clone())
        .unwrap_or_else(|| details.text.clone());
    map_protocol_error(&message, None)
}

fn fill_function(text: &str) -> Result<String, DriverError> {
    let text = serde_json::to_string(text)?;
    Ok(format!(
        r#"function() {{
    this.focus();
    if ('value' in this) {{
        this.value = {text};
    }} else {{
        this.textContent = {text};
    }}
    this.dispatchEvent(new Event('input', {{ bubbles: true }}));
    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return '';
}}"#
    ))
}

const SELECTED: &str = "selected";
const NO_OPTION: &str = "no-option";
const NOT_SELECT: &str = "not-select:";

fn select_function(option: &SelectBy) -> Result<String, DriverError> {
    let wanted = serde_json::to_string(option.text())?;
    let matcher = match option {
        SelectBy::Label(_) => "(o) => o.label.trim() === wanted || o.text.trim() === wanted",
        SelectBy::Value(_) => "(o) => o.value === wanted",
    };
    Ok(format!(
        r#"function() {{
    const tag = this.tagName.toLowerCase();
    if (tag !== 'select') {{
        return '{NOT_SELECT}' + tag;
    }}
    const wanted = {wanted};
    const option = Array.from(this.options).find({matcher});
    if (!option) {{
        return '{NO_OPTION}';
    }}
    this.value = option.value;
    this.dispatchEvent(new Event('input', {{ bubbles: true }}));
    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return '{SELECTED}';
}}"#
    ))
}

fn select_outcome(outcome: &str, option: &SelectBy) -> Result<(), DriverError> {
    if outcome == SELECTED {
        return Ok(());
    }
    if let Some(tag) = outcome.strip_prefix(NOT_SELECT) {
        return Err(DriverError::TypeMismatch {
            expected: "select".into(),
            got: tag.to_string(),
        });
    }
    if outcome == NO_OPTION {
        return Err(DriverError::OptionNotFound {
            value: option.text().to_string(),
        });
    }
    Err(DriverError::Protocol(format!(
        "Unexpected select outcome: {}",
        outcome
    )))
}

#[async_trait]
impl DomProtocol for CdpPage {
    async fn enable_dom(&self) -> Result<(), DriverError> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(())
    }

    async fn request_flattened_document(&self) -> Result<(), DriverError> {
        let params = GetDocumentParams::builder().depth(-1).pierce(true).build();
        self.page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), None))?;
        Ok(())
    }

    async fn push_backend_node(&self, id: NodeRef) -> Result<LiveNode, DriverError> {
        let params = PushNodesByBackendIdsToFrontendParams::new(vec![BackendNodeId::new(id.0)]);
        let response = self
            .page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), Some(id)))?;
        // Node id 0 is how the protocol says "no such node".
        match response.result.node_ids.first().map(|n| *n.inner()) {
            Some(node_id) if node_id != 0 => Ok(LiveNode {
                id,
                node_id: FrontendNodeId(node_id),
            }),
            _ => Err(DriverError::NotFound { id }),
        }
    }

    async fn set_attribute(
        &self,
        node: &LiveNode,
        name: &str,
        value: &str,
    ) -> Result<(), DriverError> {
        let params = SetAttributeValueParams::new(NodeId::new(node.node_id.0), name, value);
        self.page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), Some(node.id)))?;
        Ok(())
    }

    async fn remove_attribute(&self, node: &LiveNode, name: &str) -> Result<(), DriverError> {
        let params = RemoveAttributeParams::new(NodeId::new(node.node_id.0), name);
        self.page
            .execute(params)
            .await
            .map_err(|e| map_protocol_error(&e.to_string(), Some(node.id)))?;
        Ok(())
    }
}

#[async_trait]
impl ElementActions for CdpPage {
    async fn tag_name(&self, locator: &Locator) -> Result<String, DriverError> {
        self.call_on(locator, "function() { return this.tagName.toLowerCase(); }")
            .await
    }

    async fn text_content(&self, locator: &Locator) -> Result<String, DriverError> {
        self.call_on(locator, "function() { return this.textContent || ''; }")
            .await
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        let point = self.center_of(locator).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, point).await?;
        self.mouse(DispatchMouseEventType::MousePressed, point).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, point).await
    }

    async fn hover(&self, locator: &Locator) -> Result<(), DriverError> {
        let point = self.center_of(locator).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, point).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        self.call_on(locator, &fill_function(text)?).await?;
        Ok(())
    }

    async fn select_option(
        &self,
        locator: &Locator,
        option: &SelectBy,
    ) -> Result<(), DriverError> {
        let outcome = self.call_on(locator, &select_function(option)?).await?;
        select_outcome(&outcome, option)
    }

    async fn drag_to(&self, from: &Locator, to: &Locator) -> Result<(), DriverError> {
        let start = self.center_of(from).await?;
        let end = self.center_of(to).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, start).await?;
        self.mouse(DispatchMouseEventType::MousePressed, start).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, end).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, end).await
    }
}

#[async_trait]
impl ScriptRuntime for CdpPage {
    async fn evaluate(&self, expression: &str) -> Result<Value, DriverError> {
        inject::evaluate(&self.page, expression).await
    }

    async fn evaluate_async(
        &self,
        function: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value, DriverError> {
        inject::evaluate_async(&self.page, function, &args, timeout).await
    }
}
