//! Minimal page model: forms, their controls and the submit event flow.
//!
//! The page is passed explicitly to whoever wires listeners into it, instead
//! of being looked up through global state.

use crate::form::FormFields;
use anyhow::{Context, Result};
use log::debug;
use reqwest::Url;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::{runtime::Handle, task::JoinHandle};

pub type ListenerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlType {
    Text,
    Number,
    Password,
    Hidden,
    Checkbox,
    Radio,
    Select,
    TextArea,
    Submit,
    Button,
    Reset,
    File,
    Image,
}

#[derive(Clone, Debug)]
pub struct FormControl {
    pub name: String,
    pub control_type: ControlType,
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
}

impl FormControl {
    pub fn new(
        name: impl Into<String>,
        control_type: ControlType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            control_type,
            value: value.into(),
            checked: false,
            disabled: false,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlType::Text, value)
    }

    pub fn number(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ControlType::Number, value)
    }

    /// Checkbox without a value attribute, submitting `"on"` when checked.
    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, ControlType::Checkbox, "")
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn is_successful(&self) -> bool {
        if self.disabled || self.name.is_empty() {
            return false;
        }

        match self.control_type {
            ControlType::Submit
            | ControlType::Button
            | ControlType::Reset
            | ControlType::File
            | ControlType::Image => false,
            ControlType::Checkbox | ControlType::Radio => self.checked,
            _ => true,
        }
    }

    fn submitted_value(&self) -> &str {
        let checkable = matches!(
            self.control_type,
            ControlType::Checkbox | ControlType::Radio
        );

        if checkable && self.value.is_empty() {
            "on"
        } else {
            &self.value
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormElement {
    pub name: Option<String>,
    pub action: Url,
    pub controls: Vec<FormControl>,
}

impl FormElement {
    /// Creates a form whose action attribute is resolved against `page_url`.
    ///
    /// An empty action submits to the page itself.
    pub fn new(name: Option<&str>, action: &str, page_url: &Url) -> Result<Self> {
        let action = if action.trim().is_empty() {
            page_url.clone()
        } else {
            page_url
                .join(action.trim())
                .with_context(|| format!("failed to resolve form action {action:?}"))?
        };

        Ok(Self {
            name: name.map(str::to_string),
            action,
            controls: Vec::new(),
        })
    }

    pub fn with_control(mut self, control: FormControl) -> Self {
        self.controls.push(control);
        self
    }

    /// Text controls holding already submitted field values.
    pub fn with_fields(mut self, fields: &FormFields) -> Self {
        self.controls.extend(
            fields
                .iter()
                .map(|(name, value)| FormControl::text(name, value)),
        );
        self
    }

    /// The entries a browser would put into `new FormData(form)`.
    pub fn form_data(&self) -> FormFields {
        self.controls
            .iter()
            .filter(|c| c.is_successful())
            .map(|c| (c.name.as_str(), c.submitted_value()))
            .collect()
    }
}

/// Submit event delivered to the listeners of one form.
#[derive(Debug)]
pub struct SubmitEvent {
    current_target: Arc<FormElement>,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(current_target: Arc<FormElement>) -> Self {
        Self {
            current_target,
            default_prevented: false,
        }
    }

    pub fn current_target(&self) -> &Arc<FormElement> {
        &self.current_target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub trait SubmitListener: Send + Sync {
    /// Runs synchronously during dispatch. Work that has to wait is returned
    /// as a future and runs after dispatch completed.
    fn handle_submit(&self, event: &mut SubmitEvent) -> Option<ListenerFuture>;
}

/// Outcome of dispatching a submit event.
#[derive(Debug)]
pub struct SubmitDispatch {
    pub default_prevented: bool,
    /// Where the browser would navigate to, if no listener prevented it.
    pub navigation: Option<Url>,
    pub pending: Vec<JoinHandle<()>>,
}

impl SubmitDispatch {
    /// Waits until every listener task has finished.
    pub async fn settle(self) -> Result<()> {
        for task in self.pending {
            task.await.context("submit listener task failed")?;
        }
        Ok(())
    }
}

type ContentLoadedCallback = Box<dyn FnOnce(&mut Document) + Send>;

pub struct Document {
    url: Url,
    forms: Vec<Arc<FormElement>>,
    parsed: bool,
    content_loaded: Vec<ContentLoadedCallback>,
    submit_listeners: Vec<(usize, Arc<dyn SubmitListener>)>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("forms", &self.forms)
            .field("parsed", &self.parsed)
            .field("submit_listeners", &self.submit_listeners.len())
            .finish()
    }
}

impl Document {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            forms: Vec::new(),
            parsed: false,
            content_loaded: Vec::new(),
            submit_listeners: Vec::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn append_form(&mut self, form: FormElement) -> Arc<FormElement> {
        let form = Arc::new(form);
        self.forms.push(form.clone());
        form
    }

    pub fn forms(&self) -> &[Arc<FormElement>] {
        &self.forms
    }

    /// Registers a callback for the end of parsing.
    ///
    /// Like `DOMContentLoaded`, a callback registered after parsing finished
    /// never runs.
    pub fn on_content_loaded(&mut self, callback: impl FnOnce(&mut Document) + Send + 'static) {
        if self.parsed {
            debug!("content already loaded, callback will not run");
            return;
        }
        self.content_loaded.push(Box::new(callback));
    }

    /// Marks the page as parsed and runs the content-loaded callbacks once.
    pub fn finish_parsing(&mut self) {
        if self.parsed {
            return;
        }
        self.parsed = true;

        for callback in std::mem::take(&mut self.content_loaded) {
            callback(self);
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// First form whose name attribute equals `name`.
    pub fn query_form_by_name(&self, name: &str) -> Option<&Arc<FormElement>> {
        self.forms.iter().find(|f| f.name.as_deref() == Some(name))
    }

    fn form_index(&self, form: &Arc<FormElement>) -> Option<usize> {
        self.forms.iter().position(|f| Arc::ptr_eq(f, form))
    }

    pub fn add_submit_listener(
        &mut self,
        form: &Arc<FormElement>,
        listener: Arc<dyn SubmitListener>,
    ) -> Result<()> {
        let index = self
            .form_index(form)
            .context("failed to add submit listener: form is not part of this document")?;

        self.submit_listeners.push((index, listener));
        Ok(())
    }

    /// Submits the first form named `name`.
    ///
    /// Listeners run in registration order; futures they return are spawned
    /// on the current tokio runtime. Fails when a listener returns a future
    /// and no runtime is entered.
    pub fn submit(&self, name: &str) -> Result<SubmitDispatch> {
        let form = self
            .query_form_by_name(name)
            .with_context(|| format!("failed to submit: no form named {name:?}"))?;
        let index = self
            .form_index(form)
            .context("failed to submit: form is not part of this document")?;

        let mut event = SubmitEvent::new(form.clone());
        let futures: Vec<ListenerFuture> = self
            .submit_listeners
            .iter()
            .filter(|(i, _)| *i == index)
            .filter_map(|(_, listener)| listener.handle_submit(&mut event))
            .collect();

        let pending = if futures.is_empty() {
            Vec::new()
        } else {
            let runtime = Handle::try_current()
                .context("failed to submit: no tokio runtime to run submit listeners")?;
            futures.into_iter().map(|f| runtime.spawn(f)).collect()
        };

        let default_prevented = event.default_prevented();
        let navigation = (!default_prevented).then(|| form.action.clone());

        if let Some(url) = &navigation {
            debug!("form {name:?} submitted natively to {url}");
        }

        Ok(SubmitDispatch {
            default_prevented,
            navigation,
            pending,
        })
    }
}
