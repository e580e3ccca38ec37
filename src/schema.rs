//! Declarative field schema driving the coercion of raw form values.

use crate::form::{FormFields, parse_int};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Target type of a form field in the posted JSON.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Base-10 integer, `null` when the value does not start with digits.
    Integer,
    /// Checkbox convention: `true` iff the submitted value is `"on"`.
    Checkbox,
    /// Passed through as string.
    Text,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered list of field rules.
///
/// Fields not listed here are kept as strings. Integer and checkbox rules
/// always produce their key in the output, even if the form did not submit it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldSchema {
    rules: Vec<FieldRule>,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::esp32cfg()
    }
}

impl FieldSchema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// The schema of the device configuration form.
    pub fn esp32cfg() -> Self {
        Self::new(vec![
            FieldRule::new("port", FieldKind::Integer),
            FieldRule::new("v4mask", FieldKind::Integer),
            FieldRule::new("bps", FieldKind::Integer),
            FieldRule::new("serial_tcp_port", FieldKind::Integer),
            FieldRule::new("wifi_wpa2ent", FieldKind::Checkbox),
            FieldRule::new("v4dhcp", FieldKind::Checkbox),
            FieldRule::new("serial_write_enabled", FieldKind::Checkbox),
        ])
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse schema file {}", path.display()))
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.rules.iter().find(|r| r.name == name).map(|r| r.kind)
    }

    pub fn normalize(&self, fields: &FormFields) -> NormalizedConfig {
        let mut object: Map<String, Value> = fields
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();

        for rule in &self.rules {
            let raw = fields.get(&rule.name);

            let value = match rule.kind {
                FieldKind::Integer => raw.and_then(parse_int).map_or(Value::Null, Value::Number),
                FieldKind::Checkbox => Value::Bool(raw == Some("on")),
                FieldKind::Text => continue,
            };

            object.insert(rule.name.clone(), value);
        }

        NormalizedConfig(object)
    }
}

/// JSON object ready to be posted to the device.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedConfig(Map<String, Value>);

impl NormalizedConfig {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
