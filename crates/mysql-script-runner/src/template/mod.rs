//! Script templating.
//!
//! When templating is enabled, each script is passed through a
//! [`TemplateRenderer`] before it is sent to the server. The renderer gets an
//! explicit [`TemplateContext`]; nothing is looked up from process-wide state
//! unless the caller puts it in the context (see [`TemplateContext::with_env`]).
//!
//! The built-in [`InterpolationRenderer`] understands `<%= path %>` tags:
//!
//! ```text
//! CREATE DATABASE IF NOT EXISTS `<%= schema %>`;
//! GRANT ALL ON `<%= schema %>`.* TO '<%= app.user %>'@'%';
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Regex matching `<%= path %>` interpolation tags.
static INTERPOLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<%=\s*([A-Za-z_$][\w$]*(?:\.[\w$]+)*)\s*%>").expect("valid regex")
});

/// Opening delimiter shared by every tag form (`<%=`, `<%-`, `<%`).
const OPEN_TAG: &str = "<%";

/// Error raised while rendering a template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The expression did not resolve in the context.
    #[error("'{0}' is not defined")]
    Undefined(String),

    /// A tag was opened but never closed, is not an interpolation tag, or
    /// does not hold a plain path.
    #[error("malformed template tag at byte {0}")]
    Malformed(usize),
}

/// Variables available to template expressions.
///
/// Always a JSON object at the top level. The default context is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateContext {
    root: Map<String, Value>,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self { root: Map::new() }
    }
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the process environment under `env`.
    pub fn with_env(mut self) -> Self {
        // Variables that are not valid UTF-8 are skipped.
        let env: Map<String, Value> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, Value::String(v.into_string().ok()?))))
            .collect();
        self.root.insert("env".to_string(), Value::Object(env));
        self
    }

    /// Set a top-level variable, replacing any existing value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.root.insert(key.into(), value.into());
        self
    }

    /// Shallow-merge the keys of a JSON object into the context.
    ///
    /// Returns `None` if `value` is not an object.
    pub fn merge(mut self, value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                self.root.extend(map);
                Some(self)
            }
            _ => None,
        }
    }

    /// Look up a dotted path such as `app.user`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Renders a script's raw text into the SQL that is actually executed.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, text: &str, context: &TemplateContext) -> Result<String, TemplateError>;
}

/// Substitutes `<%= path %>` tags with values from the context.
///
/// Evaluation (`<% ... %>`) and escaping (`<%- ... %>`) tags are not
/// supported and fail to render rather than reach the server.
///
/// Strings are inserted verbatim, `null` as an empty string, arrays and
/// objects as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolationRenderer;

impl InterpolationRenderer {
    fn to_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

impl TemplateRenderer for InterpolationRenderer {
    fn render(&self, text: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for caps in INTERPOLATE_RE.captures_iter(text) {
            let tag = caps.get(0).expect("capture 0 is the whole match");
            let between = &text[last..tag.start()];
            if let Some(pos) = between.find(OPEN_TAG) {
                return Err(TemplateError::Malformed(last + pos));
            }

            let path = &caps[1];
            let value = context
                .lookup(path)
                .ok_or_else(|| TemplateError::Undefined(path.to_string()))?;

            output.push_str(between);
            output.push_str(&Self::to_text(value));
            last = tag.end();
        }

        let rest = &text[last..];
        if let Some(pos) = rest.find(OPEN_TAG) {
            return Err(TemplateError::Malformed(last + pos));
        }
        output.push_str(rest);

        Ok(output)
    }
}
