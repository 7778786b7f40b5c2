//! Attributed tree that pattern documents are read from and written to.
//!
//! The tree mirrors the shape of a JML file: every node has a tag, string
//! attributes in document order, optional text, and child nodes. It can be
//! loaded from JSON or YAML; scalar attribute values of any type are kept as
//! their textual form.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("failed to parse JSON: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[source] Arc<serde_yaml::Error>),

    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("attribute \"{key}\" must be a scalar")]
    NonScalarAttribute { key: String },

    #[error("expected a <{expected}> node, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },

    #[error("<{tag}> is missing attribute \"{key}\"")]
    MissingAttribute { tag: String, key: String },

    #[error("<{tag}> has invalid {key}=\"{value}\"")]
    InvalidAttribute {
        tag: String,
        key: String,
        value: String,
    },

    #[error("invalid hand \"{value}\" (expected [juggler:]left|right)")]
    InvalidHand { value: String },
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::Json(Arc::new(e))
    }
}

impl From<serde_yaml::Error> for DocumentError {
    fn from(e: serde_yaml::Error) -> Self {
        DocumentError::Yaml(Arc::new(e))
    }
}

/// Every variant's message carries all of its fields, including the wrapped
/// parser error's position.
impl PartialEq for DocumentError {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.to_string() == other.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JmlNode {
    pub tag: String,
    #[serde(
        default,
        deserialize_with = "scalar_attributes",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JmlNode>,
}

impl JmlNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.insert(key.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: JmlNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, DocumentError> {
        self.get(key).ok_or_else(|| DocumentError::MissingAttribute {
            tag: self.tag.clone(),
            key: key.to_string(),
        })
    }

    /// Numeric attribute, or `default` when absent.
    pub fn get_f64(&self, key: &str, default: f64) -> Result<f64, DocumentError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => self.parse_value(key, v),
        }
    }

    pub fn get_usize(&self, key: &str, default: usize) -> Result<usize, DocumentError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => self.parse_value(key, v),
        }
    }

    pub(crate) fn parse_value<T: std::str::FromStr>(
        &self,
        key: &str,
        value: &str,
    ) -> Result<T, DocumentError> {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| DocumentError::InvalidAttribute {
                tag: self.tag.clone(),
                key: key.to_string(),
                value: value.to_string(),
            })
    }

    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a JmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Serialize(e.to_string()))
    }

    pub fn to_yaml_string(&self) -> Result<String, DocumentError> {
        serde_yaml::to_string(self).map_err(|e| DocumentError::Serialize(e.to_string()))
    }
}

fn scalar_attributes<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(serde::de::Error::custom(
                        DocumentError::NonScalarAttribute { key },
                    ));
                }
            };
            Ok((key, text))
        })
        .collect()
}
