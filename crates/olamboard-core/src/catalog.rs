//! Element records and display metadata loaded at startup.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Metadata key naming the property the default layout sorts by.
pub const DEFAULT_SORT_KEY: &str = "_DEFAULT_SORT_";
/// Sort value requesting a shuffled square layout.
pub const RANDOM_SORT: &str = "_random_";
/// Fallback entry inside a property's `info-values` table.
const INFO_DEFAULT_KEY: &str = "_DEFAULT_";

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid element list: {0}")]
    Elements(serde_json::Error),
    #[error("Invalid metadata: {0}")]
    Metadata(serde_json::Error),
    #[error("Metadata must be a JSON object")]
    MetadataShape,
}

/// Which properties of an element came from an override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Overridden {
    #[default]
    None,
    /// The whole element was added by an override.
    All,
    /// Only these properties were replaced.
    Properties(Vec<String>),
}

/// One item on the board, as loaded from the element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip)]
    pub overridden: Overridden,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ElementRecord {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            hidden: false,
            overridden: Overridden::None,
            properties: Map::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Property as a number, accepting numeric strings.
    pub fn numeric_property(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Set a field by name, routing the typed fields to their slots.
    pub fn set_field(&mut self, key: &str, value: Value) {
        match key {
            "symbol" => {
                if let Some(symbol) = value.as_str() {
                    self.symbol = symbol.to_string();
                }
            }
            "name" => self.name = display_value(&value),
            "hidden" => self.hidden = value.as_bool().unwrap_or(false),
            _ => {
                self.properties.insert(key.to_string(), value);
            }
        }
    }
}

/// Display rules for one property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMeta {
    #[serde(rename = "info-label", default)]
    pub info_label: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(rename = "info-values", default)]
    pub info_values: Option<Map<String, Value>>,
    #[serde(rename = "colours-only", default)]
    pub colours_only: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How the default layout orders visible elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSort {
    Random,
    Property(String),
    Unsorted,
}

/// Metadata document keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub default_sort: Option<String>,
    pub properties: BTreeMap<String, PropertyMeta>,
}

impl Metadata {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(json).map_err(CatalogError::Metadata)?;
        let Value::Object(mut map) = value else {
            return Err(CatalogError::MetadataShape);
        };
        let default_sort = map
            .remove(DEFAULT_SORT_KEY)
            .and_then(|v| v.as_str().map(str::to_string));
        let mut properties = BTreeMap::new();
        for (key, value) in map {
            let meta = serde_json::from_value(value).map_err(CatalogError::Metadata)?;
            properties.insert(key, meta);
        }
        Ok(Self {
            default_sort,
            properties,
        })
    }

    pub fn sort(&self) -> DefaultSort {
        match self.default_sort.as_deref() {
            Some(RANDOM_SORT) => DefaultSort::Random,
            Some(key) => DefaultSort::Property(key.to_string()),
            None => DefaultSort::Unsorted,
        }
    }
}

/// One line of the element detail overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub label: String,
    pub value: String,
}

/// Element list plus metadata.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub elements: Vec<ElementRecord>,
    pub metadata: Metadata,
}

impl Catalog {
    pub fn new(elements: Vec<ElementRecord>, metadata: Metadata) -> Self {
        Self { elements, metadata }
    }

    /// Parse the two startup documents.
    pub fn from_json(elements_json: &str, metadata_json: &str) -> Result<Self, CatalogError> {
        let elements = serde_json::from_str(elements_json).map_err(CatalogError::Elements)?;
        let metadata = Metadata::from_json(metadata_json)?;
        Ok(Self { elements, metadata })
    }

    /// Title and per-property lines for the detail overlay.
    pub fn info(&self, record: &ElementRecord) -> (String, Vec<InfoLine>) {
        let title = format!("{} \u{2014} {}", record.symbol, record.name);
        let lines = self
            .metadata
            .properties
            .iter()
            .map(|(key, meta)| {
                let raw = record.property(key).cloned().unwrap_or(Value::Null);
                let value = match &meta.info_values {
                    Some(table) => table
                        .get(&display_value(&raw))
                        .or_else(|| table.get(INFO_DEFAULT_KEY))
                        .map(display_value)
                        .unwrap_or_default(),
                    None => display_value(&raw),
                };
                let value = format!(
                    "{}{}{}",
                    meta.prefix.as_deref().unwrap_or(""),
                    value,
                    meta.suffix.as_deref().unwrap_or("")
                );
                InfoLine {
                    label: meta.info_label.clone().unwrap_or_else(|| key.clone()),
                    value,
                }
            })
            .collect();
        (title, lines)
    }
}

/// Render a JSON value the way it would be shown as text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
