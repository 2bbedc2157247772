//! Host-neutral description of an inline entity sub-form.
//!
//! The host renders these elements and hands back the submitted values as a
//! JSON tree; adapters only describe and read, they never render.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::quantity::QuantityDatatype;

/// Separator used to join a parents path into a field error path.
pub const PATH_SEPARATOR: &str = "][";

/// Order workflow status, as far as the line item form cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Cart,
    Checkout,
    Pending,
    Processing,
    Completed,
    Canceled,
}

impl OrderStatus {
    /// Cart orders still get their prices recalculated by the cart, so edits
    /// to prices would not stick.
    pub fn is_cart(self) -> bool {
        matches!(self, OrderStatus::Cart | OrderStatus::Checkout)
    }
}

/// A field instance the host attaches to a line-item bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInstance {
    pub field_name: String,
    pub label: String,
    pub weight: i32,
    /// Widget columns rendered for the field (e.g. `amount`, `currency_code`).
    #[serde(default)]
    pub columns: Vec<String>,
}

impl FieldInstance {
    pub fn new(field_name: impl Into<String>, label: impl Into<String>, weight: i32) -> Self {
        Self {
            field_name: field_name.into(),
            label: label.into(),
            weight,
            columns: Vec::new(),
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything the host knows about a bundle's form layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleInfo {
    /// Weight of the bundle's label extra field.
    pub label_weight: i32,
    pub field_instances: Vec<FieldInstance>,
}

/// Context the host passes when building a sub-form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormContext {
    /// Where the sub-form's values live in the submitted tree.
    pub parents: Vec<String>,
    /// Status of the order embedding the sub-form, if known.
    pub order_status: Option<OrderStatus>,
    pub bundle: BundleInfo,
}

/// Kind of a form element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Fieldset,
    Textfield {
        #[serde(skip_serializing_if = "Option::is_none")]
        datatype: Option<QuantityDatatype>,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u32>,
        max_length: u32,
    },
    /// Widget of a host field instance.
    Field,
}

/// One element of a sub-form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormElement {
    pub kind: ElementKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub required: bool,
    pub weight: i32,
    /// Whether the element is shown at all.
    pub access: bool,
    pub disabled: bool,
    /// Fieldset the element is grouped into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fieldset: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, FormElement>,
}

impl FormElement {
    pub fn new(kind: ElementKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: None,
            default_value: None,
            required: false,
            weight: 0,
            access: true,
            disabled: false,
            fieldset: None,
            classes: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn fieldset(title: impl Into<String>) -> Self {
        Self::new(ElementKind::Fieldset, title)
    }

    pub fn textfield(title: impl Into<String>, max_length: u32) -> Self {
        Self::new(
            ElementKind::Textfield {
                datatype: None,
                size: None,
                max_length,
            },
            title,
        )
    }

    /// Datatype of a textfield, `None` for other kinds or free text.
    pub fn datatype(&self) -> Option<QuantityDatatype> {
        match self.kind {
            ElementKind::Textfield { datatype, .. } => datatype,
            _ => None,
        }
    }
}

/// A sub-form: elements keyed by name, plus where its values are submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityForm {
    pub parents: Vec<String>,
    pub elements: BTreeMap<String, FormElement>,
}

impl EntityForm {
    pub fn new(parents: Vec<String>) -> Self {
        Self {
            parents,
            elements: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, element: FormElement) {
        self.elements.insert(key.into(), element);
    }

    pub fn get(&self, key: &str) -> Option<&FormElement> {
        self.elements.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FormElement> {
        self.elements.get_mut(key)
    }

    /// Error path of an element: `parents][key`.
    pub fn field_path(&self, key: &str) -> String {
        self.parents
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(key))
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// The sub-form's own values within the submitted tree.
    pub fn values<'a>(&self, submitted: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        self.parents
            .iter()
            .try_fold(submitted, |node, key| node.get(key.as_str()))
    }

    /// Keys of accessible elements, ordered by weight then key.
    pub fn render_order(&self) -> Vec<&str> {
        let mut keys: Vec<(&str, i32)> = self
            .elements
            .iter()
            .filter(|(_, e)| e.access)
            .map(|(k, e)| (k.as_str(), e.weight))
            .collect();
        keys.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        keys.into_iter().map(|(k, _)| k).collect()
    }
}

/// A user-facing error attached to one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Errors of one validate pass. Any error blocks the whole submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First error attached to `path`.
    pub fn for_path(&self, path: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.path == path)
    }
}

impl core::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.path, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Read a submitted scalar as text (strings as-is, numbers formatted).
pub fn value_as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
