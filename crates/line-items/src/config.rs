//! Capability flags and line-item type configuration.
//!
//! Built once by the host at initialization and passed into the pricing rule
//! and the form adapter. Nothing here is looked up globally at call time.

use serde::{Deserialize, Serialize};

use lineform_core::{DomainError, DomainResult};

use crate::quantity::QuantityDatatype;

pub const ENV_PRODUCT_REFERENCE_ENABLED: &str = "LINEFORM_PRODUCT_REFERENCE_ENABLED";
pub const ENV_PRODUCT_LINE_ITEM_TYPES: &str = "LINEFORM_PRODUCT_LINE_ITEM_TYPES";
pub const ENV_FRACTIONAL_QUANTITY_TYPES: &str = "LINEFORM_FRACTIONAL_QUANTITY_TYPES";

/// Optional host capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// Line items can reference products. When off, no line-item type is
    /// treated as a product type.
    pub product_reference_enabled: bool,
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self {
            product_reference_enabled: true,
        }
    }
}

/// Line-item configuration shared by the pricing rule and the form adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemConfig {
    pub capabilities: CapabilityFlags,
    /// Line-item types that reference a product and take its SKU as label.
    pub product_line_item_types: Vec<String>,
    /// Line-item types whose quantity may be fractional.
    pub fractional_quantity_types: Vec<String>,
}

impl Default for LineItemConfig {
    fn default() -> Self {
        Self {
            capabilities: CapabilityFlags::default(),
            product_line_item_types: vec!["product".to_string()],
            fractional_quantity_types: Vec::new(),
        }
    }
}

impl LineItemConfig {
    pub fn with_capabilities(mut self, capabilities: CapabilityFlags) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_product_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_line_item_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fractional_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fractional_quantity_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Load from `LINEFORM_*` environment variables, defaulting what is unset.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PRODUCT_REFERENCE_ENABLED) {
            config.capabilities.product_reference_enabled =
                parse_bool(ENV_PRODUCT_REFERENCE_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PRODUCT_LINE_ITEM_TYPES) {
            config.product_line_item_types = parse_list(&raw);
        }
        if let Some(raw) = lookup(ENV_FRACTIONAL_QUANTITY_TYPES) {
            config.fractional_quantity_types = parse_list(&raw);
        }

        Ok(config)
    }

    /// Product line-item types, empty when product references are disabled.
    pub fn product_line_item_types(&self) -> &[String] {
        if self.capabilities.product_reference_enabled {
            &self.product_line_item_types
        } else {
            &[]
        }
    }

    pub fn is_product_type(&self, bundle: &str) -> bool {
        self.product_line_item_types().iter().any(|t| t == bundle)
    }

    pub fn quantity_datatype(&self, bundle: &str) -> QuantityDatatype {
        if self.fractional_quantity_types.iter().any(|t| t == bundle) {
            QuantityDatatype::Decimal
        } else {
            QuantityDatatype::Integer
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> DomainResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DomainError::validation(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_recognize_product_type() {
        let config = LineItemConfig::default();
        assert!(config.is_product_type("product"));
        assert!(!config.is_product_type("shipping"));
        assert_eq!(config.quantity_datatype("product"), QuantityDatatype::Integer);
    }

    #[test]
    fn disabled_product_reference_means_no_product_types() {
        let config = LineItemConfig::default().with_capabilities(CapabilityFlags {
            product_reference_enabled: false,
        });
        assert!(config.product_line_item_types().is_empty());
        assert!(!config.is_product_type("product"));
    }

    #[test]
    fn loads_from_environment_lookup() {
        let config = LineItemConfig::from_lookup(lookup_from(&[
            (ENV_PRODUCT_REFERENCE_ENABLED, "yes"),
            (ENV_PRODUCT_LINE_ITEM_TYPES, "product, subscription ,"),
            (ENV_FRACTIONAL_QUANTITY_TYPES, "bulk"),
        ]))
        .unwrap();

        assert_eq!(config.product_line_item_types(), ["product", "subscription"]);
        assert_eq!(config.quantity_datatype("bulk"), QuantityDatatype::Decimal);
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let config = LineItemConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, LineItemConfig::default());
    }

    #[test]
    fn malformed_flag_is_a_validation_error() {
        let err = LineItemConfig::from_lookup(lookup_from(&[(ENV_PRODUCT_REFERENCE_ENABLED, "maybe")]))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains(ENV_PRODUCT_REFERENCE_ENABLED) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let config: LineItemConfig = serde_json::from_value(serde_json::json!({
            "capabilities": { "product_reference_enabled": false }
        }))
        .unwrap();
        assert!(!config.capabilities.product_reference_enabled);
        assert_eq!(config.product_line_item_types, vec!["product".to_string()]);
    }
}
