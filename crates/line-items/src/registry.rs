//! Static mapping from entity kind to its inline form adapter.

use std::collections::HashMap;

use tracing::info;

use lineform_core::{DomainError, DomainResult};

use crate::adapter::{EntityFormAdapter, InlineFormSettings, SettingsForm, TableField};
use crate::config::LineItemConfig;
use crate::line_item_form::LineItemFormAdapter;

/// Every supported adapter, one variant per entity kind.
#[derive(Debug, Clone)]
pub enum FormAdapter {
    LineItem(LineItemFormAdapter),
}

impl FormAdapter {
    pub fn as_line_item(&self) -> Option<&LineItemFormAdapter> {
        match self {
            FormAdapter::LineItem(adapter) => Some(adapter),
        }
    }

    fn inner(&self) -> &dyn EntityFormAdapter {
        match self {
            FormAdapter::LineItem(adapter) => adapter,
        }
    }
}

impl EntityFormAdapter for FormAdapter {
    fn entity_kind(&self) -> &'static str {
        self.inner().entity_kind()
    }

    fn table_fields(&self, bundles: &[String]) -> Vec<TableField> {
        let mut fields = self.inner().table_fields(bundles);
        fields.sort_by_key(|f| f.weight);
        fields
    }

    fn default_settings(&self) -> InlineFormSettings {
        self.inner().default_settings()
    }

    fn settings_form(&self, settings: &InlineFormSettings) -> SettingsForm {
        self.inner().settings_form(settings)
    }
}

impl From<LineItemFormAdapter> for FormAdapter {
    fn from(adapter: LineItemFormAdapter) -> Self {
        FormAdapter::LineItem(adapter)
    }
}

/// Adapters by entity kind, built once at initialization.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, FormAdapter>,
}

impl AdapterRegistry {
    /// Registry with every built-in adapter.
    pub fn with_defaults(config: LineItemConfig) -> Self {
        let mut adapters = HashMap::new();
        let line_items = FormAdapter::from(LineItemFormAdapter::new(config));
        adapters.insert(line_items.entity_kind(), line_items);

        info!(kinds = ?adapters.keys().collect::<Vec<_>>(), "inline form adapters registered");
        Self { adapters }
    }

    /// Build from an explicit adapter list. Two adapters for one kind is a
    /// configuration error.
    pub fn from_adapters<I>(adapters: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = FormAdapter>,
    {
        let mut registry = Self::default();
        for adapter in adapters {
            registry.register(adapter)?;
        }
        info!(count = registry.len(), "inline form adapters registered");
        Ok(registry)
    }

    pub fn register(&mut self, adapter: FormAdapter) -> DomainResult<()> {
        let kind = adapter.entity_kind();
        if self.adapters.contains_key(kind) {
            return Err(DomainError::conflict(format!(
                "adapter already registered for {kind}"
            )));
        }
        self.adapters.insert(kind, adapter);
        Ok(())
    }

    pub fn get(&self, entity_kind: &str) -> Option<&FormAdapter> {
        self.adapters.get(entity_kind)
    }

    /// Like [`Self::get`], failing with `NotFound` for unknown kinds.
    pub fn require(&self, entity_kind: &str) -> DomainResult<&FormAdapter> {
        self.get(entity_kind)
            .ok_or_else(|| DomainError::not_found(format!("inline form adapter for {entity_kind}")))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
