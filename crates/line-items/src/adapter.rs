//! Inline entity form adapters: the seam between the host form pipeline and
//! the entity kinds it can embed.

use serde::{Deserialize, Serialize};

/// How a summary table column is read from the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    /// Plain entity property.
    Property,
    /// Attached field, rendered through a formatter.
    Field,
}

/// Column of the read-only summary table listing embedded entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    pub key: String,
    pub display_type: DisplayType,
    pub label: String,
    pub weight: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
}

impl TableField {
    pub fn property(key: impl Into<String>, label: impl Into<String>, weight: i32) -> Self {
        Self {
            key: key.into(),
            display_type: DisplayType::Property,
            label: label.into(),
            weight,
            formatter: None,
        }
    }

    pub fn field(
        key: impl Into<String>,
        label: impl Into<String>,
        formatter: impl Into<String>,
        weight: i32,
    ) -> Self {
        Self {
            key: key.into(),
            display_type: DisplayType::Field,
            label: label.into(),
            weight,
            formatter: Some(formatter.into()),
        }
    }
}

/// How autocomplete matches existing entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOperator {
    Contains,
    StartsWith,
}

/// Widget settings of an inline entity form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineFormSettings {
    /// Allow referencing existing entities instead of only creating new ones.
    pub allow_existing: bool,
    pub match_operator: MatchOperator,
    /// Delete referenced entities together with the referencing entity.
    pub delete_references: bool,
    pub override_labels: bool,
    pub label_singular: String,
    pub label_plural: String,
}

impl Default for InlineFormSettings {
    fn default() -> Self {
        Self {
            allow_existing: false,
            match_operator: MatchOperator::Contains,
            delete_references: false,
            override_labels: false,
            label_singular: String::new(),
            label_plural: String::new(),
        }
    }
}

pub const SETTING_ALLOW_EXISTING: &str = "allow_existing";
pub const SETTING_MATCH_OPERATOR: &str = "match_operator";
pub const SETTING_DELETE_REFERENCES: &str = "delete_references";
pub const SETTING_OVERRIDE_LABELS: &str = "override_labels";

/// One option of the settings form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOption {
    pub key: String,
    pub title: String,
    /// Current value, rendered as text.
    pub value: String,
    /// Whether the site builder may change this option.
    pub access: bool,
}

/// The widget settings form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsForm {
    pub options: Vec<SettingsOption>,
}

impl SettingsForm {
    /// Generic form: every option of `settings` is editable.
    pub fn from_settings(settings: &InlineFormSettings) -> Self {
        let option = |key: &str, title: &str, value: String| SettingsOption {
            key: key.to_string(),
            title: title.to_string(),
            value,
            access: true,
        };
        let match_operator = match settings.match_operator {
            MatchOperator::Contains => "CONTAINS",
            MatchOperator::StartsWith => "STARTS_WITH",
        };

        Self {
            options: vec![
                option(
                    SETTING_ALLOW_EXISTING,
                    "Allow users to add existing entities",
                    settings.allow_existing.to_string(),
                ),
                option(
                    SETTING_MATCH_OPERATOR,
                    "Autocomplete matching",
                    match_operator.to_string(),
                ),
                option(
                    SETTING_DELETE_REFERENCES,
                    "Delete referenced entities when the parent entity is deleted",
                    settings.delete_references.to_string(),
                ),
                option(
                    SETTING_OVERRIDE_LABELS,
                    "Override labels",
                    settings.override_labels.to_string(),
                ),
            ],
        }
    }

    pub fn option(&self, key: &str) -> Option<&SettingsOption> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Hide an option from the site builder.
    pub fn deny(&mut self, key: &str) {
        if let Some(option) = self.options.iter_mut().find(|o| o.key == key) {
            option.access = false;
        }
    }
}

/// Operations every embeddable entity kind provides to the host pipeline.
///
/// Kind-specific form building, validation and submission live on the
/// concrete adapters, reached through [`crate::FormAdapter`].
pub trait EntityFormAdapter: Send + Sync {
    /// Entity kind the adapter handles (e.g. `commerce_line_item`).
    fn entity_kind(&self) -> &'static str;

    /// Summary table columns, sorted by weight.
    fn table_fields(&self, bundles: &[String]) -> Vec<TableField>;

    fn default_settings(&self) -> InlineFormSettings {
        InlineFormSettings::default()
    }

    fn settings_form(&self, settings: &InlineFormSettings) -> SettingsForm {
        SettingsForm::from_settings(settings)
    }
}
