//! Inline form adapter for line items embedded in an order form.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use lineform_core::Entity;

use crate::adapter::{
    EntityFormAdapter, InlineFormSettings, SETTING_ALLOW_EXISTING, SETTING_MATCH_OPERATOR,
    SettingsForm, TableField,
};
use crate::config::LineItemConfig;
use crate::form::{
    ElementKind, EntityForm, FormContext, FormElement, FormErrors, value_as_text,
};
use crate::line_item::{LINE_ITEM_ENTITY_KIND, LineItem};
use crate::pricing::LineItemPricingRule;
use crate::quantity::{Quantity, QuantityDatatype};

pub const DETAILS_FIELDSET: &str = "line_item_details";
pub const LABEL_KEY: &str = "line_item_label";
pub const QUANTITY_KEY: &str = "quantity";
pub const UNIT_PRICE_FIELD: &str = "commerce_unit_price";
pub const TOTAL_FIELD: &str = "commerce_total";
pub const PRODUCT_FIELD: &str = "commerce_product";
pub const DISPLAY_PATH_FIELD: &str = "commerce_display_path";

pub const PRICE_FORMATTER: &str = "commerce_price_formatted_amount";
pub const LABEL_MAX_LENGTH: u32 = 128;
pub const LABEL_REQUIRED_MESSAGE: &str = "Line item label field is required.";

const AMOUNT_COLUMN: &str = "amount";
const CURRENCY_COLUMN: &str = "currency_code";
const QUANTITY_SIZE: u32 = 4;
const PRODUCT_WEIGHT: i32 = -100;

/// Unit price as edited in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPriceEdit {
    pub amount: i64,
    pub currency_code: Option<String>,
}

/// Values of a sub-form that passed validation, ready for submit.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemSubmission {
    pub quantity: Quantity,
    pub label: String,
    pub unit_price: Option<UnitPriceEdit>,
    /// Submitted values of the other attached fields.
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Adapter for `commerce_line_item` sub-forms.
#[derive(Debug, Clone, Default)]
pub struct LineItemFormAdapter {
    config: LineItemConfig,
    rule: LineItemPricingRule,
}

impl LineItemFormAdapter {
    pub fn new(config: LineItemConfig) -> Self {
        let rule = LineItemPricingRule::new(config.capabilities);
        Self { config, rule }
    }

    pub fn config(&self) -> &LineItemConfig {
        &self.config
    }

    pub fn pricing_rule(&self) -> &LineItemPricingRule {
        &self.rule
    }

    /// Describe the sub-form for `item`.
    pub fn entity_form(&self, item: &LineItem, ctx: &FormContext) -> EntityForm {
        let mut form = EntityForm::new(ctx.parents.clone());
        let datatype = self.config.quantity_datatype(item.bundle());
        let label_weight = ctx.bundle.label_weight;

        let mut details = FormElement::fieldset("Line item details");
        details.classes = vec![
            "ief-line_item-details".to_string(),
            "ief-entity-fieldset".to_string(),
        ];
        form.insert(DETAILS_FIELDSET, details);

        let mut label = FormElement::textfield("Line item label", LABEL_MAX_LENGTH);
        label.description = Some("Supply the line item label to be used for this line item.".to_string());
        label.default_value = Some(item.label().to_string());
        label.required = true;
        label.weight = label_weight;
        label.fieldset = Some(DETAILS_FIELDSET.to_string());
        form.insert(LABEL_KEY, label);

        let quantity_text = item.quantity().to_string();
        let mut quantity = FormElement::new(
            ElementKind::Textfield {
                datatype: Some(datatype),
                size: Some(QUANTITY_SIZE),
                max_length: QUANTITY_SIZE.max(quantity_text.len() as u32),
            },
            "Quantity",
        );
        quantity.description = Some("The quantity of line items.".to_string());
        quantity.default_value = Some(match datatype {
            QuantityDatatype::Integer => item.quantity().whole_units().to_string(),
            QuantityDatatype::Decimal => quantity_text,
        });
        quantity.required = true;
        quantity.weight = label_weight;
        quantity.fieldset = Some(DETAILS_FIELDSET.to_string());
        form.insert(QUANTITY_KEY, quantity);

        for instance in &ctx.bundle.field_instances {
            let mut element = FormElement::new(ElementKind::Field, instance.label.clone());
            element.weight = instance.weight;
            element.fieldset = Some(DETAILS_FIELDSET.to_string());
            element.default_value = item.field(&instance.field_name).and_then(value_as_text);
            for column in &instance.columns {
                let mut child = FormElement::new(ElementKind::Field, column.clone());
                child.default_value = column_default(item, &instance.field_name, column);
                element.children.insert(column.clone(), child);
            }
            form.insert(instance.field_name.clone(), element);
        }

        if ctx.order_status.is_some_and(|s| s.is_cart()) {
            if let Some(price) = form.get_mut(UNIT_PRICE_FIELD) {
                for column in [AMOUNT_COLUMN, CURRENCY_COLUMN] {
                    if let Some(child) = price.children.get_mut(column) {
                        child.disabled = true;
                    }
                }
            }
        }

        if self.config.is_product_type(item.bundle()) {
            for key in [LABEL_KEY, DISPLAY_PATH_FIELD] {
                if let Some(element) = form.get_mut(key) {
                    element.access = false;
                }
            }
            if let Some(product) = form.get_mut(PRODUCT_FIELD) {
                product.weight = PRODUCT_WEIGHT;
            }
        }

        form
    }

    /// Validate submitted values. Any error blocks the submission.
    pub fn validate(
        &self,
        form: &EntityForm,
        submitted: &serde_json::Value,
    ) -> Result<LineItemSubmission, FormErrors> {
        let mut errors = FormErrors::new();
        let values = form.values(submitted).unwrap_or(&serde_json::Value::Null);

        let raw_quantity = values
            .get(QUANTITY_KEY)
            .and_then(value_as_text)
            .unwrap_or_default();
        let require_integer = matches!(
            form.get(QUANTITY_KEY).and_then(FormElement::datatype),
            Some(QuantityDatatype::Integer)
        );
        let quantity = match self.rule.validate_quantity(&raw_quantity, require_integer) {
            Ok(q) => Some(q),
            Err(err) => {
                let path = form.field_path(QUANTITY_KEY);
                warn!(%path, raw = %raw_quantity, error = ?err, "quantity rejected");
                errors.push(path, err.to_string());
                None
            }
        };

        let unit_price = self.read_unit_price(form, values, &mut errors);

        let label = values
            .get(LABEL_KEY)
            .and_then(value_as_text)
            .unwrap_or_default();
        let label_required = form.get(LABEL_KEY).is_some_and(|e| e.access && e.required);
        if label_required && label.trim().is_empty() {
            errors.push(form.field_path(LABEL_KEY), LABEL_REQUIRED_MESSAGE);
        }

        let fields = form
            .elements
            .iter()
            .filter(|(key, e)| {
                e.kind == ElementKind::Field
                    && e.access
                    && key.as_str() != UNIT_PRICE_FIELD
                    && key.as_str() != TOTAL_FIELD
            })
            .filter_map(|(key, _)| values.get(key.as_str()).map(|v| (key.clone(), v.clone())))
            .collect();

        match quantity {
            Some(quantity) if errors.is_empty() => Ok(LineItemSubmission {
                quantity,
                label,
                unit_price,
                fields,
            }),
            _ => Err(errors),
        }
    }

    /// Apply a validated submission to `item`.
    ///
    /// Attached field values and unit price edits are copied first, the unit
    /// price breakdown is rebased, then quantity, label and total are
    /// recomputed. `product_sku` is the SKU of the referenced product, when
    /// the host resolved one; the item's current SKU is used otherwise.
    pub fn submit(
        &self,
        item: &LineItem,
        submission: &LineItemSubmission,
        product_sku: Option<&str>,
    ) -> LineItem {
        let mut staged = item.clone();
        for (name, value) in &submission.fields {
            staged.set_field(name.clone(), value.clone());
        }

        let mut unit_price = staged.unit_price().clone();
        if let Some(edit) = &submission.unit_price {
            unit_price.amount = edit.amount;
            if let Some(currency) = &edit.currency_code {
                unit_price.currency_code = currency.clone();
            }
        }
        staged.set_unit_price(unit_price.rebased());

        let is_product_type = self.config.is_product_type(item.bundle());
        let sku = product_sku
            .map(str::to_string)
            .or_else(|| item.product_sku().map(str::to_string));

        debug!(
            line_item_id = %item.id(),
            is_product_type,
            unit_price_edited = submission.unit_price.is_some(),
            "submitting line item sub-form"
        );

        self.rule.recompute(
            &staged,
            submission.quantity,
            &submission.label,
            is_product_type,
            sku.as_deref(),
        )
    }

    /// Unit price edit, when the price widget is shown and enabled.
    fn read_unit_price(
        &self,
        form: &EntityForm,
        values: &serde_json::Value,
        errors: &mut FormErrors,
    ) -> Option<UnitPriceEdit> {
        let element = form.get(UNIT_PRICE_FIELD).filter(|e| e.access)?;
        let editable = |column: &str| element.children.get(column).is_some_and(|c| !c.disabled);
        let submitted = values.get(UNIT_PRICE_FIELD)?;

        if !editable(AMOUNT_COLUMN) {
            return None;
        }
        let raw_amount = submitted.get(AMOUNT_COLUMN).and_then(value_as_text)?;
        let amount = match raw_amount.trim().parse::<i64>() {
            Ok(amount) => amount,
            Err(_) => {
                let path = format!("{}][{}", form.field_path(UNIT_PRICE_FIELD), AMOUNT_COLUMN);
                warn!(%path, raw = %raw_amount, "unit price amount rejected");
                errors.push(path, "The unit price amount must be a whole number of minor units.");
                return None;
            }
        };

        let currency_code = editable(CURRENCY_COLUMN)
            .then(|| submitted.get(CURRENCY_COLUMN).and_then(value_as_text))
            .flatten()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Some(UnitPriceEdit {
            amount,
            currency_code,
        })
    }
}

fn column_default(item: &LineItem, field_name: &str, column: &str) -> Option<String> {
    let price = match field_name {
        UNIT_PRICE_FIELD => item.unit_price(),
        TOTAL_FIELD => item.total(),
        _ => {
            return item
                .field(field_name)
                .and_then(|v| v.get(column))
                .and_then(value_as_text);
        }
    };
    match column {
        AMOUNT_COLUMN => Some(price.amount.to_string()),
        CURRENCY_COLUMN => Some(price.currency_code.clone()),
        _ => None,
    }
}

impl EntityFormAdapter for LineItemFormAdapter {
    fn entity_kind(&self) -> &'static str {
        LINE_ITEM_ENTITY_KIND
    }

    fn table_fields(&self, _bundles: &[String]) -> Vec<TableField> {
        vec![
            TableField::property(LABEL_KEY, "Label", 1),
            TableField::field(UNIT_PRICE_FIELD, "Unit price", PRICE_FORMATTER, 2),
            TableField::property(QUANTITY_KEY, "Quantity", 3),
            TableField::field(TOTAL_FIELD, "Total", PRICE_FORMATTER, 4),
        ]
    }

    /// Line items are never managed alone: they go when their order goes.
    fn default_settings(&self) -> InlineFormSettings {
        InlineFormSettings {
            delete_references: true,
            ..InlineFormSettings::default()
        }
    }

    /// Adding existing line items is not supported.
    fn settings_form(&self, settings: &InlineFormSettings) -> SettingsForm {
        let mut form = SettingsForm::from_settings(settings);
        form.deny(SETTING_ALLOW_EXISTING);
        form.deny(SETTING_MATCH_OPERATOR);
        form
    }
}
