//! Quantity validation and total recomputation for line items.

use tracing::debug;

use lineform_core::Entity;

use crate::config::CapabilityFlags;
use crate::line_item::LineItem;
use crate::quantity::{self, Quantity, QuantityError};

/// Validates proposed quantities and recomputes line item totals.
///
/// The host calls [`Self::validate_quantity`] during its validate phase and,
/// only once validation passed, [`Self::recompute`] during submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineItemPricingRule {
    capabilities: CapabilityFlags,
}

impl LineItemPricingRule {
    pub fn new(capabilities: CapabilityFlags) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.capabilities
    }

    /// Parse and check a raw quantity input. Nothing is persisted.
    pub fn validate_quantity(
        &self,
        raw_input: &str,
        require_integer: bool,
    ) -> Result<Quantity, QuantityError> {
        quantity::validate_quantity(raw_input, require_integer)
    }

    /// Return `item` with the new quantity, label and recomputed total.
    ///
    /// - quantity is stored with two decimals;
    /// - product types take the product SKU as label, others the trimmed
    ///   `new_label`;
    /// - total is unit price times quantity in the unit price's currency, and
    ///   each unit price component is scaled the same way, order and metadata
    ///   kept.
    ///
    /// Without the product reference capability no type is a product type.
    pub fn recompute(
        &self,
        item: &LineItem,
        new_quantity: Quantity,
        new_label: &str,
        is_product_type: bool,
        product_sku: Option<&str>,
    ) -> LineItem {
        let mut updated = item.clone();
        updated.reprice(new_quantity);

        if is_product_type && self.capabilities.product_reference_enabled {
            updated.set_product_sku(product_sku.map(str::to_string));
            updated.set_label(product_sku.unwrap_or_default().to_string());
        } else {
            updated.set_label(new_label.trim().to_string());
        }

        debug!(
            line_item_id = %updated.id(),
            bundle = updated.bundle(),
            quantity = %updated.quantity(),
            total = updated.total().amount,
            currency = %updated.total().currency_code,
            "line item total recomputed"
        );

        updated
    }
}
