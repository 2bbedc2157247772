//! The line item entity: an order line with its quantity, unit price, total
//! and the extra host fields attached to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lineform_core::{Entity, LineItemId, OrderId};

use crate::money::Money;
use crate::quantity::Quantity;

/// Entity kind under which line items are embedded in an order form.
pub const LINE_ITEM_ENTITY_KIND: &str = "commerce_line_item";

/// Line item attached to an order.
///
/// Created by order management when a line is added to an order and deleted
/// together with its order. Quantity, label and total only change through
/// [`crate::LineItemPricingRule::recompute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    order_id: Option<OrderId>,
    /// Line item type (bundle), e.g. `product` or `shipping`.
    bundle: String,
    label: String,
    quantity: Quantity,
    unit_price: Money,
    total: Money,
    product_sku: Option<String>,
    /// Additional host fields attached to the bundle.
    #[serde(default)]
    fields: BTreeMap<String, serde_json::Value>,
}

impl LineItem {
    /// A line of quantity one whose total equals its unit price.
    pub fn new(id: LineItemId, bundle: impl Into<String>, unit_price: Money) -> Self {
        let quantity = Quantity::one();
        let total = unit_price.scaled(quantity);
        Self {
            id,
            order_id: None,
            bundle: bundle.into(),
            label: String::new(),
            quantity,
            unit_price,
            total,
            product_sku: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_product_sku(mut self, sku: impl Into<String>) -> Self {
        self.product_sku = Some(sku.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> &Money {
        &self.unit_price
    }

    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn product_sku(&self) -> Option<&str> {
        self.product_sku.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_product_sku(&mut self, sku: Option<String>) {
        self.product_sku = sku;
    }

    pub(crate) fn set_unit_price(&mut self, unit_price: Money) {
        self.unit_price = unit_price;
    }

    pub(crate) fn set_field(&mut self, name: String, value: serde_json::Value) {
        self.fields.insert(name, value);
    }

    /// Set the quantity and recompute the total from the unit price.
    pub(crate) fn reprice(&mut self, quantity: Quantity) {
        self.quantity = quantity.normalized();
        self.total = self.unit_price.scaled(self.quantity);
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
