//! Money with an ordered price-component breakdown.
//!
//! Amounts are integers in the currency's smallest unit (e.g. cents), as
//! everywhere else in the domain. Scaling by a fractional quantity goes through
//! exact decimal arithmetic and rounds half away from zero to whole minor units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lineform_core::ValueObject;

use crate::quantity::Quantity;

/// Name of the component that absorbs differences when a price is rebased.
pub const BASE_PRICE_COMPONENT: &str = "base_price";

/// One entry of a price breakdown (base price, discount, tax, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComponent {
    pub name: String,
    /// Amount in smallest currency unit.
    pub amount: i64,
    pub currency_code: String,
    /// Whether the component is already included in the displayed amount.
    #[serde(default)]
    pub included: bool,
    /// Opaque host data, carried through untouched.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl PriceComponent {
    pub fn new(name: impl Into<String>, amount: i64, currency_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            currency_code: currency_code.into(),
            included: false,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn included(mut self) -> Self {
        self.included = true;
        self
    }
}

impl ValueObject for PriceComponent {}

/// A price: amount, currency and its component breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in smallest currency unit.
    pub amount: i64,
    /// ISO currency code (e.g., "USD", "EUR").
    pub currency_code: String,
    #[serde(default)]
    pub components: Vec<PriceComponent>,
}

impl ValueObject for Money {}

impl Money {
    pub fn new(amount: i64, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: PriceComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Sum of all component amounts.
    pub fn components_total(&self) -> i64 {
        self.components
            .iter()
            .fold(0i64, |acc, c| acc.saturating_add(c.amount))
    }

    /// `amount` equals the sum of the components (trivially true without components).
    pub fn is_balanced(&self) -> bool {
        self.components.is_empty() || self.components_total() == self.amount
    }

    /// Bring the breakdown back in line with `amount` and `currency_code`.
    ///
    /// Used after the amount was edited directly: the difference between the
    /// amount and the current breakdown is folded into the base price
    /// component (created if missing), and every component takes the price's
    /// currency.
    pub fn rebased(&self) -> Money {
        let mut rebased = self.clone();
        for component in &mut rebased.components {
            component.currency_code = rebased.currency_code.clone();
        }

        let difference = rebased.amount.saturating_sub(rebased.components_total());
        if difference == 0 && !rebased.components.is_empty() {
            return rebased;
        }

        match rebased
            .components
            .iter_mut()
            .find(|c| c.name == BASE_PRICE_COMPONENT)
        {
            Some(base) => base.amount = base.amount.saturating_add(difference),
            None => rebased.components.insert(
                0,
                PriceComponent::new(BASE_PRICE_COMPONENT, difference, rebased.currency_code.clone()),
            ),
        }
        rebased
    }

    /// Multiply the amount and every component by `quantity`.
    ///
    /// When the price is balanced, the rounding residual between the rounded
    /// total and the rounded components is absorbed by the last component so
    /// the result stays balanced.
    pub fn scaled(&self, quantity: Quantity) -> Money {
        let factor = quantity.value();
        let amount = scale_amount(self.amount, factor);

        let mut components: Vec<PriceComponent> = self
            .components
            .iter()
            .map(|c| PriceComponent {
                amount: scale_amount(c.amount, factor),
                ..c.clone()
            })
            .collect();

        if self.is_balanced() {
            let residual = amount.saturating_sub(
                components
                    .iter()
                    .fold(0i64, |acc, c| acc.saturating_add(c.amount)),
            );
            if let Some(last) = components.last_mut() {
                last.amount = last.amount.saturating_add(residual);
            }
        }

        Money {
            amount,
            currency_code: self.currency_code.clone(),
            components,
        }
    }
}

/// `amount * factor`, rounded half away from zero to whole minor units.
///
/// Saturates at the i64 bounds; such amounts are outside any real price.
fn scale_amount(amount: i64, factor: Decimal) -> i64 {
    let scaled = Decimal::from(amount)
        .saturating_mul(factor)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    scaled.to_i64().unwrap_or_else(|| {
        warn!(amount, %factor, "scaled amount out of range, saturating");
        if scaled.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}
