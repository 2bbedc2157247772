//! Line items embedded in an order form.
//!
//! Pure domain logic for the line-item sub-form of an order: quantity
//! validation, total recomputation, and the inline form adapter the host form
//! pipeline calls during its build, validate and submit phases. No IO, no
//! rendering, no storage.

pub mod adapter;
pub mod config;
pub mod form;
pub mod line_item;
pub mod line_item_form;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod registry;

pub use adapter::{DisplayType, EntityFormAdapter, InlineFormSettings, MatchOperator, SettingsForm, TableField};
pub use config::{CapabilityFlags, LineItemConfig};
pub use form::{BundleInfo, EntityForm, FieldError, FieldInstance, FormContext, FormElement, FormErrors, OrderStatus};
pub use line_item::{LINE_ITEM_ENTITY_KIND, LineItem};
pub use line_item_form::{LineItemFormAdapter, LineItemSubmission, UnitPriceEdit};
pub use money::{Money, PriceComponent};
pub use pricing::LineItemPricingRule;
pub use quantity::{Quantity, QuantityDatatype, QuantityError, validate_quantity};
pub use registry::{AdapterRegistry, FormAdapter};
