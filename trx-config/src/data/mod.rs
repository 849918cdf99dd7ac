//! Configuration data model.
//!
//! - [`value`] - Variant-tagged property values
//! - [`property`] - Individual settings and their change events
//! - [`category`] - Ordered property groups
//! - [`configuration`] - The aggregate loaded from and saved to disk

/// Variant-tagged property values.
pub mod value;

/// Individual settings, enforced overrides and change events.
pub mod property;

/// Named, ordered groups of properties.
pub mod category;

/// Configuration aggregate with dirty, default and read-only tracking.
pub mod configuration;

pub use category::Category;
pub use configuration::Configuration;
pub use property::{ChangedAspect, Property, PropertyChange, PropertyKind};
pub use value::PropertyValue;
