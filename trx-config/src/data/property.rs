use serde_json::Value;

use crate::{
    data::value::PropertyValue,
    error::MalformedValue,
    lang::TextLookup,
    schema::{DataType, PropertySpec, Schema},
    search,
};

/// Which aspect of a property a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangedAspect {
    /// The editable value.
    Value,
    /// The enforced override was set, replaced or cleared.
    EnforcedOverride,
    /// The derived `is_enabled` flag.
    IsEnabled,
}

/// Change notification emitted by every effective property mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    /// Field of the changed property.
    pub field: String,
    /// What changed.
    pub aspect: ChangedAspect,
}

impl PropertyChange {
    fn new(field: &str, aspect: ChangedAspect) -> Self {
        Self {
            field: field.to_string(),
            aspect,
        }
    }
}

/// Enum choices, selected identifier and default.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumProperty {
    /// Name of the enum in the schema.
    pub enum_key: String,
    /// Allowed identifiers, in display order.
    pub choices: Vec<String>,
    /// Selected identifier.
    pub value: String,
    /// Factory default identifier.
    pub default: String,
}

/// Value storage and type constraints of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Bool {
        value: bool,
        default: bool,
    },
    Integer {
        value: i64,
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
    Decimal {
        value: f64,
        default: f64,
        min: Option<f64>,
        max: Option<f64>,
        decimal_places: u32,
    },
    Enum(EnumProperty),
}

pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

fn clamp_opt<T: PartialOrd + Copy>(value: T, min: Option<T>, max: Option<T>) -> T {
    let mut value = value;
    if let Some(min) = min {
        if value < min {
            value = min;
        }
    }
    if let Some(max) = max {
        if value > max {
            value = max;
        }
    }
    value
}

impl PropertyKind {
    fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Bool { default } => PropertyKind::Bool {
                value: *default,
                default: *default,
            },
            DataType::Integer { default, min, max } => PropertyKind::Integer {
                value: *default,
                default: *default,
                min: *min,
                max: *max,
            },
            DataType::Decimal {
                default,
                min,
                max,
                decimal_places,
            } => PropertyKind::Decimal {
                value: *default,
                default: *default,
                min: *min,
                max: *max,
                decimal_places: *decimal_places,
            },
            DataType::Enum { default, enum_key } => PropertyKind::Enum(EnumProperty {
                enum_key: enum_key.clone(),
                choices: Vec::new(),
                value: default.clone(),
                default: default.clone(),
            }),
        }
    }

    /// Current editable value.
    pub fn value(&self) -> PropertyValue {
        match self {
            PropertyKind::Bool { value, .. } => PropertyValue::Bool(*value),
            PropertyKind::Integer { value, .. } => PropertyValue::Integer(*value),
            PropertyKind::Decimal { value, .. } => PropertyValue::Decimal(*value),
            PropertyKind::Enum(e) => PropertyValue::Enum(e.value.clone()),
        }
    }

    /// Factory default.
    pub fn default_value(&self) -> PropertyValue {
        match self {
            PropertyKind::Bool { default, .. } => PropertyValue::Bool(*default),
            PropertyKind::Integer { default, .. } => PropertyValue::Integer(*default),
            PropertyKind::Decimal { default, .. } => PropertyValue::Decimal(*default),
            PropertyKind::Enum(e) => PropertyValue::Enum(e.default.clone()),
        }
    }

    /// Checks `value` against this variant, clamping numbers into range.
    fn coerce(&self, value: PropertyValue, field: &str) -> Result<PropertyValue, MalformedValue> {
        let mut checked = self.clone();
        checked.store(value, field)?;
        Ok(checked.value())
    }

    /// Checks `value` and stores it. Returns whether the stored value changed.
    fn store(&mut self, new: PropertyValue, field: &str) -> Result<bool, MalformedValue> {
        let mismatch = |expected: String, actual: String| MalformedValue {
            field: field.to_string(),
            expected,
            actual,
        };
        match (self, new) {
            (PropertyKind::Bool { value, .. }, PropertyValue::Bool(v)) => Ok(replace(value, v)),
            (PropertyKind::Integer { value, min, max, .. }, PropertyValue::Integer(v)) => {
                Ok(replace(value, clamp_opt(v, *min, *max)))
            }
            (
                PropertyKind::Decimal {
                    value,
                    min,
                    max,
                    decimal_places,
                    ..
                },
                PropertyValue::Decimal(v),
            ) => {
                if !v.is_finite() {
                    return Err(mismatch("finite number".into(), v.to_string()));
                }
                Ok(replace(
                    value,
                    round_to(clamp_opt(v, *min, *max), *decimal_places),
                ))
            }
            (PropertyKind::Enum(e), PropertyValue::Enum(v)) => {
                if !e.choices.contains(&v) {
                    return Err(mismatch(format!("one of: {:?}", e.choices), v));
                }
                Ok(replace(&mut e.value, v))
            }
            (kind, v) => Err(mismatch(
                kind.default_value().type_name().to_string(),
                format!("{} {v}", v.type_name()),
            )),
        }
    }

    /// Copies the default into the value. Returns whether the value changed.
    fn reset(&mut self) -> bool {
        match self {
            PropertyKind::Bool { value, default } => replace(value, *default),
            PropertyKind::Integer { value, default, .. } => replace(value, *default),
            PropertyKind::Decimal { value, default, .. } => replace(value, *default),
            PropertyKind::Enum(e) => replace(&mut e.value, e.default.clone()),
        }
    }

    /// Brings a numeric default inside its own bounds and precision.
    fn sanitize_default(&mut self, field: &str) {
        match self {
            PropertyKind::Integer {
                default, min, max, ..
            } => {
                let fixed = clamp_opt(*default, *min, *max);
                if fixed != *default {
                    warn!("{field}: default {default} is out of range, using {fixed}");
                    *default = fixed;
                }
            }
            PropertyKind::Decimal {
                default,
                min,
                max,
                decimal_places,
                ..
            } => {
                let fixed = round_to(clamp_opt(*default, *min, *max), *decimal_places);
                if fixed != *default {
                    warn!("{field}: default {default} is out of range or too precise, using {fixed}");
                    *default = fixed;
                }
            }
            PropertyKind::Bool { .. } | PropertyKind::Enum(_) => {}
        }
    }

    /// Parses an on-disk JSON value as this variant, without range checks.
    fn parse_raw(&self, raw: &Value, field: &str) -> Result<PropertyValue, MalformedValue> {
        let mismatch = |expected: &str| MalformedValue {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: raw.to_string(),
        };
        let value = match self {
            PropertyKind::Bool { .. } => raw
                .as_bool()
                .map(PropertyValue::Bool)
                .ok_or_else(|| mismatch("boolean"))?,
            PropertyKind::Integer { .. } => raw
                .as_i64()
                .map(PropertyValue::Integer)
                .ok_or_else(|| mismatch("integer"))?,
            PropertyKind::Decimal { .. } => raw
                .as_f64()
                .map(PropertyValue::Decimal)
                .ok_or_else(|| mismatch("number"))?,
            PropertyKind::Enum(_) => raw
                .as_str()
                .map(|s| PropertyValue::Enum(s.to_string()))
                .ok_or_else(|| mismatch("string"))?,
        };
        Ok(value)
    }
}

fn replace<T: PartialEq>(slot: &mut T, new: T) -> bool {
    if *slot == new {
        return false;
    }
    *slot = new;
    true
}

/// One editable setting.
#[derive(Debug, Clone)]
pub struct Property {
    field: String,
    title: String,
    description: String,
    search_text: String,
    kind: PropertyKind,
    enforced: Option<PropertyValue>,
}

impl Property {
    /// Creates a property from its specification. Call [`Property::initialise`]
    /// before use.
    pub fn new(spec: &PropertySpec, lang: &dyn TextLookup) -> Self {
        let text = lang.lookup_or_key(&spec.field);
        let search_text = search::normalize(&format!("{} {}", text.title, text.description));
        Self {
            field: spec.field.clone(),
            title: text.title,
            description: text.description,
            search_text,
            kind: PropertyKind::from_data_type(&spec.data_type),
            enforced: None,
        }
    }

    /// Seeds the property from its schema and resets it to default.
    ///
    /// Enum properties pick up their choice list here; a default that is not
    /// one of the choices falls back to the first choice. Numeric defaults are
    /// clamped and rounded like any other value.
    pub fn initialise(&mut self, schema: &Schema) {
        if let PropertyKind::Enum(e) = &mut self.kind {
            e.choices = schema
                .enum_choices(&e.enum_key)
                .map(<[String]>::to_vec)
                .unwrap_or_default();
            if !e.choices.contains(&e.default) {
                if let Some(first) = e.choices.first() {
                    warn!(
                        "{}: default `{}` is not a member of `{}`, using `{first}`",
                        self.field, e.default, e.enum_key
                    );
                    e.default = first.clone();
                }
            }
        }
        self.kind.sanitize_default(&self.field);
        self.set_to_default();
    }

    /// Stable unique identifier.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Display description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Normalized title and description, computed once at construction.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Variant storage.
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Underlying editable value.
    pub fn value(&self) -> PropertyValue {
        self.kind.value()
    }

    /// Factory default of this property.
    pub fn default_value(&self) -> PropertyValue {
        self.kind.default_value()
    }

    /// The value the game sees: the override when enforced, otherwise the value.
    pub fn effective_value(&self) -> PropertyValue {
        self.enforced.clone().unwrap_or_else(|| self.kind.value())
    }

    /// Whether the user may edit this property.
    pub fn is_enabled(&self) -> bool {
        self.enforced.is_none()
    }

    /// Whether the underlying value equals the factory default.
    pub fn is_default(&self) -> bool {
        self.kind.value() == self.kind.default_value()
    }

    /// The enforced override, if any.
    pub fn enforced_override(&self) -> Option<&PropertyValue> {
        self.enforced.as_ref()
    }

    /// On-disk encoding of the underlying value. Overrides are never exported.
    pub fn export_value(&self) -> Value {
        self.kind.value().into()
    }

    /// Replaces the value with the decoded on-disk representation.
    pub fn load_value(&mut self, raw: &Value) -> Result<(), MalformedValue> {
        let value = self.kind.parse_raw(raw, &self.field)?;
        self.kind.store(value, &self.field)?;
        Ok(())
    }

    /// Decodes a raw value without storing it.
    pub fn decode_value(&self, raw: &Value) -> Result<PropertyValue, MalformedValue> {
        let value = self.kind.parse_raw(raw, &self.field)?;
        self.kind.coerce(value, &self.field)
    }

    /// Sets the underlying value, clamping numbers into range.
    ///
    /// Returns the change event, or `None` when the value did not change.
    pub fn set_value(&mut self, value: PropertyValue) -> Result<Option<PropertyChange>, MalformedValue> {
        if !self.kind.store(value, &self.field)? {
            return Ok(None);
        }
        Ok(Some(PropertyChange::new(&self.field, ChangedAspect::Value)))
    }

    /// Resets the value to the factory default.
    pub fn set_to_default(&mut self) -> Option<PropertyChange> {
        self.kind
            .reset()
            .then(|| PropertyChange::new(&self.field, ChangedAspect::Value))
    }

    /// Sets or clears the enforced override.
    ///
    /// The override is checked and clamped like a value. Emits override and
    /// enabled-state events only when the override actually changes.
    pub fn set_enforced_override(
        &mut self,
        value: Option<PropertyValue>,
    ) -> Result<Vec<PropertyChange>, MalformedValue> {
        let value = value
            .map(|v| self.kind.coerce(v, &self.field))
            .transpose()?;
        if self.enforced == value {
            return Ok(Vec::new());
        }
        let was_enabled = self.is_enabled();
        self.enforced = value;
        let mut changes = vec![PropertyChange::new(
            &self.field,
            ChangedAspect::EnforcedOverride,
        )];
        if was_enabled != self.is_enabled() {
            changes.push(PropertyChange::new(&self.field, ChangedAspect::IsEnabled));
        }
        Ok(changes)
    }
}
