use std::fmt;

use serde_json::Value;

/// In-memory value of a property, tagged by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    /// Enum identifier as written on disk.
    Enum(String),
}

impl PropertyValue {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Decimal(_) => "decimal",
            PropertyValue::Enum(_) => "enum",
        }
    }

    /// Parses user input the way a text box would, guided by `like`.
    ///
    /// Returns `None` when `text` cannot be read as the same variant as `like`.
    pub fn parse_as(text: &str, like: &PropertyValue) -> Option<PropertyValue> {
        let text = text.trim();
        match like {
            PropertyValue::Bool(_) => match text.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Some(PropertyValue::Bool(true)),
                "false" | "off" | "no" | "0" => Some(PropertyValue::Bool(false)),
                _ => None,
            },
            PropertyValue::Integer(_) => text.parse().ok().map(PropertyValue::Integer),
            PropertyValue::Decimal(_) => text.parse().ok().map(PropertyValue::Decimal),
            PropertyValue::Enum(_) => Some(PropertyValue::Enum(text.to_string())),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Decimal(v) => write!(f, "{v}"),
            PropertyValue::Enum(v) => f.write_str(v),
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Bool(v) => Value::Bool(v),
            PropertyValue::Integer(v) => Value::from(v),
            PropertyValue::Decimal(v) => Value::from(v),
            PropertyValue::Enum(v) => Value::String(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_as_follows_variant() {
        let flag = PropertyValue::Bool(false);
        assert_eq!(
            PropertyValue::parse_as("On", &flag),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(PropertyValue::parse_as("maybe", &flag), None);

        let int = PropertyValue::Integer(0);
        assert_eq!(
            PropertyValue::parse_as(" 90 ", &int),
            Some(PropertyValue::Integer(90))
        );
        assert_eq!(PropertyValue::parse_as("9.5", &int), None);

        let dec = PropertyValue::Decimal(0.0);
        assert_eq!(
            PropertyValue::parse_as("1.25", &dec),
            Some(PropertyValue::Decimal(1.25))
        );
    }

    #[test]
    fn test_json_encoding() {
        assert_eq!(Value::from(PropertyValue::Bool(true)), Value::Bool(true));
        assert_eq!(Value::from(PropertyValue::Integer(-3)), serde_json::json!(-3));
        assert_eq!(
            Value::from(PropertyValue::Enum("pc".into())),
            serde_json::json!("pc")
        );
    }
}
