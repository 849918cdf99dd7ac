//! Named schemas describing which properties a configuration carries.
//!
//! A schema lists categories in display order, each with its properties and
//! their type tag, plus the ordered identifier lists of every enum the
//! properties refer to.
//!
//! ```toml
//! [enums]
//! ui_style = ["ps1", "pc"]
//!
//! [[categories]]
//! title = "ui"
//! image = "ui.jpg"
//!
//! [[categories.properties]]
//! field = "menu_style"
//! data_type = "enum"
//! enum_key = "ui_style"
//! default = "pc"
//! ```

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::Arc,
};

use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    data::property::round_to,
    error::{ConfigError, Result},
};

/// Parses `content` as TOML or JSON depending on the extension of `path`.
pub(crate) fn parse_by_extension<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let parsed = match ext {
        "toml" => toml::from_str(content).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
        "json5" => json5::from_str(content).map_err(|e| e.to_string()),
        _ => {
            return Err(ConfigError::Schema(format!(
                "unsupported file extension {ext:?}: {}",
                path.display()
            )));
        }
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Type tag and constraints of one property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum DataType {
    /// On/off switch.
    Bool { default: bool },
    /// Whole number, optionally bounded.
    Integer {
        default: i64,
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    /// Fractional number, optionally bounded, exported with fixed precision.
    Decimal {
        default: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default = "default_decimal_places")]
        decimal_places: u32,
    },
    /// One identifier out of the enum named by `enum_key`.
    Enum { default: String, enum_key: String },
}

fn default_decimal_places() -> u32 {
    2
}

/// Specification of one property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertySpec {
    /// Unique field key, used on disk and for text lookup.
    pub field: String,
    /// Variant selector.
    #[serde(flatten)]
    pub data_type: DataType,
}

/// Specification of one category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategorySpec {
    /// Language key of the category title.
    pub title: String,
    /// Logical image identifier.
    #[serde(default)]
    pub image: Option<String>,
    /// Properties in display order.
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

/// A complete schema.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Schema {
    /// Categories in display order.
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
    /// Enum name to ordered identifiers.
    #[serde(default)]
    pub enums: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Loads and validates a schema file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io(path, e))?;
        let schema: Schema = parse_by_extension(path, &content)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Checks field uniqueness, enum references, numeric bounds and that
    /// every numeric default lies within its bounds and precision.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in self.properties() {
            if !seen.insert(spec.field.as_str()) {
                return Err(ConfigError::Schema(format!(
                    "duplicate field `{}`",
                    spec.field
                )));
            }
            match &spec.data_type {
                DataType::Integer {
                    min: Some(min),
                    max: Some(max),
                    ..
                } if min > max => {
                    return Err(ConfigError::Schema(format!(
                        "`{}`: min {min} exceeds max {max}",
                        spec.field
                    )));
                }
                DataType::Decimal {
                    min: Some(min),
                    max: Some(max),
                    ..
                } if min > max => {
                    return Err(ConfigError::Schema(format!(
                        "`{}`: min {min} exceeds max {max}",
                        spec.field
                    )));
                }
                DataType::Integer { default, min, max } if out_of(*default, *min, *max) => {
                    return Err(ConfigError::Schema(format!(
                        "`{}`: default {default} is outside its bounds",
                        spec.field
                    )));
                }
                DataType::Decimal {
                    default,
                    min,
                    max,
                    decimal_places,
                } => {
                    if out_of(*default, *min, *max) {
                        return Err(ConfigError::Schema(format!(
                            "`{}`: default {default} is outside its bounds",
                            spec.field
                        )));
                    }
                    if round_to(*default, *decimal_places) != *default {
                        return Err(ConfigError::Schema(format!(
                            "`{}`: default {default} has more than {decimal_places} decimal places",
                            spec.field
                        )));
                    }
                }
                DataType::Enum { enum_key, .. } => match self.enums.get(enum_key) {
                    Some(choices) if !choices.is_empty() => {}
                    _ => {
                        return Err(ConfigError::Schema(format!(
                            "`{}`: enum `{enum_key}` is undefined or empty",
                            spec.field
                        )));
                    }
                },
                _ => {}
            }
        }
        Ok(())
    }

    /// All property specifications, in category order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.categories.iter().flat_map(|c| c.properties.iter())
    }

    /// Ordered identifiers of the enum named `key`.
    pub fn enum_choices(&self, key: &str) -> Option<&[String]> {
        self.enums.get(key).map(Vec::as_slice)
    }
}

fn out_of<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.is_some_and(|min| value < min) || max.is_some_and(|max| value > max)
}

/// Schemas addressable by name, e.g. `tr1` or `tr2`.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `.toml`/`.json` file of `dir`, named after its file stem.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();
        let entries = fs::read_dir(dir).map_err(|e| ConfigError::from_io(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| ConfigError::from_io(dir, e))?.path();
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
            if !matches!(ext, "toml" | "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let schema = Schema::load(&path)?;
            info!("registered schema `{name}` from {}", path.display());
            registry.insert(name, schema);
        }
        Ok(registry)
    }

    /// Registers `schema` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), Arc::new(schema));
    }

    /// Resolves a schema id.
    pub fn get(&self, name: &str) -> Result<Arc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownSchema(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"
[enums]
ui_style = ["ps1", "pc"]

[[categories]]
title = "visuals"
image = "visuals.jpg"

[[categories.properties]]
field = "brightness"
data_type = "decimal"
default = 1.0
min = 0.1
max = 2.0
decimal_places = 1

[[categories.properties]]
field = "enable_braid"
data_type = "bool"
default = false

[[categories]]
title = "ui"

[[categories.properties]]
field = "fov_value"
data_type = "integer"
default = 65
min = 30
max = 150

[[categories.properties]]
field = "menu_style"
data_type = "enum"
enum_key = "ui_style"
default = "pc"
"#;

    pub(crate) fn sample() -> Schema {
        let schema: Schema = toml::from_str(SAMPLE).unwrap();
        schema.validate().unwrap();
        schema
    }

    #[test]
    fn test_parse_sample() {
        let schema = sample();
        assert_eq!(schema.categories.len(), 2);
        assert_eq!(schema.categories[1].image, None);
        let fields: Vec<_> = schema.properties().map(|p| p.field.as_str()).collect();
        assert_eq!(
            fields,
            ["brightness", "enable_braid", "fov_value", "menu_style"]
        );
        assert_eq!(
            schema.categories[0].properties[0].data_type,
            DataType::Decimal {
                default: 1.0,
                min: Some(0.1),
                max: Some(2.0),
                decimal_places: 1,
            }
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut schema = sample();
        let dup = schema.categories[0].properties[1].clone();
        schema.categories[1].properties.push(dup);
        assert!(matches!(schema.validate(), Err(ConfigError::Schema(_))));
    }

    #[test]
    fn test_missing_enum_rejected() {
        let mut schema = sample();
        schema.enums.clear();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_invalid_numeric_defaults_rejected() {
        let mut schema = sample();
        if let DataType::Integer { default, .. } = &mut schema.categories[1].properties[0].data_type
        {
            *default = 200;
        }
        assert!(matches!(schema.validate(), Err(ConfigError::Schema(_))));

        let mut schema = sample();
        if let DataType::Decimal { default, .. } = &mut schema.categories[0].properties[0].data_type
        {
            *default = 0.05;
        }
        assert!(matches!(schema.validate(), Err(ConfigError::Schema(_))));

        let mut schema = sample();
        if let DataType::Decimal { default, .. } = &mut schema.categories[0].properties[0].data_type
        {
            *default = 1.25;
        }
        assert!(matches!(schema.validate(), Err(ConfigError::Schema(_))));
    }

    #[test]
    fn test_bundled_schema_has_text_for_every_field() {
        use crate::lang::{LanguageTable, TextLookup};

        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources");
        let registry = SchemaRegistry::load_dir(root.join("schemas")).unwrap();
        let schema = registry.get("tr1").unwrap();
        let lang = LanguageTable::load(root.join("lang").join("en.toml")).unwrap();

        for spec in schema.properties() {
            assert!(lang.lookup(&spec.field).is_some(), "{}", spec.field);
        }
        for category in &schema.categories {
            assert!(lang.lookup(&category.title).is_some(), "{}", category.title);
        }
    }

    #[test]
    fn test_registry_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tr1.toml"), SAMPLE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = SchemaRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.names(), ["tr1"]);
        assert!(registry.get("tr1").is_ok());
        assert!(matches!(
            registry.get("tr3"),
            Err(ConfigError::UnknownSchema(_))
        ));
    }
}
