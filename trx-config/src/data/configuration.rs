use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::{Map, Value};

use crate::{
    data::{
        category::Category,
        property::{Property, PropertyChange},
        value::PropertyValue,
    },
    error::{ConfigError, MalformedValues, Result},
    lang::SharedText,
    schema::{Schema, SchemaRegistry},
    search,
};

/// Key of the enforced settings object inside the gameflow document.
pub const ENFORCED_KEY: &str = "enforced_config";

fn read_document(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io(path, e))?;
    parse_document(path, &content)
}

fn parse_document(path: &Path, content: &str) -> Result<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let root: Value = json5::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    match root {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: format!("expected a JSON object at the root, got {other}"),
        }),
    }
}

/// The full set of categories loaded from, and saved to, one file.
#[derive(Clone)]
pub struct Configuration {
    schema_id: String,
    schema: Arc<Schema>,
    lang: SharedText,
    path: Option<PathBuf>,
    categories: Vec<Category>,
    /// Values as last loaded from or written to disk.
    baseline: HashMap<String, PropertyValue>,
    /// Document keys the schema does not describe, kept for writing back.
    extra: Map<String, Value>,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("schema_id", &self.schema_id)
            .field("path", &self.path)
            .field("categories", &self.categories)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// Builds a configuration holding factory defaults, not backed by a file.
    pub fn new_default(schema_id: &str, schema: Arc<Schema>, lang: SharedText) -> Self {
        let categories: Vec<Category> = schema
            .categories
            .iter()
            .map(|spec| Category::new(spec, &schema, lang.as_ref()))
            .collect();
        let mut config = Self {
            schema_id: schema_id.to_string(),
            schema,
            lang,
            path: None,
            categories,
            baseline: HashMap::new(),
            extra: Map::new(),
        };
        config.reset_baseline();
        config
    }

    /// Parses the file at `path` against the schema registered as `schema_id`.
    ///
    /// Every malformed field is collected; if any is found the whole read
    /// fails and no configuration is produced.
    pub fn read(
        path: impl AsRef<Path>,
        schema_id: &str,
        schemas: &SchemaRegistry,
        lang: SharedText,
    ) -> Result<Self> {
        let schema = schemas.get(schema_id)?;
        Self::read_with_schema(path.as_ref(), schema_id, schema, lang)
    }

    fn read_with_schema(
        path: &Path,
        schema_id: &str,
        schema: Arc<Schema>,
        lang: SharedText,
    ) -> Result<Self> {
        let mut document = read_document(path)?;
        let mut config = Self::new_default(schema_id, schema, lang);

        let mut malformed = Vec::new();
        for prop in config.properties_mut() {
            if let Some(raw) = document.remove(prop.field()) {
                if let Err(e) = prop.load_value(&raw) {
                    malformed.push(e);
                }
            }
        }
        if !malformed.is_empty() {
            return Err(ConfigError::InvalidValues {
                path: path.to_path_buf(),
                values: MalformedValues(malformed),
            });
        }

        if !document.is_empty() {
            debug!(
                "keeping {} unrecognized keys from {}",
                document.len(),
                path.display()
            );
        }
        config.extra = document;
        config.path = Some(path.to_path_buf());
        config.reset_baseline();
        info!(
            "loaded {} properties from {}",
            config.properties().count(),
            path.display()
        );
        Ok(config)
    }

    /// Re-reads the backing file into a fresh configuration.
    ///
    /// On failure `self` is left untouched.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Err(ConfigError::Schema(
                "configuration has no backing file".to_string(),
            ));
        };
        let mut fresh = Self::read_with_schema(
            &path,
            &self.schema_id,
            self.schema.clone(),
            self.lang.clone(),
        )?;
        for (prop, old) in fresh.properties_mut().zip(
            self.categories
                .iter()
                .flat_map(|c| c.properties().iter()),
        ) {
            prop.set_enforced_override(old.enforced_override().cloned())?;
        }
        *self = fresh;
        Ok(())
    }

    /// Serializes every property to `path`, in category order.
    ///
    /// Unrecognized keys read from disk are appended after the known
    /// properties. Returns whether the file contents changed; the dirty
    /// baseline is updated either way.
    pub fn write(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let data = self.to_json_string()?;

        let updated = match fs::read_to_string(path) {
            Ok(old) if old == data => false,
            _ => {
                fs::write(path, &data).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                true
            }
        };
        if updated {
            info!("saved settings to {}", path.display());
        } else {
            debug!("{} already up to date", path.display());
        }

        self.path = Some(path.to_path_buf());
        self.reset_baseline();
        Ok(updated)
    }

    /// Pretty JSON document of the current values.
    pub fn to_json_string(&self) -> Result<String> {
        let mut root = Map::new();
        for prop in self.properties() {
            root.insert(prop.field().to_string(), prop.export_value());
        }
        for (key, value) in &self.extra {
            if !root.contains_key(key) {
                root.insert(key.clone(), value.clone());
            }
        }
        serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| ConfigError::Parse {
            path: self.path.clone().unwrap_or_default(),
            message: e.to_string(),
        })
    }

    /// Applies the `enforced_config` object of the gameflow document at `path`.
    ///
    /// A missing file means nothing is enforced. Overrides on properties the
    /// document does not name are cleared.
    pub fn apply_enforced(&mut self, path: impl AsRef<Path>) -> Result<Vec<PropertyChange>> {
        let path = path.as_ref();
        let document = match read_document(path) {
            Ok(document) => document,
            Err(ConfigError::FileNotFound { .. }) => {
                debug!("no enforced settings at {}", path.display());
                Map::new()
            }
            Err(e) => return Err(e),
        };
        let enforced = match document.get(ENFORCED_KEY) {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    message: format!("`{ENFORCED_KEY}` must be an object, got {other}"),
                });
            }
            None => Map::new(),
        };
        self.apply_enforced_map(path, &enforced)
    }

    fn apply_enforced_map(
        &mut self,
        path: &Path,
        enforced: &Map<String, Value>,
    ) -> Result<Vec<PropertyChange>> {
        for key in enforced.keys() {
            if self.property(key).is_none() {
                warn!("ignoring unknown enforced setting `{key}`");
            }
        }

        let mut overrides = Vec::new();
        let mut malformed = Vec::new();
        for prop in self.properties() {
            match enforced.get(prop.field()).map(|raw| prop.decode_value(raw)) {
                Some(Ok(value)) => overrides.push(Some(value)),
                Some(Err(e)) => malformed.push(e),
                None => overrides.push(None),
            }
        }
        if !malformed.is_empty() {
            return Err(ConfigError::InvalidValues {
                path: path.to_path_buf(),
                values: MalformedValues(malformed),
            });
        }

        let mut changes = Vec::new();
        for (prop, value) in self.properties_mut().zip(overrides) {
            changes.extend(prop.set_enforced_override(value)?);
        }
        if self.has_read_only_items() {
            info!("enforced settings active from {}", path.display());
        }
        Ok(changes)
    }

    /// Whether any value differs from the last loaded or saved state.
    pub fn is_data_dirty(&self) -> bool {
        self.properties()
            .any(|p| self.baseline.get(p.field()) != Some(&p.value()))
    }

    /// Whether every value equals its factory default.
    pub fn is_data_default(&self) -> bool {
        self.properties().all(Property::is_default)
    }

    /// Whether any property is currently locked by an enforced override.
    pub fn has_read_only_items(&self) -> bool {
        self.properties().any(|p| !p.is_enabled())
    }

    /// Resets every value to its default, leaving overrides alone.
    pub fn restore_defaults(&mut self) -> Vec<PropertyChange> {
        self.properties_mut()
            .filter_map(Property::set_to_default)
            .collect()
    }

    /// Sets the value of the property named `field`.
    pub fn set_value(&mut self, field: &str, value: PropertyValue) -> Result<Option<PropertyChange>> {
        let prop = self
            .property_mut(field)
            .ok_or_else(|| ConfigError::UnknownProperty(field.to_string()))?;
        Ok(prop.set_value(value)?)
    }

    /// Sets or clears the enforced override of the property named `field`.
    pub fn set_enforced_override(
        &mut self,
        field: &str,
        value: Option<PropertyValue>,
    ) -> Result<Vec<PropertyChange>> {
        let prop = self
            .property_mut(field)
            .ok_or_else(|| ConfigError::UnknownProperty(field.to_string()))?;
        Ok(prop.set_enforced_override(value)?)
    }

    /// Properties whose display text matches `query`, in display order.
    pub fn search(&self, query: &str) -> Vec<&Property> {
        search::search(self.properties(), query)
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All properties, category by category.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.categories.iter().flat_map(|c| c.properties().iter())
    }

    fn properties_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.properties_mut().iter_mut())
    }

    /// Looks up a property by field.
    pub fn property(&self, field: &str) -> Option<&Property> {
        self.properties().find(|p| p.field() == field)
    }

    /// Looks up a property by field for editing.
    pub fn property_mut(&mut self, field: &str) -> Option<&mut Property> {
        self.properties_mut().find(|p| p.field() == field)
    }

    /// Name of the schema this configuration was parsed against.
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// File the configuration was last read from or written to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn reset_baseline(&mut self) {
        self.baseline = self
            .properties()
            .map(|p| (p.field().to_string(), p.value()))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lang::LanguageTable, schema::tests::sample};
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.insert("tr1", sample());
        registry
    }

    fn lang() -> SharedText {
        Arc::new(LanguageTable::from_entries([
            ("brightness", "Brightness", "Overall scene brightness."),
            ("enable_braid", "Braid", "Animate Lara's braid."),
            ("fov_value", "Field of view", "Camera angle in degrees."),
            ("menu_style", "Menu style", "Look of the inventory and menus."),
        ]))
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("TR1X.json5");
        fs::write(&path, content).unwrap();
        path
    }

    fn load(content: &str) -> (tempfile::TempDir, PathBuf, Configuration) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), content);
        let config = Configuration::read(&path, "tr1", &registry(), lang()).unwrap();
        (dir, path, config)
    }

    #[test]
    fn test_read_is_clean() {
        let (_dir, _path, config) = load(
            r#"{
  // comments are allowed
  "fov_value": 90,
  "enable_braid": true,
  "layout_1": [{"role": "jump", "key": 32}],
}"#,
        );
        assert!(!config.is_data_dirty());
        assert!(!config.is_data_default());
        assert_eq!(
            config.property("fov_value").unwrap().value(),
            PropertyValue::Integer(90)
        );
        assert_eq!(
            config.property("brightness").unwrap().value(),
            PropertyValue::Decimal(1.0)
        );
    }

    #[test]
    fn test_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json5");
        assert!(matches!(
            Configuration::read(&missing, "tr1", &registry(), lang()),
            Err(ConfigError::FileNotFound { .. })
        ));

        let path = write_config(dir.path(), "{ not json");
        assert!(matches!(
            Configuration::read(&path, "tr1", &registry(), lang()),
            Err(ConfigError::Parse { .. })
        ));

        let path = write_config(dir.path(), r#"{"fov_value": "wide", "menu_style": "n64"}"#);
        match Configuration::read(&path, "tr1", &registry(), lang()) {
            Err(ConfigError::InvalidValues { values, .. }) => assert_eq!(values.0.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            Configuration::read(&path, "tr9", &registry(), lang()),
            Err(ConfigError::UnknownSchema(_))
        ));
    }

    #[test]
    fn test_dirty_round_trip() {
        let (_dir, path, mut config) = load(r#"{"fov_value": 90}"#);
        config
            .set_value("fov_value", PropertyValue::Integer(100))
            .unwrap();
        assert!(config.is_data_dirty());

        config
            .set_value("fov_value", PropertyValue::Integer(90))
            .unwrap();
        assert!(!config.is_data_dirty());

        config
            .set_value("enable_braid", PropertyValue::Bool(true))
            .unwrap();
        assert!(config.write(&path).unwrap());
        assert!(!config.is_data_dirty());

        let reread = Configuration::read(&path, "tr1", &registry(), lang()).unwrap();
        assert_eq!(
            reread.property("enable_braid").unwrap().value(),
            PropertyValue::Bool(true)
        );
    }

    #[test]
    fn test_write_preserves_unknown_keys_and_order() {
        let (_dir, path, mut config) = load(r#"{"layout_1": [1, 2], "fov_value": 70}"#);
        config.write(&path).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<_> = written.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            ["brightness", "enable_braid", "fov_value", "menu_style", "layout_1"]
        );
        assert_eq!(written["layout_1"], json!([1, 2]));
        assert_eq!(written["menu_style"], json!("pc"));

        assert!(!config.write(&path).unwrap());
    }

    #[test]
    fn test_write_failure_reports_io() {
        let (dir, _path, mut config) = load("{}");
        let target = dir.path().join("no-such-dir").join("cfg.json5");
        assert!(matches!(
            config.write(&target),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_restore_defaults_keeps_overrides() {
        let (_dir, _path, mut config) = load(r#"{"fov_value": 90, "enable_braid": true}"#);
        config
            .set_enforced_override("menu_style", Some(PropertyValue::Enum("ps1".into())))
            .unwrap();
        config
            .set_value("brightness", PropertyValue::Decimal(1.5))
            .unwrap();

        let changes = config.restore_defaults();
        assert_eq!(changes.len(), 3);
        assert!(config.is_data_default());
        assert!(config.is_data_dirty());
        assert!(config.has_read_only_items());
        assert_eq!(
            config.property("menu_style").unwrap().effective_value(),
            PropertyValue::Enum("ps1".into())
        );
    }

    #[test]
    fn test_wrong_type_override_rejected() {
        let (_dir, _path, mut config) = load("{}");
        let err = config
            .set_enforced_override("enable_braid", Some(PropertyValue::Enum("bogus".into())))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedValue(ref v) if v.field == "enable_braid"));
        assert!(!config.has_read_only_items());
        assert_eq!(
            config.property("enable_braid").unwrap().effective_value(),
            PropertyValue::Bool(false)
        );
    }

    #[test]
    fn test_apply_enforced() {
        let (dir, path, mut config) = load(r#"{"fov_value": 90}"#);
        let gameflow = dir.path().join("TR1X_gameflow.json5");
        fs::write(
            &gameflow,
            r#"{"enforced_config": {"fov_value": 60, "unknown_option": 1}, "levels": []}"#,
        )
        .unwrap();

        let changes = config.apply_enforced(&gameflow).unwrap();
        assert_eq!(changes.len(), 2);
        assert!(config.has_read_only_items());
        let fov = config.property("fov_value").unwrap();
        assert_eq!(fov.effective_value(), PropertyValue::Integer(60));
        assert_eq!(fov.export_value(), json!(90));

        config.write(&path).unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["fov_value"], json!(90));

        fs::write(&gameflow, r#"{"levels": []}"#).unwrap();
        config.apply_enforced(&gameflow).unwrap();
        assert!(!config.has_read_only_items());

        fs::write(&gameflow, r#"{"enforced_config": {"fov_value": "x"}}"#).unwrap();
        assert!(config.apply_enforced(&gameflow).is_err());
        assert!(!config.has_read_only_items());

        let missing = dir.path().join("absent.json5");
        assert!(config.apply_enforced(&missing).unwrap().is_empty());
    }

    #[test]
    fn test_reload_is_atomic() {
        let (_dir, path, mut config) = load(r#"{"fov_value": 90}"#);
        config
            .set_enforced_override("enable_braid", Some(PropertyValue::Bool(true)))
            .unwrap();
        config
            .set_value("fov_value", PropertyValue::Integer(120))
            .unwrap();

        fs::write(&path, r#"{"fov_value": false}"#).unwrap();
        assert!(config.reload().is_err());
        assert_eq!(
            config.property("fov_value").unwrap().value(),
            PropertyValue::Integer(120)
        );

        fs::write(&path, r#"{"fov_value": 45}"#).unwrap();
        config.reload().unwrap();
        assert!(!config.is_data_dirty());
        assert_eq!(
            config.property("fov_value").unwrap().value(),
            PropertyValue::Integer(45)
        );
        assert!(!config.property("enable_braid").unwrap().is_enabled());
    }

    #[test]
    fn test_search_through_configuration() {
        let config = Configuration::new_default("tr1", Arc::new(sample()), lang());
        let found: Vec<_> = config.search("camera").iter().map(|p| p.field()).collect();
        assert_eq!(found, ["fov_value"]);
    }
}
