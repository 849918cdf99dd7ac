//! Editing session around one open configuration.
//!
//! The session owns the configuration currently being edited and keeps the
//! derived flags the surrounding UI binds to. Every mutation goes through the
//! session (or is reported to it with [`EditorSession::on_property_changed`])
//! so the flags are recomputed right after the change.

use std::path::{Path, PathBuf};

use crate::{
    data::{
        configuration::Configuration,
        property::{Property, PropertyChange},
        value::PropertyValue,
    },
    error::{ConfigError, Result},
    lang::SharedText,
    schema::SchemaRegistry,
};

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been opened yet.
    Closed,
    /// A configuration is open; `dirty` when it has unsaved changes.
    Open { dirty: bool },
}

/// Derived whole-configuration flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub is_dirty: bool,
    pub is_default: bool,
    pub has_read_only_items: bool,
}

/// Editing session state.
pub struct EditorSession {
    schemas: SchemaRegistry,
    lang: SharedText,
    enforced_path: Option<PathBuf>,
    config: Option<Configuration>,
    flags: SessionFlags,
}

impl EditorSession {
    /// Creates a closed session over the given schemas and text table.
    pub fn new(schemas: SchemaRegistry, lang: SharedText) -> Self {
        Self {
            schemas,
            lang,
            enforced_path: None,
            config: None,
            flags: SessionFlags::default(),
        }
    }

    /// Gameflow document whose enforced settings are applied on every open.
    pub fn with_enforced_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.enforced_path = Some(path.into());
        self
    }

    /// Opens `path` against schema `schema_id`, replacing the current
    /// configuration only on success.
    pub fn open(&mut self, path: impl AsRef<Path>, schema_id: &str) -> Result<()> {
        let mut config = Configuration::read(path, schema_id, &self.schemas, self.lang.clone())?;
        if let Some(enforced) = &self.enforced_path {
            config.apply_enforced(enforced)?;
        }
        self.config = Some(config);
        self.refresh();
        Ok(())
    }

    /// Opens a configuration of defaults for a file that does not exist yet.
    pub fn open_default(&mut self, path: impl Into<PathBuf>, schema_id: &str) -> Result<()> {
        let schema = self.schemas.get(schema_id)?;
        let mut config = Configuration::new_default(schema_id, schema, self.lang.clone());
        if let Some(enforced) = &self.enforced_path {
            config.apply_enforced(enforced)?;
        }
        config.write(path.into())?;
        self.config = Some(config);
        self.refresh();
        Ok(())
    }

    /// Discards in-memory edits and re-reads the open file.
    pub fn reload(&mut self) -> Result<()> {
        let config = self.config_mut()?;
        config.reload()?;
        self.refresh();
        Ok(())
    }

    /// Writes the open configuration back to its file.
    pub fn save(&mut self) -> Result<bool> {
        let config = self.config_mut()?;
        let Some(path) = config.path().map(Path::to_path_buf) else {
            return Err(ConfigError::Schema(
                "configuration has no backing file".to_string(),
            ));
        };
        let updated = config.write(path)?;
        self.refresh();
        Ok(updated)
    }

    /// Writes the open configuration to `path`, which becomes its file.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let updated = self.config_mut()?.write(path)?;
        self.refresh();
        Ok(updated)
    }

    /// Resets every value to its default.
    pub fn restore_defaults(&mut self) -> Result<Vec<PropertyChange>> {
        let changes = self.config_mut()?.restore_defaults();
        self.refresh();
        Ok(changes)
    }

    /// Sets one value and recomputes the flags.
    pub fn set_value(&mut self, field: &str, value: PropertyValue) -> Result<Option<PropertyChange>> {
        let change = self.config_mut()?.set_value(field, value)?;
        if let Some(change) = &change {
            self.on_property_changed(change);
        }
        Ok(change)
    }

    /// Re-applies the enforced settings document.
    pub fn apply_enforced(&mut self, path: impl AsRef<Path>) -> Result<Vec<PropertyChange>> {
        let changes = self.config_mut()?.apply_enforced(path)?;
        self.refresh();
        Ok(changes)
    }

    /// Observer entry point for changes made directly on a property.
    pub fn on_property_changed(&mut self, change: &PropertyChange) {
        trace!("{} changed ({:?})", change.field, change.aspect);
        self.refresh();
    }

    /// Properties matching `query`; empty when nothing is open.
    pub fn search(&self, query: &str) -> Vec<&Property> {
        self.config
            .as_ref()
            .map(|c| c.search(query))
            .unwrap_or_default()
    }

    /// Whether a configuration is open, and if so whether it has unsaved edits.
    pub fn state(&self) -> SessionState {
        match self.config {
            None => SessionState::Closed,
            Some(_) => SessionState::Open {
                dirty: self.flags.is_dirty,
            },
        }
    }

    /// Snapshot of the derived flags.
    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    /// Whether the open configuration has unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.flags.is_dirty
    }

    /// Whether every value of the open configuration equals its default.
    pub fn is_default(&self) -> bool {
        self.flags.is_default
    }

    /// Whether any property is locked by an enforced override.
    pub fn has_read_only_items(&self) -> bool {
        self.flags.has_read_only_items
    }

    /// File name of the open configuration, suffixed with `*` when dirty.
    pub fn window_title(&self) -> Option<String> {
        let path = self.config.as_ref()?.path()?;
        let name = path.file_name()?.to_string_lossy();
        Some(if self.flags.is_dirty {
            format!("{name}*")
        } else {
            name.into_owned()
        })
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.config.as_ref()
    }

    /// Mutable access for direct property edits; report each returned
    /// change through [`EditorSession::on_property_changed`].
    pub fn configuration_mut(&mut self) -> Option<&mut Configuration> {
        self.config.as_mut()
    }

    fn config_mut(&mut self) -> Result<&mut Configuration> {
        self.config
            .as_mut()
            .ok_or_else(|| ConfigError::Schema("no configuration is open".to_string()))
    }

    fn refresh(&mut self) {
        self.flags = match &self.config {
            Some(config) => SessionFlags {
                is_dirty: config.is_data_dirty(),
                is_default: config.is_data_default(),
                has_read_only_items: config.has_read_only_items(),
            },
            None => SessionFlags::default(),
        };
    }
}
