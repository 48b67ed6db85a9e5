use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{DebateError, DebateResult},
    models::{file_name_component, require_fields, DebateFormat, ExportFile},
    store::{load_json, save_json, Persistence},
};

use super::builtin_formats;

pub const FORMATS_KEY: &str = "debateTimerFormats";
pub const DEFAULT_FORMAT_KEY: &str = "debateTimerDefaultFormat";

/// One line of the format settings list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormatSummary {
    pub name: String,
    pub description: String,
    pub affirmative_count: usize,
    pub negative_count: usize,
    pub is_builtin: bool,
    pub is_default: bool,
}

impl FormatSummary {
    pub fn counts_label(&self) -> String {
        format!(
            "{} affirmative, {} negative timers",
            self.affirmative_count, self.negative_count
        )
    }
}

/// Built-in formats plus the user's imported ones, and the startup default.
pub struct FormatCatalog {
    builtins: Vec<DebateFormat>,
    custom: Vec<DebateFormat>,
    default_name: String,
    store: Arc<dyn Persistence>,
}

impl FormatCatalog {
    /// Reads custom formats and the default name from `store`. Unreadable
    /// entries are logged and skipped rather than failing startup.
    pub fn load(store: Arc<dyn Persistence>) -> Self {
        let builtins = builtin_formats();

        let custom: Vec<DebateFormat> = match load_json(store.as_ref(), FORMATS_KEY) {
            Ok(Some(formats)) => formats,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Ignoring stored custom formats: {err:#}");
                Vec::new()
            }
        };

        let stored_default = match store.get(DEFAULT_FORMAT_KEY) {
            Ok(value) => value.and_then(|bytes| String::from_utf8(bytes).ok()),
            Err(err) => {
                warn!("Failed to read default format: {err:#}");
                None
            }
        };

        let mut catalog = Self {
            default_name: builtins[0].name.clone(),
            builtins,
            custom,
            store,
        };

        if let Some(name) = stored_default {
            if catalog.get(&name).is_some() {
                catalog.default_name = name;
            } else {
                warn!("Stored default format '{name}' no longer exists; using built-in");
            }
        }

        info!(
            "Format catalog loaded: {} built-in, {} custom, default '{}'",
            catalog.builtins.len(),
            catalog.custom.len(),
            catalog.default_name
        );
        catalog
    }

    /// Built-ins first, then custom formats in import order.
    pub fn list_all(&self) -> impl Iterator<Item = &DebateFormat> {
        self.builtins.iter().chain(self.custom.iter())
    }

    pub fn custom_formats(&self) -> &[DebateFormat] {
        &self.custom
    }

    pub fn get(&self, name: &str) -> Option<&DebateFormat> {
        self.list_all().find(|format| format.name == name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|format| format.name == name)
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn default_format(&self) -> &DebateFormat {
        self.get(&self.default_name).unwrap_or(&self.builtins[0])
    }

    pub fn summaries(&self) -> Vec<FormatSummary> {
        self.list_all()
            .map(|format| FormatSummary {
                name: format.name.clone(),
                description: format.description.clone(),
                affirmative_count: format.affirmative.len(),
                negative_count: format.negative.len(),
                is_builtin: self.is_builtin(&format.name),
                is_default: format.name == self.default_name,
            })
            .collect()
    }

    /// Parses, validates and stores a format file. On any error the catalog is
    /// left exactly as it was.
    pub fn import_format(&mut self, raw: &str) -> DebateResult<&DebateFormat> {
        let value: Value = serde_json::from_str(raw)?;
        require_fields(&value, "format", &["name", "affirmative", "negative"])?;
        let format: DebateFormat = serde_json::from_value(value)
            .map_err(|err| DebateError::validation(format!("format has the wrong shape: {err}")))?;
        self.add_format(format)
    }

    pub fn add_format(&mut self, format: DebateFormat) -> DebateResult<&DebateFormat> {
        format.validate()?;
        if self.get(&format.name).is_some() {
            return Err(DebateError::validation(format!(
                "a format named '{}' already exists",
                format.name
            )));
        }

        let mut next = self.custom.clone();
        next.push(format);
        save_json(self.store.as_ref(), FORMATS_KEY, &next)?;
        self.custom = next;

        let added = &self.custom[self.custom.len() - 1];
        info!("Imported format '{}'", added.name);
        Ok(added)
    }

    /// Removes a custom format. If it was the default, the first built-in
    /// becomes the default.
    pub fn delete_format(&mut self, name: &str) -> DebateResult<()> {
        if self.is_builtin(name) {
            return Err(DebateError::validation(format!(
                "built-in format '{name}' cannot be deleted"
            )));
        }
        if !self.custom.iter().any(|format| format.name == name) {
            return Err(DebateError::validation(format!("no custom format named '{name}'")));
        }

        let next: Vec<DebateFormat> = self
            .custom
            .iter()
            .filter(|format| format.name != name)
            .cloned()
            .collect();
        save_json(self.store.as_ref(), FORMATS_KEY, &next)?;
        self.custom = next;

        if self.default_name == name {
            let fallback = self.builtins[0].name.clone();
            self.persist_default(&fallback)?;
            self.default_name = fallback;
        }

        info!("Deleted format '{name}'");
        Ok(())
    }

    pub fn set_default(&mut self, name: &str) -> DebateResult<()> {
        if self.get(name).is_none() {
            return Err(DebateError::validation(format!("no format named '{name}'")));
        }
        self.persist_default(name)?;
        self.default_name = name.to_string();
        Ok(())
    }

    pub fn export_format(&self, name: &str) -> DebateResult<ExportFile> {
        let format = self
            .get(name)
            .ok_or_else(|| DebateError::validation(format!("no format named '{name}'")))?;
        Ok(ExportFile {
            file_name: format!(
                "debate-format-{}.json",
                file_name_component(&format.name, "format")
            ),
            contents: serde_json::to_string_pretty(format)?,
        })
    }

    fn persist_default(&self, name: &str) -> DebateResult<()> {
        self.store.set(DEFAULT_FORMAT_KEY, name.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const CUSTOM: &str = r#"{
        "name": "British Parliamentary",
        "description": "Seven minute speeches",
        "affirmative": [
            {"id": "pm", "name": "Prime Minister", "duration": 420, "allowNegative": false}
        ],
        "negative": [
            {"id": "lo", "name": "Leader of Opposition", "duration": 420, "allowNegative": true}
        ]
    }"#;

    fn catalog() -> (FormatCatalog, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (FormatCatalog::load(store.clone()), store)
    }

    #[test]
    fn starts_with_builtins_and_first_default() {
        let (catalog, _) = catalog();
        let names: Vec<_> = catalog.list_all().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Lincoln-Douglas", "Public Forum", "Quick Test"]);
        assert_eq!(catalog.default_format().name, "Lincoln-Douglas");
    }

    #[test]
    fn import_appends_after_builtins_and_persists() {
        let (mut catalog, store) = catalog();
        let imported = catalog.import_format(CUSTOM).unwrap();
        assert_eq!(imported.negative[0].id, "lo");

        let names: Vec<_> = catalog.list_all().map(|f| f.name.clone()).collect();
        assert_eq!(names.last().map(String::as_str), Some("British Parliamentary"));

        let reloaded = FormatCatalog::load(store);
        assert_eq!(reloaded.custom_formats().len(), 1);
        assert!(!reloaded.is_builtin("British Parliamentary"));
    }

    #[test]
    fn colliding_names_are_rejected_without_change() {
        let (mut catalog, store) = catalog();
        catalog.import_format(CUSTOM).unwrap();
        let before = store.get(FORMATS_KEY).unwrap();

        let err = catalog.import_format(CUSTOM).unwrap_err();
        assert!(matches!(err, DebateError::Validation(_)));

        let builtin_clash = CUSTOM.replace("British Parliamentary", "Public Forum");
        assert!(catalog.import_format(&builtin_clash).is_err());

        assert_eq!(catalog.custom_formats().len(), 1);
        assert_eq!(store.get(FORMATS_KEY).unwrap(), before);
    }

    #[test]
    fn missing_fields_and_garbage_are_rejected() {
        let (mut catalog, _) = catalog();
        let no_negative = r#"{"name":"X","affirmative":[]}"#;
        assert!(matches!(
            catalog.import_format(no_negative),
            Err(DebateError::Validation(_))
        ));
        assert!(matches!(
            catalog.import_format(r#"{"name":"","affirmative":[],"negative":[]}"#),
            Err(DebateError::Validation(_))
        ));
        assert!(matches!(
            catalog.import_format("not json at all"),
            Err(DebateError::Parse(_))
        ));
        assert!(matches!(
            catalog.import_format(r#"{"name":"X","affirmative":"nope","negative":[]}"#),
            Err(DebateError::Validation(_))
        ));
        assert!(catalog.custom_formats().is_empty());
    }

    #[test]
    fn durations_beyond_millisecond_range_are_rejected() {
        let (mut catalog, store) = catalog();
        let too_long = CUSTOM.replace(
            "\"duration\": 420, \"allowNegative\": false",
            "\"duration\": 9223372036854776",
        );
        assert_ne!(too_long, CUSTOM);
        let err = catalog.import_format(&too_long).unwrap_err();
        assert!(matches!(err, DebateError::Validation(ref msg) if msg.contains("pm")));
        assert!(catalog.custom_formats().is_empty());
        assert_eq!(store.get(FORMATS_KEY).unwrap(), None);

        let longest = CUSTOM.replace(
            "\"duration\": 420, \"allowNegative\": false",
            "\"duration\": 9223372036854775",
        );
        let imported = catalog.import_format(&longest).unwrap();
        assert_eq!(imported.affirmative[0].duration_ms(), 9_223_372_036_854_775_000);
    }

    #[test]
    fn deleting_default_falls_back_to_first_builtin() {
        let (mut catalog, store) = catalog();
        catalog.import_format(CUSTOM).unwrap();
        catalog.set_default("British Parliamentary").unwrap();
        assert_eq!(
            store.get(DEFAULT_FORMAT_KEY).unwrap(),
            Some(b"British Parliamentary".to_vec())
        );

        catalog.delete_format("British Parliamentary").unwrap();
        assert_eq!(catalog.default_name(), "Lincoln-Douglas");
        assert_eq!(
            store.get(DEFAULT_FORMAT_KEY).unwrap(),
            Some(b"Lincoln-Douglas".to_vec())
        );
        assert!(catalog.custom_formats().is_empty());
    }

    #[test]
    fn builtins_and_unknowns_cannot_be_deleted() {
        let (mut catalog, _) = catalog();
        assert!(catalog.delete_format("Quick Test").is_err());
        assert!(catalog.delete_format("Nope").is_err());
        assert!(catalog.get("Quick Test").is_some());
    }

    #[test]
    fn default_survives_reload_and_unknown_default_is_rejected() {
        let (mut catalog, store) = catalog();
        catalog.set_default("Public Forum").unwrap();
        assert!(catalog.set_default("Nope").is_err());

        let reloaded = FormatCatalog::load(store.clone());
        assert_eq!(reloaded.default_format().name, "Public Forum");

        store.set(DEFAULT_FORMAT_KEY, b"Deleted Elsewhere").unwrap();
        let reloaded = FormatCatalog::load(store);
        assert_eq!(reloaded.default_format().name, "Lincoln-Douglas");
    }

    #[test]
    fn corrupt_custom_formats_are_ignored_on_load() {
        let store = Arc::new(MemoryStore::new());
        store.set(FORMATS_KEY, b"{{{").unwrap();
        let catalog = FormatCatalog::load(store);
        assert!(catalog.custom_formats().is_empty());
    }

    #[test]
    fn export_then_import_elsewhere() {
        let (mut catalog, _) = catalog();
        catalog.import_format(CUSTOM).unwrap();
        let file = catalog.export_format("British Parliamentary").unwrap();
        assert_eq!(file.file_name, "debate-format-British-Parliamentary.json");

        let (mut other, _) = super::tests::catalog();
        let imported = other.import_format(&file.contents).unwrap();
        assert_eq!(imported, catalog.get("British Parliamentary").unwrap());
    }

    #[test]
    fn summaries_flag_builtin_and_default() {
        let (mut catalog, _) = catalog();
        catalog.import_format(CUSTOM).unwrap();
        let summaries = catalog.summaries();
        assert!(summaries[0].is_default && summaries[0].is_builtin);
        let custom = summaries.last().unwrap();
        assert!(!custom.is_builtin);
        assert_eq!(custom.counts_label(), "1 affirmative, 1 negative timers");
    }
}
