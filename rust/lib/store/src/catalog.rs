//! Catalog: opens storage from a [`StoreConfig`] and hands out tables wired
//! with each model's timestamps declaration.

use std::collections::BTreeMap;
use std::sync::Arc;

use recstamp_core::{ServiceError, StoreConfig};
use recstamp_kv::{KVStore, RedbStore};
use tracing::info;

use crate::declaration::Declaration;
use crate::table::Table;

pub struct Catalog {
    kv: Arc<dyn KVStore>,
    models: BTreeMap<String, Declaration>,
}

impl Catalog {
    /// Open the configured redb file (creating parent directories).
    pub fn open(config: &StoreConfig) -> Result<Self, ServiceError> {
        let path = config.resolve_db_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ServiceError::Storage(format!("create {}: {}", parent.display(), e))
            })?;
        }
        let kv: Arc<dyn KVStore> = Arc::new(
            RedbStore::open(&path).map_err(|e| ServiceError::Storage(e.to_string()))?,
        );
        info!("Catalog: opened {} with {} models", path.display(), config.models.len());
        Ok(Self::with_store(kv, config))
    }

    /// Use an already-open backend.
    pub fn with_store(kv: Arc<dyn KVStore>, config: &StoreConfig) -> Self {
        let models = config
            .models
            .iter()
            .map(|(name, model)| (name.clone(), Declaration::Value(model.timestamps.clone())))
            .collect();
        Self { kv, models }
    }

    /// Declare (or redeclare) a model in code.
    pub fn register(&mut self, name: impl Into<String>, declaration: impl Into<Declaration>) {
        self.models.insert(name.into(), declaration.into());
    }

    /// Table for `name`. Models without a declaration are not stamped.
    pub fn table(&self, name: &str) -> Table {
        match self.models.get(name) {
            Some(declaration) => Table::timestamped(self.kv.clone(), name, declaration.clone()),
            None => Table::new(self.kv.clone(), name),
        }
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    const CONFIG: &str = r#"
        [models.posts]
        timestamps = true

        [models.events]
        timestamps = { created_at = true, touched_at = { update = true } }

        [models.broken]
        timestamps = 42

        [models.dated]
        timestamps = 1979-05-27T07:32:00Z
    "#;

    fn open() -> (Catalog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::parse(CONFIG).unwrap();
        config.storage.data_dir = Some(dir.path().join("nested"));
        (Catalog::open(&config).unwrap(), dir)
    }

    #[test]
    fn open_creates_db_under_data_dir() {
        let (catalog, dir) = open();
        assert!(dir.path().join("nested/data.redb").exists());
        let names: Vec<&str> = catalog.model_names().collect();
        assert_eq!(names, vec!["broken", "dated", "events", "posts"]);
    }

    #[test]
    fn configured_models_are_stamped() {
        let (catalog, _dir) = open();

        let post = catalog.table("posts").insert(json!({"title": "hi"})).unwrap();
        assert!(post.get_str("created_at").is_some());
        assert_eq!(post.get_str("updated_at"), post.get_str("created_at"));

        let event = catalog.table("events").insert(json!({})).unwrap();
        assert!(event.get_str("created_at").is_some());
        assert!(event.get_str("touched_at").is_some());
        assert!(event.get("updated_at").is_none());
    }

    #[test]
    fn unknown_models_are_plain() {
        let (catalog, _dir) = open();
        let row = catalog.table("notes").insert(json!({"text": "x"})).unwrap();
        assert!(row.get("created_at").is_none());
    }

    #[test]
    fn malformed_model_fails_on_save() {
        let (catalog, _dir) = open();
        let err = catalog.table("broken").insert(json!({"id": "b1"})).unwrap_err();
        assert!(err.to_string().contains("got 42 (number)"), "got: {}", err);
        assert!(catalog.table("broken").get("b1").unwrap().is_none());
    }

    #[test]
    fn datetime_model_fails_on_save() {
        let (catalog, _dir) = open();
        let err = catalog.table("dated").insert(json!({"id": "d1"})).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIGURATION");
        assert!(err.to_string().contains("(datetime)"), "got: {}", err);
        assert!(catalog.table("dated").get("d1").unwrap().is_none());
    }

    #[test]
    fn register_overrides_config() {
        let (mut catalog, _dir) = open();
        catalog.register("broken", "created_at");
        let row = catalog.table("broken").insert(json!({})).unwrap();
        assert!(row.get_str("created_at").is_some());
        assert!(row.get("updated_at").is_none());
    }
}
