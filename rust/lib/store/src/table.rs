//! Table: rows of one record type in a KV backend, with save hooks.
//!
//! Every write goes through `save`, which runs the registered hooks against
//! the row (still carrying its new/persisted status) and only then commits.

use std::sync::Arc;

use recstamp_core::{merge_patch, new_id, ServiceError};
use recstamp_kv::{KVError, KVStore};
use serde_json::{Map, Value};
use tracing::debug;

use crate::declaration::Declaration;
use crate::hook::{SaveHook, TouchHook};
use crate::record::Record;
use crate::row::{Row, ID_FIELD};

/// Rows of one record type, keyed `"{name}:{id}"`.
pub struct Table {
    kv: Arc<dyn KVStore>,
    name: String,
    hooks: Vec<Arc<dyn SaveHook>>,
}

impl Table {
    /// A table without hooks.
    pub fn new(kv: Arc<dyn KVStore>, name: impl Into<String>) -> Self {
        Self {
            kv,
            name: name.into(),
            hooks: Vec::new(),
        }
    }

    /// A table whose rows are stamped according to `declaration`.
    pub fn timestamped(
        kv: Arc<dyn KVStore>,
        name: impl Into<String>,
        declaration: impl Into<Declaration>,
    ) -> Self {
        Self::new(kv, name).with_hook(Arc::new(TouchHook::new(declaration)))
    }

    /// Register a hook. Hooks run in registration order.
    pub fn with_hook(mut self, hook: Arc<dyn SaveHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn make_key(&self, id: &str) -> String {
        format!("{}:{}", self.name, id)
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<Row, ServiceError> {
        let fields: Map<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize: {}", e)))?;
        Ok(Row::persisted(fields))
    }

    /// Get a row by id. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<Row>, ServiceError> {
        match self.kv.get(&self.make_key(id)).map_err(Self::kv_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a row or return NotFound error.
    pub fn get_or_err(&self, id: &str) -> Result<Row, ServiceError> {
        self.get(id)?.ok_or_else(|| {
            ServiceError::NotFound(format!("{} '{}' not found", self.name, id))
        })
    }

    /// List all rows, ordered by id.
    pub fn list(&self) -> Result<Vec<Row>, ServiceError> {
        let prefix = format!("{}:", self.name);
        self.kv
            .scan(&prefix)
            .map_err(Self::kv_err)?
            .iter()
            .map(|(_, bytes)| Self::decode(bytes))
            .collect()
    }

    /// Create a row from field values. Assigns a random id when none is given.
    pub fn insert(&self, fields: Value) -> Result<Row, ServiceError> {
        let fields = match fields {
            Value::Object(fields) => fields,
            other => {
                return Err(ServiceError::Internal(format!(
                    "{}: row must be a JSON object, got {}",
                    self.name, other
                )))
            }
        };
        let mut row = Row::new(fields);
        self.save(&mut row)?;
        Ok(row)
    }

    /// Run hooks, then commit the row.
    ///
    /// New rows are rejected if their id is already taken. The row is only
    /// changed once the write has committed: on any error it is left exactly
    /// as it was passed in.
    pub fn save(&self, row: &mut Row) -> Result<(), ServiceError> {
        let mut staged = row.clone();
        if staged.is_new() && staged.id().is_none() {
            staged.set(ID_FIELD, Value::String(new_id()));
        }

        let key = match staged.id() {
            Some(id) => self.make_key(id),
            None => {
                return Err(ServiceError::Internal(format!(
                    "{}: persisted row has no id",
                    self.name
                )))
            }
        };

        if staged.is_new() && self.kv.get(&key).map_err(Self::kv_err)?.is_some() {
            return Err(ServiceError::Conflict(format!("{} already exists", key)));
        }

        for hook in &self.hooks {
            hook.before_save(&mut staged)?;
        }

        let bytes = serde_json::to_vec(staged.fields())
            .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
        self.kv.set(&key, &bytes).map_err(Self::kv_err)?;
        debug!("{}: saved {}", self.name, key);

        staged.mark_persisted();
        *row = staged;
        Ok(())
    }

    /// Apply a JSON merge patch to a stored row and save it.
    pub fn update(&self, id: &str, patch: &Value) -> Result<Row, ServiceError> {
        let row = self.get_or_err(id)?;
        let mut merged = row.into_value();
        merge_patch(&mut merged, patch);
        // The key is fixed; a patch cannot move the row.
        if let Some(obj) = merged.as_object_mut() {
            obj.insert(ID_FIELD.into(), Value::String(id.to_string()));
        }
        let Value::Object(fields) = merged else {
            return Err(ServiceError::Internal(format!(
                "{}: patch must be a JSON object",
                self.name
            )));
        };
        let mut row = Row::persisted(fields);
        self.save(&mut row)?;
        Ok(row)
    }

    /// Delete a row by id.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.get_or_err(id)?;
        self.kv.delete(&self.make_key(id)).map_err(Self::kv_err)
    }
}
