//! Save hooks: code that runs on a record right before it is committed.

use recstamp_core::ServiceError;

use crate::declaration::Declaration;
use crate::record::Record;
use crate::resolve::resolve;
use crate::touch::{touch, Stamp};

/// Runs synchronously before a record is written. An error aborts the write.
pub trait SaveHook: Send + Sync {
    fn before_save(&self, record: &mut dyn Record) -> Result<(), ServiceError>;
}

/// Stamps timestamps according to a record type's declaration.
///
/// The declaration is resolved on every save, so a malformed one fails each
/// save attempt before any field is modified.
#[derive(Debug, Clone, Default)]
pub struct TouchHook {
    declaration: Declaration,
}

impl TouchHook {
    pub fn new(declaration: impl Into<Declaration>) -> Self {
        Self {
            declaration: declaration.into(),
        }
    }
}

impl SaveHook for TouchHook {
    fn before_save(&self, record: &mut dyn Record) -> Result<(), ServiceError> {
        let config = resolve(&self.declaration)?;
        touch(record, &config);
        Ok(())
    }
}

/// Typed records that carry their own timestamps declaration.
///
/// ```ignore
/// impl Timestamped for Invoice {
///     fn timestamps() -> Declaration { Declaration::On }
/// }
///
/// invoice.touch()?; // from the persistence layer, before writing
/// ```
pub trait Timestamped: Record + Sized {
    /// The declaration attached to this record type.
    fn timestamps() -> Declaration;

    /// Resolve [`Self::timestamps`] and stamp this record.
    fn touch(&mut self) -> Result<Vec<(String, Stamp)>, ServiceError> {
        let config = resolve(&Self::timestamps())?;
        Ok(touch(self, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    // A hand-built typed record (no macro).
    #[derive(Debug, Default)]
    struct Invoice {
        id: Option<String>,
        total: u64,
        created_at: Option<String>,
        updated_at: Option<String>,
        committed: bool,
        // Cache of the Value representation handed out by `get`.
        view: std::collections::BTreeMap<String, Value>,
    }

    impl Invoice {
        fn refresh_view(&mut self) {
            self.view.clear();
            if let Some(id) = &self.id {
                self.view.insert("id".into(), json!(id));
            }
            self.view.insert("total".into(), json!(self.total));
            if let Some(v) = &self.created_at {
                self.view.insert("created_at".into(), json!(v));
            }
            if let Some(v) = &self.updated_at {
                self.view.insert("updated_at".into(), json!(v));
            }
        }
    }

    impl Record for Invoice {
        fn get(&self, field: &str) -> Option<&Value> {
            self.view.get(field)
        }

        fn set(&mut self, field: &str, value: Value) {
            let text = value.as_str().map(String::from);
            match field {
                "created_at" => self.created_at = text,
                "updated_at" => self.updated_at = text,
                _ => return,
            }
            self.refresh_view();
        }

        fn is_new(&self) -> bool {
            !self.committed
        }
    }

    impl Timestamped for Invoice {
        fn timestamps() -> Declaration {
            Declaration::On
        }
    }

    struct Broken;

    impl Record for Broken {
        fn get(&self, _field: &str) -> Option<&Value> {
            None
        }
        fn set(&mut self, _field: &str, _value: Value) {
            panic!("must not be touched");
        }
        fn is_new(&self) -> bool {
            true
        }
    }

    impl Timestamped for Broken {
        fn timestamps() -> Declaration {
            Declaration::Value(json!(42))
        }
    }

    #[test]
    fn typed_record_touch() {
        let mut invoice = Invoice::default();
        invoice.refresh_view();
        invoice.touch().unwrap();
        assert!(invoice.created_at.is_some());
        assert_eq!(invoice.created_at, invoice.updated_at);

        invoice.committed = true;
        invoice.created_at = Some("2020-01-01T00:00:00.000000Z".into());
        invoice.updated_at = invoice.created_at.clone();
        invoice.refresh_view();
        invoice.touch().unwrap();
        assert_eq!(invoice.created_at.as_deref(), Some("2020-01-01T00:00:00.000000Z"));
        assert!(invoice.updated_at.as_deref() > Some("2020-01-01T00:00:00.000000Z"));
    }

    #[test]
    fn invalid_declaration_aborts_before_any_write() {
        let err = Broken.touch().unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfiguration(_)));
    }

    #[test]
    fn touch_hook_stamps_through_trait_object() {
        let hook: Box<dyn SaveHook> = Box::new(TouchHook::new("created_at"));
        let mut invoice = Invoice::default();
        invoice.refresh_view();
        hook.before_save(&mut invoice).unwrap();
        assert!(invoice.created_at.is_some());
        assert!(invoice.updated_at.is_none());
    }

    #[test]
    fn touch_hook_surfaces_invalid_declaration() {
        let hook = TouchHook::new(json!(42));
        let err = hook.before_save(&mut Broken).unwrap_err();
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("number"));
    }
}
