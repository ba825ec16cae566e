//! Record timestamps.
//!
//! A record type declares which timestamp fields it carries; before every
//! save the declaration is resolved into per-field policies and the record is
//! touched: unset fields are initialized, fields that update on save are
//! moved to the current time on persisted records, everything else is left
//! alone.
//!
//! ```ignore
//! let posts = Table::timestamped(kv, "posts", Declaration::On);
//! let row = posts.insert(json!({"title": "hello"}))?;
//! assert_eq!(row.get_str("updated_at"), row.get_str("created_at"));
//! ```

pub mod catalog;
pub mod declaration;
pub mod hook;
pub mod policy;
pub mod record;
pub mod resolve;
pub mod row;
pub mod table;
pub mod touch;

pub use catalog::Catalog;
pub use declaration::{Declaration, Entry};
pub use hook::{SaveHook, Timestamped, TouchHook};
pub use policy::{DefaultFn, TimestampConfig, TimestampPolicy, BUILTIN_FIELDS, CREATED_AT, UPDATED_AT};
pub use record::{is_set, Record};
pub use resolve::resolve;
pub use row::Row;
pub use table::Table;
pub use touch::{touch, touch_at, Stamp};
