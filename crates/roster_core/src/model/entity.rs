//! Persistence capability shared by every mapped type.
//!
//! # Responsibility
//! - Define the row codec contract (`from_row` / `attribute_values`).
//! - Model the transient/persisted lifecycle explicitly.
//! - Hold belongs-to slots whose key and memoized target change together.
//!
//! # Invariants
//! - `id() == None` means transient; `Some(id)` means bound to one row.
//! - `attribute_values` yields exactly `SCHEMA.attributes.len()` values in
//!   declared order.
//! - A `Reference` never caches a target whose id differs from its key.

use crate::model::schema::{RowCursor, TableSchema};
use once_cell::unsync::OnceCell;
use rusqlite::types::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Store-assigned row identity.
pub type EntityId = i64;

/// Lifecycle state derived from the identity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Exists only in memory.
    Transient,
    /// Bound to exactly one row with this id.
    Persisted(EntityId),
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Persisted(id) => write!(f, "persisted(id={id})"),
        }
    }
}

/// Operation attempted on an entity in the wrong lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidState {
    pub table: &'static str,
    pub operation: &'static str,
    pub found: Lifecycle,
}

impl Display for InvalidState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot {} `{}` entity while it is {}",
            self.operation, self.table, self.found
        )
    }
}

impl Error for InvalidState {}

/// A type persisted as one row of `SCHEMA.table`.
pub trait Entity: Sized {
    /// Single ordered column declaration for this type.
    const SCHEMA: TableSchema;

    fn id(&self) -> Option<EntityId>;

    /// Binds the value to a stored row. Only repositories call this.
    fn set_id(&mut self, id: EntityId);

    /// Decodes `id` followed by every attribute in declared order.
    fn from_row(cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self>;

    /// Encodes non-id attributes in declared order for insert/update binds.
    fn attribute_values(&self) -> Vec<Value>;

    fn lifecycle(&self) -> Lifecycle {
        match self.id() {
            Some(id) => Lifecycle::Persisted(id),
            None => Lifecycle::Transient,
        }
    }

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    /// Returns the id, or an `InvalidState` naming `operation` when transient.
    fn require_persisted(&self, operation: &'static str) -> Result<EntityId, InvalidState> {
        self.id().ok_or(InvalidState {
            table: Self::SCHEMA.table,
            operation,
            found: Lifecycle::Transient,
        })
    }
}

/// Belongs-to slot: a nullable foreign key plus the memoized target row.
///
/// The cell is `!Sync`; an owner shared across threads must be wrapped by
/// the caller.
pub struct Reference<T> {
    key: Option<EntityId>,
    cached: OnceCell<T>,
}

impl<T> Reference<T> {
    pub const fn empty() -> Self {
        Self {
            key: None,
            cached: OnceCell::new(),
        }
    }

    /// Slot holding only a key, as decoded from a row.
    pub const fn from_key(key: Option<EntityId>) -> Self {
        Self {
            key,
            cached: OnceCell::new(),
        }
    }

    pub fn key(&self) -> Option<EntityId> {
        self.key
    }

    /// Memoized target, without touching storage.
    pub fn cached(&self) -> Option<&T> {
        self.cached.get()
    }

    /// Replaces the foreign key. A cache for a different key is discarded.
    pub fn set_key(&mut self, key: Option<EntityId>) {
        if self.key != key {
            self.cached = OnceCell::new();
        }
        self.key = key;
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.cached = OnceCell::new();
    }

    /// Returns the memoized target, loading it through `load` on first use.
    ///
    /// A missing key or a lookup that finds nothing yields `None` and leaves
    /// the cache empty, so a later call retries.
    pub fn resolve_with<E>(
        &self,
        load: impl FnOnce(EntityId) -> Result<Option<T>, E>,
    ) -> Result<Option<&T>, E> {
        if let Some(target) = self.cached.get() {
            return Ok(Some(target));
        }
        let Some(key) = self.key else {
            return Ok(None);
        };
        match load(key)? {
            Some(target) => Ok(Some(self.cached.get_or_init(|| target))),
            None => Ok(None),
        }
    }
}

impl<T: Entity + Clone> Reference<T> {
    /// Points this slot at `target`, updating key and cache as one step.
    ///
    /// # Errors
    /// - `InvalidState` when `target` has no id yet.
    pub fn set(&mut self, target: &T) -> Result<(), InvalidState> {
        let id = target.require_persisted("reference")?;
        self.key = Some(id);
        self.cached = OnceCell::with_value(target.clone());
        Ok(())
    }
}

impl<T> Default for Reference<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            cached: self.cached.clone(),
        }
    }
}

impl<T: Debug> Debug for Reference<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reference")
            .field("key", &self.key)
            .field("cached", &self.cached.get().is_some())
            .finish()
    }
}

/// Equality is by key; the cache is a read-through copy of that row.
impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Reference<T> {}

impl<T> Serialize for Reference<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.key.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Reference<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<EntityId>::deserialize(deserializer).map(Self::from_key)
    }
}
