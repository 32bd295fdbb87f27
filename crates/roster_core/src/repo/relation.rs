//! Declarative relationship descriptors and their resolver.
//!
//! # Responsibility
//! - Describe belongs-to, has-many and has-many-through links once, as
//!   constants next to the owning entity.
//! - Materialize associated entities by composing repository calls and the
//!   three-table join.
//!
//! # Invariants
//! - Belongs-to reads are memoized in the owner's `Reference`; writes set
//!   key and cache in one step.
//! - Has-many and has-many-through reads always hit storage.
//! - Join rows are only written for persisted participants.

use crate::model::entity::{Entity, EntityId, Reference};
use crate::model::schema::ID_COLUMN;
use crate::repo::entity_repo::{
    decode_row, EntityRepository, RepoResult, SqliteEntityRepository,
};
use log::debug;
use rusqlite::{params, Connection};

/// `O.<foreign_key>` references one `T`.
pub struct BelongsTo<O, T> {
    pub foreign_key: &'static str,
    slot: fn(&O) -> &Reference<T>,
    slot_mut: fn(&mut O) -> &mut Reference<T>,
}

impl<O, T> BelongsTo<O, T> {
    pub const fn new(
        foreign_key: &'static str,
        slot: fn(&O) -> &Reference<T>,
        slot_mut: fn(&mut O) -> &mut Reference<T>,
    ) -> Self {
        Self {
            foreign_key,
            slot,
            slot_mut,
        }
    }

    pub fn key(&self, owner: &O) -> Option<EntityId> {
        (self.slot)(owner).key()
    }

    /// Unlinks the owner in memory; persist with `save`.
    pub fn clear(&self, owner: &mut O) {
        (self.slot_mut)(owner).clear();
    }
}

impl<O, T: Entity> BelongsTo<O, T> {
    /// Returns the referenced entity, looking it up on first access only.
    pub fn get<'o>(&self, conn: &Connection, owner: &'o O) -> RepoResult<Option<&'o T>> {
        (self.slot)(owner).resolve_with(|id| {
            debug!(
                "event=belongs_to_load module=relation status=start table={} id={id}",
                T::SCHEMA.table
            );
            SqliteEntityRepository::<T>::new(conn).find(id)
        })
    }
}

impl<O, T: Entity + Clone> BelongsTo<O, T> {
    /// Points the owner at `target` in memory; persist with `save`.
    ///
    /// # Errors
    /// - `InvalidState` when `target` is transient.
    pub fn set(&self, owner: &mut O, target: &T) -> RepoResult<()> {
        (self.slot_mut)(owner).set(target)?;
        Ok(())
    }
}

impl<O, T> Clone for BelongsTo<O, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, T> Copy for BelongsTo<O, T> {}

/// `T` rows whose foreign key points at one `O`; the inverse of a belongs-to.
pub struct HasMany<O, T> {
    inverse: BelongsTo<T, O>,
}

impl<O, T> HasMany<O, T> {
    pub const fn new(inverse: BelongsTo<T, O>) -> Self {
        Self { inverse }
    }

    pub fn foreign_key(&self) -> &'static str {
        self.inverse.foreign_key
    }
}

impl<O: Entity + Clone, T: Entity> HasMany<O, T> {
    /// Current rows referencing `owner`. A transient owner has none.
    pub fn get(&self, conn: &Connection, owner: &O) -> RepoResult<Vec<T>> {
        let Some(owner_id) = owner.id() else {
            return Ok(Vec::new());
        };
        SqliteEntityRepository::<T>::new(conn).find_all_by(self.inverse.foreign_key, &owner_id)
    }

    /// Links `child` to `owner` and persists both.
    ///
    /// A transient owner is inserted first so the child's single write
    /// already carries the owner id; a persisted owner is saved afterwards.
    pub fn add(&self, conn: &Connection, owner: &mut O, child: &mut T) -> RepoResult<()> {
        let owners = SqliteEntityRepository::<O>::new(conn);
        let owner_was_persisted = owner.is_persisted();
        if !owner_was_persisted {
            owners.insert(owner)?;
        }

        self.inverse.set(child, owner)?;
        let child_id = SqliteEntityRepository::<T>::new(conn).save(child)?;

        if owner_was_persisted {
            owners.update(owner)?;
        }

        debug!(
            "event=has_many_add module=relation status=ok owner_table={} child_table={} child_id={child_id}",
            O::SCHEMA.table,
            T::SCHEMA.table
        );
        Ok(())
    }
}

impl<O, T> Clone for HasMany<O, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, T> Copy for HasMany<O, T> {}

/// `T` rows reached from `O` through join rows `J`.
pub struct HasManyThrough<O, J, T> {
    through: HasMany<O, J>,
    target: BelongsTo<J, T>,
}

impl<O, J, T> HasManyThrough<O, J, T> {
    pub const fn new(through: HasMany<O, J>, target: BelongsTo<J, T>) -> Self {
        Self { through, target }
    }
}

impl<O, J, T> HasManyThrough<O, J, T>
where
    O: Entity + Clone,
    J: Entity + Default,
    T: Entity + Clone,
{
    /// Targets joined to `owner`, one per join row (duplicates preserved).
    pub fn get(&self, conn: &Connection, owner: &O) -> RepoResult<Vec<T>> {
        let Some(owner_id) = owner.id() else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT {columns}
             FROM {target} t, {join} j, {owner} o
             WHERE t.{ID_COLUMN} = j.{target_key}
               AND j.{owner_key} = o.{ID_COLUMN}
               AND o.{ID_COLUMN} = ?1;",
            columns = T::SCHEMA.select_columns(Some("t")),
            target = T::SCHEMA.table,
            join = J::SCHEMA.table,
            owner = O::SCHEMA.table,
            target_key = self.target.foreign_key,
            owner_key = self.through.foreign_key(),
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([owner_id])?;
        let mut targets = Vec::new();
        while let Some(row) = rows.next()? {
            targets.push(decode_row(row)?);
        }
        Ok(targets)
    }

    /// Inserts one join row linking `owner` and `target`.
    ///
    /// # Errors
    /// - `InvalidState` when either participant is transient; nothing is
    ///   written in that case.
    pub fn add(&self, conn: &Connection, owner: &O, target: &T) -> RepoResult<J> {
        owner.require_persisted("associate")?;
        target.require_persisted("associate")?;

        let mut link = J::default();
        self.through.inverse.set(&mut link, owner)?;
        self.target.set(&mut link, target)?;
        let link_id = SqliteEntityRepository::<J>::new(conn).insert(&mut link)?;

        debug!(
            "event=association_add module=relation status=ok join_table={} id={link_id}",
            J::SCHEMA.table
        );
        Ok(link)
    }

    /// Deletes every join row linking `owner` and `target`.
    ///
    /// Returns how many rows were removed.
    pub fn remove(&self, conn: &Connection, owner: &O, target: &T) -> RepoResult<usize> {
        let owner_id = owner.require_persisted("dissociate")?;
        let target_id = target.require_persisted("dissociate")?;

        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2;",
                J::SCHEMA.table,
                self.through.foreign_key(),
                self.target.foreign_key
            ),
            params![owner_id, target_id],
        )?;

        debug!(
            "event=association_remove module=relation status=ok join_table={} removed={removed}",
            J::SCHEMA.table
        );
        Ok(removed)
    }
}

impl<O, J, T> Clone for HasManyThrough<O, J, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, J, T> Copy for HasManyThrough<O, J, T> {}
