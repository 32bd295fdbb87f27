//! Generic CRUD engine and schema lifecycle over SQLite.
//!
//! # Responsibility
//! - Create/drop an entity's table from its `TableSchema`.
//! - Insert, update, save, delete and find rows through the entity codec.
//!
//! # Invariants
//! - `insert` only accepts transient entities and assigns the id returned by
//!   the same statement (`INSERT ... RETURNING id`).
//! - `update` only accepts persisted entities; a vanished row is a no-op.
//! - Finder column names are checked against the schema before they reach SQL.
//! - Every decoded row consumes exactly `SCHEMA.width()` columns.

use crate::db::DbError;
use crate::model::entity::{Entity, EntityId, InvalidState, Lifecycle};
use crate::model::schema::RowCursor;
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Params, ToSql};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for entity persistence and relationship operations.
#[derive(Debug)]
pub enum RepoError {
    /// Engine failure during a read or write.
    Db(DbError),
    /// Engine rejected `create_table` / `drop_table`.
    Schema { table: &'static str, source: DbError },
    /// Operation called on an entity in the wrong lifecycle state.
    InvalidState(InvalidState),
    /// Finder asked for a column the table does not declare.
    UnknownColumn { table: &'static str, column: String },
    /// Codec and schema disagree on row shape.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Schema { table, source } => {
                write!(f, "schema change on table `{table}` failed: {source}")
            }
            Self::InvalidState(err) => write!(f, "{err}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "table `{table}` has no column `{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid row data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Schema { source, .. } => Some(source),
            Self::InvalidState(err) => Some(err),
            Self::UnknownColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<InvalidState> for RepoError {
    fn from(value: InvalidState) -> Self {
        warn!(
            "event=invalid_state module=repo status=rejected table={} operation={} found={}",
            value.table, value.operation, value.found
        );
        Self::InvalidState(value)
    }
}

/// Repository interface for one entity type.
pub trait EntityRepository<E: Entity> {
    /// Creates the backing table if it is absent.
    fn create_table(&self) -> RepoResult<()>;
    /// Drops the backing table if it is present.
    fn drop_table(&self) -> RepoResult<()>;
    /// Inserts a transient entity and assigns its id.
    fn insert(&self, entity: &mut E) -> RepoResult<EntityId>;
    /// Writes every attribute of a persisted entity.
    fn update(&self, entity: &E) -> RepoResult<()>;
    /// Removes the entity's row, consuming the in-memory value.
    fn delete(&self, entity: E) -> RepoResult<bool>;
    fn find(&self, id: EntityId) -> RepoResult<Option<E>>;
    /// First row whose `column` equals `value`, in store order.
    fn find_by(&self, column: &str, value: &dyn ToSql) -> RepoResult<Option<E>>;
    /// Every row whose `column` equals `value`, in store order.
    fn find_all_by(&self, column: &str, value: &dyn ToSql) -> RepoResult<Vec<E>>;
    fn all(&self) -> RepoResult<Vec<E>>;
    fn count(&self) -> RepoResult<u64>;

    /// Inserts transient entities and updates persisted ones.
    ///
    /// Returns the (possibly newly assigned) id, which never changes across
    /// repeated saves.
    fn save(&self, entity: &mut E) -> RepoResult<EntityId> {
        match entity.lifecycle() {
            Lifecycle::Transient => self.insert(entity),
            Lifecycle::Persisted(id) => {
                self.update(entity)?;
                Ok(id)
            }
        }
    }
}

/// SQLite-backed repository for any `Entity`.
pub struct SqliteEntityRepository<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteEntityRepository<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        E::SCHEMA.table
    }

    fn checked_values(entity: &E) -> RepoResult<Vec<Value>> {
        let values = entity.attribute_values();
        let expected = E::SCHEMA.attributes.len();
        if values.len() != expected {
            return Err(RepoError::InvalidData(format!(
                "codec for `{}` produced {} values for {expected} columns",
                Self::table(),
                values.len()
            )));
        }
        Ok(values)
    }

    fn checked_column(column: &str) -> RepoResult<()> {
        if E::SCHEMA.has_column(column) {
            return Ok(());
        }
        Err(RepoError::UnknownColumn {
            table: Self::table(),
            column: column.to_string(),
        })
    }

    fn query_entities(&self, sql: &str, params: impl Params) -> RepoResult<Vec<E>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(decode_row(row)?);
        }
        Ok(entities)
    }

    fn run_schema_change(&self, event: &str, sql: &str) -> RepoResult<()> {
        match self.conn.execute_batch(sql) {
            Ok(()) => {
                info!(
                    "event={event} module=repo status=ok table={}",
                    Self::table()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event={event} module=repo status=error table={} error={}",
                    Self::table(),
                    err
                );
                Err(RepoError::Schema {
                    table: Self::table(),
                    source: err.into(),
                })
            }
        }
    }
}

impl<E> Clone for SqliteEntityRepository<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for SqliteEntityRepository<'_, E> {}

impl<E: Entity> EntityRepository<E> for SqliteEntityRepository<'_, E> {
    fn create_table(&self) -> RepoResult<()> {
        self.run_schema_change("table_create", &E::SCHEMA.create_table_sql())
    }

    fn drop_table(&self) -> RepoResult<()> {
        self.run_schema_change("table_drop", &E::SCHEMA.drop_table_sql())
    }

    fn insert(&self, entity: &mut E) -> RepoResult<EntityId> {
        if let Lifecycle::Persisted(_) = entity.lifecycle() {
            return Err(InvalidState {
                table: Self::table(),
                operation: "insert",
                found: entity.lifecycle(),
            }
            .into());
        }

        let values = Self::checked_values(entity)?;
        let id: EntityId = self.conn.query_row(
            &E::SCHEMA.insert_sql(),
            params_from_iter(values),
            |row| row.get(0),
        )?;
        entity.set_id(id);

        debug!(
            "event=entity_insert module=repo status=ok table={} id={id}",
            Self::table()
        );
        Ok(id)
    }

    fn update(&self, entity: &E) -> RepoResult<()> {
        let id = entity.require_persisted("update")?;
        let mut values = Self::checked_values(entity)?;
        values.push(Value::Integer(id));

        let changed = self
            .conn
            .execute(&E::SCHEMA.update_sql(), params_from_iter(values))?;
        if changed == 0 {
            warn!(
                "event=entity_update module=repo status=noop table={} id={id}",
                Self::table()
            );
        } else {
            debug!(
                "event=entity_update module=repo status=ok table={} id={id}",
                Self::table()
            );
        }
        Ok(())
    }

    fn delete(&self, entity: E) -> RepoResult<bool> {
        let id = entity.require_persisted("delete")?;
        let changed = self.conn.execute(&E::SCHEMA.delete_sql(), [id])?;
        debug!(
            "event=entity_delete module=repo status=ok table={} id={id} removed={}",
            Self::table(),
            changed > 0
        );
        Ok(changed > 0)
    }

    fn find(&self, id: EntityId) -> RepoResult<Option<E>> {
        self.find_by("id", &id)
    }

    fn find_by(&self, column: &str, value: &dyn ToSql) -> RepoResult<Option<E>> {
        Self::checked_column(column)?;
        let sql = format!("{} WHERE {column} = ?1 LIMIT 1;", E::SCHEMA.select_sql());
        Ok(self.query_entities(&sql, [value])?.into_iter().next())
    }

    fn find_all_by(&self, column: &str, value: &dyn ToSql) -> RepoResult<Vec<E>> {
        Self::checked_column(column)?;
        let sql = format!("{} WHERE {column} = ?1;", E::SCHEMA.select_sql());
        self.query_entities(&sql, [value])
    }

    fn all(&self) -> RepoResult<Vec<E>> {
        self.query_entities(&format!("{};", E::SCHEMA.select_sql()), [])
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", Self::table()),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

/// Decodes one full row through the entity codec.
///
/// # Errors
/// - `InvalidData` when the codec consumed a different number of columns
///   than the schema declares.
pub(crate) fn decode_row<E: Entity>(row: &rusqlite::Row<'_>) -> RepoResult<E> {
    let mut cursor = RowCursor::new(row);
    let entity = E::from_row(&mut cursor)?;
    if cursor.position() != E::SCHEMA.width() {
        return Err(RepoError::InvalidData(format!(
            "codec for `{}` read {} of {} columns",
            E::SCHEMA.table,
            cursor.position(),
            E::SCHEMA.width()
        )));
    }
    Ok(entity)
}
