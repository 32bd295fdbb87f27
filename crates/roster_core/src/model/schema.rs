//! Ordered table declarations and the SQL derived from them.
//!
//! # Responsibility
//! - Hold the one column ordering per entity table.
//! - Generate every statement shape (create, drop, select, insert, update,
//!   delete) from that ordering so codec and SQL cannot drift apart.
//!
//! # Invariants
//! - `id INTEGER PRIMARY KEY` is implicit and always the first column.
//! - `attributes` lists non-id columns in bind/decode order.

use rusqlite::types::FromSql;
use rusqlite::Row;

/// Name of the implicit identity column shared by every table.
pub const ID_COLUMN: &str = "id";

/// Storage class for a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
        }
    }
}

/// One non-id column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

impl Column {
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnType::Integer,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnType::Text,
        }
    }
}

/// Declared shape of one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub attributes: &'static [Column],
}

impl TableSchema {
    /// Returns whether `name` is `id` or one of the declared attributes.
    pub fn has_column(&self, name: &str) -> bool {
        name == ID_COLUMN || self.attributes.iter().any(|column| column.name == name)
    }

    /// Number of columns in a full row, id included.
    pub fn width(&self) -> usize {
        self.attributes.len() + 1
    }

    pub fn create_table_sql(&self) -> String {
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({ID_COLUMN} INTEGER PRIMARY KEY",
            self.table
        );
        for column in self.attributes {
            sql.push_str(&format!(", {} {}", column.name, column.kind.sql()));
        }
        sql.push_str(");");
        sql
    }

    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.table)
    }

    /// Comma separated full column list, optionally qualified by `alias`.
    pub fn select_columns(&self, alias: Option<&str>) -> String {
        let qualify = |name: &str| match alias {
            Some(alias) => format!("{alias}.{name}"),
            None => name.to_string(),
        };
        std::iter::once(qualify(ID_COLUMN))
            .chain(self.attributes.iter().map(|column| qualify(column.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn select_sql(&self) -> String {
        format!("SELECT {} FROM {}", self.select_columns(None), self.table)
    }

    /// Insert statement that hands back the assigned identity in the same
    /// statement.
    pub fn insert_sql(&self) -> String {
        if self.attributes.is_empty() {
            return format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {ID_COLUMN};",
                self.table
            );
        }

        let columns = self
            .attributes
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.attributes.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders}) RETURNING {ID_COLUMN};",
            self.table
        )
    }

    /// Update of every attribute; the id binds last.
    pub fn update_sql(&self) -> String {
        let assignments = if self.attributes.is_empty() {
            format!("{ID_COLUMN} = {ID_COLUMN}")
        } else {
            self.attributes
                .iter()
                .enumerate()
                .map(|(index, column)| format!("{} = ?{}", column.name, index + 1))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "UPDATE {} SET {assignments} WHERE {ID_COLUMN} = ?{};",
            self.table,
            self.attributes.len() + 1
        )
    }

    pub fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE {ID_COLUMN} = ?1;", self.table)
    }
}

/// Sequential reader over a result row in declared column order.
///
/// Codecs read `id` first and then each attribute in `TableSchema` order.
pub struct RowCursor<'a, 'stmt> {
    row: &'a Row<'stmt>,
    position: usize,
}

impl<'a, 'stmt> RowCursor<'a, 'stmt> {
    pub fn new(row: &'a Row<'stmt>) -> Self {
        Self { row, position: 0 }
    }

    /// Reads the column under the cursor and advances.
    pub fn read<T: FromSql>(&mut self) -> rusqlite::Result<T> {
        let value = self.row.get(self.position)?;
        self.position += 1;
        Ok(value)
    }

    /// Number of columns consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }
}
