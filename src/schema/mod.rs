//! Declarative schema model.
//!
//! This module provides:
//! - A small model-building API (`TableDef`, `ColumnDef`, `ForeignKey`, ...)
//! - Structural validation of a model before it touches a database
//! - DDL rendering for SQLite (see `ddl`)
//! - The library model itself (see `library`)
//!
//! The model is pure data: it never executes anything. Constraint violations
//! at runtime are raised by SQLite and surfaced unmodified by `sqlx`.

pub mod ddl;
pub mod library;

pub use library::library_schema;

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// SQL expression for "now" in milliseconds since Unix epoch.
///
/// Used for every database-generated timestamp.
pub const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

/// Logical column type and its SQLite storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Text,
    /// Canonical decimal string.
    Decimal,
    /// 0 or 1.
    Boolean,
    /// Milliseconds since Unix epoch.
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean | ColumnType::Timestamp => "INTEGER",
            ColumnType::Text | ColumnType::Decimal => "TEXT",
        }
    }
}

/// Column default evaluated by the database on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
    Integer(i64),
    Text(String),
    /// Insert time, see [`NOW_MS_SQL`].
    Now,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    fn new(name: &str, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: false,
            primary_key: false,
            default: None,
        }
    }

    /// Integer surrogate key (SQLite rowid alias).
    pub fn id(name: &str) -> Self {
        Self::new(name, ColumnType::Integer).primary_key()
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn decimal(name: &str) -> Self {
        Self::new(name, ColumnType::Decimal)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_int(mut self, value: i64) -> Self {
        self.default = Some(ColumnDefault::Integer(value));
        self
    }

    pub fn default_text(mut self, value: &str) -> Self {
        self.default = Some(ColumnDefault::Text(value.to_string()));
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = Some(ColumnDefault::Now);
        self
    }
}

/// What happens to a child row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteRule {
    /// Parent delete fails while children exist.
    ///
    /// Rendered as `NO ACTION`: with immediate foreign key checks SQLite then
    /// reports a foreign key violation rather than a trigger abort.
    Restrict,
    /// Children are deleted with the parent.
    Cascade,
    /// Child column is cleared.
    SetNull,
}

impl DeleteRule {
    pub fn sql(&self) -> &'static str {
        match self {
            DeleteRule::Restrict => "NO ACTION",
            DeleteRule::Cascade => "CASCADE",
            DeleteRule::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    pub on_delete: DeleteRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckConstraint {
    pub name: String,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueIndex {
    pub name: String,
    pub columns: Vec<String>,
}

/// One mapped table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKey>,
    pub checks: Vec<CheckConstraint>,
    pub unique_indexes: Vec<UniqueIndex>,
    /// Columns reset to "now" by trigger whenever a row is updated.
    pub touch_on_update: Vec<String>,
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            unique_indexes: Vec::new(),
            touch_on_update: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn references(
        mut self,
        column: &str,
        table: &str,
        table_column: &str,
        on_delete: DeleteRule,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            references_table: table.to_string(),
            references_column: table_column.to_string(),
            on_delete,
        });
        self
    }

    pub fn check(mut self, name: &str, expr: &str) -> Self {
        self.checks.push(CheckConstraint {
            name: name.to_string(),
            expr: expr.to_string(),
        });
        self
    }

    pub fn unique(mut self, name: &str, columns: &[&str]) -> Self {
        self.unique_indexes.push(UniqueIndex {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn touch_on_update(mut self, column: &str) -> Self {
        self.touch_on_update.push(column.to_string());
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("table {0} is declared twice")]
    DuplicateTable(String),
    #[error("column {table}.{column} is declared twice")]
    DuplicateColumn { table: String, column: String },
    #[error("table {0} must have exactly one primary key column")]
    PrimaryKey(String),
    #[error("table {table} refers to unknown column {column}")]
    UnknownColumn { table: String, column: String },
    #[error("{table}.{column} references {target}, which is not declared before it")]
    UnknownReference {
        table: String,
        column: String,
        target: String,
    },
    #[error("{table}.{column} references unknown column {target}.{target_column}")]
    UnknownReferencedColumn {
        table: String,
        column: String,
        target: String,
        target_column: String,
    },
    #[error("{table}.{column} is NOT NULL but its foreign key is ON DELETE SET NULL")]
    SetNullOnRequiredColumn { table: String, column: String },
}

/// An ordered set of tables. Parents are declared before their children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub tables: Vec<TableDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables holding a foreign key into `table`, with the key itself.
    pub fn dependents<'a>(&'a self, table: &'a str) -> impl Iterator<Item = (&'a TableDef, &'a ForeignKey)> {
        self.tables.iter().flat_map(move |t| {
            t.foreign_keys
                .iter()
                .filter(move |fk| fk.references_table == table)
                .map(move |fk| (t, fk))
        })
    }

    /// Check the model is internally consistent.
    ///
    /// # Errors
    /// Returns the first structural problem found, in declaration order.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut declared: HashSet<&str> = HashSet::new();

        for table in &self.tables {
            if !declared.insert(table.name.as_str()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }

            let mut columns: HashSet<&str> = HashSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(SchemaError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }

            if table.columns.iter().filter(|c| c.primary_key).count() != 1 {
                return Err(SchemaError::PrimaryKey(table.name.clone()));
            }

            let unknown = |column: &str| SchemaError::UnknownColumn {
                table: table.name.clone(),
                column: column.to_string(),
            };

            for fk in &table.foreign_keys {
                let Some(column) = table.get_column(&fk.column) else {
                    return Err(unknown(fk.column.as_str()));
                };

                // Self references are fine; anything else must already be declared.
                let target = if fk.references_table == table.name {
                    Some(table)
                } else if declared.contains(fk.references_table.as_str()) {
                    self.get_table(&fk.references_table)
                } else {
                    None
                };
                let Some(target) = target else {
                    return Err(SchemaError::UnknownReference {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        target: fk.references_table.clone(),
                    });
                };

                if target.get_column(&fk.references_column).is_none() {
                    return Err(SchemaError::UnknownReferencedColumn {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        target: fk.references_table.clone(),
                        target_column: fk.references_column.clone(),
                    });
                }

                if fk.on_delete == DeleteRule::SetNull && !column.nullable {
                    return Err(SchemaError::SetNullOnRequiredColumn {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                    });
                }
            }

            for index in &table.unique_indexes {
                if let Some(missing) = index.columns.iter().find(|c| !columns.contains(c.as_str())) {
                    return Err(unknown(missing.as_str()));
                }
            }

            if let Some(missing) = table
                .touch_on_update
                .iter()
                .find(|c| !columns.contains(c.as_str()))
            {
                return Err(unknown(missing.as_str()));
            }
        }

        Ok(())
    }
}
