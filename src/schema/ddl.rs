//! SQLite DDL rendering for a [`Schema`].
//!
//! Every statement is idempotent (`IF NOT EXISTS`) so the rendered script can
//! be replayed against an already-migrated database.

use super::{ColumnDef, ColumnDefault, Schema, TableDef, NOW_MS_SQL};

impl Schema {
    /// Render the schema as an ordered list of statements.
    ///
    /// Tables come first (in declaration order), then each table's indexes
    /// and triggers.
    pub fn to_sql(&self) -> Vec<String> {
        let mut statements: Vec<String> = self.tables.iter().map(create_table).collect();
        for table in &self.tables {
            statements.extend(create_indexes(table));
            statements.extend(create_touch_triggers(table));
        }
        statements
    }
}

fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", column.name, column.ty.sql_type());
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    match &column.default {
        Some(ColumnDefault::Integer(value)) => sql.push_str(&format!(" DEFAULT {}", value)),
        Some(ColumnDefault::Text(value)) => {
            sql.push_str(&format!(" DEFAULT {}", quote_text(value)))
        }
        Some(ColumnDefault::Now) => sql.push_str(&format!(" DEFAULT ({})", NOW_MS_SQL)),
        None => {}
    }
    sql
}

fn create_table(table: &TableDef) -> String {
    let mut lines: Vec<String> = table.columns.iter().map(column_sql).collect();

    for check in &table.checks {
        lines.push(format!("CONSTRAINT {} CHECK ({})", check.name, check.expr));
    }
    for fk in &table.foreign_keys {
        lines.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            fk.column,
            fk.references_table,
            fk.references_column,
            fk.on_delete.sql()
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table.name,
        lines.join(",\n    ")
    )
}

fn create_indexes(table: &TableDef) -> Vec<String> {
    let unique = table.unique_indexes.iter().map(|index| {
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            index.name,
            table.name,
            index.columns.join(", ")
        )
    });

    // SQLite does not index foreign key columns on its own.
    let lookups = table.foreign_keys.iter().map(|fk| {
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{}_{} ON {} ({})",
            table.name, fk.column, table.name, fk.column
        )
    });

    unique.chain(lookups).collect()
}

fn create_touch_triggers(table: &TableDef) -> Vec<String> {
    let Some(pk) = table.primary_key() else {
        return Vec::new();
    };

    table
        .touch_on_update
        .iter()
        .map(|column| {
            format!(
                "CREATE TRIGGER IF NOT EXISTS trg_{table}_touch_{column}\n\
                 AFTER UPDATE ON {table}\n\
                 FOR EACH ROW WHEN NEW.{column} = OLD.{column}\n\
                 BEGIN\n    \
                 UPDATE {table} SET {column} = {now} WHERE {pk} = NEW.{pk};\n\
                 END",
                table = table.name,
                column = column,
                now = NOW_MS_SQL,
                pk = pk.name,
            )
        })
        .collect()
}
