//! Automatic schema synchronization
//!
//! Catalog databases written by older bot versions may lack columns that were
//! added later (for example `tracks.artist_id`). Each table declares the
//! columns it expects; on startup missing ones are added with
//! `ALTER TABLE ... ADD COLUMN`.
//!
//! Only additions are automatic. Type or constraint drift is reported and
//! left to a versioned migration.
//!
//! ```rust,ignore
//! pub struct TracksTableSchema;
//!
//! impl TableSchema for TracksTableSchema {
//!     fn table_name() -> &'static str { "tracks" }
//!     fn expected_columns() -> Vec<ColumnDefinition> {
//!         vec![ColumnDefinition::new("storage_message_id", "INTEGER")]
//!     }
//! }
//!
//! SchemaSync::sync_table::<TracksTableSchema>(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Expected column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type ("TEXT", "INTEGER", "TIMESTAMP", ...)
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// SQL literal used as DEFAULT, e.g. `"0"` or `"CURRENT_TIMESTAMP"`
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub pk: bool,
}

/// Difference between declared and actual schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Column missing from database (auto-fixed)
    MissingColumn { table: String, column: ColumnDefinition },
    /// Declared and actual type have different affinity (reported only)
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
}

/// Declared schema for one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Read the actual columns of a table, ordered by position
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<ActualColumn> = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i32, _>("notnull") != 0,
            pk: row.get::<i32, _>("pk") != 0,
        })
        .collect();

    columns.sort_by_key(|c| c.cid);
    Ok(columns)
}

/// Check if a table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Compare declared columns against the database
pub fn detect_drift(
    table_name: &str,
    expected: &[ColumnDefinition],
    actual: &[ActualColumn],
) -> Vec<SchemaDrift> {
    expected
        .iter()
        .filter_map(|col| match actual.iter().find(|a| a.name == col.name) {
            None => Some(SchemaDrift::MissingColumn {
                table: table_name.to_string(),
                column: col.clone(),
            }),
            Some(a) if !same_affinity(&col.sql_type, &a.type_name) => {
                Some(SchemaDrift::TypeMismatch {
                    table: table_name.to_string(),
                    column: col.name.clone(),
                    expected: col.sql_type.clone(),
                    actual: a.type_name.clone(),
                })
            }
            Some(_) => None,
        })
        .collect()
}

/// SQLite type affinity comparison
fn same_affinity(expected: &str, actual: &str) -> bool {
    fn affinity(t: &str) -> &'static str {
        let t = t.to_uppercase();
        if t.contains("INT") {
            "INTEGER"
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            "TEXT"
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            "REAL"
        } else if t.is_empty() || t.contains("BLOB") {
            "BLOB"
        } else {
            "NUMERIC"
        }
    }
    affinity(expected) == affinity(actual)
}

/// Applies declared schemas to the database
pub struct SchemaSync;

impl SchemaSync {
    /// Add missing columns to one table; report drift that needs a migration
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
        let table_name = T::table_name();

        if !table_exists(pool, table_name).await? {
            warn!(table = table_name, "Schema sync skipped: table does not exist");
            return Ok(());
        }

        let actual = introspect_table(pool, table_name).await?;
        let drift = detect_drift(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            debug!(table = table_name, "Schema up to date");
            return Ok(());
        }

        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                }
                SchemaDrift::TypeMismatch {
                    table,
                    column,
                    expected,
                    actual,
                } => {
                    warn!(
                        "Type mismatch in {}.{}: expected '{}', found '{}'. Manual migration required.",
                        table, column, expected, actual
                    );
                }
            }
        }

        Ok(())
    }

    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column.name, column.sql_type
        );

        if column.primary_key {
            warn!(
                "Cannot add PRIMARY KEY column {}.{} via ALTER TABLE; adding it as a plain column",
                table, column.name
            );
        }

        match (&column.default_value, column.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => warn!(
                "Cannot add NOT NULL column {}.{} without DEFAULT; adding it as nullable",
                table, column.name
            ),
            (None, false) => {}
        }

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => {
                info!("Added column {}.{} ({})", table, column.name, column.sql_type);
                Ok(())
            }
            // Another connection added it first
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
