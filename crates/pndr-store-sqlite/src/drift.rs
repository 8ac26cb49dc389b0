//! Comparison of a live store against the schema catalog.
//!
//! A store file may predate the catalog or have been produced by another
//! tool. Drift does not stop the server, but every entry is worth a warning:
//! the translator will write queries against columns the store may not have.

use std::fmt;

use pndr_core::catalog::{SchemaCatalog, eq_ident};

use crate::{Result, SqliteExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDrift {
  MissingTable { table: String },
  MissingColumn { table: String, column: String },
  /// A column the store has but the catalog does not describe.
  ExtraColumn { table: String, column: String },
  TypeMismatch { table: String, column: String, expected: String, found: String },
}

impl fmt::Display for SchemaDrift {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingTable { table } => write!(f, "table {table} is missing"),
      Self::MissingColumn { table, column } => {
        write!(f, "column {table}.{column} is missing")
      }
      Self::ExtraColumn { table, column } => {
        write!(f, "column {table}.{column} is not in the catalog")
      }
      Self::TypeMismatch { table, column, expected, found } => write!(
        f,
        "column {table}.{column} has type {found}, catalog says {expected}"
      ),
    }
  }
}

impl SqliteExecutor {
  /// Every difference between the store's tables and `catalog`. Empty when
  /// they agree.
  pub async fn schema_drift(&self, catalog: &SchemaCatalog) -> Result<Vec<SchemaDrift>> {
    let names: Vec<&'static str> = catalog.tables().iter().map(|t| t.name).collect();

    let conn = self.connect().await?;
    let live: Vec<Vec<(String, String)>> = conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
          let columns = stmt
            .query_map([name], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
          tables.push(columns);
        }
        Ok(tables)
      })
      .await?;
    conn.close().await?;

    let mut drift = Vec::new();
    for (table, columns) in catalog.tables().iter().zip(live) {
      if columns.is_empty() {
        drift.push(SchemaDrift::MissingTable { table: table.name.to_owned() });
        continue;
      }

      for expected in table.columns {
        match columns.iter().find(|(name, _)| eq_ident(name, expected.name)) {
          None => drift.push(SchemaDrift::MissingColumn {
            table:  table.name.to_owned(),
            column: expected.name.to_owned(),
          }),
          Some((_, found)) if !eq_ident(found, expected.sql_type) => {
            drift.push(SchemaDrift::TypeMismatch {
              table:    table.name.to_owned(),
              column:   expected.name.to_owned(),
              expected: expected.sql_type.to_owned(),
              found:    found.clone(),
            })
          }
          Some(_) => {}
        }
      }

      for (name, _) in &columns {
        if table.column(name).is_none() {
          drift.push(SchemaDrift::ExtraColumn {
            table:  table.name.to_owned(),
            column: name.clone(),
          });
        }
      }
    }
    Ok(drift)
  }
}
