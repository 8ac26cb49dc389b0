//! SQL schema for the PNDR SQLite store.
//!
//! The table DDL comes from the catalog; this module only adds what the
//! catalog does not describe. Executed once when a store is opened for
//! writing, gated on `PRAGMA user_version`.

use pndr_core::catalog::{OBSERVATION_TABLE, SchemaCatalog};

pub const SCHEMA_VERSION: i64 = 1;

/// Serves the latest-per-pair subquery and indicator-name filters.
const OBSERVATION_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS valoresmeta_pair_idx ON valoresmeta(geoloc_id, data_name, refdate);
CREATE INDEX IF NOT EXISTS valoresmeta_name_idx ON valoresmeta(data_name);
";

/// Full schema script; idempotent thanks to `IF NOT EXISTS`.
pub fn schema(catalog: &SchemaCatalog) -> String {
  let mut script = catalog.ddl();
  if catalog.table(OBSERVATION_TABLE).is_some() {
    script.push_str(OBSERVATION_INDEXES);
  }
  script.push_str(&format!("PRAGMA user_version = {SCHEMA_VERSION};\n"));
  script
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn schema_includes_tables_indexes_and_version() {
    let script = schema(&SchemaCatalog::pndr());
    assert!(script.contains("CREATE TABLE IF NOT EXISTS valoresmeta"));
    assert!(script.contains("valoresmeta_pair_idx"));
    assert!(script.trim_end().ends_with("PRAGMA user_version = 1;"));
  }
}
