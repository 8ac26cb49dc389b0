//! The schema catalog: the static description of the queryable universe.
//!
//! Both the translator's grounding text ([`SchemaCatalog::describe`]) and the
//! store's DDL ([`SchemaCatalog::ddl`]) are rendered from the same table
//! definitions, so what the model is told and what the store holds cannot
//! diverge. Stores are still checked at startup for drift against the catalog
//! (a pre-populated file may predate it).

use std::fmt::Write as _;

// ─── Definitions ─────────────────────────────────────────────────────────────

/// A single column of a catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
  pub name:     &'static str,
  /// Declared SQL type, exactly as it appears in the store.
  pub sql_type: &'static str,
  pub key:      bool,
}

const fn col(name: &'static str, sql_type: &'static str) -> ColumnDef {
  ColumnDef { name, sql_type, key: false }
}

const fn key(name: &'static str, sql_type: &'static str) -> ColumnDef {
  ColumnDef { name, sql_type, key: true }
}

/// A queryable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
  pub name:    &'static str,
  pub columns: &'static [ColumnDef],
}

impl TableDef {
  pub fn column(&self, name: &str) -> Option<&ColumnDef> {
    self.columns.iter().find(|c| eq_ident(c.name, name))
  }
}

/// A join relationship between two catalog columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
  pub from_table:  &'static str,
  pub from_column: &'static str,
  pub to_table:    &'static str,
  pub to_column:   &'static str,
}

/// A question paired with the query that answers it. Shown to the
/// translator as a few-shot example and replayed against fixtures in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedExample {
  pub question: &'static str,
  pub query:    &'static str,
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SchemaCatalog {
  tables:    &'static [TableDef],
  relations: &'static [Relation],
  examples:  &'static [WorkedExample],
}

impl SchemaCatalog {
  pub const fn new(
    tables: &'static [TableDef],
    relations: &'static [Relation],
    examples: &'static [WorkedExample],
  ) -> Self {
    Self { tables, relations, examples }
  }

  /// The PNDR catalog: `recortes_geograficos` and `valoresmeta`.
  pub const fn pndr() -> Self { Self::new(TABLES, RELATIONS, EXAMPLES) }

  pub fn tables(&self) -> &'static [TableDef] { self.tables }

  pub fn relations(&self) -> &'static [Relation] { self.relations }

  pub fn examples(&self) -> &'static [WorkedExample] { self.examples }

  /// Case-insensitive table lookup.
  pub fn table(&self, name: &str) -> Option<&'static TableDef> {
    self.tables.iter().find(|t| eq_ident(t.name, name))
  }

  /// Whether any catalog table has a column called `name`.
  pub fn has_column(&self, name: &str) -> bool {
    self.tables.iter().any(|t| t.column(name).is_some())
  }

  /// The human-readable grounding block handed to the translator verbatim.
  pub fn describe(&self) -> String {
    let mut out = String::from("Tabelas e suas colunas:\n\n");
    for table in self.tables {
      let cols: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect();
      let _ = writeln!(out, "{}({})", table.name, cols.join(", "));
    }
    out.push_str("\nRelações entre as tabelas (Chaves Estrangeiras):\n\n");
    for rel in self.relations {
      let _ = writeln!(
        out,
        "{}.{} -> {}.{}",
        rel.from_table, rel.from_column, rel.to_table, rel.to_column
      );
    }
    out
  }

  /// `CREATE TABLE IF NOT EXISTS` statements for every catalog table.
  ///
  /// No foreign-key constraint is declared: observations whose location has
  /// no geographic record must remain loadable.
  pub fn ddl(&self) -> String {
    let mut out = String::new();
    for table in self.tables {
      let cols: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
          let pk = if c.key { " PRIMARY KEY" } else { "" };
          format!("    \"{}\" {}{pk}", c.name, c.sql_type)
        })
        .collect();
      let _ = writeln!(
        out,
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        table.name,
        cols.join(",\n")
      );
    }
    out
  }
}

impl Default for SchemaCatalog {
  fn default() -> Self { Self::pndr() }
}

/// SQL identifiers compare case-insensitively (including non-ASCII letters
/// such as the accented column names).
pub fn eq_ident(a: &str, b: &str) -> bool {
  a == b || a.to_lowercase() == b.to_lowercase()
}

// ─── PNDR tables ─────────────────────────────────────────────────────────────

pub const GEO_TABLE: &str = "recortes_geograficos";
pub const OBSERVATION_TABLE: &str = "valoresmeta";

const TABLES: &[TableDef] = &[
  TableDef {
    name:    GEO_TABLE,
    columns: &[
      key("codigo_ibge", "BIGINT"),
      col("município", "VARCHAR"),
      col("estado", "VARCHAR"),
      col("região", "VARCHAR"),
      col("faixa_de_fronteira", "INTEGER"),
      col("participacao_semiarido", "VARCHAR"),
      col("regiao_intermediaria", "VARCHAR"),
      col("tipologia", "VARCHAR"),
      col("participacao_sudene", "VARCHAR"),
      col("regiao_imediata", "VARCHAR"),
      col("participacao_amazonia_legal", "VARCHAR"),
      col("longitude", "DOUBLE"),
      col("latitude", "DOUBLE"),
      col("geometry", "VARCHAR"),
    ],
  },
  TableDef {
    name:    OBSERVATION_TABLE,
    columns: &[
      key("id", "BIGINT"),
      col("mdata_id", "BIGINT"),
      col("geoloc_id", "BIGINT"),
      col("local_id", "BIGINT"),
      col("refdate", "TIMESTAMP"),
      col("value", "DOUBLE"),
      col("orig_name", "VARCHAR"),
      col("data_name", "VARCHAR"),
      col("local_name", "VARCHAR"),
    ],
  },
];

const RELATIONS: &[Relation] = &[Relation {
  from_table:  GEO_TABLE,
  from_column: "codigo_ibge",
  to_table:    OBSERVATION_TABLE,
  to_column:   "geoloc_id",
}];

// ─── Worked examples ─────────────────────────────────────────────────────────

const EXAMPLES: &[WorkedExample] = &[
  WorkedExample {
    question: "Retornar a lista de todos os municípios com código IBGE e todos os recortes geográficos e administrativos",
    query:    "SELECT * FROM recortes_geograficos",
  },
  WorkedExample {
    question: "Retornar a lista dos municípios com o indicador Diferencial Salarial Médio Feminino para 2021",
    query:    "SELECT
    r.codigo_ibge,
    r.município,
    r.estado,
    v.value,
    strftime('%Y', v.refdate) AS ano,
    v.data_name
FROM
    valoresmeta AS v
LEFT JOIN
    recortes_geograficos AS r ON r.codigo_ibge = v.geoloc_id
WHERE
    v.data_name LIKE '%Diferencial Salarial Médio Feminino%'
    AND strftime('%Y', v.refdate) = '2021'",
  },
  WorkedExample {
    question: "Retornar a lista dos municípios com o indicador de Desmatamento da região imediata de Toledo para 2020",
    query:    "SELECT
    r.codigo_ibge,
    r.município,
    r.estado,
    r.regiao_imediata,
    v.value,
    strftime('%Y', v.refdate) AS ano,
    v.data_name
FROM
    valoresmeta AS v
LEFT JOIN
    recortes_geograficos AS r ON r.codigo_ibge = v.geoloc_id
WHERE
    r.regiao_imediata LIKE '%Toledo%'
    AND v.data_name LIKE '%Desmatamento%'
    AND strftime('%Y', v.refdate) = '2020'",
  },
  WorkedExample {
    question: "Retornar a lista dos municípios com o indicador de Desmatamento da região imediata de Toledo",
    query:    "SELECT
    r.codigo_ibge,
    r.município,
    r.estado,
    r.regiao_imediata,
    v.value,
    strftime('%Y', v.refdate) AS ano,
    v.data_name
FROM
    valoresmeta AS v
LEFT JOIN
    recortes_geograficos AS r ON r.codigo_ibge = v.geoloc_id
WHERE
    r.regiao_imediata LIKE '%Toledo%'
    AND v.data_name LIKE '%Desmatamento%'
    AND v.refdate = (
        SELECT
            MAX(refdate)
        FROM
            valoresmeta
        WHERE
            geoloc_id = v.geoloc_id
            AND data_name = v.data_name
    )",
  },
  WorkedExample {
    question: "crie uma lista do indicador Taxa de Variação Populacional para o estado de sergipe",
    query:    "SELECT
    r.codigo_ibge,
    r.município,
    r.estado,
    v.value,
    strftime('%Y', v.refdate) AS ano,
    v.data_name
FROM
    valoresmeta AS v
LEFT JOIN
    recortes_geograficos AS r ON r.codigo_ibge = v.geoloc_id
WHERE
    r.estado LIKE '%Sergipe%'
    AND v.data_name LIKE '%Taxa de Variação Populacional%'
    AND v.refdate = (
        SELECT
            MAX(refdate)
        FROM
            valoresmeta
        WHERE
            geoloc_id = v.geoloc_id
            AND data_name = v.data_name
    )",
  },
  WorkedExample {
    question: "Criar um mapa do Paraná com o indicador de Sustentabilidade Fiscal dos Municípios para 2019",
    query:    "SELECT
    r.codigo_ibge,
    r.município,
    r.estado,
    v.value,
    strftime('%Y', v.refdate) AS ano,
    v.data_name,
    r.latitude,
    r.longitude
FROM
    valoresmeta AS v
LEFT JOIN
    recortes_geograficos AS r ON r.codigo_ibge = v.geoloc_id
WHERE
    r.estado LIKE '%Paraná%'
    AND v.data_name LIKE '%Sustentabilidade Fiscal dos Municípios%'
    AND strftime('%Y', v.refdate) = '2019'",
  },
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn describe_lists_every_column_and_the_join() {
    let catalog = SchemaCatalog::pndr();
    let text = catalog.describe();
    for table in catalog.tables() {
      assert!(text.contains(table.name), "missing table {}", table.name);
      for c in table.columns {
        assert!(
          text.contains(&format!("{} {}", c.name, c.sql_type)),
          "missing column {}.{}",
          table.name,
          c.name
        );
      }
    }
    assert!(text.contains("recortes_geograficos.codigo_ibge -> valoresmeta.geoloc_id"));
  }

  #[test]
  fn ddl_quotes_accented_columns() {
    let ddl = SchemaCatalog::pndr().ddl();
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS recortes_geograficos"));
    assert!(ddl.contains("\"município\" VARCHAR"));
    assert!(ddl.contains("\"codigo_ibge\" BIGINT PRIMARY KEY"));
    assert!(!ddl.contains("REFERENCES"));
  }

  #[test]
  fn lookups_are_case_insensitive() {
    let catalog = SchemaCatalog::pndr();
    assert!(catalog.table("VALORESMETA").is_some());
    assert!(catalog.has_column("MUNICÍPIO"));
    assert!(catalog.has_column("Data_Name"));
    assert!(!catalog.has_column("population"));
  }

  #[test]
  fn examples_cover_latest_and_map_shapes() {
    let examples = SchemaCatalog::pndr().examples();
    assert_eq!(examples.len(), 6);
    assert!(examples.iter().any(|e| e.query.contains("MAX(refdate)")));
    assert!(examples.iter().any(|e| e.query.contains("r.latitude")));
    assert!(examples.iter().all(|e| !e.query.contains(",\nFROM")));
  }
}
