//! A pure guard between translation and execution.
//!
//! The translator's output is untrusted. Before it reaches the store the
//! query is parsed and checked: exactly one read-only statement, only catalog
//! tables (or CTEs it defines itself), and only catalog columns (or aliases
//! it defines itself).

use std::{collections::HashSet, ops::ControlFlow};

use sqlparser::{
  ast::{Expr, ObjectName, Query, SelectItem, SetExpr, Statement, Visit, Visitor},
  dialect::SQLiteDialect,
  parser::Parser,
};
use thiserror::Error;

use crate::catalog::SchemaCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0}")]
  Syntax(String),

  #[error("{0}")]
  SchemaReference(String),

  /// Parsed fine but is not a single read-only query.
  #[error("{0}")]
  Rejected(String),
}

/// Check `query` against `catalog`.
pub fn validate_query(
  query: &str,
  catalog: &SchemaCatalog,
) -> Result<(), ValidationError> {
  let statements = Parser::parse_sql(&SQLiteDialect {}, query)
    .map_err(|e| ValidationError::Syntax(e.to_string()))?;

  let statement = match statements.as_slice() {
    [] => return Err(ValidationError::Syntax("empty query".into())),
    [single] => single,
    many => {
      return Err(ValidationError::Rejected(format!(
        "expected a single statement, found {}",
        many.len()
      )));
    }
  };

  if !matches!(statement, Statement::Query(_)) {
    return Err(ValidationError::Rejected(
      "only read-only SELECT queries are allowed".into(),
    ));
  }

  let mut refs = References::default();
  let _ = statement.visit(&mut refs);
  refs.check(catalog)
}

// ─── Reference collection ────────────────────────────────────────────────────

#[derive(Default)]
struct References {
  relations: Vec<String>,
  qualified: Vec<String>,
  bare:      Vec<String>,
  /// Lower-cased names the query defines itself.
  ctes:      HashSet<String>,
  aliases:   HashSet<String>,
}

impl References {
  fn check(&self, catalog: &SchemaCatalog) -> Result<(), ValidationError> {
    for relation in &self.relations {
      if catalog.table(relation).is_none()
        && !self.ctes.contains(&relation.to_lowercase())
      {
        return Err(ValidationError::SchemaReference(format!(
          "unknown table: {relation}"
        )));
      }
    }

    for column in self.qualified.iter().chain(&self.bare) {
      if !catalog.has_column(column) && !self.aliases.contains(&column.to_lowercase()) {
        return Err(ValidationError::SchemaReference(format!(
          "unknown column: {column}"
        )));
      }
    }
    Ok(())
  }

  fn collect_aliases(&mut self, body: &SetExpr) {
    match body {
      SetExpr::Select(select) => {
        for item in &select.projection {
          if let SelectItem::ExprWithAlias { alias, .. } = item {
            self.aliases.insert(alias.value.to_lowercase());
          }
        }
      }
      SetExpr::SetOperation { left, right, .. } => {
        self.collect_aliases(left);
        self.collect_aliases(right);
      }
      _ => {}
    }
  }
}

impl Visitor for References {
  type Break = ();

  fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
    if let Some(with) = &query.with {
      for cte in &with.cte_tables {
        self.ctes.insert(cte.alias.name.value.to_lowercase());
      }
    }
    self.collect_aliases(&query.body);
    ControlFlow::Continue(())
  }

  fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<()> {
    if let Some(name) = relation.0.last() {
      self.relations.push(name.value.clone());
    }
    ControlFlow::Continue(())
  }

  fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<()> {
    match expr {
      Expr::Identifier(ident) => self.bare.push(ident.value.clone()),
      Expr::CompoundIdentifier(parts) => {
        if let Some(column) = parts.last() {
          self.qualified.push(column.value.clone());
        }
      }
      _ => {}
    }
    ControlFlow::Continue(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn check(query: &str) -> Result<(), ValidationError> {
    validate_query(query, &SchemaCatalog::pndr())
  }

  #[test]
  fn worked_examples_pass() {
    for example in SchemaCatalog::pndr().examples() {
      assert_eq!(check(example.query), Ok(()), "{}", example.query);
    }
  }

  #[test]
  fn aliases_and_ctes_are_allowed() {
    check(
      "SELECT strftime('%Y', refdate) AS ano, value FROM valoresmeta ORDER BY ano DESC",
    )
    .unwrap();
    check(
      "WITH ultimos AS (SELECT geoloc_id, MAX(refdate) AS ultima FROM valoresmeta GROUP BY geoloc_id)
       SELECT u.geoloc_id, u.ultima FROM ultimos AS u",
    )
    .unwrap();
    check("SELECT t.ano FROM (SELECT strftime('%Y', refdate) AS ano FROM valoresmeta) AS t")
      .unwrap();
  }

  #[test]
  fn accented_columns_match_case_insensitively() {
    check("SELECT \"Município\", estado FROM recortes_geograficos").unwrap();
  }

  #[test]
  fn unparsable_text_is_a_syntax_error() {
    assert!(matches!(
      check("SELEC * FROM valoresmeta"),
      Err(ValidationError::Syntax(_))
    ));
    assert!(matches!(check("   "), Err(ValidationError::Syntax(_))));
  }

  #[test]
  fn writes_and_multiple_statements_are_rejected() {
    assert!(matches!(
      check("DELETE FROM valoresmeta"),
      Err(ValidationError::Rejected(_))
    ));
    assert!(matches!(
      check("SELECT 1; DROP TABLE valoresmeta"),
      Err(ValidationError::Rejected(_))
    ));
  }

  #[test]
  fn unknown_tables_and_columns_are_schema_errors() {
    assert_eq!(
      check("SELECT * FROM sqlite_master"),
      Err(ValidationError::SchemaReference("unknown table: sqlite_master".into()))
    );
    assert_eq!(
      check("SELECT v.populacao FROM valoresmeta AS v"),
      Err(ValidationError::SchemaReference("unknown column: populacao".into()))
    );
    assert!(matches!(
      check("SELECT * FROM valoresmeta WHERE indicador LIKE '%x%'"),
      Err(ValidationError::SchemaReference(_))
    ));
  }
}
