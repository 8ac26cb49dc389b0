//! The tabular result handed from the executor to every downstream consumer.

use serde::{
  Deserialize, Serialize,
  ser::{SerializeMap, SerializeSeq},
};

use crate::{catalog::eq_ident, Result};

// ─── Cells ───────────────────────────────────────────────────────────────────

/// A single cell. Mirrors the storage classes of the embedded engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Numeric view of the cell; `None` for NULL and for text.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Integer(i) => Some(*i as f64),
      Self::Real(r) => Some(*r),
      Self::Null | Self::Text(_) => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Integer(i) => Some(*i),
      // Integral reals show up when a key column went through arithmetic.
      Self::Real(r) if r.fract() == 0.0 => Some(*r as i64),
      Self::Text(t) => t.trim().parse().ok(),
      Self::Null | Self::Real(_) => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Text(t) => Some(t),
      _ => None,
    }
  }

  /// Display form used for chart categories and terminal output.
  pub fn to_label(&self) -> String {
    match self {
      Self::Null => String::new(),
      Self::Integer(i) => i.to_string(),
      Self::Real(r) => r.to_string(),
      Self::Text(t) => t.clone(),
    }
  }

  fn column_type(&self) -> ColumnType {
    match self {
      Self::Null => ColumnType::Null,
      Self::Integer(_) => ColumnType::Integer,
      Self::Real(_) => ColumnType::Real,
      Self::Text(_) => ColumnType::Text,
    }
  }
}

// ─── Columns ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
  Integer,
  Real,
  Text,
  /// Every value in the column is NULL, so no type could be inferred.
  Null,
}

impl ColumnType {
  pub fn is_numeric(self) -> bool { matches!(self, Self::Integer | Self::Real) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
  pub name:        String,
  #[serde(rename = "type")]
  pub column_type: ColumnType,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Ordered rows with named, typed columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
  pub columns: Vec<Column>,
  pub rows:    Vec<Vec<Value>>,
}

impl ResultTable {
  /// Build a table, inferring each column's type from its first non-NULL
  /// value.
  pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
    let columns = names
      .into_iter()
      .enumerate()
      .map(|(idx, name)| {
        let column_type = rows
          .iter()
          .filter_map(|row| row.get(idx))
          .find(|v| !v.is_null())
          .map(Value::column_type)
          .unwrap_or(ColumnType::Null);
        Column { name, column_type }
      })
      .collect();
    Self { columns, rows }
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn len(&self) -> usize { self.rows.len() }

  /// Index of the first column named `name` (case-insensitive).
  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| eq_ident(&c.name, name))
  }

  /// The first of `candidates` present in the table.
  pub fn first_column_of(&self, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|c| self.column_index(c))
  }

  /// All cells of one column, top to bottom.
  pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
    self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null))
  }

  /// Serialise as a JSON array of objects keyed by column name, keys in
  /// column order. This is the self-describing form handed to the insight
  /// model.
  pub fn to_records_json(&self) -> Result<String> {
    Ok(serde_json::to_string(&Records(self))?)
  }
}

struct Records<'a>(&'a ResultTable);

struct Record<'a> {
  columns: &'a [Column],
  row:     &'a [Value],
}

impl Serialize for Records<'_> {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    let mut seq = s.serialize_seq(Some(self.0.rows.len()))?;
    for row in &self.0.rows {
      seq.serialize_element(&Record { columns: &self.0.columns, row })?;
    }
    seq.end()
  }
}

impl Serialize for Record<'_> {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(self.columns.len()))?;
    for (col, value) in self.columns.iter().zip(self.row) {
      map.serialize_entry(&col.name, value)?;
    }
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> ResultTable {
    ResultTable::from_rows(
      vec!["município".into(), "value".into(), "ano".into(), "vazio".into()],
      vec![
        vec![
          Value::Text("Salvador".into()),
          Value::Null,
          Value::Text("2022".into()),
          Value::Null,
        ],
        vec![
          Value::Text("Feira de Santana".into()),
          Value::Real(0.61),
          Value::Text("2022".into()),
          Value::Null,
        ],
      ],
    )
  }

  #[test]
  fn column_types_come_from_first_non_null_value() {
    let table = sample();
    let types: Vec<_> = table.columns.iter().map(|c| c.column_type).collect();
    assert_eq!(
      types,
      [ColumnType::Text, ColumnType::Real, ColumnType::Text, ColumnType::Null]
    );
  }

  #[test]
  fn records_keep_column_order_and_nulls() {
    let json = sample().to_records_json().unwrap();
    assert!(json.starts_with(r#"[{"município":"Salvador","value":null,"ano":"2022""#));
    assert!(json.contains(r#""value":0.61"#));
  }

  #[test]
  fn empty_table_serialises_to_empty_array() {
    let table = ResultTable::from_rows(vec!["value".into()], vec![]);
    assert!(table.is_empty());
    assert_eq!(table.columns[0].column_type, ColumnType::Null);
    assert_eq!(table.to_records_json().unwrap(), "[]");
  }

  #[test]
  fn column_lookup_ignores_case() {
    let table = sample();
    assert_eq!(table.column_index("MUNICÍPIO"), Some(0));
    assert_eq!(table.first_column_of(&["municipio", "Value"]), Some(1));
  }

  #[test]
  fn json_roundtrip_preserves_cells() {
    let table = sample();
    let back: ResultTable =
      serde_json::from_str(&serde_json::to_string(&table).unwrap()).unwrap();
    assert_eq!(back, table);
  }
}
