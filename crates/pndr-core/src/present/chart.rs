//! Bar chart of the indicator value per location.

use serde::{Deserialize, Serialize};

use crate::table::{ColumnType, ResultTable};

/// Location columns a chart can be keyed on, in order of preference.
pub const CATEGORY_COLUMNS: &[&str] = &["município", "municipio", "local_name", "estado"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
  pub category: String,
  /// `None` for a NULL value; the bar is kept so the gap is visible.
  pub value:    Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
  pub title:   String,
  pub x_label: String,
  pub y_label: String,
  pub bars:    Vec<Bar>,
}

impl BarChart {
  /// Largest non-NULL value, if any.
  pub fn max_value(&self) -> Option<f64> {
    self.bars.iter().filter_map(|b| b.value).reduce(f64::max)
  }
}

/// One bar per row, or `None` when the table is empty or lacks a location
/// column or a numeric `value` column.
pub fn build_chart(table: &ResultTable) -> Option<BarChart> {
  if table.is_empty() {
    return None;
  }
  let category_idx = table.first_column_of(CATEGORY_COLUMNS)?;
  let value_idx = table.column_index("value")?;
  if !matches!(
    table.columns[value_idx].column_type,
    ColumnType::Integer | ColumnType::Real | ColumnType::Null
  ) {
    return None;
  }

  let bars = table
    .column_values(category_idx)
    .zip(table.column_values(value_idx))
    .map(|(category, value)| Bar { category: category.to_label(), value: value.as_f64() })
    .collect();

  let indicator = table.column_index("data_name").and_then(|idx| {
    table
      .column_values(idx)
      .find_map(|v| v.as_str().filter(|s| !s.trim().is_empty()))
      .map(str::to_owned)
  });

  Some(BarChart {
    title: indicator.clone().unwrap_or_else(|| "Indicador".to_owned()),
    x_label: table.columns[category_idx].name.clone(),
    y_label: indicator.unwrap_or_else(|| "value".to_owned()),
    bars,
  })
}
