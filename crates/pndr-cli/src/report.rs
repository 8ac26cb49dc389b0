//! Plain-text rendering of an [`Answer`], for `--print` and for the panes
//! that show text.

use std::fmt::Write as _;

use pndr_core::{
  Answer, Notice,
  present::{BarChart, ChoroplethMap},
  table::{ResultTable, Value},
};

/// Rows shown by the plain table before truncating.
const MAX_ROWS: usize = 50;

pub fn format_cell(value: &Value) -> String {
  match value {
    Value::Null => "NULL".into(),
    Value::Real(r) => format_number(*r),
    other => other.to_label(),
  }
}

pub fn format_number(value: f64) -> String {
  let fixed = format!("{value:.4}");
  fixed.trim_end_matches('0').trim_end_matches('.').to_owned()
}

fn width(s: &str) -> usize { s.chars().count() }

fn pad(s: &str, to: usize) -> String {
  let mut out = s.to_owned();
  out.extend(std::iter::repeat_n(' ', to.saturating_sub(width(s))));
  out
}

// ─── Table ───────────────────────────────────────────────────────────────────

pub fn table_lines(table: &ResultTable) -> Vec<String> {
  let cells: Vec<Vec<String>> = table
    .rows
    .iter()
    .take(MAX_ROWS)
    .map(|row| row.iter().map(format_cell).collect())
    .collect();

  let widths: Vec<usize> = table
    .columns
    .iter()
    .enumerate()
    .map(|(i, column)| {
      cells
        .iter()
        .filter_map(|row| row.get(i))
        .map(|c| width(c))
        .chain([width(&column.name)])
        .max()
        .unwrap_or_default()
    })
    .collect();

  let join = |row: Vec<String>| -> String {
    row
      .iter()
      .zip(&widths)
      .map(|(cell, w)| pad(cell, *w))
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_owned()
  };

  let mut lines = vec![
    join(table.columns.iter().map(|c| c.name.clone()).collect()),
    join(widths.iter().map(|w| "-".repeat(*w)).collect()),
  ];
  lines.extend(cells.into_iter().map(join));
  if table.len() > MAX_ROWS {
    lines.push(format!("… {} more rows", table.len() - MAX_ROWS));
  }
  lines
}

// ─── Chart ───────────────────────────────────────────────────────────────────

/// Horizontal bars scaled so the largest value spans `bar_width` cells.
pub fn chart_lines(chart: &BarChart, bar_width: usize) -> Vec<String> {
  let label_width = chart.bars.iter().map(|b| width(&b.category)).max().unwrap_or_default();
  let max = chart.max_value().filter(|m| *m > 0.0);

  chart
    .bars
    .iter()
    .map(|bar| {
      let label = pad(&bar.category, label_width);
      match (bar.value, max) {
        (None, _) => format!("{label} │ (no data)"),
        (Some(v), Some(max)) => {
          let cells = ((v.max(0.0) / max) * bar_width as f64).round() as usize;
          format!("{label} │{} {}", "█".repeat(cells), format_number(v))
        }
        (Some(v), None) => format!("{label} │ {}", format_number(v)),
      }
    })
    .collect()
}

// ─── Map ─────────────────────────────────────────────────────────────────────

pub fn feature_count(map: &ChoroplethMap) -> usize {
  map.features["features"].as_array().map(Vec::len).unwrap_or_default()
}

pub fn map_lines(map: &ChoroplethMap) -> Vec<String> {
  let [lat, lon] = map.center;
  let mut lines = vec![
    format!("center {lat:.4}, {lon:.4}  zoom {}", map.zoom),
    format!("{} municipalities drawn", feature_count(map)),
  ];
  for bin in &map.legend {
    lines.push(format!(
      "  {}  {} – {}",
      bin.color,
      format_number(bin.lower),
      format_number(bin.upper)
    ));
  }
  if !map.unmatched.is_empty() {
    let codes: Vec<String> = map.unmatched.iter().map(i64::to_string).collect();
    lines.push(format!("no boundary for {}: {}", codes.len(), codes.join(", ")));
  }
  lines
}

// ─── Whole answer ────────────────────────────────────────────────────────────

pub fn notice_line(notice: &Notice) -> String {
  format!("[{:?}] {}", notice.stage, notice.message)
}

pub fn render(answer: &Answer) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Question: {}", answer.question);
  if let Some(query) = &answer.query {
    let _ = writeln!(out, "\nQuery:\n{query}");
  }
  if let Some(table) = &answer.table {
    let _ = writeln!(out, "\n── Table ({} rows) ──", table.len());
    for line in table_lines(table) {
      let _ = writeln!(out, "{line}");
    }
  }
  if let Some(narrative) = &answer.narrative {
    let _ = writeln!(out, "\n── Narrative ──\n{narrative}");
  }
  if let Some(chart) = &answer.chart {
    let _ = writeln!(out, "\n── {} ──", chart.title);
    for line in chart_lines(chart, 40) {
      let _ = writeln!(out, "{line}");
    }
  }
  if let Some(map) = &answer.map {
    let _ = writeln!(out, "\n── Map ──");
    for line in map_lines(map) {
      let _ = writeln!(out, "{line}");
    }
  }
  if !answer.notices.is_empty() {
    let _ = writeln!(out, "\n── Notices ──");
    for notice in &answer.notices {
      let _ = writeln!(out, "{}", notice_line(notice));
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use pndr_core::{PipelineError, Stage, present::Bar};
  use serde_json::json;
  use uuid::Uuid;

  use super::*;

  fn chart() -> BarChart {
    BarChart {
      title:   "Sustentabilidade Fiscal".into(),
      x_label: "município".into(),
      y_label: "Sustentabilidade Fiscal".into(),
      bars:    vec![
        Bar { category: "SALVADOR".into(), value: Some(0.5) },
        Bar { category: "FEIRA DE SANTANA".into(), value: Some(0.25) },
        Bar { category: "LAURO".into(), value: None },
      ],
    }
  }

  #[test]
  fn numbers_drop_trailing_zeros() {
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(2.0), "2");
    assert_eq!(format_number(0.123456), "0.1235");
    assert_eq!(format_cell(&Value::Null), "NULL");
    assert_eq!(format_cell(&Value::Integer(2927408)), "2927408");
  }

  #[test]
  fn bars_scale_to_the_largest_value() {
    let lines = chart_lines(&chart(), 10);
    assert_eq!(lines[0], format!("SALVADOR         │{} 0.5", "█".repeat(10)));
    assert_eq!(lines[1], format!("FEIRA DE SANTANA │{} 0.25", "█".repeat(5)));
    assert_eq!(lines[2], "LAURO            │ (no data)");
  }

  #[test]
  fn table_columns_align_on_characters() {
    let table = ResultTable::from_rows(
      vec!["município".into(), "value".into()],
      vec![
        vec![Value::Text("SÃO PAULO".into()), Value::Real(1.5)],
        vec![Value::Text("ARACAJU".into()), Value::Null],
      ],
    );
    let lines = table_lines(&table);
    assert_eq!(lines[0], "município  value");
    assert_eq!(lines[1], "---------  -----");
    assert_eq!(lines[2], "SÃO PAULO  1.5");
    assert_eq!(lines[3], "ARACAJU    NULL");
  }

  #[test]
  fn map_summary_lists_unmatched_codes() {
    let map = ChoroplethMap {
      center:    [-12.97, -38.5],
      zoom:      5,
      legend:    Vec::new(),
      features:  json!({ "type": "FeatureCollection", "features": [{}, {}] }),
      unmatched: vec![2919207],
    };
    let lines = map_lines(&map);
    assert_eq!(lines[0], "center -12.9700, -38.5000  zoom 5");
    assert_eq!(lines[1], "2 municipalities drawn");
    assert_eq!(lines[2], "no boundary for 1: 2919207");
  }

  #[test]
  fn render_keeps_partial_results_and_notices() {
    let err = PipelineError::InsightUnavailable("quota".into());
    let answer = Answer {
      id:        Uuid::nil(),
      question:  "Qual o SF na Bahia?".into(),
      query:     Some("SELECT 1".into()),
      table:     None,
      empty:     false,
      narrative: None,
      chart:     Some(chart()),
      map:       None,
      notices:   vec![Notice::new(Stage::Insight, &err)],
    };
    let text = render(&answer);
    assert!(text.starts_with("Question: Qual o SF na Bahia?\n"));
    assert!(text.contains("\nQuery:\nSELECT 1\n"));
    assert!(text.contains("── Sustentabilidade Fiscal ──"));
    assert!(text.contains("[Insight] insight provider unavailable: quota"));
    assert!(!text.contains("── Narrative ──"));
  }
}
