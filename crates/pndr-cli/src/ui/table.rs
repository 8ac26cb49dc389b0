//! Result table pane, top left.

use pndr_core::table::ResultTable;
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::{app::App, report::format_cell};

/// Widest a column is allowed to get before its cells are clipped.
const MAX_COLUMN_WIDTH: usize = 28;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let table = app.answer.as_ref().and_then(|a| a.table.as_ref());

  let title = match table {
    Some(t) if !t.is_empty() => format!(" Table (row {}/{}) ", app.table_scroll + 1, t.len()),
    Some(_) => " Table (0 rows) ".to_string(),
    None => " Table ".to_string(),
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(table) = table else {
    let hint = Paragraph::new("Ask a question and press Enter.")
      .style(Style::default().fg(Color::DarkGray))
      .block(block);
    f.render_widget(hint, area);
    return;
  };

  let header = Row::new(table.columns.iter().map(|c| {
    Cell::from(c.name.clone()).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
  }));

  let rows = table.rows.iter().skip(app.table_scroll).map(|row| {
    Row::new(row.iter().map(|value| {
      let style = if value.is_null() {
        Style::default().fg(Color::DarkGray)
      } else {
        Style::default()
      };
      Cell::from(format_cell(value)).style(style)
    }))
  });

  f.render_widget(
    Table::new(rows, column_widths(table)).header(header).column_spacing(2).block(block),
    area,
  );
}

fn column_widths(table: &ResultTable) -> Vec<Constraint> {
  table
    .columns
    .iter()
    .enumerate()
    .map(|(i, column)| {
      let widest = table
        .rows
        .iter()
        .filter_map(|row| row.get(i))
        .map(|v| format_cell(v).chars().count())
        .chain([column.name.chars().count()])
        .max()
        .unwrap_or_default();
      Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16)
    })
    .collect()
}
