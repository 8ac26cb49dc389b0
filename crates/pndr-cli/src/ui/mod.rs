//! TUI rendering: draws every pane.

pub mod chart;
pub mod map;
pub mod table;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
  app::{App, Mode},
  report::notice_line,
};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, question, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(3), // question
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0]);
  draw_body(f, rows[1], app);
  draw_input(f, rows[2], app);
  draw_status(f, rows[3], app);

  if app.mode == Mode::Picker {
    draw_picker(f, area, app);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " pndr  [Tab] indicators  [Esc] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::DarkGray));

  // Simple left-right header: pad the middle.
  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

/// Four panes: table and narrative on top, chart and map below.
fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let halves = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(area);
  let top = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(halves[0]);
  let bottom = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(halves[1]);

  table::draw(f, top[0], app);
  draw_narrative(f, top[1], app);
  chart::draw(f, bottom[0], app);
  map::draw(f, bottom[1], app);
}

fn draw_narrative(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Narrative ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut lines: Vec<Line> = Vec::new();
  if let Some(answer) = &app.answer {
    if let Some(narrative) = &answer.narrative {
      lines.extend(narrative.lines().map(|l| Line::from(l.to_string())));
    }
    // Notices go under the narrative so stage failures are never hidden.
    if !answer.notices.is_empty() {
      if !lines.is_empty() {
        lines.push(Line::from(""));
      }
      for notice in &answer.notices {
        lines.push(Line::from(Span::styled(
          notice_line(notice),
          Style::default().fg(Color::Yellow),
        )));
      }
    }
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

// ─── Question line ───────────────────────────────────────────────────────────

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Question ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(match app.mode {
      Mode::Input => Color::Cyan,
      Mode::Picker => Color::DarkGray,
    }));
  let text = if app.mode == Mode::Input {
    format!("{}_", app.input)
  } else {
    app.input.clone()
  };
  f.render_widget(Paragraph::new(text).block(block), area);
}

// ─── Indicator picker ────────────────────────────────────────────────────────

fn draw_picker(f: &mut Frame, area: Rect, app: &App) {
  let popup = centered(area, 70, 60);
  f.render_widget(Clear, popup);

  let filtered = app.filtered_indicators();
  let block = Block::default()
    .title(format!(" Indicators ({}/{}) ", filtered.len(), app.indicators.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let mut inner = block.inner(popup);
  f.render_widget(block, popup);

  // Filter line at the bottom of the popup.
  if inner.height > 2 {
    let filter_area = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
    inner.height -= 1;
    f.render_widget(
      Paragraph::new(format!("/{}_", app.picker_filter)).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|indicator| {
      ListItem::new(Line::from(vec![
        Span::styled(format!("{:<12}", indicator.group), Style::default().fg(Color::DarkGray)),
        Span::raw(indicator.name.clone()),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select((!filtered.is_empty()).then_some(app.picker_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

/// A rectangle `pct_x` by `pct_y` percent of `area`, centred in it.
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage((100 - pct_y) / 2),
      Constraint::Percentage(pct_y),
      Constraint::Percentage((100 - pct_y) / 2),
    ])
    .split(area);
  Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage((100 - pct_x) / 2),
      Constraint::Percentage(pct_x),
      Constraint::Percentage((100 - pct_x) / 2),
    ])
    .split(rows[1])[1]
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.mode {
    Mode::Input => ("ASK", "Enter ask  Tab indicators  ↑↓ PgUp/PgDn scroll table  Esc clear/quit"),
    Mode::Picker => ("PICK", "Type to filter  ↑↓ move  Enter insert  Esc cancel"),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray));

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}
