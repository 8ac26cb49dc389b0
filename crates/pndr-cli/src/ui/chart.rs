//! Bar chart pane, bottom left.

use pndr_core::present::BarChart;
use ratatui::{
  Frame,
  layout::{Direction, Rect},
  style::{Color, Style},
  text::Line,
  widgets::{self, Bar, BarGroup, Block, Borders, Paragraph},
};

use crate::{app::App, report::format_number};

/// Integer resolution of the widget; values are rescaled onto it.
const RESOLUTION: u64 = 1000;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let chart = app.answer.as_ref().and_then(|a| a.chart.as_ref());

  let block = Block::default()
    .title(format!(" {} ", chart.map_or("Chart", |c| c.title.as_str())))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(chart) = chart else {
    f.render_widget(
      Paragraph::new("No chart for this answer.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  };

  let bars = bars(chart);
  f.render_widget(
    widgets::BarChart::default()
      .block(block)
      .direction(Direction::Horizontal)
      .bar_width(1)
      .bar_gap(0)
      .bar_style(Style::default().fg(Color::Green))
      .max(RESOLUTION)
      .data(BarGroup::default().bars(&bars)),
    area,
  );
}

/// The widget only draws unsigned integers, so each value is rescaled
/// against the largest. Negative values draw as empty bars.
fn bars(chart: &BarChart) -> Vec<Bar<'_>> {
  let max = chart.max_value().filter(|m| *m > 0.0);
  chart
    .bars
    .iter()
    .map(|bar| {
      let scaled = match (bar.value, max) {
        (Some(v), Some(max)) => ((v.max(0.0) / max) * RESOLUTION as f64).round() as u64,
        _ => 0,
      };
      Bar::default()
        .label(Line::from(bar.category.as_str()))
        .value(scaled)
        .text_value(bar.value.map_or_else(|| "–".to_string(), format_number))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use pndr_core::present;

  use super::*;

  #[test]
  fn bars_rescale_against_the_largest_value() {
    let chart = BarChart {
      title:   "SF".into(),
      x_label: "município".into(),
      y_label: "SF".into(),
      bars:    vec![
        present::Bar { category: "A".into(), value: Some(4.0) },
        present::Bar { category: "B".into(), value: Some(1.0) },
        present::Bar { category: "C".into(), value: None },
        present::Bar { category: "D".into(), value: Some(-2.0) },
      ],
    };
    let bars = bars(&chart);
    assert_eq!(bars.len(), 4);
    assert_eq!(bars[0], Bar::default().label("A".into()).value(1000).text_value("4".into()));
    assert_eq!(bars[1], Bar::default().label("B".into()).value(250).text_value("1".into()));
    assert_eq!(bars[2], Bar::default().label("C".into()).value(0).text_value("–".into()));
    assert_eq!(bars[3], Bar::default().label("D".into()).value(0).text_value("-2".into()));
  }
}
