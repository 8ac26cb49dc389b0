//! Map summary pane, bottom right. The terminal cannot draw polygons, so
//! this shows the view, the legend swatches and the join coverage.

use pndr_core::present::ChoroplethMap;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
  app::App,
  report::{feature_count, format_number},
};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Map ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(map) = app.answer.as_ref().and_then(|a| a.map.as_ref()) else {
    f.render_widget(
      Paragraph::new("No map for this answer.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  };

  f.render_widget(
    Paragraph::new(lines(map, app.map_out.is_some())).wrap(Wrap { trim: false }).block(block),
    area,
  );
}

fn lines(map: &ChoroplethMap, written: bool) -> Vec<Line<'static>> {
  let dim = Style::default().fg(Color::DarkGray);
  let [lat, lon] = map.center;

  let mut lines = vec![
    Line::from(vec![
      Span::styled("center ", dim),
      Span::raw(format!("{lat:.4}, {lon:.4}")),
      Span::styled("  zoom ", dim),
      Span::raw(map.zoom.to_string()),
    ]),
    Line::from(format!("{} municipalities drawn", feature_count(map))),
    Line::from(""),
  ];

  for bin in &map.legend {
    lines.push(Line::from(vec![
      Span::styled("██ ", Style::default().fg(hex_color(&bin.color))),
      Span::raw(format!("{} – {}", format_number(bin.lower), format_number(bin.upper))),
    ]));
  }

  if !map.unmatched.is_empty() {
    lines.push(Line::from(""));
    let codes: Vec<String> = map.unmatched.iter().map(i64::to_string).collect();
    lines.push(Line::from(Span::styled(
      format!("no boundary for {}: {}", codes.len(), codes.join(", ")),
      Style::default().fg(Color::Yellow),
    )));
  }

  if !written {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("--map-out FILE saves the GeoJSON", dim)));
  }
  lines
}

/// `#rrggbb` to a terminal colour; anything else draws white.
fn hex_color(hex: &str) -> Color {
  let channel = |range: std::ops::Range<usize>| {
    hex.strip_prefix('#').and_then(|h| h.get(range)).and_then(|c| u8::from_str_radix(c, 16).ok())
  };
  match (channel(0..2), channel(2..4), channel(4..6)) {
    (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
    _ => Color::White,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legend_colours_parse() {
    assert_eq!(hex_color("#31a354"), Color::Rgb(0x31, 0xa3, 0x54));
    assert_eq!(hex_color("#ffffcc"), Color::Rgb(0xff, 0xff, 0xcc));
    assert_eq!(hex_color("green"), Color::White);
    assert_eq!(hex_color("#12"), Color::White);
  }
}
