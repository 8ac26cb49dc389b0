//! Application state machine and event dispatcher.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use pndr_core::{Answer, present::ChoroplethMap};

use crate::client::{ApiClient, IndicatorEntry};

// ─── Mode ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Typing a question.
  Input,
  /// Fuzzy-picking an indicator name to insert into the question.
  Picker,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  pub mode: Mode,

  /// The question being typed.
  pub input: String,

  /// Indicator taxonomy, loaded once on startup. May stay empty.
  pub indicators: Vec<IndicatorEntry>,

  pub picker_filter: String,

  /// Cursor position within the *filtered* indicator list.
  pub picker_cursor: usize,

  /// A submitted question waiting for the next loop turn, so the
  /// "asking" status is drawn before the request blocks.
  pub pending: Option<String>,

  /// The last answer received.
  pub answer: Option<Answer>,

  /// First visible row of the result table.
  pub table_scroll: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Where to write each answer's map GeoJSON, if anywhere.
  pub map_out: Option<PathBuf>,

  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient, map_out: Option<PathBuf>) -> Self {
    Self {
      mode: Mode::Input,
      input: String::new(),
      indicators: Vec::new(),
      picker_filter: String::new(),
      picker_cursor: 0,
      pending: None,
      answer: None,
      table_scroll: 0,
      status_msg: String::new(),
      map_out,
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the indicator taxonomy. Failure only disables the picker.
  pub async fn load_indicators(&mut self) {
    match self.client.indicators().await {
      Ok(indicators) => self.indicators = indicators,
      Err(e) => self.status_msg = format!("Indicators unavailable: {e}"),
    }
  }

  /// Ask `question` and keep the answer, replacing the previous one.
  pub async fn ask(&mut self, question: String) {
    match self.client.ask(&question).await {
      Ok(answer) => self.accept(answer),
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  /// Keep `answer`. A failed map write only shows in the status bar.
  pub fn accept(&mut self, answer: Answer) {
    self.status_msg = match (&self.map_out, &answer.map) {
      (Some(path), Some(map)) => match write_map(path, map) {
        Ok(()) => format!("Map written to {}", path.display()),
        Err(e) => format!("Map not written: {e:#}"),
      },
      _ if answer.notices.is_empty() => String::new(),
      _ => format!("{} notice(s)", answer.notices.len()),
    };
    self.table_scroll = 0;
    self.answer = Some(answer);
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Indicators matching the picker filter, best match first.
  pub fn filtered_indicators(&self) -> Vec<&IndicatorEntry> {
    if self.picker_filter.is_empty() {
      return self.indicators.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &IndicatorEntry)> = self
      .indicators
      .iter()
      .filter_map(|i| matcher.fuzzy_match(&i.name, &self.picker_filter).map(|s| (s, i)))
      .collect();
    // Stable, so equal scores keep publication order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, i)| i).collect()
  }

  fn table_len(&self) -> usize {
    self.answer.as_ref().and_then(|a| a.table.as_ref()).map_or(0, |t| t.len())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match self.mode {
      Mode::Input => self.handle_input_key(key),
      Mode::Picker => {
        self.handle_picker_key(key);
        true
      }
    }
  }

  fn handle_input_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc if self.input.is_empty() => return false,
      KeyCode::Esc => self.input.clear(),
      KeyCode::Enter => {
        let question = self.input.trim();
        if !question.is_empty() {
          self.pending = Some(question.to_owned());
          self.status_msg = "Asking…".into();
        }
      }
      KeyCode::Tab => {
        if self.indicators.is_empty() {
          self.status_msg = "No indicators loaded".into();
        } else {
          self.mode = Mode::Picker;
          self.picker_filter.clear();
          self.picker_cursor = 0;
        }
      }
      KeyCode::Backspace => {
        self.input.pop();
      }
      KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.input.push(c);
      }

      // Table scrolling
      KeyCode::Down => {
        if self.table_scroll + 1 < self.table_len() {
          self.table_scroll += 1;
        }
      }
      KeyCode::Up => self.table_scroll = self.table_scroll.saturating_sub(1),
      KeyCode::PageDown => {
        self.table_scroll = (self.table_scroll + 10).min(self.table_len().saturating_sub(1));
      }
      KeyCode::PageUp => self.table_scroll = self.table_scroll.saturating_sub(10),

      _ => {}
    }
    true
  }

  fn handle_picker_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.mode = Mode::Input,
      KeyCode::Enter => {
        let picked = self.filtered_indicators().get(self.picker_cursor).map(|i| i.name.clone());
        if let Some(name) = picked {
          if !self.input.is_empty() && !self.input.ends_with(' ') {
            self.input.push(' ');
          }
          self.input.push_str(&name);
        }
        self.mode = Mode::Input;
      }
      KeyCode::Down => {
        if self.picker_cursor + 1 < self.filtered_indicators().len() {
          self.picker_cursor += 1;
        }
      }
      KeyCode::Up => self.picker_cursor = self.picker_cursor.saturating_sub(1),
      KeyCode::Backspace => {
        self.picker_filter.pop();
        self.picker_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.picker_filter.push(c);
        self.picker_cursor = 0;
      }
      _ => {}
    }
  }
}

/// Write the map's `FeatureCollection` as pretty GeoJSON.
pub fn write_map(path: &Path, map: &ChoroplethMap) -> anyhow::Result<()> {
  let json = serde_json::to_vec_pretty(&map.features).context("serialising map")?;
  std::fs::write(path, json).with_context(|| format!("writing map to {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::client::ApiConfig;

  fn app() -> App {
    let client =
      ApiClient::new(ApiConfig { base_url: "http://127.0.0.1:9".into(), timeout_secs: 1 })
        .unwrap();
    let mut app = App::new(client, None);
    app.indicators = [
      "Sustentabilidade Fiscal",
      "Taxa de Variação Populacional",
      "Diferencial do PIB per capita",
    ]
    .into_iter()
    .map(|name| IndicatorEntry {
      group: "Objetivo 1".into(),
      theme: "Convergência de renda".into(),
      name:  name.into(),
    })
    .collect();
    app
  }

  fn press(app: &mut App, code: KeyCode) -> bool { app.handle_key(KeyEvent::from(code)) }

  fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  #[test]
  fn enter_queues_the_trimmed_question() {
    let mut app = app();
    type_text(&mut app, "  SF na Bahia ");
    assert!(press(&mut app, KeyCode::Enter));
    assert_eq!(app.pending.as_deref(), Some("SF na Bahia"));
  }

  #[test]
  fn blank_input_is_not_submitted() {
    let mut app = app();
    type_text(&mut app, "   ");
    press(&mut app, KeyCode::Enter);
    assert!(app.pending.is_none());
  }

  #[test]
  fn picker_inserts_the_best_match() {
    let mut app = app();
    type_text(&mut app, "Qual a");
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.mode, Mode::Picker);

    type_text(&mut app, "sustfisc");
    assert_eq!(app.filtered_indicators()[0].name, "Sustentabilidade Fiscal");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode, Mode::Input);
    assert_eq!(app.input, "Qual a Sustentabilidade Fiscal");
  }

  #[test]
  fn picker_escape_leaves_input_alone() {
    let mut app = app();
    type_text(&mut app, "abc");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "taxa");
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, Mode::Input);
    assert_eq!(app.input, "abc");
  }

  #[test]
  fn escape_clears_then_quits() {
    let mut app = app();
    type_text(&mut app, "x");
    assert!(press(&mut app, KeyCode::Esc));
    assert!(app.input.is_empty());
    assert!(!press(&mut app, KeyCode::Esc));
  }

  #[test]
  fn map_write_failure_keeps_the_answer() {
    let mut app = app();
    app.map_out = Some(std::env::temp_dir().join("pndr-no-such-dir").join("map.geojson"));
    let map = ChoroplethMap {
      center:    [-12.97, -38.5],
      zoom:      5,
      legend:    Vec::new(),
      features:  serde_json::json!({ "type": "FeatureCollection", "features": [] }),
      unmatched: Vec::new(),
    };
    app.accept(Answer {
      id:        uuid::Uuid::nil(),
      question:  "SF na Bahia".into(),
      query:     Some("SELECT 1".into()),
      table:     None,
      empty:     false,
      narrative: None,
      chart:     None,
      map:       Some(map),
      notices:   Vec::new(),
    });
    assert!(app.status_msg.starts_with("Map not written"), "{}", app.status_msg);
    assert_eq!(app.answer.as_ref().map(|a| a.question.as_str()), Some("SF na Bahia"));
  }

  #[test]
  fn ctrl_c_quits_from_the_picker() {
    let mut app = app();
    press(&mut app, KeyCode::Tab);
    assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
  }
}
