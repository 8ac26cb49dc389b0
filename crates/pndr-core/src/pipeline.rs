//! One question → one [`Answer`], end to end.
//!
//! The pipeline never fails as a whole. Every stage failure becomes a
//! [`Notice`] and the answer carries whatever the other stages produced.

use std::{future::Future, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
  catalog::SchemaCatalog,
  error::{Notice, PipelineError, Stage},
  executor::QueryExecutor,
  insight::{InsightGenerator, TableToNarrative},
  present::{BarChart, BoundarySource, ChoroplethMap, MapPlan, build_chart},
  table::ResultTable,
  translate::{QueryTranslator, TextToQuery},
  validate::validate_query,
};

/// Everything produced for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
  pub id:        Uuid,
  pub question:  String,
  /// The translated query, once translation succeeded.
  pub query:     Option<String>,
  /// The result table, once execution succeeded.
  pub table:     Option<ResultTable>,
  /// The query ran and returned zero rows.
  pub empty:     bool,
  pub narrative: Option<String>,
  pub chart:     Option<BarChart>,
  pub map:       Option<ChoroplethMap>,
  pub notices:   Vec<Notice>,
}

impl Answer {
  fn new(id: Uuid, question: &str) -> Self {
    Self {
      id,
      question: question.to_owned(),
      query: None,
      table: None,
      empty: false,
      narrative: None,
      chart: None,
      map: None,
      notices: Vec::new(),
    }
  }

  fn notice(&mut self, stage: Stage, err: &PipelineError) {
    warn!(
      request_id = %self.id,
      stage = ?stage,
      kind = ?err.kind(),
      error = %err,
      "pipeline stage failed"
    );
    self.notices.push(Notice::new(stage, err));
  }
}

/// Tunables that change pipeline behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
  /// Check translated queries against the catalog before executing them.
  pub validate_queries: bool,
}

impl Default for PipelineOptions {
  fn default() -> Self { Self { validate_queries: true } }
}

/// Anything that can answer a question. The HTTP layer depends on this
/// rather than on a concrete [`Pipeline`].
pub trait Assistant: Send + Sync + 'static {
  fn ask<'a>(&'a self, question: &'a str) -> impl Future<Output = Answer> + Send + 'a;

  fn catalog(&self) -> &SchemaCatalog;
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<T, E, N, B> {
  translator: QueryTranslator<T>,
  executor:   E,
  insight:    InsightGenerator<N>,
  boundaries: B,
  options:    PipelineOptions,
}

impl<T, E, N, B> Pipeline<T, E, N, B>
where
  T: TextToQuery,
  E: QueryExecutor,
  N: TableToNarrative,
  B: BoundarySource,
{
  pub fn new(
    catalog: SchemaCatalog,
    translator: T,
    executor: E,
    narrator: N,
    boundaries: B,
    options: PipelineOptions,
  ) -> Self {
    Self {
      translator: QueryTranslator::new(translator, catalog),
      executor,
      insight: InsightGenerator::new(narrator),
      boundaries,
      options,
    }
  }

  pub async fn answer(&self, question: &str) -> Answer {
    let id = Uuid::new_v4();
    let span = info_span!("ask", request_id = %id);
    self.run(Answer::new(id, question)).instrument(span).await
  }

  async fn run(&self, mut answer: Answer) -> Answer {
    info!(question = %answer.question, "answering");

    let query = match self.translator.translate(&answer.question).await {
      Ok(query) => query,
      Err(err) => {
        answer.notice(Stage::Translation, &err);
        return answer;
      }
    };
    answer.query = Some(query.clone());

    if self.options.validate_queries
      && let Err(err) = validate_query(&query, self.translator.catalog())
    {
      answer.notice(Stage::Validation, &PipelineError::from_validation(&query, err));
      return answer;
    }

    let started = Instant::now();
    let table = match self.executor.execute(&query).await {
      Ok(table) => table,
      Err(err) => {
        answer.notice(Stage::Execution, &PipelineError::from_execution(&query, err));
        return answer;
      }
    };
    info!(
      rows = table.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "query executed"
    );

    answer.empty = table.is_empty();
    answer.chart = build_chart(&table);

    let (narrative, map) = tokio::join!(self.insight.generate(&table), self.map(&table));
    match narrative {
      Ok(text) => answer.narrative = Some(text),
      Err(err) => answer.notice(Stage::Insight, &err),
    }
    match map {
      Ok(map) => answer.map = map,
      Err(err) => answer.notice(Stage::Map, &err),
    }

    answer.table = Some(table);
    info!(
      notices = answer.notices.len(),
      chart = answer.chart.is_some(),
      map = answer.map.is_some(),
      "answered"
    );
    answer
  }

  /// Boundaries are only fetched when the table can be mapped.
  async fn map(&self, table: &ResultTable) -> Result<Option<ChoroplethMap>, PipelineError> {
    let Some(plan) = MapPlan::from_table(table) else {
      return Ok(None);
    };
    let index = self
      .boundaries
      .boundaries()
      .await
      .map_err(|e| PipelineError::BoundariesUnavailable(e.to_string()))?;

    let map = plan.render(&index);
    if !map.unmatched.is_empty() {
      warn!(unmatched = map.unmatched.len(), "areas without a boundary polygon");
    }
    Ok(Some(map))
  }
}

impl<T, E, N, B> Assistant for Pipeline<T, E, N, B>
where
  T: TextToQuery + 'static,
  E: QueryExecutor + 'static,
  N: TableToNarrative + 'static,
  B: BoundarySource + 'static,
{
  async fn ask(&self, question: &str) -> Answer { self.answer(question).await }

  fn catalog(&self) -> &SchemaCatalog { self.translator.catalog() }
}
