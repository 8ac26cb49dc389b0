//! Natural-language question → query string.
//!
//! The generative model is reached through the [`TextToQuery`] capability.
//! [`QueryTranslator`] owns everything deterministic around that call: the
//! grounding prompt (catalog, translation policy, worked examples) and the
//! clean-up of the completion into a bare query.

use std::future::Future;

use tracing::debug;

use crate::{catalog::SchemaCatalog, error::PipelineError};

// ─── Capability ──────────────────────────────────────────────────────────────

/// What a translation provider receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
  /// The user's question, untouched.
  pub question: String,
  /// The full grounding prompt, question included.
  pub prompt:   String,
}

/// A text-completion capability that turns a translation request into a
/// query string.
///
/// Real providers send `prompt`; deterministic stubs can key on `question`.
pub trait TextToQuery: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn complete<'a>(
    &'a self,
    request: &'a TranslationRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

// ─── Translation policy ──────────────────────────────────────────────────────

const PREAMBLE: &str = "Você é um assistente SQL especializado em consultas para SQLite.
Seu objetivo é gerar queries SQL corretas para responder perguntas sobre indicadores municipais.";

/// Rules the model is told to follow. Every rule here is load-bearing: the
/// executor and the presentation adapters rely on the query shapes they
/// produce.
pub const RULES: &[&str] = &[
  "Retorne uma única query SQL válida para SQLite, somente leitura (SELECT).",
  "Utilize apenas tabelas e colunas existentes no schema: recortes_geograficos e valoresmeta.",
  "A tabela recortes_geograficos contém os municípios e seus recortes territoriais: semiárido, Região Intermediária, Tipologia da PNDR, Sudene, Região Imediata, Amazônia Legal, Estado/UF e Região.",
  "A tabela valoresmeta contém os indicadores, incluindo o valor (value), o nome do indicador (data_name) e a data de referência (refdate).",
  "Utilize sempre LEFT JOIN entre valoresmeta e recortes_geograficos, unindo-as por recortes_geograficos.codigo_ibge = valoresmeta.geoloc_id.",
  "Ao filtrar por recorte geográfico ou indicador, utilize sempre busca aproximada (LIKE '%termo%'), a não ser que o usuário peça pelo termo exato; nesse caso use igualdade.",
  "Se o usuário solicitar um município específico, retorne apenas os dados desse município, procurando na coluna município.",
  "Se o usuário solicitar um recorte geográfico ou administrativo sem citar município, retorne todos os municípios desse recorte.",
  "Se o usuário solicitar um indicador sem especificar recorte geográfico, retorne os valores do indicador para todos os municípios.",
  "Se o usuário não especificar uma data, retorne apenas a observação mais recente de cada par (geoloc_id, data_name), com uma subquery correlacionada: v.refdate = (SELECT MAX(refdate) FROM valoresmeta WHERE geoloc_id = v.geoloc_id AND data_name = v.data_name). Nunca use o máximo global.",
  "Se o usuário especificar uma data, retorne apenas as observações do mesmo ano: strftime('%Y', v.refdate) = 'AAAA'.",
  "Os estados estão descritos pelo nome por extenso na coluna estado.",
  "Se o usuário pedir um mapa, inclua também as colunas r.latitude e r.longitude.",
];

const CLOSING: &str =
  "Retorne apenas a query SQL, sem aspas, sem markdown, sem nenhum comentário ou explicação.";

// ─── Translator ──────────────────────────────────────────────────────────────

/// Grounds a [`TextToQuery`] provider in the schema catalog.
pub struct QueryTranslator<T> {
  provider: T,
  catalog:  SchemaCatalog,
}

impl<T: TextToQuery> QueryTranslator<T> {
  pub fn new(provider: T, catalog: SchemaCatalog) -> Self {
    Self { provider, catalog }
  }

  pub fn catalog(&self) -> &SchemaCatalog { &self.catalog }

  /// The complete grounding prompt for `question`.
  pub fn build_prompt(&self, question: &str) -> String {
    let mut prompt = String::with_capacity(8 * 1024);
    prompt.push_str(PREAMBLE);

    prompt.push_str("\n\n## Schema\n");
    prompt.push_str(&self.catalog.describe());

    prompt.push_str("\n## Regras para gerar SQL\n");
    for rule in RULES {
      prompt.push_str("- ");
      prompt.push_str(rule);
      prompt.push('\n');
    }

    prompt.push_str("\n## Exemplos de queries válidas\n");
    for example in self.catalog.examples() {
      prompt.push_str("\nPergunta: ");
      prompt.push_str(example.question);
      prompt.push('\n');
      prompt.push_str(example.query);
      prompt.push_str(";\n");
    }

    prompt.push_str("\n## Agora gere uma query SQL para responder a pergunta do usuário\n");
    prompt.push_str("Pergunta: ");
    prompt.push_str(question.trim());
    prompt.push('\n');
    prompt.push_str(CLOSING);
    prompt
  }

  /// Translate `question` into a cleaned query string.
  ///
  /// Only provider failures (and empty completions) are reported; whether the
  /// query is correct is for later stages to find out.
  pub async fn translate(&self, question: &str) -> Result<String, PipelineError> {
    let request = TranslationRequest {
      question: question.to_owned(),
      prompt:   self.build_prompt(question),
    };

    let raw = self
      .provider
      .complete(&request)
      .await
      .map_err(|e| PipelineError::TranslationUnavailable(e.to_string()))?;

    let query = clean_query_text(&raw);
    if query.is_empty() {
      return Err(PipelineError::TranslationUnavailable(
        "provider returned an empty completion".into(),
      ));
    }
    debug!(query = %query, "translated question");
    Ok(query)
  }
}

// ─── Completion clean-up ─────────────────────────────────────────────────────

/// Strip the artifacts models wrap queries in: code fences (with or without
/// a language tag), surrounding quotes or backticks, and trailing semicolons.
pub fn clean_query_text(raw: &str) -> String {
  let mut text = strip_fences(raw.trim()).trim();

  while let Some(inner) = strip_wrapping_quotes(text) {
    text = inner.trim();
  }

  text.trim_end_matches(|c: char| c == ';' || c.is_whitespace()).to_owned()
}

fn strip_fences(text: &str) -> &str {
  let Some(start) = text.find("```") else {
    return text;
  };
  let after = &text[start + 3..];

  // Drop an info string such as `sql` on the opening fence line.
  let body = match after.split_once('\n') {
    Some((info, rest)) if is_info_string(info) => rest,
    Some(_) => after,
    None => after
      .strip_prefix("sql")
      .or_else(|| after.strip_prefix("SQL"))
      .filter(|rest| rest.starts_with(char::is_whitespace))
      .unwrap_or(after),
  };

  match body.find("```") {
    Some(end) => &body[..end],
    None => body,
  }
}

/// Keywords a query can open with; a fence line holding one is query text.
const LEADING_KEYWORDS: &[&str] = &["select", "with", "values"];

fn is_info_string(line: &str) -> bool {
  let line = line.trim();
  if line.is_empty() {
    return true;
  }
  line.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    && !LEADING_KEYWORDS.iter().any(|k| line.eq_ignore_ascii_case(k))
}

fn strip_wrapping_quotes(text: &str) -> Option<&str> {
  let first = text.chars().next()?;
  if !matches!(first, '"' | '\'' | '`') || text.len() < 2 {
    return None;
  }
  text.strip_prefix(first)?.strip_suffix(first)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("upstream unavailable")]
  struct Unavailable;

  /// Answers with a fixed completion and records the prompt it was sent.
  struct Recording {
    reply:  Result<String, ()>,
    prompt: Mutex<Option<String>>,
  }

  impl Recording {
    fn replying(reply: &str) -> Self {
      Self { reply: Ok(reply.into()), prompt: Mutex::new(None) }
    }
  }

  impl TextToQuery for Recording {
    type Error = Unavailable;

    async fn complete(&self, request: &TranslationRequest) -> Result<String, Unavailable> {
      *self.prompt.lock().unwrap() = Some(request.prompt.clone());
      self.reply.clone().map_err(|_| Unavailable)
    }
  }

  #[test]
  fn clean_strips_fences_quotes_and_semicolons() {
    assert_eq!(clean_query_text("```sql\nSELECT 1;\n```"), "SELECT 1");
    assert_eq!(clean_query_text("```\nSELECT 1\n```"), "SELECT 1");
    assert_eq!(clean_query_text("```sql SELECT 1```"), "SELECT 1");
    assert_eq!(clean_query_text("```SELECT 1```"), "SELECT 1");
    assert_eq!(
      clean_query_text("```SELECT\n* FROM valoresmeta\n```"),
      "SELECT\n* FROM valoresmeta"
    );
    assert_eq!(clean_query_text("```sqlite\nSELECT 1\n```"), "SELECT 1");
    assert_eq!(clean_query_text("\"SELECT 1;\""), "SELECT 1");
    assert_eq!(clean_query_text("`SELECT 1`"), "SELECT 1");
    assert_eq!(clean_query_text("  SELECT 1 ;; \n"), "SELECT 1");
  }

  #[test]
  fn clean_finds_fenced_query_after_prose() {
    let raw = "Aqui está a consulta:\n```sql\nSELECT * FROM valoresmeta\n```\nEspero ter ajudado.";
    assert_eq!(clean_query_text(raw), "SELECT * FROM valoresmeta");
  }

  #[test]
  fn clean_keeps_inner_string_literals() {
    let raw = "SELECT * FROM recortes_geograficos WHERE estado LIKE '%Bahia%'";
    assert_eq!(clean_query_text(raw), raw);
  }

  #[test]
  fn prompt_carries_catalog_rules_examples_and_question() {
    let translator = QueryTranslator::new(Recording::replying("SELECT 1"), SchemaCatalog::pndr());
    let prompt = translator.build_prompt("  Como está a Desnutrição no Maranhão?  ");

    assert!(prompt.contains("recortes_geograficos(codigo_ibge BIGINT"));
    assert!(prompt.contains("LEFT JOIN"));
    assert!(prompt.contains("MAX(refdate)"));
    assert!(prompt.contains("strftime('%Y', v.refdate)"));
    assert!(prompt.contains("Pergunta: Como está a Desnutrição no Maranhão?\n"));
    assert!(prompt.ends_with(CLOSING));
    for example in SchemaCatalog::pndr().examples() {
      assert!(prompt.contains(example.query));
    }
  }

  #[tokio::test]
  async fn translate_returns_cleaned_completion() {
    let provider = Recording::replying("```sql\nSELECT * FROM valoresmeta;\n```");
    let translator = QueryTranslator::new(provider, SchemaCatalog::pndr());

    let query = translator.translate("todos os indicadores").await.unwrap();
    assert_eq!(query, "SELECT * FROM valoresmeta");

    let sent = translator.provider.prompt.lock().unwrap().clone().unwrap();
    assert!(sent.contains("Pergunta: todos os indicadores"));
  }

  #[tokio::test]
  async fn provider_failure_is_translation_unavailable() {
    let provider = Recording { reply: Err(()), prompt: Mutex::new(None) };
    let translator = QueryTranslator::new(provider, SchemaCatalog::pndr());

    let err = translator.translate("qualquer coisa").await.unwrap_err();
    assert!(matches!(err, PipelineError::TranslationUnavailable(_)));
  }

  #[tokio::test]
  async fn blank_completion_is_translation_unavailable() {
    let translator = QueryTranslator::new(Recording::replying("```\n```"), SchemaCatalog::pndr());
    let err = translator.translate("qualquer coisa").await.unwrap_err();
    assert!(matches!(err, PipelineError::TranslationUnavailable(_)));
  }
}
