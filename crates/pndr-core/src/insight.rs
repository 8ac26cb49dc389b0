//! Result table → written narrative, through a second generative model.

use std::future::Future;

use tracing::debug;

use crate::{error::PipelineError, table::ResultTable};

/// What a narrative provider receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRequest {
  /// The expert persona, sent as the system instruction.
  pub instruction: String,
  /// The user content: the serialised table, or the no-data note.
  pub content:     String,
  pub row_count:   usize,
}

/// A text-generation capability that writes a narrative about a table.
pub trait TableToNarrative: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn narrate<'a>(
    &'a self,
    request: &'a NarrativeRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

pub const PERSONA: &str = "Você é um especialista em desenvolvimento regional no Brasil, analise os seguintes dados e forneça insights relevantes sobre o aspecto do desenvolvimento regional que eles representam.
Considere a importância dos dados, possíveis tendências, correlações e implicações para políticas públicas.
Na sua análise considere o disposto no Relatório de Monitoramento da PNDR de 2023 disponível no link para entender quais são os objetivos de 1 a 4, o que são os indicadores compostos e as fórmulas de cálculo dos indicadores: https://www.gov.br/mdr/pt-br/assuntos/desenvolvimento-regional/nucleo-de-inteligencia-regional/acompanhamento-dinamica/RelatorioMonitoramento20232.pdf";

const EMPTY_NOTE: &str = "A consulta não retornou nenhum dado. Explique ao usuário que não há dados para a pergunta feita e sugira verificar o nome do indicador, o recorte geográfico ou o ano.";

/// Used when the table is empty and the model has nothing to say.
pub const NO_DATA_NARRATIVE: &str = "A consulta não retornou dados. Verifique o nome do indicador, o recorte geográfico e o ano informados; a maioria dos indicadores possui dados apenas para o período de 2015 a 2022.";

pub struct InsightGenerator<N> {
  provider: N,
}

impl<N: TableToNarrative> InsightGenerator<N> {
  pub fn new(provider: N) -> Self { Self { provider } }

  pub fn request_for(table: &ResultTable) -> Result<NarrativeRequest, PipelineError> {
    let content = if table.is_empty() {
      EMPTY_NOTE.to_owned()
    } else {
      let json = table
        .to_records_json()
        .map_err(|e| PipelineError::InsightUnavailable(e.to_string()))?;
      format!("Analise os seguintes dados {json}")
    };
    Ok(NarrativeRequest {
      instruction: PERSONA.to_owned(),
      content,
      row_count: table.len(),
    })
  }

  /// Generation is attempted even for an empty table; the caller always gets
  /// a non-empty narrative for one.
  pub async fn generate(&self, table: &ResultTable) -> Result<String, PipelineError> {
    let request = Self::request_for(table)?;
    let narrative = self
      .provider
      .narrate(&request)
      .await
      .map_err(|e| PipelineError::InsightUnavailable(e.to_string()))?;

    let narrative = narrative.trim();
    if narrative.is_empty() {
      if table.is_empty() {
        return Ok(NO_DATA_NARRATIVE.to_owned());
      }
      return Err(PipelineError::InsightUnavailable(
        "provider returned an empty narrative".into(),
      ));
    }
    debug!(rows = table.len(), chars = narrative.len(), "generated narrative");
    Ok(narrative.to_owned())
  }
}
