//! [`SqliteStore`]: the writable side of the store, used to create the
//! schema and load data. The pipeline never goes through it.

use std::path::Path;

use pndr_core::{
  catalog::SchemaCatalog,
  model::{GeographicRecord, IndicatorObservation},
};
use rusqlite::params;
use serde::Deserialize;
use tracing::info;

use crate::{encode::encode_refdate, schema::schema, Result};

/// A JSON dump of both tables, keyed by table name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dump {
  #[serde(default)]
  pub recortes_geograficos: Vec<GeographicRecord>,
  #[serde(default)]
  pub valoresmeta:          Vec<IndicatorObservation>,
}

impl Dump {
  pub fn from_json(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_json(&raw)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub records:      usize,
  pub observations: usize,
}

/// A PNDR store opened for writing.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and create the catalog's tables.
  pub async fn open(path: impl AsRef<Path>, catalog: &SchemaCatalog) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema(catalog).await?;
    Ok(store)
  }

  async fn init_schema(&self, catalog: &SchemaCatalog) -> Result<()> {
    let script = schema(catalog);
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&script)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace geographic records, keyed by `codigo_ibge`.
  pub async fn insert_records(&self, records: Vec<GeographicRecord>) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO recortes_geograficos (
               codigo_ibge, \"município\", estado, \"região\", faixa_de_fronteira,
               participacao_semiarido, regiao_intermediaria, tipologia,
               participacao_sudene, regiao_imediata, participacao_amazonia_legal,
               longitude, latitude, geometry
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          )?;
          for r in &records {
            stmt.execute(params![
              r.codigo_ibge,
              r.municipio,
              r.estado,
              r.regiao,
              r.faixa_de_fronteira,
              r.participacao_semiarido,
              r.regiao_intermediaria,
              r.tipologia,
              r.participacao_sudene,
              r.regiao_imediata,
              r.participacao_amazonia_legal,
              r.longitude,
              r.latitude,
              r.geometry,
            ])?;
          }
        }
        tx.commit()?;
        Ok(records.len())
      })
      .await?;
    Ok(count)
  }

  /// Insert or replace indicator observations, keyed by `id`.
  pub async fn insert_observations(
    &self,
    observations: Vec<IndicatorObservation>,
  ) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO valoresmeta (
               id, mdata_id, geoloc_id, local_id, refdate, value,
               orig_name, data_name, local_name
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for o in &observations {
            stmt.execute(params![
              o.id,
              o.mdata_id,
              o.geoloc_id,
              o.local_id,
              encode_refdate(o.refdate),
              o.value,
              o.orig_name,
              o.data_name,
              o.local_name,
            ])?;
          }
        }
        tx.commit()?;
        Ok(observations.len())
      })
      .await?;
    Ok(count)
  }

  /// Load a whole dump. Re-importing the same dump leaves the store
  /// unchanged.
  pub async fn import(&self, dump: Dump) -> Result<ImportSummary> {
    let summary = ImportSummary {
      records:      self.insert_records(dump.recortes_geograficos).await?,
      observations: self.insert_observations(dump.valoresmeta).await?,
    };
    info!(
      records = summary.records,
      observations = summary.observations,
      "imported dump"
    );
    Ok(summary)
  }

  /// Flush and close the underlying connection.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }
}
