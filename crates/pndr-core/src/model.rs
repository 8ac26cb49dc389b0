//! Row types for the two queryable entities.
//!
//! The pipeline itself never materialises these: translated queries return
//! arbitrary projections as a [`ResultTable`](crate::table::ResultTable). They
//! exist for loading fixture data into a store and for documentation of the
//! data model the catalog describes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One municipality and its geographic/administrative cuts
/// (`recortes_geograficos`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicRecord {
  /// IBGE code; unique, and the join key into [`IndicatorObservation`].
  pub codigo_ibge:                 i64,
  #[serde(rename = "município")]
  pub municipio:                   String,
  pub estado:                      String,
  #[serde(rename = "região")]
  pub regiao:                      String,
  pub faixa_de_fronteira:          i64,
  pub participacao_semiarido:      Option<String>,
  pub regiao_intermediaria:        Option<String>,
  /// PNDR typology.
  pub tipologia:                   Option<String>,
  pub participacao_sudene:         Option<String>,
  pub regiao_imediata:             Option<String>,
  pub participacao_amazonia_legal: Option<String>,
  pub longitude:                   Option<f64>,
  pub latitude:                    Option<f64>,
  /// Opaque geometry descriptor; only map rendering cares about it.
  pub geometry:                    Option<String>,
}

/// One dated indicator value for one location (`valoresmeta`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
  pub id:         i64,
  pub mdata_id:   i64,
  /// Foreign key into [`GeographicRecord::codigo_ibge`]. Not enforced: an
  /// observation may reference a code with no geographic record.
  pub geoloc_id:  i64,
  pub local_id:   Option<i64>,
  /// Only the date part is meaningful.
  #[serde(with = "refdate")]
  pub refdate:    NaiveDateTime,
  pub value:      Option<f64>,
  pub orig_name:  Option<String>,
  /// Free-text indicator name, matched approximately.
  pub data_name:  String,
  pub local_name: Option<String>,
}

/// Storage format for [`IndicatorObservation::refdate`].
pub const REFDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a reference date as found in dumps: the storage format, ISO 8601
/// with a `T` separator, or a bare date.
pub fn parse_refdate(raw: &str) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  [REFDATE_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .or_else(|| {
      NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

mod refdate {
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&dt.format(super::REFDATE_FORMAT))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    super::parse_refdate(&raw)
      .ok_or_else(|| D::Error::custom(format!("invalid refdate: {raw:?}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn refdate_accepts_dump_formats() {
    let expected = NaiveDate::from_ymd_opt(2022, 1, 1)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap();
    for raw in ["2022-01-01 00:00:00", "2022-01-01T00:00:00", "2022-01-01T00:00:00.000", "2022-01-01"] {
      assert_eq!(parse_refdate(raw), Some(expected), "{raw}");
    }
    assert_eq!(parse_refdate("01/01/2022"), None);
  }

  #[test]
  fn observation_serialises_refdate_in_storage_format() {
    let obs: IndicatorObservation = serde_json::from_value(serde_json::json!({
      "id": 1, "mdata_id": 7, "geoloc_id": 2927408, "local_id": null,
      "refdate": "2022-01-01", "value": null, "orig_name": null,
      "data_name": "Sustentabilidade Fiscal dos Municípios", "local_name": "Salvador"
    }))
    .unwrap();
    let json = serde_json::to_value(&obs).unwrap();
    assert_eq!(json["refdate"], "2022-01-01 00:00:00");
    assert!(json["value"].is_null());
  }
}
