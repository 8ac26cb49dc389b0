//! Presentation adapters: optional views derived from a result table.
//!
//! Each adapter returns `None` when the table does not have the shape it
//! needs; that is not an error.

pub mod chart;
pub mod map;

use std::{collections::HashMap, future::Future, sync::Arc};

use serde_json::Value as Json;

use crate::{Error, Result};

pub use self::{
  chart::{Bar, BarChart, build_chart},
  map::{ChoroplethMap, LegendBin, MapPlan},
};

// ─── Boundaries ──────────────────────────────────────────────────────────────

/// Municipality polygons keyed by IBGE code (`properties.codarea`).
#[derive(Debug, Clone, Default)]
pub struct BoundaryIndex {
  geometries: HashMap<i64, Json>,
}

impl BoundaryIndex {
  /// Index a GeoJSON `FeatureCollection`. Features without a readable
  /// `codarea` are skipped.
  pub fn from_geojson(collection: Json) -> Result<Self> {
    let Json::Object(mut root) = collection else {
      return Err(Error::InvalidBoundaries("expected a JSON object".into()));
    };
    let Some(Json::Array(features)) = root.remove("features") else {
      return Err(Error::InvalidBoundaries("missing `features` array".into()));
    };

    let geometries = features
      .into_iter()
      .filter_map(|mut feature| {
        let code = feature.pointer("/properties/codarea").and_then(parse_code)?;
        let geometry = feature.get_mut("geometry")?.take();
        Some((code, geometry))
      })
      .collect();
    Ok(Self { geometries })
  }

  pub fn len(&self) -> usize { self.geometries.len() }

  pub fn is_empty(&self) -> bool { self.geometries.is_empty() }

  pub fn geometry(&self, code: i64) -> Option<&Json> { self.geometries.get(&code) }
}

/// IBGE serves codes as strings; accept numbers too.
fn parse_code(value: &Json) -> Option<i64> {
  match value {
    Json::String(s) => s.trim().parse().ok(),
    Json::Number(n) => n.as_i64(),
    _ => None,
  }
}

/// Where municipality polygons come from. Implementations cache; the
/// pipeline calls this on every request that produces a map.
pub trait BoundarySource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn boundaries<'a>(
    &'a self,
  ) -> impl Future<Output = Result<Arc<BoundaryIndex>, Self::Error>> + Send + 'a;
}
