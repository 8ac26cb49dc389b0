//! Choropleth map of the indicator value per municipality.
//!
//! Building a map is split in two so the boundary collection is only fetched
//! when the table can actually be mapped: [`MapPlan::from_table`] is pure and
//! decides that, [`MapPlan::render`] joins the plan against the polygons.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};

use super::BoundaryIndex;
use crate::table::ResultTable;

pub const ZOOM: u8 = 5;
pub const FILL_OPACITY: f64 = 0.8;
pub const LINE_WEIGHT: f64 = 0.1;
pub const NO_DATA_FILL: &str = "#ffffff";
pub const NO_DATA_OPACITY: f64 = 0.4;

/// ColorBrewer `YlGn`, six classes, light to dark.
pub const YLGN: [&str; 6] =
  ["#ffffcc", "#d9f0a3", "#addd8e", "#78c679", "#31a354", "#006837"];

/// The boundary dataset's join property.
pub const JOIN_PROPERTY: &str = "codarea";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendBin {
  pub lower: f64,
  pub upper: f64,
  pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethMap {
  /// `[latitude, longitude]` of the initial view.
  pub center:    [f64; 2],
  pub zoom:      u8,
  pub legend:    Vec<LegendBin>,
  /// GeoJSON `FeatureCollection` with per-feature style properties.
  pub features:  Json,
  /// Codes present in the table with no polygon in the boundary collection.
  pub unmatched: Vec<i64>,
}

// ─── Plan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Area {
  code:  i64,
  name:  Option<String>,
  value: Option<f64>,
}

/// A table that has the shape of a map, reduced to what rendering needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlan {
  center: [f64; 2],
  areas:  Vec<Area>,
}

impl MapPlan {
  /// `None` unless the table has rows, `latitude`, `longitude` and
  /// `codigo_ibge` columns, and at least one coordinate pair. Later rows
  /// repeating a `codigo_ibge` (tied dates, several years) are ignored.
  pub fn from_table(table: &ResultTable) -> Option<Self> {
    if table.is_empty() {
      return None;
    }
    let lat_idx = table.column_index("latitude")?;
    let lon_idx = table.column_index("longitude")?;
    let code_idx = table.column_index("codigo_ibge")?;
    let value_idx = table.column_index("value");
    let name_idx = table.first_column_of(super::chart::CATEGORY_COLUMNS);

    let (mut lat_sum, mut lon_sum, mut n) = (0.0, 0.0, 0usize);
    let mut areas = Vec::with_capacity(table.len());
    let mut seen = HashSet::new();
    for row in &table.rows {
      let cell = |idx: usize| row.get(idx);
      let code = cell(code_idx).and_then(|v| v.as_i64());
      // One polygon per municipality: the first row for a code wins.
      if let Some(code) = code
        && !seen.insert(code)
      {
        continue;
      }
      if let (Some(lat), Some(lon)) = (
        cell(lat_idx).and_then(|v| v.as_f64()),
        cell(lon_idx).and_then(|v| v.as_f64()),
      ) {
        lat_sum += lat;
        lon_sum += lon;
        n += 1;
      }
      // Rows without a code cannot be joined to a polygon.
      let Some(code) = code else {
        continue;
      };
      areas.push(Area {
        code,
        name: name_idx.and_then(cell).map(|v| v.to_label()),
        value: value_idx.and_then(cell).and_then(|v| v.as_f64()),
      });
    }

    if n == 0 {
      return None;
    }
    let center = [lat_sum / n as f64, lon_sum / n as f64];
    Some(Self { center, areas })
  }

  pub fn center(&self) -> [f64; 2] { self.center }

  pub fn len(&self) -> usize { self.areas.len() }

  pub fn is_empty(&self) -> bool { self.areas.is_empty() }

  /// Join against the polygons and style every area.
  pub fn render(&self, boundaries: &BoundaryIndex) -> ChoroplethMap {
    let scale = Scale::over(self.areas.iter().filter_map(|a| a.value));

    let mut features = Vec::with_capacity(self.areas.len());
    let mut unmatched = Vec::new();
    for area in &self.areas {
      let Some(geometry) = boundaries.geometry(area.code) else {
        unmatched.push(area.code);
        continue;
      };

      let (fill, opacity) = match (area.value, &scale) {
        (Some(v), Some(scale)) => (scale.color(v), FILL_OPACITY),
        _ => (NO_DATA_FILL, NO_DATA_OPACITY),
      };

      let mut properties = Map::new();
      properties.insert(JOIN_PROPERTY.into(), json!(area.code.to_string()));
      if let Some(name) = &area.name {
        properties.insert("name".into(), json!(name));
      }
      properties.insert("value".into(), json!(area.value));
      properties.insert("fill".into(), json!(fill));
      properties.insert("fill-opacity".into(), json!(opacity));
      properties.insert("stroke-width".into(), json!(LINE_WEIGHT));

      features.push(json!({
        "type": "Feature",
        "properties": properties,
        "geometry": geometry,
      }));
    }

    ChoroplethMap {
      center: self.center,
      zoom: ZOOM,
      legend: scale.map(|s| s.legend()).unwrap_or_default(),
      features: json!({ "type": "FeatureCollection", "features": features }),
      unmatched,
    }
  }
}

// ─── Colour scale ────────────────────────────────────────────────────────────

/// Equal-width classes between the minimum and maximum value.
struct Scale {
  min:   f64,
  width: f64,
}

impl Scale {
  fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
    let (min, max) = values
      .filter(|v| v.is_finite())
      .fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
      })?;
    Some(Self { min, width: (max - min) / YLGN.len() as f64 })
  }

  fn class(&self, value: f64) -> usize {
    if self.width <= 0.0 {
      return 0;
    }
    let class = ((value - self.min) / self.width).floor();
    (class.max(0.0) as usize).min(YLGN.len() - 1)
  }

  fn color(&self, value: f64) -> &'static str { YLGN[self.class(value)] }

  fn legend(&self) -> Vec<LegendBin> {
    YLGN
      .iter()
      .enumerate()
      .map(|(i, color)| LegendBin {
        lower: self.min + self.width * i as f64,
        upper: self.min + self.width * (i + 1) as f64,
        color: (*color).to_owned(),
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::table::Value;

  fn mappable() -> ResultTable {
    let row = |code: i64, name: &str, value: Value, lat: f64, lon: f64| {
      vec![
        Value::Integer(code),
        Value::Text(name.into()),
        value,
        Value::Real(lat),
        Value::Real(lon),
      ]
    };
    ResultTable::from_rows(
      vec![
        "codigo_ibge".into(),
        "município".into(),
        "value".into(),
        "latitude".into(),
        "longitude".into(),
      ],
      vec![
        row(4127700, "Toledo", Value::Real(10.0), -24.0, -53.0),
        row(4106902, "Curitiba", Value::Real(70.0), -26.0, -49.0),
        row(4100000, "Sem Valor", Value::Null, -25.0, -51.0),
      ],
    )
  }

  fn boundaries(codes: &[i64]) -> BoundaryIndex {
    let features: Vec<_> = codes
      .iter()
      .map(|c| {
        json!({
          "type": "Feature",
          "properties": { "codarea": c.to_string() },
          "geometry": { "type": "Polygon", "coordinates": [] },
        })
      })
      .collect();
    BoundaryIndex::from_geojson(json!({ "type": "FeatureCollection", "features": features }))
      .unwrap()
  }

  #[test]
  fn centre_is_mean_of_coordinates() {
    let plan = MapPlan::from_table(&mappable()).unwrap();
    assert_eq!(plan.center(), [-25.0, -51.0]);
    assert_eq!(plan.len(), 3);
  }

  #[test]
  fn null_values_get_no_data_fill_and_are_kept() {
    let map = MapPlan::from_table(&mappable())
      .unwrap()
      .render(&boundaries(&[4127700, 4106902, 4100000]));

    let features = map.features["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[0]["properties"]["codarea"], "4127700");
    assert_eq!(features[0]["properties"]["fill"], YLGN[0]);
    assert_eq!(features[1]["properties"]["fill"], YLGN[5]);
    assert_eq!(features[1]["properties"]["fill-opacity"], FILL_OPACITY);
    assert_eq!(features[2]["properties"]["fill"], NO_DATA_FILL);
    assert_eq!(features[2]["properties"]["fill-opacity"], NO_DATA_OPACITY);
    assert!(features[2]["properties"]["value"].is_null());
    assert_eq!(map.zoom, ZOOM);
  }

  #[test]
  fn legend_spans_min_to_max_in_six_classes() {
    let map = MapPlan::from_table(&mappable()).unwrap().render(&boundaries(&[]));
    assert_eq!(map.legend.len(), 6);
    assert_eq!(map.legend[0].lower, 10.0);
    assert_eq!(map.legend[5].upper, 70.0);
    assert_eq!(map.unmatched, vec![4127700, 4106902, 4100000]);
  }

  #[test]
  fn repeated_codes_draw_one_area() {
    let mut table = mappable();
    let mut again = table.rows[0].clone();
    again[2] = Value::Real(40.0);
    table.rows.push(again);

    let plan = MapPlan::from_table(&table).unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.center(), [-25.0, -51.0]);

    let map = plan.render(&boundaries(&[4127700, 4106902, 4100000]));
    let features = map.features["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[0]["properties"]["value"], 10.0);
  }

  #[test]
  fn single_value_uses_first_class() {
    let scale = Scale::over([3.0, 3.0].into_iter()).unwrap();
    assert_eq!(scale.color(3.0), YLGN[0]);
  }

  #[test]
  fn no_plan_without_coordinates() {
    let mut table = mappable();
    let lat = table.column_index("latitude").unwrap();
    for row in &mut table.rows {
      row[lat] = Value::Null;
    }
    assert!(MapPlan::from_table(&table).is_none());

    let no_coords = ResultTable::from_rows(
      vec!["codigo_ibge".into(), "value".into()],
      vec![vec![Value::Integer(1), Value::Real(1.0)]],
    );
    assert!(MapPlan::from_table(&no_coords).is_none());
  }
}
