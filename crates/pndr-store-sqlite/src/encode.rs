//! Conversions between SQLite values and the pipeline's cell and row types.
//!
//! Reference dates are stored as `YYYY-MM-DD HH:MM:SS` text so that
//! `strftime` and plain string comparison both work on them. BLOB cells have
//! no JSON form and are carried as lowercase hex text.

use chrono::NaiveDateTime;
use pndr_core::{model::REFDATE_FORMAT, table::Value};
use rusqlite::types::ValueRef;

pub fn decode_cell(cell: ValueRef<'_>) -> Value {
  match cell {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(r) => Value::Real(r),
    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::Text(hex::encode(b)),
  }
}

pub fn encode_refdate(dt: NaiveDateTime) -> String { dt.format(REFDATE_FORMAT).to_string() }

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn blobs_become_hex_text() {
    assert_eq!(
      decode_cell(ValueRef::Blob(&[0xca, 0xfe])),
      Value::Text("cafe".into())
    );
    assert_eq!(decode_cell(ValueRef::Null), Value::Null);
  }

  #[test]
  fn refdate_is_stored_without_t_separator() {
    let dt = NaiveDate::from_ymd_opt(2019, 12, 31)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap();
    assert_eq!(encode_refdate(dt), "2019-12-31 00:00:00");
  }
}
