//! # Deal Record
//! One row of uploaded CRM data, as handed over by the (external) sheet
//! ingestion step.
//!
//! Scalar columns come out of spreadsheets in whatever form the cell had:
//! amounts as `"$12,500"` or `12500`, close dates as ISO text, US text or a
//! spreadsheet serial number. Those are parsed leniently here; unparsable
//! values become `None` instead of rejecting the row.

use chrono::{DateTime, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Immutable input record; the engine only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    #[serde(
        default,
        alias = "company_name",
        alias = "Company",
        alias = "Company Name",
        deserialize_with = "lenient_text"
    )]
    pub company: Option<String>,
    #[serde(default, alias = "Deal Name", alias = "deal", deserialize_with = "lenient_text")]
    pub deal_name: Option<String>,
    #[serde(
        default,
        alias = "deal_stage",
        alias = "Deal Stage",
        alias = "Stage",
        deserialize_with = "lenient_text"
    )]
    pub stage: Option<String>,
    #[serde(
        default,
        alias = "deal_amount",
        alias = "Amount",
        alias = "Deal Amount",
        deserialize_with = "lenient_amount"
    )]
    pub amount: Option<f64>,
    #[serde(
        default,
        alias = "ae",
        alias = "Deal Owner",
        alias = "Owner",
        deserialize_with = "lenient_text"
    )]
    pub owner: Option<String>,
    #[serde(
        default,
        alias = "Close Date",
        alias = "closeDate",
        deserialize_with = "lenient_date"
    )]
    pub close_date: Option<NaiveDate>,

    /// Opaque payloads: JSON text or already-decoded values of unknown shape.
    #[serde(default)]
    pub signals: Value,
    #[serde(default)]
    pub actions: Value,
    #[serde(default)]
    pub nba: Value,
}

impl DealRecord {
    /// Amount for monetary aggregates (missing/unparsable counts as zero).
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }
}

fn lenient_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(cell_text))
}

/// Text cell; numeric and boolean cells are rendered as text, anything else is `None`.
pub fn cell_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_amount<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(parse_amount))
}

fn lenient_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(parse_close_date))
}

/// Number, or a string with currency symbols / separators stripped.
pub fn parse_amount(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|x| x.is_finite())
        }
        _ => None,
    }
}

/// Spreadsheet epoch used by serial day numbers.
fn sheet_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// ISO date, RFC 3339 timestamp, US `MM/DD/YYYY`, or spreadsheet serial day.
pub fn parse_close_date(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::Number(n) => serial_to_date(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(d);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.date_naive());
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
                return Some(d);
            }
            // Serial numbers sometimes arrive as text.
            s.parse::<f64>().ok().and_then(serial_to_date)
        }
        _ => None,
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Day 1 is 1900-01-01; reject obviously bogus values.
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    sheet_epoch()?.checked_add_signed(Duration::days(serial.trunc() as i64))
}
