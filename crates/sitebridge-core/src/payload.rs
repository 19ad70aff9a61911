//! Data handed to downstream collaborators: delimited exports and status
//! objects.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::error::{Error, InvalidInputError, ProtocolError};
use crate::tokens::ExportToken;

/// Tracking status fields, passed through exactly as the server sent them.
pub type StatusObject = serde_json::Map<String, serde_json::Value>;

/// One exported row, keyed by column name in header order.
///
/// Serializes as a JSON object whose keys follow the export's columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportRecord(Vec<(String, String)>);

impl ExportRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ExportRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<&str> for ExportRecord {
    type Output = String;

    fn index(&self, column: &str) -> &String {
        match self.0.iter().find(|(name, _)| name == column) {
            Some((_, value)) => value,
            None => panic!("no column named '{column}' in export row"),
        }
    }
}

impl Serialize for ExportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Report the export endpoint should generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    Servings,
    DailySummary,
    Exercises,
    Biometrics,
    Notes,
}

impl ExportKind {
    /// Value of the `type`/`generate` query parameters.
    pub fn as_param(&self) -> &'static str {
        match self {
            ExportKind::Servings => "servings",
            ExportKind::DailySummary => "dailySummary",
            ExportKind::Exercises => "exercises",
            ExportKind::Biometrics => "biometrics",
            ExportKind::Notes => "notes",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for ExportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "servings" => Ok(ExportKind::Servings),
            "dailysummary" => Ok(ExportKind::DailySummary),
            "exercises" => Ok(ExportKind::Exercises),
            "biometrics" => Ok(ExportKind::Biometrics),
            "notes" => Ok(ExportKind::Notes),
            other => Err(crate::error::ConfigError::InvalidValue {
                field: "export kind".to_string(),
                reason: format!("unknown kind '{other}'"),
            }
            .into()),
        }
    }
}

/// A date-bounded export request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRequest {
    kind: ExportKind,
    start: NaiveDate,
    end: NaiveDate,
}

impl ExportRequest {
    /// Build a request for `start..=end`.
    pub fn new(kind: ExportKind, start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if end < start {
            return Err(InvalidInputError::Date {
                value: end.to_string(),
                reason: format!("end date is before start date {start}"),
            }
            .into());
        }
        Ok(Self { kind, start, end })
    }

    /// Today through tomorrow in local time, the incremental-sync window.
    pub fn today(kind: ExportKind) -> Self {
        let start = Local::now().date_naive();
        let end = start.checked_add_days(Days::new(1)).unwrap_or(start);
        Self { kind, start, end }
    }

    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Query parameters for the export GET, carrying `token` as the nonce.
    pub fn query(&self, token: &ExportToken) -> Vec<(&'static str, String)> {
        vec![
            ("type", self.kind.as_param().to_string()),
            ("generate", self.kind.as_param().to_string()),
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
            ("nonce", token.as_str().to_string()),
        ]
    }
}

/// Parse a date given as `YYYY-MM-DD`, ignoring any time part.
pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    let day = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
        InvalidInputError::Date {
            value: s.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Rows of a delimited export, in the order the server sent them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<ExportRecord>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse a comma-delimited body with a header row.
    ///
    /// An empty body is an empty table: a quiet day is not a failure.
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let body = body.trim_start_matches('\u{feff}');
        if body.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(body.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| ProtocolError::Export {
                reason: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ProtocolError::Export {
                reason: e.to_string(),
            })?;
            let row: ExportRecord = columns
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_order() {
        let table = ExportTable::parse("name,amount\nOats,40\nMilk,250\n").unwrap();
        assert_eq!(table.columns, vec!["name", "amount"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["name"], "Oats");
        assert_eq!(table.rows[0]["amount"], "40");
        assert_eq!(table.rows[1]["name"], "Milk");
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn rows_keep_column_order() {
        let table = ExportTable::parse("Zinc,Day,Amount\n3,2024-01-01,1\n").unwrap();
        let row = &table.rows[0];

        let columns: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["Zinc", "Day", "Amount"]);
        assert_eq!(row.get("Day"), Some("2024-01-01"));
        assert_eq!(row.get("Iron"), None);
        assert_eq!(
            serde_json::to_string(row).unwrap(),
            r#"{"Zinc":"3","Day":"2024-01-01","Amount":"1"}"#
        );
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let table = ExportTable::parse("name,amount\n\"Eggs, scrambled\",2\n").unwrap();
        assert_eq!(table.rows[0]["name"], "Eggs, scrambled");
    }

    #[test]
    fn empty_body_is_empty_table() {
        assert!(ExportTable::parse("").unwrap().is_empty());
        assert!(ExportTable::parse("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn header_only_is_empty_table() {
        let table = ExportTable::parse("name,amount\n").unwrap();
        assert_eq!(table.columns.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(ExportTable::parse("name,amount\nOats\n").is_err());
    }

    #[test]
    fn query_carries_token_and_dates() {
        let request = ExportRequest::new(
            ExportKind::Servings,
            parse_date("2024-01-01").unwrap(),
            parse_date("2024-01-02T00:00:00").unwrap(),
        )
        .unwrap();
        let token = ExportToken::new("tok");
        let query = request.query(&token);

        assert!(query.contains(&("start", "2024-01-01".to_string())));
        assert!(query.contains(&("end", "2024-01-02".to_string())));
        assert!(query.contains(&("nonce", "tok".to_string())));
        assert!(query.contains(&("generate", "servings".to_string())));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let start = parse_date("2024-01-02").unwrap();
        let end = parse_date("2024-01-01").unwrap();
        assert!(ExportRequest::new(ExportKind::Notes, start, end).is_err());
    }

    #[test]
    fn today_spans_one_day() {
        let request = ExportRequest::today(ExportKind::DailySummary);
        assert_eq!(request.end() - request.start(), chrono::Duration::days(1));
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("daily-summary".parse::<ExportKind>().unwrap(), ExportKind::DailySummary);
        assert_eq!("dailySummary".parse::<ExportKind>().unwrap(), ExportKind::DailySummary);
        assert!("meals".parse::<ExportKind>().is_err());
    }
}
