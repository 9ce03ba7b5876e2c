//! Donation dataset loading
//!
//! The CSV is Latin-1 encoded. It is read once at startup and only used to
//! populate the select options of the prediction form.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;

pub const NEIGHBOURHOOD: &str = "Neighbourhood";
pub const STAKE: &str = "Stake";
pub const ROUTE: &str = "New Route Number/Name";
pub const ROUTES_COMPLETED: &str = "Routes Completed";
pub const DOORS_IN_ROUTE: &str = "Doors in Route";
pub const TIME_SPENT: &str = "Time Spent";

/// One row of the donation dataset
///
/// Only the three categorical columns feed the form. The numeric columns are
/// kept for inspection (`rows` in the load log, tests) and are not read by
/// any page or by prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationRecord {
    pub neighbourhood: String,
    pub stake: String,
    pub route: String,
    /// Numeric cells are parsed leniently; blanks and junk become `None`
    pub routes_completed: Option<f64>,
    pub doors_in_route: Option<f64>,
    pub time_spent: Option<f64>,
}

/// Distinct values offered by the prediction form's drop-downs, first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectOptions {
    pub neighbourhoods: Vec<String>,
    pub stakes: Vec<String>,
    pub routes: Vec<String>,
}

/// The loaded dataset
///
/// `options` drives the prediction form. `records` is informational only:
/// nothing is computed from it at request time.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<DonationRecord>,
    pub options: SelectOptions,
}

impl Dataset {
    /// Read and parse the dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let dataset = Self::from_latin1(&bytes)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.records.len(),
            neighbourhoods = dataset.options.neighbourhoods.len(),
            stakes = dataset.options.stakes.len(),
            routes = dataset.options.routes.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Parse Latin-1 CSV bytes
    pub fn from_latin1(bytes: &[u8]) -> Result<Self> {
        // Latin-1 maps each byte to the code point of the same value
        let text: String = bytes.iter().map(|&b| b as char).collect();
        Self::from_csv_str(&text)
    }

    /// Parse already-decoded CSV text
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };

        let neighbourhood = column(NEIGHBOURHOOD)?;
        let stake = column(STAKE)?;
        let route = column(ROUTE)?;
        // Numeric columns are informational; a dataset without them still serves
        let routes_completed = column(ROUTES_COMPLETED).ok();
        let doors_in_route = column(DOORS_IN_ROUTE).ok();
        let time_spent = column(TIME_SPENT).ok();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let text_at = |idx: usize| row.get(idx).unwrap_or("").to_string();
            let number_at = |idx: Option<usize>| {
                idx.and_then(|i| row.get(i))
                    .and_then(|v| v.trim().parse::<f64>().ok())
            };

            records.push(DonationRecord {
                neighbourhood: text_at(neighbourhood),
                stake: text_at(stake),
                route: text_at(route),
                routes_completed: number_at(routes_completed),
                doors_in_route: number_at(doors_in_route),
                time_spent: number_at(time_spent),
            });
        }

        let options = SelectOptions::from_records(&records);
        Ok(Self { records, options })
    }
}

impl SelectOptions {
    /// Collect distinct non-empty values per categorical column
    pub fn from_records(records: &[DonationRecord]) -> Self {
        Self {
            neighbourhoods: unique(records.iter().map(|r| r.neighbourhood.as_str())),
            stakes: unique(records.iter().map(|r| r.stake.as_str())),
            routes: unique(records.iter().map(|r| r.route.as_str())),
        }
    }
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if value.trim().is_empty() {
            continue;
        }
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Neighbourhood,Stake,New Route Number/Name,Routes Completed,Doors in Route,Time Spent
WOODBEND,Edmonton North,R1,5,120,60
DEVON,Gateway,R2,3,,45
WOODBEND,Edmonton North,R3,2,80,n/a
,Gateway,R2,1,50,30
";

    #[test]
    fn test_parse_records() {
        let dataset = Dataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(dataset.records.len(), 4);

        let first = &dataset.records[0];
        assert_eq!(first.neighbourhood, "WOODBEND");
        assert_eq!(first.route, "R1");
        assert_eq!(first.doors_in_route, Some(120.0));

        assert_eq!(dataset.records[1].doors_in_route, None);
        assert_eq!(dataset.records[2].time_spent, None);
    }

    #[test]
    fn test_options_are_unique_in_first_seen_order() {
        let dataset = Dataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(dataset.options.neighbourhoods, vec!["WOODBEND", "DEVON"]);
        assert_eq!(dataset.options.stakes, vec!["Edmonton North", "Gateway"]);
        assert_eq!(dataset.options.routes, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn test_missing_categorical_column() {
        let err = Dataset::from_csv_str("Neighbourhood,Stake\nA,B\n").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == ROUTE));
    }

    #[test]
    fn test_numeric_columns_optional() {
        let dataset =
            Dataset::from_csv_str("Stake,Neighbourhood,New Route Number/Name\nS,N,R\n").unwrap();
        assert_eq!(dataset.records[0].neighbourhood, "N");
        assert_eq!(dataset.records[0].routes_completed, None);
    }

    #[test]
    fn test_latin1_decoding() {
        let mut bytes = b"Neighbourhood,Stake,New Route Number/Name\n".to_vec();
        // "MONTR\xC9AL" in Latin-1
        bytes.extend_from_slice(b"MONTR\xC9AL,S,R\n");
        let dataset = Dataset::from_latin1(&bytes).unwrap();
        assert_eq!(dataset.options.neighbourhoods, vec!["MONTRÉAL"]);
    }

    #[test]
    fn test_header_whitespace_tolerated() {
        let dataset =
            Dataset::from_csv_str("Neighbourhood ,Stake, New Route Number/Name\nA,B,C\n").unwrap();
        assert_eq!(dataset.options.routes, vec!["C"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
