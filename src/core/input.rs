use crate::domain::model::RouteRow;
use crate::utils::error::{Result, ZiplinerError};
use std::io::Read;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 4] = [
    "source_zip",
    "source_country",
    "destination_zip",
    "destination_country",
];

/// 讀取路線檔案
pub fn load_routes<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<RouteRow>> {
    let file = std::fs::File::open(path.as_ref())?;
    tracing::debug!("Reading routes from {}", path.as_ref().display());
    parse_routes(file, delimiter)
}

pub fn parse_routes<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RouteRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ZiplinerError::SchemaError { missing });
    }

    let index_of = |name: &str| headers.iter().position(|h| h == name);
    let columns = [
        index_of("source_zip"),
        index_of("source_country"),
        index_of("destination_zip"),
        index_of("destination_country"),
    ];

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        // 缺值一律視為空字串
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        rows.push(RouteRow {
            source_zip: cell(columns[0]),
            source_country: cell(columns[1]),
            destination_zip: cell(columns[2]),
            destination_country: cell(columns[3]),
        });
    }

    tracing::debug!("Parsed {} route rows", rows.len());
    Ok(rows)
}
