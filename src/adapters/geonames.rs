//! Offline postal-code tables in the GeoNames dump format.
//!
//! Each country dump is a headerless, tab separated file with twelve columns:
//! country code, postal code, place name, three admin name/code pairs,
//! latitude, longitude and accuracy. The same postal code may appear on
//! several lines (one per locality); lookups return the aggregate.

use crate::config::toml_config::PostalConfig;
use crate::core::postal::CountrySet;
use crate::domain::model::{CountryCode, PostalEntry};
use crate::domain::ports::PostalLookup;
use crate::utils::error::{Result, ZiplinerError};
use reqwest::Client;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

pub const DEFAULT_GEONAMES_URL: &str = "https://download.geonames.org/export/zip";

const COL_POSTAL_CODE: usize = 1;
const COL_PLACE_NAME: usize = 2;
const COL_LATITUDE: usize = 9;
const COL_LONGITUDE: usize = 10;

#[derive(Debug, Default)]
struct Accumulator {
    lat_sum: f64,
    lon_sum: f64,
    located: usize,
    place_names: Vec<String>,
}

impl Accumulator {
    fn add(&mut self, place_name: &str, latitude: Option<f64>, longitude: Option<f64>) {
        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            self.lat_sum += lat;
            self.lon_sum += lon;
            self.located += 1;
        }
        let place_name = place_name.trim();
        if !place_name.is_empty() && !self.place_names.iter().any(|p| p == place_name) {
            self.place_names.push(place_name.to_string());
        }
    }

    fn finish(self) -> PostalEntry {
        let (latitude, longitude) = if self.located > 0 {
            let n = self.located as f64;
            (Some(self.lat_sum / n), Some(self.lon_sum / n))
        } else {
            (None, None)
        };
        PostalEntry {
            latitude,
            longitude,
            place_name: self.place_names.join(", "),
        }
    }
}

fn normalize_postal_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Postal codes of a single country.
#[derive(Debug, Clone, Default)]
pub struct GeoNamesTable {
    entries: HashMap<String, PostalEntry>,
}

impl GeoNamesTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut grouped: HashMap<String, Accumulator> = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let postal_code = normalize_postal_code(record.get(COL_POSTAL_CODE).unwrap_or_default());
            if postal_code.is_empty() {
                continue;
            }
            grouped.entry(postal_code).or_default().add(
                record.get(COL_PLACE_NAME).unwrap_or_default(),
                parse_coordinate(record.get(COL_LATITUDE)),
                parse_coordinate(record.get(COL_LONGITUDE)),
            );
        }

        Ok(Self {
            entries: grouped
                .into_iter()
                .map(|(code, acc)| (code, acc.finish()))
                .collect(),
        })
    }

    pub fn get(&self, postal_code: &str) -> Option<&PostalEntry> {
        self.entries.get(&normalize_postal_code(postal_code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// GeoNames tables for every allowed country of a run.
#[derive(Debug, Clone, Default)]
pub struct GeoNamesTables {
    tables: HashMap<CountryCode, GeoNamesTable>,
}

impl GeoNamesTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, country: CountryCode, table: GeoNamesTable) {
        self.tables.insert(country, table);
    }

    /// Loads `<data_dir>/<CC>.txt` for each country, falling back to an
    /// in-memory download of `<download_url>/<CC>.zip` when configured.
    pub async fn load(config: &PostalConfig, countries: &CountrySet, client: &Client) -> Result<Self> {
        let mut tables = Self::new();

        for country in countries.iter() {
            let path = Path::new(&config.data_dir).join(format!("{}.txt", country));
            let table = if path.exists() {
                tracing::debug!("Loading postal table {}", path.display());
                GeoNamesTable::from_reader(std::fs::File::open(&path)?)?
            } else if let Some(base_url) = config.download_base() {
                download_table(client, base_url, country).await?
            } else {
                return Err(ZiplinerError::DatasetError {
                    country: country.to_string(),
                    message: format!("{} does not exist and no download_url is configured", path.display()),
                });
            };

            if table.is_empty() {
                tracing::warn!("⚠️ Postal table for {} has no entries", country);
            } else {
                tracing::info!("📮 Loaded {} postal codes for {}", table.len(), country);
            }
            tables.insert(country.clone(), table);
        }

        Ok(tables)
    }
}

impl PostalLookup for GeoNamesTables {
    fn lookup(&self, country: &CountryCode, postal_code: &str) -> Option<PostalEntry> {
        self.tables.get(country)?.get(postal_code).cloned()
    }
}

async fn download_table(client: &Client, base_url: &str, country: &CountryCode) -> Result<GeoNamesTable> {
    let url = format!("{}/{}.zip", base_url.trim_end_matches('/'), country);
    tracing::info!("⬇️  Downloading postal table for {} from {}", country, url);

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(ZiplinerError::DatasetError {
            country: country.to_string(),
            message: format!("download from {} returned HTTP {}", url, response.status()),
        });
    }
    let bytes = response.bytes().await?;
    tracing::debug!("Downloaded {} bytes for {}", bytes.len(), country);

    // 只在記憶體中解壓，不寫入磁碟
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec()))?;
    let mut entry = archive.by_name(&format!("{}.txt", country))?;
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;

    GeoNamesTable::from_reader(content.as_slice())
}
