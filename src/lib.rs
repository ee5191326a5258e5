pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{geonames::GeoNamesTables, osrm::OsrmClient, storage::LocalStorage};
pub use config::AppConfig;
pub use core::{engine::MapEngine, pipeline::RouteMapPipeline};
pub use utils::error::{Result, RowError, ZiplinerError};
