pub mod engine;
pub mod input;
pub mod map;
pub mod pipeline;
pub mod postal;
pub mod report;
pub mod route;

pub use crate::domain::model::{FailureRecord, RouteRow, RunSummary};
pub use crate::domain::ports::{Pipeline, PostalLookup, RouteService, Storage};
pub use crate::utils::error::Result;
