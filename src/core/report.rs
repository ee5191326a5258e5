use crate::core::map::MapArtifact;
use crate::domain::model::FailureRecord;
use crate::utils::error::{Result, ZiplinerError};

/// Result of processing every row: the finished map plus the rows that failed.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub map: MapArtifact,
    pub failures: Vec<FailureRecord>,
    pub succeeded: usize,
}

/// Serializes failure records as a delimited table with a header row.
pub fn failures_to_table(records: &[FailureRecord], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ZiplinerError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string())))
}
