//! Sparse origin/destination fare matrix and its CSV report

use std::collections::HashMap;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::data::{Fare, StopDirectory, StopName};

/// Header of the first report column
const STOP_COLUMN: &str = "stop";

/// Errors from writing the fare report
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file could not be written or moved into place
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// CSV encoding failed
    #[error("Failed to encode report: {0}")]
    Csv(#[from] csv::Error),
}

/// Fares looked up so far, keyed by origin then destination
///
/// A present cell holding `None` was looked up without finding a fare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FareMatrix {
    cells: HashMap<StopName, HashMap<StopName, Option<Fare>>>,
}

impl FareMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one lookup, replacing any earlier one
    pub fn insert(&mut self, origin: StopName, destination: StopName, fare: Option<Fare>) {
        self.cells.entry(origin).or_default().insert(destination, fare);
    }

    /// The recorded outcome for a cell; `None` if the pair was never looked up
    pub fn get(&self, origin: &StopName, destination: &StopName) -> Option<Option<Fare>> {
        self.cells.get(origin)?.get(destination).copied()
    }

    /// The fare for a cell, if one was found
    pub fn fare(&self, origin: &StopName, destination: &StopName) -> Option<Fare> {
        self.get(origin, destination).flatten()
    }

    /// Number of cells looked up
    pub fn len(&self) -> usize {
        self.cells.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the full square table: one row and one column per known stop,
    /// blank where no fare is known.
    pub fn write_csv<W: io::Write>(&self, stops: &StopDirectory, writer: W) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(stops.len() + 1);
        header.push(STOP_COLUMN);
        header.extend(stops.names().map(StopName::as_str));
        writer.write_record(&header)?;

        for origin in stops.names() {
            let mut row = Vec::with_capacity(stops.len() + 1);
            row.push(origin.to_string());
            row.extend(stops.names().map(|destination| {
                self.fare(origin, destination)
                    .map(|fare| fare.to_string())
                    .unwrap_or_default()
            }));
            writer.write_record(&row)?;
        }

        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Rewrites the report at `path`
    ///
    /// The table is written to a temporary sibling and renamed over the old
    /// report, so the file on disk is always a complete table.
    pub fn write_report(&self, stops: &StopDirectory, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let io_error = |source| ReportError::Io {
            path: path.display().to_string(),
            source,
        };

        let file_name = path.file_name().ok_or_else(|| {
            io_error(io::Error::new(io::ErrorKind::InvalidInput, "report path has no file name"))
        })?;
        let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

        let file = std::fs::File::create(&tmp).map_err(io_error)?;
        self.write_csv(stops, io::BufWriter::new(file))?;
        std::fs::rename(&tmp, path).map_err(io_error)
    }
}
