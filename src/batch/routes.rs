//! Route list input
//!
//! A route file is a CSV whose first row is a header. Each following record
//! names a route and lists the towns it serves as a comma-separated string in
//! the third column, e.g.
//!
//! ```text
//! route,also,towns
//! 21,Newark,"ORANGE, EAST ORANGE, NEWARK"
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

/// Column holding the town list
const TOWNS_FIELD: usize = 2;

/// Errors from reading a route file
#[derive(Debug, Error)]
pub enum RouteError {
    /// The route file could not be opened
    #[error("Failed to read route file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The route file is not valid CSV
    #[error("Malformed route file: {0}")]
    Csv(#[from] csv::Error),
}

/// One route record: a name and the raw town names it lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    /// Town names as written in the file, trimmed but not validated
    pub towns: Vec<String>,
}

/// Loads routes from a CSV file
pub fn load_routes(path: impl AsRef<Path>) -> Result<Vec<Route>, RouteError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| RouteError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_routes(file)
}

/// Reads routes from CSV text, skipping the header and short records
pub fn read_routes<R: io::Read>(reader: R) -> Result<Vec<Route>, RouteError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut routes = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(towns) = record.get(TOWNS_FIELD) else {
            warn!(
                line = record.position().map(|p| p.line()),
                fields = record.len(),
                "skipping route record without a town list"
            );
            continue;
        };

        routes.push(Route {
            name: record.get(0).unwrap_or_default().trim().to_string(),
            towns: towns
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }

    Ok(routes)
}
