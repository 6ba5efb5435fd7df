//! Stop directory for NJ Transit bus towns
//!
//! Maps human-readable town names to the selector codes the carrier's trip
//! planner form expects. The built-in table can be replaced with a CSV file of
//! `name,selector` rows when the carrier's list changes.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::StopName;

/// Built-in towns and their planner selector codes, in canonical report order
pub static BUILTIN_STOPS: [(&str, &str); 30] = [
    ("BAYONNE", "HUD~BAYONNE"),
    ("BELLEVILLE", "ESX~BELLEVILLE"),
    ("BLOOMFIELD", "ESX~BLOOMFIELD"),
    ("CALDWELL", "ESX~CALDWELL"),
    ("CLIFTON", "PAS~CLIFTON"),
    ("EAST ORANGE", "ESX~EAST ORANGE"),
    ("ELIZABETH", "UNI~ELIZABETH"),
    ("GLEN RIDGE", "ESX~GLEN RIDGE"),
    ("HARRISON", "HUD~HARRISON"),
    ("HILLSIDE", "UNI~HILLSIDE"),
    ("HOBOKEN", "HUD~HOBOKEN"),
    ("IRVINGTON", "ESX~IRVINGTON"),
    ("JERSEY CITY", "HUD~JERSEY CITY"),
    ("KEARNY", "HUD~KEARNY"),
    ("LINDEN", "UNI~LINDEN"),
    ("LIVINGSTON", "ESX~LIVINGSTON"),
    ("MAPLEWOOD", "ESX~MAPLEWOOD"),
    ("MONTCLAIR", "ESX~MONTCLAIR"),
    ("NEW YORK", "NYC~NEW YORK"),
    ("NEWARK", "ESX~NEWARK"),
    ("NORTH BERGEN", "HUD~NORTH BERGEN"),
    ("NUTLEY", "ESX~NUTLEY"),
    ("ORANGE", "ESX~ORANGE"),
    ("PASSAIC", "PAS~PASSAIC"),
    ("PATERSON", "PAS~PATERSON"),
    ("RAHWAY", "UNI~RAHWAY"),
    ("SECAUCUS", "HUD~SECAUCUS"),
    ("SOUTH ORANGE", "ESX~SOUTH ORANGE"),
    ("UNION CITY", "HUD~UNION CITY"),
    ("WEST ORANGE", "ESX~WEST ORANGE"),
];

/// Errors from building or querying the stop directory
#[derive(Debug, Error)]
pub enum StopError {
    /// The town is not in the directory
    #[error("{0} not in valid stop names")]
    InvalidStopName(String),

    /// A stop file could not be opened
    #[error("Failed to read stop file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A stop file row could not be parsed
    #[error("Malformed stop file: {0}")]
    Csv(#[from] csv::Error),

    /// The same town appears twice
    #[error("Duplicate stop name: {0}")]
    DuplicateStop(String),

    /// A row normalized to an empty name
    #[error("Empty stop name for selector {0}")]
    EmptyName(String),
}

/// Normalizes a raw town name: trims, strips apostrophes, uppercases.
///
/// Normalizing twice gives the same result as normalizing once.
pub fn normalize_town(raw: &str) -> String {
    raw.replace('\'', "").trim().to_uppercase()
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    name: String,
    selector: String,
}

/// Lookup table from normalized town name to carrier selector code
#[derive(Debug, Clone)]
pub struct StopDirectory {
    /// Stops in canonical order with their selector codes
    stops: Vec<(StopName, String)>,
    /// Normalized name to position in `stops`
    index: HashMap<String, usize>,
}

impl Default for StopDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StopDirectory {
    /// Creates the directory from the built-in town table
    pub fn builtin() -> Self {
        let mut index = HashMap::with_capacity(BUILTIN_STOPS.len());
        let stops = BUILTIN_STOPS
            .iter()
            .enumerate()
            .map(|(i, (name, selector))| {
                index.insert(name.to_string(), i);
                (StopName::new(name.to_string()), selector.to_string())
            })
            .collect();
        Self { stops, index }
    }

    /// Builds a directory from `(name, selector)` pairs, keeping their order.
    ///
    /// Names are normalized. Duplicate or empty names are rejected.
    pub fn from_entries<I, N, S>(entries: I) -> Result<Self, StopError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: Into<String>,
    {
        let mut stops = Vec::new();
        let mut index = HashMap::new();

        for (name, selector) in entries {
            let selector = selector.into();
            let name = normalize_town(name.as_ref());
            if name.is_empty() {
                return Err(StopError::EmptyName(selector));
            }
            if index.insert(name.clone(), stops.len()).is_some() {
                return Err(StopError::DuplicateStop(name));
            }
            stops.push((StopName::new(name), selector.trim().to_string()));
        }

        Ok(Self { stops, index })
    }

    /// Loads a directory from a CSV file with a `name,selector` header
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, StopError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| StopError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let records = reader
            .deserialize::<StopRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_entries(records.into_iter().map(|r| (r.name, r.selector)))
    }

    /// Normalizes a raw town name and checks it against the directory
    pub fn normalize(&self, raw: &str) -> Result<StopName, StopError> {
        let name = normalize_town(raw);
        match self.index.get(&name) {
            Some(&i) => Ok(self.stops[i].0.clone()),
            None => Err(StopError::InvalidStopName(name)),
        }
    }

    /// Returns whether the (normalized) name is a known stop
    pub fn is_valid(&self, name: &str) -> bool {
        self.index.contains_key(&normalize_town(name))
    }

    /// Returns the carrier selector code for a stop
    pub fn selector_for(&self, name: &StopName) -> Option<&str> {
        self.index
            .get(name.as_str())
            .map(|&i| self.stops[i].1.as_str())
    }

    /// All stop names in canonical order
    pub fn names(&self) -> impl Iterator<Item = &StopName> {
        self.stops.iter().map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
