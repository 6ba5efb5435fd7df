//! Batch fare collection over a route list
//!
//! For every route, looks up a fare for each unordered pair of its valid towns
//! and records it in a `FareMatrix`. The report is rewritten after every route
//! and once more when the run ends, including when it is cancelled.

mod matrix;
mod routes;

pub use matrix::{FareMatrix, ReportError};
pub use routes::{load_routes, read_routes, Route, RouteError};

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use itertools::Itertools;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::{StopName, Transport, TripFetcher};

/// Errors that stop a batch run
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Counts for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Routes whose pairs were all looked up
    pub routes: usize,
    /// Pairs looked up
    pub pairs: usize,
    /// Pairs with a fare
    pub fares: usize,
    /// Pairs whose page listed no fare
    pub absent: usize,
    /// Pairs whose lookup failed
    pub failed: usize,
    /// Whether the run stopped early
    pub cancelled: bool,
}

/// Drives the trip fetcher over route town pairs and owns the fare matrix
pub struct BatchAggregator<T> {
    fetcher: TripFetcher<T>,
    output: PathBuf,
    use_cache: bool,
    matrix: FareMatrix,
}

impl<T: Transport> BatchAggregator<T> {
    /// Creates an aggregator writing its report to `output`, reading the page
    /// cache by default
    pub fn new(fetcher: TripFetcher<T>, output: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output: output.into(),
            use_cache: true,
            matrix: FareMatrix::new(),
        }
    }

    /// Whether lookups may be served from the page cache
    pub fn with_cache_reads(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn matrix(&self) -> &FareMatrix {
        &self.matrix
    }

    pub fn fetcher(&self) -> &TripFetcher<T> {
        &self.fetcher
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Unordered pairs of a route's valid towns, in listing order
    ///
    /// Invalid towns are reported and dropped. Repeated towns count once, so
    /// no pair joins a town to itself.
    pub fn route_pairs(&self, route: &Route) -> Vec<(StopName, StopName)> {
        let stops = self.fetcher.stops();
        route
            .towns
            .iter()
            .filter_map(|town| match stops.normalize(town) {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!(route = %route.name, error = %e, "dropping town");
                    None
                }
            })
            .unique()
            .tuple_combinations()
            .collect()
    }

    /// Rewrites the report from the current matrix
    pub fn flush(&self) -> Result<(), ReportError> {
        self.matrix.write_report(self.fetcher.stops(), &self.output)
    }

    /// Looks up every route's pairs departing at `when`
    ///
    /// `shutdown` resolving stops the run before the next lookup finishes; the
    /// report is still flushed with everything gathered so far. Lookup
    /// failures are logged and leave the cell blank; only a report write
    /// failure ends the run with an error.
    pub async fn run<F>(
        &mut self,
        routes: &[Route],
        when: NaiveDateTime,
        shutdown: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = BatchSummary::default();

        'routes: for route in routes {
            let pairs = self.route_pairs(route);
            info!(route = %route.name, pairs = pairs.len(), "processing route");

            for (origin, destination) in pairs {
                let lookup =
                    self.fetcher
                        .fetch_fare(origin.as_str(), destination.as_str(), when, self.use_cache);
                let outcome = tokio::select! {
                    biased;
                    _ = &mut shutdown => None,
                    result = lookup => Some(result),
                };
                let Some(result) = outcome else {
                    summary.cancelled = true;
                    break 'routes;
                };

                summary.pairs += 1;
                let fare = match result {
                    Ok(Some(fare)) => {
                        info!(%origin, %destination, %fare, "fare");
                        summary.fares += 1;
                        Some(fare)
                    }
                    Ok(None) => {
                        info!(%origin, %destination, "no fare listed");
                        summary.absent += 1;
                        None
                    }
                    Err(e) => {
                        warn!(%origin, %destination, error = %e, "fare lookup failed");
                        summary.failed += 1;
                        None
                    }
                };
                self.matrix.insert(origin, destination, fare);
            }

            summary.routes += 1;
            self.flush()?;
        }

        if summary.cancelled {
            warn!(pairs = summary.pairs, "batch cancelled, writing partial report");
        }
        self.flush()?;
        info!(
            output = %self.output.display(),
            routes = summary.routes,
            pairs = summary.pairs,
            fares = summary.fares,
            absent = summary.absent,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }

    /// Loads a route file and runs it
    pub async fn run_route_file<F>(
        &mut self,
        route_file: impl AsRef<Path>,
        when: NaiveDateTime,
        shutdown: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: Future<Output = ()>,
    {
        let route_file = route_file.as_ref();
        let routes = load_routes(route_file)?;
        info!(route_file = %route_file.display(), routes = routes.len(), "loaded routes");
        self.run(&routes, when, shutdown).await
    }
}
