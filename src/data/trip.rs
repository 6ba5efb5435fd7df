//! Trip fare lookup against the NJ Transit bus trip planner
//!
//! Validates the towns, builds the planner's form, serves the page from the
//! page cache or the network, and extracts the lowest fare.

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fare::{extract_fare, ParseFailure};
use super::stops::{StopDirectory, StopError};
use super::transport::{Transport, TransportError};
use super::{Fare, RawPage, StopName, TripRequest};
use crate::cache::{CacheKey, CacheKeyPolicy, PageCache};

/// Trip planner form endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.njtransit.com/sf/sf_servlet.srv";

/// Query string the planner needs to route the form to the point-to-point search
const PAGE_ACTION: [(&str, &str); 1] = [("hdnPageAction", "BusSchedulesP2PFrom")];

/// Reasons a single lookup produced no fare
#[derive(Debug, Error)]
pub enum TripError {
    /// Origin or destination is not a known stop
    #[error(transparent)]
    InvalidStop(#[from] StopError),

    /// The planner answered with a non-2xx status
    #[error("Trip planner returned HTTP {status}")]
    Status { status: u16 },

    /// The request never got a response
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The page is not a result page
    #[error("Failed to parse trip page: {0}")]
    Parse(#[from] ParseFailure),
}

/// Looks up fares for town pairs, one request at a time
#[derive(Debug)]
pub struct TripFetcher<T> {
    transport: T,
    cache: PageCache,
    stops: StopDirectory,
    key_policy: CacheKeyPolicy,
    endpoint: String,
}

impl<T: Transport> TripFetcher<T> {
    /// Creates a fetcher with the default endpoint and pair-only cache keys
    pub fn new(transport: T, cache: PageCache, stops: StopDirectory) -> Self {
        Self {
            transport,
            cache,
            stops,
            key_policy: CacheKeyPolicy::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_key_policy(mut self, key_policy: CacheKeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Sets a custom planner URL (for testing or a mirror)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn stops(&self) -> &StopDirectory {
        &self.stops
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validates both towns and truncates the time to the minute
    pub fn request(
        &self,
        origin: &str,
        destination: &str,
        when: NaiveDateTime,
    ) -> Result<TripRequest, StopError> {
        let origin = self.stops.normalize(origin)?;
        let destination = self.stops.normalize(destination)?;
        let when = when
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(when);
        Ok(TripRequest {
            origin,
            destination,
            when,
        })
    }

    /// Builds the planner form for a request
    ///
    /// The planner only accepts its own date layout: `MM/DD/YYYY`, a 12-hour
    /// clock without padding, and the hour and minute repeated as separate
    /// fields.
    pub fn form_fields(&self, request: &TripRequest) -> Result<Vec<(&'static str, String)>, StopError> {
        let selector = |name: &StopName| {
            self.stops
                .selector_for(name)
                .map(str::to_string)
                .ok_or_else(|| StopError::InvalidStopName(name.to_string()))
        };
        let when = request.when;

        Ok(vec![
            ("rdoTownTrans", "Town".to_string()),
            ("selOrigin", selector(&request.origin)?),
            ("OriginDescription", request.origin.to_string()),
            ("selDestination", selector(&request.destination)?),
            ("DestDescription", request.destination.to_string()),
            ("datepicker", when.format("%m/%d/%Y").to_string()),
            ("rdoArriveDepart", "D".to_string()),
            ("Time", when.format("%-I:%-M").to_string()),
            ("Suffix", when.format("%p").to_string()),
            ("Hour", when.format("%-I").to_string()),
            ("Minute", when.format("%-M").to_string()),
        ])
    }

    /// Looks up the lowest fare from `origin` to `destination` departing at `when`
    ///
    /// # Arguments
    /// * `use_cache` - serve a previously cached page when one exists. Fresh
    ///   pages are written to the cache either way.
    ///
    /// # Returns
    /// * `Ok(Some(fare))` - lowest fare on the page
    /// * `Ok(None)` - the page listed no readable fare
    /// * `Err(TripError)` - invalid town, HTTP failure or unparseable page;
    ///   no request is sent for invalid towns
    pub async fn fetch_fare(
        &self,
        origin: &str,
        destination: &str,
        when: NaiveDateTime,
        use_cache: bool,
    ) -> Result<Option<Fare>, TripError> {
        let request = self.request(origin, destination, when)?;
        info!(
            origin = %request.origin,
            destination = %request.destination,
            when = %request.when,
            "looking up fare"
        );

        let page = self.load_page(&request, use_cache).await?;
        let fare = extract_fare(&page)?;
        match fare {
            Some(fare) => debug!(%fare, "fare found"),
            None => debug!("no fare listed"),
        }
        Ok(fare)
    }

    /// Serves the page from cache or network, caching every fresh page
    async fn load_page(&self, request: &TripRequest, use_cache: bool) -> Result<RawPage, TripError> {
        let key = CacheKey::for_request(request, self.key_policy);

        if use_cache {
            if let Some(page) = self.cache.get(&key) {
                if self.key_policy == CacheKeyPolicy::PairOnly {
                    debug!(key = key.as_str(), "cached page may be from a different departure time");
                }
                return Ok(page);
            }
        }

        let page = self.fetch_page(request).await?;
        if let Err(e) = self.cache.set(&key, &page) {
            warn!(key = key.as_str(), error = %e, "failed to cache page");
        }
        Ok(page)
    }

    /// Posts the planner form and returns the body of a 2xx response
    async fn fetch_page(&self, request: &TripRequest) -> Result<RawPage, TripError> {
        let form = self.form_fields(request)?;
        let response = self.transport.post(&self.endpoint, &PAGE_ACTION, &form).await?;
        if !response.is_ok() {
            return Err(TripError::Status {
                status: response.status,
            });
        }
        Ok(RawPage::new(response.body))
    }
}
