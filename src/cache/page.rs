//! Page cache keyed by trip parameters
//!
//! Provides a `PageCache` that stores raw HTML responses as files under a
//! dedicated directory, so later runs can re-extract fares without hitting the
//! carrier again.

use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::data::{RawPage, TripRequest};

/// Subdirectory of the cache root holding raw pages
const RAW_DIR: &str = "raw";

/// How a cache key is derived from a trip request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheKeyPolicy {
    /// `ORIGIN-DESTINATION`. Requests for the same pair at different times
    /// share one entry.
    #[default]
    PairOnly,
    /// `ORIGIN-DESTINATION-YYYYmmdd-HHMM`
    WithTime,
}

/// Deterministic, filesystem-safe name of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a request under the given policy
    pub fn for_request(request: &TripRequest, policy: CacheKeyPolicy) -> Self {
        let key = match policy {
            CacheKeyPolicy::PairOnly => format!("{}-{}", request.origin, request.destination),
            CacheKeyPolicy::WithTime => format!(
                "{}-{}-{}",
                request.origin,
                request.destination,
                request.when.format("%Y%m%d-%H%M")
            ),
        };
        Self::from_raw(&key)
    }

    /// Builds a key from arbitrary text, replacing path separators
    pub fn from_raw(key: &str) -> Self {
        Self(key.replace(['/', '\\'], "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("{}.html", self.0)
    }
}

/// Returns the default page cache directory
///
/// Uses `~/.cache/njfare/raw` on Linux, or the equivalent XDG path on other
/// platforms. Falls back to `./raw` when no home directory is known.
pub fn default_cache_dir() -> PathBuf {
    match ProjectDirs::from("", "", "njfare") {
        Some(dirs) => dirs.cache_dir().join(RAW_DIR),
        None => PathBuf::from(RAW_DIR),
    }
}

/// Reads and writes raw pages, one file per cache key
#[derive(Debug, Clone)]
pub struct PageCache {
    /// Directory where page files are stored
    cache_dir: PathBuf,
}

impl PageCache {
    /// Opens a page cache rooted at `cache_dir`, creating the directory if needed
    ///
    /// # Returns
    /// * `Ok(PageCache)` once the directory exists
    /// * `Err` if the directory cannot be created
    pub fn new(cache_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the page file for the given key
    fn page_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Reads a cached page
    ///
    /// A missing entry is the ordinary miss path and returns `None`. An entry
    /// that exists but cannot be read is logged and also treated as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<RawPage> {
        let path = self.page_path(key);
        match fs::read_to_string(&path) {
            Ok(body) => {
                debug!(key = key.as_str(), "page cache hit");
                Some(RawPage::new(body))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key = key.as_str(), "page cache miss");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable page cache entry");
                None
            }
        }
    }

    /// Writes a page, replacing any existing entry for the key
    ///
    /// The body goes to a temporary sibling first and is renamed into place,
    /// so readers see either the old page or the new one.
    pub fn set(&self, key: &CacheKey, page: &RawPage) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let path = self.page_path(key);
        let tmp = self.cache_dir.join(format!(".{}.tmp", key.file_name()));
        fs::write(&tmp, page.as_str())?;
        fs::rename(&tmp, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StopDirectory;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_cache() -> (PageCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = PageCache::new(temp_dir.path().join("raw")).expect("Cache should open");
        (cache, temp_dir)
    }

    fn request(hour: u32, minute: u32) -> TripRequest {
        let stops = StopDirectory::builtin();
        TripRequest {
            origin: stops.normalize("ORANGE").unwrap(),
            destination: stops.normalize("EAST ORANGE").unwrap(),
            when: NaiveDate::from_ymd_opt(2019, 10, 9)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_new_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("raw");
        PageCache::new(&nested).expect("Cache should open");
        assert!(nested.is_dir());
        // Opening again is fine
        PageCache::new(&nested).expect("Cache should reopen");
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(cache.get(&CacheKey::from_raw("nothing-here")).is_none());
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let (cache, temp_dir) = create_test_cache();
        let key = CacheKey::from_raw("ORANGE-EAST ORANGE");
        let page = RawPage::new("<html><body><div id=\"Accordion1\"></div></body></html>");

        cache.set(&key, &page).expect("Write should succeed");

        let path = temp_dir.path().join("raw").join("ORANGE-EAST ORANGE.html");
        assert!(path.exists(), "Page file should exist");
        assert_eq!(cache.get(&key), Some(page));
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let (cache, temp_dir) = create_test_cache();
        let key = CacheKey::from_raw("A-B");
        cache.set(&key, &RawPage::new("first")).unwrap();
        cache.set(&key, &RawPage::new("second")).unwrap();

        assert_eq!(cache.get(&key), Some(RawPage::new("second")));
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("raw"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "No temporary files should remain");
    }

    #[test]
    fn test_pair_only_key_ignores_time() {
        let morning = CacheKey::for_request(&request(9, 30), CacheKeyPolicy::PairOnly);
        let evening = CacheKey::for_request(&request(18, 5), CacheKeyPolicy::PairOnly);
        assert_eq!(morning.as_str(), "ORANGE-EAST ORANGE");
        assert_eq!(morning, evening);
    }

    #[test]
    fn test_with_time_key_includes_timestamp() {
        let key = CacheKey::for_request(&request(9, 5), CacheKeyPolicy::WithTime);
        assert_eq!(key.as_str(), "ORANGE-EAST ORANGE-20191009-0905");
        assert_ne!(
            key,
            CacheKey::for_request(&request(9, 6), CacheKeyPolicy::WithTime)
        );
    }

    #[test]
    fn test_key_replaces_path_separators() {
        assert_eq!(CacheKey::from_raw("A/B\\C").as_str(), "A_B_C");
    }

    #[test]
    fn test_default_cache_dir_ends_with_raw() {
        assert!(default_cache_dir().ends_with(RAW_DIR));
    }
}
