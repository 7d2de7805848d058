//! Cache manager for persisting country CIDR lists to disk
//!
//! Provides a `CacheManager` that stores one plain-text record per country:
//! the fetch timestamp on the first line, then one CIDR per line.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::default_cache_dir;
use crate::data::{CidrSet, CountryCode};

/// A cached fetch result for one country
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    /// When the entries were fetched, in seconds since the Unix epoch
    pub fetched_at: i64,
    /// The entries fetched at that time
    pub cidrs: CidrSet,
}

impl CacheRecord {
    /// The record returned when nothing usable is on disk
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the on-disk format, returning `None` if the header is not a
    /// decimal timestamp
    fn parse(content: &str) -> Option<Self> {
        let mut lines = content.lines();
        let header = lines.next()?.trim();
        let fetched_at = header.parse::<f64>().ok().filter(|ts| ts.is_finite())? as i64;
        Some(Self {
            fetched_at,
            cidrs: CidrSet::from_candidates(lines),
        })
    }

    fn render(&self) -> String {
        let mut out = format!("{}\n", self.fetched_at);
        for cidr in self.cidrs.iter() {
            out.push_str(cidr);
            out.push('\n');
        }
        out
    }
}

/// Manages reading and writing cached country records
///
/// Records live in `<cache_dir>/<cc>.cache`, keyed by the lowercase country
/// code. Reads never fail: a missing or corrupt file reads as an empty
/// record. Writes replace the whole file atomically via a temporary file in
/// the same directory.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    /// Creates a new CacheManager using the platform cache directory
    pub fn new() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given country
    pub fn cache_path(&self, code: &CountryCode) -> PathBuf {
        self.cache_dir.join(format!("{}.cache", code.as_lower()))
    }

    /// Reads the record for `code`, or an empty record if there is none or it
    /// cannot be parsed
    pub fn read(&self, code: &CountryCode) -> CacheRecord {
        let path = self.cache_path(code);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No usable cache at {}: {}", path.display(), e);
                return CacheRecord::empty();
            }
        };
        CacheRecord::parse(&content).unwrap_or_else(|| {
            debug!("Ignoring malformed cache file {}", path.display());
            CacheRecord::empty()
        })
    }

    /// Writes `cidrs` for `code` stamped with the current time
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if directory creation or file writing fails
    pub fn write(&self, code: &CountryCode, cidrs: &CidrSet) -> io::Result<()> {
        self.write_record(
            code,
            &CacheRecord {
                fetched_at: Utc::now().timestamp(),
                cidrs: cidrs.clone(),
            },
        )
    }

    /// Writes a record as-is, replacing whatever was there
    pub fn write_record(&self, code: &CountryCode, record: &CacheRecord) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(record.render().as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.cache_path(code)).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    fn code(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    #[test]
    fn test_write_creates_file_in_cache_directory() {
        let (cache, temp_dir) = create_test_cache();
        let cidrs = CidrSet::from_candidates(["8.8.8.0/24", "2001:4860::/32"]);

        cache.write(&code("US"), &cidrs).expect("Write should succeed");

        let expected_path = temp_dir.path().join("us.cache");
        assert!(expected_path.exists(), "Cache file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].parse::<i64>().is_ok(), "First line is a timestamp");
        assert_eq!(&lines[1..], &["8.8.8.0/24", "2001:4860::/32"]);
    }

    #[test]
    fn test_read_returns_empty_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();

        assert_eq!(cache.read(&code("zz")), CacheRecord::empty());
    }

    #[test]
    fn test_cache_survives_write_then_read() {
        let (cache, _temp_dir) = create_test_cache();
        let cidrs = CidrSet::from_candidates(["1.0.0.0/24", "1.0.4.0/22"]);

        let before = Utc::now().timestamp();
        cache.write(&code("au"), &cidrs).expect("Write should succeed");
        let after = Utc::now().timestamp();

        let record = cache.read(&code("AU"));
        assert_eq!(record.cidrs, cidrs);
        assert!(record.fetched_at >= before && record.fetched_at <= after);
    }

    #[test]
    fn test_corrupt_header_reads_as_empty() {
        let (cache, temp_dir) = create_test_cache();
        fs::write(temp_dir.path().join("in.cache"), "yesterday\n1.6.0.0/15\n").unwrap();

        assert_eq!(cache.read(&code("in")), CacheRecord::empty());
    }

    #[test]
    fn test_empty_file_reads_as_empty() {
        let (cache, temp_dir) = create_test_cache();
        fs::write(temp_dir.path().join("in.cache"), "").unwrap();

        assert_eq!(cache.read(&code("in")), CacheRecord::empty());
    }

    #[test]
    fn test_non_utf8_file_reads_as_empty() {
        let (cache, temp_dir) = create_test_cache();
        fs::write(temp_dir.path().join("br.cache"), b"\xff\xfe\x00A").unwrap();

        assert_eq!(cache.read(&code("br")), CacheRecord::empty());
    }

    #[test]
    fn test_fractional_timestamp_and_blank_lines() {
        let (cache, temp_dir) = create_test_cache();
        fs::write(
            temp_dir.path().join("jp.cache"),
            "1700000000.75\n1.0.16.0/20\n\n  \n1.0.64.0/18\n",
        )
        .unwrap();

        let record = cache.read(&code("jp"));
        assert_eq!(record.fetched_at, 1_700_000_000);
        assert_eq!(
            record.cidrs.iter().collect::<Vec<_>>(),
            vec!["1.0.16.0/20", "1.0.64.0/18"]
        );
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = CacheManager::with_dir(nested_path.clone());

        cache
            .write(&code("nl"), &CidrSet::from_candidates(["2.56.0.0/14"]))
            .expect("Write should succeed");

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("nl.cache").exists(), "Cache file should exist");
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let (cache, temp_dir) = create_test_cache();
        let first = CidrSet::from_candidates(["1.1.1.0/24", "1.1.2.0/24"]);
        let second = CidrSet::from_candidates(["9.9.9.0/24"]);

        cache.write(&code("ch"), &first).expect("First write should succeed");
        cache.write(&code("ch"), &second).expect("Second write should succeed");

        assert_eq!(cache.read(&code("ch")).cidrs, second);
        let files: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1, "No temporary files should be left behind");
    }

    #[test]
    fn test_write_fails_when_dir_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let cache = CacheManager::with_dir(blocker);

        assert!(cache
            .write(&code("us"), &CidrSet::from_candidates(["8.8.8.0/24"]))
            .is_err());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        let cache = CacheManager::new();
        let path_str = cache.cache_dir().to_string_lossy();
        assert!(path_str.contains("country-cidr") || path_str == "cache");
    }
}
