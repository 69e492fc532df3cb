//! Conversation file discovery.
//!
//! Lists transcripts directly under the messages directory whose names match
//! the configured glob, minus the excluded names (`orphaned.txt` by default).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, instrument, warn};

use msgview_shared::{BundleConfig, DEFAULT_PATTERN, MsgviewError, Result, SENTINEL_FILE_NAME};

/// File selection rules for [`discover`].
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Glob matched against the bare file name.
    pub pattern: String,
    /// Exact, case-sensitive file names to leave out.
    pub exclude: Vec<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.into(),
            exclude: vec![SENTINEL_FILE_NAME.into()],
        }
    }
}

impl From<&BundleConfig> for DiscoverOptions {
    fn from(config: &BundleConfig) -> Self {
        Self {
            pattern: config.pattern.clone(),
            exclude: config.exclude.clone(),
        }
    }
}

impl DiscoverOptions {
    fn matcher(&self) -> Result<GlobMatcher> {
        GlobBuilder::new(&self.pattern)
            .literal_separator(true)
            .build()
            .map(|glob| glob.compile_matcher())
            .map_err(|e| MsgviewError::pattern(&self.pattern, e.kind().to_string()))
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        self.exclude.iter().any(|excluded| OsStr::new(excluded) == name)
    }
}

/// Find conversation files directly under `dir` (non-recursive).
///
/// Directories are skipped even when their names match. A missing `dir`, or
/// one that is a plain file, yields an empty list. Results are sorted by file name.
#[instrument(skip_all, fields(dir = %dir.display(), pattern = %opts.pattern))]
pub fn discover(dir: &Path, opts: &DiscoverOptions) -> Result<Vec<PathBuf>> {
    let matcher = opts.matcher()?;

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            debug!(error = %e, "messages directory not found, nothing to bundle");
            return Ok(Vec::new());
        }
        Err(e) => return Err(MsgviewError::io(dir, e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "failed to read directory entry");
                continue;
            }
        };

        let name = entry.file_name();
        if !matcher.is_match(&name) {
            continue;
        }
        if opts.is_excluded(&name) {
            debug!(name = ?name, "excluded");
            continue;
        }
        // Symlinks stay in; a dangling one surfaces as a per-file read error.
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }

        paths.push(entry.path());
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(count = paths.len(), "discovery complete");

    Ok(paths)
}
