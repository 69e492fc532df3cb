//! End-to-end bundle pipeline: messages dir → dataset → template → viewer.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use msgview_shared::{BundleConfig, MessageDataset, MsgviewError, Result};

use crate::dataset;
use crate::discovery::{self, DiscoverOptions};
use crate::loader;
use crate::template;

/// Result of a completed bundle run.
#[derive(Debug, Clone)]
pub struct BundleResult {
    /// Path of the written viewer.
    pub output_path: PathBuf,
    /// Conversations embedded in the viewer.
    pub conversation_count: usize,
    /// Files that matched but could not be read.
    pub skipped_count: usize,
    /// Total bytes of embedded transcript text.
    pub total_bytes: usize,
    /// Data markers found in the template (only the first is filled).
    pub marker_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// A discovered file that was left out of the dataset.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Conversations gathered from a messages directory.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub dataset: MessageDataset,
    pub skipped: Vec<SkippedFile>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called once discovery has listed the candidate files.
    fn discovered(&self, count: usize);
    /// Called after a transcript is read.
    fn loaded(&self, name: &str, bytes: usize);
    /// Called when a transcript cannot be read and is left out.
    fn skipped(&self, name: &str, error: &MsgviewError);
    /// Called when the viewer has been written.
    fn done(&self, result: &BundleResult);
}

/// No-op progress reporter for headless/test usage.
#[derive(Debug)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn discovered(&self, _count: usize) {}
    fn loaded(&self, _name: &str, _bytes: usize) {}
    fn skipped(&self, _name: &str, _error: &MsgviewError) {}
    fn done(&self, _result: &BundleResult) {}
}

/// Discover and read every transcript under `messages_dir`.
///
/// Unreadable files are reported and skipped; only discovery itself can fail.
#[instrument(skip_all, fields(dir = %messages_dir.display()))]
pub fn scan(
    messages_dir: &Path,
    opts: &DiscoverOptions,
    progress: &dyn ProgressReporter,
) -> Result<ScanResult> {
    let paths = discovery::discover(messages_dir, opts)?;
    info!(count = paths.len(), "found conversation files");
    progress.discovered(paths.len());

    let mut result = ScanResult::default();
    for path in paths {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match loader::load(&path) {
            Ok(file) => {
                debug!(name = %file.name, bytes = file.len(), "loaded");
                progress.loaded(&file.name, file.len());
                result.dataset.insert(file);
            }
            Err(e) => {
                warn!(name = %display_name, error = %e, "skipping unreadable conversation");
                progress.skipped(&display_name, &e);
                result.skipped.push(SkippedFile {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(result)
}

/// Run the full bundle pipeline.
///
/// 1. Discover and load transcripts
/// 2. Read the template
/// 3. Serialize the dataset
/// 4. Inject it at the first data marker
/// 5. Write the viewer, replacing any existing file
#[instrument(skip_all, fields(messages = %config.messages_dir.display(), output = %config.output.display()))]
pub fn run(config: &BundleConfig, progress: &dyn ProgressReporter) -> Result<BundleResult> {
    let start = Instant::now();

    let scanned = scan(&config.messages_dir, &DiscoverOptions::from(config), progress)?;

    let template_html = template::read_template(&config.template)?;
    let markers = template::marker_count(&template_html);
    match markers {
        0 => warn!(
            template = %config.template.display(),
            "template has no data marker; output will equal the template"
        ),
        1 => {}
        n => info!(markers = n, "template has several data markers; filling the first only"),
    }

    let json = dataset::serialize(&scanned.dataset)?;
    let viewer_html = template::inject(&template_html, &json);

    write_output(&config.output, &viewer_html)?;

    let result = BundleResult {
        output_path: config.output.clone(),
        conversation_count: scanned.dataset.len(),
        skipped_count: scanned.skipped.len(),
        total_bytes: scanned.dataset.total_bytes(),
        marker_count: markers,
        elapsed: start.elapsed(),
    };

    info!(
        conversations = result.conversation_count,
        skipped = result.skipped_count,
        path = %result.output_path.display(),
        "viewer generated"
    );
    progress.done(&result);

    Ok(result)
}

/// Write the viewer atomically (temp file in the same directory, then rename).
///
/// An existing symlink at `path` is followed so the file it points to is the
/// one replaced; the link itself stays in place.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let file_name = target.file_name().ok_or_else(|| {
        MsgviewError::validation(format!("output path has no file name: {}", path.display()))
    })?;
    let temp = target.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(MsgviewError::io(&temp, e));
    }

    if let Err(e) = std::fs::rename(&temp, &target) {
        let _ = std::fs::remove_file(&temp);
        return Err(MsgviewError::io(&target, e));
    }

    debug!(path = %target.display(), bytes = content.len(), "wrote viewer");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<script>window.IMESSAGE_DATA = {};</script>";

    /// Records reporter calls for assertions.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn discovered(&self, count: usize) {
            self.push(format!("discovered {count}"));
        }
        fn loaded(&self, name: &str, bytes: usize) {
            self.push(format!("loaded {name} {bytes}"));
        }
        fn skipped(&self, name: &str, _error: &MsgviewError) {
            self.push(format!("skipped {name}"));
        }
        fn done(&self, result: &BundleResult) {
            self.push(format!("done {}", result.conversation_count));
        }
    }

    fn setup(files: &[(&str, &str)], template: Option<&str>) -> (TempDir, BundleConfig) {
        let root = tempfile::tempdir().unwrap();
        let messages = root.path().join("messages");
        std::fs::create_dir(&messages).unwrap();
        for (name, content) in files {
            std::fs::write(messages.join(name), content).unwrap();
        }
        if let Some(t) = template {
            std::fs::write(root.path().join("viewer_template.html"), t).unwrap();
        }

        let config = BundleConfig::resolve(&Default::default(), root.path());
        (root, config)
    }

    fn read_output(config: &BundleConfig) -> String {
        std::fs::read_to_string(&config.output).unwrap()
    }

    #[test]
    fn bundles_conversations_and_skips_sentinel() {
        let (_root, config) = setup(
            &[("alice.txt", "Hello"), ("orphaned.txt", "ignored")],
            Some(TEMPLATE),
        );

        let result = run(&config, &SilentProgress).unwrap();

        assert_eq!(
            read_output(&config),
            "<script>window.IMESSAGE_DATA = {\n  \"alice.txt\": \"Hello\"\n};</script>"
        );
        assert_eq!(result.conversation_count, 1);
        assert_eq!(result.skipped_count, 0);
        assert_eq!(result.total_bytes, 5);
        assert_eq!(result.marker_count, 1);
        assert_eq!(result.output_path, config.output);
    }

    #[test]
    fn empty_messages_dir_embeds_empty_object() {
        let (_root, config) = setup(&[], Some(TEMPLATE));

        let result = run(&config, &SilentProgress).unwrap();

        assert_eq!(read_output(&config), TEMPLATE);
        assert_eq!(result.conversation_count, 0);
    }

    #[test]
    fn invalid_utf8_is_dropped_not_skipped() {
        let (_root, config) = setup(&[], Some(TEMPLATE));
        std::fs::write(config.messages_dir.join("bob.txt"), b"Hi\xff\xfe!").unwrap();

        let result = run(&config, &SilentProgress).unwrap();

        assert_eq!(result.conversation_count, 1);
        assert!(read_output(&config).contains("\"bob.txt\": \"Hi!\""));
    }

    #[test]
    fn output_parses_back_to_dataset() {
        let (_root, config) = setup(
            &[("zoë.txt", "Ça va? 🎉"), ("amy.txt", "line1\nline2")],
            Some(TEMPLATE),
        );

        run(&config, &SilentProgress).unwrap();

        let html = read_output(&config);
        let json = html
            .strip_prefix("<script>window.IMESSAGE_DATA = ")
            .and_then(|s| s.strip_suffix(";</script>"))
            .unwrap();
        let parsed: MessageDataset = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.get("zoë.txt"), Some("Ça va? 🎉"));
        assert_eq!(parsed.get("amy.txt"), Some("line1\nline2"));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn missing_template_is_fatal_and_writes_nothing() {
        let (_root, config) = setup(&[("alice.txt", "Hello")], None);

        let err = run(&config, &SilentProgress).unwrap_err();

        assert!(matches!(err, MsgviewError::Io { ref path, .. } if *path == config.template));
        assert!(!config.output.exists());
    }

    #[test]
    fn missing_output_directory_is_fatal() {
        let (root, mut config) = setup(&[], Some(TEMPLATE));
        config.output = root.path().join("no-such-dir/viewer.html");

        let err = run(&config, &SilentProgress).unwrap_err();
        assert!(matches!(err, MsgviewError::Io { .. }));
    }

    #[test]
    fn existing_output_is_overwritten() {
        let (_root, config) = setup(&[("alice.txt", "Hello")], Some(TEMPLATE));
        std::fs::write(&config.output, "stale viewer from a previous run").unwrap();

        run(&config, &SilentProgress).unwrap();

        let html = read_output(&config);
        assert!(!html.contains("stale"));
        assert!(html.contains("alice.txt"));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let (root, config) = setup(&[("alice.txt", "Hello")], Some(TEMPLATE));

        run(&config, &SilentProgress).unwrap();

        for entry in std::fs::read_dir(root.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "temp file left behind: {name}");
        }
    }

    #[test]
    fn template_without_marker_is_copied_verbatim() {
        let template = "<html><body>No data here</body></html>";
        let (_root, config) = setup(&[("alice.txt", "Hello")], Some(template));

        let result = run(&config, &SilentProgress).unwrap();

        assert_eq!(read_output(&config), template);
        assert_eq!(result.marker_count, 0);
    }

    #[test]
    fn second_marker_is_left_in_place() {
        let template = "<script>window.IMESSAGE_DATA = {};</script>\n<script>window.IMESSAGE_DATA = {};</script>";
        let (_root, config) = setup(&[("alice.txt", "Hello")], Some(template));

        let result = run(&config, &SilentProgress).unwrap();

        let html = read_output(&config);
        assert_eq!(result.marker_count, 2);
        assert_eq!(template::marker_count(&html), 1);
        assert!(html.ends_with("<script>window.IMESSAGE_DATA = {};</script>"));
    }

    #[test]
    fn reports_progress_in_order() {
        let (_root, config) = setup(
            &[("bob.txt", "Yo"), ("alice.txt", "Hello")],
            Some(TEMPLATE),
        );
        let progress = RecordingProgress::default();

        run(&config, &progress).unwrap();

        assert_eq!(
            progress.events(),
            [
                "discovered 2",
                "loaded alice.txt 5",
                "loaded bob.txt 2",
                "done 2",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_skipped() {
        let (root, config) = setup(&[("alice.txt", "Hello")], Some(TEMPLATE));
        std::os::unix::fs::symlink(
            root.path().join("does-not-exist"),
            config.messages_dir.join("ghost.txt"),
        )
        .unwrap();
        let progress = RecordingProgress::default();

        let result = run(&config, &progress).unwrap();

        assert_eq!(result.conversation_count, 1);
        assert_eq!(result.skipped_count, 1);
        assert!(progress.events().contains(&"skipped ghost.txt".to_string()));
        assert!(!read_output(&config).contains("ghost.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_output_updates_link_target() {
        let (root, config) = setup(&[("alice.txt", "Hello")], Some(TEMPLATE));
        let real = root.path().join("real.html");
        std::fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &config.output).unwrap();

        run(&config, &SilentProgress).unwrap();

        let meta = std::fs::symlink_metadata(&config.output).unwrap();
        assert!(meta.file_type().is_symlink());
        assert!(std::fs::read_to_string(&real).unwrap().contains("alice.txt"));
        assert!(!root.path().join(".real.html.tmp").exists());
    }

    #[test]
    fn failed_temp_write_keeps_previous_output() {
        let (root, config) = setup(&[("alice.txt", "Hello")], Some(TEMPLATE));
        std::fs::write(&config.output, "previous").unwrap();
        // A directory at the temp location makes the temp write fail.
        std::fs::create_dir(root.path().join(".viewer.html.tmp")).unwrap();

        let err = run(&config, &SilentProgress).unwrap_err();

        assert!(matches!(err, MsgviewError::Io { .. }));
        assert_eq!(read_output(&config), "previous");
    }

    #[test]
    fn scan_collects_without_writing() {
        let (_root, config) = setup(
            &[("alice.txt", "Hello"), ("orphaned.txt", "ignored")],
            None,
        );

        let scanned = scan(&config.messages_dir, &DiscoverOptions::from(&config), &SilentProgress)
            .unwrap();

        assert_eq!(scanned.dataset.names().collect::<Vec<_>>(), ["alice.txt"]);
        assert!(scanned.skipped.is_empty());
        assert!(!config.output.exists());
    }
}
