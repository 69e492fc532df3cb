//! Template loading and data injection.

use std::path::Path;

use msgview_shared::{DATA_ASSIGNMENT, DATA_MARKER, MsgviewError, Result};

/// Read the viewer template. Failure here is fatal for a run.
pub fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| MsgviewError::io(path, e))
}

/// Number of literal data markers in `template`.
pub fn marker_count(template: &str) -> usize {
    template.matches(DATA_MARKER).count()
}

/// Replace the first data marker with an assignment of `serialized`.
///
/// Later markers are left as they are; with no marker the template comes
/// back unchanged.
pub fn inject(template: &str, serialized: &str) -> String {
    let assignment = format!("{DATA_ASSIGNMENT}{serialized};");
    template.replacen(DATA_MARKER, &assignment, 1)
}
