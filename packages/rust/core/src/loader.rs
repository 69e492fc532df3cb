//! Reading conversation transcripts from disk.

use std::path::Path;

use tracing::debug;

use msgview_shared::{ConversationFile, MsgviewError, Result};

/// Read a transcript, dropping any invalid UTF-8 byte sequences.
///
/// Line endings are normalized to `\n` (`\r\n` and lone `\r` included).
///
/// Errors are per file; the pipeline logs them and moves on.
pub fn load(path: &Path) -> Result<ConversationFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            MsgviewError::validation(format!("file name is not valid UTF-8: {}", path.display()))
        })?
        .to_string();

    let bytes = std::fs::read(path).map_err(|e| MsgviewError::io(path, e))?;
    let decoded = decode_lossy(&bytes);

    if decoded.len() != bytes.len() {
        debug!(
            name = %name,
            dropped = bytes.len() - decoded.len(),
            "dropped invalid UTF-8 bytes"
        );
    }

    let content = normalize_newlines(decoded);

    Ok(ConversationFile { name, content })
}

/// Decode UTF-8, discarding invalid sequences instead of replacing them.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Convert `\r\n` and bare `\r` line endings to `\n`.
pub fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
