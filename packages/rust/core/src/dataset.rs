//! Serialization of the message dataset for embedding in a `<script>`.

use msgview_shared::{MessageDataset, MsgviewError, Result};

/// Render the dataset as pretty-printed JSON (2-space indent).
///
/// Non-ASCII characters are written literally. Two sequences the HTML parser
/// reacts to inside a classic `<script>` are escaped: `</` becomes `<\/` (no
/// `</script>` end tag) and `<!--` becomes `<\u0021--` (no script-data escape
/// state). Both escapes decode to the original JSON string.
pub fn serialize(dataset: &MessageDataset) -> Result<String> {
    let json = serde_json::to_string_pretty(dataset)
        .map_err(|e| MsgviewError::Serialization(e.to_string()))?;
    Ok(json.replace("</", "<\\/").replace("<!--", "<\\u0021--"))
}
