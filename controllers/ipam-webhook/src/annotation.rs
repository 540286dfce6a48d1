//! Record reference annotation encoding.
//!
//! References handed out by Infoblox are stored on the machine as a single
//! comma-separated annotation value so they can be released on delete.

/// Separator between references in the annotation value
pub const REFERENCE_DELIMITER: char = ',';

/// Join references in allocation order
pub fn join_references<S: AsRef<str>>(references: &[S]) -> String {
    references
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&REFERENCE_DELIMITER.to_string())
}

/// Split an annotation value back into references, ignoring empty segments
pub fn split_references(value: &str) -> Vec<&str> {
    value
        .split(REFERENCE_DELIMITER)
        .filter(|reference| !reference.is_empty())
        .collect()
}
