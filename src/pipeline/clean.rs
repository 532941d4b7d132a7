//! Cell content cleaning.
//!
//! The analysis service inlines selection marks into cell text as
//! `:selected:` / `:unselected:`. An unticked box carries no information for
//! an invoice line, so its marker is dropped; ticked boxes are left alone.

/// Marker the analysis service writes for an unticked checkbox.
pub const UNSELECTED_MARKER: &str = ":unselected:";

/// Remove every unselected-checkbox marker and trim surrounding whitespace.
///
/// Removal repeats until the marker is gone: deleting one occurrence can join
/// its neighbours into a new one (`":unse:unselected:lected:"`).
pub fn clean_cell_content(content: &str) -> String {
    let mut s = content.replace(UNSELECTED_MARKER, "");
    while s.contains(UNSELECTED_MARKER) {
        s = s.replace(UNSELECTED_MARKER, "");
    }
    s.trim().to_string()
}
