//! Progress reporting for decode status records

/// Fraction of the size hint consumed so far
///
/// `None` without a hint. The hint is not checked against the real stream length,
/// so a stream longer than its hint reports values above 1.0.
pub fn progress(position: u64, size_hint: Option<u64>) -> Option<f64> {
    match size_hint {
        Some(size) if size > 0 => Some(position as f64 / size as f64),
        _ => None,
    }
}

/// Human-readable progress label
pub fn progress_text(position: u64, size_hint: Option<u64>) -> String {
    match (progress(position, size_hint), size_hint) {
        (Some(fraction), Some(size)) => {
            format!("{:.1}% ({} of {} bytes)", fraction * 100.0, position, size)
        }
        _ => format!("{} bytes", position),
    }
}
