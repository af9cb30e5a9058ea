//! Human-readable byte counts.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const K: u64 = 1024;

/// Format a byte count as `value unit`, e.g. `20 MB` or `1.5 KB`.
///
/// The unit is picked by `floor(log_1024(bytes))` (capped at GB) and the value
/// is rounded to two decimals with trailing zeros dropped.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0usize;
    let mut divisor = 1u64;
    while exponent < UNITS.len() - 1 && bytes / divisor >= K {
        divisor *= K;
        exponent += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

/// Same as [`format_size`] without the separating space (`5GB`), for inline limits.
pub fn format_size_compact(bytes: u64) -> String {
    format_size(bytes).replace(' ', "")
}
