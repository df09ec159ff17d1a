//! Human-readable byte sizes.

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format `bytes` with decimal (power of 1000) units, rounded to two places.
///
/// Integral values keep a single trailing `.0`, so `1000` is `1.0 KB`.
///
/// ```
/// use reconcile_engine::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1_500), "1.5 KB");
/// assert_eq!(format_size(1_234_567), "1.23 MB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_owned();
    }

    let mut unit = 0;
    let mut scale = 1_u64;
    while unit + 1 < UNITS.len() && bytes / scale >= 1000 {
        scale *= 1000;
        unit += 1;
    }

    let value = (bytes as f64 / scale as f64 * 100.0).round() / 100.0;
    let mut text = format!("{value}");
    if !text.contains('.') {
        text.push_str(".0");
    }
    format!("{text} {}", UNITS[unit])
}
