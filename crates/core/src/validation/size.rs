const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Renders a byte count with binary units and two decimals, e.g. `1.50 MB`.
///
/// `0` renders as `0 B`. Sizes of 1024 GB and up stay in `GB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}
