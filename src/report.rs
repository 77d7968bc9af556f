//! Human-readable formatting for progress output.

/// Format a byte count with decimal (SI) units.
pub fn format_bytes(v: u64) -> String {
    let scaled = |n: f64, unit: &str| {
        if n > 100.0 {
            format!("{n:.1} {unit}")
        } else if n > 10.0 {
            format!("{n:.2} {unit}")
        } else {
            format!("{n:.3} {unit}")
        }
    };
    if v >= 1_000_000_000_000 {
        scaled(v as f64 / 1e12, "TB")
    } else if v >= 1_000_000_000 {
        scaled(v as f64 / 1e9, "GB")
    } else if v >= 1_000_000 {
        scaled(v as f64 / 1e6, "MB")
    } else if v >= 1_000 {
        scaled(v as f64 / 1e3, "kB")
    } else {
        format!("{v} B")
    }
}

/// Byte rate, per second.
pub fn format_rate(v: u64) -> String {
    format!("{}/s", format_bytes(v))
}
