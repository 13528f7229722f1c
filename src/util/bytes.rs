//! Human-readable file sizes for download listings.

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Format a byte count in IEC units, trimming trailing zeros.
pub fn format_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        return format!("{bytes} {}", UNITS[0]);
    }

    let precision = if value >= 10.0 { 1 } else { 2 };
    let rendered = format!("{value:.precision$}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');

    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::format_file_size;

    #[test]
    fn scales_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(900), "900 B");
        assert_eq!(format_file_size(1024), "1 KiB");
        assert_eq!(format_file_size(1536), "1.5 KiB");
        assert_eq!(format_file_size(10 * 1024), "10 KiB");
        assert_eq!(format_file_size(3 * 1024 * 1024 + 256 * 1024), "3.25 MiB");
    }
}
