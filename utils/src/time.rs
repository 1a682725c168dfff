//! Rendering of phase windows and simulated spans for log output.

const UNITS: [(u64, &str); 5] = [
    (365 * 86_400, "y"),
    (86_400, "d"),
    (3_600, "h"),
    (60, "m"),
    (1, "s"),
];

/// Render a span of seconds with its two most significant non-zero units,
/// e.g. `3d`, `1d 6h`, `2m 5s`. Zero renders as `0s`.
pub fn format_window(secs: u64) -> String {
    let mut rest = secs;
    let parts: Vec<String> = UNITS
        .iter()
        .filter_map(|&(size, suffix)| {
            let count = rest / size;
            rest %= size;
            (count > 0).then(|| format!("{count}{suffix}"))
        })
        .take(2)
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_two_largest_units() {
        assert_eq!(format_window(42), "42s");
        assert_eq!(format_window(125), "2m 5s");
        assert_eq!(format_window(3 * 86_400), "3d");
        assert_eq!(format_window(86_400 + 6 * 3_600 + 59), "1d 6h");
    }

    #[test]
    fn zero_and_long_windows() {
        assert_eq!(format_window(0), "0s");
        assert_eq!(format_window(10 * 365 * 86_400), "10y");
        assert_eq!(format_window(u64::MAX), "584942417355y 26d");
    }
}
