//! Human-readable rendering helpers.

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

/// Render a byte count with one decimal and a single-letter unit.
///
/// Zero and negative inputs render as `"0B"`; values below one KiB keep the
/// plain integer form.
#[must_use]
pub fn bytes_to_human(bytes: i64) -> String {
    if bytes <= 0 {
        return "0B".to_string();
    }
    let value = bytes as f64;
    if value >= TIB {
        format!("{:.1}T", value / TIB)
    } else if value >= GIB {
        format!("{:.1}G", value / GIB)
    } else if value >= MIB {
        format!("{:.1}M", value / MIB)
    } else if value >= KIB {
        format!("{:.1}K", value / KIB)
    } else {
        format!("{bytes}B")
    }
}

/// Render an uptime in seconds as `"<days>d <hours>h"`.
#[must_use]
pub fn format_uptime(seconds: i64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    format!("{days}d {hours}h")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_to_human_picks_unit_by_threshold() {
        assert_eq!(bytes_to_human(1536), "1.5K");
        assert_eq!(bytes_to_human(1_073_741_824), "1.0G");
        assert_eq!(bytes_to_human(5 * 1024 * 1024), "5.0M");
        assert_eq!(bytes_to_human(3 * 1024 * 1024 * 1024 * 1024), "3.0T");
        assert_eq!(bytes_to_human(512), "512B");
    }

    #[test]
    fn bytes_to_human_non_positive_is_zero() {
        assert_eq!(bytes_to_human(0), "0B");
        assert_eq!(bytes_to_human(-42), "0B");
    }

    #[test]
    fn uptime_days_and_hours() {
        assert_eq!(format_uptime(0), "0d 0h");
        assert_eq!(format_uptime(90_061), "1d 1h");
    }
}
