//! Human-readable durations for the summary line.

use crate::types::Item;

/// Formats seconds as `D:HH:MM:SS` (days unpadded).
pub fn format_seconds(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

pub fn item_summary(item: &Item) -> String {
    format!(
        "Total : {} Avg : {}",
        format_seconds(item.total_seconds),
        format_seconds(item.average_reset_seconds)
    )
}

pub fn group_summary(group_total_seconds: u64) -> String {
    format!("Group Total : {}", format_seconds(group_total_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds_examples() {
        assert_eq!(format_seconds(90_061), "1:01:01:01");
        assert_eq!(format_seconds(59), "0:00:00:59");
        assert_eq!(format_seconds(0), "0:00:00:00");
    }

    #[test]
    fn test_format_seconds_days_unpadded() {
        assert_eq!(format_seconds(86_400 * 12 + 3_599), "12:00:59:59");
    }

    #[test]
    fn test_item_summary() {
        let mut item = Item::new("x", "0");
        item.total_seconds = 3_661;
        item.reset_count = 2;
        item.recompute_average();
        assert_eq!(item_summary(&item), "Total : 0:01:01:01 Avg : 0:00:30:30");
    }

    #[test]
    fn test_group_summary() {
        assert_eq!(group_summary(61), "Group Total : 0:00:01:01");
    }
}
