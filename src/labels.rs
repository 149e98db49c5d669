//! Human-readable labels for days and teaching sessions.

/// Time slots taught on Saturdays and Sundays, in session order.
pub const WEEKEND_TIMES: [&str; 6] = [
    "7h-9h",
    "9h30-11h30",
    "14h-16h",
    "17h-19h",
    "19h30-21h30",
    "21h30-23h30",
];

/// Time slots taught on Monday through Friday, in session order.
pub const WEEKDAY_TIMES: [&str; 2] = ["17h-19h", "19h30-21h30"];

pub const DAYS_PER_WEEK: u8 = 7;

/// Saturday (5) and Sunday (6) use the weekend time table.
pub fn is_weekend(day_index: u8) -> bool {
    day_index == 5 || day_index == 6
}

/// Number of sessions a day starts with before any are appended.
pub fn base_session_count(day_index: u8) -> u32 {
    if is_weekend(day_index) {
        WEEKEND_TIMES.len() as u32
    } else {
        WEEKDAY_TIMES.len() as u32
    }
}

/// `Thứ 2` for Monday up to `Thứ 7` for Saturday, `Chủ nhật` for Sunday.
pub fn day_label(day_index: u8) -> String {
    if day_index < 6 {
        format!("Thứ {}", day_index + 2)
    } else {
        "Chủ nhật".to_string()
    }
}

/// Label for a session: `Ca N` plus the time range when the session falls
/// inside the day's time table. Appended sessions past the table keep only
/// the ordinal.
pub fn session_label(session_index: u32, is_weekend: bool) -> String {
    let times: &[&str] = if is_weekend {
        &WEEKEND_TIMES
    } else {
        &WEEKDAY_TIMES
    };
    let ordinal = session_index + 1;
    match times.get(session_index as usize) {
        Some(time) => format!("Ca {ordinal} ({time})"),
        None => format!("Ca {ordinal}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_labels_carry_evening_times() {
        assert_eq!(session_label(0, false), "Ca 1 (17h-19h)");
        assert_eq!(session_label(1, false), "Ca 2 (19h30-21h30)");
    }

    #[test]
    fn weekend_labels_cover_six_sessions() {
        assert_eq!(session_label(0, true), "Ca 1 (7h-9h)");
        assert_eq!(session_label(5, true), "Ca 6 (21h30-23h30)");
    }

    #[test]
    fn appended_sessions_drop_the_time_suffix() {
        assert_eq!(session_label(2, false), "Ca 3");
        assert_eq!(session_label(6, true), "Ca 7");
        assert_eq!(session_label(41, false), "Ca 42");
    }

    #[test]
    fn labels_are_never_empty() {
        for weekend in [false, true] {
            for idx in 0..20 {
                let label = session_label(idx, weekend);
                assert!(label.starts_with(&format!("Ca {}", idx + 1)));
            }
        }
    }

    #[test]
    fn day_labels_follow_vietnamese_week() {
        assert_eq!(day_label(0), "Thứ 2");
        assert_eq!(day_label(5), "Thứ 7");
        assert_eq!(day_label(6), "Chủ nhật");
        assert!(is_weekend(5) && is_weekend(6));
        assert!(!is_weekend(4));
        assert_eq!(base_session_count(0), 2);
        assert_eq!(base_session_count(6), 6);
    }
}
