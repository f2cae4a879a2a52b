use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use crate::{
    error::ApiError,
    models::{DaySchedule, OperatingHours, SalonRow},
    store::{Store, TIME_FORMAT},
};

/// Fixed booking granularity: one slot every 30 minutes within each window.
const SLOT_MINUTES: i64 = 30;

/// Fallback schedule when a salon has not configured its hours yet:
/// 09:00-12:00 and 14:00-18:00.
pub fn default_template() -> Vec<NaiveTime> {
    let mut slots = window_slots("09:00", "12:00");
    slots.extend(window_slots("14:00", "18:00"));
    slots
}

/// The ordered list of slots a salon could ever offer on the given date,
/// derived from its configured hours. A day missing from the schedule is
/// treated as closed.
pub fn slot_template(hours: Option<&OperatingHours>, date: NaiveDate) -> Vec<NaiveTime> {
    let Some(hours) = hours else {
        return default_template();
    };

    let day = date.format("%A").to_string().to_lowercase();
    match hours.get(&day) {
        Some(DaySchedule::Open { morning, afternoon }) => {
            let mut slots = window_slots(&morning.open, &morning.close);
            slots.extend(window_slots(&afternoon.open, &afternoon.close));
            slots
        }
        Some(DaySchedule::Closed(_)) | None => Vec::new(),
    }
}

/// Template minus reserved, template order preserved (ascending).
pub fn free_slots(template: &[NaiveTime], reserved: &[NaiveTime]) -> Vec<NaiveTime> {
    let taken: HashSet<&NaiveTime> = reserved.iter().collect();
    template
        .iter()
        .filter(|slot| !taken.contains(slot))
        .copied()
        .collect()
}

/// Bookable slots for one salon on one date. Reflects reservations visible
/// at read time only; the insert-time uniqueness constraint is what rules
/// out concurrent double-booking. Past dates are served unless the caller
/// opts into `reject_past`.
pub async fn available_slots(
    store: &Store,
    salon: &SalonRow,
    date: NaiveDate,
    reject_past: bool,
) -> Result<Vec<NaiveTime>, ApiError> {
    if reject_past && date < Utc::now().date_naive() {
        return Err(ApiError::invalid("date is in the past"));
    }

    let hours = salon.hours();
    let template = slot_template(hours.as_ref(), date);
    if template.is_empty() {
        return Ok(Vec::new());
    }

    let reserved = store.reserved_times(&salon.id, date).await?;
    Ok(free_slots(&template, &reserved))
}

fn window_slots(open: &str, close: &str) -> Vec<NaiveTime> {
    let (Ok(open), Ok(close)) = (
        NaiveTime::parse_from_str(open, TIME_FORMAT),
        NaiveTime::parse_from_str(close, TIME_FORMAT),
    ) else {
        log::warn!("unparseable time window {open}..{close}, skipping");
        return Vec::new();
    };

    let step = Duration::minutes(SLOT_MINUTES);
    let mut slots = Vec::new();
    let mut cursor = open;
    while cursor < close {
        slots.push(cursor);
        let (next, overflow) = cursor.overflowing_add_signed(step);
        if overflow != 0 {
            // Stepped past midnight; NaiveTime arithmetic wraps.
            break;
        }
        cursor = next;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClosedTag, TimeWindow};

    fn t(raw: &str) -> NaiveTime {
        NaiveTime::parse_from_str(raw, TIME_FORMAT).unwrap()
    }

    fn sample_hours() -> OperatingHours {
        let mut hours = OperatingHours::new();
        hours.insert(
            "monday".to_string(),
            DaySchedule::Open {
                morning: TimeWindow {
                    open: "09:00".into(),
                    close: "10:30".into(),
                },
                afternoon: TimeWindow {
                    open: "14:00".into(),
                    close: "15:00".into(),
                },
            },
        );
        hours.insert("sunday".to_string(), DaySchedule::Closed(ClosedTag::Closed));
        hours
    }

    #[test]
    fn template_follows_configured_windows() {
        // 2024-06-03 is a Monday.
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let template = slot_template(Some(&sample_hours()), date);
        assert_eq!(
            template,
            vec![t("09:00"), t("09:30"), t("10:00"), t("14:00"), t("14:30")]
        );
    }

    #[test]
    fn closed_day_has_no_slots() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(); // Sunday
        assert!(slot_template(Some(&sample_hours()), date).is_empty());
    }

    #[test]
    fn unlisted_day_is_closed() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(); // Tuesday
        assert!(slot_template(Some(&sample_hours()), date).is_empty());
    }

    #[test]
    fn missing_hours_fall_back_to_default_template() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let template = slot_template(None, date);
        assert_eq!(template.first(), Some(&t("09:00")));
        assert_eq!(template.last(), Some(&t("17:30")));
        // 09:00-12:00 gives 6 slots, 14:00-18:00 gives 8.
        assert_eq!(template.len(), 14);
    }

    #[test]
    fn free_slots_subtracts_reserved_in_order() {
        let template = vec![t("09:00"), t("09:30"), t("10:00")];
        let reserved = vec![t("09:30")];
        assert_eq!(free_slots(&template, &reserved), vec![t("09:00"), t("10:00")]);
    }

    #[test]
    fn free_slots_with_no_reservations_is_full_template() {
        let template = vec![t("09:00"), t("09:30"), t("10:00")];
        assert_eq!(free_slots(&template, &[]), template);
    }

    #[test]
    fn operating_hours_accept_closed_marker() {
        let raw = r#"{
            "monday": {"morning": {"open": "09:00", "close": "12:00"},
                       "afternoon": {"open": "14:00", "close": "18:00"}},
            "sunday": "closed"
        }"#;
        let hours: OperatingHours = serde_json::from_str(raw).unwrap();
        assert!(hours["sunday"].is_closed());
        assert!(!hours["monday"].is_closed());
    }
}
