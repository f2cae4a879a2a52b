use chrono::{NaiveDate, NaiveTime, Utc};

use crate::{
    auth::new_id,
    availability::{free_slots, slot_template},
    error::ApiError,
    models::{PriceList, ReservationRow, SalonRow},
    store::{Store, DATE_FORMAT, TIME_FORMAT},
};

/// Raw booking attempt as received from the caller. Field checks happen
/// locally in [`BookingDraft::validate`] before any store call; the attempt
/// then moves through submission where the chosen slot is re-checked and
/// the insert is guarded by the storage constraint.
///
/// Draft -> Validated -> Submitted -> Confirmed (`ReservationRow`)
///                                 -> Rejected (`ApiError::SlotTaken`)
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub category: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub category: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub full_name: String,
    pub phone: String,
}

impl BookingDraft {
    pub fn validate(self) -> Result<ValidatedBooking, ApiError> {
        if self.category.trim().is_empty() || self.service.trim().is_empty() {
            return Err(ApiError::invalid("please select a service"));
        }
        if self.full_name.trim().is_empty() {
            return Err(ApiError::invalid("full name is required"));
        }
        if self.phone.trim().is_empty() {
            return Err(ApiError::invalid("phone number is required"));
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT)
            .map_err(|_| ApiError::invalid("please pick a date"))?;
        let time = NaiveTime::parse_from_str(self.time.trim(), TIME_FORMAT)
            .map_err(|_| ApiError::invalid("please pick a time slot"))?;

        Ok(ValidatedBooking {
            category: self.category.trim().to_string(),
            service: self.service.trim().to_string(),
            date,
            time,
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
        })
    }
}

/// Price captured at booking time from the salon's current price list.
/// Later edits to the list never touch existing reservations.
pub fn snapshot_price(pricing: Option<&PriceList>, category: &str, service: &str) -> Option<f64> {
    pricing?.get(category)?.get(service).map(|entry| entry.price)
}

/// Submits a validated booking. The availability re-read is a pre-flight
/// courtesy check; the UNIQUE constraint on (salon_id, date, time) is what
/// actually prevents two concurrent submissions from both landing.
pub async fn submit(
    store: &Store,
    salon: &SalonRow,
    booking: ValidatedBooking,
    client_id: Option<&str>,
) -> Result<ReservationRow, ApiError> {
    let hours = salon.hours();
    let template = slot_template(hours.as_ref(), booking.date);
    if !template.contains(&booking.time) {
        return Err(ApiError::invalid("slot is outside opening hours"));
    }

    let reserved = store.reserved_times(&salon.id, booking.date).await?;
    if !free_slots(&template, &reserved).contains(&booking.time) {
        return Err(ApiError::SlotTaken);
    }

    let price_list = salon.price_list();
    let price = snapshot_price(price_list.as_ref(), &booking.category, &booking.service)
        .ok_or_else(|| ApiError::invalid("unknown service for this salon"))?;

    let row = ReservationRow {
        id: new_id(),
        salon_id: salon.id.clone(),
        client_id: client_id.map(str::to_string),
        date: booking.date.format(DATE_FORMAT).to_string(),
        time: booking.time.format(TIME_FORMAT).to_string(),
        service: format!("{} - {}", booking.category, booking.service),
        price,
        full_name: booking.full_name,
        phone: booking.phone,
        created_at: Utc::now().to_rfc3339(),
    };

    store.insert_reservation(&row).await?;
    Ok(row)
}
