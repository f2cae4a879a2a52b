use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use salonbook::auth::new_id;
use salonbook::availability::available_slots;
use salonbook::booking::{self, BookingDraft};
use salonbook::error::ApiError;
use salonbook::models::{ProfileRow, ReservationRow, SalonRow, ROLE_CLIENT, ROLE_PRO};
use salonbook::store::{Store, DATE_FORMAT, TIME_FORMAT};

async fn test_store() -> Store {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Store::new(pool)
}

async fn seed_profile(store: &Store, role: &str) -> String {
    let row = ProfileRow {
        id: new_id(),
        role: role.to_string(),
        first_name: "Test".into(),
        last_name: "User".into(),
        phone: "0600000000".into(),
        email: format!("{}@example.com", new_id()),
        password_hash: "x".into(),
        created_at: Utc::now().to_rfc3339(),
    };
    store.insert_profile(&row).await.unwrap();
    row.id
}

/// "Chez Claude": saturday template is exactly [09:00, 09:30, 10:00]
/// (morning 09:00-10:30, empty afternoon window), one service priced 25.
async fn seed_chez_claude(store: &Store, owner_id: &str) -> SalonRow {
    let hours = r#"{
        "saturday": {"morning": {"open": "09:00", "close": "10:30"},
                     "afternoon": {"open": "14:00", "close": "14:00"}}
    }"#;
    let pricing = r#"{
        "Coupe": {"Coupe femme": {"price": 25.0, "duration": "45 min", "description": ""}}
    }"#;
    let row = SalonRow {
        id: new_id(),
        owner_id: owner_id.to_string(),
        name: "Chez Claude".into(),
        address: "1 rue du Port".into(),
        postal_code: "44000".into(),
        city: "Nantes".into(),
        description: String::new(),
        image_url: None,
        operating_hours: Some(hours.to_string()),
        pricing: Some(pricing.to_string()),
        service_types: None,
        social_links: None,
        average_rating: 0.0,
        vote_count: 0,
        is_verified: 1,
        created_at: Utc::now().to_rfc3339(),
    };
    store.insert_salon(&row).await.unwrap();
    row
}

fn saturday() -> NaiveDate {
    // 2024-06-01 is a Saturday.
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn t(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, TIME_FORMAT).unwrap()
}

fn draft(time: &str) -> BookingDraft {
    BookingDraft {
        category: "Coupe".into(),
        service: "Coupe femme".into(),
        date: saturday().format(DATE_FORMAT).to_string(),
        time: time.into(),
        full_name: "Jeanne Martin".into(),
        phone: "0601020304".into(),
    }
}

fn raw_reservation(salon_id: &str, time: &str) -> ReservationRow {
    ReservationRow {
        id: new_id(),
        salon_id: salon_id.to_string(),
        client_id: None,
        date: saturday().format(DATE_FORMAT).to_string(),
        time: time.to_string(),
        service: "Coupe - Coupe femme".into(),
        price: 25.0,
        full_name: "Walk In".into(),
        phone: "0000000000".into(),
        created_at: Utc::now().to_rfc3339(),
    }
}

#[tokio::test]
async fn empty_date_returns_full_template_in_ascending_order() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;

    let slots = available_slots(&store, &salon, saturday(), false)
        .await
        .unwrap();
    assert_eq!(slots, vec![t("09:00"), t("09:30"), t("10:00")]);
}

#[tokio::test]
async fn availability_read_is_idempotent() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;
    store
        .insert_reservation(&raw_reservation(&salon.id, "09:30"))
        .await
        .unwrap();

    let first = available_slots(&store, &salon, saturday(), false)
        .await
        .unwrap();
    let second = available_slots(&store, &salon, saturday(), false)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn chez_claude_end_to_end() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let client = seed_profile(&store, ROLE_CLIENT).await;
    let salon = seed_chez_claude(&store, &owner).await;

    store
        .insert_reservation(&raw_reservation(&salon.id, "09:30"))
        .await
        .unwrap();

    let slots = available_slots(&store, &salon, saturday(), false)
        .await
        .unwrap();
    assert_eq!(slots, vec![t("09:00"), t("10:00")]);

    let validated = draft("10:00").validate().unwrap();
    let reservation = booking::submit(&store, &salon, validated, Some(&client))
        .await
        .unwrap();
    assert_eq!(reservation.price, 25.0);
    assert_eq!(reservation.time, "10:00");
    assert_eq!(reservation.service, "Coupe - Coupe femme");
    assert_eq!(reservation.client_id.as_deref(), Some(client.as_str()));

    let slots = available_slots(&store, &salon, saturday(), false)
        .await
        .unwrap();
    assert_eq!(slots, vec![t("09:00")]);
}

#[tokio::test]
async fn double_booking_same_slot_is_rejected() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;

    // Two attempts race past the availability read; the constraint decides.
    store
        .insert_reservation(&raw_reservation(&salon.id, "09:00"))
        .await
        .unwrap();
    let second = store
        .insert_reservation(&raw_reservation(&salon.id, "09:00"))
        .await;
    assert!(matches!(second, Err(ApiError::SlotTaken)));

    // The workflow's pre-flight gives the same answer without inserting.
    let validated = draft("09:00").validate().unwrap();
    let rejected = booking::submit(&store, &salon, validated, None).await;
    assert!(matches!(rejected, Err(ApiError::SlotTaken)));
}

#[tokio::test]
async fn simultaneous_submissions_yield_one_winner() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let client_a = seed_profile(&store, ROLE_CLIENT).await;
    let client_b = seed_profile(&store, ROLE_CLIENT).await;
    let salon = seed_chez_claude(&store, &owner).await;

    let first = draft("09:00").validate().unwrap();
    let second = draft("09:00").validate().unwrap();
    let (a, b) = tokio::join!(
        booking::submit(&store, &salon, first, Some(&client_a)),
        booking::submit(&store, &salon, second, Some(&client_b)),
    );

    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(loser, Err(ApiError::SlotTaken)));
}

#[tokio::test]
async fn booked_price_survives_price_list_change() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let client = seed_profile(&store, ROLE_CLIENT).await;
    let salon = seed_chez_claude(&store, &owner).await;

    let validated = draft("09:00").validate().unwrap();
    let reservation = booking::submit(&store, &salon, validated, Some(&client))
        .await
        .unwrap();
    assert_eq!(reservation.price, 25.0);

    let new_pricing = r#"{
        "Coupe": {"Coupe femme": {"price": 40.0, "duration": "45 min", "description": ""}}
    }"#;
    store
        .update_salon_pricing(&salon.id, new_pricing)
        .await
        .unwrap();

    let stored = store
        .reservation_by_id(&reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.price, 25.0);

    // New bookings pick up the new list.
    let salon = store.salon_by_id(&salon.id).await.unwrap().unwrap();
    let validated = draft("09:30").validate().unwrap();
    let fresh = booking::submit(&store, &salon, validated, Some(&client))
        .await
        .unwrap();
    assert_eq!(fresh.price, 40.0);
}

#[tokio::test]
async fn slot_outside_opening_hours_is_invalid() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;

    let validated = draft("11:00").validate().unwrap();
    let result = booking::submit(&store, &salon, validated, None).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn unknown_service_is_invalid() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;

    let mut attempt = draft("09:00");
    attempt.service = "Permanente".into();
    let validated = attempt.validate().unwrap();
    let result = booking::submit(&store, &salon, validated, None).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn cancellation_frees_the_slot() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let client = seed_profile(&store, ROLE_CLIENT).await;
    let salon = seed_chez_claude(&store, &owner).await;

    let validated = draft("09:00").validate().unwrap();
    let reservation = booking::submit(&store, &salon, validated, Some(&client))
        .await
        .unwrap();

    store.delete_reservation(&reservation.id).await.unwrap();

    let slots = available_slots(&store, &salon, saturday(), false)
        .await
        .unwrap();
    assert_eq!(slots, vec![t("09:00"), t("09:30"), t("10:00")]);
}

#[tokio::test]
async fn past_dates_are_served_unless_policy_rejects_them() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;

    // 2024-06-01 is long past: the permissive default still computes.
    let permissive = available_slots(&store, &salon, saturday(), false).await;
    assert!(permissive.is_ok());

    let strict = available_slots(&store, &salon, saturday(), true).await;
    assert!(matches!(strict, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn owner_calendar_range_is_inclusive_and_ordered() {
    let store = test_store().await;
    let owner = seed_profile(&store, ROLE_PRO).await;
    let salon = seed_chez_claude(&store, &owner).await;

    store
        .insert_reservation(&raw_reservation(&salon.id, "09:30"))
        .await
        .unwrap();
    store
        .insert_reservation(&raw_reservation(&salon.id, "09:00"))
        .await
        .unwrap();

    let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let rows = store
        .reservations_between(&salon.id, from, to)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].time, "09:00");
    assert_eq!(rows[1].time, "09:30");
}
