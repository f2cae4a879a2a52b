use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{hash_password, new_id},
    availability::available_slots,
    error::ApiError,
    models::{ProfileRow, ROLE_CLIENT, ROLE_PRO},
    routes::SalonView,
    state::AppState,
    store::{DATE_FORMAT, TIME_FORMAT},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/signup").route(web::post().to(signup)))
        .service(web::resource("/salons").route(web::get().to(list_salons)))
        .service(web::resource("/salons/{id}").route(web::get().to(salon_detail)))
        .service(web::resource("/salons/{id}/availability").route(web::get().to(availability)))
        .service(web::resource("/salons/{id}/comments").route(web::get().to(list_comments)))
        .service(web::resource("/notify/booking").route(web::post().to(relay_booking_notice)))
        .service(web::resource("/notify/acceptance").route(web::post().to(relay_acceptance_notice)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

#[derive(Deserialize)]
struct SignupForm {
    role: String,
    first_name: String,
    last_name: String,
    phone: String,
    email: String,
    password: String,
}

async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupForm>,
) -> Result<HttpResponse, ApiError> {
    let form = payload.into_inner();
    if form.role != ROLE_CLIENT && form.role != ROLE_PRO {
        return Err(ApiError::invalid("role must be client or pro"));
    }
    if form.first_name.trim().is_empty() || form.last_name.trim().is_empty() {
        return Err(ApiError::invalid("first and last name are required"));
    }
    if form.email.trim().is_empty() || !form.email.contains('@') {
        return Err(ApiError::invalid("a valid email is required"));
    }
    if form.password.trim().len() < 6 {
        return Err(ApiError::invalid("password must be at least 6 characters"));
    }

    let password_hash =
        hash_password(&form.password).map_err(|_| ApiError::invalid("password rejected"))?;

    let row = ProfileRow {
        id: new_id(),
        role: form.role,
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        password_hash,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.insert_profile(&row).await?;

    Ok(HttpResponse::Created().json(json!({ "id": row.id })))
}

#[derive(Deserialize)]
struct SalonFilter {
    city: Option<String>,
    service: Option<String>,
}

async fn list_salons(
    state: web::Data<AppState>,
    query: web::Query<SalonFilter>,
) -> Result<HttpResponse, ApiError> {
    let rows = state
        .store
        .verified_salons(query.city.as_deref(), query.service.as_deref())
        .await?;
    let salons: Vec<SalonView> = rows.into_iter().map(SalonView::from).collect();
    Ok(HttpResponse::Ok().json(salons))
}

async fn salon_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let salon = state
        .store
        .salon_by_id(&salon_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let images = state.store.salon_images(&salon_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "salon": SalonView::from(salon),
        "images": images,
    })))
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    date: String,
}

async fn availability(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let date = NaiveDate::parse_from_str(query.date.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::invalid("date must be YYYY-MM-DD"))?;

    let salon = state
        .store
        .salon_by_id(&salon_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let slots = available_slots(&state.store, &salon, date, false).await?;
    let slots: Vec<String> = slots
        .iter()
        .map(|slot| slot.format(TIME_FORMAT).to_string())
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "date": query.date.trim(),
        "slots": slots,
    })))
}

async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    if state.store.salon_by_id(&salon_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let comments = state.store.salon_comments(&salon_id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[derive(Deserialize)]
struct BookingNotice {
    email: String,
    date: String,
}

/// Thin relay: accepts `{email, date}` and forwards to the email provider,
/// reporting the provider outcome directly.
async fn relay_booking_notice(
    state: web::Data<AppState>,
    payload: web::Json<BookingNotice>,
) -> HttpResponse {
    if !state.mailer.enabled() {
        return HttpResponse::ServiceUnavailable()
            .json(json!({ "error": "email is not configured" }));
    }
    let html = format!(
        "<p>Reminder: you have an appointment on {}.</p>",
        payload.date
    );
    match state
        .mailer
        .send(&payload.email, "Appointment reminder", &html)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "email sent" })),
        Err(err) => {
            log::warn!("booking notice relay failed: {err}");
            HttpResponse::BadGateway().json(json!({ "error": err.to_string() }))
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptanceNotice {
    owner_email: String,
    salon_name: String,
}

/// Thin relay: accepts `{ownerEmail, salonName}` for the acceptance mail.
async fn relay_acceptance_notice(
    state: web::Data<AppState>,
    payload: web::Json<AcceptanceNotice>,
) -> HttpResponse {
    if !state.mailer.enabled() {
        return HttpResponse::ServiceUnavailable()
            .json(json!({ "error": "email is not configured" }));
    }
    match state
        .mailer
        .send_salon_accepted(&payload.owner_email, &payload.salon_name)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "email sent" })),
        Err(err) => {
            log::warn!("acceptance notice relay failed: {err}");
            HttpResponse::BadGateway().json(json!({ "error": err.to_string() }))
        }
    }
}
