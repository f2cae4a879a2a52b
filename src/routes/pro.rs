use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{new_id, pro_validator, AuthUser},
    booking::{self, BookingDraft},
    error::ApiError,
    models::{MessageRow, OperatingHours, PriceList, SalonRow, ROLE_CLIENT},
    routes::SalonView,
    state::AppState,
    store::DATE_FORMAT,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pro")
            .wrap(HttpAuthentication::basic(pro_validator))
            .service(
                web::resource("/salons")
                    .route(web::get().to(my_salons))
                    .route(web::post().to(register_salon)),
            )
            .service(web::resource("/salons/{id}").route(web::put().to(update_salon)))
            .service(web::resource("/salons/{id}/hours").route(web::put().to(update_hours)))
            .service(web::resource("/salons/{id}/pricing").route(web::put().to(update_pricing)))
            .service(
                web::resource("/salons/{id}/reservations")
                    .route(web::get().to(list_reservations))
                    .route(web::post().to(create_walk_in)),
            )
            .service(
                web::resource("/salons/{id}/images")
                    .route(web::get().to(list_images))
                    .route(web::post().to(add_image)),
            )
            .service(
                web::resource("/salons/{id}/images/{image_id}")
                    .route(web::delete().to(remove_image)),
            )
            .service(
                web::resource("/salons/{id}/messages")
                    .route(web::get().to(list_messages))
                    .route(web::post().to(reply_message)),
            )
            .service(
                web::resource("/reservations/{id}")
                    .route(web::put().to(update_reservation))
                    .route(web::delete().to(delete_reservation)),
            ),
    );
}

#[derive(Deserialize)]
struct SalonForm {
    name: String,
    address: String,
    postal_code: String,
    city: String,
    #[serde(default)]
    description: String,
    image_url: Option<String>,
    service_types: Option<Vec<String>>,
    social_links: Option<serde_json::Value>,
    operating_hours: Option<OperatingHours>,
    pricing: Option<PriceList>,
}

async fn register_salon(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<SalonForm>,
) -> Result<HttpResponse, ApiError> {
    let form = payload.into_inner();
    if form.name.trim().is_empty() {
        return Err(ApiError::invalid("salon name is required"));
    }
    if form.address.trim().is_empty() || form.city.trim().is_empty() {
        return Err(ApiError::invalid("address and city are required"));
    }

    let to_json = |value: &Option<serde_json::Value>| {
        value.as_ref().map(|v| v.to_string())
    };

    let row = SalonRow {
        id: new_id(),
        owner_id: auth.id.clone(),
        name: form.name.trim().to_string(),
        address: form.address.trim().to_string(),
        postal_code: form.postal_code.trim().to_string(),
        city: form.city.trim().to_string(),
        description: form.description.trim().to_string(),
        image_url: form.image_url,
        operating_hours: form
            .operating_hours
            .as_ref()
            .map(|hours| serde_json::to_string(hours).unwrap_or_default()),
        pricing: form
            .pricing
            .as_ref()
            .map(|pricing| serde_json::to_string(pricing).unwrap_or_default()),
        service_types: form
            .service_types
            .as_ref()
            .map(|types| serde_json::to_string(types).unwrap_or_default()),
        social_links: to_json(&form.social_links),
        average_rating: 0.0,
        vote_count: 0,
        // New salons wait for admin review before clients can see them.
        is_verified: 0,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.insert_salon(&row).await?;

    Ok(HttpResponse::Created().json(SalonView::from(row)))
}

async fn my_salons(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let rows = state.store.salons_by_owner(&auth.id).await?;
    let salons: Vec<SalonView> = rows.into_iter().map(SalonView::from).collect();
    Ok(HttpResponse::Ok().json(salons))
}

async fn update_salon(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<SalonForm>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let form = payload.into_inner();
    if form.name.trim().is_empty() {
        return Err(ApiError::invalid("salon name is required"));
    }

    let service_types = form
        .service_types
        .as_ref()
        .map(|types| serde_json::to_string(types).unwrap_or_default());
    let social_links = form.social_links.as_ref().map(|links| links.to_string());

    state
        .store
        .update_salon_profile(
            &salon.id,
            form.name.trim(),
            form.address.trim(),
            form.postal_code.trim(),
            form.city.trim(),
            form.description.trim(),
            form.image_url.as_deref(),
            service_types.as_deref(),
            social_links.as_deref(),
        )
        .await?;

    let refreshed = state
        .store
        .salon_by_id(&salon.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(SalonView::from(refreshed)))
}

async fn update_hours(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<OperatingHours>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let hours = payload.into_inner();
    let raw = serde_json::to_string(&hours)
        .map_err(|_| ApiError::invalid("unusable operating hours"))?;
    state.store.update_salon_hours(&salon.id, &raw).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

async fn update_pricing(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<PriceList>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let pricing = payload.into_inner();
    for (category, services) in &pricing {
        if category.trim().is_empty() || services.is_empty() {
            return Err(ApiError::invalid("every category needs a name and services"));
        }
        for entry in services.values() {
            if entry.price < 0.0 {
                return Err(ApiError::invalid("prices cannot be negative"));
            }
        }
    }
    let raw =
        serde_json::to_string(&pricing).map_err(|_| ApiError::invalid("unusable price list"))?;
    state.store.update_salon_pricing(&salon.id, &raw).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[derive(Deserialize)]
struct CalendarRange {
    from: String,
    to: String,
}

async fn list_reservations(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    query: web::Query<CalendarRange>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let from = NaiveDate::parse_from_str(query.from.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::invalid("from must be YYYY-MM-DD"))?;
    let to = NaiveDate::parse_from_str(query.to.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::invalid("to must be YYYY-MM-DD"))?;
    if from > to {
        return Err(ApiError::invalid("from must not be after to"));
    }

    let reservations = state.store.reservations_between(&salon.id, from, to).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

#[derive(Deserialize)]
struct WalkInForm {
    category: String,
    service: String,
    date: String,
    time: String,
    full_name: String,
    phone: String,
}

/// Owner-entered booking for a walk-in client; no client account attached.
async fn create_walk_in(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<WalkInForm>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let form = payload.into_inner();

    let draft = BookingDraft {
        category: form.category,
        service: form.service,
        date: form.date,
        time: form.time,
        full_name: form.full_name,
        phone: form.phone,
    };
    let validated = draft.validate()?;
    let reservation = booking::submit(&state.store, &salon, validated, None).await?;

    Ok(HttpResponse::Created().json(reservation))
}

#[derive(Deserialize)]
struct ReservationEditForm {
    full_name: String,
    phone: String,
    service: String,
}

async fn update_reservation(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<ReservationEditForm>,
) -> Result<HttpResponse, ApiError> {
    let reservation_id = path.into_inner();
    let reservation = state
        .store
        .reservation_by_id(&reservation_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    owned_salon(&state, &reservation.salon_id, &auth).await?;

    let form = payload.into_inner();
    if form.full_name.trim().is_empty() || form.phone.trim().is_empty() {
        return Err(ApiError::invalid("client name and phone are required"));
    }
    state
        .store
        .update_reservation(
            &reservation_id,
            form.full_name.trim(),
            form.phone.trim(),
            form.service.trim(),
        )
        .await?;

    let refreshed = state
        .store
        .reservation_by_id(&reservation_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(refreshed))
}

async fn delete_reservation(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let reservation_id = path.into_inner();
    let reservation = state
        .store
        .reservation_by_id(&reservation_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    owned_salon(&state, &reservation.salon_id, &auth).await?;

    state.store.delete_reservation(&reservation_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_images(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let images = state.store.salon_images(&salon.id).await?;
    Ok(HttpResponse::Ok().json(images))
}

#[derive(Deserialize)]
struct ImageForm {
    url: String,
}

/// Registers an already-uploaded image URL; the object store upload itself
/// happens outside this service.
async fn add_image(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<ImageForm>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let url = payload.url.trim().to_string();
    if url.is_empty() {
        return Err(ApiError::invalid("image url is required"));
    }
    let image = state.store.insert_salon_image(&salon.id, &url).await?;
    Ok(HttpResponse::Created().json(image))
}

async fn remove_image(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (salon_id, image_id) = path.into_inner();
    let salon = owned_salon(&state, &salon_id, &auth).await?;
    state.store.delete_salon_image(&salon.id, &image_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_messages(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let messages = state.store.salon_messages(&salon.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[derive(Deserialize)]
struct ReplyForm {
    client_id: String,
    content: String,
}

async fn reply_message(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<ReplyForm>,
) -> Result<HttpResponse, ApiError> {
    let salon = owned_salon(&state, &path.into_inner(), &auth).await?;
    let form = payload.into_inner();
    let content = form.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::invalid("message cannot be empty"));
    }
    // Threads only exist between a salon and a client account.
    match state.store.profile_by_id(&form.client_id).await? {
        Some(profile) if profile.role == ROLE_CLIENT => {}
        _ => return Err(ApiError::NotFound),
    }

    let row = MessageRow {
        id: new_id(),
        salon_id: salon.id.clone(),
        client_id: form.client_id,
        sender_id: auth.id.clone(),
        sender_name: auth.display_name.clone(),
        content,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.insert_message(&row).await?;
    Ok(HttpResponse::Created().json(row))
}

async fn owned_salon(
    state: &AppState,
    salon_id: &str,
    auth: &AuthUser,
) -> Result<SalonRow, ApiError> {
    let salon = state
        .store
        .salon_by_id(salon_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if salon.owner_id != auth.id {
        return Err(ApiError::Forbidden);
    }
    Ok(salon)
}
