use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    auth::{client_validator, new_id, AuthUser},
    booking::{self, BookingDraft},
    error::ApiError,
    mail,
    models::{CommentRow, MessageRow, SalonRow},
    rating::submit_rating,
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/client")
            .wrap(HttpAuthentication::basic(client_validator))
            .service(
                web::resource("/bookings")
                    .route(web::get().to(list_bookings))
                    .route(web::post().to(create_booking)),
            )
            .service(web::resource("/bookings/{id}").route(web::delete().to(cancel_booking)))
            .service(web::resource("/salons/{id}/rating").route(web::post().to(rate_salon)))
            .service(web::resource("/salons/{id}/comments").route(web::post().to(post_comment)))
            .service(
                web::resource("/salons/{id}/messages")
                    .route(web::get().to(list_messages))
                    .route(web::post().to(send_message)),
            ),
    );
}

#[derive(Deserialize)]
struct BookingForm {
    salon_id: String,
    category: String,
    service: String,
    date: String,
    time: String,
    full_name: String,
    phone: String,
}

async fn create_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<BookingForm>,
) -> Result<HttpResponse, ApiError> {
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

    let salon = bookable_salon(&state, &form.salon_id).await?;
    let reservation = booking::submit(&state.store, &salon, validated, Some(&auth.id)).await?;

    // Reservation is durable at this point; the confirmation email is
    // advisory and runs detached.
    mail::notify_booking(
        &state.mailer,
        &auth.email,
        &salon.name,
        &reservation.date,
        &reservation.time,
        &reservation.service,
    );

    Ok(HttpResponse::Created().json(reservation))
}

async fn list_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    let reservations = state.store.client_reservations(&auth.id).await?;
    Ok(HttpResponse::Ok().json(reservations))
}

async fn cancel_booking(
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

    if reservation.client_id.as_deref() != Some(&auth.id) {
        return Err(ApiError::Forbidden);
    }

    state.store.delete_reservation(&reservation_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
struct RatingForm {
    note: i64,
}

async fn rate_salon(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<RatingForm>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let summary = submit_rating(&state.store, &auth.id, &salon_id, payload.note).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Deserialize)]
struct CommentForm {
    content: String,
}

async fn post_comment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::invalid("comment cannot be empty"));
    }
    if state.store.salon_by_id(&salon_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let row = CommentRow {
        id: new_id(),
        salon_id,
        client_id: auth.id.clone(),
        author_name: auth.display_name.clone(),
        content,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.insert_comment(&row).await?;
    Ok(HttpResponse::Created().json(row))
}

async fn list_messages(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let messages = state.store.thread_messages(&salon_id, &auth.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[derive(Deserialize)]
struct MessageForm {
    content: String,
}

async fn send_message(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<MessageForm>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::invalid("message cannot be empty"));
    }
    if state.store.salon_by_id(&salon_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let row = MessageRow {
        id: new_id(),
        salon_id,
        client_id: auth.id.clone(),
        sender_id: auth.id.clone(),
        sender_name: auth.display_name.clone(),
        content,
        created_at: Utc::now().to_rfc3339(),
    };
    state.store.insert_message(&row).await?;
    Ok(HttpResponse::Created().json(row))
}

async fn bookable_salon(state: &AppState, salon_id: &str) -> Result<SalonRow, ApiError> {
    let salon = state
        .store
        .salon_by_id(salon_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if salon.is_verified != 1 {
        return Err(ApiError::NotFound);
    }
    Ok(salon)
}
