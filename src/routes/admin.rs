use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde_json::json;

use crate::{
    auth::admin_validator, error::ApiError, mail, routes::SalonView, state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(web::resource("/salons/pending").route(web::get().to(pending_salons)))
            .service(web::resource("/salons/{id}/verify").route(web::post().to(verify_salon)))
            .service(web::resource("/salons/{id}").route(web::delete().to(reject_salon))),
    );
}

async fn pending_salons(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = state.store.pending_salons().await?;
    let salons: Vec<SalonView> = rows.into_iter().map(SalonView::from).collect();
    Ok(HttpResponse::Ok().json(salons))
}

/// Approves a pending salon. The acceptance email is advisory: it runs
/// detached and a provider failure never undoes the verification.
async fn verify_salon(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    let salon = state
        .store
        .salon_by_id(&salon_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    state.store.set_salon_verified(&salon.id).await?;

    match state.store.profile_by_id(&salon.owner_id).await? {
        Some(owner) => mail::notify_salon_accepted(&state.mailer, &owner.email, &salon.name),
        None => log::warn!("salon {} has no owner profile, skipping email", salon.id),
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Rejection removes the registration outright.
async fn reject_salon(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let salon_id = path.into_inner();
    if state.store.salon_by_id(&salon_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.delete_salon(&salon_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
