use actix_web::{dev::ServiceRequest, error::ErrorUnauthorized, web, Error, HttpMessage};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{ProfileRow, ROLE_ADMIN, ROLE_CLIENT, ROLE_PRO},
    state::AppState,
};

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn authenticate_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> Option<AuthUser> {
    let profile: Option<ProfileRow> = sqlx::query_as(
        r#"SELECT id, role, first_name, last_name, phone, email, password_hash, created_at
           FROM profiles
           WHERE email = ?
           LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(state.store.pool())
    .await
    .ok()?;

    let profile = profile?;
    if !verify_password(password, &profile.password_hash) {
        return None;
    }

    Some(AuthUser {
        id: profile.id.clone(),
        display_name: profile.display_name(),
        email: profile.email,
        role: profile.role,
    })
}

async fn authenticate(req: &ServiceRequest, credentials: &BasicAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or(ApiError::Unauthorized)?;
    let email = credentials.user_id();
    let password = credentials.password().unwrap_or_default();
    authenticate_credentials(state, email, password)
        .await
        .ok_or(ApiError::Unauthorized.into())
}

async fn role_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
    role: &str,
    denial: &str,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if user.role != role {
                return Err((ErrorUnauthorized(denial.to_string()), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn client_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    role_validator(req, credentials, ROLE_CLIENT, "Client access required").await
}

pub async fn pro_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    role_validator(req, credentials, ROLE_PRO, "Professional access required").await
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    role_validator(req, credentials, ROLE_ADMIN, "Admin access required").await
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
