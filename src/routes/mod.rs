pub mod admin;
pub mod client;
pub mod pro;
pub mod public;

use serde::Serialize;
use serde_json::Value;

use crate::models::SalonRow;

/// Public projection of a salon row: JSON columns parsed, owner and raw
/// storage details kept out.
#[derive(Debug, Serialize)]
pub struct SalonView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub description: String,
    pub image_url: Option<String>,
    pub operating_hours: Option<Value>,
    pub pricing: Option<Value>,
    pub service_types: Vec<String>,
    pub social_links: Option<Value>,
    pub average_rating: f64,
    pub vote_count: i64,
    pub is_verified: bool,
}

impl From<SalonRow> for SalonView {
    fn from(row: SalonRow) -> Self {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| serde_json::from_str::<Value>(value).ok())
        };
        SalonView {
            operating_hours: parse(&row.operating_hours),
            pricing: parse(&row.pricing),
            service_types: row
                .service_types
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
            social_links: parse(&row.social_links),
            id: row.id,
            name: row.name,
            address: row.address,
            postal_code: row.postal_code,
            city: row.city,
            description: row.description,
            image_url: row.image_url,
            average_rating: row.average_rating,
            vote_count: row.vote_count,
            is_verified: row.is_verified == 1,
        }
    }
}
