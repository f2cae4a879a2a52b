use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PRO: &str = "pro";
pub const ROLE_CLIENT: &str = "client";

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

impl ProfileRow {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalonRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub description: String,
    pub image_url: Option<String>,
    pub operating_hours: Option<String>,
    pub pricing: Option<String>,
    pub service_types: Option<String>,
    pub social_links: Option<String>,
    pub average_rating: f64,
    pub vote_count: i64,
    pub is_verified: i64,
    pub created_at: String,
}

impl SalonRow {
    pub fn hours(&self) -> Option<OperatingHours> {
        self.operating_hours
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn price_list(&self) -> Option<PriceList> {
        self.pricing
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReservationRow {
    pub id: String,
    pub salon_id: String,
    pub client_id: Option<String>,
    pub date: String,
    pub time: String,
    pub service: String,
    pub price: f64,
    pub full_name: String,
    pub phone: String,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub salon_id: String,
    pub client_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentRow {
    pub id: String,
    pub salon_id: String,
    pub client_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalonImageRow {
    pub id: String,
    pub salon_id: String,
    pub url: String,
    pub created_at: String,
}

/// Weekly schedule keyed by lowercase English day name. A day is either
/// marked "closed" or carries a morning and an afternoon window.
pub type OperatingHours = BTreeMap<String, DaySchedule>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaySchedule {
    Open {
        morning: TimeWindow,
        afternoon: TimeWindow,
    },
    Closed(ClosedTag),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosedTag {
    Closed,
}

impl DaySchedule {
    pub fn is_closed(&self) -> bool {
        matches!(self, DaySchedule::Closed(_))
    }
}

/// Wall-clock window with "HH:MM" bounds. No timezone conversion anywhere;
/// times are local to the salon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub open: String,
    pub close: String,
}

/// Category name -> service name -> priced entry.
pub type PriceList = BTreeMap<String, BTreeMap<String, ServicePricing>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePricing {
    pub price: f64,
    pub duration: String,
    #[serde(default)]
    pub description: String,
}
