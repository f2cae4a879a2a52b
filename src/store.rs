use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::{is_unique_violation, ApiError},
    models::{
        CommentRow, MessageRow, ProfileRow, ReservationRow, SalonImageRow, SalonRow,
    },
};

pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed gateway around the relational store. Constructed once at startup
/// and handed to every caller through `AppState`; no module-level client.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // Profiles

    pub async fn insert_profile(&self, row: &ProfileRow) -> Result<(), ApiError> {
        sqlx::query(
            r#"INSERT INTO profiles (id, role, first_name, last_name, phone, email, password_hash, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.role)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.password_hash)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ApiError::invalid("an account with this email already exists")
            } else {
                err.into()
            }
        })?;
        Ok(())
    }

    pub async fn profile_by_id(&self, id: &str) -> Result<Option<ProfileRow>, ApiError> {
        let row = sqlx::query_as(
            r#"SELECT id, role, first_name, last_name, phone, email, password_hash, created_at
               FROM profiles WHERE id = ? LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // Salons

    pub async fn insert_salon(&self, row: &SalonRow) -> Result<(), ApiError> {
        sqlx::query(
            r#"INSERT INTO salons
               (id, owner_id, name, address, postal_code, city, description, image_url,
                operating_hours, pricing, service_types, social_links,
                average_rating, vote_count, is_verified, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.owner_id)
        .bind(&row.name)
        .bind(&row.address)
        .bind(&row.postal_code)
        .bind(&row.city)
        .bind(&row.description)
        .bind(&row.image_url)
        .bind(&row.operating_hours)
        .bind(&row.pricing)
        .bind(&row.service_types)
        .bind(&row.social_links)
        .bind(row.average_rating)
        .bind(row.vote_count)
        .bind(row.is_verified)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn salon_by_id(&self, id: &str) -> Result<Option<SalonRow>, ApiError> {
        let row = sqlx::query_as(SALON_COLUMNS_WHERE_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn verified_salons(
        &self,
        city: Option<&str>,
        service: Option<&str>,
    ) -> Result<Vec<SalonRow>, ApiError> {
        let rows: Vec<SalonRow> = sqlx::query_as(
            r#"SELECT id, owner_id, name, address, postal_code, city, description, image_url,
                      operating_hours, pricing, service_types, social_links,
                      average_rating, vote_count, is_verified, created_at
               FROM salons
               WHERE is_verified = 1 AND (? IS NULL OR city = ?)
               ORDER BY average_rating DESC, name"#,
        )
        .bind(city)
        .bind(city)
        .fetch_all(&self.pool)
        .await?;

        // service_types is a JSON array; filter in-process rather than
        // pattern-matching inside the JSON text.
        let rows = match service {
            None => rows,
            Some(wanted) => rows
                .into_iter()
                .filter(|salon| {
                    salon
                        .service_types
                        .as_deref()
                        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
                        .map(|types| types.iter().any(|t| t == wanted))
                        .unwrap_or(false)
                })
                .collect(),
        };
        Ok(rows)
    }

    pub async fn salons_by_owner(&self, owner_id: &str) -> Result<Vec<SalonRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, owner_id, name, address, postal_code, city, description, image_url,
                      operating_hours, pricing, service_types, social_links,
                      average_rating, vote_count, is_verified, created_at
               FROM salons
               WHERE owner_id = ?
               ORDER BY created_at"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn pending_salons(&self) -> Result<Vec<SalonRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, owner_id, name, address, postal_code, city, description, image_url,
                      operating_hours, pricing, service_types, social_links,
                      average_rating, vote_count, is_verified, created_at
               FROM salons
               WHERE is_verified = 0
               ORDER BY created_at"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update_salon_profile(
        &self,
        id: &str,
        name: &str,
        address: &str,
        postal_code: &str,
        city: &str,
        description: &str,
        image_url: Option<&str>,
        service_types: Option<&str>,
        social_links: Option<&str>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"UPDATE salons
               SET name = ?, address = ?, postal_code = ?, city = ?, description = ?,
                   image_url = ?, service_types = ?, social_links = ?
               WHERE id = ?"#,
        )
        .bind(name)
        .bind(address)
        .bind(postal_code)
        .bind(city)
        .bind(description)
        .bind(image_url)
        .bind(service_types)
        .bind(social_links)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_salon_hours(&self, id: &str, hours_json: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE salons SET operating_hours = ? WHERE id = ?")
            .bind(hours_json)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_salon_pricing(&self, id: &str, pricing_json: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE salons SET pricing = ? WHERE id = ?")
            .bind(pricing_json)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_salon_verified(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE salons SET is_verified = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_salon(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM salons WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Reservations

    /// Times already reserved for one salon on one date, template order.
    pub async fn reserved_times(
        &self,
        salon_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, ApiError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT time FROM reservations WHERE salon_id = ? AND date = ? ORDER BY time",
        )
        .bind(salon_id)
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(raw,)| NaiveTime::parse_from_str(&raw, TIME_FORMAT).ok())
            .collect())
    }

    /// Guarded insert. The UNIQUE(salon_id, date, time) constraint is the
    /// real double-booking safety net; a violation surfaces as `SlotTaken`.
    pub async fn insert_reservation(&self, row: &ReservationRow) -> Result<(), ApiError> {
        sqlx::query(
            r#"INSERT INTO reservations
               (id, salon_id, client_id, date, time, service, price, full_name, phone, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.salon_id)
        .bind(&row.client_id)
        .bind(&row.date)
        .bind(&row.time)
        .bind(&row.service)
        .bind(row.price)
        .bind(&row.full_name)
        .bind(&row.phone)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ApiError::SlotTaken
            } else {
                err.into()
            }
        })?;
        Ok(())
    }

    pub async fn reservation_by_id(&self, id: &str) -> Result<Option<ReservationRow>, ApiError> {
        let row = sqlx::query_as(
            r#"SELECT id, salon_id, client_id, date, time, service, price, full_name, phone, created_at
               FROM reservations WHERE id = ? LIMIT 1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn client_reservations(
        &self,
        client_id: &str,
    ) -> Result<Vec<ReservationRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, salon_id, client_id, date, time, service, price, full_name, phone, created_at
               FROM reservations
               WHERE client_id = ?
               ORDER BY date, time"#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Calendar range for the owner view, bounds inclusive.
    pub async fn reservations_between(
        &self,
        salon_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReservationRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, salon_id, client_id, date, time, service, price, full_name, phone, created_at
               FROM reservations
               WHERE salon_id = ? AND date >= ? AND date <= ?
               ORDER BY date, time"#,
        )
        .bind(salon_id)
        .bind(from.format(DATE_FORMAT).to_string())
        .bind(to.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update_reservation(
        &self,
        id: &str,
        full_name: &str,
        phone: &str,
        service: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("UPDATE reservations SET full_name = ?, phone = ?, service = ? WHERE id = ?")
            .bind(full_name)
            .bind(phone)
            .bind(service)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_reservation(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM reservations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Messages

    pub async fn insert_message(&self, row: &MessageRow) -> Result<(), ApiError> {
        sqlx::query(
            r#"INSERT INTO messages (id, salon_id, client_id, sender_id, sender_name, content, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.salon_id)
        .bind(&row.client_id)
        .bind(&row.sender_id)
        .bind(&row.sender_name)
        .bind(&row.content)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// One thread: every message exchanged between a client and a salon,
    /// oldest first. Callers re-fetch on a fixed interval (short poll).
    pub async fn thread_messages(
        &self,
        salon_id: &str,
        client_id: &str,
    ) -> Result<Vec<MessageRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, salon_id, client_id, sender_id, sender_name, content, created_at
               FROM messages
               WHERE salon_id = ? AND client_id = ?
               ORDER BY created_at"#,
        )
        .bind(salon_id)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn salon_messages(&self, salon_id: &str) -> Result<Vec<MessageRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, salon_id, client_id, sender_id, sender_name, content, created_at
               FROM messages
               WHERE salon_id = ?
               ORDER BY created_at"#,
        )
        .bind(salon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Comments

    pub async fn insert_comment(&self, row: &CommentRow) -> Result<(), ApiError> {
        sqlx::query(
            r#"INSERT INTO comments (id, salon_id, client_id, author_name, content, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.salon_id)
        .bind(&row.client_id)
        .bind(&row.author_name)
        .bind(&row.content)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn salon_comments(&self, salon_id: &str) -> Result<Vec<CommentRow>, ApiError> {
        let rows = sqlx::query_as(
            r#"SELECT id, salon_id, client_id, author_name, content, created_at
               FROM comments
               WHERE salon_id = ?
               ORDER BY created_at DESC"#,
        )
        .bind(salon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Salon images

    pub async fn insert_salon_image(&self, salon_id: &str, url: &str) -> Result<SalonImageRow, ApiError> {
        let row = SalonImageRow {
            id: new_id(),
            salon_id: salon_id.to_string(),
            url: url.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        sqlx::query(
            "INSERT INTO salon_images (id, salon_id, url, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.salon_id)
        .bind(&row.url)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_salon_image(&self, salon_id: &str, image_id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM salon_images WHERE id = ? AND salon_id = ?")
            .bind(image_id)
            .bind(salon_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn salon_images(&self, salon_id: &str) -> Result<Vec<SalonImageRow>, ApiError> {
        let rows = sqlx::query_as(
            "SELECT id, salon_id, url, created_at FROM salon_images WHERE salon_id = ? ORDER BY created_at",
        )
        .bind(salon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

const SALON_COLUMNS_WHERE_ID: &str = r#"SELECT id, owner_id, name, address, postal_code, city, description, image_url,
       operating_hours, pricing, service_types, social_links,
       average_rating, vote_count, is_verified, created_at
FROM salons WHERE id = ? LIMIT 1"#;
