use chrono::Utc;
use serde::Serialize;

use crate::{
    auth::new_id,
    error::{is_unique_violation, ApiError},
    store::Store,
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub vote_count: i64,
}

/// Records one client's rating of a salon and keeps the salon's
/// denormalized average in step. At most one rating row exists per
/// (client, salon); a second vote moves the existing row instead of adding
/// one. Both writes run in a single transaction so the aggregate can never
/// drift from the rating set.
pub async fn submit_rating(
    store: &Store,
    client_id: &str,
    salon_id: &str,
    note: i64,
) -> Result<RatingSummary, ApiError> {
    if !(1..=5).contains(&note) {
        return Err(ApiError::invalid("rating must be between 1 and 5"));
    }

    let mut tx = store.pool().begin().await.map_err(ApiError::from)?;

    let salon: Option<(f64, i64)> =
        sqlx::query_as("SELECT average_rating, vote_count FROM salons WHERE id = ?")
            .bind(salon_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some((average, count)) = salon else {
        return Err(ApiError::NotFound);
    };

    let existing: Option<(String, i64)> =
        sqlx::query_as("SELECT id, note FROM ratings WHERE client_id = ? AND salon_id = ?")
            .bind(client_id)
            .bind(salon_id)
            .fetch_optional(&mut *tx)
            .await?;

    let summary = match existing {
        Some((rating_id, old_note)) => {
            // Re-vote: replace this client's contribution, count unchanged.
            let new_average = (average * count as f64 - old_note as f64 + note as f64) / count as f64;
            sqlx::query("UPDATE ratings SET note = ? WHERE id = ?")
                .bind(note)
                .bind(&rating_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE salons SET average_rating = ? WHERE id = ?")
                .bind(new_average)
                .bind(salon_id)
                .execute(&mut *tx)
                .await?;
            RatingSummary {
                average_rating: new_average,
                vote_count: count,
            }
        }
        None => {
            let new_count = count + 1;
            let new_average = (average * count as f64 + note as f64) / new_count as f64;
            sqlx::query(
                r#"INSERT INTO ratings (id, client_id, salon_id, note, created_at)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(new_id())
            .bind(client_id)
            .bind(salon_id)
            .bind(note)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ApiError::invalid("rating already recorded")
                } else {
                    err.into()
                }
            })?;
            sqlx::query("UPDATE salons SET average_rating = ?, vote_count = ? WHERE id = ?")
                .bind(new_average)
                .bind(new_count)
                .bind(salon_id)
                .execute(&mut *tx)
                .await?;
            RatingSummary {
                average_rating: new_average,
                vote_count: new_count,
            }
        }
    };

    tx.commit().await.map_err(ApiError::from)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileRow, SalonRow, ROLE_CLIENT, ROLE_PRO};
    use sqlx::sqlite::SqlitePoolOptions;

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

    async fn seed_salon(store: &Store, owner_id: &str) -> String {
        let row = SalonRow {
            id: new_id(),
            owner_id: owner_id.to_string(),
            name: "Chez Claude".into(),
            address: "1 rue du Port".into(),
            postal_code: "44000".into(),
            city: "Nantes".into(),
            description: String::new(),
            image_url: None,
            operating_hours: None,
            pricing: None,
            service_types: None,
            social_links: None,
            average_rating: 0.0,
            vote_count: 0,
            is_verified: 1,
            created_at: Utc::now().to_rfc3339(),
        };
        store.insert_salon(&row).await.unwrap();
        row.id
    }

    #[tokio::test]
    async fn vote_revote_sequence_recomputes_average() {
        let store = test_store().await;
        let owner = seed_profile(&store, ROLE_PRO).await;
        let salon = seed_salon(&store, &owner).await;
        let alice = seed_profile(&store, ROLE_CLIENT).await;
        let bob = seed_profile(&store, ROLE_CLIENT).await;

        let first = submit_rating(&store, &alice, &salon, 4).await.unwrap();
        assert_eq!(first.average_rating, 4.0);
        assert_eq!(first.vote_count, 1);

        let second = submit_rating(&store, &bob, &salon, 2).await.unwrap();
        assert_eq!(second.average_rating, 3.0);
        assert_eq!(second.vote_count, 2);

        // Alice changes her mind: (3.0 * 2 - 4 + 5) / 2 = 3.5, count stays.
        let revote = submit_rating(&store, &alice, &salon, 5).await.unwrap();
        assert_eq!(revote.average_rating, 3.5);
        assert_eq!(revote.vote_count, 2);

        let refreshed = store.salon_by_id(&salon).await.unwrap().unwrap();
        assert_eq!(refreshed.average_rating, 3.5);
        assert_eq!(refreshed.vote_count, 2);
    }

    #[tokio::test]
    async fn note_out_of_range_is_rejected_before_any_write() {
        let store = test_store().await;
        let owner = seed_profile(&store, ROLE_PRO).await;
        let salon = seed_salon(&store, &owner).await;
        let client = seed_profile(&store, ROLE_CLIENT).await;

        assert!(submit_rating(&store, &client, &salon, 0).await.is_err());
        assert!(submit_rating(&store, &client, &salon, 6).await.is_err());

        let untouched = store.salon_by_id(&salon).await.unwrap().unwrap();
        assert_eq!(untouched.vote_count, 0);
    }

    #[tokio::test]
    async fn rating_unknown_salon_is_not_found() {
        let store = test_store().await;
        let client = seed_profile(&store, ROLE_CLIENT).await;
        let err = submit_rating(&store, &client, "missing", 3).await;
        assert!(matches!(err, Err(ApiError::NotFound)));
    }
}
