//! Postgres-backed place store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::PlaceStore;
use crate::error::{IngestionError, Result};
use crate::schemas::{IdentityKey, NewPlace, PlaceRecord, SourceApi};

const SCHEMA: &str = include_str!("../../migrations/0001_create_places.sql");

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Unique constraint on `(source_api, external_id)` in the `places` schema
const IDENTITY_CONSTRAINT: &str = "places_source_identity";

/// Place store over a Postgres pool
#[derive(Clone)]
pub struct PgPlaceStore {
    db: PgPool,
}

impl PgPlaceStore {
    /// Connects to the database
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to database...");

        let db = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        info!("Storage initialized");
        Ok(Self { db })
    }

    /// Creates the `places` table and its indexes if they are missing
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.db).await?;
        debug!("Schema ensured");
        Ok(())
    }
}

/// True only when an insert collided with an existing identity key. Other
/// unique violations (a slug collision, say) are plain database errors.
fn is_identity_conflict(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION) && constraint == Some(IDENTITY_CONSTRAINT)
}

fn is_duplicate_identity(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => {
            is_identity_conflict(db_err.code().as_deref(), db_err.constraint())
        }
        _ => false,
    }
}

#[async_trait]
impl PlaceStore for PgPlaceStore {
    async fn existing_keys(&self, keys: &[IdentityKey]) -> Result<HashSet<IdentityKey>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let (apis, ids): (Vec<String>, Vec<String>) = keys
            .iter()
            .map(|key| (key.source_api.as_str().to_string(), key.external_id.clone()))
            .unzip();

        let rows = sqlx::query(
            r#"
            SELECT source_api, external_id
            FROM places
            WHERE (source_api, external_id) IN (
                SELECT * FROM UNNEST($1::text[], $2::text[])
            )
            "#,
        )
        .bind(&apis)
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut existing = HashSet::with_capacity(rows.len());
        for row in rows {
            let api: String = row.try_get("source_api")?;
            let external_id: String = row.try_get("external_id")?;
            match api.parse::<SourceApi>() {
                Ok(source_api) => {
                    existing.insert(IdentityKey::new(source_api, external_id));
                }
                Err(_) => warn!(source_api = %api, "Unknown source in catalog row"),
            }
        }

        debug!(queried = keys.len(), existing = existing.len(), "Existence lookup");
        Ok(existing)
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<()> {
        let record = &place.record;

        sqlx::query(
            r#"
            INSERT INTO places (
                id, slug, source_api, external_id, name, category, description,
                address, sido, sigungu, latitude, longitude, phone, website,
                raw_payload, collected_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW(), NOW())
            "#,
        )
        .bind(place.id)
        .bind(&place.slug)
        .bind(record.source_api().as_str())
        .bind(record.external_id())
        .bind(&record.name)
        .bind(record.category.as_str())
        .bind(&record.description)
        .bind(&record.address)
        .bind(&record.sido)
        .bind(&record.sigungu)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.phone)
        .bind(&record.website)
        .bind(record.raw_payload())
        .bind(place.collected_at)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_duplicate_identity(&e) {
                IngestionError::DuplicateKey {
                    source_api: record.source_api().to_string(),
                    external_id: record.external_id().to_string(),
                }
            } else {
                IngestionError::DatabaseError(e)
            }
        })?;

        Ok(())
    }

    async fn update_place(&self, record: &PlaceRecord, updated_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE places SET
                name = $3,
                category = $4,
                address = $5,
                sido = $6,
                sigungu = $7,
                latitude = $8,
                longitude = $9,
                phone = $10,
                website = $11,
                raw_payload = $12,
                updated_at = $13
            WHERE source_api = $1 AND external_id = $2
            "#,
        )
        .bind(record.source_api().as_str())
        .bind(record.external_id())
        .bind(&record.name)
        .bind(record.category.as_str())
        .bind(&record.address)
        .bind(&record.sido)
        .bind(&record.sigungu)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.phone)
        .bind(&record.website)
        .bind(record.raw_payload())
        .bind(updated_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM places")
            .fetch_one(&self.db)
            .await?;
        Ok(total.max(0) as u64)
    }
}
