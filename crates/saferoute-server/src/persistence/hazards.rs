//! Hazard persistence operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use saferoute_core::{Hazard, HazardSeverity, HazardType, Location};
use sqlx::SqlitePool;

/// Upsert a hazard into the database.
pub async fn upsert_hazard(pool: &SqlitePool, hazard: &Hazard) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO hazards (id, lat, lng, impact_radius_m, severity, hazard_type, description,
                             reported_by, reported_at, verified, upvotes, image, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            lat = ?2, lng = ?3, impact_radius_m = ?4, severity = ?5, hazard_type = ?6,
            description = ?7, reported_by = ?8, verified = ?10, upvotes = ?11, image = ?12,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&hazard.id)
    .bind(hazard.location.lat)
    .bind(hazard.location.lng)
    .bind(hazard.impact_radius_m)
    .bind(hazard.severity.as_str())
    .bind(hazard.hazard_type.as_str())
    .bind(&hazard.description)
    .bind(&hazard.reported_by)
    .bind(hazard.reported_at.to_rfc3339())
    .bind(hazard.verified)
    .bind(i64::from(hazard.upvotes))
    .bind(&hazard.image)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to persist hazard {}", hazard.id))?;

    Ok(())
}

/// Load all hazards from the database, oldest report first.
pub async fn load_all_hazards(pool: &SqlitePool) -> Result<Vec<Hazard>> {
    let rows = sqlx::query_as::<_, HazardRow>(
        "SELECT id, lat, lng, impact_radius_m, severity, hazard_type, description, reported_by, \
         reported_at, verified, upvotes, image FROM hazards ORDER BY reported_at, id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
}

#[derive(sqlx::FromRow)]
struct HazardRow {
    id: String,
    lat: f64,
    lng: f64,
    impact_radius_m: f64,
    severity: String,
    hazard_type: String,
    description: String,
    reported_by: String,
    reported_at: String,
    verified: bool,
    upvotes: i64,
    image: Option<String>,
}

impl TryFrom<HazardRow> for Hazard {
    type Error = anyhow::Error;

    fn try_from(row: HazardRow) -> Result<Self> {
        let severity = HazardSeverity::parse(&row.severity)
            .with_context(|| format!("hazard {} has unknown severity '{}'", row.id, row.severity))?;
        let hazard_type = HazardType::parse(&row.hazard_type).unwrap_or(HazardType::Other);

        let reported_at = DateTime::parse_from_rfc3339(&row.reported_at)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("hazard {} has invalid reported_at", row.id))?;

        Ok(Hazard {
            id: row.id,
            location: Location::new(row.lat, row.lng),
            impact_radius_m: row.impact_radius_m,
            severity,
            hazard_type,
            description: row.description,
            reported_by: row.reported_by,
            reported_at,
            verified: row.verified,
            upvotes: u32::try_from(row.upvotes.max(0)).unwrap_or(u32::MAX),
            image: row.image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;
    use saferoute_core::HazardReport;

    fn hazard(id: &str) -> Hazard {
        HazardReport {
            hazard_type: HazardType::Earthquake,
            severity: HazardSeverity::High,
            location: Location::new(27.6228, 85.5412),
            description: "cracked bridge deck".to_string(),
            reported_by: Some("ward-office".to_string()),
            impact_radius_m: None,
            image: None,
        }
        .into_hazard(id, Utc::now())
    }

    #[tokio::test]
    async fn upsert_then_load_round_trips() {
        let db = init_database(":memory:", 1).await.unwrap();
        let original = hazard("h1");
        upsert_hazard(db.pool(), &original).await.unwrap();

        let mut updated = original.clone();
        updated.upvote();
        updated.set_verified(true);
        upsert_hazard(db.pool(), &updated).await.unwrap();

        let loaded = load_all_hazards(db.pool()).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "h1");
        assert_eq!(loaded[0].upvotes, 1);
        assert!(loaded[0].verified);
        assert_eq!(loaded[0].severity, HazardSeverity::High);
        assert_eq!(loaded[0].impact_radius_m, 400.0);
    }
}
