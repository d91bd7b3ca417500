use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One evaluated scan, as persisted in history.
///
/// `product_name` is nullable: degraded evaluations and rows written before
/// name enrichment existed have no stored name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanRecord {
    pub id: Uuid,
    pub email: String,
    pub upc: String,
    pub score: i32,
    pub reasoning: String,
    pub image_url: String,
    pub product_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub scanned_at: OffsetDateTime,
}

impl ScanRecord {
    pub fn new(
        email: String,
        upc: String,
        score: i32,
        reasoning: String,
        image_url: String,
        product_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            upc,
            score,
            reasoning,
            image_url,
            product_name,
            scanned_at: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: &ScanRecord) -> anyhow::Result<()>;
    /// Scans for one user, most recent first.
    async fn list_by_user(&self, email: &str) -> anyhow::Result<Vec<ScanRecord>>;
    /// Every scan across all users, most recent first.
    async fn list_all(&self) -> anyhow::Result<Vec<ScanRecord>>;
}

pub struct PgHistoryStore {
    db: PgPool,
}

impl PgHistoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, record: &ScanRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scans (id, email, upc, score, reasoning, image_url,
                               product_name, scanned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.upc)
        .bind(record.score)
        .bind(&record.reasoning)
        .bind(&record.image_url)
        .bind(&record.product_name)
        .bind(record.scanned_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn list_by_user(&self, email: &str) -> anyhow::Result<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT id, email, upc, score, reasoning, image_url, product_name, scanned_at
            FROM scans
            WHERE email = $1
            ORDER BY scanned_at DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT id, email, upc, score, reasoning, image_url, product_name, scanned_at
            FROM scans
            ORDER BY scanned_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_stamps_id_and_time() {
        let before = OffsetDateTime::now_utc();
        let record = ScanRecord::new(
            "a@b.c".into(),
            "0123456789012".into(),
            73,
            "Low sugar, decent fiber.".into(),
            "https://images.example/1.jpg".into(),
            Some("Oat Flakes".into()),
        );
        assert!(record.scanned_at >= before);
        assert_eq!(record.email, "a@b.c");
        assert_eq!(record.product_name.as_deref(), Some("Oat Flakes"));
    }

    #[test]
    fn record_serializes_timestamp_as_rfc3339() {
        let record = ScanRecord::new(
            "a@b.c".into(),
            "111".into(),
            50,
            "ok".into(),
            "https://img".into(),
            None,
        );
        let json = serde_json::to_value(&record).expect("serialize record");
        let stamp = json["scanned_at"].as_str().expect("string timestamp");
        assert!(stamp.contains('T'), "not rfc3339: {stamp}");
        assert!(json["product_name"].is_null());
    }
}
