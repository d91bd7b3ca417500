use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::scans::repo::ScanRecord;

/// Body for submitting a scanned barcode.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub email: String,
    pub upc: String,
}

/// Best-effort answer for a scan. Always present, even when every upstream
/// failed; a degraded evaluation carries the neutral score and sentinels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResponse {
    pub score: i32,
    pub reasoning: String,
    pub image_url: String,
    pub product_name: String,
}

/// One history entry as exposed over the API. The email is implied by the
/// request path and not repeated here.
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub upc: String,
    pub score: i32,
    pub reasoning: String,
    pub image_url: String,
    pub product_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub scanned_at: OffsetDateTime,
}

impl From<ScanRecord> for HistoryItem {
    fn from(record: ScanRecord) -> Self {
        Self {
            id: record.id,
            upc: record.upc,
            score: record.score,
            reasoning: record.reasoning,
            image_url: record.image_url,
            product_name: record.product_name,
            scanned_at: record.scanned_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_item_drops_the_email() {
        let record = ScanRecord::new(
            "a@b.c".into(),
            "111".into(),
            70,
            "fine".into(),
            "https://img".into(),
            Some("Granola".into()),
        );
        let item = HistoryItem::from(record);
        let json = serde_json::to_value(&item).expect("serialize history item");
        assert!(json.get("email").is_none());
        assert_eq!(json["upc"], "111");
        assert_eq!(json["product_name"], "Granola");
    }
}
