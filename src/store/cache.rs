use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::engine::Severity;
use crate::store::PredictionRecord;

const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS prediction_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    crop_type TEXT NOT NULL,
    disease_name TEXT NOT NULL,
    confidence REAL NOT NULL,
    severity TEXT NOT NULL,
    temperature REAL,
    humidity REAL,
    rainfall REAL,
    soil_type TEXT,
    soil_moisture REAL,
    recommendations_json TEXT,
    captured_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_prediction_history_user_captured
    ON prediction_history(user_id, captured_at DESC);
"#;

/// Local sqlite mirror of persisted predictions so `history` works
/// without the remote store.
pub struct HistoryCache {
    conn: Connection,
}

impl HistoryCache {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    pub fn insert_prediction(&self, record: &PredictionRecord) -> Result<()> {
        let recommendations_json = record
            .recommendations
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn.execute(
            r#"
INSERT INTO prediction_history(
    user_id, crop_type, disease_name, confidence, severity,
    temperature, humidity, rainfall, soil_type, soil_moisture,
    recommendations_json, captured_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#,
            params![
                record.user_id,
                record.crop_type,
                record.disease_name,
                record.confidence,
                record.severity.to_string(),
                record.temperature,
                record.humidity,
                record.rainfall,
                record.soil_type,
                record.soil_moisture,
                recommendations_json,
                record
                    .created_at
                    .unwrap_or_else(Utc::now)
                    .to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn load_history(
        &self,
        user_id: &str,
        crop_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>> {
        let sql = if crop_type.is_some() {
            r#"
SELECT id, user_id, crop_type, disease_name, confidence, severity,
       temperature, humidity, rainfall, soil_type, soil_moisture,
       recommendations_json, captured_at
FROM prediction_history
WHERE user_id = ?1 AND crop_type = ?2
ORDER BY captured_at DESC, id DESC
LIMIT ?3
"#
        } else {
            r#"
SELECT id, user_id, crop_type, disease_name, confidence, severity,
       temperature, humidity, rainfall, soil_type, soil_moisture,
       recommendations_json, captured_at
FROM prediction_history
WHERE user_id = ?1
ORDER BY captured_at DESC, id DESC
LIMIT ?2
"#
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = if let Some(crop) = crop_type {
            stmt.query_map(params![user_id, crop, limit as i64], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![user_id, limit as i64], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    pub fn count_predictions(&self, user_id: &str, disease: Option<&str>) -> Result<u64> {
        let count: i64 = if let Some(disease) = disease {
            self.conn.query_row(
                "SELECT COUNT(*) FROM prediction_history WHERE user_id = ?1 AND disease_name = ?2",
                params![user_id, disease],
                |row| row.get(0),
            )?
        } else {
            self.conn.query_row(
                "SELECT COUNT(*) FROM prediction_history WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?
        };
        Ok(count as u64)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let severity_raw: String = row.get(5)?;
    let severity = severity_raw.parse::<Severity>().unwrap_or(Severity::Low);
    let recommendations = row
        .get::<_, Option<String>>(11)?
        .and_then(|json| serde_json::from_str(&json).ok());
    let captured_at_raw: String = row.get(12)?;
    let created_at = DateTime::parse_from_rfc3339(&captured_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok();
    Ok(PredictionRecord {
        id: Some(row.get::<_, i64>(0)?.to_string()),
        user_id: row.get(1)?,
        crop_type: row.get(2)?,
        disease_name: row.get(3)?,
        confidence: row.get(4)?,
        severity,
        temperature: row.get(6)?,
        humidity: row.get(7)?,
        rainfall: row.get(8)?,
        soil_type: row.get(9)?,
        soil_moisture: row.get(10)?,
        recommendations,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use super::HistoryCache;
    use crate::engine::Severity;
    use crate::store::PredictionRecord;

    fn record(user: &str, crop: &str, disease: &str, age_minutes: i64) -> PredictionRecord {
        PredictionRecord {
            id: None,
            user_id: user.to_string(),
            crop_type: crop.to_string(),
            disease_name: disease.to_string(),
            confidence: 87.5,
            severity: Severity::Medium,
            temperature: Some(24.0),
            humidity: Some(70.0),
            rainfall: Some(12.0),
            soil_type: Some("Loamy".to_string()),
            soil_moisture: Some(55.0),
            recommendations: None,
            created_at: Some(Utc::now() - Duration::minutes(age_minutes)),
        }
    }

    #[test]
    fn inserts_and_loads_newest_first() {
        let dir = TempDir::new().expect("temp dir");
        let cache = HistoryCache::open(&dir.path().join("history.db")).expect("open cache");

        cache
            .insert_prediction(&record("user-1", "Rice", "Brown Spot", 30))
            .expect("insert");
        cache
            .insert_prediction(&record("user-1", "Wheat", "Rust", 5))
            .expect("insert");
        cache
            .insert_prediction(&record("user-2", "Rice", "Leaf Blast", 1))
            .expect("insert");

        let rows = cache.load_history("user-1", None, 10).expect("load");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].disease_name, "Rust");
        assert_eq!(rows[1].disease_name, "Brown Spot");

        let filtered = cache.load_history("user-1", Some("Rice"), 10).expect("load");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].crop_type, "Rice");
    }

    #[test]
    fn counts_by_user_and_disease() {
        let dir = TempDir::new().expect("temp dir");
        let cache = HistoryCache::open(&dir.path().join("history.db")).expect("open cache");

        cache
            .insert_prediction(&record("user-1", "Tomato", "Healthy", 10))
            .expect("insert");
        cache
            .insert_prediction(&record("user-1", "Tomato", "Early Blight", 5))
            .expect("insert");

        assert_eq!(cache.count_predictions("user-1", None).expect("count"), 2);
        assert_eq!(
            cache
                .count_predictions("user-1", Some("Healthy"))
                .expect("count"),
            1
        );
        assert_eq!(cache.count_predictions("user-3", None).expect("count"), 0);
    }

    #[test]
    fn respects_history_limit() {
        let dir = TempDir::new().expect("temp dir");
        let cache = HistoryCache::open(&dir.path().join("history.db")).expect("open cache");
        for i in 0..8 {
            cache
                .insert_prediction(&record("user-1", "Maize", "Common Rust", i))
                .expect("insert");
        }
        let rows = cache.load_history("user-1", None, 3).expect("load");
        assert_eq!(rows.len(), 3);
    }
}
