//! Collection persistence over the key-value substrate.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kv_store::KeyValueStore;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{DocStoreResult, Document, FIELD_CREATED_AT, FIELD_ID, Query};

/// Key prefix for collection slots.
const TABLE_PREFIX: &str = "table:";

/// Default artificial latency for reads.
const DEFAULT_READ_DELAY: Duration = Duration::from_millis(100);

/// Default artificial latency for writes.
const DEFAULT_WRITE_DELAY: Duration = Duration::from_millis(200);

/// Document collection engine over a shared key-value store.
///
/// Writes serialize through an internal mutex, so two inserts racing on
/// the same store cannot clobber each other's read-modify-write cycle.
/// Two separate stores opened over the same substrate are not protected.
pub struct DocStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
    read_delay: Duration,
    write_delay: Duration,
}

impl DocStore {
    /// Creates an engine over the given substrate.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
            read_delay: DEFAULT_READ_DELAY,
            write_delay: DEFAULT_WRITE_DELAY,
        }
    }

    /// Overrides the artificial latency; `Duration::ZERO` disables it.
    pub fn with_delays(mut self, read: Duration, write: Duration) -> Self {
        self.read_delay = read;
        self.write_delay = write;
        self
    }

    /// Starts a query over `collection`.
    ///
    /// An absent collection evaluates as an empty snapshot.
    pub fn query(&self, collection: impl Into<String>) -> Query<'_> {
        Query::new(self, collection.into())
    }

    /// Inserts `payload` into `collection` and returns the stored document.
    ///
    /// An `id` and a `created_at` timestamp are generated first; payload
    /// fields are merged after them, so a caller may supply its own `id`
    /// or `created_at`.
    pub async fn insert(&self, collection: &str, payload: Document) -> DocStoreResult<Document> {
        let document = {
            let _guard = self.write_lock.lock().await;

            let mut document = Document::new();
            document.insert(
                FIELD_ID.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
            document.insert(
                FIELD_CREATED_AT.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
            document.extend(payload);

            let mut rows = self.load(collection);
            rows.push(document.clone());
            self.save(collection, &rows)?;
            document
        };

        debug!(collection, "inserted document");
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        Ok(document)
    }

    pub(crate) fn load(&self, collection: &str) -> Vec<Document> {
        let Some(raw) = self.kv.get(&format!("{TABLE_PREFIX}{collection}")) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(collection, error = %e, "discarding malformed collection slot");
                Vec::new()
            }
        }
    }

    fn save(&self, collection: &str, rows: &[Document]) -> DocStoreResult<()> {
        let raw = serde_json::to_string(rows)?;
        self.kv.set(&format!("{TABLE_PREFIX}{collection}"), &raw);
        Ok(())
    }

    pub(crate) async fn emulate_read_latency(&self) {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kv_store::MemoryKvStore;
    use serde_json::json;

    fn test_store() -> (Arc<MemoryKvStore>, DocStore) {
        let kv = Arc::new(MemoryKvStore::new());
        let store = DocStore::new(kv.clone() as Arc<dyn KeyValueStore>)
            .with_delays(Duration::ZERO, Duration::ZERO);
        (kv, store)
    }

    fn payload(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_created_at() {
        let (_kv, store) = test_store();

        let doc = store
            .insert("scans", payload(json!({"patient_name": "A. Ruiz"})))
            .await
            .unwrap();

        assert!(doc[FIELD_ID].as_str().is_some_and(|id| !id.is_empty()));
        assert!(doc[FIELD_CREATED_AT].as_str().is_some());
        assert_eq!(doc["patient_name"], json!("A. Ruiz"));
    }

    #[tokio::test]
    async fn test_inserted_ids_are_unique() {
        let (_kv, store) = test_store();

        let a = store.insert("scans", Document::new()).await.unwrap();
        let b = store.insert("scans", Document::new()).await.unwrap();

        assert_ne!(a[FIELD_ID], b[FIELD_ID]);
    }

    #[tokio::test]
    async fn test_insert_then_query_round_trip() {
        let (_kv, store) = test_store();

        let inserted = store
            .insert("scans", payload(json!({"body_region": "chest"})))
            .await
            .unwrap();

        let rows = store.query("scans").fetch().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][FIELD_ID], inserted[FIELD_ID]);
    }

    #[tokio::test]
    async fn test_payload_overrides_generated_fields() {
        let (_kv, store) = test_store();

        let doc = store
            .insert("scans", payload(json!({"id": "fixed", "created_at": "then"})))
            .await
            .unwrap();

        assert_eq!(doc[FIELD_ID], json!("fixed"));
        assert_eq!(doc[FIELD_CREATED_AT], json!("then"));
    }

    #[tokio::test]
    async fn test_absent_collection_is_empty() {
        let (_kv, store) = test_store();
        let rows = store.query("nothing").fetch().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_collection_slot_reads_empty() {
        let (kv, store) = test_store();
        kv.set("table:scans", "{broken");

        let rows = store.query("scans").fetch().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_one_reports_not_found_on_empty_result() {
        let (_kv, store) = test_store();

        let err = store.query("scans").fetch_one().await.unwrap_err();
        assert!(matches!(err, crate::DocStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_optional_returns_first_row() {
        let (_kv, store) = test_store();

        assert!(store.query("scans").fetch_optional().await.unwrap().is_none());

        store
            .insert("scans", payload(json!({"n": 1})))
            .await
            .unwrap();
        let row = store.query("scans").fetch_optional().await.unwrap();
        assert_eq!(row.unwrap()["n"], json!(1));
    }

    #[tokio::test]
    async fn test_filter_order_limit_chain() {
        let (_kv, store) = test_store();

        for (region, n) in [("chest", 3), ("chest", 1), ("knee", 5), ("chest", 2)] {
            store
                .insert("scans", payload(json!({"region": region, "n": n})))
                .await
                .unwrap();
        }

        let rows = store
            .query("scans")
            .filter_eq("region", "chest")
            .order_by("n", true)
            .limit(2)
            .fetch()
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row["region"] == json!("chest")));
        let ns: Vec<_> = rows.iter().map(|row| row["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_both_records() {
        let (_kv, store) = test_store();
        let store = Arc::new(store);

        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert("scans", payload(json!({"tag": "first"})))
                    .await
                    .unwrap()
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert("scans", payload(json!({"tag": "second"})))
                    .await
                    .unwrap()
            })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let rows = store.query("scans").fetch().await.unwrap();
        assert_eq!(rows.len(), 2);

        let ids: Vec<_> = rows.iter().map(|row| row[FIELD_ID].clone()).collect();
        assert!(ids.contains(&a[FIELD_ID]));
        assert!(ids.contains(&b[FIELD_ID]));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let (_kv, store) = test_store();

        store
            .insert("scans", payload(json!({"kind": "scan"})))
            .await
            .unwrap();
        store
            .insert("profiles", payload(json!({"kind": "profile"})))
            .await
            .unwrap();

        let scans = store.query("scans").fetch().await.unwrap();
        let profiles = store.query("profiles").fetch().await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(profiles.len(), 1);
        assert_eq!(scans[0]["kind"], json!("scan"));
        assert_eq!(profiles[0]["kind"], json!("profile"));
    }
}
