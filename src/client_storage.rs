//! Record-level operations over the client document.
//!
//! Every operation reads the whole document through the backend; writes mutate
//! it in memory and persist it in full.

use crate::db::{DocumentBackend, StoreDocument};
use crate::errors::{AppError, ResultExt};
use crate::models::ClientRecord;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const NOT_FOUND_MESSAGE: &str = "User not found";

/// Client record store backed by a [`DocumentBackend`].
pub struct ClientStore {
    backend: Arc<dyn DocumentBackend>,
    /// Serialises read-modify-write cycles issued through this store.
    write_gate: Mutex<()>,
}

impl ClientStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            write_gate: Mutex::new(()),
        }
    }

    /// Returns every stored record in document order.
    pub async fn list_all(&self) -> Result<Vec<ClientRecord>, AppError> {
        Ok(self.backend.load().await?.submissions)
    }

    pub async fn count(&self) -> Result<usize, AppError> {
        Ok(self.backend.load().await?.submissions.len())
    }

    /// Case-insensitive exact match on the first name. No match is an empty list.
    pub async fn find_by_first_name(&self, name: &str) -> Result<Vec<ClientRecord>, AppError> {
        let document = self.backend.load().await?;
        Ok(document
            .submissions
            .into_iter()
            .filter(|record| record.first_name_matches(name))
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<ClientRecord, AppError> {
        self.backend
            .load()
            .await?
            .submissions
            .into_iter()
            .find(|record| record.id() == Some(id))
            .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))
    }

    /// Stores `record` as-is under a freshly generated identifier.
    ///
    /// Any identifier or timestamp on the incoming record is replaced.
    pub async fn insert(&self, mut record: ClientRecord) -> Result<ClientRecord, AppError> {
        let _guard = self.write_gate.lock().await;
        let mut document = self.backend.load().await?;

        let id = generate_id(&document);
        record.set_id(id.clone());
        record.clear_last_update();
        document.submissions.push(record.clone());

        self.backend
            .save(&document)
            .await
            .context("saving form submission")?;

        tracing::debug!("Inserted client {} into {}", id, self.backend.describe());
        Ok(record)
    }

    /// Merges `patch` into the record and stamps `last_update`.
    ///
    /// Concurrent patches to the same record are last-writer-wins.
    pub async fn update_partial(
        &self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<ClientRecord, AppError> {
        let _guard = self.write_gate.lock().await;
        let mut document = self.backend.load().await?;

        let position = find_position(&document, id)?;
        let record = &mut document.submissions[position];

        let previous = record.last_update();
        record.merge(patch);
        record.set_last_update(next_update_timestamp(previous));
        let updated = record.clone();

        self.backend
            .save(&document)
            .await
            .context("updating client")?;

        Ok(updated)
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_gate.lock().await;
        let mut document = self.backend.load().await?;

        let position = find_position(&document, id)?;
        document.submissions.remove(position);

        self.backend
            .save(&document)
            .await
            .context("deleting client")?;

        Ok(())
    }
}

fn find_position(document: &StoreDocument, id: &str) -> Result<usize, AppError> {
    document
        .submissions
        .iter()
        .position(|record| record.id() == Some(id))
        .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))
}

/// UUID v4, redrawn if it somehow collides with a stored identifier.
fn generate_id(document: &StoreDocument) -> String {
    loop {
        let candidate = Uuid::new_v4().to_string();
        if !document.submissions.iter().any(|record| record.id() == Some(candidate.as_str())) {
            return candidate;
        }
    }
}

/// Current time at millisecond precision, nudged forward if the clock has not
/// moved past `previous`.
fn next_update_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(3);
    match previous {
        Some(prev) if now <= prev => prev.trunc_subsecs(3) + Duration::milliseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;
    use serde_json::json;

    fn store() -> ClientStore {
        ClientStore::new(Arc::new(MemoryBackend::new()))
    }

    fn intake(first: &str) -> ClientRecord {
        let fields = json!({
            "firstName": first,
            "lastName": "Nguyen",
            "age": "29",
            "felony_bool": "false"
        });
        ClientRecord::from_fields(fields.as_object().cloned().unwrap())
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = store();
        let stored = store.insert(intake("Mina")).await.unwrap();

        let id = stored.id().unwrap().to_string();
        assert!(!id.is_empty());
        assert_eq!(stored.last_update(), None);

        let fetched = store.get_by_id(&id).await.unwrap();
        assert_eq!(fetched, stored);

        let mut without_id = fetched.fields().clone();
        without_id.remove("id");
        assert_eq!(&without_id, intake("Mina").fields());
    }

    #[tokio::test]
    async fn test_insert_keeps_values_as_sent() {
        let store = store();
        let fields = patch(json!({
            "firstName": "Mina",
            "work_experience": "2.5",
            "age": "thirty",
            "felony_bool": "yes"
        }));

        let stored = store
            .insert(ClientRecord::from_fields(fields.clone()))
            .await
            .unwrap();

        for (key, value) in &fields {
            assert_eq!(stored.get(key), Some(value));
        }
    }

    #[tokio::test]
    async fn test_insert_replaces_client_id_and_timestamp() {
        let store = store();
        let record = ClientRecord::from(patch(json!({
            "id": "fixed",
            "last_update": "2024-01-01T00:00:00.000Z"
        })));

        let stored = store.insert(record).await.unwrap();
        assert_ne!(stored.id(), Some("fixed"));
        assert!(stored.get("last_update").is_none());
    }

    #[tokio::test]
    async fn test_insert_assigns_unique_ids() {
        let store = store();
        let a = store.insert(intake("A")).await.unwrap();
        let b = store.insert(intake("B")).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_by_first_name() {
        let store = store();
        store.insert(intake("Cathy")).await.unwrap();
        store.insert(intake("cathy")).await.unwrap();
        store.insert(intake("Cath")).await.unwrap();
        store.insert(ClientRecord::default()).await.unwrap();

        assert_eq!(store.find_by_first_name("CATHY").await.unwrap().len(), 2);
        assert!(store.find_by_first_name("Zed").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let err = store().get_by_id("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_partial_merges_and_stamps() {
        let store = store();
        let stored = store.insert(intake("Mina")).await.unwrap();
        let id = stored.id().unwrap().to_string();

        let first = store
            .update_partial(&id, &patch(json!({"housing": "Homeowner", "id": "hijack"})))
            .await
            .unwrap();

        assert_eq!(first.id(), Some(id.as_str()));
        assert_eq!(first.get("housing"), Some(&json!("Homeowner")));
        assert_eq!(first.first_name(), Some("Mina"));
        let first_stamp = first.last_update().unwrap();

        let second = store
            .update_partial(&id, &patch(json!({"age": 30})))
            .await
            .unwrap();
        assert!(second.last_update().unwrap() > first_stamp);

        let fetched = store.get_by_id(&id).await.unwrap();
        assert_eq!(fetched.get("age"), Some(&json!(30)));
        assert_eq!(fetched, second);
    }

    #[tokio::test]
    async fn test_update_accepts_any_value_shape() {
        let store = store();
        let stored = store.insert(intake("Mina")).await.unwrap();
        let id = stored.id().unwrap().to_string();

        let updated = store
            .update_partial(&id, &patch(json!({"age": {"years": 30}, "felony_bool": "yes"})))
            .await
            .unwrap();

        assert_eq!(updated.get("age"), Some(&json!({"years": 30})));
        assert_eq!(updated.get("felony_bool"), Some(&json!("yes")));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let err = store().update_partial("nope", &Map::new()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store = store();
        let stored = store.insert(intake("Mina")).await.unwrap();
        let id = stored.id().unwrap().to_string();

        store.delete_by_id(&id).await.unwrap();

        assert!(matches!(
            store.get_by_id(&id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            store.delete_by_id(&id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_off_type_record_does_not_block_others() {
        let backend = Arc::new(MemoryBackend::with_document(StoreDocument {
            submissions: vec![
                ClientRecord::from(patch(json!({"id": "good", "firstName": "Ana", "age": 40}))),
                ClientRecord::from(patch(json!({"id": "bad1", "felony_bool": "yes", "age": "old"}))),
            ],
            other: Map::new(),
        }));
        let store = ClientStore::new(backend);

        assert_eq!(store.list_all().await.unwrap().len(), 2);
        assert_eq!(store.get_by_id("good").await.unwrap().first_name(), Some("Ana"));
        store
            .update_partial("bad1", &patch(json!({"housing": "Shelter"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_writes_preserve_other_document_keys() {
        let backend = Arc::new(MemoryBackend::with_document(StoreDocument {
            submissions: Vec::new(),
            other: patch(json!({"meta": {"owner": "intake"}})),
        }));
        let store = ClientStore::new(backend.clone());

        store.insert(intake("Mina")).await.unwrap();

        let document = backend.load().await.unwrap();
        assert_eq!(document.other.get("meta"), Some(&json!({"owner": "intake"})));
    }

    #[test]
    fn test_timestamp_moves_past_future_previous() {
        let future = Utc::now() + Duration::hours(1);
        assert!(next_update_timestamp(Some(future)) > future);
    }

    #[test]
    fn test_timestamp_is_whole_milliseconds() {
        let stamp = next_update_timestamp(None);
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
