use case_intake_api::client_storage::ClientStore;
use case_intake_api::db::{DocumentBackend, JsonFileBackend};
use case_intake_api::errors::AppError;
use case_intake_api::models::ClientRecord;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn file_store(path: &std::path::Path) -> ClientStore {
    ClientStore::new(Arc::new(JsonFileBackend::new(path)))
}

fn fields(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Records written by one store instance are visible to a fresh one on the same file.
#[tokio::test]
async fn records_survive_reopening() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("db.json");
    JsonFileBackend::open(&path).await?;

    let stored = file_store(&path)
        .insert(ClientRecord::from_fields(fields(
            json!({"firstName": "Priya", "caregiver_bool": "true"}),
        )))
        .await?;

    let reopened = file_store(&path);
    let fetched = reopened.get_by_id(stored.id().unwrap_or_default()).await?;
    assert_eq!(fetched, stored);
    assert_eq!(reopened.find_by_first_name("priya").await?.len(), 1);

    Ok(())
}

/// Documents written by the previous service (4-character ids, string numbers,
/// empty timestamps) still load and can be edited.
#[tokio::test]
async fn legacy_document_loads_and_updates() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("db.json");
    let legacy = json!({
        "form-submissions": [
            {
                "id": "k3x9",
                "firstName": "Cathy",
                "lastName": "Ross",
                "age": "44",
                "work_experience": "6",
                "felony_bool": "false",
                "last_update": ""
            },
            {
                "id": "a0b1",
                "firstName": "Omar",
                "age": 52,
                "last_update": "2024-10-30T18:22:41.512Z"
            }
        ]
    });
    std::fs::write(&path, serde_json::to_string_pretty(&legacy)?)?;

    let store = file_store(&path);
    let cathy = store.get_by_id("k3x9").await?;
    assert_eq!(cathy.count("age"), Some(44));
    assert_eq!(cathy.count("work_experience"), Some(6));
    assert_eq!(cathy.last_update(), None);

    let updated = store
        .update_partial("a0b1", &fields(json!({"caregiver_bool": "true"})))
        .await?;
    assert!(updated.last_update().is_some());
    assert_eq!(updated.get("caregiver_bool"), Some(&json!("true")));

    // Untouched records are rewritten exactly as they were stored.
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(raw["form-submissions"][0], legacy["form-submissions"][0]);
    assert_eq!(raw["form-submissions"][1]["caregiver_bool"], "true");

    Ok(())
}

#[tokio::test]
async fn delete_removes_only_target() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("db.json");
    JsonFileBackend::open(&path).await?;
    let store = file_store(&path);

    let keep = store.insert(ClientRecord::default()).await?;
    let drop = store.insert(ClientRecord::default()).await?;

    let drop_id = drop.id().unwrap_or_default();
    store.delete_by_id(drop_id).await?;

    let remaining = store.list_all().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), keep.id());
    assert!(matches!(
        store.get_by_id(drop_id).await,
        Err(AppError::NotFound(_))
    ));

    Ok(())
}

/// Concurrent inserts through one store are serialised, so none is lost.
#[tokio::test]
async fn concurrent_inserts_are_not_lost() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("db.json");
    JsonFileBackend::open(&path).await?;
    let store = Arc::new(file_store(&path));

    let mut tasks = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .insert(ClientRecord::from_fields(fields(
                    json!({"firstName": format!("client-{}", i)}),
                )))
                .await
        }));
    }
    for task in tasks {
        task.await??;
    }

    assert_eq!(store.count().await?, 10);
    let document = JsonFileBackend::new(&path).load().await?;
    assert_eq!(document.submissions.len(), 10);

    Ok(())
}
