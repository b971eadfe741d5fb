//! Fetch, create, update and delete against the remote CRUD service.
//!
//! Nothing here touches a [`RecordCache`](crate::record::RecordCache): results are returned
//! to the caller, which reconciles them on success only. A failed call therefore never
//! leaves a phantom or missing row behind.

use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::config::ClientConfig;
use crate::error::{ConfigurationError, SyncError, TransportError};
use crate::record::Record;
use crate::spec::ModelSpec;
use crate::transport::{Method, Transport};
use crate::value::Value;

/// Create vs update, decided once from the presence of a data key value.
#[derive(Clone, Debug, PartialEq)]
pub enum UpsertRequest {
    Create(Record),
    Update(Value, Record),
}

impl UpsertRequest {
    pub fn for_record(spec: &ModelSpec, mut record: Record) -> Result<Self, ConfigurationError> {
        let key_field = spec.data_key_of()?;
        Ok(match record.key(key_field).cloned() {
            Some(key) => UpsertRequest::Update(key, record),
            None => {
                record.remove(key_field);
                UpsertRequest::Create(record)
            }
        })
    }

    pub fn method(&self) -> Method {
        match self {
            UpsertRequest::Create(_) => Method::Post,
            UpsertRequest::Update(_, _) => Method::Put,
        }
    }

    pub fn record(&self) -> &Record {
        match self {
            UpsertRequest::Create(r) | UpsertRequest::Update(_, r) => r,
        }
    }
}

/// Report of the batch import job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub starship_import_count: u64,
    #[serde(default)]
    pub film_import_count: u64,
    #[serde(default)]
    pub planet_import_count: u64,
    #[serde(default)]
    pub people_import_count: u64,
    #[serde(default)]
    pub species_import_count: u64,
    #[serde(default)]
    pub vehicle_import_count: u64,
}

impl ImportResult {
    pub fn is_complete(&self) -> bool {
        self.status == "complete"
    }

    pub fn counts(&self) -> [(&'static str, u64); 6] {
        [
            ("Starships", self.starship_import_count),
            ("Films", self.film_import_count),
            ("Planets", self.planet_import_count),
            ("People", self.people_import_count),
            ("Species", self.species_import_count),
            ("Vehicles", self.vehicle_import_count),
        ]
    }
}

pub struct RecordSyncController<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> RecordSyncController<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        RecordSyncController { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `{resource}` derived from the data key field name.
    pub fn resource_path(&self, spec: &ModelSpec) -> Result<String, ConfigurationError> {
        Ok(self.config.resource_for(spec.data_key_of()?))
    }

    /// Every record of the resource, date fields converted on the way in.
    pub async fn fetch_all(&self, spec: &ModelSpec) -> Result<Vec<Record>, SyncError> {
        let resource = self.resource_path(spec)?;
        let result: Result<Vec<Record>, SyncError> = async {
            let json = self.transport.get_json(&resource).await?;
            let Json::Array(items) = json else {
                return Err(SyncError::from(TransportError::Decode(format!(
                    "expected an array of records from {resource}"
                ))));
            };
            let records = items
                .iter()
                .map(|item| Record::from_json(spec, item))
                .collect::<Result<Vec<_>, _>>()?;
            debug!("fetched {} {resource} record(s)", records.len());
            Ok(records)
        }
        .await;
        result.inspect_err(|e| error!("fetching {resource}: {e}"))
    }

    /// Returns the record as the server stored it.
    pub async fn upsert(
        &self,
        spec: &ModelSpec,
        request: UpsertRequest,
    ) -> Result<Record, SyncError> {
        let resource = self.resource_path(spec)?;
        let method = request.method();
        let result: Result<Record, SyncError> = async {
            let body = request.record().to_json();
            let reply = self.transport.send_json(method, &resource, &body).await?;
            match (reply, request) {
                (Some(json), _) => Ok(Record::from_json(spec, &json)?),
                (None, UpsertRequest::Update(key, record)) => {
                    debug!("{resource} {key} updated without a body, keeping submitted record");
                    Ok(record)
                }
                (None, UpsertRequest::Create(_)) => Err(SyncError::from(TransportError::Decode(
                    format!("create on {resource} returned no record"),
                ))),
            }
        }
        .await;
        result.inspect_err(|e| error!("{} {resource}: {e}", method.as_str()))
    }

    pub async fn save(&self, spec: &ModelSpec, record: Record) -> Result<Record, SyncError> {
        let request = UpsertRequest::for_record(spec, record)?;
        self.upsert(spec, request).await
    }

    pub async fn remove(&self, spec: &ModelSpec, id: &str) -> Result<(), SyncError> {
        let resource = self.resource_path(spec)?;
        let path = format!("{resource}/{id}");
        self.transport
            .delete(&path)
            .await
            .map_err(SyncError::from)
            .inspect_err(|e| error!("deleting {path}: {e}"))
    }

    /// Starts the batch import, the caller reloads afterwards.
    pub async fn trigger_import(&self) -> Result<ImportResult, SyncError> {
        let path = self.config.import_path.clone();
        let result: Result<ImportResult, SyncError> = async {
            let json = self.transport.get_json(&path).await?;
            let report =
                serde_json::from_value::<ImportResult>(json).map_err(TransportError::from)?;
            debug!("import finished: {} ({})", report.status, report.message);
            Ok(report)
        }
        .await;
        result.inspect_err(|e| error!("import: {e}"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::RecordCache;
    use crate::spec::FieldSpec;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub calls: Mutex<Vec<(Method, String, Option<Json>)>>,
        pub get_reply: Option<Json>,
        pub send_reply: Option<Json>,
        pub fail_status: Option<u16>,
    }

    impl RecordingTransport {
        fn fail(&self, method: Method, path: &str) -> Result<(), TransportError> {
            match self.fail_status {
                Some(status) => Err(TransportError::Status {
                    method: method.as_str(),
                    path: path.to_string(),
                    status,
                }),
                None => Ok(()),
            }
        }

        pub fn calls(&self) -> Vec<(Method, String, Option<Json>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get_json(&self, path: &str) -> Result<Json, TransportError> {
            self.calls.lock().unwrap().push((Method::Get, path.to_string(), None));
            self.fail(Method::Get, path)?;
            Ok(self.get_reply.clone().unwrap_or(json!([])))
        }

        async fn send_json(
            &self,
            method: Method,
            path: &str,
            body: &Json,
        ) -> Result<Option<Json>, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((method, path.to_string(), Some(body.clone())));
            self.fail(method, path)?;
            Ok(self.send_reply.clone())
        }

        async fn delete(&self, path: &str) -> Result<(), TransportError> {
            self.calls.lock().unwrap().push((Method::Delete, path.to_string(), None));
            self.fail(Method::Delete, path)
        }
    }

    fn starship() -> ModelSpec {
        ModelSpec::new([
            ("starship_id", FieldSpec::id().data_key()),
            ("name", FieldSpec::text()),
            ("length", FieldSpec::number().decimals(2)),
            ("created", FieldSpec::date()),
        ])
    }

    fn controller(transport: RecordingTransport) -> RecordSyncController<RecordingTransport> {
        RecordSyncController::new(transport, ClientConfig::new("http://test/api"))
    }

    #[test]
    fn key_presence_decides_create_or_update() {
        let spec = starship();
        let update = UpsertRequest::for_record(
            &spec,
            Record::from_iter([("starship_id", Value::from(5)), ("name", Value::from("X"))]),
        )
        .unwrap();
        assert_eq!(update.method(), Method::Put);

        let create = UpsertRequest::for_record(
            &spec,
            Record::from_iter([("starship_id", Value::from("")), ("name", Value::from("Y"))]),
        )
        .unwrap();
        assert_eq!(create.method(), Method::Post);
        assert_eq!(create.record().get("starship_id"), None);
    }

    #[tokio::test]
    async fn upsert_uses_put_with_key_and_post_without() {
        let sync = controller(RecordingTransport {
            send_reply: Some(json!({"starship_id": 5, "name": "X"})),
            ..Default::default()
        });
        let spec = starship();
        sync.save(
            &spec,
            Record::from_iter([("starship_id", Value::from(5)), ("name", Value::from("X"))]),
        )
        .await
        .unwrap();
        sync.save(&spec, Record::from_iter([("name", Value::from("Y"))]))
            .await
            .unwrap();

        let calls = sync.transport().calls();
        assert_eq!(calls[0].0, Method::Put);
        assert_eq!(calls[0].1, "starship");
        assert_eq!(calls[1].0, Method::Post);
        assert_eq!(calls[1].1, "starship");
        assert_eq!(calls[1].2, Some(json!({"name": "Y"})));
    }

    #[tokio::test]
    async fn update_without_body_echoes_submitted_record() {
        let sync = controller(RecordingTransport::default());
        let record =
            Record::from_iter([("starship_id", Value::from(5)), ("name", Value::from("X"))]);
        let saved = sync.save(&starship(), record.clone()).await.unwrap();
        assert_eq!(saved, record);
    }

    #[tokio::test]
    async fn create_without_body_is_an_error() {
        let sync = controller(RecordingTransport::default());
        let result = sync
            .save(&starship(), Record::from_iter([("name", Value::from("Y"))]))
            .await;
        assert!(matches!(result, Err(SyncError::Transport(TransportError::Decode(_)))));
    }

    #[tokio::test]
    async fn remove_deletes_by_id_and_cache_drops_one_record() {
        let sync = controller(RecordingTransport::default());
        let spec = starship();
        let mut cache = RecordCache::new();
        cache.replace_all([
            Record::from_iter([("starship_id", Value::from(4))]),
            Record::from_iter([("starship_id", Value::from(5))]),
        ]);

        sync.remove(&spec, "5").await.unwrap();
        cache.reconcile_remove("starship_id", "5");

        assert_eq!(sync.transport().calls()[0], (Method::Delete, "starship/5".to_string(), None));
        assert_eq!(cache.len(), 1);
        assert!(cache.position_of_key("starship_id", &Value::from(4)).is_some());
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_alone() {
        let sync = controller(RecordingTransport {
            fail_status: Some(500),
            ..Default::default()
        });
        let mut cache = RecordCache::new();
        cache.replace_all([Record::from_iter([("starship_id", Value::from(5))])]);

        if sync.remove(&starship(), "5").await.is_ok() {
            cache.reconcile_remove("starship_id", "5");
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn fetch_all_converts_dates() {
        let sync = controller(RecordingTransport {
            get_reply: Some(json!([{"starship_id": 1, "created": "2024-01-01T00:00:00Z"}])),
            ..Default::default()
        });
        let records = sync.fetch_all(&starship()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0].get("created"), Some(Value::Date(_))));
        assert_eq!(sync.transport().calls()[0].1, "starship");
    }

    #[tokio::test]
    async fn fetch_all_rejects_non_array() {
        let sync = controller(RecordingTransport {
            get_reply: Some(json!({"detail": "nope"})),
            ..Default::default()
        });
        assert!(sync.fetch_all(&starship()).await.is_err());
    }

    #[tokio::test]
    async fn fetch_all_surfaces_status_errors() {
        let sync = controller(RecordingTransport {
            fail_status: Some(401),
            ..Default::default()
        });
        let err = sync.fetch_all(&starship()).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Transport(TransportError::Status { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn import_report_is_decoded() {
        let sync = controller(RecordingTransport {
            get_reply: Some(json!({
                "status": "complete",
                "message": "Imported",
                "starship_import_count": 36,
                "film_import_count": 6
            })),
            ..Default::default()
        });
        let report = sync.trigger_import().await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.starship_import_count, 36);
        assert_eq!(report.vehicle_import_count, 0);
        assert_eq!(sync.transport().calls()[0].1, "import/all");
    }
}
