//! Record/replay interceptor for provider calls
//!
//! [`ApiRecorder`] sits between a caller and a provider SDK call. The live
//! call is passed in as a closure; depending on the mode it is invoked,
//! skipped in favor of a stored recording, or invoked and its outcome
//! stored. Failures are recorded with enough structure to raise the same
//! error class on replay.

use std::future::Future;

use dashmap::DashMap;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use serde_json::Value;
use tapedeck_config::{FingerprintConfig, RecordingConfig, RecordingMode};
use tapedeck_exceptions::Fault;
use tapedeck_providers::ProviderRegistry;

use crate::codec::serialize_exception;
use crate::error::ReplayError;
use crate::fingerprint::fingerprint;
use crate::record::{ApiRequest, Recording, ResponseRecord};
use crate::store::ResponseStorage;

/// Stream of response chunks
pub type ChunkStream = BoxStream<'static, Result<Value, Fault>>;

const NORMALIZED_ID_PREFIX: &str = "rec-";
const NORMALIZED_ID_LEN: usize = 12;

/// Intercepts provider calls according to a [`RecordingMode`]
#[derive(Debug)]
pub struct ApiRecorder {
    mode: RecordingMode,
    storage: ResponseStorage,
    test_id: Option<String>,
    fingerprint: FingerprintConfig,
    registry: &'static ProviderRegistry,
    /// Provider-issued IDs seen this session, mapped to their stored form
    id_map: DashMap<String, String>,
}

impl ApiRecorder {
    /// Recorder using the process-wide provider registry
    pub fn new(config: &RecordingConfig) -> Self {
        Self {
            mode: config.mode,
            storage: ResponseStorage::new(config.storage_dir.clone(), config.test_id.as_deref()),
            test_id: config.test_id.clone(),
            fingerprint: config.fingerprint.clone(),
            registry: tapedeck_providers::global(),
            id_map: DashMap::new(),
        }
    }

    /// Use `registry` to classify and rebuild provider errors
    #[must_use]
    pub fn with_registry(mut self, registry: &'static ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub const fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub const fn storage(&self) -> &ResponseStorage {
        &self.storage
    }

    /// Fingerprint of `request` as this recorder stores it
    ///
    /// Provider IDs seen earlier in a recording session are replaced by
    /// their stored form first, so recorded and replayed runs agree.
    pub fn fingerprint(&self, request: &ApiRequest) -> String {
        let url = self.substitute_ids(&request.url);
        let body = self.substitute_ids_in(&request.body);
        fingerprint(&request.method, &url, &request.headers, &body, &self.fingerprint)
    }

    /// Run a provider call under the recorder
    ///
    /// # Errors
    ///
    /// Returns the live or replayed fault, `RecordingNotFound` when
    /// replaying a request that was never recorded, or a storage error
    pub async fn call<F, Fut>(&self, request: &ApiRequest, live: F) -> Result<Value, ReplayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Fault>>,
    {
        if self.mode == RecordingMode::Live {
            return live().await.map_err(ReplayError::from);
        }

        let hash = self.fingerprint(request);
        if let Some(recording) = self.lookup(&hash, request).await? {
            return self.replay_response(recording.response);
        }

        let outcome = live().await;
        let mut ids = Vec::new();
        let response = match &outcome {
            Ok(body) => ResponseRecord::body(self.normalize_ids(body, &hash, &mut ids)),
            Err(fault) => ResponseRecord::exception(serialize_exception(fault, self.registry), false),
        };
        self.store(&hash, request, response, ids).await?;

        outcome.map_err(ReplayError::from)
    }

    /// Run a streaming provider call under the recorder
    ///
    /// Recording drains the live stream before returning it, so chunks are
    /// stored in order. A stream that fails partway is recorded as that
    /// failure.
    ///
    /// # Errors
    ///
    /// Same as [`ApiRecorder::call`]
    pub async fn call_stream<F, Fut>(&self, request: &ApiRequest, live: F) -> Result<ChunkStream, ReplayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ChunkStream, Fault>>,
    {
        if self.mode == RecordingMode::Live {
            return live().await.map_err(ReplayError::from);
        }

        let hash = self.fingerprint(request);
        if let Some(recording) = self.lookup(&hash, request).await? {
            let chunks = match self.replay_response(recording.response)? {
                Value::Array(chunks) => chunks,
                single => vec![single],
            };
            return Ok(stream::iter(chunks.into_iter().map(Ok)).boxed());
        }

        let mut live_stream = match live().await {
            Ok(live_stream) => live_stream,
            Err(fault) => return Err(self.record_stream_failure(&hash, request, fault).await),
        };

        let mut chunks = Vec::new();
        while let Some(chunk) = live_stream.next().await {
            match chunk {
                Ok(chunk) => chunks.push(chunk),
                Err(fault) => return Err(self.record_stream_failure(&hash, request, fault).await),
            }
        }

        let mut ids = Vec::new();
        let stored = chunks
            .iter()
            .map(|chunk| self.normalize_ids(chunk, &hash, &mut ids))
            .collect();
        self.store(&hash, request, ResponseRecord::stream(stored), ids).await?;

        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    /// Find a stored recording when the mode replays
    async fn lookup(&self, hash: &str, request: &ApiRequest) -> Result<Option<Recording>, ReplayError> {
        if !matches!(self.mode, RecordingMode::Replay | RecordingMode::RecordIfMissing) {
            return Ok(None);
        }

        if let Some(recording) = self.storage.find_recording(hash).await? {
            return Ok(Some(recording));
        }

        if self.mode == RecordingMode::Replay {
            return Err(ReplayError::RecordingNotFound {
                hash: hash.to_owned(),
                endpoint: request.endpoint(),
            });
        }
        Ok(None)
    }

    fn replay_response(&self, response: ResponseRecord) -> Result<Value, ReplayError> {
        match response.fault(self.registry) {
            Some(fault) => Err(fault.into()),
            None => Ok(response.body.unwrap_or(Value::Null)),
        }
    }

    async fn record_stream_failure(&self, hash: &str, request: &ApiRequest, fault: Fault) -> ReplayError {
        let response = ResponseRecord::exception(serialize_exception(&fault, self.registry), true);
        match self.store(hash, request, response, Vec::new()).await {
            Ok(()) => fault.into(),
            Err(err) => err,
        }
    }

    async fn store(
        &self,
        hash: &str,
        request: &ApiRequest,
        response: ResponseRecord,
        ids: Vec<(String, String)>,
    ) -> Result<(), ReplayError> {
        let recording = Recording {
            test_id: self.test_id.clone(),
            request: request.to_record(),
            response,
            id_normalization_mapping: ids.into_iter().collect(),
        };
        self.storage.store_recording(hash, &recording).await?;
        Ok(())
    }

    /// Stored form of a response body
    ///
    /// A top-level string `id` becomes `rec-{hash prefix}` and `created`
    /// becomes `0`. Each replaced ID is remembered for later fingerprints.
    fn normalize_ids(&self, body: &Value, hash: &str, ids: &mut Vec<(String, String)>) -> Value {
        let Value::Object(object) = body else {
            return body.clone();
        };

        let mut normalized = object.clone();
        if let Some(Value::String(original)) = object.get("id") {
            let stable = format!(
                "{NORMALIZED_ID_PREFIX}{}",
                hash.get(..NORMALIZED_ID_LEN).unwrap_or(hash)
            );
            if original != &stable {
                self.id_map.insert(original.clone(), stable.clone());
                ids.push((original.clone(), stable.clone()));
            }
            normalized.insert("id".to_owned(), Value::String(stable));
        }
        if normalized.get("created").is_some_and(Value::is_number) {
            normalized.insert("created".to_owned(), Value::from(0));
        }

        Value::Object(normalized)
    }

    /// Replace known IDs in `text`, longest first
    ///
    /// An ID that is a prefix of another must not claim part of the longer
    /// one, whatever order the map yields them in.
    fn substitute_ids(&self, text: &str) -> String {
        let mut ids: Vec<(String, String)> = self
            .id_map
            .iter()
            .filter(|entry| text.contains(entry.key().as_str()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        ids.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        ids.iter()
            .fold(text.to_owned(), |text, (original, stable)| text.replace(original.as_str(), stable))
    }

    fn substitute_ids_in(&self, value: &Value) -> Value {
        if self.id_map.is_empty() {
            return value.clone();
        }

        match value {
            Value::String(text) => Value::String(self.substitute_ids(text)),
            Value::Array(items) => items.iter().map(|item| self.substitute_ids_in(item)).collect(),
            Value::Object(object) => Value::Object(
                object
                    .iter()
                    .map(|(key, item)| (key.clone(), self.substitute_ids_in(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::LazyLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tapedeck_core::builtins::VALUE_ERROR;
    use tapedeck_providers::ollama::ResponseError;
    use tapedeck_providers::openai::{self, ApiStatusError};

    use super::*;

    static REGISTRY: LazyLock<ProviderRegistry> = LazyLock::new(|| ProviderRegistry::builtin().unwrap());

    const URL: &str = "http://localhost:11434/v1/chat/completions";

    fn recorder(mode: RecordingMode, dir: &Path) -> ApiRecorder {
        let config = RecordingConfig {
            mode,
            storage_dir: dir.to_owned(),
            ..RecordingConfig::default()
        };
        ApiRecorder::new(&config).with_registry(&REGISTRY)
    }

    fn chat(content: &str) -> ApiRequest {
        ApiRequest::post(
            URL,
            json!({"model": "llama3.2:3b", "messages": [{"role": "user", "content": content}], "temperature": 0.7}),
        )
    }

    fn completion() -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_234_567_890,
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello! I'm doing well, thank you for asking."}}]
        })
    }

    #[tokio::test]
    async fn live_mode_passes_through_without_storing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(RecordingMode::Live, dir.path());

        let body = recorder.call(&chat("Hello"), || async { Ok(completion()) }).await.unwrap();
        assert_eq!(body["id"], "chatcmpl-123");
        assert!(!dir.path().join("recordings").exists());
    }

    #[tokio::test]
    async fn recorded_response_replays_without_live_call() {
        let dir = tempfile::tempdir().unwrap();
        let request = chat("Hello, how are you?");

        let recorded = recorder(RecordingMode::Record, dir.path())
            .call(&request, || async { Ok(completion()) })
            .await
            .unwrap();
        assert_eq!(recorded["id"], "chatcmpl-123");

        let calls = AtomicUsize::new(0);
        let replayed = recorder(RecordingMode::Replay, dir.path())
            .call(&request, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            replayed["choices"][0]["message"]["content"],
            "Hello! I'm doing well, thank you for asking."
        );
        assert!(replayed["id"].as_str().unwrap().starts_with("rec-"));
        assert_eq!(replayed["created"], 0);
    }

    #[tokio::test]
    async fn replay_of_unrecorded_request_fails() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(RecordingMode::Replay, dir.path());
        let request = chat("This was never recorded");

        let err = recorder
            .call(&request, || async { Ok(Value::Null) })
            .await
            .unwrap_err();

        let expected = format!("Recording not found for request hash: {}", recorder.fingerprint(&request));
        assert_eq!(err.to_string(), expected);
        assert_eq!(Fault::from(err).type_name(), "RuntimeError");
    }

    #[tokio::test]
    async fn openai_error_is_recorded_and_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let request = ApiRequest::post(
            URL,
            json!({"model": "test-model", "messages": [{"role": "user", "content": "hi"}]}),
        );
        let body = json!({"error": {"code": "not_found"}});

        let err = recorder(RecordingMode::Record, dir.path())
            .call(&request, || async {
                Err(Fault::provider(ApiStatusError::from_recorded(
                    404,
                    Some(json!({"error": {"code": "not_found"}})),
                    "Model not found",
                )))
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Model not found");

        let calls = AtomicUsize::new(0);
        let err = recorder(RecordingMode::Replay, dir.path())
            .call(&request, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let fault = err.as_fault().unwrap();
        let provider = fault.as_provider().unwrap();
        assert!(provider.is::<ApiStatusError>());
        assert!(provider.error_type().same_class(&openai::NOT_FOUND_ERROR));
        assert_eq!(provider.status_code(), 404);
        assert_eq!(provider.body(), Some(&body));
        assert_eq!(fault.to_string(), "Model not found");
    }

    #[tokio::test]
    async fn ollama_error_replays_with_clean_message() {
        let dir = tempfile::tempdir().unwrap();
        let request = chat("ollama");

        let _ = recorder(RecordingMode::Record, dir.path())
            .call(&request, || async {
                Err(Fault::provider(ResponseError::new("model 'x' not found", 404)))
            })
            .await;

        let err = recorder(RecordingMode::Replay, dir.path())
            .call(&request, || async { Ok(Value::Null) })
            .await
            .unwrap_err();
        let provider = err.as_fault().unwrap().as_provider().unwrap();
        let replayed = provider.downcast_ref::<ResponseError>().unwrap();
        assert_eq!(replayed.error, "model 'x' not found");
        assert_eq!(replayed.status_code, 404);
    }

    #[tokio::test]
    async fn legacy_exception_replays_as_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(RecordingMode::Replay, dir.path());
        let request = ApiRequest::post(
            URL,
            json!({"model": "llama3.2:3b", "messages": [{"role": "user", "content": "Legacy error test"}]}),
        );
        let legacy = json!({
            "test_id": null,
            "request": {"method": "POST", "url": URL, "endpoint": "/v1/chat/completions", "body": request.body},
            "response": {"body": null, "is_streaming": false, "is_exception": true, "exception_message": "Legacy formatted error"},
            "id_normalization_mapping": {}
        });
        let recordings = dir.path().join("recordings");
        std::fs::create_dir_all(&recordings).unwrap();
        std::fs::write(
            recordings.join(format!("{}.json", recorder.fingerprint(&request))),
            serde_json::to_vec_pretty(&legacy).unwrap(),
        )
        .unwrap();

        let err = recorder
            .call(&request, || async { Ok(Value::Null) })
            .await
            .unwrap_err();
        let fault = err.as_fault().unwrap();
        assert_eq!(fault.type_name(), "Exception");
        assert_eq!(fault.to_string(), "Legacy formatted error");
    }

    #[tokio::test]
    async fn record_if_missing_records_once() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(RecordingMode::RecordIfMissing, dir.path());
        let request = chat("once");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let body = recorder
                .call(&request, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"content": "hi"}))
                })
                .await
                .unwrap();
            assert_eq!(body["content"], "hi");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn builtin_failure_replays_its_class() {
        let dir = tempfile::tempdir().unwrap();
        let request = chat("bad");

        let _ = recorder(RecordingMode::Record, dir.path())
            .call(&request, || async { Err(Fault::raised(&VALUE_ERROR, "temperature too high")) })
            .await;

        let err = recorder(RecordingMode::Replay, dir.path())
            .call(&request, || async { Ok(Value::Null) })
            .await
            .unwrap_err();
        let fault = err.as_fault().unwrap();
        assert_eq!(fault.type_name(), "ValueError");
        assert_eq!(fault.to_string(), "temperature too high");
    }

    #[tokio::test]
    async fn streamed_chunks_replay_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let request = chat("stream");
        let chunks = vec![
            json!({"id": "chatcmpl-9", "choices": [{"delta": {"content": "Hel"}}]}),
            json!({"id": "chatcmpl-9", "choices": [{"delta": {"content": "lo"}}]}),
        ];

        let live_chunks = chunks.clone();
        let recorded: Vec<_> = recorder(RecordingMode::Record, dir.path())
            .call_stream(&request, || async move {
                Ok(stream::iter(live_chunks.into_iter().map(Ok)).boxed())
            })
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].as_ref().unwrap()["id"], "chatcmpl-9");

        let replayed: Vec<Value> = recorder(RecordingMode::Replay, dir.path())
            .call_stream(&request, || async { Err(Fault::exception("unreachable")) })
            .await
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0]["choices"][0]["delta"]["content"], "Hel");
        assert_eq!(replayed[1]["choices"][0]["delta"]["content"], "lo");
        assert_eq!(replayed[0]["id"], replayed[1]["id"]);
    }

    #[tokio::test]
    async fn failed_stream_is_recorded_as_streaming_exception() {
        let dir = tempfile::tempdir().unwrap();
        let request = chat("broken stream");

        let recorder = recorder(RecordingMode::Record, dir.path());
        let result = recorder
            .call_stream(&request, || async {
                let items = vec![Ok(json!({"delta": "a"})), Err(Fault::exception("connection dropped"))];
                Ok(stream::iter(items).boxed())
            })
            .await;
        assert!(result.is_err());

        let stored = recorder
            .storage()
            .find_recording(&recorder.fingerprint(&request))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.response.is_exception);
        assert!(stored.response.is_streaming);
    }

    #[tokio::test]
    async fn quoted_ids_fingerprint_like_their_stored_form() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(RecordingMode::Record, dir.path());

        let first = chat("create");
        recorder
            .call(&first, || async { Ok(json!({"id": "resp_live_42", "created": 99})) })
            .await
            .unwrap();
        let stable = format!("rec-{}", &recorder.fingerprint(&first)[..12]);

        let with_live_id = ApiRequest::post(URL, json!({"previous_response_id": "resp_live_42"}));
        let with_stable_id = ApiRequest::post(URL, json!({"previous_response_id": stable}));
        assert_eq!(recorder.fingerprint(&with_live_id), recorder.fingerprint(&with_stable_id));

        let stored = recorder
            .storage()
            .find_recording(&recorder.fingerprint(&first))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id_normalization_mapping["resp_live_42"], stable);
        assert_eq!(stored.response.body.unwrap()["created"], 0);
    }

    #[test]
    fn overlapping_ids_substitute_the_longest_match() {
        let dir = tempfile::tempdir().unwrap();
        for _ in 0..64 {
            let recorder = recorder(RecordingMode::Record, dir.path());
            recorder.id_map.insert("chatcmpl-1".to_owned(), "rec-aaaa".to_owned());
            recorder.id_map.insert("chatcmpl-12".to_owned(), "rec-bbbb".to_owned());

            assert_eq!(recorder.substitute_ids("previous id chatcmpl-12"), "previous id rec-bbbb");
            assert_eq!(recorder.substitute_ids("chatcmpl-1 then chatcmpl-12"), "rec-aaaa then rec-bbbb");
        }
    }

    #[tokio::test]
    async fn fingerprints_are_stable_after_overlapping_ids_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder(RecordingMode::Record, dir.path());

        let first = chat("first");
        let second = chat("second");
        recorder.call(&first, || async { Ok(json!({"id": "chatcmpl-1"})) }).await.unwrap();
        recorder.call(&second, || async { Ok(json!({"id": "chatcmpl-12"})) }).await.unwrap();
        let stable = format!("rec-{}", &recorder.fingerprint(&second)[..12]);

        let follow_up = ApiRequest::post(URL, json!({"previous_response_id": "chatcmpl-12"}));
        let with_stable_id = ApiRequest::post(URL, json!({"previous_response_id": stable}));
        let hash = recorder.fingerprint(&follow_up);
        assert_eq!(hash, recorder.fingerprint(&with_stable_id));
        for _ in 0..16 {
            assert_eq!(recorder.fingerprint(&follow_up), hash);
        }
    }
}
