#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wiremock::MockServer;

use authfetch_core::traits::{CredentialStore, NoticeSink, SessionTeardown, Telemetry};
use authfetch_core::{BaseUrl, ClientConfig, Notice, Result};
use authfetch_http::ApiClient;
use authfetch_store::MemoryCredentialStore;

/// Records every side effect the client performs.
#[derive(Default)]
pub struct Recorder {
    pub notices: Mutex<Vec<Notice>>,
    pub captured: Mutex<Vec<String>>,
    pub teardowns: AtomicUsize,
}

impl Recorder {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn captured(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl NoticeSink for Recorder {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

impl Telemetry for Recorder {
    fn capture_message(&self, message: &str) {
        self.captured.lock().unwrap().push(message.to_string());
    }
}

/// Teardown that clears the store and counts invocations.
struct CountingTeardown {
    store: MemoryCredentialStore,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl SessionTeardown for CountingTeardown {
    async fn teardown(&self) -> Result<()> {
        self.recorder.teardowns.fetch_add(1, Ordering::SeqCst);
        self.store.clear().await
    }
}

pub struct Harness {
    pub server: MockServer,
    pub store: MemoryCredentialStore,
    pub recorder: Arc<Recorder>,
    pub client: ApiClient,
}

/// Start a mock server and a client pointed at it, seeded with `access` and `refresh`.
pub async fn harness(access: &str, refresh: &str) -> Harness {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::with_tokens(access, refresh);
    harness_with_store(server, store).await
}

pub async fn harness_with_store(server: MockServer, store: MemoryCredentialStore) -> Harness {
    let config = config_for(&server);
    harness_with(server, store, config, None).await
}

/// Client configuration pointing at `server`.
pub fn config_for(server: &MockServer) -> ClientConfig {
    let base = BaseUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap();
    ClientConfig::new(base)
}

/// Build a harness with an explicit configuration. Without a `teardown`,
/// teardown clears the store and is counted by the recorder.
pub async fn harness_with(
    server: MockServer,
    store: MemoryCredentialStore,
    config: ClientConfig,
    teardown: Option<Arc<dyn SessionTeardown>>,
) -> Harness {
    let recorder = Arc::new(Recorder::default());

    let teardown = teardown.unwrap_or_else(|| {
        Arc::new(CountingTeardown {
            store: store.clone(),
            recorder: Arc::clone(&recorder),
        })
    });

    let client = ApiClient::builder(config, Arc::new(store.clone()))
        .teardown(teardown)
        .telemetry(recorder.clone())
        .notices(recorder.clone())
        .build()
        .unwrap();

    Harness {
        server,
        store,
        recorder,
        client,
    }
}
