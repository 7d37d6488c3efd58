use crate::{
    error::RemoteError,
    logout::{CsrfTokenProvider, LogoutInvoker, SessionEndpoint},
    navigation::HistoryNavigator,
    notice::{Notice, Notifier},
    session::{MemorySessionStore, SessionContext},
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;

pub struct FixedToken(pub Option<String>);

#[async_trait]
impl CsrfTokenProvider for FixedToken {
    async fn fetch_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Answers from a queue of canned results, `Ok(())` once the queue is empty.
#[derive(Default)]
pub struct ScriptedEndpoint {
    responses: Mutex<VecDeque<Result<(), RemoteError>>>,
    calls: Mutex<Vec<Option<String>>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedEndpoint {
    pub fn push_response(&self, response: Result<(), RemoteError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Holds every later call until the returned gate is notified once per call.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl SessionEndpoint for ScriptedEndpoint {
    async fn end_session(&self, csrf_token: Option<&str>) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(csrf_token.map(str::to_string));
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct Harness {
    pub session: SessionContext,
    pub ui_cache: Arc<MemorySessionStore>,
    pub tokens: Arc<FixedToken>,
    pub endpoint: Arc<ScriptedEndpoint>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<HistoryNavigator>,
    pub invoker: Arc<LogoutInvoker>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_token(Some("token-1".to_string()))
    }

    pub fn with_token(token: Option<String>) -> Self {
        let session = SessionContext::in_memory();
        let ui_cache = Arc::new(MemorySessionStore::new());
        let tokens = Arc::new(FixedToken(token));
        let endpoint = Arc::new(ScriptedEndpoint::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(HistoryNavigator::new("/"));
        let invoker = Arc::new(
            LogoutInvoker::new(
                session.clone(),
                tokens.clone(),
                endpoint.clone(),
                notifier.clone(),
                navigator.clone(),
            )
            .with_ui_cache(ui_cache.clone()),
        );
        Self {
            session,
            ui_cache,
            tokens,
            endpoint,
            notifier,
            navigator,
            invoker,
        }
    }

    /// A second invoker sharing this harness's collaborators.
    pub fn build_invoker(&self) -> LogoutInvoker {
        LogoutInvoker::new(
            self.session.clone(),
            self.tokens.clone(),
            self.endpoint.clone(),
            self.notifier.clone(),
            self.navigator.clone(),
        )
        .with_ui_cache(self.ui_cache.clone())
    }
}
