//! Fakes shared by unit tests: in-process provider doubles and a local HTTP
//! server that records what the adapters send.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::context::RequestContext;
use crate::enforcement::{EnforcementGateway, EnforcementInstruction};
use crate::error::{ProtectionError, ProtectionResult};
use crate::event::Event;
use crate::policy::RiskVerdict;
use crate::risk::RiskAssessor;
use crate::subject::{Actor, Subject};

pub(crate) fn origin_ip() -> IpAddr {
    "198.51.100.23".parse().unwrap()
}

pub(crate) fn request_context() -> RequestContext {
    RequestContext::new(origin_ip())
        .with_header("User-Agent", "Mozilla/5.0")
        .with_request_token("test|device:chrome_on_mac")
}

pub(crate) fn actor() -> Actor {
    Actor::new("1", "michael@example.com", "Michael Example")
}

/// Risk provider double returning a fixed evaluation result.
pub(crate) struct RecordingAssessor {
    result: ProtectionResult<RiskVerdict>,
    notify_error: Option<ProtectionError>,
    pub(crate) evaluations: Mutex<Vec<Event>>,
    pub(crate) notifications: Mutex<Vec<(Event, String)>>,
}

impl RecordingAssessor {
    pub(crate) fn returning(result: ProtectionResult<RiskVerdict>) -> Arc<Self> {
        Arc::new(Self {
            result,
            notify_error: None,
            evaluations: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn scoring(score: f64) -> Arc<Self> {
        Self::returning(RiskVerdict::from_score(score))
    }

    pub(crate) fn with_failing_notify(result: ProtectionResult<RiskVerdict>) -> Arc<Self> {
        Arc::new(Self {
            result,
            notify_error: Some(ProtectionError::AssessmentUnavailable(
                "filter endpoint down".to_string(),
            )),
            evaluations: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn evaluations(&self) -> Vec<Event> {
        self.evaluations.lock().unwrap().clone()
    }

    pub(crate) fn notified_events(&self) -> Vec<Event> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|(event, _)| *event)
            .collect()
    }
}

#[async_trait]
impl RiskAssessor for RecordingAssessor {
    async fn evaluate(
        &self,
        event: Event,
        _actor: &Actor,
        context: &RequestContext,
    ) -> ProtectionResult<RiskVerdict> {
        context.request_token()?;
        self.evaluations.lock().unwrap().push(event);
        self.result.clone()
    }

    async fn notify(
        &self,
        event: Event,
        subject: &Subject,
        _context: &RequestContext,
    ) -> ProtectionResult<()> {
        self.notifications
            .lock()
            .unwrap()
            .push((event, subject.email().to_string()));
        match &self.notify_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Firewall double that records every instruction it receives.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    fail: bool,
    pub(crate) applied: Mutex<Vec<EnforcementInstruction>>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            applied: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn applied(&self) -> Vec<EnforcementInstruction> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl EnforcementGateway for RecordingGateway {
    async fn apply(&self, instruction: &EnforcementInstruction) -> ProtectionResult<()> {
        self.applied.lock().unwrap().push(instruction.clone());
        if self.fail {
            Err(ProtectionError::EnforcementFailed(
                "authentication error".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// One request captured by [`MockProvider`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Value,
}

struct MockState {
    status: StatusCode,
    response: Value,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local HTTP server answering every request with one canned response.
pub(crate) struct MockProvider {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockProvider {
    pub(crate) async fn start(status: StatusCode, response: Value) -> Self {
        let state = Arc::new(MockState {
            status,
            response,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(record).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}

async fn record(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        headers,
        body,
    });
    (state.status, Json(state.response.clone()))
}
