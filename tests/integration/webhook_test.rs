use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use boxwatch::core::monitor::{self, Monitor, Sampler};
use boxwatch::core::push::{Dispatcher, Push, PushPair, PushType};
use boxwatch::core::rate_limit::RateLimiter;
use boxwatch::core::rule::{MonitorType, Rule};
use boxwatch::core::status::{self, Status};
use boxwatch::error::{MonitorError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use super::fixtures::sample;

/// Every request body and `Authorization` header the endpoint received.
#[derive(Clone, Default)]
struct Received(Arc<Mutex<Vec<(Option<String>, String)>>>);

impl Received {
    fn bodies(&self) -> Vec<String> {
        self.0.lock().iter().map(|(_, body)| body.clone()).collect()
    }

    fn len(&self) -> usize {
        self.0.lock().len()
    }

    fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

async fn accept(
    State(received): State<Received>,
    headers: HeaderMap,
    body: String,
) -> &'static str {
    record(&received, &headers, body);
    r#"{"retcode": 0}"#
}

async fn reject(
    State(received): State<Received>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    record(&received, &headers, body);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

fn record(received: &Received, headers: &HeaderMap, body: String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.0.lock().push((auth, body));
}

/// Local endpoint: `/hook` and `/push` accept, `/fail` answers 500.
async fn spawn_endpoint() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/hook", post(accept))
        .route("/push", post(accept))
        .route("/fail", post(reject))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), received)
}

fn webhook(base: &str, path: &str) -> Push {
    Push::new(
        PushType::Webhook,
        "hook",
        json!({
            "url": format!("{}{}", base, path),
            "headers": { "Authorization": "Bearer secret" },
            "body": {
                "action": "send_group_msg",
                "params": { "group_id": 1, "message": "{{name}}\n{{msg}}" }
            },
            "code": 200,
            "body_regex": r#""retcode":\s*0"#
        }),
    )
}

fn pair() -> PushPair {
    PushPair {
        key: "cpu".to_string(),
        value: "90.00%".to_string(),
        time: "2024-01-02 03:04:05".to_string(),
    }
}

#[tokio::test]
async fn test_webhook_renders_and_verifies() {
    let (base, received) = spawn_endpoint().await;
    let channel = webhook(&base, "/hook").channel().unwrap();

    channel
        .send(&reqwest::Client::new(), "db-1", &[pair()])
        .await
        .unwrap();

    let requests = received.0.lock().clone();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer secret"));

    let body: Value = serde_json::from_str(body).unwrap();
    assert_eq!(body["action"], "send_group_msg");
    assert_eq!(body["params"]["group_id"], 1);
    assert_eq!(
        body["params"]["message"],
        "db-1\n2024-01-02 03:04:05\ncpu: 90.00%"
    );
}

#[tokio::test]
async fn test_webhook_rejected_response_is_an_error() {
    let (base, received) = spawn_endpoint().await;
    let channel = webhook(&base, "/fail").channel().unwrap();

    let err = channel
        .send(&reqwest::Client::new(), "db-1", &[pair()])
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Push(_)));
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn test_bark_with_custom_server() {
    let (base, received) = spawn_endpoint().await;
    let push = Push::new(
        PushType::Bark,
        "phone",
        json!({
            "server": format!("{}/", base),
            "device_key": "abc",
            "title": "{{name}} alert",
            "body": "{{kvs}}",
            "code": 200
        }),
    );

    push.channel()
        .unwrap()
        .send(&reqwest::Client::new(), "db-1", &[pair()])
        .await
        .unwrap();

    let body: Value = serde_json::from_str(&received.bodies()[0]).unwrap();
    assert_eq!(body["device_key"], "abc");
    assert_eq!(body["title"], "db-1 alert");
    assert_eq!(body["body"], "2024-01-02 03:04:05\ncpu: 90.00%");
}

#[tokio::test]
async fn test_dispatcher_respects_rate_limit() {
    let (base, received) = spawn_endpoint().await;
    let dispatcher = Dispatcher::new(
        "db-1",
        &[webhook(&base, "/hook")],
        RateLimiter::new(1, Duration::from_secs(60)),
    )
    .unwrap();

    assert_eq!(dispatcher.dispatch(&[pair()]).await, 1);
    assert_eq!(dispatcher.dispatch(&[pair()]).await, 0);
    assert_eq!(dispatcher.dispatch(&[]).await, 0);
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn test_failed_push_does_not_use_quota() {
    let (base, received) = spawn_endpoint().await;
    let dispatcher = Dispatcher::new(
        "db-1",
        &[webhook(&base, "/fail")],
        RateLimiter::new(1, Duration::from_secs(60)),
    )
    .unwrap();

    assert_eq!(dispatcher.dispatch(&[pair()]).await, 0);
    assert_eq!(dispatcher.dispatch(&[pair()]).await, 0);
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_one_failing_channel_does_not_block_others() {
    let (base, received) = spawn_endpoint().await;
    let mut failing = webhook(&base, "/fail");
    failing.name = "broken".to_string();
    let dispatcher = Dispatcher::new(
        "db-1",
        &[failing, webhook(&base, "/hook")],
        RateLimiter::default(),
    )
    .unwrap();

    assert_eq!(dispatcher.dispatch(&[pair()]).await, 1);
    assert_eq!(received.len(), 2);
}

/// Replays canned outputs, then fails.
struct ReplaySampler(Mutex<VecDeque<String>>);

impl Sampler for ReplaySampler {
    async fn sample(&self) -> Result<String> {
        self.0
            .lock()
            .pop_front()
            .ok_or_else(|| MonitorError::sampler("no more samples"))
    }
}

#[tokio::test]
async fn test_run_pushes_when_rule_fires() {
    let (base, received) = spawn_endpoint().await;
    let dispatcher =
        Dispatcher::new("db-1", &[webhook(&base, "/hook")], RateLimiter::default()).unwrap();
    let monitor = Monitor::new(
        status::shared(Status::new()),
        vec![Rule::new(MonitorType::Cpu, ">=50%", "cpu0")],
        dispatcher,
    );
    let sampler = ReplaySampler(Mutex::new(VecDeque::from([
        sample(100, 200, 0, 0),
        sample(150, 300, 0, 0),
    ])));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let stop = async {
        while received.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown_tx.send(()).unwrap();
    };
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            monitor::run(&monitor, &sampler, Duration::from_millis(20), shutdown_rx),
            stop
        )
    })
    .await;
    assert!(finished.is_ok(), "monitor loop did not stop");

    let body: Value = serde_json::from_str(&received.bodies()[0]).unwrap();
    let message = body["params"]["message"].as_str().unwrap();
    assert!(message.starts_with("db-1\n"));
    assert!(message.ends_with("cpu0: 50.00%"));
    assert_eq!(monitor.status().read().cpu.len(), 2);
}
