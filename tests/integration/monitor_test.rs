use boxwatch::core::config::AppConfig;
use boxwatch::core::monitor::Monitor;
use boxwatch::core::push::Dispatcher;
use boxwatch::core::rate_limit::RateLimiter;
use boxwatch::core::rule::{MonitorType, Rule};
use boxwatch::core::status::{self, Status};
use boxwatch::web::{self, StatusResponse};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use super::fixtures::sample;

fn monitor(rules: Vec<Rule>) -> Monitor {
    let dispatcher = Dispatcher::new("Server 1", &[], RateLimiter::default()).unwrap();
    Monitor::new(status::shared(Status::new()), rules, dispatcher)
}

#[test]
fn test_rules_fire_once_status_is_warm() {
    let monitor = monitor(vec![
        Rule::new(MonitorType::Cpu, ">=50%", "cpu0"),
        Rule::new(MonitorType::Disk, ">=90%", "/"),
        Rule::new(MonitorType::Net, ">=1m/s", "all-in"),
    ]);
    let elapsed = Duration::from_secs(2);

    // Only the point-in-time disk rule can fire on the first sample
    let pairs = monitor
        .process_output(&sample(100, 200, 1_000, 1_000), elapsed)
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].key, "/");
    assert_eq!(pairs[0].value, "95.00%");

    let pairs = monitor
        .process_output(
            &sample(150, 300, 1_000 + 4 * 1024 * 1024, 1_000),
            elapsed,
        )
        .unwrap();
    let fired: Vec<(&str, &str)> = pairs
        .iter()
        .map(|p| (p.key.as_str(), p.value.as_str()))
        .collect();
    assert_eq!(
        fired,
        vec![("cpu0", "50.00%"), ("/", "95.00%"), ("all-in", "2.0 m/s")]
    );
}

#[test]
fn test_garbage_output_keeps_previous_status() {
    let monitor = monitor(vec![Rule::new(MonitorType::Cpu, ">=50%", "cpu0")]);
    monitor
        .process_output(&sample(100, 200, 0, 0), Duration::from_secs(2))
        .unwrap();

    assert!(monitor
        .process_output("no markers here", Duration::from_secs(2))
        .is_err());

    let status = monitor.status().read();
    assert_eq!(status.cpu.len(), 2);
    assert_eq!(status.disks.len(), 2);
}

#[test]
fn test_monitor_from_default_config() {
    let config = AppConfig::default();
    let monitor = Monitor::from_config(&config, status::shared(Status::new())).unwrap();
    assert_eq!(monitor.rules(), config.rules.as_slice());
    assert_eq!(monitor.dispatcher().channel_count(), 1);
}

async fn spawn_status_server(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_status_endpoint_serves_latest_summary() {
    let shared = status::shared(Status::new());
    {
        let mut status = shared.write();
        status
            .apply_output(&sample(100, 200, 1_000, 1_000), Duration::from_secs(2))
            .unwrap();
        status
            .apply_output(&sample(150, 300, 2_000, 3_000), Duration::from_secs(2))
            .unwrap();
    }

    let addr = spawn_status_server(web::build_router(shared, "db-1")).await;

    let response: StatusResponse = reqwest::get(format!("http://{}/status", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.code, 0);
    assert_eq!(response.data.name, "db-1");
    assert_eq!(response.data.cpu, "50.0%");
    assert_eq!(response.data.mem, "800.0 k / 1000.0 k");
    assert_eq!(response.data.net, "2.1 k / 3.0 k");
    assert_eq!(response.data.disk, "19.0 g / 20.0 g");
}

#[tokio::test]
async fn test_status_endpoint_unknown_path() {
    let addr = spawn_status_server(web::build_router(status::shared(Status::new()), "db-1")).await;

    let response = reqwest::get(format!("http://{}/metrics", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_endpoint_limits_each_client() {
    let router = web::build_router_with_limit(status::shared(Status::new()), "db-1", 1);
    let addr = spawn_status_server(router).await;
    let client = reqwest::Client::new();

    let mut codes = Vec::new();
    for _ in 0..3 {
        let response = client
            .get(format!("http://{}/status", addr))
            .send()
            .await
            .unwrap();
        codes.push(response.status());
    }
    assert_eq!(codes[0], reqwest::StatusCode::OK);
    assert!(codes.contains(&reqwest::StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_status_endpoint_allows_any_origin() {
    let addr = spawn_status_server(web::build_router(status::shared(Status::new()), "db-1")).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/status", addr))
        .header("Origin", "https://dashboard.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
