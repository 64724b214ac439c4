use catalog_api::{build_router, AppState, RateLimitConfig, RateLimiter};
use catalog_storage::ProductStore;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CLIENT_A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
const CLIENT_B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
    RateLimiter::new(RateLimitConfig {
        max_requests,
        window: Duration::from_secs(window_secs),
    })
}

async fn spawn_limited(config: RateLimitConfig) -> String {
    let store = Arc::new(ProductStore::open_in_memory().unwrap());
    let app = build_router(AppState::new(store, "test-secret").with_rate_limit(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

// ── Limiter ─────────────────────────────────────────────────────

#[test]
fn default_is_ten_requests_per_ten_seconds() {
    let config = RateLimitConfig::default();
    assert_eq!(config.max_requests, 10);
    assert_eq!(config.window, Duration::from_secs(10));
}

#[test]
fn requests_over_the_limit_are_refused() {
    let limiter = limiter(3, 10);
    let now = Instant::now();
    for _ in 0..3 {
        assert!(limiter.try_acquire_at(CLIENT_A, now));
    }
    assert!(!limiter.try_acquire_at(CLIENT_A, now));
}

#[test]
fn clients_are_counted_separately() {
    let limiter = limiter(1, 10);
    let now = Instant::now();
    assert!(limiter.try_acquire_at(CLIENT_A, now));
    assert!(!limiter.try_acquire_at(CLIENT_A, now));
    assert!(limiter.try_acquire_at(CLIENT_B, now));
}

#[test]
fn window_slides_as_requests_age_out() {
    let limiter = limiter(2, 10);
    let start = Instant::now();
    assert!(limiter.try_acquire_at(CLIENT_A, start));
    assert!(limiter.try_acquire_at(CLIENT_A, start + Duration::from_secs(5)));
    assert!(!limiter.try_acquire_at(CLIENT_A, start + Duration::from_secs(9)));

    // The first request has aged out; the second still counts.
    assert!(limiter.try_acquire_at(CLIENT_A, start + Duration::from_secs(10)));
    assert!(!limiter.try_acquire_at(CLIENT_A, start + Duration::from_secs(11)));
}

#[test]
fn refused_requests_do_not_extend_the_window() {
    let limiter = limiter(1, 10);
    let start = Instant::now();
    assert!(limiter.try_acquire_at(CLIENT_A, start));
    for secs in 1..10 {
        assert!(!limiter.try_acquire_at(CLIENT_A, start + Duration::from_secs(secs)));
    }
    assert!(limiter.try_acquire_at(CLIENT_A, start + Duration::from_secs(10)));
}

// ── Middleware ──────────────────────────────────────────────────

#[tokio::test]
async fn eleventh_request_in_window_is_throttled() {
    let base = spawn_limited(RateLimitConfig::default()).await;
    let client = reqwest::Client::new();

    for _ in 0..10 {
        let resp = client.get(format!("{base}/products")).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let resp = client.get(format!("{base}/products")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 429);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["statusCode"], 429);
    assert_eq!(body["message"], "ThrottlerException: Too Many Requests");
    assert_eq!(body["error"], "Too Many Requests");
}

#[tokio::test]
async fn limit_is_shared_across_routes() {
    let base = spawn_limited(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
    })
    .await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/products")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let resp = client.get(format!("{base}/reports/products")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = client
        .delete(format!("{base}/products/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 429);
}

#[tokio::test]
async fn throttled_client_recovers_after_window() {
    let base = spawn_limited(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_millis(300),
    })
    .await;
    let client = reqwest::Client::new();

    let first = client.get(format!("{base}/products")).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 200);
    let second = client.get(format!("{base}/products")).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 429);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let third = client.get(format!("{base}/products")).send().await.unwrap();
    assert_eq!(third.status().as_u16(), 200);
}
