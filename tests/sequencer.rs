//! Integration tests driving the API sequencer against a canned local
//! HTTP responder.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use pos_tester::config::Config;
use pos_tester::report::Verdict;
use pos_tester::sequencer::run_api_checks;

const TEST_TOKEN: &str = "integration-test-token";

#[derive(Clone)]
struct CannedServer {
    /// path -> (status, body) for GET routes.
    routes: Arc<HashMap<String, (u16, String)>>,
    /// Every request path, in arrival order.
    hits: Arc<Mutex<Vec<String>>>,
    /// Credentials the login endpoint accepts, if any.
    valid_login: Option<(String, String)>,
}

fn default_routes() -> HashMap<String, (u16, String)> {
    let mut routes = HashMap::new();
    routes.insert("/health".to_string(), (200, r#"{"status":"ok"}"#.to_string()));
    routes.insert(
        "/api/test".to_string(),
        (200, r#"{"database":"connected"}"#.to_string()),
    );
    for path in [
        "/api/pos/init",
        "/api/categories",
        "/api/products",
        "/api/members",
        "/api/sales",
        "/api/settings",
        "/api/favorites",
        "/api/dashboard",
        "/api/users",
    ] {
        routes.insert(path.to_string(), (200, r#"{"data":[]}"#.to_string()));
    }
    routes
}

async fn start_server(
    routes: HashMap<String, (u16, String)>,
    valid_login: Option<(&str, &str)>,
) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let server = CannedServer {
        routes: Arc::new(routes),
        hits: hits.clone(),
        valid_login: valid_login.map(|(e, p)| (e.to_string(), p.to_string())),
    };

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let server = server.clone();
            tokio::spawn(handle_connection(socket, server));
        }
    });

    (addr, hits)
}

async fn handle_connection(mut socket: TcpStream, server: CannedServer) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        match socket.read(&mut chunk).await {
            Ok(0) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
                    break pos + 4;
                }
                if buf.len() > 65536 {
                    return;
                }
            }
            Err(_) => return,
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let content_length = head
        .lines()
        .find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix("content-length:")
                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(_) => break,
        }
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    server.hits.lock().unwrap().push(path.clone());

    let (status, payload) = route(&server, &method, &path, &head, &body);
    let response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        reason(status),
        payload.len(),
        payload
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn route(
    server: &CannedServer,
    method: &str,
    path: &str,
    head: &str,
    body: &str,
) -> (u16, String) {
    if method == "POST" && path == "/api/auth/login" {
        return match &server.valid_login {
            Some((email, password)) if body.contains(email) && body.contains(password) => {
                (200, format!(r#"{{"token":"{}"}}"#, TEST_TOKEN))
            }
            _ => (401, r#"{"error":"invalid credentials"}"#.to_string()),
        };
    }

    // Domain endpoints demand the bearer credential issued at login.
    let needs_auth = path.starts_with("/api/") && path != "/api/test";
    if needs_auth {
        let authorized = head
            .to_ascii_lowercase()
            .contains(&format!("authorization: bearer {}", TEST_TOKEN));
        if !authorized {
            return (401, r#"{"error":"missing token"}"#.to_string());
        }
    }

    match server.routes.get(path) {
        Some((status, body)) => (*status, body.clone()),
        None => (404, r#"{"error":"not found"}"#.to_string()),
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn config_for(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.api_base_url = format!("http://{}", addr);
    config
}

#[tokio::test]
async fn full_sequence_passes_and_counts_eleven_steps() {
    let (addr, hits) = start_server(default_routes(), Some(("admin@kasir.com", "admin123"))).await;
    let report = run_api_checks(&config_for(addr)).await.unwrap();

    assert_eq!(report.run_count(), 11);
    assert_eq!(report.passed_count(), 11);
    assert_eq!(report.verdict(), Verdict::AllPassed);
    assert!((report.success_rate() - 100.0).abs() < f64::EPSILON);

    let hits = hits.lock().unwrap().clone();
    assert_eq!(hits[0], "/health");
    assert_eq!(hits[1], "/api/test");
    assert_eq!(hits[2], "/api/auth/login");
    assert_eq!(
        hits.iter().filter(|h| *h == "/api/auth/login").count(),
        1,
        "the first candidate matched, so one login attempt suffices"
    );
    assert_eq!(hits.last().unwrap(), "/api/users");
}

#[tokio::test]
async fn health_failure_aborts_before_anything_else() {
    let mut routes = default_routes();
    routes.insert(
        "/health".to_string(),
        (503, r#"{"status":"down"}"#.to_string()),
    );
    let (addr, hits) = start_server(routes, Some(("admin@kasir.com", "admin123"))).await;
    let report = run_api_checks(&config_for(addr)).await.unwrap();

    assert_eq!(report.run_count(), 1);
    assert_eq!(report.passed_count(), 0);
    assert_eq!(report.verdict(), Verdict::SomeFailed);
    assert!(report.aborted.is_some());

    let hits = hits.lock().unwrap().clone();
    assert_eq!(hits, vec!["/health".to_string()], "no login, no domain calls");
}

#[tokio::test]
async fn exhausted_credentials_block_every_authenticated_step() {
    let (addr, hits) = start_server(default_routes(), None).await;
    let report = run_api_checks(&config_for(addr)).await.unwrap();

    // Both connectivity checks passed, but the run still fails.
    assert_eq!(report.run_count(), 2);
    assert_eq!(report.passed_count(), 2);
    assert_eq!(report.verdict(), Verdict::SomeFailed);
    assert!(report.aborted.is_some());

    let hits = hits.lock().unwrap().clone();
    assert_eq!(
        hits.iter().filter(|h| *h == "/api/auth/login").count(),
        3,
        "every candidate pair is tried"
    );
    assert!(!hits.iter().any(|h| h == "/api/categories"));
    assert!(!hits.iter().any(|h| h == "/api/users"));
}

#[tokio::test]
async fn independent_failure_does_not_stop_siblings() {
    let mut routes = default_routes();
    routes.insert(
        "/api/products".to_string(),
        (500, r#"{"error":"boom"}"#.to_string()),
    );
    let (addr, hits) = start_server(routes, Some(("admin@kasir.com", "admin123"))).await;
    let report = run_api_checks(&config_for(addr)).await.unwrap();

    assert_eq!(report.run_count(), 11);
    assert_eq!(report.passed_count(), 10);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.verdict(), Verdict::SomeFailed);

    let failed: Vec<&str> = report
        .results
        .iter()
        .filter(|r| !r.passed())
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(failed, vec!["Get Products"]);

    // Steps after the failure still executed.
    let hits = hits.lock().unwrap().clone();
    assert!(hits.iter().any(|h| h == "/api/users"));
}

#[tokio::test]
async fn unreachable_server_fails_foundational_check_without_panicking() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let report = run_api_checks(&config_for(addr)).await.unwrap();
    assert_eq!(report.run_count(), 1);
    assert_eq!(report.passed_count(), 0);
    assert_eq!(report.verdict(), Verdict::SomeFailed);
    assert!(report.aborted.is_some());
}
