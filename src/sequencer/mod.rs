//! HTTP-level verification sequence for the POS backend.
//!
//! Walks a fixed, ordered list of checks against one base URL: health and
//! database connectivity first, then login, then the authenticated domain
//! endpoints. Foundational failures stop the run; everything after
//! authentication is recorded and the walk continues.

use anyhow::{Context, Result};
use colored::Colorize;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Instant;

use crate::config::{Account, Config};
use crate::console;
use crate::report::{RunReport, StepResult, StepStatus};

/// Bound on response previews echoed into the transcript.
const PREVIEW_LIMIT: usize = 300;

/// Whether a failed check invalidates the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepClass {
    Foundational,
    Independent,
}

/// One entry of the fixed check sequence.
#[derive(Debug, Clone)]
pub struct CheckSpec {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub expected_status: u16,
    pub class: StepClass,
}

impl CheckSpec {
    const fn foundational(name: &'static str, endpoint: &'static str) -> Self {
        Self {
            name,
            endpoint,
            expected_status: 200,
            class: StepClass::Foundational,
        }
    }

    const fn independent(name: &'static str, endpoint: &'static str) -> Self {
        Self {
            name,
            endpoint,
            expected_status: 200,
            class: StepClass::Independent,
        }
    }
}

/// The fixed order every run walks. Connectivity checks come first; the
/// domain endpoints require the session token and run regardless of each
/// other's outcome.
pub fn check_plan() -> Vec<CheckSpec> {
    vec![
        CheckSpec::foundational("Health Check", "/health"),
        CheckSpec::foundational("Database Test", "/api/test"),
        CheckSpec::independent("POS Init Data", "/api/pos/init"),
        CheckSpec::independent("Get Categories", "/api/categories"),
        CheckSpec::independent("Get Products", "/api/products"),
        CheckSpec::independent("Get Members", "/api/members"),
        CheckSpec::independent("Get Sales", "/api/sales"),
        CheckSpec::independent("Get Settings", "/api/settings"),
        CheckSpec::independent("Get Favorites", "/api/favorites"),
        CheckSpec::independent("Get Dashboard", "/api/dashboard"),
        CheckSpec::independent("Get Users", "/api/users"),
    ]
}

/// Run the full API sequence and return its report.
pub async fn run_api_checks(config: &Config) -> Result<RunReport> {
    println!(
        "{} Running API checks against: {}",
        "▶".green().bold(),
        config.api_base_url.cyan()
    );
    let sequencer = ApiSequencer::new(config)?;
    Ok(sequencer.run(&config.accounts).await)
}

/// Stateful sequential runner for the API checks. One instance per run;
/// the bearer token is set at most once and read by every later step.
pub struct ApiSequencer {
    client: Client,
    base_url: String,
    token: Option<String>,
    report: RunReport,
}

impl ApiSequencer {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: None,
            report: RunReport::new("api"),
        })
    }

    /// Walk the plan in order. A failed foundational check aborts the run;
    /// independent failures are recorded and the walk continues. The first
    /// independent check triggers authentication, and exhausting every
    /// credential candidate aborts before any authenticated call is made.
    pub async fn run(mut self, accounts: &[Account]) -> RunReport {
        for check in check_plan() {
            if check.class == StepClass::Independent && self.token.is_none() {
                if !self.authenticate(accounts).await {
                    console::fail("All login attempts failed - stopping authenticated checks");
                    self.report.abort("no candidate credentials authenticated");
                    return self.report;
                }
            }

            let (ok, _) = self
                .run_step(
                    check.name,
                    Method::GET,
                    check.endpoint,
                    check.expected_status,
                    None,
                    None,
                )
                .await;

            if !ok && check.class == StepClass::Foundational {
                console::fail(&format!("{} failed - stopping the run", check.name));
                self.report
                    .abort(format!("foundational check failed: {}", check.name));
                return self.report;
            }
        }
        self.report
    }

    /// Issue one request and classify it against the expected status.
    ///
    /// Transport failures (connection refused, timeout, unreadable body)
    /// are converted into a failed step, never propagated, so the walk can
    /// keep counting subsequent independent checks.
    pub async fn run_step(
        &mut self,
        name: &str,
        method: Method,
        endpoint: &str,
        expected_status: u16,
        body: Option<&Value>,
        extra_headers: Option<&HeaderMap>,
    ) -> (bool, Value) {
        let url = join_url(&self.base_url, endpoint);
        let started = Instant::now();

        console::note(&format!("🔍 Testing {}...", name));
        log::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.headers(extra_headers));
        if let Some(body) = body {
            request = request.json(body);
        }

        let (ok, observed, value) = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let text = response.text().await.unwrap_or_default();
                let value = serde_json::from_str::<Value>(&text)
                    .unwrap_or_else(|_| Value::String(text.clone()));
                let ok = status == expected_status;
                if ok {
                    console::pass(&format!("{} - status {}", name, status));
                } else {
                    console::fail(&format!(
                        "{} - expected {}, got {}",
                        name, expected_status, status
                    ));
                }
                let preview = truncate_preview(&text);
                if !preview.is_empty() {
                    console::note(&format!("   {}", preview));
                }
                (ok, format!("status {}: {}", status, preview), value)
            }
            Err(e) => {
                console::fail(&format!("{} - network error: {}", name, e));
                (false, format!("network error: {}", e), Value::Null)
            }
        };

        let status = if ok {
            StepStatus::Passed
        } else {
            StepStatus::Failed {
                error: observed.clone(),
            }
        };
        self.report.record(StepResult {
            name: name.to_string(),
            status,
            observed: Some(observed),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        (ok, value)
    }

    /// Try each candidate in order until one authenticates. Login attempts
    /// are session setup, not counted run steps.
    pub async fn authenticate(&mut self, accounts: &[Account]) -> bool {
        for account in accounts {
            if self.login(&account.email, &account.password).await {
                return true;
            }
        }
        false
    }

    /// Attempt one credential pair. On success the token from the JSON body
    /// is stored for every later step.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        console::note(&format!("🔐 Login attempt: {}", email));
        let url = join_url(&self.base_url, "/api/auth/login");
        let body = json!({ "email": email, "password": password });

        let response = self
            .client
            .post(&url)
            .headers(self.headers(None))
            .json(&body)
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::OK => {
                let value = response.json::<Value>().await.unwrap_or(Value::Null);
                match value.get("token").and_then(Value::as_str) {
                    Some(token) => {
                        console::pass(&format!("Authenticated as {}", email));
                        self.token = Some(token.to_string());
                        true
                    }
                    None => {
                        console::fail(&format!("Login response for {} had no token field", email));
                        false
                    }
                }
            }
            Ok(response) => {
                console::fail(&format!(
                    "Login failed for {} - status {}",
                    email,
                    response.status().as_u16()
                ));
                false
            }
            Err(e) => {
                console::fail(&format!("Login failed for {} - network error: {}", email, e));
                false
            }
        }
    }

    /// Fixed content type, then the session bearer credential if present,
    /// then any extra headers on top.
    fn headers(&self, extra: Option<&HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        if let Some(extra) = extra {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }
        headers
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn truncate_preview(text: &str) -> String {
    let flat = text.replace(&['\n', '\r'][..], " ");
    let trimmed = flat.trim();
    if trimmed.len() <= PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut end = PREVIEW_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
