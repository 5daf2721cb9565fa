use std::path::PathBuf;
use std::time::Duration;

/// One candidate credential pair for the login fallback list.
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

/// Run configuration shared by both orchestrators.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL for the API check sequence.
    pub api_base_url: String,

    /// Frontend base URL for the UI flow.
    pub web_base_url: String,

    /// Fixed per-request timeout for API calls.
    pub request_timeout: Duration,

    /// Default timeout for UI element/URL waits (ms).
    pub wait_timeout_ms: u64,

    /// Delay between the two sort clicks (ms).
    pub settle_delay_ms: u64,

    /// Output directory for screenshots and JSON reports.
    pub artifact_dir: PathBuf,

    /// Run the browser headless.
    pub headless: bool,

    /// Candidate credentials, tried in order until one authenticates.
    pub accounts: Vec<Account>,
}

impl Default for Config {
    fn default() -> Self {
        let headless = std::env::var("POS_TESTER_HEADED")
            .map(|v| !(v == "true" || v == "1"))
            .unwrap_or(true);

        Self {
            api_base_url: "http://localhost:8001".to_string(),
            web_base_url: "http://localhost:5173".to_string(),
            request_timeout: Duration::from_secs(10),
            wait_timeout_ms: 15_000,
            settle_delay_ms: 500,
            artifact_dir: PathBuf::from("./output"),
            headless,
            accounts: vec![
                Account::new("admin@kasir.com", "admin123"),
                Account::new("kasir@kasir.com", "kasir123"),
                Account::new("gudang@kasir.com", "gudang123"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_local_services() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8001");
        assert_eq!(config.web_base_url, "http://localhost:5173");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn default_carries_three_candidate_accounts() {
        let config = Config::default();
        assert_eq!(config.accounts.len(), 3);
        assert_eq!(config.accounts[0].email, "admin@kasir.com");
    }
}
