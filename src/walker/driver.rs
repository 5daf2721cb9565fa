//! Browser session wrapper over Playwright.
//!
//! One page, one in-flight operation at a time. Every wait is bounded;
//! timeout expiry surfaces as [`WalkerError::WaitTimeout`] and is handled
//! by the flow's failure policy, not here.

use anyhow::{Context, Result};
use playwright::api::{Browser, BrowserContext, Page, Viewport};
use playwright::Playwright;
use std::path::Path;
use std::time::Instant;

use super::selector::Selector;

/// Poll interval for the hand-rolled waits (absence, URL).
const POLL_INTERVAL_MS: u64 = 200;

/// UI failure classes surfaced by wait and locate operations.
#[derive(Debug, thiserror::Error)]
pub enum WalkerError {
    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    WaitTimeout { what: String, timeout_ms: u64 },

    #[error("element not found: {0}")]
    ElementMissing(String),
}

pub struct WebDriver {
    #[allow(dead_code)]
    playwright: Playwright,
    browser: Browser,
    #[allow(dead_code)]
    context: BrowserContext,
    page: Page,
}

impl WebDriver {
    /// Launch headless chromium with a fresh context and page.
    pub async fn launch(headless: bool) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let chromium = playwright.chromium();
        let mut launcher = chromium.launcher();
        launcher = launcher.headless(headless);

        if let Some(path) = find_browser_executable() {
            log::debug!("using browser executable {}", path.display());
            launcher = launcher.executable(&path);
        }

        let args: Vec<String> = [
            "--no-sandbox",
            "--disable-setuid-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--ignore-certificate-errors",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        launcher = launcher.args(&args);

        let browser = launcher
            .launch()
            .await
            .context("Failed to launch chromium")?;
        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;

        page.set_viewport_size(Viewport {
            width: 1280,
            height: 720,
        })
        .await?;

        Ok(Self {
            playwright,
            browser,
            context,
            page,
        })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        let url: String = self
            .page
            .evaluate("() => window.location.href", ())
            .await?;
        Ok(url)
    }

    /// Poll the page URL until it matches `expected` (trailing slashes
    /// ignored) or the deadline passes.
    pub async fn wait_for_url(&self, expected: &str, timeout_ms: u64) -> Result<String> {
        let started = Instant::now();
        loop {
            let url = self.current_url().await?;
            if url.trim_end_matches('/') == expected.trim_end_matches('/') {
                return Ok(url);
            }
            if started.elapsed().as_millis() >= u128::from(timeout_ms) {
                return Err(WalkerError::WaitTimeout {
                    what: format!("navigation to {}", expected),
                    timeout_ms,
                }
                .into());
            }
            tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    pub async fn fill(&self, selector: &Selector, value: &str) -> Result<()> {
        let sel = selector.to_playwright();
        let element = self
            .page
            .query_selector(&sel)
            .await?
            .ok_or_else(|| WalkerError::ElementMissing(sel.clone()))?;
        element.fill_builder(value).fill().await?;
        Ok(())
    }

    pub async fn click(&self, selector: &Selector) -> Result<()> {
        let sel = selector.to_playwright();
        self.page
            .click_builder(&sel)
            .click()
            .await
            .with_context(|| format!("Failed to click: {}", sel))?;
        Ok(())
    }

    /// Pick the first real option of a `<select>` and fire a change event
    /// so the page reacts as it would to user input.
    pub async fn select_first_option(&self, selector: &Selector) -> Result<String> {
        let sel = selector.to_playwright();
        let js = "el => { \
            if (el.options.length > 1) { el.selectedIndex = 1; } \
            el.dispatchEvent(new Event('change', { bubbles: true })); \
            return el.value; \
        }";
        let value = self
            .page
            .evaluate_on_selector::<String, _>(&sel, js, None::<String>)
            .await
            .map_err(|_| WalkerError::ElementMissing(sel))?;
        Ok(value)
    }

    /// Block until the element is attached and visible, or time out.
    pub async fn wait_for(&self, selector: &Selector, timeout_ms: u64) -> Result<()> {
        let sel = selector.to_playwright();
        let result = self
            .page
            .wait_for_selector_builder(&sel)
            .timeout(timeout_ms as f64)
            .wait_for_selector()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(_) => Err(WalkerError::WaitTimeout {
                what: sel,
                timeout_ms,
            }
            .into()),
        }
    }

    /// Block until the element is gone or hidden, or time out.
    pub async fn wait_for_absence(&self, selector: &Selector, timeout_ms: u64) -> Result<()> {
        let started = Instant::now();
        while started.elapsed().as_millis() < u128::from(timeout_ms) {
            if !self.is_visible(selector).await? {
                return Ok(());
            }
            tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
        Err(WalkerError::WaitTimeout {
            what: format!("absence of {}", selector.to_playwright()),
            timeout_ms,
        }
        .into())
    }

    pub async fn is_visible(&self, selector: &Selector) -> Result<bool> {
        let sel = selector.to_playwright();
        match self.page.query_selector(&sel).await? {
            Some(element) => Ok(element.is_visible().await?),
            None => Ok(false),
        }
    }

    pub async fn text_of(&self, selector: &Selector) -> Result<String> {
        let sel = selector.to_playwright();
        let js = "el => el.value || el.innerText || el.textContent || ''";
        let text = self
            .page
            .evaluate_on_selector::<String, _>(&sel, js, None::<String>)
            .await
            .map_err(|_| WalkerError::ElementMissing(sel))?;
        Ok(text)
    }

    /// Auto-accept native confirmation prompts for the rest of the page's
    /// lifetime. Installed before the delete click.
    pub async fn accept_dialogs(&self) -> Result<()> {
        self.page
            .evaluate::<(), ()>("() => { window.confirm = () => true; }", ())
            .await?;
        Ok(())
    }

    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.page
            .screenshot_builder()
            .path(path.to_path_buf())
            .screenshot()
            .await?;
        Ok(())
    }

    /// Release the browser. Safe to call on any exit path.
    pub async fn close(&self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close browser")?;
        Ok(())
    }
}

/// Locate a chromium-compatible executable: env override first, then the
/// usual install locations.
fn find_browser_executable() -> Option<std::path::PathBuf> {
    if let Ok(path) = std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH") {
        return Some(std::path::PathBuf::from(path));
    }

    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];
    common_paths
        .into_iter()
        .map(std::path::PathBuf::from)
        .find(|p| p.exists())
}
