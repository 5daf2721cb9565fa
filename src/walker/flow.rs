//! The fixed sign-in + product CRUD + sort walk.
//!
//! Strictly sequential and dependency-chained: editing needs the created
//! row, deleting needs the edited row, so the first failure aborts the
//! remainder after capturing a diagnostic screenshot.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use super::driver::WebDriver;
use super::selector::Selector;
use crate::config::Config;
use crate::console;
use crate::report::{RunReport, StepResult, StepStatus};

const PRODUCT_NAME: &str = "QA Smoke Product";
const PRODUCT_BARCODE: &str = "8999999000001";
const PRODUCT_PRICE: &str = "15000";
const PRODUCT_PRICE_EDITED: &str = "17500";
/// The list renders prices in id-ID grouping ("Rp 17.500").
const PRODUCT_PRICE_EDITED_DISPLAY: &str = "Rp 17.500";
const PRODUCT_STOCK: &str = "25";
const PRODUCT_DESCRIPTION: &str = "Created by the verification walk";

const TOAST_CREATED: &str = "Product created successfully";
const TOAST_UPDATED: &str = "Product updated successfully";
const TOAST_DELETED: &str = "Product deleted successfully";

pub struct ProductFlow<'a> {
    driver: WebDriver,
    config: &'a Config,
    report: RunReport,
}

impl<'a> ProductFlow<'a> {
    pub fn new(driver: WebDriver, config: &'a Config) -> Self {
        Self {
            driver,
            config,
            report: RunReport::new("ui"),
        }
    }

    /// Run the walk, capture a diagnostic screenshot on the failure path,
    /// and release the browser on every exit path.
    pub async fn run(mut self) -> RunReport {
        if let Err(e) = self.walk().await {
            let failed_step = self
                .report
                .results
                .last()
                .map(|r| r.name.replace(' ', "-"))
                .unwrap_or_else(|| "setup".to_string());
            let path = self
                .config
                .artifact_dir
                .join(format!("failure-{}.png", failed_step));
            match self.driver.screenshot(&path).await {
                Ok(()) => console::note(&format!("📸 Failure screenshot: {}", path.display())),
                Err(shot_err) => {
                    console::fail(&format!("Could not capture failure screenshot: {}", shot_err))
                }
            }
            self.report.abort(e.to_string());
        }

        if let Err(e) = self.driver.close().await {
            console::fail(&format!("Browser close failed: {}", e));
        }
        self.report
    }

    async fn walk(&mut self) -> Result<()> {
        let started = Instant::now();
        let outcome = self.sign_in().await;
        self.record("sign in", started, outcome)?;

        let started = Instant::now();
        let outcome = self.open_products().await;
        self.record("open products list", started, outcome)?;

        let started = Instant::now();
        let outcome = self.create_product().await;
        self.record("create product", started, outcome)?;

        let started = Instant::now();
        let outcome = self.edit_product().await;
        self.record("edit product", started, outcome)?;

        let started = Instant::now();
        let outcome = self.sort_products().await;
        self.record("sort products", started, outcome)?;

        let started = Instant::now();
        let outcome = self.delete_product().await;
        self.record("delete product", started, outcome)?;

        let started = Instant::now();
        let outcome = self.checkpoint("products-final").await;
        self.record("final screenshot", started, outcome)?;

        Ok(())
    }

    /// Append the step outcome to the report; a failure propagates and
    /// aborts the remainder of the walk.
    fn record(&mut self, name: &str, started: Instant, outcome: Result<String>) -> Result<()> {
        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(observed) => {
                console::pass(&format!("{} ({} ms)", name, duration_ms));
                self.report.record(StepResult {
                    name: name.to_string(),
                    status: StepStatus::Passed,
                    observed: Some(observed),
                    duration_ms,
                });
                Ok(())
            }
            Err(e) => {
                console::fail(&format!("{} - {:#}", name, e));
                self.report.record(StepResult {
                    name: name.to_string(),
                    status: StepStatus::Failed {
                        error: format!("{:#}", e),
                    },
                    observed: None,
                    duration_ms,
                });
                Err(e)
            }
        }
    }

    fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.config.web_base_url.trim_end_matches('/'), path)
    }

    async fn checkpoint(&self, name: &str) -> Result<String> {
        let path = self.config.artifact_dir.join(format!("{}.png", name));
        self.driver.screenshot(&path).await?;
        Ok(path.display().to_string())
    }

    async fn sign_in(&self) -> Result<String> {
        let account = self
            .config
            .accounts
            .first()
            .context("no credentials configured")?;
        let timeout = self.config.wait_timeout_ms;

        console::note(&format!("🔐 Signing in as {}", account.email));
        self.driver.goto(&self.page_url("/auth/signin")).await?;
        self.driver
            .wait_for(&Selector::css("input[name=\"email\"]"), timeout)
            .await?;
        self.driver
            .fill(&Selector::css("input[name=\"email\"]"), &account.email)
            .await?;
        self.driver
            .fill(&Selector::css("input[name=\"password\"]"), &account.password)
            .await?;
        self.driver
            .click(&Selector::css("button[type=\"submit\"]"))
            .await?;

        let landed = self
            .driver
            .wait_for_url(&self.page_url("/"), timeout)
            .await?;
        self.checkpoint("signin").await?;
        Ok(format!("landed on {}", landed))
    }

    async fn open_products(&self) -> Result<String> {
        let timeout = self.config.wait_timeout_ms;

        self.driver.goto(&self.page_url("/products")).await?;
        self.driver
            .wait_for(&Selector::heading("Products"), timeout)
            .await?;
        self.driver
            .wait_for_absence(&Selector::css(".animate-spin"), timeout)
            .await?;
        self.checkpoint("products").await
    }

    async fn create_product(&self) -> Result<String> {
        let timeout = self.config.wait_timeout_ms;

        self.driver.click(&Selector::button("Add Product")).await?;
        self.driver
            .wait_for(&Selector::field("name"), timeout)
            .await?;

        self.driver
            .fill(&Selector::field("name"), PRODUCT_NAME)
            .await?;
        self.driver
            .fill(&Selector::field("barcode"), PRODUCT_BARCODE)
            .await?;
        self.driver
            .fill(&Selector::field("price"), PRODUCT_PRICE)
            .await?;
        self.driver
            .fill(&Selector::field("stock"), PRODUCT_STOCK)
            .await?;
        let category = self
            .driver
            .select_first_option(&Selector::field("categoryId"))
            .await?;
        self.driver
            .fill(&Selector::field("description"), PRODUCT_DESCRIPTION)
            .await?;

        self.driver.click(&Selector::button("Save")).await?;
        self.driver
            .wait_for(&Selector::text(TOAST_CREATED), timeout)
            .await?;

        let row = Selector::xpath(format!("//tr[contains(., \"{}\")]", PRODUCT_NAME));
        self.driver.wait_for(&row, timeout).await?;
        let row_text = self.driver.text_of(&row).await?;

        Ok(format!(
            "created in category {}; row: {}",
            category,
            row_text.split_whitespace().collect::<Vec<_>>().join(" ")
        ))
    }

    async fn edit_product(&self) -> Result<String> {
        let timeout = self.config.wait_timeout_ms;

        self.driver
            .click(&Selector::row_action(PRODUCT_NAME, "Edit Product"))
            .await?;
        self.driver
            .wait_for(&Selector::field("price"), timeout)
            .await?;
        self.driver
            .fill(&Selector::field("price"), PRODUCT_PRICE_EDITED)
            .await?;

        self.driver.click(&Selector::button("Save")).await?;
        self.driver
            .wait_for(&Selector::text(TOAST_UPDATED), timeout)
            .await?;

        // The updated row must show the new price before the walk moves on.
        let updated_row = Selector::xpath(format!(
            "//tr[contains(., \"{}\")][contains(., \"{}\")]",
            PRODUCT_NAME, PRODUCT_PRICE_EDITED_DISPLAY
        ));
        self.driver.wait_for(&updated_row, timeout).await?;

        Ok(format!("price changed to {}", PRODUCT_PRICE_EDITED))
    }

    async fn sort_products(&self) -> Result<String> {
        let header = Selector::css("table thead th");
        let settle = Duration::from_millis(self.config.settle_delay_ms);

        self.driver.click(&header).await?;
        tokio::time::sleep(settle).await;
        self.driver.click(&header).await?;
        tokio::time::sleep(settle).await;

        Ok("sorted ascending then descending".to_string())
    }

    async fn delete_product(&self) -> Result<String> {
        let timeout = self.config.wait_timeout_ms;

        self.driver.accept_dialogs().await?;
        self.driver
            .click(&Selector::row_action(PRODUCT_NAME, "Delete Product"))
            .await?;
        self.driver
            .wait_for(&Selector::text(TOAST_DELETED), timeout)
            .await?;
        self.driver
            .wait_for_absence(&Selector::text(PRODUCT_NAME), timeout)
            .await?;

        Ok(format!("{} removed from the list", PRODUCT_NAME))
    }
}
