use crate::scout_browser::pointer::PointerEngine;
use anyhow::{anyhow, Result};
use fantoccini::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Polling interval and cap for the post-navigation readiness wait.
const READY_POLL_MILLIS: u64 = 100;
const READY_POLL_ROUNDS: u32 = 20;

/// Handle to one loaded page: script execution, DOM read-back, and pointer
/// movement against the current browsing context.
pub struct ScoutPage {
    pub(crate) client: Client,
    pointer: PointerEngine,
}

impl ScoutPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(client: Client, pointer: PointerEngine) -> Self {
        Self { client, pointer }
    }

    /// Navigate to `url`, bounded by `timeout`, and wait briefly for the
    /// document to reach `readyState === 'complete'` so inline scripts have
    /// settled before instrumentation lands.
    pub async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.client.goto(url))
            .await
            .map_err(|_| anyhow!("page load timed out after {}s", timeout.as_secs()))??;

        for _ in 0..READY_POLL_ROUNDS {
            match self
                .execute("return document.readyState === 'complete';", vec![])
                .await
            {
                Ok(v) if v.as_bool().unwrap_or(false) => break,
                _ => sleep(Duration::from_millis(READY_POLL_MILLIS)).await,
            }
        }
        Ok(())
    }

    /// Execute a script in the page and return its raw JSON result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .execute(script, args)
            .await
            .map_err(anyhow::Error::from)
    }

    /// Execute a script and deserialize its result.
    pub async fn eval<T: DeserializeOwned>(&self, script: &str, args: Vec<Value>) -> Result<T> {
        let value = self.execute(script, args).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Return the current page URL.
    pub async fn current_url(&self) -> Result<Url> {
        self.client.current_url().await.map_err(anyhow::Error::from)
    }

    /// Inner viewport dimensions as rendered, which may differ from the
    /// requested window size by the chrome decoration height.
    pub async fn viewport_size(&self) -> Result<(f64, f64)> {
        let dims: (f64, f64) = self
            .eval("return [window.innerWidth, window.innerHeight];", vec![])
            .await?;
        Ok(dims)
    }

    /// Glide the virtual pointer to viewport coordinates `(x, y)`.
    pub async fn move_pointer(&self, x: f64, y: f64, steps: u32) -> Result<()> {
        self.pointer.move_to(&self.client, x, y, steps).await
    }

    /// Dwell in place for a random duration in `[min_ms, max_ms]`.
    pub async fn dwell(&self, min_ms: u64, max_ms: u64) {
        self.pointer.random_delay(min_ms, max_ms).await;
    }

    /// Number of window handles open beyond the exploration window.
    pub async fn secondary_window_count(&self) -> Result<usize> {
        let handles = self.client.windows().await?;
        Ok(handles.len().saturating_sub(1))
    }
}
