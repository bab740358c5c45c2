use crate::scout_browser::{page::ScoutPage, pointer::PointerEngine};
use anyhow::Result;
use fantoccini::{Client, ClientBuilder};
use hoverscout_common::Viewport;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use webdriver::capabilities::Capabilities;

const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// Each driver owns one browser session. An exploration run and a link
/// verification pass each use their own driver so their cookies, storage,
/// and navigation history never mix.
pub struct ScoutDriver {
    pub client: Client,
    pointer: PointerEngine,
    viewport: Viewport,
}

impl ScoutDriver {
    /// Create a new driver connected to a running WebDriver service.
    ///
    /// The endpoint is taken from `SCOUT_WEBDRIVER_URL` when set, otherwise
    /// `http://localhost:9515` (Chromedriver).
    pub async fn new(headless: bool, viewport: Viewport) -> Result<Self> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();

        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            format!("--window-size={},{}", viewport.width, viewport.height),
        ];
        if headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }
        chrome_opts.insert("args".to_string(), json!(args));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
        // A native dialog raised before our prompt recorders are installed
        // must never block the session.
        caps.insert("unhandledPromptBehavior".to_string(), json!("dismiss"));

        let endpoint = webdriver_url();
        debug!(target: "browser.driver", %endpoint, headless, "connecting WebDriver session");

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&endpoint)
            .await?;

        Ok(Self {
            client,
            pointer: PointerEngine::new(),
            viewport,
        })
    }

    /// Viewport the session was created with.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Navigate to `url` and return a [`ScoutPage`] handle for it.
    pub async fn open(&self, url: &str, nav_timeout: Duration) -> Result<ScoutPage> {
        let mut page = ScoutPage::new(self.client.clone(), self.pointer.clone());
        page.goto(url, nav_timeout).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Resolve the WebDriver endpoint, honouring `SCOUT_WEBDRIVER_URL`.
pub fn webdriver_url() -> String {
    std::env::var("SCOUT_WEBDRIVER_URL").unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string())
}
