//! Selector-free exploration core.
//!
//! Given nothing but a URL, instrument the live page, drive a layered
//! pointer policy across it, fold the captured events into ranked hover
//! discoveries, scan for popups and overlays, optionally verify revealed
//! links in an isolated session, and synthesize a Given/When/Then report of
//! everything observed.
//!
//! One call to [`explore`] is one self-contained run: the browser session,
//! the in-page logs, and every intermediate entity live exactly as long as
//! the run and nothing persists across runs. Once the page has loaded, no
//! failure inside a phase can crash the run; each phase contributes its
//! best partial result plus an error note, and the worst case is a report
//! consisting of a single manual-verification note.

pub mod discover;
pub mod events;
pub mod instrument;
pub mod popups;
pub mod scenario;
pub mod sweep;
pub mod verify;

use std::time::Duration;

use anyhow::Result;
use hoverscout_common::{ScoutError, Viewport};
use hoverscout_drivers::scout_browser::driver::ScoutDriver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

pub use discover::{Discovery, RevealedNode};
pub use events::{InteractionEvent, MutationRecord};
pub use popups::{PopupCandidate, PopupKind};
pub use verify::{LinkVerification, VerificationOutcome};

/// Hard bound on the initial page load.
const NAV_TIMEOUT: Duration = Duration::from_secs(60);

/// Caller-facing knobs for one exploration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreOptions {
    pub headless: bool,
    pub viewport: Viewport,
    /// Wall-clock time allotted to the pointer sweep.
    pub budget: Duration,
    /// Opt into opening revealed links in an isolated session.
    pub click_verify: bool,
    /// Per-link navigation timeout for click verification.
    pub verify_timeout: Duration,
}

impl Default for ExploreOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            budget: Duration::from_secs(6),
            click_verify: false,
            verify_timeout: Duration::from_secs(3),
        }
    }
}

/// Everything one run produced. `errors` holds the non-fatal notes; an
/// empty discovery and popup list with errors present still yields a valid
/// (manual-verification) report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationResult {
    pub url: String,
    pub discoveries: Vec<Discovery>,
    pub popups: Vec<PopupCandidate>,
    pub verifications: Vec<LinkVerification>,
    /// Diagnostics only; never correlated with events by this design.
    pub mutations: Vec<MutationRecord>,
    pub errors: Vec<String>,
    pub feature_text: String,
}

impl ExplorationResult {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            discoveries: Vec::new(),
            popups: Vec::new(),
            verifications: Vec::new(),
            mutations: Vec::new(),
            errors: Vec::new(),
            feature_text: String::new(),
        }
    }
}

/// Run one full exploration against `url`.
///
/// Returns `Err` only when a browser session cannot be created at all. A
/// failed navigation releases the session and comes back as `Ok` with a
/// run-level error note, matching the best-effort contract of every later
/// phase.
pub async fn explore(url: &str, options: &ExploreOptions) -> Result<ExplorationResult> {
    let driver = ScoutDriver::new(options.headless, options.viewport).await?;
    let mut result = ExplorationResult::new(url);

    let page = match driver.open(url, NAV_TIMEOUT).await {
        Ok(page) => page,
        Err(e) => {
            result
                .errors
                .push(ScoutError::Navigation(e.to_string()).to_string());
            let _ = driver.close().await;
            return Ok(result);
        }
    };
    info!(target: "explore", url, budget = ?options.budget, "page loaded, starting exploration");

    // Degraded but survivable: without capture, aggregation finds nothing.
    if let Err(e) = instrument::install(&page).await {
        warn!(target: "explore", error = %e, "continuing without instrumentation");
        result
            .errors
            .push(ScoutError::Instrumentation(e.to_string()).to_string());
    }

    sweep::run(&page, options.budget).await;

    let events = match instrument::collect_events(&page).await {
        Ok(events) => events,
        Err(e) => {
            result
                .errors
                .push(ScoutError::Query(format!("event log read-back: {e}")).to_string());
            Vec::new()
        }
    };
    result.mutations = instrument::collect_mutations(&page).await.unwrap_or_default();
    debug!(
        target: "explore",
        events = events.len(),
        mutations = result.mutations.len(),
        "collected instrumentation logs"
    );

    let areas = discover::trigger_areas(&events);
    let snapshot = match discover::dom_snapshot(&page, &areas).await {
        Ok(nodes) => nodes,
        Err(e) => {
            result
                .errors
                .push(ScoutError::Query(format!("DOM snapshot: {e}")).to_string());
            Vec::new()
        }
    };
    result.discoveries = discover::build_discoveries(&events, &snapshot);

    let dialogs = instrument::collect_dialogs(&page).await.unwrap_or_default();
    let dialog_nodes = match popups::dialog_scan(&page).await {
        Ok(nodes) => nodes,
        Err(e) => {
            result
                .errors
                .push(ScoutError::Query(format!("dialog scan: {e}")).to_string());
            Vec::new()
        }
    };
    let overlay_nodes = match popups::overlay_scan(&page).await {
        Ok(nodes) => nodes,
        Err(e) => {
            result
                .errors
                .push(ScoutError::Query(format!("overlay scan: {e}")).to_string());
            Vec::new()
        }
    };
    let window_count = page.secondary_window_count().await.unwrap_or(0);
    result.popups = popups::assemble(&dialogs, dialog_nodes, overlay_nodes, window_count);

    if options.click_verify {
        match base_url(&page, url).await {
            Some(base) => {
                let (verified, errors) = verify::verify_links(
                    &base,
                    &result.discoveries,
                    options.headless,
                    options.verify_timeout,
                )
                .await;
                result.verifications = verified;
                result.errors.extend(errors);
            }
            None => result
                .errors
                .push(ScoutError::Verification("no base URL to resolve links against".into())
                    .to_string()),
        }
    }

    result.feature_text = scenario::synthesize(url, &result.discoveries, &result.popups);
    info!(
        target: "explore",
        discoveries = result.discoveries.len(),
        popups = result.popups.len(),
        errors = result.errors.len(),
        "exploration complete"
    );

    let _ = driver.close().await;
    Ok(result)
}

/// The page's current URL, falling back to the requested one.
async fn base_url(
    page: &hoverscout_drivers::scout_browser::page::ScoutPage,
    requested: &str,
) -> Option<Url> {
    if let Ok(url) = page.current_url().await {
        return Some(url);
    }
    Url::parse(requested).ok()
}
