//! Opt-in click verification: confirm that revealed hyperlinks actually
//! navigate, inside a browser session the exploration page never touches.
//!
//! Verification is inherently destructive to navigation state, so every
//! link is opened in a brand-new WebDriver session with its own cookies,
//! storage, and history. That session is released before control returns to
//! the caller, which still owns the outer exploration session.

use std::time::Duration;

use hoverscout_common::Viewport;
use hoverscout_drivers::scout_browser::driver::ScoutDriver;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::discover::Discovery;

/// Outcome of a single link navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum VerificationOutcome {
    /// Navigation completed; `url` is where the browser ended up.
    Opened { url: String },
    /// Navigation raised an error before the timeout.
    Failed { reason: String },
    /// Navigation did not settle within the caller-supplied timeout.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkVerification {
    /// The href exactly as captured from the revealed node.
    pub href: String,
    pub outcome: VerificationOutcome,
}

/// Fragment-only and script pseudo-links cannot meaningfully navigate.
pub fn is_verifiable(href: &str) -> bool {
    !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:")
}

/// Attempt every verifiable revealed hyperlink in an isolated session.
///
/// A failed or timed-out navigation is recorded per link and never aborts
/// the remaining attempts. If the isolated session itself cannot be created
/// the whole pass is skipped with one error note.
pub async fn verify_links(
    base: &Url,
    discoveries: &[Discovery],
    headless: bool,
    timeout: Duration,
) -> (Vec<LinkVerification>, Vec<String>) {
    let mut verified = Vec::new();
    let mut errors = Vec::new();

    let driver = match ScoutDriver::new(headless, Viewport::default()).await {
        Ok(driver) => driver,
        Err(e) => {
            errors.push(format!("verification session unavailable: {e}"));
            return (verified, errors);
        }
    };

    for discovery in discoveries {
        for node in &discovery.revealed {
            let Some(href) = node.href.as_deref() else {
                continue;
            };
            if !is_verifiable(href) {
                continue;
            }
            let target = match base.join(href) {
                Ok(url) => url,
                Err(e) => {
                    verified.push(LinkVerification {
                        href: href.to_string(),
                        outcome: VerificationOutcome::Failed {
                            reason: format!("unresolvable href: {e}"),
                        },
                    });
                    continue;
                }
            };

            debug!(target: "explore.verify", url = %target, "verifying revealed link");
            let outcome = match tokio::time::timeout(timeout, driver.client.goto(target.as_str()))
                .await
            {
                Err(_) => VerificationOutcome::TimedOut,
                Ok(Err(e)) => VerificationOutcome::Failed { reason: e.to_string() },
                Ok(Ok(())) => match driver.client.current_url().await {
                    Ok(url) => VerificationOutcome::Opened { url: url.to_string() },
                    Err(e) => VerificationOutcome::Failed { reason: e.to_string() },
                },
            };
            if !matches!(outcome, VerificationOutcome::Opened { .. }) {
                warn!(target: "explore.verify", href, ?outcome, "link verification failed");
            }
            verified.push(LinkVerification { href: href.to_string(), outcome });
        }
    }

    // The nested session must be released before the outer one closes.
    let _ = driver.close().await;
    (verified, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_links_are_not_verifiable() {
        assert!(!is_verifiable(""));
        assert!(!is_verifiable("#"));
        assert!(!is_verifiable("#section-2"));
        assert!(!is_verifiable("javascript:void(0)"));
        assert!(is_verifiable("/pricing"));
        assert!(is_verifiable("https://example.com/a"));
    }

    #[test]
    fn relative_hrefs_resolve_against_the_page_url() {
        let base = Url::parse("https://example.com/shop/index.html").unwrap();
        assert_eq!(
            base.join("cart").unwrap().as_str(),
            "https://example.com/shop/cart"
        );
        assert_eq!(
            base.join("/help").unwrap().as_str(),
            "https://example.com/help"
        );
    }
}
