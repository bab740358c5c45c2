//! In-page instrumentation: pointer-event capture, mutation tracking, and
//! native dialog recording.
//!
//! [`install`] injects a single page-scoped log (`window.__scout_log`) and is
//! idempotent: a second call on the same page is a no-op. Every listener and
//! observer callback swallows its own failures so one hostile element can
//! never stop capture for the rest of the session. The log is append-only
//! and read back exactly once, after exploration, by the `collect_*`
//! functions.

use anyhow::Result;
use hoverscout_drivers::scout_browser::page::ScoutPage;
use serde_json::Value;
use tracing::debug;

use crate::events::{DialogRecord, InteractionEvent, MutationRecord};

/// Everything the page needs to start logging. `arguments` unused; returns
/// `false` when the log already exists (double-install guard).
const INSTALL_SCRIPT: &str = r#"
if (window.__scout_log) { return false; }
window.__scout_log = { events: [], mutations: [], dialogs: [] };
(function () {
    var log = window.__scout_log;

    function fingerprint(el) {
        if (!el || el.nodeType !== 1) return null;
        var txt = (el.innerText || el.textContent || '')
            .trim().replace(/\s+/g, ' ').slice(0, 200);
        var tag = el.tagName.toLowerCase();
        var cls = (el.className || '').toString()
            .split(/\s+/).filter(Boolean).slice(0, 3).join('.');
        var idx = 1, sib = el;
        while (sib.previousElementSibling) { idx++; sib = sib.previousElementSibling; }
        var r = el.getBoundingClientRect();
        return { tag: tag, cls: cls, idx: idx, txt: txt, bbox: {
            x: Math.round(r.x), y: Math.round(r.y),
            w: Math.round(r.width), h: Math.round(r.height)
        } };
    }

    function onEnter(type) {
        return function (ev) {
            try {
                log.events.push({ type: type, time: Date.now(), target: fingerprint(ev.target) });
            } catch (e) {}
        };
    }
    document.addEventListener('pointerover', onEnter('pointerover'), true);
    document.addEventListener('mouseenter', onEnter('mouseenter'), true);

    var mo = new MutationObserver(function (muts) {
        muts.forEach(function (m) {
            try {
                if (m.addedNodes) {
                    m.addedNodes.forEach(function (n) {
                        if (n.outerHTML) {
                            log.mutations.push({ type: 'added', time: Date.now(),
                                html: n.outerHTML.slice(0, 1500) });
                        }
                    });
                }
                if (m.removedNodes) {
                    m.removedNodes.forEach(function (n) {
                        if (n.outerHTML) {
                            log.mutations.push({ type: 'removed', time: Date.now(),
                                html: n.outerHTML.slice(0, 1500) });
                        }
                    });
                }
                if (m.type === 'attributes') {
                    log.mutations.push({ type: 'attr', time: Date.now(),
                        name: m.attributeName,
                        html: (m.target && m.target.outerHTML)
                            ? m.target.outerHTML.slice(0, 600) : '' });
                }
            } catch (e) {}
        });
    });
    mo.observe(document.documentElement || document.body,
        { childList: true, subtree: true, attributes: true, attributeOldValue: true });

    // Native dialogs are recorded and dismissed inline so exploration never
    // blocks on a modal: confirm answers no, prompt answers null.
    function recordDialog(kind, verdict) {
        return function (message, fallback) {
            try {
                log.dialogs.push({ kind: kind,
                    message: String(message == null ? '' : message),
                    value: fallback == null ? null : String(fallback) });
            } catch (e) {}
            return verdict;
        };
    }
    window.alert = recordDialog('alert', undefined);
    window.confirm = recordDialog('confirm', false);
    window.prompt = recordDialog('prompt', null);
})();
return true;
"#;

/// Script execution surface the installer drives. [`ScoutPage`] is the
/// production implementation; tests substitute a scripted host.
pub(crate) trait ScriptHost {
    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value>;
}

impl ScriptHost for ScoutPage {
    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        ScoutPage::execute(self, script, args).await
    }
}

/// Install event capture into the page. Returns `true` when this call
/// performed the installation and `false` when a previous call already had.
pub async fn install(page: &ScoutPage) -> Result<bool> {
    install_over(page).await
}

pub(crate) async fn install_over<H: ScriptHost>(host: &H) -> Result<bool> {
    let value = host.execute(INSTALL_SCRIPT, vec![]).await?;
    let fresh = value.as_bool().unwrap_or(false);
    debug!(target: "explore.instrument", fresh, "instrumentation installed");
    Ok(fresh)
}

/// Read back the accumulated pointer-event log.
pub async fn collect_events(page: &ScoutPage) -> Result<Vec<InteractionEvent>> {
    page.eval(
        "return (window.__scout_log && window.__scout_log.events) || [];",
        vec![],
    )
    .await
}

/// Read back the accumulated mutation log.
pub async fn collect_mutations(page: &ScoutPage) -> Result<Vec<MutationRecord>> {
    page.eval(
        "return (window.__scout_log && window.__scout_log.mutations) || [];",
        vec![],
    )
    .await
}

/// Read back any native dialogs that were captured and auto-dismissed.
pub async fn collect_dialogs(page: &ScoutPage) -> Result<Vec<DialogRecord>> {
    page.eval(
        "return (window.__scout_log && window.__scout_log.dialogs) || [];",
        vec![],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Mirrors the page-side guard: the log exists after the first run, so
    /// every later run reports `false`.
    struct GuardedHost {
        installed: Cell<bool>,
    }

    impl ScriptHost for GuardedHost {
        async fn execute(&self, script: &str, _args: Vec<Value>) -> Result<Value> {
            assert!(script.contains("window.__scout_log"));
            Ok(Value::Bool(!self.installed.replace(true)))
        }
    }

    #[tokio::test]
    async fn repeated_installs_report_fresh_exactly_once() {
        let host = GuardedHost { installed: Cell::new(false) };
        assert!(install_over(&host).await.unwrap());
        assert!(!install_over(&host).await.unwrap());
        assert!(!install_over(&host).await.unwrap());
    }
}
