//! Layered pointer exploration policy: coarse grid sweep, hotspot-focused
//! micro-walks, then a peripheral spiral, all against one shared deadline.
//!
//! No phase retries a failed move; each consults the deadline before every
//! move and every dwell and bails out cooperatively. The only overrun past
//! the budget is the in-flight move.

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use hoverscout_drivers::scout_browser::page::ScoutPage;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::instrument;

/// Centers visited per hotspot pass.
const HOTSPOT_CAP: usize = 10;
/// Boxes this small are sensor noise, not reactive elements.
const MIN_REACTIVE_PX: i64 = 3;
/// Micro-walk jitter radius in pixels.
const JITTER_PX: f64 = 12.0;

/// Grid resolution for a given budget: R = clamp(round(sqrt(T) * 2), 3, 6).
pub(crate) fn grid_rows(budget: Duration) -> u32 {
    let r = (budget.as_secs_f64().sqrt() * 2.0).round() as i64;
    r.clamp(3, 6) as u32
}

fn clamp_to(v: f64, max: f64) -> f64 {
    v.clamp(0.0, (max - 1.0).max(0.0))
}

/// Motion surface the sweep drives. [`ScoutPage`] is the production
/// implementation; tests substitute a scripted one.
pub(crate) trait SweepSurface {
    async fn viewport_size(&self) -> Option<(f64, f64)>;
    async fn move_pointer(&self, x: f64, y: f64, steps: u32) -> anyhow::Result<()>;
    async fn dwell(&self, min_ms: u64, max_ms: u64);
    /// Centers of boxes already observed reacting, for the hotspot pass.
    async fn hotspot_centers(&self) -> Vec<(f64, f64)>;
}

impl SweepSurface for ScoutPage {
    async fn viewport_size(&self) -> Option<(f64, f64)> {
        ScoutPage::viewport_size(self).await.ok()
    }

    async fn move_pointer(&self, x: f64, y: f64, steps: u32) -> anyhow::Result<()> {
        ScoutPage::move_pointer(self, x, y, steps).await
    }

    async fn dwell(&self, min_ms: u64, max_ms: u64) {
        ScoutPage::dwell(self, min_ms, max_ms).await
    }

    async fn hotspot_centers(&self) -> Vec<(f64, f64)> {
        instrument::collect_events(self)
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|ev| ev.target.as_ref())
            .filter(|fp| fp.bbox.w > MIN_REACTIVE_PX && fp.bbox.h > MIN_REACTIVE_PX)
            .map(|fp| fp.bbox.center())
            .collect()
    }
}

/// Drive the virtual pointer across the page for at most `budget`.
///
/// Individual move failures are swallowed; the sweep always runs to its
/// deadline or the end of its phases, whichever comes first.
pub async fn run(page: &ScoutPage, budget: Duration) {
    run_over(page, budget).await;
}

pub(crate) async fn run_over<S: SweepSurface>(surface: &S, budget: Duration) {
    let deadline = Instant::now() + budget;
    let (w, h) = surface.viewport_size().await.unwrap_or((1280.0, 800.0));

    grid_sweep(surface, w, h, budget, deadline).await;
    if Instant::now() < deadline {
        hotspot_walk(surface, w, h, deadline).await;
    }
    spiral(surface, w, h, deadline).await;
}

/// Phase 1: visit every cell center of an RxR raster with slight jitter,
/// dwelling after each move so reveal animations can settle.
async fn grid_sweep<S: SweepSurface>(
    surface: &S,
    w: f64,
    h: f64,
    budget: Duration,
    deadline: Instant,
) {
    let rows = grid_rows(budget);
    let cell_w = w / rows as f64;
    let cell_h = h / rows as f64;
    let mut rng = OsRng;

    debug!(target: "explore.sweep", rows, "starting grid sweep");
    for row in 0..rows {
        for col in 0..rows {
            if Instant::now() >= deadline {
                return;
            }
            let jitter_w = cell_w * 0.15;
            let jitter_h = cell_h * 0.15;
            let cx = (col as f64 + 0.5) * cell_w + rng.gen_range(-jitter_w..=jitter_w);
            let cy = (row as f64 + 0.5) * cell_h + rng.gen_range(-jitter_h..=jitter_h);
            let steps = rng.gen_range(6..=20);
            if let Err(e) = surface.move_pointer(clamp_to(cx, w), clamp_to(cy, h), steps).await {
                trace!(target: "explore.sweep", error = %e, "grid move failed");
            }
            if Instant::now() >= deadline {
                return;
            }
            surface.dwell(250, 500).await;
        }
    }
}

/// Phase 2: revisit up to ten centers of boxes already seen reacting,
/// jittering around each with one to three small moves.
async fn hotspot_walk<S: SweepSurface>(surface: &S, w: f64, h: f64, deadline: Instant) {
    let mut centers = surface.hotspot_centers().await;
    let mut rng = OsRng;
    centers.shuffle(&mut rng);
    centers.truncate(HOTSPOT_CAP);
    debug!(target: "explore.sweep", hotspots = centers.len(), "starting hotspot micro-walk");

    for (cx, cy) in centers {
        if Instant::now() >= deadline {
            return;
        }
        for _ in 0..rng.gen_range(1..=3) {
            let nx = cx + rng.gen_range(-JITTER_PX..=JITTER_PX);
            let ny = cy + rng.gen_range(-JITTER_PX..=JITTER_PX);
            let steps = rng.gen_range(4..=12);
            if let Err(e) = surface.move_pointer(clamp_to(nx, w), clamp_to(ny, h), steps).await {
                trace!(target: "explore.sweep", error = %e, "hotspot move failed");
            }
            if Instant::now() >= deadline {
                return;
            }
            surface.dwell(180, 300).await;
        }
    }
}

/// Phase 3: spend the remaining budget on random polar offsets from center,
/// surfacing edge and corner overlays the raster may have skimmed past.
async fn spiral<S: SweepSurface>(surface: &S, w: f64, h: f64, deadline: Instant) {
    let mut rng = OsRng;
    while Instant::now() < deadline {
        let angle = rng.gen::<f64>() * TAU;
        let radius = w.min(h) * (0.1 + rng.gen::<f64>() * 0.4);
        let cx = w / 2.0 + angle.cos() * radius;
        let cy = h / 2.0 + angle.sin() * radius;
        let steps = rng.gen_range(6..=18);
        if let Err(e) = surface.move_pointer(clamp_to(cx, w), clamp_to(cy, h), steps).await {
            trace!(target: "explore.sweep", error = %e, "spiral move failed");
        }
        if Instant::now() >= deadline {
            return;
        }
        surface.dwell(200, 350).await;
    }
}
