use anyhow::Result;
use fantoccini::actions::{InputSource, MouseActions, PointerAction};
use fantoccini::Client;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Milliseconds of pointer travel per interpolation step.
const STEP_MILLIS: u64 = 12;

#[derive(Debug, Clone)]
/// Moves the virtual pointer with human-like pacing.
///
/// WebDriver interpolates a single `MoveTo` action over its duration, so a
/// requested step count maps onto travel time rather than discrete moves.
pub struct PointerEngine {}

impl PointerEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        let mut rng = OsRng;
        let ms = rng.gen_range(min..=max);
        sleep(Duration::from_millis(ms)).await;
    }

    /// Glide the pointer to viewport coordinates `(x, y)` over `steps`
    /// interpolation steps.
    pub async fn move_to(&self, client: &Client, x: f64, y: f64, steps: u32) -> Result<()> {
        let travel = Duration::from_millis(u64::from(steps.max(1)) * STEP_MILLIS);
        let motion = MouseActions::new("pointer".to_string()).then(PointerAction::MoveTo {
            duration: Some(travel),
            x: x.round(),
            y: y.round(),
        });
        client.perform_actions(motion).await?;
        Ok(())
    }
}

impl Default for PointerEngine {
    fn default() -> Self {
        Self::new()
    }
}
