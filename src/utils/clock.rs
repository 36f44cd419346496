use chrono::{DateTime, Duration, Local, Utc};
use std::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

/// Simulated "now" at `anchor`.
#[derive(Debug, Clone, Copy)]
struct Simulated {
    start: DateTime<Utc>,
    anchor: Instant,
}

/// Wall clock with an optional simulated override.
///
/// A simulated date keeps ticking from the chosen instant, driven by the
/// tokio clock, so it also advances when a test pauses and skips time.
#[derive(Debug, Default)]
pub struct Clock {
    simulated: RwLock<Option<Simulated>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, simulated if an override is active.
    pub fn now(&self) -> DateTime<Utc> {
        let simulated = self.simulated.read().map(|s| *s).unwrap_or(None);
        match simulated {
            Some(sim) => {
                let elapsed = Duration::from_std(sim.anchor.elapsed()).unwrap_or(Duration::zero());
                sim.start + elapsed
            }
            None => Utc::now(),
        }
    }

    pub fn now_local(&self) -> DateTime<Local> {
        self.now().with_timezone(&Local)
    }

    /// Overrides "now" with `date`, or restores the real clock with `None`.
    pub fn set_simulated(&self, date: Option<DateTime<Local>>) {
        let simulated = date.map(|d| Simulated {
            start: d.with_timezone(&Utc),
            anchor: Instant::now(),
        });
        if let Ok(mut guard) = self.simulated.write() {
            *guard = simulated;
        }
        match date {
            Some(d) => info!(simulated = %d, "Simulated clock set"),
            None => info!("Simulated clock cleared"),
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated.read().map(|s| s.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn simulated_clock_starts_at_chosen_date() {
        let clock = Clock::new();
        let target = Local.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        clock.set_simulated(Some(target));

        assert!(clock.is_simulated());
        let drift = (clock.now_local() - target).num_seconds().abs();
        assert!(drift < 5);
    }

    #[test]
    fn reset_returns_to_real_time() {
        let clock = Clock::new();
        let target = Local.with_ymd_and_hms(2001, 6, 1, 0, 0, 0).unwrap();
        clock.set_simulated(Some(target));
        clock.set_simulated(None);

        assert!(!clock.is_simulated());
        assert!((clock.now() - Utc::now()).num_seconds().abs() < 5);
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_clock_follows_runtime_time() {
        let clock = Clock::new();
        let target = Local.with_ymd_and_hms(2100, 2, 27, 23, 59, 0).unwrap();
        clock.set_simulated(Some(target));

        tokio::time::sleep(std::time::Duration::from_secs(90)).await;

        let expected = Local.with_ymd_and_hms(2100, 2, 28, 0, 0, 30).unwrap();
        assert_eq!(clock.now_local(), expected);
    }
}
