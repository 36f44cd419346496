//! Timed triggers: the bulk refresh and the midnight rollover.

use crate::models::cache::cache_key;
use crate::models::period::Period;
use crate::models::request::FetchRequest;
use crate::services::feed_service::FeedService;
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone, Weekday};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info};

pub struct Scheduler {
    service: Arc<FeedService>,
}

impl Scheduler {
    pub fn new(service: Arc<FeedService>) -> Self {
        Self { service }
    }

    /// Enqueues every configured pair now and then every `period`.
    ///
    /// Freshness is left to the workers, so entries that are still valid
    /// come back as cache hits.
    pub fn spawn_bulk_refresh(&self, period: Duration) -> JoinHandle<()> {
        let service = self.service.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                info!("Bulk refresh");
                service.refresh_all();
            }
        })
    }

    /// Runs [`Scheduler::rollover`] at every local midnight, forever.
    pub fn spawn_daily_rollover(&self) -> JoinHandle<()> {
        let service = self.service.clone();
        tokio::spawn(async move {
            let scheduler = Scheduler::new(service);
            let mut day = next_day(scheduler.service.clock().now_local().date_naive());
            loop {
                let delay = delay_until_midnight_of(scheduler.service.clock().now_local(), day);
                info!(%day, delay_secs = delay.as_secs(), "Next rollover scheduled");
                sleep(delay).await;
                scheduler.rollover_on(day);
                // A wake slightly before midnight must not fire the same day again.
                let today = scheduler.service.clock().now_local().date_naive();
                day = next_day(day).max(next_day(today));
            }
        })
    }

    /// Rollover for the current (possibly simulated) date.
    pub fn rollover(&self) -> usize {
        self.rollover_on(self.service.clock().now_local().date_naive())
    }

    /// Moves each category's "tomorrow" text into "daily" and queues the
    /// periods whose boundary passed at the start of `today`. Returns the
    /// number of requests enqueued.
    pub fn rollover_on(&self, today: NaiveDate) -> usize {
        let config = self.service.config();
        let rotate =
            config.periods.contains(&Period::Tomorrow) && config.periods.contains(&Period::Daily);
        info!(%today, "Daily rollover");

        let mut count = 0;
        for category in &config.categories {
            if rotate {
                self.service.cache().rotate(
                    &cache_key(category, Period::Tomorrow),
                    &cache_key(category, Period::Daily),
                );
            }

            for period in &config.periods {
                let due = match period {
                    Period::Daily | Period::Tomorrow => true,
                    cyclic => starts_cycle(*cyclic, today) && !self.has_fresh(category, *cyclic),
                };
                if due {
                    self.service.enqueue(FetchRequest::new(category.clone(), *period));
                    count += 1;
                }
            }
        }
        debug!(count, "Rollover enqueued requests");
        count
    }

    fn has_fresh(&self, category: &str, period: Period) -> bool {
        self.service
            .cached(category, period)
            .is_some_and(|entry| self.service.is_fresh(&entry))
    }
}

/// Whether `date` is the first day of the cycle for `period`.
pub fn starts_cycle(period: Period, date: NaiveDate) -> bool {
    match period {
        Period::Daily | Period::Tomorrow => true,
        Period::Weekly => date.weekday() == Weekday::Mon,
        Period::Monthly => date.day() == 1,
        Period::Yearly => date.ordinal() == 1,
    }
}

/// Time left until the next local midnight after `now`.
pub fn delay_until_next_midnight(now: DateTime<Local>) -> Duration {
    delay_until_midnight_of(now, next_day(now.date_naive()))
}

/// Time left until the local midnight that starts `day`, zero if it passed.
pub fn delay_until_midnight_of(now: DateTime<Local>, day: NaiveDate) -> Duration {
    let midnight = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    // Skipped midnights (DST jumps) resolve to the first valid instant.
    let next = Local.from_local_datetime(&midnight).earliest().or_else(|| {
        Local
            .from_local_datetime(&(midnight + chrono::Duration::hours(1)))
            .earliest()
    });

    match next {
        Some(next) => (next - now).to_std().unwrap_or(Duration::ZERO),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cycle_starts() {
        // 2026-06-01 is a Monday.
        assert!(starts_cycle(Period::Weekly, date(2026, 6, 1)));
        assert!(!starts_cycle(Period::Weekly, date(2026, 6, 2)));
        assert!(starts_cycle(Period::Monthly, date(2026, 6, 1)));
        assert!(!starts_cycle(Period::Monthly, date(2026, 6, 15)));
        assert!(starts_cycle(Period::Yearly, date(2027, 1, 1)));
        assert!(!starts_cycle(Period::Yearly, date(2026, 6, 1)));
        assert!(starts_cycle(Period::Daily, date(2026, 6, 2)));
    }

    #[test]
    fn delay_to_midnight_from_late_evening() {
        let now = Local.with_ymd_and_hms(2026, 3, 10, 23, 59, 30).unwrap();
        assert_eq!(delay_until_next_midnight(now), Duration::from_secs(30));
    }

    #[test]
    fn delay_at_midnight_is_a_full_day() {
        let now = Local.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let delay = delay_until_next_midnight(now);
        // 23h or 25h on DST transition days in some zones.
        assert!(delay >= Duration::from_secs(23 * 3600));
        assert!(delay <= Duration::from_secs(25 * 3600));
    }

    #[test]
    fn passed_midnight_means_no_delay() {
        let now = Local.with_ymd_and_hms(2026, 3, 10, 0, 0, 10).unwrap();
        assert_eq!(delay_until_midnight_of(now, date(2026, 3, 10)), Duration::ZERO);
    }
}
