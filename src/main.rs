use chrono::{Local, NaiveDateTime, TimeZone};
use horoscope_feed::utils::display::DisplayFormatter;
use horoscope_feed::{logging, FeedConfig, FeedService, HttpExtractor, Scheduler};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init()?;

    info!("Starting horoscope feed");

    let config_path = std::env::var_os("HOROSCOPE_CONFIG").map(PathBuf::from);
    let config = FeedConfig::load(config_path.as_deref())?;
    let extractor = HttpExtractor::with_timeout(config.source.clone(), config.retry.attempt_timeout)?;

    let (service, mut events) = FeedService::new(config, Arc::new(extractor));
    let service = Arc::new(service);
    let pool = service.start();

    let scheduler = Scheduler::new(service.clone());
    let bulk = scheduler.spawn_bulk_refresh(service.config().bulk_refresh_interval);
    let rollover = scheduler.spawn_daily_rollover();

    let printer = tokio::spawn(async move {
        let display = DisplayFormatter::new();
        while let Some(event) = events.recv().await {
            println!("\n{}", display.format_event(&event));
        }
    });

    let display = DisplayFormatter::new();
    println!("=== Horoscope Feed ===");
    println!("Commands:");
    println!("  refresh <signs|all> <periods|all> - Queue fetches (comma separated)");
    println!("  show <sign>                       - Show cached text for a sign");
    println!("  cache                             - Show cache contents");
    println!("  clear                             - Clear the cache");
    println!("  clock <YYYY-MM-DDTHH:MM:SS|reset> - Simulate the current time");
    println!("  list                              - Show signs and periods");
    println!("  exit                              - Exit the program");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (None, _, _) => {}
            (Some("exit"), _, _) => {
                debug!("Received exit command");
                break;
            }
            (Some("list"), _, _) => {
                let config = service.config();
                println!("{}", display.format_header("Signs"));
                println!("{}", config.categories.join(", "));
                println!("{}", display.format_header("Periods"));
                let periods: Vec<_> = config.periods.iter().map(|p| p.as_str()).collect();
                println!("{}", periods.join(", "));
            }
            (Some("refresh"), cats, periods) => {
                let config = service.config();
                let cats = expand(cats, || config.categories.clone());
                let periods = expand(periods, || {
                    config.periods.iter().map(|p| p.to_string()).collect()
                });
                let count = service.request_refresh(&cats, &periods);
                println!("Queued {} request(s), {} waiting", count, service.queue().len());
            }
            (Some("show"), Some(sign), _) => {
                println!("{}", display.format_header(sign));
                for period in &service.config().periods {
                    match service.cached(sign, *period) {
                        Some(entry) => println!(
                            "[{}] ({})\n{}\n",
                            period,
                            display.format_freshness(service.is_fresh(&entry)),
                            entry.value
                        ),
                        None => println!("[{}] not cached\n", period),
                    }
                }
            }
            (Some("cache"), _, _) => {
                let rows: Vec<_> = service
                    .cache()
                    .snapshot()
                    .into_iter()
                    .map(|(key, entry)| {
                        let fresh = service.is_fresh(&entry);
                        (key, entry, fresh)
                    })
                    .collect();
                println!("{}", display.format_header(&format!("Cache ({} entries)", rows.len())));
                println!("{}", display.format_cache_table(&rows, service.clock().now()));
            }
            (Some("clear"), _, _) => service.clear_cache(),
            (Some("clock"), Some("reset"), _) => service.set_simulated_clock(None),
            (Some("clock"), Some(when), _) => {
                match NaiveDateTime::parse_from_str(when, "%Y-%m-%dT%H:%M:%S")
                    .ok()
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                {
                    Some(date) => service.set_simulated_clock(Some(date)),
                    None => println!("Expected a local time like 2026-12-31T23:59:30"),
                }
            }
            (Some(other), _, _) => println!("Unknown command: {}", other),
        }
    }

    info!("Shutting down");
    bulk.abort();
    rollover.abort();
    pool.shutdown();
    printer.abort();
    Ok(())
}

/// Splits a comma separated argument, with `all` (or nothing) meaning every value.
fn expand(arg: Option<&str>, all: impl FnOnce() -> Vec<String>) -> Vec<String> {
    match arg {
        None | Some("all") => all(),
        Some(list) => list
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
