use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use campgrid::config::SchedulerConfig;
use campgrid::dates;
use campgrid::engine::Scheduler;
use campgrid::model::{StayRange, UiEvent};
use campgrid::notify::OutcomeHub;
use campgrid::store::{InMemoryStore, Seed};

/// Replays UI events against a seeded in-memory calendar.
///
/// stdin: one `UiEvent` JSON object per line.
/// stdout: one `Outcome` JSON object per line, for events that produced one.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let metrics_port: Option<u16> = std::env::var("CAMPGRID_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    campgrid::observability::init(metrics_port)?;

    let config = SchedulerConfig::from_env()?;
    let seed = match std::env::var("CAMPGRID_SEED") {
        Ok(path) => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let seed: Seed = serde_json::from_str(&raw)?;
            info!("seed: {path}");
            seed
        }
        Err(_) => {
            warn!("CAMPGRID_SEED not set, starting from an empty calendar");
            Seed::default()
        }
    };
    let window = seed_window(&seed).ok_or("seed dates leave no room for a calendar window")?;

    info!("campgrid replay");
    info!("  window: {window}");
    info!("  column width: {}px, gutter: {}px", config.day_column_width, config.gutter_px);
    info!("  resize commit: {:?}", config.resize_commit);
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let store = Arc::new(InMemoryStore::from_seed(seed));
    let mut scheduler = Scheduler::new(store, Arc::new(OutcomeHub::new()), &config);
    scheduler.load(window).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: UiEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("line {line_no}: skipping unparseable event: {e}");
                continue;
            }
        };
        if let Some(outcome) = scheduler.handle(event).await {
            let mut out = serde_json::to_vec(&outcome)?;
            out.push(b'\n');
            stdout.write_all(&out).await?;
            stdout.flush().await?;
        }
    }

    info!("replayed {line_no} lines");
    Ok(())
}

/// Smallest window covering every seeded stay, or a month either side of
/// today for an empty seed.
fn seed_window(seed: &Seed) -> Option<StayRange> {
    let starts = seed
        .bookings
        .iter()
        .map(|b| b.start_date)
        .chain(seed.reservations.iter().map(|r| r.start_date));
    let ends = seed
        .bookings
        .iter()
        .map(|b| b.end_date)
        .chain(seed.reservations.iter().map(|r| r.end_date));
    let today = Utc::now().date_naive();
    let start = starts.min().unwrap_or(today - Duration::days(30));
    let end = ends.max().unwrap_or(today + Duration::days(30));
    StayRange::try_new(start, end)
        .or_else(|| StayRange::spanning(start, dates::add_days(start, 1)))
        .or_else(|| StayRange::spanning(start, dates::add_days(start, -1)))
}
