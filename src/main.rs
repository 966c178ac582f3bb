//! `airmon`: browse stations, sensors, and readings, with offline fallback.

use std::env;
use std::error::Error;
use std::process;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use airmon_service::analysis::analyze;
use airmon_service::cache::CacheStore;
use airmon_service::config::Config;
use airmon_service::connectivity::Probe;
use airmon_service::coordinator::{Coordinator, Event, Fetched, Outcome, Source};
use airmon_service::ingest::gios::{parse_service_date, GiosClient};
use airmon_service::logging;

const USAGE: &str = "\
usage: airmon [--offline] <command>

commands:
  stations [city]                           list stations, optionally by city
  sensors <stationId>                       list a station's sensors
  measurements <sensorId> [start] [end]     list readings in a date range
  analyze <sensorId> [start] [end]          min / max / mean / trend

dates: YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, or RFC 3339 (UTC)";

#[derive(Debug, PartialEq)]
enum Command {
    Stations { city: Option<String> },
    Sensors { station_id: i64 },
    Measurements { sensor_id: i64, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>> },
    Analyze { sensor_id: i64, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>> },
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    logging::init(&config.log_level);

    let args: Vec<String> = env::args().skip(1).collect();
    let (force_offline, command) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            process::exit(2);
        }
    };

    let remote = Arc::new(GiosClient::from_config(&config)?);
    let cache = Arc::new(CacheStore::new(config.cache_dir.clone()));
    let coordinator = if force_offline {
        info!("starting in offline mode by request");
        Coordinator::new(remote, cache, true)
    } else {
        Coordinator::with_probe(remote, cache, &Probe::from_config(&config))
    }
    .with_deadline(config.timeout());

    match command {
        Command::Stations { city } => {
            let fetched = match city {
                Some(city) => coordinator.stations_by_city(&city)?,
                None => coordinator.stations()?,
            };
            if let Some(stations) = report(fetched) {
                for s in stations {
                    println!("{:>6}  {:<40}  {}", s.id(), s.name(), s.city());
                }
            }
        }
        Command::Sensors { station_id } => {
            if let Some(sensors) = report(coordinator.sensors(station_id)?) {
                for s in sensors {
                    println!("{:>6}  {:<8}  {}", s.id(), s.param_code(), s.param_name());
                }
            }
        }
        Command::Measurements { sensor_id, start, end } => {
            if let Some(readings) = report(coordinator.measurements(sensor_id, start, end)?) {
                for m in readings {
                    match m.reading() {
                        Some(v) => println!("{}  {:>8.2}", m.date().to_rfc3339(), v),
                        None => println!("{}  {:>8}", m.date().to_rfc3339(), "-"),
                    }
                }
            }
        }
        Command::Analyze { sensor_id, start, end } => {
            if let Some(readings) = report(coordinator.measurements(sensor_id, start, end)?) {
                let result = analyze(&readings);
                let when = |d: Option<DateTime<Utc>>| {
                    d.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".to_string())
                };
                println!("min   {:>8.2}  at {}", result.min_value, when(result.min_date));
                println!("max   {:>8.2}  at {}", result.max_value, when(result.max_date));
                println!("mean  {:>8.2}", result.avg_value);
                println!("trend {}", result.trend);
            }
        }
    }

    Ok(())
}

/// Prints events and the data source to stderr and hands back the items,
/// or `None` when there was nothing offline to show.
fn report<T>(fetched: Fetched<T>) -> Option<Vec<T>> {
    for event in &fetched.events {
        match event {
            Event::WentOffline(err) => {
                eprintln!("Service unavailable ({}); switched to offline mode.", err)
            }
            Event::PersistFailed(err) => {
                eprintln!("Warning: could not update the local cache: {}", err)
            }
        }
    }

    match fetched.outcome {
        Outcome::NoOfflineData => {
            eprintln!("No data available offline for this request.");
            None
        }
        Outcome::Items { source, items } => {
            if source == Source::Cache {
                eprintln!("(showing cached data)");
            }
            Some(items)
        }
    }
}

fn parse_args(args: &[String]) -> Result<(bool, Command), String> {
    let offline = args.iter().any(|a| a == "--offline");
    let rest: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|a| *a != "--offline")
        .collect();

    let command = match rest.as_slice() {
        ["stations"] => Command::Stations { city: None },
        ["stations", city] => Command::Stations { city: Some(city.to_string()) },
        ["sensors", id] => Command::Sensors { station_id: parse_id(id)? },
        ["measurements", id, range @ ..] if range.len() <= 2 => {
            let (start, end) = parse_range(range)?;
            Command::Measurements { sensor_id: parse_id(id)?, start, end }
        }
        ["analyze", id, range @ ..] if range.len() <= 2 => {
            let (start, end) = parse_range(range)?;
            Command::Analyze { sensor_id: parse_id(id)?, start, end }
        }
        [] => return Err("missing command".to_string()),
        other => return Err(format!("unrecognised arguments: {}", other.join(" "))),
    };

    Ok((offline, command))
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse().map_err(|_| format!("not a numeric id: {}", raw))
}

type Range = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

fn parse_range(raw: &[&str]) -> Result<Range, String> {
    let start = raw.first().map(|s| parse_bound(s, false)).transpose()?;
    let end = raw.get(1).map(|s| parse_bound(s, true)).transpose()?;
    Ok((start, end))
}

/// A bare date covers the whole day: midnight as a start, 23:59:59 as an end.
fn parse_bound(raw: &str, is_end: bool) -> Result<DateTime<Utc>, String> {
    if let Some(dt) = parse_service_date(raw) {
        return Ok(dt);
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("not a date: {}", raw))?;
    let time = if is_end { day.and_hms_opt(23, 59, 59) } else { day.and_hms_opt(0, 0, 0) };
    time.map(|t| t.and_utc()).ok_or_else(|| format!("not a date: {}", raw))
}
