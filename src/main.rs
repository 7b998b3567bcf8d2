use std::env;
use std::error::Error;
use std::path::Path;
use std::process;

use chrono::NaiveDate;

use zone_log::db;
use zone_log::store::{self, SqliteStateStore};
use zone_log::strava::{StravaClient, StravaConfig};
use zone_log::sync::sync_window;
use zone_log::weekly::weekly_totals;
use zone_log::{ConnectionStatus, ZoneThresholds};

const USAGE: &str = "usage: zone-log <command>

  week [YYYY-MM-DD]                    weekly totals for the window
  add <type> <YYYY-MM-DD> <minutes> [notes...]
  delete <id>
  thresholds <z2> <z3> <z4> <z5>       zone lower bounds in BPM
  window <YYYY-MM-DD>                  set the window start
  sync                                 pull Strava activities for the window
  export <path>                        write the full state as JSON
  import <path>                        load state from a JSON document
  status";

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  if let Err(e) = run().await {
    eprintln!("error: {}", e);
    process::exit(1);
  }
}

async fn run() -> Result<(), Box<dyn Error>> {
  let args: Vec<String> = env::args().skip(1).collect();
  let command = args.first().map(String::as_str).unwrap_or("week");

  let pool = db::connect().await?;
  let store = SqliteStateStore::new(pool);
  let mut state = store::load_or_default(&store).await;

  match command {
    "week" => {
      let start = match args.get(1) {
        Some(raw) => parse_date(raw)?,
        None => state.window_start,
      };
      let totals = weekly_totals(&state.sessions, start);
      println!("{}", serde_json::to_string_pretty(&totals)?);
    }

    "add" => {
      let activity = args.get(1).ok_or(USAGE)?;
      let date = args.get(2).ok_or(USAGE)?;
      let minutes: f64 = args.get(3).ok_or(USAGE)?.parse()?;
      let notes = args[4.min(args.len())..].join(" ");

      let session = state.add_session(&serde_json::json!({
        "activityType": activity,
        "date": date,
        "durationMinutes": minutes,
        "notes": notes,
      }));
      store::save_quietly(&store, &state).await;
      println!("added session {}", session.id);
    }

    "delete" => {
      let id = args.get(1).ok_or(USAGE)?;
      if state.delete_session(id) {
        store::save_quietly(&store, &state).await;
        println!("deleted {}", id);
      } else {
        println!("no session with id {}", id);
      }
    }

    "thresholds" => {
      let bound = |i: usize| -> Result<f64, Box<dyn Error>> {
        Ok(args.get(i).ok_or(USAGE)?.parse()?)
      };
      state.set_thresholds(ZoneThresholds {
        z2_low: bound(1)?,
        z3_low: bound(2)?,
        z4_low: bound(3)?,
        z5_low: bound(4)?,
      });
      store::save_quietly(&store, &state).await;
      println!("{}", serde_json::to_string_pretty(&state.thresholds)?);
    }

    "window" => {
      let start = parse_date(args.get(1).ok_or(USAGE)?)?;
      state.set_window_start(start);
      store::save_quietly(&store, &state).await;
      println!("window start set to {}", start);
    }

    "sync" => {
      let client = StravaClient::new(StravaConfig::from_env()?);
      let outcome = sync_window(
        &client,
        &state.sessions,
        &state.thresholds,
        state.window_start,
      )
      .await?;

      state.sessions = outcome.sessions;
      state.connection = ConnectionStatus::Connected;
      store::save_quietly(&store, &state).await;

      println!(
        "synced week of {}: {} fetched, {} classified, {} skipped",
        state.window_start, outcome.fetched, outcome.classified, outcome.skipped
      );
    }

    "export" => {
      let path = args.get(1).ok_or(USAGE)?;
      store::export_to_file(&state, Path::new(path))?;
      println!("exported state to {}", path);
    }

    "import" => {
      let path = args.get(1).ok_or(USAGE)?;
      state = store::import_from_file(Path::new(path))?;
      store::save_quietly(&store, &state).await;
      println!("imported {} sessions", state.sessions.len());
    }

    "status" => {
      println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
          "windowStart": state.window_start,
          "sessions": state.sessions.len(),
          "zoneThresholds": state.thresholds,
          "connectionStatus": state.connection,
        }))?
      );
    }

    _ => {
      eprintln!("{}", USAGE);
      process::exit(2);
    }
  }

  Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn Error>> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map_err(|_| format!("invalid date {:?}, expected YYYY-MM-DD", raw).into())
}
