//! AQMS CLI
//!
//! Command-line client for the air-quality station backend:
//! - Show live readings and windowed statistics
//! - Classify a particulate concentration
//! - Watch for new readings
//! - Log in, view the admin summary, change password
//! - Export history as CSV

use aqms::backend::{BackendClient, BackendError, PollOutcome, ReadingPoller, ReadingSource};
use aqms::config::{generate_default_config, Config};
use aqms::export::{export_filename, write_readings_csv, ExportDays};
use aqms::health::{assess, Pollutant};
use aqms::readings::{ApplyOutcome, Reading, ReadingSeries, ReadingStore, Window};
use aqms::session::{PasswordChange, SessionToken, TokenStore};
use aqms::views::{AdminView, DashboardView, LiveCard, StatsRow};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SESSION_EXPIRED: &str = "Session expired. Please login again.";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Parser)]
#[command(name = "aqms")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Air-quality monitoring station client")]
#[command(long_about = "AQMS talks to the station backend.\nShow live particulate and climate readings, windowed trends and health bands, and manage the admin session.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend API URL (default: from config)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest reading with health bands
    Live,

    /// List readings in a time window
    History {
        /// Time range (1h, 24h, 7d, 30d, 1mo, or <n>h/<n>d/<n>w)
        #[arg(short, long, default_value = "24h")]
        range: Window,
        /// Write CSV to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Average, minimum and maximum of every metric in a window
    Stats {
        /// Time range
        #[arg(short, long, default_value = "24h")]
        range: Window,
    },

    /// Health band and AQI for a concentration
    Classify {
        /// Pollutant (pm1, pm25, pm10)
        pollutant: Pollutant,
        /// Concentration in µg/m³
        concentration: f64,
    },

    /// Print each new reading as it arrives
    Watch {
        /// Poll interval in seconds (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Log in as the station administrator
    Login {
        /// Admin email
        username: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Admin summary: device status and power health
    Admin {
        /// Time range for power statistics
        #[arg(short, long, default_value = "30d")]
        range: Window,
    },

    /// Change the admin password
    ChangePassword {
        #[arg(long)]
        old: Option<String>,
        #[arg(long)]
        new: Option<String>,
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Download history as CSV from the backend
    Export {
        /// Number of days (presets: 1, 7, 30, 90)
        #[arg(short, long, default_value = "7")]
        days: ExportDays,
        /// Output file (default: aqms_data_<days>days_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_default();
    if let Some(url) = cli.backend_url.clone() {
        config.backend.url = url;
    }

    let client = BackendClient::new(&config.backend)?;
    let tokens = TokenStore::new(config.session.token_path());

    match cli.command {
        Commands::Live => {
            let series = fetch_series(&client, &config).await;
            let now = Utc::now().timestamp();
            let view = DashboardView::build(&series, Window::Day, now, Some(now));

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.cards)?),
                OutputFormat::Csv => {
                    let latest: Vec<Reading> = view.latest.into_iter().collect();
                    write_readings_csv(std::io::stdout().lock(), &latest)?;
                }
                OutputFormat::Table => {
                    match &view.latest {
                        Some(reading) => println!("Latest reading: {}", format_ts(reading.ts)),
                        None => {
                            println!("No readings yet.");
                            return Ok(());
                        }
                    }
                    println!();
                    print_cards(&view.cards);
                }
            }
        }

        Commands::History { range, output } => {
            let series = fetch_series(&client, &config).await;
            let readings = series.window(range, Utc::now().timestamp());

            match (cli.format, output) {
                (_, Some(path)) => {
                    let file = std::fs::File::create(&path)?;
                    write_readings_csv(file, readings)?;
                    println!("Wrote {} readings to {:?}", readings.len(), path);
                }
                (OutputFormat::Json, None) => {
                    println!("{}", serde_json::to_string_pretty(readings)?)
                }
                (OutputFormat::Csv, None) => write_readings_csv(std::io::stdout().lock(), readings)?,
                (OutputFormat::Table, None) => print_readings(readings, range),
            }
        }

        Commands::Stats { range } => {
            let series = fetch_series(&client, &config).await;
            let now = Utc::now().timestamp();
            let view = DashboardView::build(&series, range, now, Some(now));

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.stats)?),
                OutputFormat::Csv => print_stats_csv(&view.stats)?,
                OutputFormat::Table => {
                    println!("Last {} ({} readings)", range, view.readings.len());
                    println!();
                    print_stats(&view.stats);
                }
            }
        }

        Commands::Classify {
            pollutant,
            concentration,
        } => {
            let Some(result) = assess(pollutant, concentration) else {
                eprintln!("Invalid concentration: {}", concentration);
                std::process::exit(1);
            };

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => {
                    let (lo, hi) = result.band.index_range();
                    println!("{} {} µg/m³", pollutant, concentration);
                    println!("  Band: {}", result.band.label());
                    println!("  AQI:  {} (band {}-{})", result.aqi, lo, hi);
                }
            }
        }

        Commands::Watch { interval } => {
            let secs = interval.unwrap_or(config.dashboard.poll_interval_secs).max(1);
            watch(client, &config, Duration::from_secs(secs), cli.format).await?;
        }

        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };

            match client.login(username.trim(), &password).await {
                Ok(token) => {
                    tokens.save(&token)?;
                    println!("Logged in as {}", username.trim());
                }
                Err(BackendError::Unauthorized(_)) | Err(BackendError::Api { status: 400..=499, .. }) => {
                    eprintln!("{}", INVALID_CREDENTIALS);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Logout => {
            if tokens.clear()? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Admin { range } => {
            let token = require_token(&tokens)?;
            let info = match client.admin_dashboard(&token).await {
                Ok(info) => info,
                Err(e) => return admin_failure(e, &tokens),
            };

            let series = fetch_series(&client, &config).await;
            let now = Utc::now().timestamp();
            let view = AdminView::build(info, &series, range, now, Some(now));

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                _ => print_admin(&view),
            }
        }

        Commands::ChangePassword { old, new, confirm } => {
            let token = require_token(&tokens)?;
            let change = PasswordChange::new(
                value_or_prompt(old, "Current password")?,
                value_or_prompt(new, "New password")?,
                value_or_prompt(confirm, "Confirm new password")?,
            );

            if let Err(e) = change.validate() {
                eprintln!("{}", e);
                std::process::exit(1);
            }

            match client.change_password(&token, &change).await {
                Ok(()) => println!("Password changed successfully"),
                Err(e) if e.is_unauthorized() => return admin_failure(e, &tokens),
                Err(e) => {
                    eprintln!("{}", e.detail());
                    std::process::exit(1);
                }
            }
        }

        Commands::Export { days, output } => {
            let token = require_token(&tokens)?;
            let csv = match client.export_csv(&token, days).await {
                Ok(csv) => csv,
                Err(e) => return admin_failure(e, &tokens),
            };

            let path =
                output.unwrap_or_else(|| PathBuf::from(export_filename(days, Utc::now().date_naive())));
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &csv)?;
            println!("Exported {} days ({} bytes) to {:?}", days, csv.len(), path);
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Fetch and sort readings, exiting with a message if the backend is down
async fn fetch_series(client: &BackendClient, config: &Config) -> ReadingSeries {
    match client.fetch_readings().await {
        Ok(readings) => ReadingSeries::from_unordered(readings, config.dashboard.max_readings),
        Err(e) => {
            eprintln!("Cannot reach backend at {}", client.base_url());
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn watch(
    client: BackendClient,
    config: &Config,
    interval: Duration,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let store = Arc::new(ReadingStore::new(config.dashboard.max_readings));
    let source: Arc<dyn ReadingSource> = Arc::new(client);
    let poller = ReadingPoller::new(source, Arc::clone(&store), None, interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    eprintln!("Watching for new readings every {}s (Ctrl+C to stop)", interval.as_secs());
    if format == OutputFormat::Csv {
        write_readings_csv(std::io::stdout().lock(), &[])?;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }

        match poller.refresh().await {
            Ok(PollOutcome {
                apply:
                    ApplyOutcome::Applied {
                        latest_changed: true,
                        latest: Some(reading),
                    },
                ..
            }) => print_watch_line(&reading, format)?,
            Ok(_) => {}
            Err(e) => eprintln!("Poll failed: {}", e),
        }
    }
}

fn print_watch_line(reading: &Reading, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(reading)?),
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            write_readings_csv(&mut buf, std::slice::from_ref(reading))?;
            // Header was printed once at start
            let text = String::from_utf8_lossy(&buf);
            if let Some(row) = text.lines().nth(1) {
                println!("{}", row);
            }
        }
        OutputFormat::Table => {
            let series = ReadingSeries::from_unordered(vec![reading.clone()], 1);
            let view = DashboardView::build(&series, Window::Hour, reading.ts, None);
            let parts: Vec<String> = view
                .cards
                .iter()
                .map(|c| format!("{} {} ({})", c.label, format_value(c.value), c.status))
                .collect();
            println!("{}  {}", format_ts(reading.ts), parts.join("  "));
        }
    }
    std::io::stdout().flush()?;
    Ok(())
}

fn require_token(tokens: &TokenStore) -> anyhow::Result<SessionToken> {
    match tokens.load()? {
        Some(token) => Ok(token),
        None => {
            eprintln!("Not logged in. Run: aqms login <email>");
            std::process::exit(1);
        }
    }
}

/// Report a failed admin call; an expired session also drops the saved token
fn admin_failure(err: BackendError, tokens: &TokenStore) -> anyhow::Result<()> {
    if err.is_unauthorized() {
        tokens.clear()?;
        eprintln!("{}", SESSION_EXPIRED);
    } else {
        eprintln!("{}", err.detail());
    }
    std::process::exit(1);
}

fn value_or_prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt(label),
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}: ", label);
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_cards(cards: &[LiveCard]) {
    println!("{:<14} {:>10} {:<8} {:>5}  {}", "Metric", "Value", "Unit", "AQI", "Status");
    println!("{}", "-".repeat(56));

    for card in cards {
        println!(
            "{:<14} {:>10} {:<8} {:>5}  {}",
            card.label,
            format_value(card.value),
            card.unit,
            card.aqi.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            card.status
        );
    }
}

fn print_readings(readings: &[Reading], range: Window) {
    if readings.is_empty() {
        println!("No data for the last {}", range);
        return;
    }

    println!(
        "{:<20} | {:<7} | {:<7} | {:<7} | {:<7} | {:<7}",
        "Time", "PM1", "PM2.5", "PM10", "Temp", "Hum"
    );
    println!("{}", "-".repeat(72));

    for r in readings {
        println!(
            "{:<20} | {:<7} | {:<7} | {:<7} | {:<7} | {:<7}",
            format_ts(r.ts),
            format_value(r.pm1),
            format_value(r.pm25),
            format_value(r.pm10),
            format_value(r.temp),
            format_value(r.hum)
        );
    }
}

fn print_stats(rows: &[StatsRow]) {
    println!(
        "{:<14} {:<8} {:>8} {:>8} {:>8} {:>6}",
        "Metric", "Unit", "Avg", "Min", "Max", "Count"
    );
    println!("{}", "-".repeat(57));

    for row in rows {
        println!(
            "{:<14} {:<8} {:>8} {:>8} {:>8} {:>6}",
            row.label,
            row.unit,
            format_value(row.avg),
            format_value(row.min),
            format_value(row.max),
            row.count
        );
    }
}

fn print_stats_csv(rows: &[StatsRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    writer.write_record(["metric", "unit", "avg", "min", "max", "count"])?;

    for row in rows {
        let cell = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([
            row.metric.to_string(),
            row.unit.to_string(),
            cell(row.avg),
            cell(row.min),
            cell(row.max),
            row.count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn print_admin(view: &AdminView) {
    println!("{}", view.message);
    println!("Signed in as: {}", view.admin);
    println!();

    println!("Device status:");
    if view.device.is_empty() {
        println!("  No readings yet");
    }
    for status in &view.device {
        println!("  {:<12} {}", status.label, status.state_label());
    }

    println!();
    println!("Power health (last {}):", view.range);
    println!(
        "  {:<14} {:>8} {:>8} {:>8} {:>8} {:>6}",
        "Metric", "Latest", "Avg", "Min", "Max", "Points"
    );
    for card in &view.power {
        println!(
            "  {:<14} {:>8} {:>8} {:>8} {:>8} {:>6}",
            card.stats.label,
            format_value(card.latest),
            format_value(card.stats.avg),
            format_value(card.stats.min),
            format_value(card.stats.max),
            card.points
        );
    }

    if let Some(latest) = &view.latest {
        println!();
        println!("Last reading: {}", format_ts(latest.ts));
    }
}
