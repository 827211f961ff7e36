//! Bloodwise: blood test reports from the command line.
//!
//! ```bash
//! bloodwise synthesize <test-id> [--json]
//! bloodwise add <file-name> --user <user-id> [--size <bytes>] [--type <mime>] [--processed]
//! bloodwise process <test-id>
//! bloodwise report <test-id> [--json]
//! bloodwise history [--json]
//! bloodwise delete <test-id>
//! ```

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bloodwise::adapters::sanitize::SanitizingMakeWriter;
use bloodwise::adapters::SqliteTestStore;
use bloodwise::config::{AppConfig, LogMode};
use bloodwise::domain::{
    render_assistant_context, BloodTest, BloodTestReport, ScoreBand, ScoreTrend,
};
use bloodwise::ports::TestRecords;
use bloodwise::{Metric, MetricStatus, ReportOutcome, ReportService};

const USAGE: &str = "Usage: bloodwise <command> [args]

Commands:
  synthesize <test-id> [--json]      Synthesize metrics and score without storage
  add <file-name> --user <user-id> [--size <bytes>] [--type <mime>] [--processed]
                                     Register a blood test upload
  process <test-id>                  Mark a test as processed
  report <test-id> [--json]          Show the report for a test
  history [--json]                   Show the health score history
  delete <test-id>                   Delete a test record

Arguments after `--` are never read as flags.";

#[derive(Debug, PartialEq)]
enum Command {
    Synthesize { test_id: String, json: bool },
    Add {
        file_name: String,
        user_id: String,
        size: u64,
        file_type: String,
        processed: bool,
    },
    Process { test_id: String },
    Report { test_id: String, json: bool },
    History { json: bool },
    Delete { test_id: String },
    Help,
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}\n\n{USAGE}");
    std::process::exit(2);
}

/// Parse CLI arguments (without the program name).
///
/// Only the known flags are flags. Everything else, and everything after
/// `--`, is positional, so test ids may start with `-`.
fn parse_args(args: Vec<String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let command = args.next().ok_or("Missing command")?;

    let mut positional: Vec<String> = Vec::new();
    let mut json = false;
    let mut processed = false;
    let mut user_id: Option<String> = None;
    let mut size: u64 = 0;
    let mut file_type = String::from("application/pdf");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--" => {
                positional.extend(args.by_ref());
                break;
            }
            "--json" => json = true,
            "--processed" => processed = true,
            "--user" => user_id = Some(args.next().ok_or("--user needs a value")?),
            "--size" => {
                let raw = args.next().ok_or("--size needs a value")?;
                size = raw.parse().map_err(|_| format!("Invalid size: {raw}"))?;
            }
            "--type" => file_type = args.next().ok_or("--type needs a value")?,
            "-h" | "--help" => return Ok(Command::Help),
            other => positional.push(other.to_string()),
        }
    }

    let single = |what: &str| -> Result<String, String> {
        match <[String; 1]>::try_from(positional.clone()) {
            Ok([value]) => Ok(value),
            Err(_) => Err(format!("{command} takes exactly one {what}")),
        }
    };

    let parsed = match command.as_str() {
        "synthesize" => Command::Synthesize {
            test_id: single("test id")?,
            json,
        },
        "add" => Command::Add {
            file_name: single("file name")?,
            user_id: user_id.ok_or("add requires --user")?,
            size,
            file_type,
            processed,
        },
        "process" => Command::Process {
            test_id: single("test id")?,
        },
        "report" => Command::Report {
            test_id: single("test id")?,
            json,
        },
        "history" if positional.is_empty() => Command::History { json },
        "history" => return Err("history takes no arguments".to_string()),
        "delete" => Command::Delete {
            test_id: single("test id")?,
        },
        "-h" | "--help" | "help" => Command::Help,
        other => return Err(format!("Unknown command: {other}")),
    };
    Ok(parsed)
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Wrap `text` in a 24-bit ANSI foreground color when `enabled`.
fn paint(text: &str, (r, g, b): (u8, u8, u8), enabled: bool) -> String {
    if enabled {
        format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn score_line(score: u8, color: bool) -> String {
    let band = ScoreBand::from_score(score);
    format!(
        "Health score: {score} [{}]",
        paint(band.description(), band.color(), color)
    )
}

fn print_metrics(metrics: &[Metric], color: bool) {
    for metric in metrics {
        let marker = match metric.status() {
            MetricStatus::Normal => " ",
            MetricStatus::Elevated => "↑",
            MetricStatus::Low => "↓",
        };
        println!(
            "  {marker} {:<18} {:>12} {:<18} {}",
            metric.name(),
            metric.value(),
            metric.unit(),
            paint(metric.status().as_str(), metric.status().color(), color)
        );
    }
}

fn print_report(report: &BloodTestReport, color: bool) {
    println!("{} ({})", report.name, report.date.format("%b %-d, %Y"));
    println!();
    print_metrics(&report.metrics, color);
    println!();
    println!("{}", score_line(report.health_score.score, color));
    println!();
    println!("{}", report.interpretation.summary);
    for recommendation in &report.interpretation.recommendations {
        println!("  - {recommendation}");
    }
}

fn open_service(
    config: &AppConfig,
) -> Result<(ReportService<SqliteTestStore>, Arc<SqliteTestStore>)> {
    let store = Arc::new(
        SqliteTestStore::new(&config.db_path)
            .with_context(|| format!("opening {}", config.db_path.display()))?,
    );
    let service = ReportService::new(Arc::clone(&store), config.synthesizer(), config.aggregator());
    Ok((service, store))
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    let color = use_color();
    match command {
        Command::Synthesize { test_id, json } => {
            let metrics = config.synthesizer().synthesize(&test_id);
            let breakdown = config.aggregator().breakdown(&metrics, &test_id);
            if json {
                let payload = serde_json::json!({ "metrics": metrics, "breakdown": breakdown });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_metrics(&metrics, color);
                println!();
                println!("{}", score_line(breakdown.score, color));
                tracing::debug!("Assistant context:\n{}", render_assistant_context(&metrics));
            }
        }
        Command::Add {
            file_name,
            user_id,
            size,
            file_type,
            processed,
        } => {
            let (_, store) = open_service(config)?;
            let mut test = BloodTest::new(user_id, file_name, file_type, size);
            test.processed = processed;
            store.save_test(&test)?;
            println!("{}", test.id);
        }
        Command::Process { test_id } => {
            let (_, store) = open_service(config)?;
            store.mark_processed(&test_id)?;
        }
        Command::Report { test_id, json } => {
            let (service, _) = open_service(config)?;
            match service.build_report(&test_id)? {
                ReportOutcome::Ready(report) if json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                ReportOutcome::Ready(report) => print_report(&report, color),
                ReportOutcome::Pending { created_at } if json => {
                    let payload = serde_json::json!({ "pending": true, "created_at": created_at });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                ReportOutcome::Pending { created_at } => {
                    println!(
                        "Pending analysis (uploaded {})",
                        created_at.format("%b %-d, %Y")
                    );
                }
            }
        }
        Command::History { json } => {
            let (service, _) = open_service(config)?;
            let history = service.health_history()?;
            let trend = ScoreTrend::from_history(&history);
            if json {
                let payload = serde_json::json!({ "history": history, "trend": trend });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if history.len() < 2 {
                println!("Not enough data to display health score trends");
            } else {
                for point in &history {
                    println!(
                        "  {}  {:>3}  {}",
                        point.date.format("%b %-d, %Y"),
                        point.score,
                        paint(&point.band().to_string(), point.band().color(), color)
                    );
                }
                if let Some(trend) = trend {
                    println!();
                    println!("Trend: {trend}");
                }
            }
        }
        Command::Delete { test_id } => {
            let (_, store) = open_service(config)?;
            store.delete_test(&test_id)?;
        }
        Command::Help => println!("{USAGE}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args().skip(1).collect()) {
        Ok(Command::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Ok(command) => command,
        Err(msg) => usage_error(&msg),
    };
    let config = AppConfig::from_env()?;

    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("opening log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    let writer = SanitizingMakeWriter::with_max_bytes(writer, config.sanitize_max_bytes);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    tracing::info!(
        "Starting bloodwise (mixing={}, catalog={} entries)",
        config.mixing,
        config.catalog.len()
    );

    run(command, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_dash_prefixed_test_ids() {
        assert_eq!(
            parse_args(args(&["synthesize", "-abc"])),
            Ok(Command::Synthesize {
                test_id: "-abc".to_string(),
                json: false,
            })
        );
        assert_eq!(
            parse_args(args(&["report", "--json", "--", "--json"])),
            Ok(Command::Report {
                test_id: "--json".to_string(),
                json: true,
            })
        );
        assert_eq!(
            parse_args(args(&["delete", "--", "-h"])),
            Ok(Command::Delete {
                test_id: "-h".to_string(),
            })
        );
    }

    #[test]
    fn test_add_flags() {
        assert_eq!(
            parse_args(args(&["add", "jan.pdf", "--user", "u1", "--size", "42", "--processed"])),
            Ok(Command::Add {
                file_name: "jan.pdf".to_string(),
                user_id: "u1".to_string(),
                size: 42,
                file_type: "application/pdf".to_string(),
                processed: true,
            })
        );
        assert!(parse_args(args(&["add", "jan.pdf"])).is_err());
        assert!(parse_args(args(&["add", "jan.pdf", "--user", "u1", "--size", "big"])).is_err());
    }

    #[test]
    fn test_paint_uses_band_and_status_colors() {
        assert_eq!(paint("low", MetricStatus::Low.color(), false), "low");
        assert_eq!(
            paint("low", MetricStatus::Low.color(), true),
            "\x1b[38;2;59;130;246mlow\x1b[0m"
        );
        assert_eq!(score_line(79, false), "Health score: 79 [Good (75-89)]");
        assert!(score_line(95, true).contains("\x1b[38;2;16;185;129m"));
        assert!(score_line(30, true).contains("\x1b[38;2;239;68;68m"));
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["synthesize"])).is_err());
        assert!(parse_args(args(&["synthesize", "a", "b"])).is_err());
        assert!(parse_args(args(&["history", "extra"])).is_err());
        assert!(parse_args(args(&["transmogrify", "a"])).is_err());
        assert_eq!(parse_args(args(&["report", "--help"])), Ok(Command::Help));
    }
}
