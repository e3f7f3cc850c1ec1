//! `simt` decodes and encodes SIMT transfer files from the command line.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use simt_codec::{
    file_lines, read_rows_file, EncodeOptions, FileTranscoder, PeriodFilter, Profile,
    RecordValidator, TransformEngine,
};
use simt_core::{BillingMonth, RecordKind, RecordSchema, Rib};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simt", version, about = "Fixed-width SIMT transfer file codec")]
struct Cli {
    /// Log filter (e.g. `warn`, `simt_codec=debug`). RUST_LOG wins when set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Profile TOML overriding record codes, currency and client markers
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a SIMT file into JSON
    Decode {
        /// Layout TOML with [header], [detail] and [footer] sections
        #[arg(short, long)]
        layout: PathBuf,
        /// Transformation rules TOML applied to decoded fields
        #[arg(short, long)]
        rules: Option<PathBuf>,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        input: PathBuf,
    },
    /// Encode CSV rows into a SIMT file
    Encode {
        #[arg(short, long)]
        layout: PathBuf,
        /// Transformation rules TOML applied to rows before encoding
        #[arg(short, long)]
        rules: Option<PathBuf>,
        /// Keep only rows of this month (YYYY-MM or MMYY)
        #[arg(long, conflicts_with = "latest")]
        month: Option<BillingMonth>,
        /// Keep only rows of the most recent month found
        #[arg(long)]
        latest: bool,
        /// Row field holding the date used for month filtering
        #[arg(long, default_value = "date_emission")]
        date_field: String,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        #[arg(short, long)]
        output: Option<PathBuf>,
        rows: PathBuf,
    },
    /// Check RIB keys; exits with status 1 if any is invalid
    CheckRib {
        #[arg(required = true)]
        ribs: Vec<String>,
    },
    /// Run the structural checks on every line of a SIMT file
    Validate { input: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let profile = load_profile(cli.profile.as_deref())?;

    match cli.command {
        Command::Decode {
            layout,
            rules,
            output,
            input,
        } => {
            let schema = load_schema(&layout)?;
            let transcoder =
                FileTranscoder::new(&schema, &profile)?.with_rules(load_rules(rules.as_deref())?);
            let text = read(&input)?;
            let record = transcoder.decode_text(&text);

            let json = serde_json::to_string_pretty(&record)?;
            write_output(output.as_deref(), &json)?;
            if let Some(error) = &record.error {
                eprintln!("Rejected {}: {error}", input.display());
                return Ok(2);
            }
            Ok(0)
        }
        Command::Encode {
            layout,
            rules,
            month,
            latest,
            date_field,
            delimiter,
            output,
            rows,
        } => {
            let schema = load_schema(&layout)?;
            let transcoder =
                FileTranscoder::new(&schema, &profile)?.with_rules(load_rules(rules.as_deref())?);
            if !delimiter.is_ascii() {
                bail!("Delimiter must be a single ASCII character, got '{delimiter}'");
            }
            let rows = read_rows_file(&rows, delimiter as u8)
                .with_context(|| format!("Failed to read rows from {}", rows.display()))?;

            let period = match (month, latest) {
                (Some(m), _) => PeriodFilter::Month(m),
                (None, true) => PeriodFilter::Latest,
                (None, false) => PeriodFilter::All,
            };
            let options = EncodeOptions {
                period,
                date_field,
                ..EncodeOptions::default()
            };
            let file = transcoder.encode_file(&rows, &options);

            write_output(output.as_deref(), &file.to_text())?;
            eprintln!(
                "{} transfer(s), total {}, remittance {}",
                file.count, file.total, file.remittance_reference
            );
            Ok(0)
        }
        Command::CheckRib { ribs } => {
            let mut invalid = 0;
            for rib in &ribs {
                match rib.parse::<Rib>() {
                    Ok(rib) => println!("{rib}: valid (bank {})", rib.bank_code()),
                    Err(e) => {
                        invalid += 1;
                        println!("{rib}: {e}");
                    }
                }
            }
            Ok(if invalid == 0 { 0 } else { 1 })
        }
        Command::Validate { input } => {
            let validator = RecordValidator::new(&profile)?;
            let text = read(&input)?;
            let lines = file_lines(&text);
            if lines.len() < 2 {
                bail!("{} needs a header and a footer line", input.display());
            }

            let last = lines.len() - 1;
            let mut failures = 0;
            for (i, line) in lines.iter().enumerate() {
                let kind = match i {
                    0 => RecordKind::Header,
                    i if i == last => RecordKind::Footer,
                    _ => RecordKind::Detail,
                };
                match validator.validate(line, kind) {
                    Ok(outcome) if outcome.valid => println!("{:>5} {kind}: ok", i + 1),
                    Ok(outcome) => {
                        failures += 1;
                        println!("{:>5} {kind}: {}", i + 1, outcome.errors.join("; "));
                    }
                    Err(e) => {
                        println!("{:>5} {kind}: FATAL {e}", i + 1);
                        return Ok(2);
                    }
                }
            }
            Ok(if failures == 0 { 0 } else { 1 })
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_schema(path: &Path) -> Result<RecordSchema> {
    RecordSchema::from_toml(&read(path)?)
        .with_context(|| format!("Invalid layout {}", path.display()))
}

fn load_rules(path: Option<&Path>) -> Result<TransformEngine> {
    let Some(path) = path else {
        return Ok(TransformEngine::default());
    };
    TransformEngine::from_toml(&read(path)?)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Invalid rules {}", path.display()))
}

fn load_profile(path: Option<&Path>) -> Result<Profile> {
    match path {
        Some(path) => Profile::from_toml(&read(path)?)
            .with_context(|| format!("Invalid profile {}", path.display())),
        None => Ok(Profile::default()),
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}
