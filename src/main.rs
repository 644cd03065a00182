//! Purpose: `exportboard` CLI entry point: load the province tables, then serve or query them.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Any load failure aborts before a socket is bound.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};

mod command_dispatch;
mod serve;

use exportboard::api::{Error, ErrorKind, RegionSource, default_sources, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `exportboard --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    serve::init_tracing();
    let sources = resolve_sources(cli.data_dir, cli.files).map_err(|err| (err, color_mode))?;
    command_dispatch::dispatch_command(cli.command, &sources).map_err(|err| (err, color_mode))
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

/// Explicit `--file` values win; otherwise the default province list under `data_dir`.
fn resolve_sources(data_dir: PathBuf, files: Vec<PathBuf>) -> Result<Vec<RegionSource>, Error> {
    if files.is_empty() {
        return default_sources(&data_dir);
    }
    files.into_iter().map(RegionSource::from_path).collect()
}

#[derive(Parser)]
#[command(
    name = "exportboard",
    version,
    about = "Interactive dashboard for Andalusian export volumes by province and sector",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Loads one CSV per province (Sector + one column per year), reshapes it into
a long table, and serves charts and lookups over it.
"#,
    after_help = r#"EXAMPLES
  $ exportboard --data-dir ./data serve                     # http://0.0.0.0:8050
  $ PORT=9000 exportboard serve --host 127.0.0.1
  $ exportboard summary
  $ exportboard chart --region Sevilla --region Cadiz --sector Agricultura
  $ exportboard lookup --region Sevilla --year 2020 --sector Agricultura

NOTES
  - Default files: almeria.csv cadiz.csv cordoba.csv granada.csv huelva.csv
    jaen.csv malaga.csv sevilla.csv (relative to --data-dir)
  - Volumes use dot thousands and comma decimals: 12.345,67"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "EXPORTBOARD_DATA_DIR",
        default_value = ".",
        help = "Directory holding the default province CSV files",
        value_hint = ValueHint::DirPath
    )]
    data_dir: PathBuf,
    #[arg(
        long = "file",
        global = true,
        help = "Region CSV to load (repeatable; replaces the default province list)",
        value_hint = ValueHint::FilePath
    )]
    files: Vec<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Serve the dashboard over HTTP",
        long_about = r#"Load every region table, then serve the dashboard page and its JSON API.

Routes: GET /, GET /healthz, GET /api/options, POST /api/chart, POST /api/lookup"#,
        after_help = r#"EXAMPLES
  $ exportboard serve
  $ exportboard serve --port 9000
  $ PORT=9000 EXPORTBOARD_HOST=127.0.0.1 exportboard serve"#
    )]
    Serve {
        #[arg(
            long,
            env = "EXPORTBOARD_HOST",
            default_value = "0.0.0.0",
            help = "Address to bind"
        )]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8050, help = "Port to bind")]
        port: u16,
    },
    #[command(
        about = "Print row count and the distinct regions, sectors, and years",
        after_help = r#"EXAMPLES
  $ exportboard summary | jq '.rows'"#
    )]
    Summary,
    #[command(
        about = "Print the long-form table as JSON Lines",
        after_help = r#"EXAMPLES
  $ exportboard table | jq -c 'select(.region == "Sevilla")'"#
    )]
    Table,
    #[command(
        about = "Print the yearly line chart for a region/sector selection",
        after_help = r#"EXAMPLES
  $ exportboard chart --region Sevilla --sector Agricultura --sector Industria"#
    )]
    Chart {
        #[arg(long = "region", help = "Region to include (repeatable)")]
        regions: Vec<String>,
        #[arg(long = "sector", help = "Sector to include (repeatable)")]
        sectors: Vec<String>,
    },
    #[command(
        about = "Report the exact volume for one region, year, and sector",
        after_help = r#"EXAMPLES
  $ exportboard lookup --region Sevilla --year 2020 --sector Agricultura"#
    )]
    Lookup {
        #[arg(long)]
        region: String,
        #[arg(long)]
        year: String,
        #[arg(long)]
        sector: String,
    },
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Format => "malformed input".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}
