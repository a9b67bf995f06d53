//! serial-panel CLI
//!
//! Terminal control panel for a microcontroller on a serial link, plus
//! headless `ports` and `send` commands.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use serial_panel::codec::frame_line;
use serial_panel::config::Config;
use serial_panel::input::{validate, InputKind};
use serial_panel::report::format_ports;
use serial_panel::session::{NullObserver, Session, BAUD_RATE};
use serial_panel::transport::{PortBackend, SystemBackend};
use serial_panel::tui;
use serial_panel::types::OutputFormat;

#[derive(Parser)]
#[command(name = "serial-panel")]
#[command(about = "Send letters, words and commands to a microcontroller over a serial link")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/serial-panel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Trace log destination
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the control panel (default)
    Panel {
        /// Port to pre-select in the picker
        #[arg(long)]
        port_hint: Option<String>,
    },

    /// List serial ports
    Ports {
        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Connect, send each TEXT as one line, disconnect
    Send {
        /// Port to open (e.g. /dev/ttyACM0, COM3)
        #[arg(long)]
        port: String,

        /// Validation applied to every TEXT
        #[arg(long, value_enum, default_value = "manual")]
        kind: InputKindArg,

        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum InputKindArg {
    Letter,
    Word,
    Manual,
}

impl From<InputKindArg> for InputKind {
    fn from(arg: InputKindArg) -> Self {
        match arg {
            InputKindArg::Letter => InputKind::Letter,
            InputKindArg::Word => InputKind::Word,
            InputKindArg::Manual => InputKind::Manual,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}; using defaults", e);
            Config::default()
        }
    };
    let log_file = cli.log_file.or_else(|| config.log_file());

    let command = cli.command.unwrap_or(Commands::Panel { port_hint: None });

    let result = match command {
        Commands::Panel { port_hint } => {
            init_file_tracing(log_file.as_deref());
            cmd_panel(config, port_hint)
        }
        Commands::Ports { format } => {
            init_stderr_tracing();
            cmd_ports(format.into())
        }
        Commands::Send { port, kind, text } => {
            init_stderr_tracing();
            cmd_send(&config, &port, kind.into(), &text)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The panel owns the terminal, so traces go to a file.
///
/// Without a usable file the panel runs untraced.
fn init_file_tracing(path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match File::options().create(true).append(true).open(path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(e) => eprintln!("Note: cannot open log file {}: {}", path.display(), e),
    }
}

/// Headless commands keep stdout for results; traces go to stderr.
fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// PROGRESS HELPERS
// ============================================================================

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn cmd_panel(mut config: Config, port_hint: Option<String>) -> Result<(), String> {
    if port_hint.is_some() {
        config.panel.preferred_port = port_hint;
    }
    tui::run(&config, Box::new(SystemBackend)).map_err(|e| e.to_string())
}

fn cmd_ports(format: OutputFormat) -> Result<(), String> {
    let ports = SystemBackend.available_ports().map_err(|e| e.to_string())?;

    match format {
        OutputFormat::Human => print!("{}", format_ports(&ports, format)),
        OutputFormat::Json => println!("{}", format_ports(&ports, format)),
    }

    Ok(())
}

fn cmd_send(config: &Config, port: &str, kind: InputKind, texts: &[String]) -> Result<(), String> {
    // Validate everything before touching the port
    let lines = texts
        .iter()
        .map(|text| validate(kind, text).map_err(|e| format!("{:?}: {}", text, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut session = Session::new(
        Box::new(SystemBackend),
        Arc::new(NullObserver),
        config.session_options(),
    );

    let sp = spinner(&format!("Connecting to {} @ {} baud...", port, BAUD_RATE));
    if let Err(e) = session.connect(port) {
        sp.finish_and_clear();
        return Err(e.to_string());
    }

    let mut bytes = 0u64;
    for line in &lines {
        sp.set_message(format!("Sending {}", line));
        if let Err(e) = session.send(line) {
            sp.finish_and_clear();
            let _ = session.disconnect();
            return Err(e.to_string());
        }
        bytes += frame_line(line).len() as u64;
    }

    let teardown = session.disconnect();
    sp.finish_with_message(format!(
        "Sent {} line{} ({}) to {}",
        lines.len(),
        if lines.len() == 1 { "" } else { "s" },
        format_size(bytes, BINARY),
        port
    ));

    if let Err(e) = teardown {
        eprintln!("Note: {}", e);
    }

    Ok(())
}
