#[macro_use]
mod terminal;

use clap::{Parser, Subcommand, ValueEnum};
use terminal::{print_log, ConsoleView, JsonLines};
use glove_core::config::{clamp_rate, clamp_volume};
use glove_core::*;
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glovetimer")]
#[command(about = "Guided step timer for glove dipping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Advance each step only when Enter is pressed
    #[arg(long, global = true, conflicts_with = "auto")]
    manual: bool,

    /// Advance steps automatically (default unless the config says otherwise)
    #[arg(long, global = true)]
    auto: bool,

    /// Disable voice announcements
    #[arg(long, global = true)]
    no_voice: bool,

    /// Voice rate (0.5 - 2.0)
    #[arg(long, global = true)]
    rate: Option<f32>,

    /// Voice volume (0.0 - 1.0)
    #[arg(long, global = true)]
    volume: Option<f32>,

    /// Simulated clock - steps complete without real waiting
    #[arg(long, global = true)]
    simulate: bool,

    /// How to print run progress
    #[arg(long, global = true, value_enum, default_value_t = EventFormat::Human)]
    events: EventFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one section with a fresh log
    Run {
        /// pre-dip, dip, dip2 or all
        #[arg(value_parser = parse_section)]
        section: Section,

        /// Export the log to this CSV file afterwards
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the log as JSON afterwards
        #[arg(long)]
        json: bool,
    },

    /// Interactive session with a log kept across runs (default)
    Session,

    /// Speak the voice test phrase
    Voice,

    /// Inspect or write the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the default config file location
    Path,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EventFormat {
    Human,
    Json,
}

type Surface = (Box<dyn EventSink>, Narration<Box<dyn Narrator>>);
type Timer = Sequencer<Box<dyn Clock>, Surface>;

fn parse_section(input: &str) -> std::result::Result<Section, String> {
    Section::parse(input).ok_or_else(|| {
        format!(
            "unknown section '{}' (expected pre-dip, dip, dip2 or all)",
            input
        )
    })
}

fn main() -> Result<()> {
    // Initialize logging
    glove_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let writing_config = matches!(
        cli.command,
        Some(Commands::Config {
            action: ConfigAction::Init { .. }
        })
    );
    let config = match &cli.config {
        Some(path) if writing_config && !path.exists() => Config::default(),
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match &cli.command {
        Some(Commands::Run { section, csv, json }) => {
            cmd_run(&cli, &config, *section, csv.clone(), *json)
        }
        Some(Commands::Voice) => cmd_voice(&cli, &config),
        Some(Commands::Config { action }) => cmd_config(&cli, &config, action),
        Some(Commands::Session) | None => cmd_session(&cli, &config),
    }
}

fn build_timer(cli: &Cli, config: &Config) -> Timer {
    let mode = if cli.manual {
        Mode::Manual
    } else if cli.auto {
        Mode::Automatic
    } else {
        config.mode.mode()
    };

    let clock: Box<dyn Clock> = if cli.simulate {
        Box::new(VirtualClock::new())
    } else {
        Box::new(SystemClock)
    };

    let view: Box<dyn EventSink> = match cli.events {
        EventFormat::Human => Box::new(ConsoleView::stdout()),
        EventFormat::Json => Box::new(JsonLines::stdout()),
    };

    Sequencer::new(mode, clock, (view, build_narration(cli, config)))
}

fn build_narration(cli: &Cli, config: &Config) -> Narration<Box<dyn Narrator>> {
    let mut settings = NarrationSettings::from(&config.narration);
    if cli.no_voice {
        settings.enabled = false;
    }
    if let Some(rate) = cli.rate {
        settings.rate = clamp_rate(rate);
    }
    if let Some(volume) = cli.volume {
        settings.volume = clamp_volume(volume);
    }

    let narrator: Box<dyn Narrator> = Box::new(CommandNarrator::new(&config.narration.command));
    Narration::new(narrator, settings)
}

fn cmd_run(
    cli: &Cli,
    config: &Config,
    section: Section,
    csv: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut timer = build_timer(cli, config);
    let mut log = RunLog::new();

    let status = timer.run_section(section, &config.durations, &mut log);
    let stdin = io::stdin();
    drive(&mut timer, &mut log, status, &mut stdin.lock())?;

    if cli.events == EventFormat::Human {
        print_log(&log);
    }

    if let Some(path) = csv {
        log.write_csv(&path)?;
        if cli.events == EventFormat::Human {
            outln!("\n✓ Exported {} entries to {}", log.len(), path.display());
        }
    }

    if json {
        outln!("{}", log.to_json()?);
    }

    Ok(())
}

/// Keep a run going, reading one line of input per manual suspension
///
/// Returns `false` when input closes before the run finishes; the log keeps
/// whatever was appended up to that point.
fn drive(
    timer: &mut Timer,
    log: &mut RunLog,
    mut status: RunStatus,
    input: &mut impl BufRead,
) -> Result<bool> {
    loop {
        match status {
            RunStatus::Suspended(token) => {
                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    outln!(
                        "\nInput closed while waiting on {} - run interrupted ({} entries logged)",
                        token.unit,
                        log.len()
                    );
                    return Ok(false);
                }
                status = timer.continue_run(&token, log)?;
            }
            RunStatus::Finished(_) | RunStatus::Idle => return Ok(true),
        }
    }
}

fn cmd_session(cli: &Cli, config: &Config) -> Result<()> {
    let mut timer = build_timer(cli, config);
    let mut log = RunLog::new();

    let stdin = io::stdin();
    let mut input = stdin.lock();

    outln!("🧤 Glove Dipping Timer (11 steps)");
    print_session_help();

    loop {
        out!("\nglovetimer> ");

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command.to_lowercase().as_str() {
            "quit" | "exit" | "q" => break,
            "help" | "?" => print_session_help(),
            "log" => print_log(&log),
            "reset" => {
                log.clear();
                outln!("🗑  Log cleared.");
            }
            "export" => {
                let path = words
                    .next()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| config.export.csv_file.clone());
                match log.write_csv(&path) {
                    Ok(()) => outln!("📥 Exported {} entries to {}", log.len(), path.display()),
                    Err(e) => outln!("Export failed: {}", e),
                }
            }
            "voice" => {
                timer.sink_mut().1.test_voice();
                outln!("🔊 Voice test sent.");
            }
            "mode" => match words.next() {
                Some("auto") | Some("automatic") => {
                    timer.set_mode(Mode::Automatic);
                    outln!("Mode: automatic");
                }
                Some("manual") => {
                    timer.set_mode(Mode::Manual);
                    outln!("Mode: manual");
                }
                _ => outln!("Mode: {:?} (use 'mode auto' or 'mode manual')", timer.mode()),
            },
            other => match Section::parse(other) {
                Some(section) => {
                    let status = timer.run_section(section, &config.durations, &mut log);
                    if !drive(&mut timer, &mut log, status, &mut input)? {
                        break;
                    }
                }
                None => outln!("Unknown command: {} (type 'help')", other),
            },
        }
    }

    print_log(&log);
    Ok(())
}

fn print_session_help() {
    outln!();
    outln!("  pre-dip | dip | dip2 | all   run a section");
    outln!("  log                          show the timer log");
    outln!("  reset                        clear the timer log");
    outln!("  export [PATH]                write the log as CSV");
    outln!("  voice                        test voice announcements");
    outln!("  mode [auto|manual]           show or change timing mode");
    outln!("  quit                         leave the session");
}

fn cmd_voice(cli: &Cli, config: &Config) -> Result<()> {
    let mut narration = build_narration(cli, config);
    narration.test_voice();
    outln!("🔊 Voice test sent via {}", config.narration.command);
    Ok(())
}

fn cmd_config(cli: &Cli, config: &Config, action: &ConfigAction) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };

    match action {
        ConfigAction::Show => out!("{}", config.to_toml()?),
        ConfigAction::Path => outln!("{}", path.display()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(Error::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            Config::default().save_to(&path)?;
            outln!("✓ Wrote default config to {}", path.display());
        }
    }

    Ok(())
}
