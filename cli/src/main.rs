use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, info, subscriber::set_global_default};
use tracing_subscriber::EnvFilter;

use replay_renamer::identity;
use replay_renamer::paths::{default_settings_path, split_list};
use replay_renamer::{
    AlwaysYes, AutoRenamer, BatchContext, CollisionRisk, Confirm, Decision, EngineCommand,
    EngineEvent, FileOperation, FsEmitter, JsonSidecarParser, ReplayDirectory, Settings, Template,
    batch,
};

/// Seconds between folder polls when watching
const DEFAULT_INTERVAL: u64 = 2;

fn init_tracing(verbosity: u8) {
    // Map -q/-v to tracing levels; default WARN
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr) // logs to stderr
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    // Ignore error if already set in tests or env
    let _ = set_global_default(subscriber);
}

fn main() {
    let opts = Opts::parse();
    init_tracing(opts.verbose.saturating_sub(opts.quiet));
    smol::block_on(async move {
        if let Err(e) = run(opts).await {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    });
}

/// Asks on stderr and reads the answer from stdin; anything but y/yes is a no
struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, decision: &Decision) -> bool {
        eprint!("{decision} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn prompt(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AlwaysYes)
    } else {
        Box::new(StdinPrompt)
    }
}

fn settings_path(opts: &Opts) -> anyhow::Result<PathBuf> {
    match &opts.settings {
        Some(p) => Ok(p.clone()),
        None => default_settings_path()
            .ok_or_else(|| anyhow::anyhow!("no configuration directory; pass --settings")),
    }
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let path = settings_path(&opts)?;
    let mut settings = Settings::load_or_default(&path)?;

    match opts.command {
        Command::Rename {
            copy,
            r#move,
            ref source,
            ref dest,
            ref template,
            ref player_id,
            yes,
            save,
        } => {
            if copy {
                settings.operation = FileOperation::Copy;
            } else if r#move {
                settings.operation = FileOperation::Move;
            }
            if let Some(s) = source {
                settings.source_dir = s.clone();
            }
            if let Some(d) = dest {
                settings.target_dir = d.clone();
            }
            if let Some(t) = template {
                settings.template = t.clone();
            }
            if let Some(id) = player_id {
                settings.player_id = id.clone();
            }

            let config = settings.to_batch_config()?;
            let confirm = prompt(yes);
            let ctx = BatchContext::default().with_progress_callback(|p| {
                info!("Renamed {} ({} so far)", p.current.display(), p.emitted)
            });
            let report = batch::run(&config, &JsonSidecarParser, &FsEmitter, confirm.as_ref(), &ctx)?;

            println!(
                "Renamed {} replays in {:.1}s",
                report.emitted,
                report.elapsed.as_secs_f64()
            );
            if report.filtered > 0 {
                println!("  {} filtered out", report.filtered);
            }
            if report.unreadable > 0 {
                println!("  {} could not be read", report.unreadable);
            }
            if !report.collisions.is_empty() {
                println!("  {} skipped, destination already taken:", report.collisions.len());
                for p in &report.collisions {
                    println!("    {}", p.display());
                }
            }
            if save {
                settings.save(&path)?;
            }
            if settings.tray {
                // Everything present was just handled; only watch for new games
                let new_only = |d: &Decision| !matches!(d, Decision::RenameExisting { .. });
                watch(&settings, &new_only, DEFAULT_INTERVAL).await?;
            }
        }
        Command::Detect {
            ref source,
            yes,
            save,
        } => {
            let root = source.clone().unwrap_or_else(|| settings.source_dir.clone());
            let dir = ReplayDirectory::new(root).exclude_dirs(split_list(&settings.excludes.dirs));
            let found = identity::resolve(&dir, &JsonSidecarParser, prompt(yes).as_ref())?;
            println!("Player: {} (id {})", found.name, found.stable_id);
            if save {
                settings.set_operator(found.stable_id);
                settings.save(&path)?;
                println!("Saved player id to {}", path.display());
            }
        }
        Command::CheckTemplate { ref template } => {
            print_template_report(&Template::parse(template));
        }
        Command::Watch { yes, interval } => {
            watch(&settings, prompt(yes).as_ref(), interval).await?;
        }
        Command::Settings { ref action } => match action {
            SettingsAction::Show => {
                println!("# {}", path.display());
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            SettingsAction::Reset => {
                Settings::default().save(&path)?;
                println!("Reset {}", path.display());
            }
        },
    }
    Ok(())
}

async fn watch(settings: &Settings, confirm: &dyn Confirm, interval: u64) -> anyhow::Result<()> {
    let engine = AutoRenamer::start(
        settings.to_batch_config()?,
        JsonSidecarParser,
        FsEmitter,
        confirm,
        Duration::from_secs(interval.max(1)),
    )?;
    let events = engine.events();
    engine.send(EngineCommand::Start);
    println!("Watching {} (Ctrl-C to stop)", settings.source_dir.display());
    while let Ok(event) = events.recv().await {
        match event {
            EngineEvent::Tick(report) if report.emitted > 0 => {
                println!("Renamed {} new replays", report.emitted)
            }
            EngineEvent::Error(e) => eprintln!("error: {e}"),
            EngineEvent::Stopped => break,
            _ => {}
        }
    }
    Ok(())
}

fn print_template_report(template: &Template) {
    let names: Vec<&str> = template.variables().map(|v| v.name()).collect();
    let risk = match CollisionRisk::assess(template) {
        CollisionRisk::Unique => "low (unique per replay)",
        CollisionRisk::TimeResolved => "low (resolved to the second)",
        CollisionRisk::Risky => "HIGH: different replays may get the same name",
    };
    println!("Template:        {template}");
    println!("Variables:       {}", names.join(", "));
    println!("Collision risk:  {risk}");
    println!(
        "Needs player id: {}",
        if template.requires_identity() { "yes" } else { "no" }
    );
}

#[derive(Parser)]
#[command(version, about = "Rename StarCraft II replays from a filename template")]
pub struct Opts {
    /// Increase verbosity (-v, -vv). Default WARN.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Decrease verbosity (-q). Each -q reduces level by one step.
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rename every matching replay in the source folder
    Rename {
        /// Copy replays, leaving the originals in place
        #[arg(long, conflicts_with = "move")]
        copy: bool,
        /// Move replays (the default)
        #[arg(long = "move")]
        r#move: bool,
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        dest: Option<PathBuf>,
        #[arg(long)]
        template: Option<String>,
        /// Your stable player id, needed by $my*/$opp* variables
        #[arg(long)]
        player_id: Option<String>,
        /// Answer yes to every confirmation
        #[arg(short = 'y', long)]
        yes: bool,
        /// Save the effective settings
        #[arg(long)]
        save: bool,
    },
    /// Work out your player id from the replays in the source folder
    Detect {
        #[arg(long)]
        source: Option<PathBuf>,
        /// Accept the most frequent player without asking
        #[arg(short = 'y', long)]
        yes: bool,
        /// Store the accepted id in the settings file
        #[arg(long)]
        save: bool,
    },
    /// Show what a template references and whether it can produce duplicates
    CheckTemplate { template: String },
    /// Keep renaming new replays as they appear
    Watch {
        #[arg(short = 'y', long)]
        yes: bool,
        /// Seconds between folder polls
        #[arg(long, default_value_t = DEFAULT_INTERVAL)]
        interval: u64,
    },
    /// Inspect or reset the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Show,
    Reset,
}

