use std::fs::File;
use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskplan::{
    Config,
    cli::{AuthCommands, Cli, Commands, ConfigCommands, PlanArgs},
    core::{
        export::{self, ExportFormat},
        schema,
        storage::{PlanRecord, PlanStore},
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    init_logging(filter, runs_tui(&cli));
    tracing::debug!(version = %taskplan::build_info::version_string(), "starting taskplan");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn runs_tui(cli: &Cli) -> bool {
    matches!(
        (&cli.prompt, &cli.command),
        (None, None | Some(Commands::Tui))
    )
}

/// Log to stderr, or to a file while the TUI owns the terminal.
fn init_logging(filter: &str, tui: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter));

    if tui {
        let file = Config::log_path().and_then(|path| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(File::options().create(true).append(true).open(path)?)
        });
        if let Ok(file) = file {
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        return;
    }

    builder.with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Bare prompt = one-shot plan
    if let Some(prompt) = cli.prompt {
        if cli.command.is_some() {
            anyhow::bail!("Cannot use both a prompt and a subcommand");
        }
        return plan(PlanArgs::one_shot(prompt)).await;
    }

    // No subcommand = launch TUI
    let Some(command) = cli.command else {
        return taskplan::tui::run(&Config::load()?).await;
    };

    match command {
        Commands::Plan(args) => plan(args).await?,

        Commands::Tui => {
            taskplan::tui::run(&Config::load()?).await?;
        }

        Commands::Serve { host, port } => {
            let config = Config::load()?;
            let host = host.unwrap_or_else(|| config.api.host.clone());
            let port = port.unwrap_or(config.api.port);
            taskplan::api::serve(&config, &host, port).await?;
        }

        Commands::Last { format } => {
            let store = PlanStore::open_default()?;
            taskplan::cli::history::show_last(&store, format, &mut std::io::stdout())?;
        }

        Commands::History { command } => {
            let store = PlanStore::open_default()?;
            taskplan::cli::history::handle_history_command(
                &store,
                command,
                &mut std::io::stdout(),
            )?;
        }

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema::task_schema())?);
        }

        Commands::Auth { command } => match command {
            AuthCommands::Login(args) => {
                taskplan::cli::auth::auth_login(args, &Config::load()?)?;
            }
            AuthCommands::Logout => taskplan::cli::auth::auth_logout()?,
        },

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = Config::load()?;
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommands::Path => {
                let path = Config::config_path()?;
                println!("{}", path.display());
            }
            ConfigCommands::GenerateToken => {
                let token = taskplan::config::ApiConfig::generate_token();
                println!("Generated API token:\n");
                println!("  {token}\n");
                println!("Add to your config.toml:");
                println!("  [api]");
                println!("  token = \"{token}\"\n");
                println!("Or set environment variable:");
                println!("  export TASKPLAN_API_TOKEN=\"{token}\"");
            }
        },
    }

    Ok(())
}

/// Generate a plan, print it, and save it as the last plan.
async fn plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let service = config.create_service()?;

    let outcome = if args.no_cache {
        service.generate_uncached(&args.prompt).await?
    } else {
        service.generate(&args.prompt).await?
    };

    let record = PlanRecord::new(args.prompt.trim(), &outcome.model, outcome.tasks);

    let mut stdout = std::io::stdout();
    write!(stdout, "{}", export::render(&record, args.format)?)?;
    if args.format == ExportFormat::Json {
        writeln!(stdout)?;
    }

    if !args.no_save && config.planner.save_last {
        match PlanStore::open_default().and_then(|store| Ok(store.save(&record)?)) {
            Ok(()) => tracing::info!(id = %record.id, "saved plan"),
            Err(e) => tracing::warn!(error = %e, "failed to save plan"),
        }
    }

    Ok(())
}
