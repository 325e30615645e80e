use std::fs::File;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use japps::api::HubClient;
use japps::cli::prompt::{AssumeYes, Confirm, StdinConfirm};
use japps::cli::{CliError, Command, Launcher};
use japps::core::ActionKind;
use japps::core::config::{self, CliOverrides};

#[derive(Parser)]
#[command(name = "japps", about = "Start, stop and delete JupyterHub apps")]
struct Args {
    /// Base URL of the apps service (overrides config and JAPPS_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Hub API token (overrides config and JUPYTERHUB_API_TOKEN)
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let cli = CliOverrides {
        base_url: args.base_url.clone(),
        api_token: args.token.clone(),
    };
    let resolved = config::resolve(&file_config, &cli);

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = resolved
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Debug);
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!("japps starting up against {}", resolved.base_url);

    let client = match HubClient::new(resolved.hub_client_config()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let launcher = Launcher::new(Arc::new(client));

    match run(&launcher, &args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(launcher: &Launcher, command: &Command) -> Result<(), CliError> {
    let mut out = io::stdout();
    match command {
        Command::List => launcher.list(&mut out).await,
        Command::Frameworks => launcher.frameworks(&mut out).await,
        Command::Menu { id } => launcher.menu(id, &mut out).await,
        Command::Start { id, yes } => run_action(launcher, ActionKind::Start, id, *yes).await,
        Command::Stop { id, yes } => run_action(launcher, ActionKind::Stop, id, *yes).await,
        Command::Delete { id, yes } => run_action(launcher, ActionKind::Delete, id, *yes).await,
        Command::Create {
            name,
            framework,
            filepath,
            description,
        } => launcher
            .create(
                name,
                framework,
                filepath.as_deref(),
                description.as_deref(),
                &mut out,
            )
            .await
            .map(|_| ()),
    }
}

async fn run_action(
    launcher: &Launcher,
    kind: ActionKind,
    id: &str,
    yes: bool,
) -> Result<(), CliError> {
    let mut answers: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };
    launcher
        .run_action(kind, id, answers.as_mut(), &mut io::stdout())
        .await
        .map(|_| ())
}
