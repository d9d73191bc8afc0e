use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use task_cli::config::Config;
use task_cli::{Commands, run_command};
use todo_list::{HttpTaskStore, InMemoryTaskStore, TaskListController, TaskStore};
use tracing_subscriber::EnvFilter;

/// Farm task manager for the terminal
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file to read instead of `task-cli/config`
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the task API, e.g. http://localhost:5000/api
    #[arg(long)]
    base_url: Option<String>,
    /// Use a local demo list instead of the API
    #[arg(long)]
    offline: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

async fn run<S: TaskStore + ?Sized + 'static>(store: Arc<S>, command: Commands) -> anyhow::Result<()> {
    let controller = TaskListController::new(store);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_command(&controller, command, stdin, &mut stdout).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    config.offline |= cli.offline;
    let command = cli.command.unwrap_or(Commands::List);

    if config.offline {
        tracing::info!("Running offline with demo tasks");
        run(Arc::new(InMemoryTaskStore::with_demo_tasks()), command).await
    } else {
        tracing::info!("Using task API at {}", config.base_url);
        run(Arc::new(HttpTaskStore::new(config.store_config())?), command).await
    }
}
