pub mod config;
pub mod session;

use clap::Subcommand;
use std::io::Write;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use todo_list::{Notification, TaskListController, TaskListView, TaskStore};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("Unknown command '{0}', type h for help")]
    UnknownCommand(String),
    #[error("No task matches '{0}'")]
    UnknownTask(String),
    #[error("Missing {0}")]
    MissingArgument(&'static str),
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show the task list
    List,
    /// Add a task
    Add { description: String },
    /// Mark a task done, or open again
    Toggle {
        /// Row number as shown by `list`, or the task id
        task: String,
    },
    /// Delete a task
    Remove {
        /// Row number as shown by `list`, or the task id
        task: String,
    },
    /// Keep the list open and edit it interactively
    Watch,
}

/// Runs a one-shot command: loads the list, applies the change, prints the
/// resulting list.
///
/// `watch` hands over to an interactive session reading `input`; the session
/// does its own, failure tolerant, first load.
pub async fn run_command<S, R, W>(
    controller: &TaskListController<S>,
    command: Commands,
    input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    S: TaskStore + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Commands::Watch = command {
        writeln!(output, "{}", session::HELP)?;
        return session::run_session(controller, input, output).await;
    }

    controller.refresh().await?;
    let view = TaskListView::from(controller);
    let resolve = |task: &str| {
        view.resolve(task)
            .ok_or_else(|| CliError::UnknownTask(task.to_string()))
    };

    match command {
        // Watch returned above.
        Commands::List | Commands::Watch => {}
        Commands::Add { description } => {
            controller.set_draft(description);
            controller.submit_draft().await?;
        }
        Commands::Toggle { task } => {
            let id = resolve(&task)?;
            let mut notifications = controller.subscribe();
            if let Some(update) = controller.toggle(&id) {
                update.await?;
            }
            if let Ok(Notification::ToggleReverted { error, .. }) = notifications.try_recv() {
                return Err(error.into());
            }
        }
        Commands::Remove { task } => {
            let id = resolve(&task)?;
            controller.remove(&id).await?;
        }
    }

    write!(output, "{}", TaskListView::from(controller))?;
    Ok(())
}
