//! Interactive task session: one line per intent, the list redrawn after each.

use crate::CliError;
use std::io::Write;
use todo_list::{Intent, Notification, TaskListController, TaskListView, TaskStore, dispatch};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const HELP: &str = "\
Commands:
  a <text>   add a task
  t <n|id>   toggle a task done/open
  d <n|id>   delete a task
  r          reload the list
  h          show this help
  q          quit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Vec<Intent>),
    Help,
    Quit,
    Nothing,
}

/// Parses one input line against the rows currently on screen.
pub fn parse_line(line: &str, view: &TaskListView) -> Result<Command, CliError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let resolve = |rest: &str| -> Result<_, CliError> {
        if rest.is_empty() {
            return Err(CliError::MissingArgument("task number or id"));
        }
        view.resolve(rest)
            .ok_or_else(|| CliError::UnknownTask(rest.to_string()))
    };

    match verb {
        "" => Ok(Command::Nothing),
        "a" | "add" => Ok(Command::Run(vec![
            Intent::EditDraft(rest.to_string()),
            Intent::Submit,
        ])),
        "t" | "toggle" => Ok(Command::Run(vec![Intent::Toggle(resolve(rest)?)])),
        "d" | "delete" | "rm" => Ok(Command::Run(vec![Intent::Delete(resolve(rest)?)])),
        "r" | "refresh" => Ok(Command::Run(vec![Intent::Refresh])),
        "h" | "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(CliError::UnknownCommand(other.to_string())),
    }
}

/// Writes every pending notification.
pub fn drain_notifications(
    notifications: &mut broadcast::Receiver<Notification>,
    output: &mut impl Write,
) -> std::io::Result<()> {
    loop {
        match notifications.try_recv() {
            Ok(notification) => writeln!(output, "! {}", notification)?,
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                writeln!(output, "! {} more notifications were dropped", skipped)?
            }
            Err(_) => return Ok(()),
        }
    }
}

/// Waits for background store calls so their outcome is on screen, and in
/// the store, before the session moves on.
async fn settle(pending: Vec<JoinHandle<()>>) {
    for update in pending {
        if let Err(err) = update.await {
            tracing::error!("Background update did not finish: {}", err);
        }
    }
}

/// Runs the session until `q` or end of input.
///
/// Failed store calls are reported through notifications and never end the
/// session.
pub async fn run_session<S, R, W>(
    controller: &TaskListController<S>,
    input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    S: TaskStore + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut notifications = controller.subscribe();
    if controller.refresh().await.is_err() {
        tracing::debug!("Initial load failed");
    }
    drain_notifications(&mut notifications, output)?;
    write!(output, "{}", TaskListView::from(controller))?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let view = TaskListView::from(controller);
        match parse_line(&line, &view) {
            Ok(Command::Quit) => break,
            Ok(Command::Nothing) => continue,
            Ok(Command::Help) => writeln!(output, "{}", HELP)?,
            Ok(Command::Run(intents)) => {
                let mut pending = Vec::new();
                for intent in intents {
                    // Failures are already published as notifications.
                    match dispatch(controller, intent).await {
                        Ok(Some(update)) => pending.push(update),
                        Ok(None) => {}
                        Err(err) => {
                            tracing::debug!("Intent failed: {}", err);
                            break;
                        }
                    }
                }
                settle(pending).await;
                drain_notifications(&mut notifications, output)?;
                write!(output, "{}", TaskListView::from(controller))?;
            }
            Err(err) => writeln!(output, "{}", err)?,
        }
        output.flush()?;
    }
    Ok(())
}
