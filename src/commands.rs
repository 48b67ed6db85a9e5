//! Line-oriented console commands over a [`TimerController`].
//!
//! Each handler returns `Result<String, String>`: the text to print, or a
//! message for the person at the keyboard.

use std::path::{Path, PathBuf};

use crate::{
    error::DebateError,
    models::{DebateSession, ExportFile},
    timer::TimerController,
};

pub const HELP: &str = "\
formats                     list formats
use <format>                switch the live round to a format
default <format>            make a format the startup default
import-format <file>        add a custom format from a JSON file
export-format <format>      write a format to a JSON file
delete-format <format>      remove a custom format
status                      show every timer
start <id> | stop [<id>]    start a timer (stops the running one) or stop
toggle <id>                 start if idle, stop if running
reset [<id>]                zero one timer, or all of them
round <label>               set the round label
teams <aff> <neg>           set both team codes
log                         show the audit log
new                         save this round to history and start a fresh one
export                      write this round to a session file
import <file>               replace this round with a session file
history                     list recent rounds
load <id> | forget <id>     reopen or delete a saved round
clear-history               delete every saved round
help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Formats,
    Use(String),
    Default(String),
    ImportFormat(PathBuf),
    ExportFormat(String),
    DeleteFormat(String),
    Status,
    Start(String),
    Stop(Option<String>),
    Toggle(String),
    Reset(Option<String>),
    Round(String),
    Teams { affirmative: String, negative: String },
    Log,
    New,
    Export,
    Import(PathBuf),
    History,
    Load(String),
    Forget(String),
    ClearHistory,
    Help,
    Quit,
}

pub enum Reply {
    Text(String),
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let required = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("{verb} needs a {what}"))
        } else {
            Ok(rest.to_string())
        }
    };
    let optional = || (!rest.is_empty()).then(|| rest.to_string());

    let command = match verb.to_ascii_lowercase().as_str() {
        "formats" => Command::Formats,
        "use" => Command::Use(required("format name")?),
        "default" => Command::Default(required("format name")?),
        "import-format" => Command::ImportFormat(PathBuf::from(required("file path")?)),
        "export-format" => Command::ExportFormat(required("format name")?),
        "delete-format" => Command::DeleteFormat(required("format name")?),
        "status" | "timers" => Command::Status,
        "start" => Command::Start(required("timer id")?),
        "stop" => Command::Stop(optional()),
        "toggle" => Command::Toggle(required("timer id")?),
        "reset" => Command::Reset(optional()),
        "round" => Command::Round(rest.to_string()),
        "teams" => {
            let mut codes = rest.split_whitespace();
            match (codes.next(), codes.next(), codes.next()) {
                (Some(affirmative), Some(negative), None) => Command::Teams {
                    affirmative: affirmative.to_string(),
                    negative: negative.to_string(),
                },
                _ => return Err("teams needs exactly two codes: teams <aff> <neg>".into()),
            }
        }
        "log" => Command::Log,
        "new" => Command::New,
        "export" => Command::Export,
        "import" => Command::Import(PathBuf::from(required("file path")?)),
        "history" => Command::History,
        "load" => Command::Load(required("session id")?),
        "forget" => Command::Forget(required("session id")?),
        "clear-history" => Command::ClearHistory,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try help)")),
    };
    Ok(Some(command))
}

fn user_error(err: DebateError) -> String {
    log::warn!("{err}");
    err.user_message()
}

async fn read_file(path: &Path) -> Result<String, String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("Could not read {}: {err}", path.display()))
}

async fn write_export(dir: &Path, file: ExportFile) -> Result<String, String> {
    let path = dir.join(&file.file_name);
    tokio::fs::write(&path, file.contents)
        .await
        .map_err(|err| format!("Could not write {}: {err}", path.display()))?;
    Ok(format!("Wrote {}", path.display()))
}

/// Runs one command. Export files land in `export_dir`.
pub async fn execute(
    controller: &TimerController,
    command: Command,
    export_dir: &Path,
) -> Result<Reply, String> {
    let text = match command {
        Command::Help => HELP.to_string(),
        Command::Quit => {
            controller.shutdown().await;
            return Ok(Reply::Quit);
        }
        Command::Formats => {
            controller
                .with_round(|round| {
                    round
                        .catalog()
                        .summaries()
                        .iter()
                        .map(|summary| {
                            let mut tags = Vec::new();
                            if summary.name == round.format().name {
                                tags.push("live");
                            }
                            if summary.is_default {
                                tags.push("default");
                            }
                            if summary.is_builtin {
                                tags.push("built-in");
                            }
                            format!(
                                "{:<20} {:<40} {} [{}]",
                                summary.name,
                                summary.description,
                                summary.counts_label(),
                                tags.join(", ")
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .await
        }
        Command::Use(name) => {
            controller
                .with_round(|round| round.select_format(&name))
                .await
                .map_err(user_error)?;
            format!("Now timing {name}")
        }
        Command::Default(name) => {
            controller
                .with_round(|round| round.catalog_mut().set_default(&name))
                .await
                .map_err(user_error)?;
            format!("{name} is now the default format")
        }
        Command::ImportFormat(path) => {
            let raw = read_file(&path).await?;
            controller
                .with_round(|round| {
                    round
                        .catalog_mut()
                        .import_format(&raw)
                        .map(|format| format!("Imported format {}", format.name))
                })
                .await
                .map_err(user_error)?
        }
        Command::ExportFormat(name) => {
            let file = controller
                .with_round(|round| round.catalog().export_format(&name))
                .await
                .map_err(user_error)?;
            write_export(export_dir, file).await?
        }
        Command::DeleteFormat(name) => {
            controller
                .with_round(|round| round.catalog_mut().delete_format(&name))
                .await
                .map_err(user_error)?;
            format!("Deleted format {name}")
        }
        Command::Status => render_status(controller).await,
        Command::Start(id) => {
            controller.start_timer(&id).await.map_err(user_error)?;
            format!("{id} running")
        }
        Command::Stop(None) => {
            controller.stop_timer().await;
            "Stopped".to_string()
        }
        Command::Stop(Some(id)) => {
            controller
                .with_round(|round| round.stop(&id))
                .await
                .map_err(user_error)?;
            format!("{id} stopped")
        }
        Command::Toggle(id) => {
            controller.toggle_timer(&id).await.map_err(user_error)?;
            render_status(controller).await
        }
        Command::Reset(Some(id)) => {
            controller
                .with_round(|round| round.reset(&id))
                .await
                .map_err(user_error)?;
            format!("{id} reset")
        }
        Command::Reset(None) => {
            controller.with_round(|round| round.reset_all()).await;
            "All timers reset".to_string()
        }
        Command::Round(label) => {
            controller
                .with_round(|round| round.set_round_label(&label))
                .await;
            format!("Round label set to '{}'", label.trim())
        }
        Command::Teams {
            affirmative,
            negative,
        } => {
            controller
                .with_round(|round| round.set_teams(&affirmative, &negative))
                .await;
            format!("{affirmative} (aff) vs {negative} (neg)")
        }
        Command::Log => {
            let rows = controller.with_round(|round| round.audit_view()).await;
            if rows.is_empty() {
                "No events yet".to_string()
            } else {
                rows.iter()
                    .map(|row| {
                        format!(
                            "{}  {:<5} {:<20} {:<11} {:>9}  {} vs {}",
                            row.timestamp,
                            row.label,
                            row.timer_id,
                            row.side,
                            row.elapsed,
                            row.aff_code,
                            row.neg_code
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::New => {
            let saved = controller.new_round().await.map_err(user_error)?;
            format!("Saved round {} to history", describe_session(&saved))
        }
        Command::Export => {
            let file = controller.export_session().await.map_err(user_error)?;
            write_export(export_dir, file).await?
        }
        Command::Import(path) => {
            let raw = read_file(&path).await?;
            controller.import_session(&raw).await.map_err(user_error)?;
            render_status(controller).await
        }
        Command::History => {
            controller
                .with_round(|round| {
                    let entries = round.history().entries();
                    if entries.is_empty() {
                        "No saved rounds".to_string()
                    } else {
                        entries
                            .iter()
                            .map(describe_session)
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                })
                .await
        }
        Command::Load(id) => {
            controller
                .with_round(|round| round.load_from_history(&id))
                .await
                .map_err(user_error)?;
            render_status(controller).await
        }
        Command::Forget(id) => {
            let removed = controller
                .with_round(|round| round.delete_from_history(&id))
                .await
                .map_err(user_error)?;
            if removed {
                format!("Deleted {id}")
            } else {
                format!("No saved round {id}")
            }
        }
        Command::ClearHistory => {
            controller
                .with_round(|round| round.clear_history())
                .await
                .map_err(user_error)?;
            "History cleared".to_string()
        }
    };
    Ok(Reply::Text(text))
}

fn describe_session(session: &DebateSession) -> String {
    format!(
        "{}  {:<12} {:<16} {} vs {}  ({} events)",
        session.id,
        if session.round.is_empty() { "-" } else { session.round.as_str() },
        session.format.as_deref().unwrap_or("-"),
        session.teams.affirmative,
        session.teams.negative,
        session.audit_log.len()
    )
}

async fn render_status(controller: &TimerController) -> String {
    let snapshot = controller.get_snapshot().await;
    let mut lines = vec![format!(
        "{}  round '{}'  {} vs {}  session {}",
        snapshot.format,
        snapshot.context.round_label,
        snapshot.context.teams.affirmative,
        snapshot.context.teams.negative,
        snapshot.context.session_id
    )];
    lines.extend(snapshot.segments.iter().map(|segment| {
        let marker = if snapshot.active_segment.as_deref() == Some(segment.id.as_str()) {
            '>'
        } else {
            ' '
        };
        format!(
            "{marker} {:<11} {:<20} {:<28} {:>10}{}",
            segment.side.as_str(),
            segment.id,
            segment.name,
            segment.display,
            if segment.is_over { "  OVER" } else { "" }
        )
    }));
    lines.join("\n")
}
