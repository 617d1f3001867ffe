// src/report/notify.rs

//! User-visible notifications for contained build errors.

use std::io::Write as _;
use std::process::{Command, Stdio};

use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::config::NotifySection;
use crate::report::{ErrorRecord, ErrorSink};

/// Something that can put a short message in front of the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Prints a highlighted banner to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, message: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{} {}", " ERROR ".on_red().white().bold(), title.bold());
        for line in message.lines() {
            let _ = writeln!(stderr, "  {}", line.red());
        }
    }
}

/// Runs `<command...> <title> <message>` for every notification.
///
/// The command is whitespace-split. It runs in the background and is reaped
/// by a detached waiter thread once it exits.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: String,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, message: &str) {
        let mut parts = self.command.split_whitespace();
        let Some(program) = parts.next() else {
            return;
        };

        let spawned = Command::new(program)
            .args(parts)
            .arg(title)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                warn!(command = %self.command, "failed to run notification command: {err}");
                return;
            }
        };
        debug!(command = %self.command, pid = child.id(), "notification sent");

        let command = self.command.clone();
        let reaper = std::thread::Builder::new()
            .name("bazbuild-notify".into())
            .spawn(move || match child.wait() {
                Ok(status) if !status.success() => {
                    debug!(command = %command, %status, "notification command exited")
                }
                Ok(_) => {}
                Err(err) => warn!(command = %command, "failed to wait for notification command: {err}"),
            });
        if let Err(err) = reaper {
            warn!(command = %self.command, "failed to start notification waiter: {err}");
        }
    }
}

/// Error sink forwarding every record to a [`Notifier`].
pub struct NotifySink {
    notifier: Box<dyn Notifier>,
}

impl NotifySink {
    pub fn new(notifier: impl Notifier + 'static) -> Self {
        Self {
            notifier: Box::new(notifier),
        }
    }

    /// External command if configured, terminal banner otherwise.
    pub fn from_config(section: &NotifySection) -> Self {
        match section.command.as_deref().map(str::trim) {
            Some(command) if !command.is_empty() => Self::new(CommandNotifier::new(command)),
            _ => Self::new(TerminalNotifier),
        }
    }
}

impl std::fmt::Debug for NotifySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySink").finish_non_exhaustive()
    }
}

impl ErrorSink for NotifySink {
    fn report(&self, record: &ErrorRecord) {
        let title = format!("bazbuild: {} failed", record.task);
        let message = format!("Error: {}", record.message);
        self.notifier.notify(&title, &message);
    }
}
