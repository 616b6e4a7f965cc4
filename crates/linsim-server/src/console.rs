//! Administrative console on the controlling terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use linsim_kernel::{Dispatcher, Outcome, ShellSession};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing::info;

use crate::config::Config;
use crate::listeners::Listeners;
use crate::logging;

/// Lines shown by "View logs".
const LOG_TAIL: usize = 50;

const MENU: &str = "\
Administrative Console
======================
1.) Open console
2.) View logs
3.) Show configuration
4.) Show status
5.) Shutdown
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    OpenConsole,
    ViewLogs,
    ShowConfiguration,
    ShowStatus,
    Shutdown,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().trim_end_matches(['.', ')']) {
            "1" => Some(MenuChoice::OpenConsole),
            "2" => Some(MenuChoice::ViewLogs),
            "3" => Some(MenuChoice::ShowConfiguration),
            "4" => Some(MenuChoice::ShowStatus),
            "5" => Some(MenuChoice::Shutdown),
            _ => None,
        }
    }
}

/// The running host as seen from the console.
pub struct Console {
    dispatcher: Arc<Dispatcher>,
    config: Config,
    log_path: PathBuf,
    listeners: Listeners,
    started: Instant,
}

impl Console {
    pub fn new(dispatcher: Arc<Dispatcher>, config: Config, log_path: PathBuf, listeners: Listeners) -> Self {
        Self {
            dispatcher,
            config,
            log_path,
            listeners,
            started: Instant::now(),
        }
    }

    /// Show the menu until "Shutdown" or end of input, then stop the
    /// listeners.
    pub fn run(self) -> Result<()> {
        let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

        loop {
            println!("\n{MENU}");
            let line = match rl.readline("> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            };

            match MenuChoice::parse(&line) {
                Some(MenuChoice::OpenConsole) => self.open_console(&mut rl),
                Some(MenuChoice::ViewLogs) => self.view_logs(),
                Some(MenuChoice::ShowConfiguration) => self.show_configuration(),
                Some(MenuChoice::ShowStatus) => println!("{}", self.status()),
                Some(MenuChoice::Shutdown) => break,
                None => println!("Invalid option"),
            }
        }

        println!("Shutting down...");
        info!("shutdown requested from console");
        self.listeners.shutdown();
        Ok(())
    }

    fn open_console(&self, rl: &mut Editor<(), DefaultHistory>) {
        let mut session = ShellSession::login(Arc::clone(&self.dispatcher), "root");
        info!("console session opened");
        loop {
            match rl.readline(&session.prompt()) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match session.handle_line(&line) {
                        Outcome::Exit(_) => {
                            println!("logout");
                            break;
                        }
                        outcome => print!("{}", outcome.render()),
                    }
                }
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => {
                    println!("logout");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }
        info!("console session closed");
    }

    fn view_logs(&self) {
        match logging::tail(&self.log_path, LOG_TAIL) {
            Ok(lines) if lines.is_empty() => println!("(log is empty: {})", self.log_path.display()),
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }

    fn show_configuration(&self) {
        match self.config.effective().and_then(|config| config.to_toml()) {
            Ok(text) => print!("{text}"),
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }

    fn status(&self) -> String {
        status_report(
            &self.config.hostname,
            self.dispatcher.vfs().len(),
            self.started.elapsed(),
            &self.listeners.describe(),
        )
    }
}

/// Text of "Show status".
pub fn status_report(hostname: &str, entries: usize, uptime: Duration, listeners: &[String]) -> String {
    let mut out = format!(
        "Host:       {hostname}\nUptime:     {}\nFilesystem: {entries} entries\nListeners:  {}\n",
        format_uptime(uptime),
        listeners.len()
    );
    for listener in listeners {
        out.push_str("  ");
        out.push_str(listener);
        out.push('\n');
    }
    out
}

/// `1d 02:03:04` style.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let clock = format!("{:02}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 {
        format!("{days}d {clock}")
    } else {
        clock
    }
}
