//! Interactive session loop state.
//!
//! A session owns one [`ShellContext`] and walks each line through
//! `AwaitingInput → Parsed → Dispatched → (Completed | Failed) →
//! AwaitingInput`. `exit` and `logout` are handled here, above the
//! dispatcher, and move the session to `Exited` for good.

use std::sync::Arc;

use tracing::{trace, warn};

use super::context::ShellContext;
use super::dispatch::{DispatchError, Dispatcher};
use super::line;
use super::result::ExecResult;

/// Where a session is in handling a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Parsed,
    Dispatched,
    Completed,
    Failed,
    Exited,
}

impl SessionState {
    fn can_become(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (AwaitingInput, Parsed)
                | (AwaitingInput, Failed)
                | (Parsed, Dispatched)
                | (Parsed, AwaitingInput)
                | (Parsed, Exited)
                | (Dispatched, Completed)
                | (Dispatched, Failed)
                | (Completed, AwaitingInput)
                | (Failed, AwaitingInput)
        )
    }
}

/// What happened to one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(ExecResult),
    Failed(ExecResult),
    /// The session is over, with this exit status.
    Exit(i32),
}

impl Outcome {
    /// Text to show the user: output followed by diagnostics, each
    /// diagnostic line newline-terminated.
    pub fn render(&self) -> String {
        match self {
            Outcome::Completed(result) | Outcome::Failed(result) => {
                let mut text = result.out.clone();
                for line in result.err.lines() {
                    text.push_str(line);
                    text.push('\n');
                }
                text
            }
            Outcome::Exit(_) => String::new(),
        }
    }
}

/// One interactive shell.
pub struct ShellSession {
    dispatcher: Arc<Dispatcher>,
    ctx: ShellContext,
    state: SessionState,
}

impl ShellSession {
    /// Start a session for `user`.
    pub fn login(dispatcher: Arc<Dispatcher>, user: &str) -> Self {
        let ctx = dispatcher.open_context(user);
        Self {
            dispatcher,
            ctx,
            state: SessionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn is_exited(&self) -> bool {
        self.state == SessionState::Exited
    }

    /// `user@host:dir# `, with `$` for non-root and `~` for home.
    pub fn prompt(&self) -> String {
        let cwd = self.ctx.cwd();
        let home = self.ctx.home();
        let dir = if cwd == home {
            "~".to_string()
        } else if home != "/" && cwd.starts_with(home) && cwd.as_bytes().get(home.len()) == Some(&b'/') {
            format!("~{}", &cwd[home.len()..])
        } else {
            cwd.to_string()
        };
        let sigil = if self.ctx.credentials().is_root() { '#' } else { '$' };
        format!("{}@{}:{}{} ", self.ctx.user(), self.ctx.host().short_name, dir, sigil)
    }

    /// Handle one line of input.
    pub fn handle_line(&mut self, input: &str) -> Outcome {
        if self.is_exited() {
            return Outcome::Exit(self.ctx.last_status());
        }

        let last = self.ctx.last_status();
        let words = line::split(input.trim(), |name| match name {
            "?" => Some(last.to_string()),
            other => self.ctx.var(other).map(str::to_string),
        });
        let words = match words {
            Ok(words) => words,
            Err(e) => {
                self.ctx.set_last_status(2);
                let result = ExecResult::failure(2, format!("{}: {e}", self.shell_name()));
                return self.finish(SessionState::Failed, result);
            }
        };
        self.transition(SessionState::Parsed);

        let Some(first) = words.first() else {
            self.transition(SessionState::AwaitingInput);
            return Outcome::Completed(ExecResult::default());
        };
        if first == "exit" || first == "logout" {
            let code = words
                .get(1)
                .and_then(|c| c.parse::<i32>().ok())
                .unwrap_or(last);
            self.transition(SessionState::Exited);
            return Outcome::Exit(code);
        }

        self.transition(SessionState::Dispatched);
        match self.dispatcher.execute(&mut self.ctx, &words) {
            Ok(result) if result.ok() => self.finish(SessionState::Completed, result),
            Ok(result) => self.finish(SessionState::Failed, result),
            Err(DispatchError::Unrecognized(name)) => {
                self.ctx.set_last_status(127);
                let result =
                    ExecResult::failure(127, format!("{}: {name}: command not found", self.shell_name()));
                self.finish(SessionState::Failed, result)
            }
            Err(DispatchError::Empty) => self.finish(SessionState::Completed, ExecResult::default()),
        }
    }

    fn shell_name(&self) -> &str {
        &self.dispatcher.host().shell_name
    }

    fn finish(&mut self, state: SessionState, result: ExecResult) -> Outcome {
        self.transition(state);
        self.transition(SessionState::AwaitingInput);
        match state {
            SessionState::Completed => Outcome::Completed(result),
            _ => Outcome::Failed(result),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_become(next) {
            warn!(from = ?self.state, to = ?next, "unexpected session transition");
        }
        trace!(from = ?self.state, to = ?next, "session");
        self.state = next;
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("ctx", &self.ctx)
            .field("state", &self.state)
            .finish()
    }
}
