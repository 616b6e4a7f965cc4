//! Command dispatch.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::context::ShellContext;
use super::host::HostInfo;
use super::registry::CommandTable;
use super::result::ExecResult;
use crate::content::ContentProvider;
use crate::vfs::Vfs;

/// Why a command line was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("empty command line")]
    Empty,

    #[error("{0}: command not found")]
    Unrecognized(String),
}

/// Routes argument vectors to command handlers.
///
/// Holds the shared tree and the read-only command table; all per-session
/// state lives in the [`ShellContext`] passed to [`execute`](Self::execute).
pub struct Dispatcher {
    table: Arc<CommandTable>,
    vfs: Arc<Vfs>,
    content: ContentProvider,
    host: Arc<HostInfo>,
}

impl Dispatcher {
    /// Dispatcher with every built-in command.
    pub fn new(vfs: Arc<Vfs>, content: ContentProvider, host: HostInfo) -> Self {
        Self::with_table(vfs, content, host, CommandTable::with_builtins())
    }

    pub fn with_table(
        vfs: Arc<Vfs>,
        content: ContentProvider,
        host: HostInfo,
        table: CommandTable,
    ) -> Self {
        Self {
            table: Arc::new(table),
            vfs,
            content,
            host: Arc::new(host),
        }
    }

    pub fn vfs(&self) -> &Arc<Vfs> {
        &self.vfs
    }

    pub fn content(&self) -> &ContentProvider {
        &self.content
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Fresh context for `user`.
    pub fn open_context(&self, user: &str) -> ShellContext {
        ShellContext::login(
            Arc::clone(&self.vfs),
            self.content.clone(),
            Arc::clone(&self.host),
            Arc::clone(&self.table),
            user,
        )
    }

    /// Run `argv[0]` with the remaining arguments.
    ///
    /// The dispatcher never prints. The working directory is re-checked
    /// before and after every command: another session may have removed
    /// it, or the command itself may.
    pub fn execute(
        &self,
        ctx: &mut ShellContext,
        argv: &[String],
    ) -> Result<ExecResult, DispatchError> {
        let (name, rest) = argv.split_first().ok_or(DispatchError::Empty)?;
        let (command, schema) = self
            .table
            .get(name)
            .ok_or_else(|| DispatchError::Unrecognized(name.clone()))?;

        debug!(command = %name, args = rest.len(), "dispatch");
        ctx.ensure_cwd();
        let result = match schema.parse(rest) {
            Ok(args) => command.execute(args, ctx),
            Err(e) => ExecResult::failure(2, e.to_string()),
        };
        ctx.ensure_cwd();
        ctx.set_last_status(result.code);
        debug!(command = %name, code = result.code, "completed");
        Ok(result)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .field("host", &self.host.hostname)
            .finish_non_exhaustive()
    }
}
