//! Built-in commands.
//!
//! Every command works only through [`ShellContext`](super::ShellContext).

mod cat;
mod cd;
mod checksum;
mod date;
mod echo;
mod env;
mod grep;
mod head;
mod help;
mod hostname;
mod ln;
mod ls;
mod mkdir;
mod mv;
mod pwd;
mod readlink;
mod rm;
mod rmdir;
mod stat;
mod status;
mod touch;
mod uname;
mod wc;
mod whoami;

use linsim_types::{OperationError, ResolveError};

use super::CommandTable;

/// Register all built-in commands with the table.
pub fn register_builtins(table: &mut CommandTable) {
    table.register(cat::Cat);
    table.register(cd::Cd);
    table.register(pwd::Pwd);
    table.register(ls::Ls);
    table.register(stat::Stat);
    table.register(mkdir::Mkdir);
    table.register(rmdir::Rmdir);
    table.register(rm::Rm);
    table.register(mv::Mv);
    table.register(ln::Ln);
    table.register(touch::Touch);
    table.register(readlink::Readlink);
    table.register(echo::Echo);
    table.register(env::Env);
    table.register(env::Export);
    table.register(env::Unset);
    table.register(hostname::Hostname);
    table.register(uname::Uname);
    table.register(whoami::Whoami);
    table.register(whoami::Id);
    table.register(date::Date);
    table.register(head::Head);
    table.register(wc::Wc);
    table.register(grep::Grep);
    table.register(checksum::Checksum::md5());
    table.register(checksum::Checksum::sha1());
    table.register(checksum::Checksum::sha256());
    table.register(status::True);
    table.register(status::False);
    table.register(help::Help);
}

/// The coreutils-style reason text for an error, without any path.
pub(crate) fn reason(err: &OperationError) -> String {
    match err {
        OperationError::Resolve(ResolveError::NotFound { .. }) => "No such file or directory".into(),
        OperationError::Resolve(ResolveError::NotADirectory(_)) | OperationError::NotADirectory(_) => {
            "Not a directory".into()
        }
        OperationError::Resolve(ResolveError::TooManyLinks(_)) => {
            "Too many levels of symbolic links".into()
        }
        OperationError::NotReadable(_) => "Not a regular file".into(),
        OperationError::DirectoryNotEmpty(_) => "Directory not empty".into(),
        OperationError::IsADirectory(_) => "Is a directory".into(),
        OperationError::AlreadyExists(_) => "File exists".into(),
        OperationError::PermissionDenied(_) => "Permission denied".into(),
        OperationError::InvalidArgument(msg) => msg.clone(),
        OperationError::Collaborator(_) => "Input/output error".into(),
    }
}

/// Reason text for a resolution failure.
pub(crate) fn resolve_reason(err: &ResolveError) -> String {
    reason(&OperationError::Resolve(err.clone()))
}

/// Render a byte slice as lowercase hex.
pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::super::{Command, Dispatcher, ExecResult, HostInfo, ShellContext};
    use crate::content::ContentProvider;
    use crate::loader::load_tree;
    use crate::store::MemoryStore;
    use crate::vfs::Vfs;

    /// Root session on the standard host.
    pub fn make_ctx() -> ShellContext {
        make_ctx_as("root")
    }

    pub fn make_ctx_as(user: &str) -> ShellContext {
        let (records, contents) = linsim_testutil::standard_host().into_parts();
        let store = Arc::new(MemoryStore::from_parts(records, contents));
        let tree = load_tree(store.as_ref(), |_, _| {}).unwrap();
        let vfs = Arc::new(Vfs::new(tree, store.clone()));
        let dispatcher = Dispatcher::new(
            vfs,
            ContentProvider::new(store),
            HostInfo::new("web01.example.com"),
        );
        dispatcher.open_context(user)
    }

    /// Parse `argv` against the command's schema and run it.
    pub fn run(command: &dyn Command, ctx: &mut ShellContext, argv: &[&str]) -> ExecResult {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        match command.schema().parse(&argv) {
            Ok(args) => command.execute(args, ctx),
            Err(e) => ExecResult::failure(2, e.to_string()),
        }
    }
}
