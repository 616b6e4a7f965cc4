//! whoami, id — Print user identity.

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// Whoami command: print the session user.
pub struct Whoami;

impl Command for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("whoami", "Print effective user name")
    }

    fn execute(&self, _args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        ExecResult::success(format!("{}\n", ctx.user()))
    }
}

/// Id command: print user and group ids.
pub struct Id;

impl Command for Id {
    fn name(&self) -> &str {
        "id"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("id", "Print real and effective user and group IDs")
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        let accounts = ctx.accounts();
        let (name, uid, gid) = match args.positional.first() {
            None => {
                let cred = ctx.credentials();
                (ctx.user().to_string(), cred.uid, cred.gid)
            }
            Some(name) => match accounts.user(name) {
                Some(user) => (user.name.clone(), user.uid, user.gid),
                None => return ExecResult::failure(1, format!("id: '{name}': no such user")),
            },
        };

        let groups = accounts
            .groups_of(&name, gid)
            .into_iter()
            .map(|g| format!("{g}({})", accounts.group_name(g)))
            .collect::<Vec<_>>()
            .join(",");
        ExecResult::success(format!(
            "uid={uid}({}) gid={gid}({}) groups={groups}\n",
            accounts.user_name(uid),
            accounts.group_name(gid),
        ))
    }
}
