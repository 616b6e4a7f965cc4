//! date — Print the system date and time.
//!
//! The simulated host keeps UTC, so `-u` changes nothing but is accepted.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

const DEFAULT_FORMAT: &str = "%a %b %e %H:%M:%S UTC %Y";

/// Date command: print the current time.
pub struct Date;

impl Command for Date {
    fn name(&self) -> &str {
        "date"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("date", "Print the system date and time")
            .flag(FlagSchema::switch('u', "utc", "Print Coordinated Universal Time"))
            .flag(FlagSchema::value('d', "date", "Display time described by @SECONDS"))
    }

    fn execute(&self, args: CommandArgs, _ctx: &mut ShellContext) -> ExecResult {
        let when = match args.value("date") {
            None => Utc::now(),
            Some(spec) => match parse_epoch(spec) {
                Some(when) => when,
                None => return ExecResult::failure(1, format!("date: invalid date '{spec}'")),
            },
        };

        let format = match args.positional.as_slice() {
            [] => DEFAULT_FORMAT,
            [fmt] => match fmt.strip_prefix('+') {
                Some(fmt) => fmt,
                None => return ExecResult::failure(1, format!("date: invalid date '{fmt}'")),
            },
            [_, extra, ..] => return ExecResult::failure(1, format!("date: extra operand '{extra}'")),
        };

        match render(when, format) {
            Some(text) => ExecResult::success(format!("{text}\n")),
            None => ExecResult::failure(1, format!("date: invalid format '{format}'")),
        }
    }
}

fn parse_epoch(spec: &str) -> Option<DateTime<Utc>> {
    let secs = spec.strip_prefix('@')?.parse().ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0)
}

fn render(when: DateTime<Utc>, format: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    Some(when.format_with_items(items.into_iter()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn date_fixed_time() {
        let mut ctx = make_ctx();
        let result = run(&Date, &mut ctx, &["-d", "@1700000000"]);
        assert_eq!(result.out, "Tue Nov 14 22:13:20 UTC 2023\n");
    }

    #[test]
    fn date_custom_format() {
        let mut ctx = make_ctx();
        let result = run(&Date, &mut ctx, &["-u", "-d", "@0", "+%Y-%m-%d"]);
        assert_eq!(result.out, "1970-01-01\n");
    }

    #[test]
    fn date_now_parses_back() {
        let mut ctx = make_ctx();
        let out = run(&Date, &mut ctx, &["+%s"]).out;
        let secs: i64 = out.trim().parse().unwrap();
        assert!(secs > 1_700_000_000);
    }

    #[test]
    fn date_errors() {
        let mut ctx = make_ctx();
        assert_eq!(run(&Date, &mut ctx, &["-d", "soon"]).err, "date: invalid date 'soon'");
        assert_eq!(run(&Date, &mut ctx, &["%Y"]).err, "date: invalid date '%Y'");
        assert_eq!(run(&Date, &mut ctx, &["+%Q"]).err, "date: invalid format '%Q'");
    }
}
