//! wc — Print newline, word, and byte counts.

use super::reason;
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, FlagSchema, ShellContext};

/// Wc command: count lines, words and bytes.
pub struct Wc;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

impl Counts {
    fn of(bytes: &[u8]) -> Self {
        Self {
            lines: bytes.iter().filter(|&&b| b == b'\n').count(),
            words: bytes
                .split(|b| b.is_ascii_whitespace())
                .filter(|w| !w.is_empty())
                .count(),
            bytes: bytes.len(),
        }
    }

    fn add(&mut self, other: Counts) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
    }
}

impl Command for Wc {
    fn name(&self) -> &str {
        "wc"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("wc", "Print newline, word, and byte counts for each file")
            .flag(FlagSchema::switch('l', "lines", "Print the newline counts"))
            .flag(FlagSchema::switch('w', "words", "Print the word counts"))
            .flag(FlagSchema::switch('c', "bytes", "Print the byte counts"))
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, "wc: missing file operand");
        }
        let any = args.has("lines") || args.has("words") || args.has("bytes");
        let show = [
            !any || args.has("lines"),
            !any || args.has("words"),
            !any || args.has("bytes"),
        ];

        let mut rows = Vec::new();
        let mut total = Counts::default();
        let mut result = ExecResult::success("");
        for operand in &args.positional {
            match ctx.read_file(operand) {
                Ok(bytes) => {
                    let counts = Counts::of(&bytes);
                    total.add(counts);
                    rows.push((counts, operand.as_str()));
                }
                Err(e) => {
                    result.code = 1;
                    result.push_err(format!("wc: {operand}: {}", reason(&e)));
                }
            }
        }
        if rows.len() > 1 {
            rows.push((total, "total"));
        }

        let width = rows
            .iter()
            .map(|(c, _)| c.bytes.max(c.lines).max(c.words).to_string().len())
            .max()
            .unwrap_or(1);
        let single = show.iter().filter(|s| **s).count() == 1 && rows.len() == 1;
        for (counts, label) in rows {
            let fields: Vec<String> = [counts.lines, counts.words, counts.bytes]
                .into_iter()
                .zip(show)
                .filter(|(_, shown)| *shown)
                .map(|(n, _)| if single { n.to_string() } else { format!("{n:>width$}") })
                .collect();
            result.out.push_str(&format!("{} {label}\n", fields.join(" ")));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtin::testing::{make_ctx, run};

    #[test]
    fn counts_of_bytes() {
        let counts = Counts::of(b"buy milk\ncall bob\nBuy bread\n");
        assert_eq!(counts, Counts { lines: 3, words: 6, bytes: 28 });
        assert_eq!(Counts::of(b"no newline"), Counts { lines: 0, words: 2, bytes: 10 });
    }

    #[test]
    fn wc_default_columns() {
        let mut ctx = make_ctx();
        let result = run(&Wc, &mut ctx, &["/home/alice/notes.txt"]);
        assert_eq!(result.out, " 3  6 28 /home/alice/notes.txt\n");
    }

    #[test]
    fn wc_single_count() {
        let mut ctx = make_ctx();
        let result = run(&Wc, &mut ctx, &["-l", "/home/alice/notes.txt"]);
        assert_eq!(result.out, "3 /home/alice/notes.txt\n");
    }

    #[test]
    fn wc_total_and_errors() {
        let mut ctx = make_ctx();
        let result = run(&Wc, &mut ctx, &["-c", "/etc/hostname", "/etc/motd", "/nope"]);
        assert_eq!(result.code, 1);
        assert_eq!(result.out, "10 /etc/hostname\n29 /etc/motd\n39 total\n");
        assert_eq!(result.err, "wc: /nope: No such file or directory");
    }
}
