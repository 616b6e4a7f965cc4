//! md5sum, sha1sum, sha256sum — Compute message digests.

use digest::Digest;

use super::{hex, reason};
use crate::shell::{Command, CommandArgs, CommandSchema, ExecResult, ShellContext};

/// One digest command; the algorithm is picked by constructor.
pub struct Checksum {
    name: &'static str,
    description: &'static str,
    digest: fn(&[u8]) -> Vec<u8>,
}

fn digest_with<D: Digest>(bytes: &[u8]) -> Vec<u8> {
    D::digest(bytes).to_vec()
}

impl Checksum {
    pub fn md5() -> Self {
        Self {
            name: "md5sum",
            description: "Compute and print MD5 message digests",
            digest: digest_with::<md5::Md5>,
        }
    }

    pub fn sha1() -> Self {
        Self {
            name: "sha1sum",
            description: "Compute and print SHA1 message digests",
            digest: digest_with::<sha1::Sha1>,
        }
    }

    pub fn sha256() -> Self {
        Self {
            name: "sha256sum",
            description: "Compute and print SHA256 message digests",
            digest: digest_with::<sha2::Sha256>,
        }
    }
}

impl Command for Checksum {
    fn name(&self) -> &str {
        self.name
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new(self.name, self.description)
    }

    fn execute(&self, args: CommandArgs, ctx: &mut ShellContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::failure(1, format!("{}: missing file operand", self.name));
        }

        let mut result = ExecResult::success("");
        for operand in &args.positional {
            match ctx.read_file(operand) {
                Ok(bytes) => {
                    let sum = hex(&(self.digest)(&bytes));
                    result.out.push_str(&format!("{sum}  {operand}\n"));
                }
                Err(e) => {
                    result.code = 1;
                    result.push_err(format!("{}: {operand}: {}", self.name, reason(&e)));
                }
            }
        }
        result
    }
}
