//! Telnet: a shell session per connection.

use std::io::{self, Write};
use std::net::TcpStream;
use std::sync::Arc;

use linsim_kernel::{Dispatcher, Outcome, ShellSession};
use tracing::info;

use super::{read_some, Shutdown};

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const DONT: u8 = 254;

/// Longest line kept; anything beyond is dropped.
const MAX_LINE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Data,
    Iac,
    /// After WILL/WONT/DO/DONT, waiting for the option byte.
    Option,
    Sub,
    SubIac,
    /// After CR, where a following LF or NUL belongs to the same line end.
    Cr,
}

/// Turns a raw telnet byte stream into input lines.
///
/// Option negotiation and subnegotiation are dropped; `IAC IAC` is a
/// literal 255. CR LF, CR NUL, bare CR and bare LF all end a line.
/// Backspace and DEL erase the previous byte.
#[derive(Debug, Default)]
pub struct TelnetInput {
    state: State,
    line: Vec<u8>,
}

impl TelnetInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes; returns every line they complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            self.state = match (self.state, byte) {
                (State::Iac, IAC) => {
                    self.push(IAC);
                    State::Data
                }
                (State::Iac, SB) => State::Sub,
                (State::Iac, WILL..=DONT) => State::Option,
                (State::Iac, _) | (State::Option, _) => State::Data,
                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
                (State::Cr, b'\n' | 0) => State::Data,
                (State::Data | State::Cr, IAC) => State::Iac,
                (State::Data | State::Cr, b'\r') => {
                    lines.push(self.take());
                    State::Cr
                }
                (State::Data | State::Cr, b'\n') => {
                    lines.push(self.take());
                    State::Data
                }
                (State::Data | State::Cr, 0x08 | 0x7f) => {
                    self.line.pop();
                    State::Data
                }
                (State::Data | State::Cr, 0) => State::Data,
                (State::Data | State::Cr, other) => {
                    self.push(other);
                    State::Data
                }
            };
        }
        lines
    }

    fn push(&mut self, byte: u8) {
        if self.line.len() < MAX_LINE {
            self.line.push(byte);
        }
    }

    fn take(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        line
    }
}

/// Network line endings.
pub fn crlf(text: &str) -> String {
    text.replace('\n', "\r\n")
}

/// Run one telnet connection until `exit`, disconnect or shutdown.
pub fn serve(
    mut stream: TcpStream,
    dispatcher: &Arc<Dispatcher>,
    user: &str,
    shutdown: &Shutdown,
) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    let mut session = ShellSession::login(Arc::clone(dispatcher), user);
    info!(%peer, user, "telnet session opened");

    if let Ok(motd) = session.context().read_file("/etc/motd") {
        stream.write_all(crlf(&String::from_utf8_lossy(&motd)).as_bytes())?;
    }
    stream.write_all(session.prompt().as_bytes())?;

    let mut input = TelnetInput::new();
    let mut buf = [0u8; 512];
    loop {
        let n = read_some(&mut stream, &mut buf, shutdown)?;
        if n == 0 {
            info!(%peer, "telnet session closed by peer");
            return Ok(());
        }
        for line in input.feed(&buf[..n]) {
            let outcome = session.handle_line(&line);
            if let Outcome::Exit(code) = outcome {
                stream.write_all(b"logout\r\n")?;
                info!(%peer, code, "telnet session exited");
                return Ok(());
            }
            stream.write_all(crlf(&outcome.render()).as_bytes())?;
            stream.write_all(session.prompt().as_bytes())?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::crlf(b"ls -l\r\n", &["ls -l"])]
    #[case::cr_nul(b"pwd\r\0", &["pwd"])]
    #[case::bare_lf(b"id\n", &["id"])]
    #[case::two_lines(b"cd /\r\npwd\r\n", &["cd /", "pwd"])]
    #[case::empty_line(b"\r\n", &[""])]
    #[case::partial(b"uname", &[])]
    fn splits_lines(#[case] bytes: &[u8], #[case] expected: &[&str]) {
        let mut input = TelnetInput::new();
        assert_eq!(input.feed(bytes), expected);
    }

    #[test]
    fn strips_option_negotiation() {
        let mut input = TelnetInput::new();
        let bytes = [
            IAC, 253, 1, // DO ECHO
            b'l', IAC, 251, 31, // WILL NAWS
            b's', b'\r', b'\n',
        ];
        assert_eq!(input.feed(&bytes), vec!["ls"]);
    }

    #[test]
    fn strips_subnegotiation() {
        let mut input = TelnetInput::new();
        let bytes = [IAC, SB, 31, 0, 80, 0, 24, IAC, SE, b'w', b'c', b'\n'];
        assert_eq!(input.feed(&bytes), vec!["wc"]);
    }

    #[test]
    fn escaped_iac_is_data() {
        let mut input = TelnetInput::new();
        let lines = input.feed(&[b'a', IAC, IAC, b'b', b'\n']);
        assert_eq!(lines, vec![String::from_utf8_lossy(&[b'a', 255, b'b']).into_owned()]);
    }

    #[test]
    fn sequences_split_across_reads() {
        let mut input = TelnetInput::new();
        assert!(input.feed(&[b'e', IAC]).is_empty());
        assert!(input.feed(&[WILL]).is_empty());
        assert!(input.feed(&[3, b'x', b'\r']).len() == 1);
        assert!(input.feed(b"\n").is_empty());
    }

    #[test]
    fn backspace_erases() {
        let mut input = TelnetInput::new();
        assert_eq!(input.feed(b"lx\x08s\x7f\x7fls\r\n"), vec!["ls"]);
    }

    #[test]
    fn line_endings_for_the_wire() {
        assert_eq!(crlf("a\nb\n"), "a\r\nb\r\n");
    }
}
