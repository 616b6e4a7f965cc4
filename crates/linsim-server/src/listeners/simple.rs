//! The small inetd services: echo, discard, daytime, chargen and time.

use std::io::{self, Write};
use std::net::TcpStream;

use chrono::{DateTime, Local, TimeZone, Utc};

use super::{read_some, Shutdown};

/// Seconds from 1900-01-01 to 1970-01-01.
const EPOCH_1900: i64 = 2_208_988_800;

const CHARGEN_WIDTH: usize = 72;
const CHARGEN_DATAGRAM: usize = 512;

/// Printable ASCII, space through tilde.
const PRINTABLE: &[u8; 95] = b" !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simple {
    Echo,
    Discard,
    Daytime,
    Chargen,
    Time,
}

impl Simple {
    pub fn name(self) -> &'static str {
        match self {
            Simple::Echo => "echo",
            Simple::Discard => "discard",
            Simple::Daytime => "daytime",
            Simple::Chargen => "chargen",
            Simple::Time => "time",
        }
    }

    /// Handle one TCP connection.
    pub fn serve_tcp(self, mut stream: TcpStream, shutdown: &Shutdown) -> io::Result<()> {
        match self {
            Simple::Echo => {
                let mut buf = [0u8; 1024];
                loop {
                    let n = read_some(&mut stream, &mut buf, shutdown)?;
                    if n == 0 {
                        return Ok(());
                    }
                    stream.write_all(&buf[..n])?;
                }
            }
            Simple::Discard => {
                let mut buf = [0u8; 1024];
                while read_some(&mut stream, &mut buf, shutdown)? > 0 {}
                Ok(())
            }
            Simple::Daytime => stream.write_all(daytime(&Local::now()).as_bytes()),
            Simple::Chargen => {
                let mut line = 0;
                while !shutdown.is_triggered() {
                    stream.write_all(&chargen_line(line))?;
                    line += 1;
                }
                Ok(())
            }
            Simple::Time => stream.write_all(&time_bytes(Utc::now().timestamp())),
        }
    }

    /// Answer to one UDP datagram, if any.
    pub fn reply(self, datagram: &[u8]) -> Option<Vec<u8>> {
        match self {
            Simple::Echo => Some(datagram.to_vec()),
            Simple::Discard => None,
            Simple::Daytime => Some(daytime(&Local::now()).into_bytes()),
            Simple::Chargen => Some(chargen_datagram()),
            Simple::Time => Some(time_bytes(Utc::now().timestamp()).to_vec()),
        }
    }
}

/// Human-readable time line, e.g. `Tuesday, November 14, 2023 22:13:20-+00:00`.
pub fn daytime<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}\r\n", now.format("%A, %B %e, %Y %H:%M:%S-%Z"))
}

/// Line `n` of the chargen pattern: 72 characters starting one further into
/// the printable set than line `n - 1`, then CRLF.
pub fn chargen_line(n: usize) -> Vec<u8> {
    let start = n % PRINTABLE.len();
    let mut line: Vec<u8> = PRINTABLE
        .iter()
        .cycle()
        .skip(start)
        .take(CHARGEN_WIDTH)
        .copied()
        .collect();
    line.extend_from_slice(b"\r\n");
    line
}

/// The first 512 bytes of the pattern.
pub fn chargen_datagram() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(CHARGEN_DATAGRAM + CHARGEN_WIDTH + 2);
    let mut n = 0;
    while bytes.len() < CHARGEN_DATAGRAM {
        bytes.extend(chargen_line(n));
        n += 1;
    }
    bytes.truncate(CHARGEN_DATAGRAM);
    bytes
}

/// Seconds since 1900 as a 32-bit big-endian integer. Wraps in 2036.
pub fn time_bytes(unix: i64) -> [u8; 4] {
    ((unix + EPOCH_1900) as u32).to_be_bytes()
}
