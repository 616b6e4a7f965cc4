//! Network services layered on the simulated host.
//!
//! Each listener runs on its own thread and each TCP connection gets
//! another. Nothing here blocks indefinitely: accept loops are non-blocking
//! and sockets carry a read timeout, so every thread notices [`Shutdown`]
//! within one [`POLL`] interval.

pub mod http;
pub mod simple;
pub mod telnet;

use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use linsim_kernel::Dispatcher;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use simple::Simple;

/// How often blocked threads look at the shutdown flag.
pub const POLL: Duration = Duration::from_millis(200);

/// Shared stop flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::Udp => write!(f, "udp"),
        }
    }
}

/// One bound service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerInfo {
    pub name: &'static str,
    pub transport: Transport,
    pub addr: SocketAddr,
}

impl std::fmt::Display for ListenerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<8} {}/{}", self.name, self.addr, self.transport)
    }
}

/// Every running listener thread.
#[derive(Debug, Default)]
pub struct Listeners {
    shutdown: Shutdown,
    running: Vec<(ListenerInfo, JoinHandle<()>)>,
}

impl Listeners {
    /// Bind and start every service with a non-zero port.
    ///
    /// A service that cannot bind is logged and skipped; the rest still
    /// start. `announce` is called before each one is bound.
    pub fn start(
        services: &ServiceConfig,
        dispatcher: Arc<Dispatcher>,
        mut announce: impl FnMut(&str),
    ) -> Self {
        let mut listeners = Self::default();
        let host = services.listen_address.as_str();

        for (simple, port) in [
            (Simple::Echo, services.echo),
            (Simple::Discard, services.discard),
            (Simple::Daytime, services.daytime),
            (Simple::Chargen, services.chargen),
            (Simple::Time, services.time),
        ] {
            if port == 0 {
                continue;
            }
            announce(simple.name());
            listeners.spawn_tcp(simple.name(), host, port, move |stream, shutdown| {
                simple.serve_tcp(stream, &shutdown)
            });
            listeners.spawn_udp(simple.name(), host, port, move |datagram| simple.reply(datagram));
        }

        if services.telnet != 0 {
            announce("telnet");
            let dispatcher = Arc::clone(&dispatcher);
            let user = services.telnet_user.clone();
            listeners.spawn_tcp("telnet", host, services.telnet, move |stream, shutdown| {
                telnet::serve(stream, &dispatcher, &user, &shutdown)
            });
        }

        if services.http != 0 {
            announce("http");
            let site = http::Site::new(Arc::clone(&dispatcher), services);
            listeners.spawn_http(host, services.http, site);
        }

        listeners
    }

    /// `name address/transport`, one per running listener.
    pub fn describe(&self) -> Vec<String> {
        self.running.iter().map(|(info, _)| info.to_string()).collect()
    }

    pub fn infos(&self) -> impl Iterator<Item = &ListenerInfo> {
        self.running.iter().map(|(info, _)| info)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Signal every listener and wait for the accept loops to stop.
    ///
    /// Connection threads notice on their next read timeout.
    pub fn shutdown(self) {
        self.shutdown.trigger();
        for (info, handle) in self.running {
            if handle.join().is_err() {
                warn!(listener = %info, "listener thread panicked");
            }
        }
        info!("listeners stopped");
    }

    fn spawn_tcp<F>(&mut self, name: &'static str, host: &str, port: u16, handler: F)
    where
        F: Fn(TcpStream, Shutdown) -> io::Result<()> + Send + Sync + 'static,
    {
        let bound = TcpListener::bind((host, port)).and_then(|listener| {
            listener.set_nonblocking(true)?;
            let addr = listener.local_addr()?;
            Ok((listener, addr))
        });
        let (listener, addr) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                warn!(service = name, port, error = %e, "cannot bind tcp listener");
                return;
            }
        };
        let info = ListenerInfo { name, transport: Transport::Tcp, addr };
        let shutdown = self.shutdown.clone();
        let handler = Arc::new(handler);
        self.launch(info, move || accept_loop(name, &listener, &shutdown, handler));
    }

    fn spawn_udp<F>(&mut self, name: &'static str, host: &str, port: u16, reply: F)
    where
        F: Fn(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        let bound = UdpSocket::bind((host, port)).and_then(|socket| {
            socket.set_read_timeout(Some(POLL))?;
            let addr = socket.local_addr()?;
            Ok((socket, addr))
        });
        let (socket, addr) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                warn!(service = name, port, error = %e, "cannot bind udp listener");
                return;
            }
        };
        let info = ListenerInfo { name, transport: Transport::Udp, addr };
        let shutdown = self.shutdown.clone();
        self.launch(info, move || datagram_loop(name, &socket, &shutdown, reply));
    }

    fn spawn_http(&mut self, host: &str, port: u16, site: http::Site) {
        let server = match tiny_http::Server::http((host, port)) {
            Ok(server) => server,
            Err(e) => {
                warn!(service = "http", port, error = %e, "cannot bind http listener");
                return;
            }
        };
        let Some(addr) = server.server_addr().to_ip() else {
            warn!(service = "http", "http listener has no ip address");
            return;
        };
        let info = ListenerInfo { name: "http", transport: Transport::Tcp, addr };
        let shutdown = self.shutdown.clone();
        self.launch(info, move || http::serve(&server, &site, &shutdown));
    }

    fn launch(&mut self, info: ListenerInfo, body: impl FnOnce() + Send + 'static) {
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", info.name, info.transport))
            .spawn(body);
        match spawned {
            Ok(handle) => {
                info!(listener = %info, "listening");
                self.running.push((info, handle));
            }
            Err(e) => warn!(listener = %info, error = %e, "cannot spawn listener thread"),
        }
    }
}

fn accept_loop<F>(name: &'static str, listener: &TcpListener, shutdown: &Shutdown, handler: Arc<F>)
where
    F: Fn(TcpStream, Shutdown) -> io::Result<()> + Send + Sync + 'static,
{
    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(service = name, %peer, "connection");
                if let Err(e) = prepare(&stream) {
                    warn!(service = name, %peer, error = %e, "cannot configure connection");
                    continue;
                }
                let handler = Arc::clone(&handler);
                let shutdown = shutdown.clone();
                let spawned = thread::Builder::new()
                    .name(format!("{name}-conn"))
                    .spawn(move || {
                        if let Err(e) = handler(stream, shutdown) {
                            debug!(service = name, %peer, error = %e, "connection ended");
                        }
                    });
                if let Err(e) = spawned {
                    warn!(service = name, error = %e, "cannot spawn connection thread");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL),
            Err(e) => {
                warn!(service = name, error = %e, "accept failed");
                thread::sleep(POLL);
            }
        }
    }
}

fn prepare(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(POLL))
}

fn datagram_loop<F>(name: &'static str, socket: &UdpSocket, shutdown: &Shutdown, reply: F)
where
    F: Fn(&[u8]) -> Option<Vec<u8>>,
{
    let mut buf = [0u8; 2048];
    while !shutdown.is_triggered() {
        match socket.recv_from(&mut buf) {
            Ok((n, peer)) => {
                let Some(answer) = reply(&buf[..n]) else {
                    continue;
                };
                if let Err(e) = socket.send_to(&answer, peer) {
                    debug!(service = name, %peer, error = %e, "udp reply failed");
                }
            }
            Err(e) if is_timeout(&e) => {}
            Err(e) => {
                warn!(service = name, error = %e, "udp receive failed");
                thread::sleep(POLL);
            }
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Blocking read that wakes up for the shutdown flag.
///
/// Returns `Ok(0)` on end of stream or shutdown.
pub fn read_some(stream: &mut impl Read, buf: &mut [u8], shutdown: &Shutdown) -> io::Result<usize> {
    loop {
        if shutdown.is_triggered() {
            return Ok(0);
        }
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if is_timeout(&e) => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
