//! Listeners over real loopback sockets.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::sync::Arc;
use std::time::{Duration, Instant};

use linsim_kernel::store::{Content, SqliteStore};
use linsim_kernel::{Dispatcher, HostInfo};
use linsim_server::config::ServiceConfig;
use linsim_server::listeners::Listeners;
use linsim_testutil::standard_host;

const TIMEOUT: Duration = Duration::from_secs(5);

fn dispatcher() -> Arc<Dispatcher> {
    let store = SqliteStore::in_memory().unwrap();
    let (records, contents) = standard_host().into_parts();
    let payloads: HashMap<_, _> = contents.into_iter().collect();
    for record in &records {
        let content = record
            .content_locator
            .and_then(|loc| payloads.get(&loc))
            .map(|bytes| Content::Binary(bytes));
        store.insert(record, content).unwrap();
    }
    let mut sink = Vec::new();
    linsim_server::start(Arc::new(store), HostInfo::new("web01.example.com"), &mut sink).unwrap()
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

/// Loopback services with everything disabled.
fn loopback() -> ServiceConfig {
    ServiceConfig {
        listen_address: "127.0.0.1".to_string(),
        echo: 0,
        discard: 0,
        daytime: 0,
        chargen: 0,
        time: 0,
        telnet: 0,
        http: 0,
        ..ServiceConfig::default()
    }
}

fn connect(port: u16) -> TcpStream {
    let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    stream
}

fn read_until(stream: &mut TcpStream, needle: &str) -> String {
    let deadline = Instant::now() + TIMEOUT;
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    while !String::from_utf8_lossy(&seen).contains(needle) {
        assert!(Instant::now() < deadline, "timed out waiting for {needle:?} in {seen:?}");
        let n = stream.read(&mut buf).unwrap();
        assert!(n > 0, "closed before {needle:?}: {}", String::from_utf8_lossy(&seen));
        seen.extend_from_slice(&buf[..n]);
    }
    String::from_utf8_lossy(&seen).into_owned()
}

#[test]
fn echo_over_tcp_and_udp() {
    let port = free_port();
    let services = ServiceConfig { echo: port, ..loopback() };
    let mut announced = Vec::new();
    let listeners = Listeners::start(&services, dispatcher(), |name| announced.push(name.to_string()));
    assert_eq!(announced, vec!["echo"]);
    assert_eq!(listeners.len(), 2);

    let mut stream = connect(port);
    stream.write_all(b"hello\r\n").unwrap();
    assert_eq!(read_until(&mut stream, "\r\n"), "hello\r\n");
    drop(stream);

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(TIMEOUT)).unwrap();
    socket.send_to(b"ping", ("127.0.0.1", port)).unwrap();
    let mut buf = [0u8; 64];
    let (n, _) = socket.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"ping");

    listeners.shutdown();
}

#[test]
fn time_and_daytime_close_after_answering() {
    let (time_port, daytime_port) = (free_port(), free_port());
    let services = ServiceConfig { time: time_port, daytime: daytime_port, ..loopback() };
    let listeners = Listeners::start(&services, dispatcher(), |_| {});

    let mut answer = Vec::new();
    connect(time_port).read_to_end(&mut answer).unwrap();
    assert_eq!(answer.len(), 4);
    let since_1900 = u32::from_be_bytes([answer[0], answer[1], answer[2], answer[3]]);
    assert!(since_1900 > 3_900_000_000);

    let mut answer = String::new();
    connect(daytime_port).read_to_string(&mut answer).unwrap();
    assert!(answer.ends_with("\r\n"));

    listeners.shutdown();
}

#[test]
fn telnet_session() {
    let port = free_port();
    let services = ServiceConfig { telnet: port, ..loopback() };
    let listeners = Listeners::start(&services, dispatcher(), |_| {});

    let mut stream = connect(port);
    let banner = read_until(&mut stream, "root@web01:~# ");
    assert!(banner.starts_with("Welcome to Debian GNU/Linux.\r\n"));

    stream.write_all(&[255, 253, 1]).unwrap();
    stream.write_all(b"cd /etc\r\n").unwrap();
    read_until(&mut stream, "root@web01:/etc# ");

    stream.write_all(b"cat hostname\r\n").unwrap();
    let reply = read_until(&mut stream, "# ");
    assert_eq!(reply, "localhost\r\nroot@web01:/etc# ");

    stream.write_all(b"frobnicate\r\n").unwrap();
    assert!(read_until(&mut stream, "# ").starts_with("-bash: frobnicate: command not found\r\n"));

    stream.write_all(b"exit\r\n").unwrap();
    let mut rest = String::new();
    stream.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "logout\r\n");

    listeners.shutdown();
}

#[test]
fn http_serves_the_document_root() {
    let port = free_port();
    let services = ServiceConfig { http: port, ..loopback() };
    let listeners = Listeners::start(&services, dispatcher(), |_| {});
    assert_eq!(listeners.describe(), vec![format!("http     127.0.0.1:{port}/tcp")]);

    let mut stream = connect(port);
    stream.write_all(b"GET / HTTP/1.0\r\nHost: web01\r\n\r\n").unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    assert!(response.starts_with("HTTP/1.0 200") || response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("Server: Apache/2.4.57 (Debian)"));
    assert!(response.ends_with(linsim_testutil::INDEX_HTML));

    let mut stream = connect(port);
    stream.write_all(b"GET /missing HTTP/1.0\r\n\r\n").unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    assert!(response.contains(" 404 "), "{response}");

    listeners.shutdown();
}

#[test]
fn shutdown_stops_accepting() {
    let port = free_port();
    let services = ServiceConfig { discard: port, ..loopback() };
    let listeners = Listeners::start(&services, dispatcher(), |_| {});
    listeners.shutdown();
    assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
}
