mod common;

use std::os::fd::AsRawFd;

use edge_addr::{
    AddressInstance, AddressType, ConnectStatus, IpVersion, OsErrorKind, OwnedSocket, SocketError, SocketType,
    factory,
};

const BIND_ATTEMPTS: usize = 5;

fn listen(socket: &OwnedSocket) {
    listen_with_backlog(socket, 1);
}

fn listen_with_backlog(socket: &OwnedSocket, backlog: libc::c_int) {
    let rc = unsafe { libc::listen(socket.as_raw_fd(), backlog) };
    assert_eq!(rc, 0, "listen failed: {}", std::io::Error::last_os_error());
}

fn accept(socket: &OwnedSocket) -> (OwnedSocket, AddressInstance) {
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

    let fd = unsafe {
        libc::accept4(
            socket.as_raw_fd(),
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut len,
            libc::SOCK_CLOEXEC
        )
    };
    assert!(fd >= 0, "accept failed: {}", std::io::Error::last_os_error());

    let accepted = unsafe { std::os::fd::FromRawFd::from_raw_fd(fd) };
    (accepted, factory::from_native(&storage, len).unwrap())
}

/*
    Binds a listener on a fresh unused port. The port helper releases the
    port before we bind, so a concurrent test may have grabbed it.
*/
fn bind_listener(loopback: &str, version: IpVersion) -> (AddressInstance, OwnedSocket) {
    let mut last_error = None;

    for _ in 0..BIND_ATTEMPTS {
        let address = factory::from_text(loopback, Some(common::unused_port(version))).unwrap();
        let listener = address.socket(SocketType::Stream).unwrap();

        match address.bind(&listener) {
            Ok(()) => return (address, listener),
            Err(err) if err.os_error().kind() == OsErrorKind::AddressInUse => last_error = Some(err),
            Err(err) => panic!("bind to {} failed: {}", address, err),
        }
    }

    panic!("no unused port could be bound: {:?}", last_error);
}

fn socket_bind_and_connect(loopback: &str, version: IpVersion) {
    let (address, listener) = bind_listener(loopback, version);
    assert!(listener.is_nonblocking().unwrap());
    listen(&listener);

    let client = address.socket(SocketType::Stream).unwrap();
    assert!(client.is_nonblocking().unwrap());

    // Blocking again so connect waits for the handshake instead of
    // reporting it in progress.
    client.set_nonblocking(false).unwrap();

    let status = address.connect(&client).unwrap_or_else(|err| panic!("{}: {}", address, err));
    assert_eq!(status, ConnectStatus::Connected);

    let client_local = client.local_address().unwrap();
    assert_eq!(client.peer_address().unwrap().as_string(), address.as_string());

    let (accepted, peer) = accept(&listener);
    assert_eq!(peer.as_string(), client_local.as_string());
    assert_eq!(accepted.local_address().unwrap().as_string(), address.as_string());
}

#[test]
fn test_ipv4_socket_bind_and_connect() {
    socket_bind_and_connect("127.0.0.1", IpVersion::V4);
}

#[test]
fn test_ipv6_socket_bind_and_connect() {
    if !common::ipv6_available() {
        return;
    }
    socket_bind_and_connect("::1", IpVersion::V6);
}

#[test]
fn test_nonblocking_connect_reports_progress() {
    let (address, listener) = bind_listener("127.0.0.1", IpVersion::V4);
    listen(&listener);

    let client = address.socket(SocketType::Stream).unwrap();

    // Loopback handshakes may finish before connect returns.
    match address.connect(&client) {
        Ok(ConnectStatus::InProgress) | Ok(ConnectStatus::Connected) => {}
        Err(err) => panic!("unexpected connect failure: {}", err),
    }
}

#[test]
fn test_wildcard_listener_accepts_loopback() {
    let any = AddressInstance::ipv4_any(0);
    assert!(any.ip().unwrap().is_any_address());

    let listener = any.socket(SocketType::Stream).unwrap();
    any.bind(&listener).unwrap();
    listen(&listener);

    let bound = listener.local_address().unwrap();
    let port = bound.ip().unwrap().port();
    assert_ne!(port, 0);
    assert_eq!(bound, any);

    let target = AddressInstance::ipv4_with_port("127.0.0.1", port).unwrap();
    let client = target.socket(SocketType::Stream).unwrap();
    client.set_nonblocking(false).unwrap();
    assert_eq!(target.connect(&client).unwrap(), ConnectStatus::Connected);
}

struct SocketPath(std::path::PathBuf);

impl SocketPath {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("edge-addr-{}-{}.sock", std::process::id(), name));
        let _ = std::fs::remove_file(&path);
        Self(path)
    }
}

impl Drop for SocketPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn test_pipe_socket_bind_and_connect() {
    let path = SocketPath::new("stream");
    let address = AddressInstance::pipe(&path.0).unwrap();
    assert_eq!(address.address_type(), AddressType::Pipe);
    assert!(address.ip().is_none());

    let listener = address.socket(SocketType::Stream).unwrap();
    address.bind(&listener).unwrap();
    listen(&listener);
    assert_eq!(listener.local_address().unwrap(), address);

    let client = address.socket(SocketType::Stream).unwrap();
    assert_eq!(address.connect(&client).unwrap(), ConnectStatus::Connected);

    // The client never bound, so the kernel reports it without a name
    let (_accepted, peer) = accept(&listener);
    assert_eq!(peer.address_type(), AddressType::Pipe);
    assert!(peer.pipe_address().unwrap().is_unnamed());
    assert_ne!(peer, address);
}

#[test]
fn test_abstract_pipe_bind_and_connect() {
    let name = format!("@edge-addr-{}-abstract", std::process::id());
    let address = AddressInstance::pipe(&name).unwrap();
    assert!(address.pipe_path().is_none());

    let listener = address.socket(SocketType::Stream).unwrap();
    address.bind(&listener).unwrap();
    listen(&listener);

    let local = listener.local_address().unwrap();
    assert_eq!(local, address);
    assert_eq!(local.as_string(), name);

    let client = address.socket(SocketType::Stream).unwrap();
    assert_eq!(address.connect(&client).unwrap(), ConnectStatus::Connected);
    assert_eq!(client.peer_address().unwrap(), address);
}

#[test]
fn test_pipe_connect_with_full_backlog() {
    let path = SocketPath::new("backlog");
    let address = AddressInstance::pipe(&path.0).unwrap();

    let listener = address.socket(SocketType::Stream).unwrap();
    address.bind(&listener).unwrap();
    listen_with_backlog(&listener, 0);

    let mut clients = Vec::new();
    let mut refused = None;

    for _ in 0..8 {
        let client = address.socket(SocketType::Stream).unwrap();
        match address.connect(&client) {
            Ok(ConnectStatus::Connected) => clients.push(client),
            Ok(ConnectStatus::InProgress) => panic!("{}: queued connect reported in progress", address),
            Err(err) => {
                refused = Some(err);
                break;
            }
        }
    }

    match refused {
        Some(SocketError::ConnectFailed { address: text, error }) => {
            assert_eq!(text, address.as_string());
            assert_eq!(error.kind(), OsErrorKind::ResourceUnavailable);
            assert!(error.is_transient());
        }
        other => panic!("backlog never filled: {:?}", other),
    }

    for client in &clients {
        assert_eq!(client.peer_address().unwrap(), address);
    }
}

#[test]
fn test_pipe_connect_without_listener() {
    let path = SocketPath::new("missing");
    let address = AddressInstance::pipe(&path.0).unwrap();
    let client = address.socket(SocketType::Stream).unwrap();

    match address.connect(&client) {
        Err(SocketError::ConnectFailed { address: text, error }) => {
            assert_eq!(text, path.0.display().to_string());
            assert_eq!(error.kind(), OsErrorKind::NotFound);
            assert!(!error.is_transient());
        }
        other => panic!("unexpected connect result {:?}", other),
    }
}

#[test]
fn test_pipe_bind_twice_fails() {
    let path = SocketPath::new("twice");
    let address = factory::from_url(&format!("unix://{}", path.0.display())).unwrap();

    let first = address.socket(SocketType::Stream).unwrap();
    address.bind(&first).unwrap();

    let second = address.socket(SocketType::Stream).unwrap();
    let err = address.bind(&second).unwrap_err();
    assert_eq!(err.os_error().kind(), OsErrorKind::AddressInUse);
}
