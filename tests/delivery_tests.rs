// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the static server over real sockets

use photobooth::constants::server::MISSING_ENTRY_MESSAGE;
use photobooth::delivery::StaticServer;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

struct Running {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn start(root: &Path) -> Running {
    let server = StaticServer::bind("127.0.0.1", 0, root).unwrap();
    let addr = server.local_addr();
    let shutdown = server.shutdown_flag();
    let thread = std::thread::spawn(move || {
        server.run().unwrap();
    });
    Running {
        addr,
        shutdown,
        thread: Some(thread),
    }
}

/// Send one request and return (status line, headers + body)
fn request(addr: SocketAddr, method: &str, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    write!(
        stream,
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        method, path
    )
    .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    let status = response.lines().next().unwrap_or_default().to_string();
    (status, response)
}

fn bundle() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>booth</html>").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets").join("app.js"), "console.log(1)").unwrap();
    dir
}

#[test]
fn test_serves_existing_asset() {
    let dir = bundle();
    let server = start(dir.path());

    let (status, response) = request(server.addr, "GET", "/assets/app.js");
    assert!(status.contains("200"), "{}", status);
    assert!(response.contains("text/javascript"));
    assert!(response.ends_with("console.log(1)"));
}

#[test]
fn test_unknown_route_serves_entry_document() {
    let dir = bundle();
    let server = start(dir.path());

    let (status, response) = request(server.addr, "GET", "/gallery/42?x=1");
    assert!(status.contains("200"), "{}", status);
    assert!(response.contains("text/html"));
    assert!(response.ends_with("<html>booth</html>"));
}

#[test]
fn test_traversal_never_escapes_root() {
    let outer = tempfile::tempdir().unwrap();
    std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
    let root = outer.path().join("dist");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("index.html"), "entry").unwrap();
    let server = start(&root);

    let (status, response) = request(server.addr, "GET", "/../secret.txt");
    assert!(status.contains("200"), "{}", status);
    assert!(!response.contains("secret"));
    assert!(response.ends_with("entry"));
}

#[test]
fn test_missing_bundle_is_404_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(dir.path());

    let (status, response) = request(server.addr, "GET", "/");
    assert!(status.contains("404"), "{}", status);
    assert!(response.ends_with(MISSING_ENTRY_MESSAGE));
}

#[test]
fn test_post_is_not_allowed() {
    let dir = bundle();
    let server = start(dir.path());

    let (status, response) = request(server.addr, "POST", "/");
    assert!(status.contains("405"), "{}", status);
    assert!(response.contains("Allow: GET, HEAD"));
}
