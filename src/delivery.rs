// SPDX-License-Identifier: GPL-3.0-only

//! Static delivery of the web client bundle
//!
//! Serves files from the bundle directory and answers every unmatched path
//! with the entry document so client-side routing works. A missing entry
//! document is reported as 404 (the bundle was not built); any other failure
//! is a 500.

use crate::constants::{file_formats, server};
use crate::errors::DeliveryError;
use std::net::{SocketAddr, TcpListener};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info, warn};

/// Where a request path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// An existing file under the root
    File(PathBuf),
    /// Nothing matched; serve the entry document
    Fallback,
}

/// Map a request URL onto the bundle directory
///
/// Query strings and fragments are ignored. Paths that try to leave the root
/// never resolve to a file.
pub fn resolve(root: &Path, url: &str) -> Resolved {
    let path = url.split(['?', '#']).next().unwrap_or_default();

    let mut candidate = root.to_path_buf();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => candidate.push(part),
            _ => {
                debug!(url, "Rejecting path outside the bundle");
                return Resolved::Fallback;
            }
        }
    }

    if candidate.is_file() {
        return Resolved::File(candidate);
    }
    let index = candidate.join(server::ENTRY_DOCUMENT);
    if candidate.is_dir() && index.is_file() {
        return Resolved::File(index);
    }
    Resolved::Fallback
}

/// A response ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StaticResponse {
    fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: message.as_bytes().to_vec(),
        }
    }

    fn file(path: &Path) -> Result<Self, std::io::Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Ok(Self {
            status: 200,
            content_type: file_formats::mime_type(ext),
            body: std::fs::read(path)?,
        })
    }

    fn from_error(err: &DeliveryError) -> Self {
        match err {
            DeliveryError::StaticAssetMissing(_) => {
                Self::text(err.status_code(), server::MISSING_ENTRY_MESSAGE)
            }
            _ => Self::text(err.status_code(), server::INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Build the response for `method url` against `root`
pub fn respond(root: &Path, method: &Method, url: &str) -> StaticResponse {
    if !matches!(method, Method::Get | Method::Head) {
        return StaticResponse::text(405, "Method not allowed");
    }

    let result = match resolve(root, url) {
        Resolved::File(path) => StaticResponse::file(&path).map_err(DeliveryError::Io),
        Resolved::Fallback => entry_document(root),
    };

    result.unwrap_or_else(|err| {
        error!(url, error = %err, "Failed to serve request");
        StaticResponse::from_error(&err)
    })
}

fn entry_document(root: &Path) -> Result<StaticResponse, DeliveryError> {
    let index = root.join(server::ENTRY_DOCUMENT);
    debug!(path = %index.display(), "Serving entry document");
    StaticResponse::file(&index).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DeliveryError::StaticAssetMissing(index.clone()),
        _ => DeliveryError::Io(e),
    })
}

/// HTTP server for the bundle directory
pub struct StaticServer {
    server: Server,
    addr: SocketAddr,
    root: PathBuf,
    shutdown: Arc<AtomicBool>,
}

impl StaticServer {
    /// Bind `host:port` (port 0 picks a free one)
    pub fn bind(host: &str, port: u16, root: impl Into<PathBuf>) -> Result<Self, DeliveryError> {
        let listener = TcpListener::bind((host, port))
            .map_err(|e| DeliveryError::Bind(format!("{}:{}: {}", host, port, e)))?;
        let addr = listener.local_addr()?;
        let server = Server::from_listener(listener, None)
            .map_err(|e| DeliveryError::Bind(e.to_string()))?;

        Ok(Self {
            server,
            addr,
            root: root.into(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Browser URL for the server
    pub fn url(&self) -> String {
        let host = if self.addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            self.addr.ip().to_string()
        };
        format!("http://{}:{}", host, self.addr.port())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Flag that stops `run` within one poll interval once set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Serve requests until the shutdown flag is set
    pub fn run(&self) -> Result<(), DeliveryError> {
        info!(url = %self.url(), root = %self.root.display(), "Static server running");
        if !self.root.join(server::ENTRY_DOCUMENT).is_file() {
            warn!(
                root = %self.root.display(),
                "Entry document missing; build the client bundle first"
            );
        }

        let poll = Duration::from_millis(server::ACCEPT_POLL_MS);
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.server.recv_timeout(poll)? {
                Some(request) => self.handle(request),
                None => continue,
            }
        }

        info!("Static server stopped");
        Ok(())
    }

    fn handle(&self, request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        let response = respond(&self.root, &method, &url);
        info!(method = %method, url, status = response.status, "Request");

        let mut reply = Response::from_data(response.body).with_status_code(response.status);
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
            reply = reply.with_header(header);
        }
        if response.status == 405
            && let Ok(header) = Header::from_bytes(&b"Allow"[..], &b"GET, HEAD"[..])
        {
            reply = reply.with_header(header);
        }
        if let Err(e) = request.respond(reply) {
            warn!(url, error = %e, "Failed to write response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        dir
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = bundle();
        assert_eq!(
            resolve(dir.path(), "/assets/app.js?v=3"),
            Resolved::File(dir.path().join("assets/app.js"))
        );
        assert_eq!(
            resolve(dir.path(), "/"),
            Resolved::File(dir.path().join("index.html"))
        );
    }

    #[test]
    fn test_resolve_unmatched_and_traversal_fall_back() {
        let dir = bundle();
        assert_eq!(resolve(dir.path(), "/customize/frame"), Resolved::Fallback);
        assert_eq!(resolve(dir.path(), "/../etc/passwd"), Resolved::Fallback);
        assert_eq!(resolve(dir.path(), "/assets/../../secret"), Resolved::Fallback);
    }

    #[test]
    fn test_spa_fallback_serves_entry_with_200() {
        let dir = bundle();
        let response = respond(dir.path(), &Method::Get, "/result");
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "text/html; charset=utf-8");
        assert_eq!(response.body, b"<html>app</html>");
    }

    #[test]
    fn test_static_file_mime() {
        let dir = bundle();
        let response = respond(dir.path(), &Method::Head, "/assets/app.js");
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "text/javascript; charset=utf-8");
    }

    #[test]
    fn test_missing_entry_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = respond(dir.path(), &Method::Get, "/");
        assert_eq!(response.status, 404);
        assert_eq!(response.body, server::MISSING_ENTRY_MESSAGE.as_bytes());
    }

    #[test]
    fn test_unreadable_entry_is_500() {
        let dir = tempfile::tempdir().unwrap();
        // A directory named index.html cannot be read as a file
        std::fs::create_dir(dir.path().join("index.html")).unwrap();
        let response = respond(dir.path(), &Method::Get, "/missing");
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_other_methods_are_405() {
        let dir = bundle();
        assert_eq!(respond(dir.path(), &Method::Post, "/").status, 405);
    }
}
