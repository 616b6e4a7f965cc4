//! Static HTTP server over a directory of the tree.
//!
//! Requests are answered as the `nobody` account: a file must be readable
//! by other users to be served. Symlinks are followed.

use std::sync::Arc;

use linsim_kernel::vfs::paths;
use linsim_kernel::Dispatcher;
use linsim_types::{Credentials, FsEntry};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server};
use tracing::{debug, warn};

use super::{Shutdown, POLL};
use crate::config::ServiceConfig;

const NOBODY: Credentials = Credentials { uid: 65534, gid: 65534 };

/// What to send back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Set on 405 responses.
    pub allow: Option<&'static str>,
}

impl Reply {
    fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
            allow: None,
        }
    }

    fn error(status: u16) -> Self {
        let reason = match status {
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        };
        let body = format!(
            "<html><head><title>{status} {reason}</title></head>\
             <body><h1>{reason}</h1></body></html>\n"
        );
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.into_bytes(),
            allow: (status == 405).then_some("GET, HEAD"),
        }
    }
}

#[derive(Debug, Serialize)]
struct DirListing {
    path: String,
    entries: Vec<DirEntry>,
}

#[derive(Debug, Serialize)]
struct DirEntry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    size: u64,
    mtime: i64,
}

/// The served document root.
#[derive(Debug, Clone)]
pub struct Site {
    dispatcher: Arc<Dispatcher>,
    root: String,
    server: String,
}

enum Target {
    File(FsEntry),
    Listing(DirListing),
}

impl Site {
    pub fn new(dispatcher: Arc<Dispatcher>, services: &ServiceConfig) -> Self {
        Self {
            dispatcher,
            root: paths::normalize("/", &services.http_root),
            server: services.http_server.clone(),
        }
    }

    /// Answer `method url` from the tree.
    pub fn respond(&self, method: &Method, url: &str) -> Reply {
        if !matches!(method, Method::Get | Method::Head) {
            return Reply::error(405);
        }
        let raw = url.split(['?', '#']).next().unwrap_or("/");
        let Ok(decoded) = percent_decode_str(raw).decode_utf8() else {
            return Reply::error(404);
        };
        let relative = paths::normalize("/", &decoded);
        let full = if relative == "/" {
            self.root.clone()
        } else if self.root == "/" {
            relative.clone()
        } else {
            format!("{}{relative}", self.root)
        };

        let target = match self.locate(&full, &relative) {
            Ok(target) => target,
            Err(status) => return Reply::error(status),
        };
        match target {
            Target::Listing(listing) => match serde_json::to_vec_pretty(&listing) {
                Ok(body) => Reply::ok("application/json", body),
                Err(e) => {
                    warn!(error = %e, "cannot render directory listing");
                    Reply::error(500)
                }
            },
            Target::File(entry) => match self.dispatcher.content().read(&entry) {
                Ok(body) => Reply::ok(content_type(&entry.name), body),
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "content fetch failed");
                    Reply::error(500)
                }
            },
        }
    }

    /// Find what `full` names, under one read lock.
    fn locate(&self, full: &str, relative: &str) -> Result<Target, u16> {
        let tree = self.dispatcher.vfs().read();
        let found = tree
            .resolve("/", full)
            .and_then(|path| tree.follow(&path))
            .map_err(|_| 404u16)?;
        let entry = tree.get(&found).ok_or(404u16)?;
        if !entry.permits_read(NOBODY) {
            return Err(403);
        }
        if entry.is_file() {
            return Ok(Target::File(entry.clone()));
        }
        if !entry.is_dir() {
            return Err(403);
        }

        let index = paths::join(&found, "index.html");
        if let Some(index) = tree.get(&index).filter(|e| e.is_file()) {
            if !index.permits_read(NOBODY) {
                return Err(403);
            }
            return Ok(Target::File(index.clone()));
        }

        let listing = tree.children(&found).map_err(|_| 404u16)?.sorted();
        let entries = listing
            .paths()
            .filter_map(|child| tree.get(&child))
            .map(|e| DirEntry {
                name: e.name.clone(),
                kind: e.kind.describe(),
                size: e.size,
                mtime: e.mtime,
            })
            .collect();
        Ok(Target::Listing(DirListing {
            path: relative.to_string(),
            entries,
        }))
    }
}

/// MIME type from a file name's extension.
pub fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("txt" | "log" | "conf") => "text/plain; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Accept loop for the HTTP listener.
pub fn serve(server: &Server, site: &Site, shutdown: &Shutdown) {
    while !shutdown.is_triggered() {
        let request = match server.recv_timeout(POLL) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "http receive failed");
                continue;
            }
        };
        let reply = site.respond(request.method(), request.url());
        debug!(method = %request.method(), url = request.url(), status = reply.status, "http");

        let mut response = Response::from_data(reply.body).with_status_code(reply.status);
        for (field, value) in [
            ("Content-Type", Some(reply.content_type)),
            ("Server", Some(site.server.as_str())),
            ("Allow", reply.allow),
        ] {
            if let Some(header) = value.and_then(|v| Header::from_bytes(field, v).ok()) {
                response.add_header(header);
            }
        }
        if let Err(e) = request.respond(response) {
            debug!(error = %e, "http response not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::dispatcher;
    use linsim_testutil::INDEX_HTML;

    fn site() -> Site {
        Site::new(dispatcher(), &ServiceConfig::default())
    }

    #[test]
    fn serves_index_for_root() {
        let reply = site().respond(&Method::Get, "/");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "text/html; charset=utf-8");
        assert_eq!(reply.body, INDEX_HTML.as_bytes());
    }

    #[test]
    fn serves_files_and_ignores_query() {
        let reply = site().respond(&Method::Get, "/docs/readme.txt?v=2");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, b"docs\n");
        assert_eq!(reply.content_type, "text/plain; charset=utf-8");
    }

    #[test]
    fn directory_without_index_lists_as_json() {
        let reply = site().respond(&Method::Get, "/docs/");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "application/json");
        let listing: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(listing["path"], "/docs");
        assert_eq!(listing["entries"][0]["name"], "readme.txt");
        assert_eq!(listing["entries"][0]["type"], "regular file");
        assert_eq!(listing["entries"][0]["size"], 5);
    }

    #[test]
    fn dot_dot_cannot_leave_the_root() {
        let site = site();
        assert_eq!(site.respond(&Method::Get, "/../../etc/passwd").status, 404);
        assert_eq!(site.respond(&Method::Get, "/%2e%2e/%2e%2e/etc/passwd").status, 404);
        assert_eq!(site.respond(&Method::Get, "/docs/../index.html").status, 200);
    }

    #[test]
    fn missing_and_forbidden() {
        let mut services = ServiceConfig::default();
        services.http_root = "/".to_string();
        let site = Site::new(dispatcher(), &services);
        assert_eq!(site.respond(&Method::Get, "/nope").status, 404);
        assert_eq!(site.respond(&Method::Get, "/etc/shadow").status, 403);
        assert_eq!(site.respond(&Method::Get, "/root/").status, 403);
        assert_eq!(site.respond(&Method::Get, "/dev/null").status, 403);
        assert_eq!(site.respond(&Method::Get, "/etc/hostname").body, b"localhost\n");
    }

    #[test]
    fn other_methods_are_rejected() {
        let reply = site().respond(&Method::Post, "/");
        assert_eq!(reply.status, 405);
        assert_eq!(reply.allow, Some("GET, HEAD"));
        assert_eq!(site().respond(&Method::Head, "/").status, 200);
    }

    #[test]
    fn percent_decoding() {
        let dispatcher = dispatcher();
        let ctx = dispatcher.open_context("root");
        ctx.touch("/var/www/html/hello world.txt").unwrap();
        let site = Site::new(dispatcher, &ServiceConfig::default());
        let reply = site.respond(&Method::Get, "/hello%20world.txt");
        assert_eq!(reply.status, 200);
        assert!(reply.body.is_empty());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("logo.PNG"), "image/png");
        assert_eq!(content_type("Makefile"), "application/octet-stream");
        assert_eq!(content_type("app.js"), "application/javascript");
    }
}
