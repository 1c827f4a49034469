//! Development server.
//!
//! Builds the site, serves it over HTTP, and rebuilds whenever a source file
//! changes. Ctrl+C stops the server and deletes the generated output.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────────┐
//! │   Main thread   │     │   Watcher thread     │
//! │  HTTP requests  │     │  notify events       │
//! └────────┬────────┘     └──────────┬───────────┘
//!          │                         │ .tpl .txt .html .md .ini
//!          ▼                         ▼
//!     serve files               build_site()
//!     dir → index.html          drain queued events
//! ```
//!
//! When the comic lives in a subdirectory (`https://me.github.io/comic/`) the
//! parent of the project is served, so `/comic/` resolves the same way it
//! does once published.

use crate::config::{self, CONTENT_DIR, ComicInfo, ConfigError, UrlSources};
use crate::hooks::Hooks;
use crate::output;
use crate::scan::ScanOptions;
use crate::site::{self, SiteError};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Build failed: {0}")]
    Site(#[from] SiteError),
    #[error("Failed to start server on port {port}: {message}")]
    Bind { port: u16, message: String },
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Changes to these file types trigger a rebuild.
pub const WATCH_EXTENSIONS: &[&str] = &["tpl", "txt", "html", "md", "ini"];

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const SETTLE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    pub port: u16,
    pub delete_scheduled_posts: bool,
    pub publish_all_comics: bool,
}

impl ServeOptions {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.delete_scheduled_posts, self.publish_all_comics)
    }
}

pub fn is_watched(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| WATCH_EXTENSIONS.iter().any(|w| w.eq_ignore_ascii_case(ext)))
}

/// Directory served at `/`.
pub fn http_root(root: &Path, base_directory: &str) -> PathBuf {
    if base_directory.is_empty() {
        return root.to_path_buf();
    }
    root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf())
}

/// Map a request URL to a file under `serve_root`.
///
/// Query strings are dropped and `%xx` escapes decoded. Directories resolve to
/// their `index.html`. URLs that climb out of `serve_root` resolve to nothing.
pub fn resolve_request(serve_root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;
    let relative = Path::new(decoded.trim_matches('/'));
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    let local = serve_root.join(relative);
    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn handle_request(request: Request, serve_root: &Path) -> std::io::Result<()> {
    let Some(path) = resolve_request(serve_root, request.url()) else {
        tracing::debug!(url = request.url(), "404");
        let response = Response::from_string("404 Not Found").with_status_code(404);
        return request.respond(response);
    };
    let mut response = Response::from_data(fs::read(&path)?);
    if let Ok(header) = Header::from_bytes("Content-Type", content_type(&path)) {
        response = response.with_header(header);
    }
    request.respond(response)
}

fn build_and_report(root: &Path, hooks: &dyn Hooks, options: &ServeOptions) -> Result<(), SiteError> {
    let report = site::build_site(root, hooks, &options.scan_options())?;
    output::print_build_output(&report);
    output::print_timings(&report.timings);
    Ok(())
}

/// Rebuild on every batch of relevant changes until `shutdown` is set.
fn watch_and_rebuild(
    root: &Path,
    hooks: &(dyn Hooks + Sync),
    options: &ServeOptions,
    shutdown: &AtomicBool,
) -> Result<(), ServeError> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let _ = tx.send(event);
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::info!(root = %root.display(), "Watching for changes");

    while !shutdown.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Watch error");
                continue;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        if matches!(event.kind, EventKind::Access(_)) {
            continue;
        }
        let Some(changed) = event.paths.iter().find(|p| is_watched(p) && !p.is_dir()) else {
            continue;
        };

        tracing::info!(path = %changed.display(), "Change detected, rebuilding");
        if let Err(e) = build_and_report(root, hooks, options) {
            tracing::error!(error = %e, "Rebuild failed");
        }
        // The build's own writes queue events too; wait for them to settle.
        while rx.recv_timeout(SETTLE_INTERVAL).is_ok() {}
    }
    Ok(())
}

/// Build, serve, and rebuild on change until Ctrl+C.
pub fn serve(root: &Path, hooks: &(dyn Hooks + Sync), options: ServeOptions) -> Result<(), ServeError> {
    let info = ComicInfo::load(&root.join(CONTENT_DIR).join("comic_info.ini"))?;
    let site_url = config::resolve_comic_url(&info, &UrlSources::from_environment(root))?;
    let serve_root = http_root(root, &site_url.base_directory);

    build_and_report(root, hooks, &options)?;

    let server = Server::http(("0.0.0.0", options.port)).map_err(|e| ServeError::Bind {
        port: options.port,
        message: e.to_string(),
    })?;
    let server = Arc::new(server);
    let shutdown = Arc::new(AtomicBool::new(false));

    let signal_server = Arc::clone(&server);
    let signal_shutdown = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        signal_shutdown.store(true, Ordering::SeqCst);
        signal_server.unblock();
    })?;

    println!(
        "Go to http://localhost:{}{}/ in your browser to view your site.",
        options.port, site_url.base_directory
    );
    println!("Use Ctrl+C to stop the server.");

    std::thread::scope(|scope| -> Result<(), ServeError> {
        let watcher = scope.spawn(|| watch_and_rebuild(root, hooks, &options, &shutdown));

        for request in server.incoming_requests() {
            if let Err(e) = handle_request(request, &serve_root) {
                tracing::warn!(error = %e, "Request failed");
            }
        }
        shutdown.store(true, Ordering::SeqCst);

        match watcher.join() {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Watcher thread panicked");
                Ok(())
            }
        }
    })?;

    println!("\nWeb server stopped. Deleting auto-generated files...");
    let info = ComicInfo::load(&root.join(CONTENT_DIR).join("comic_info.ini"))?;
    let removed = site::clean_output(root, &info)?;
    output::print_clean_output(root, &removed);
    Ok(())
}
