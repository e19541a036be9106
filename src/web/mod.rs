//! Embedded browser dashboard.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard that polls `/api/state`
//! - JSON endpoints that drive a live [`Shell`]
//!
//! The server thread owns the shell. Between requests it drains the event
//! channel, so backend completions and poll ticks are applied even while no
//! browser is asking. Launched via `nexus-dash web` (default:
//! `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::activity::ActivityLog;
use crate::api::ApiClient;
use crate::config::schema::DashConfig;
use crate::runtime::{Dispatcher, Event, Runtime};
use crate::shell::Shell;

/// How long the server waits for a request before draining events again.
const PUMP_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on `addr`. Blocks the current thread.
///
/// Requests are handled sequentially, which is enough for a local
/// single-user dashboard. Errors are answered per request and never stop the
/// server.
pub fn serve(config: &DashConfig, addr: &str, log: ActivityLog) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let client = ApiClient::new(&config.api);
    let api_url = client.base_url().to_string();
    let (mut dispatcher, events) = Dispatcher::new(Arc::new(client));
    let mut shell = Shell::mount(config, log, &mut dispatcher);

    println!("nexus-dash running at http://{addr}");
    println!("Backend: {api_url}");
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    loop {
        pump(&mut shell, &events, &mut dispatcher);
        let Some(request) = server
            .recv_timeout(PUMP_INTERVAL)
            .context("dashboard server stopped")?
        else {
            continue;
        };
        pump(&mut shell, &events, &mut dispatcher);
        handle_request(request, &mut shell, &mut dispatcher, &api_url);
    }
}

/// Apply every event that is already waiting.
fn pump(shell: &mut Shell, events: &Receiver<Event>, rt: &mut dyn Runtime) {
    while let Ok(event) = events.try_recv() {
        shell.handle(event, rt);
    }
}

fn handle_request(mut request: Request, shell: &mut Shell, rt: &mut dyn Runtime, api_url: &str) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    let response = dispatch(&method, &url, body.as_deref(), shell, rt, api_url);
    let _ = request.respond(response);

    println!(
        "{} {} {}",
        method,
        url,
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn dispatch(
    method: &Method,
    url: &str,
    body: Option<&str>,
    shell: &mut Shell,
    rt: &mut dyn Runtime,
    api_url: &str,
) -> Response<Cursor<Vec<u8>>> {
    let path = url.split('?').next().unwrap_or(url);
    let body = body.unwrap_or("{}");

    let result = match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => return serve_frontend(),

        (&Method::Get, "/api/state") => api::get_state(shell, api_url),
        (&Method::Get, "/api/health") => api::get_health(shell, api_url),
        (&Method::Post, "/api/tab") => api::post_tab(shell, rt, body),
        (&Method::Post, "/api/chat") => api::post_chat(shell, rt, body),
        (&Method::Post, "/api/memory/search") => api::post_memory_search(shell, rt, body),
        (&Method::Post, "/api/memory/view") => api::post_memory_view(shell, body),

        _ => return not_found(),
    };

    match result {
        Ok(value) => json_response(StatusCode(200), &value.to_string()),
        Err(e) => {
            let body = serde_json::json!({ "error": format!("{e:#}") }).to_string();
            json_response(StatusCode(400), &body)
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(header("text/html; charset=utf-8"))
        .with_status_code(StatusCode(200))
}

fn not_found() -> Response<Cursor<Vec<u8>>> {
    json_response(StatusCode(404), r#"{"error": "not found"}"#)
}

fn json_response(status: StatusCode, body: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(body.as_bytes().to_vec())
        .with_header(header("application/json; charset=utf-8"))
        .with_status_code(status)
}

fn header(content_type: &'static str) -> Header {
    Header::from_bytes("Content-Type", content_type).expect("static ASCII header")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
