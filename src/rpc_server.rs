//! Suma RPC Server: JSON-RPC over stdin/stdout for an out-of-process shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"address.submit", "params":{"input":"example.com"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Notifications carry no id: {"event":"view.command", "data":{...}}

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use suma::app::App;
use suma::config::AppConfig;
use suma::host::NotificationHost;
use suma::logging::init_logging;
use suma::navigation::content_view::HeadlessViewFactory;
use suma::rpc_handler::{handle_method, HeadlessApp};

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(out: &mut impl Write, message: &Value) -> io::Result<()> {
    writeln!(out, "{}", message)?;
    out.flush()
}

/// View commands and host calls queued while handling the last request.
fn notifications(app: &Mutex<HeadlessApp>, host: &mut NotificationHost) -> Vec<Value> {
    let Ok(mut a) = app.lock() else {
        return Vec::new();
    };
    let mut out: Vec<Value> = a
        .take_view_commands()
        .into_iter()
        .map(|(view, command)| json!({ "event": "view.command", "data": { "view": view, "command": command } }))
        .collect();
    a.flush_host(host);
    out.extend(host.take());
    out
}

fn main() {
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);

    let app = match App::new(&config, HeadlessViewFactory::default()) {
        Ok(app) => Mutex::new(app),
        Err(e) => {
            error!(error = %e, data_dir = %config.data_dir.display(), "failed to initialize Suma");
            std::process::exit(1);
        }
    };
    let mut host = NotificationHost::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let ready = json!({ "event": "ready", "version": env!("CARGO_PKG_VERSION") });
    if emit(&mut out, &ready).is_err() {
        return;
    }
    for note in notifications(&app, &mut host) {
        if emit(&mut out, &note).is_err() {
            return;
        }
    }
    info!("rpc server ready");

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let err = json!({ "id": null, "error": format!("parse error: {}", e) });
                if emit(&mut out, &err).is_err() {
                    break;
                }
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            warn!("rate limit exceeded");
            if emit(&mut out, &json!({ "id": id, "error": "rate limit exceeded" })).is_err() {
                break;
            }
            continue;
        }

        let method = req.get("method").and_then(Value::as_str).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({ "id": id, "result": val }),
            Err(err) => json!({ "id": id, "error": err.to_string() }),
        };
        if emit(&mut out, &response).is_err() {
            break;
        }
        for note in notifications(&app, &mut host) {
            if emit(&mut out, &note).is_err() {
                return;
            }
        }
    }

    if let Ok(mut a) = app.lock() {
        a.shutdown();
    };
}
