//! Course tabs RPC server: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tabs.load", "params":{"course_key":"course-v1:o+c+r"}}
//! Response: {"id":1, "result":[...]} or {"id":1, "error":"..."}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Instant;

use log::{error, info, LevelFilter};
use serde_json::{json, Value};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use course_tabs::app::App;
use course_tabs::rpc_handler::handle_method;

/// Environment variable holding the log level.
const LOG_ENV: &str = "COURSE_TABS_LOG";

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            max_per_second,
        }
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

fn init_logging() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn reply(response: Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", response)?;
    stdout.flush()
}

fn main() {
    init_logging();

    let config_path = std::env::args().nth(1);
    let app = match App::new(config_path) {
        Ok(app) => Mutex::new(app),
        Err(e) => {
            error!("failed to start: {}", e);
            std::process::exit(1);
        }
    };

    if reply(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")})).is_err() {
        return;
    }
    info!("ready");

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Err(e) => json!({"id": null, "error": format!("parse error: {}", e)}),
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                if !rate_limiter.check() {
                    json!({"id": id, "error": "rate limit exceeded"})
                } else {
                    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                    let params = req.get("params").cloned().unwrap_or(json!({}));
                    match handle_method(&app, method, &params) {
                        Ok(val) => json!({"id": id, "result": val}),
                        Err(err) => {
                            log::debug!("{} failed: {}", method, err);
                            json!({"id": id, "error": err})
                        }
                    }
                }
            }
        };

        if reply(response).is_err() {
            break;
        }
    }
    info!("stdin closed, shutting down");
}
