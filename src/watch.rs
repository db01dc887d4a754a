// ABOUTME: Watch module for monitoring deck changes and regenerating outputs
// ABOUTME: Rebuilds HTML, step images and PDF on change and can serve them with live reload

use log::{debug, error, info};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use tiny_http::{Header, Response, Server, StatusCode};

use crate::config::Config as AppConfig;
use crate::errors::{DeckError, Result};
use crate::html::{self, HtmlOptions};
use crate::markdown;
use crate::render;
use crate::utils;

/// Path polled by the live-reload script.
const VERSION_PATH: &str = "/__stepdeck/version";

/// Configuration for watch mode
pub struct WatchConfig {
    /// Path to the markdown deck to watch
    pub markdown_path: PathBuf,

    /// Output HTML file path
    pub html_output: PathBuf,

    /// Output directory for step images
    pub slides_output_dir: Option<PathBuf>,

    /// Output PDF file path
    pub pdf_output: Option<PathBuf>,

    /// Stylesheets, scripts and embedding mode
    pub html_options: HtmlOptions,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,

    /// Whether to serve the HTML using a local web server
    pub serve: bool,

    /// Port for local web server
    pub port: u16,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            markdown_path: PathBuf::new(),
            html_output: PathBuf::new(),
            slides_output_dir: None,
            pdf_output: None,
            html_options: HtmlOptions::default(),
            debounce_ms: 500,
            serve: false,
            port: 8080,
        }
    }
}

/// Build state shared with the HTTP server.
#[derive(Debug, Default)]
pub struct ReloadState {
    pub version: u64,
    pub last_error: Option<String>,
}

/// Script injected into served pages: reloads when the build version changes.
pub fn auto_reload_script() -> String {
    format!(
        r#"<script>
(function () {{
  var seen = null;
  setInterval(function () {{
    fetch('{path}', {{ cache: 'no-store' }}).then(function (r) {{ return r.text(); }}).then(function (v) {{
      if (seen !== null && v !== seen) location.reload();
      seen = v;
    }}).catch(function () {{}});
  }}, 1000);
}})();
</script>"#,
        path = VERSION_PATH
    )
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Start a simple HTTP server serving the output directory
fn start_server(html_path: PathBuf, port: u16, state: Arc<RwLock<ReloadState>>) -> Result<()> {
    let server = Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| DeckError::WatchError(format!("Failed to start HTTP server: {}", e)))?;

    let html_dir = html_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let html_file_name = html_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    thread::spawn(move || {
        info!("HTTP server listening on http://localhost:{}", port);

        for request in server.incoming_requests() {
            let url_path = request.url().split('?').next().unwrap_or("/").to_string();

            if url_path == VERSION_PATH {
                let body = {
                    let state = state.read();
                    match &state.last_error {
                        Some(message) => format!("{}-error: {}", state.version, message),
                        None => state.version.to_string(),
                    }
                };
                if let Err(e) = request.respond(Response::from_string(body)) {
                    error!("Failed to send response: {}", e);
                }
                continue;
            }

            let file_path = if url_path == "/" {
                html_dir.join(&html_file_name)
            } else {
                html_dir.join(url_path.trim_start_matches('/'))
            };
            debug!("Request for {:?} -> {:?}", url_path, file_path);

            if file_path.components().any(|c| c.as_os_str() == "..") || !file_path.is_file() {
                let response =
                    Response::from_string("404 Not Found").with_status_code(StatusCode(404));
                let _ = request.respond(response);
                continue;
            }

            match fs::read(&file_path) {
                Ok(content) => {
                    let mut response = Response::from_data(content);
                    if let Ok(header) = Header::from_bytes("Content-Type", content_type(&file_path)) {
                        response = response.with_header(header);
                    }
                    if let Err(e) = request.respond(response) {
                        error!("Failed to send response: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to read file {:?}: {}", file_path, e);
                    let response = Response::from_string(format!("Failed to read file: {}", e))
                        .with_status_code(StatusCode(500));
                    let _ = request.respond(response);
                }
            }
        }
    });

    Ok(())
}

/// Starts watching a markdown deck and regenerates outputs when changes occur
pub fn watch_markdown(mut config: WatchConfig, app_config: &AppConfig) -> Result<()> {
    utils::validate_file_exists(&config.markdown_path)?;
    config.html_options = std::mem::take(&mut config.html_options).for_output(&config.html_output)?;

    if let Some(slides_dir) = &config.slides_output_dir {
        utils::validate_directory_writable(slides_dir)?;
    }
    if let Some(pdf_output) = &config.pdf_output {
        utils::ensure_parent_directory_exists(pdf_output)?;
    }

    if config.serve {
        config.html_options.auto_reload_script = Some(auto_reload_script());
    }

    let state = Arc::new(RwLock::new(ReloadState::default()));

    // A broken deck at startup is reported and then waited on like any later edit.
    match regenerate_outputs(&config, app_config) {
        Ok(()) => state.write().version += 1,
        Err(e) => {
            error!("Initial build failed: {}", e);
            state.write().last_error = Some(e.to_string());
        }
    }

    if config.serve {
        start_server(config.html_output.clone(), config.port, Arc::clone(&state))?;
    }

    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| DeckError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    let watch_path = match config.markdown_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let abs_watch_path = utils::get_absolute_path(watch_path)?;
    debug!("Watching absolute path: {:?}", abs_watch_path);

    debouncer
        .watcher()
        .watch(&abs_watch_path, RecursiveMode::Recursive)
        .map_err(|e| {
            DeckError::WatchError(format!(
                "Failed to start watching {:?}: {}",
                abs_watch_path, e
            ))
        })?;

    info!("Watching for changes in {:?} (Press Ctrl+C to stop)", watch_path);

    let mut last_processed = Instant::now();

    for result in rx {
        match result {
            Ok(events) => {
                let relevant_changes = events.iter().any(|event| {
                    event.paths.iter().any(|path| {
                        let relevant = is_relevant_path(path, &config);
                        if relevant {
                            debug!("Detected relevant change in {:?}", path);
                        }
                        relevant
                    })
                });

                let now = Instant::now();
                if relevant_changes
                    && now.duration_since(last_processed) > Duration::from_millis(config.debounce_ms)
                {
                    last_processed = now;
                    match regenerate_outputs(&config, app_config) {
                        Ok(()) => {
                            info!("Regenerated outputs successfully");
                            let mut state = state.write();
                            state.version += 1;
                            state.last_error = None;
                        }
                        Err(e) => {
                            error!("Failed to regenerate outputs: {}", e);
                            state.write().last_error = Some(e.to_string());
                        }
                    }
                }
            }
            Err(errors) => error!("Watch error: {:?}", errors),
        }
    }

    Ok(())
}

/// Checks if a changed path should trigger a rebuild
pub fn is_relevant_path(path: &Path, config: &WatchConfig) -> bool {
    // Our own outputs change on every rebuild.
    let outputs = [Some(&config.html_output), config.pdf_output.as_ref()];
    if outputs.iter().flatten().any(|output| paths_match(path, output)) {
        return false;
    }
    if let Some(slides_dir) = &config.slides_output_dir {
        if let (Ok(abs), Ok(dir)) = (
            utils::get_absolute_path(path),
            utils::get_absolute_path(slides_dir),
        ) {
            if abs.starts_with(dir) {
                return false;
            }
        }
    }

    if paths_match(path, &config.markdown_path) {
        return true;
    }

    let local_resources = config
        .html_options
        .css_files
        .iter()
        .chain(config.html_options.js_files.iter())
        .filter(|resource| !resource.is_remote);
    for resource in local_resources {
        if paths_match(path, Path::new(&resource.path)) {
            return true;
        }
    }

    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            matches!(
                ext.as_str(),
                "md" | "css" | "js" | "png" | "jpg" | "jpeg" | "svg"
            )
        }
        None => false,
    }
}

fn paths_match(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (utils::get_absolute_path(a), utils::get_absolute_path(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Regenerate all outputs based on the current state of the markdown deck
fn regenerate_outputs(config: &WatchConfig, app_config: &AppConfig) -> Result<()> {
    info!("Regenerating outputs...");

    let mut deck = markdown::load_deck(&config.markdown_path)?;
    deck.width = app_config.width;
    deck.height = app_config.height;

    let html_content = html::generate_html(&deck, &config.html_options)?;
    html::write_html_to_file(&html_content, &config.html_output)?;
    info!("HTML regenerated: {:?}", config.html_output);

    if config.slides_output_dir.is_none() && config.pdf_output.is_none() {
        return Ok(());
    }

    let render_config = app_config.get_render_config(None, None, None, None, None);

    if let Some(slides_dir) = &config.slides_output_dir {
        let output_files = render::render_steps(&config.html_output, slides_dir, &render_config)?;
        info!(
            "Step images regenerated: {} images in {:?}",
            output_files.len(),
            slides_dir
        );
    }

    if let Some(pdf_output) = &config.pdf_output {
        render::render_pdf(&config.html_output, pdf_output, &render_config)?;
        info!("PDF regenerated: {:?}", pdf_output);
    }

    Ok(())
}
