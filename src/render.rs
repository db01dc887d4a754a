// ABOUTME: Browser rendering module for the stepdeck application
// ABOUTME: Captures each step of an exported deck as an image, or prints the deck to PDF

use crate::errors::{DeckError, Result};
use crate::utils;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for browser rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub base_name: String,
    pub timeout_ms: u64,
    pub browser_path: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            format: "png".to_string(),
            base_name: "step".to_string(),
            timeout_ms: 30000, // 30 seconds
            browser_path: None,
        }
    }
}

impl RenderConfig {
    fn screenshot_format(&self) -> (CaptureScreenshotFormatOption, &'static str) {
        match self.format.to_lowercase().as_str() {
            "png" => (CaptureScreenshotFormatOption::Png, "png"),
            "jpeg" | "jpg" => (CaptureScreenshotFormatOption::Jpeg, "jpg"),
            other => {
                warn!("Unsupported format: {}. Using PNG instead.", other);
                (CaptureScreenshotFormatOption::Png, "png")
            }
        }
    }
}

fn browser_error(message: String) -> DeckError {
    warn!("{}", message);
    DeckError::BrowserError {
        message,
        source: None,
    }
}

/// Launch a headless browser and open the exported deck in a new tab.
fn open_deck(html_path: &Path, config: &RenderConfig) -> Result<(Browser, Arc<Tab>)> {
    utils::validate_file_exists(html_path)?;

    let mut launch_options_builder = LaunchOptionsBuilder::default();
    launch_options_builder.window_size(Some((config.width, config.height)));
    launch_options_builder.headless(true);
    if let Some(browser_path) = config.browser_path.as_deref().filter(|p| !p.is_empty()) {
        launch_options_builder.path(Some(PathBuf::from(browser_path)));
    }

    let launch_options = launch_options_builder
        .build()
        .map_err(|e| browser_error(format!("Failed to build browser options: {:?}", e)))?;

    info!("Launching headless browser");
    let browser = Browser::new(launch_options)
        .map_err(|e| browser_error(format!("Failed to launch browser: {}", e)))?;

    let html_path_abs = utils::get_absolute_path(html_path)?;
    let url = format!("file://{}", html_path_abs.to_string_lossy());
    info!("Opening page at URL: {}", url);

    let tab = browser
        .new_tab()
        .map_err(|e| browser_error(format!("Failed to create new tab: {}", e)))?;
    tab.navigate_to(&url)
        .map_err(|e| browser_error(format!("Failed to navigate to HTML: {}", e)))?;
    tab.wait_until_navigated()
        .map_err(|e| browser_error(format!("Navigation failed: {}", e)))?;
    tab.wait_for_element_with_custom_timeout("body", Duration::from_millis(config.timeout_ms))
        .map_err(|e| browser_error(format!("Failed to wait for body element: {}", e)))?;

    Ok((browser, tab))
}

fn count_steps(tab: &Tab) -> Result<u64> {
    let result = tab
        .evaluate("document.querySelectorAll('section.step').length", false)
        .map_err(|e| browser_error(format!("Failed to count steps: {}", e)))?;
    let count = result.value.and_then(|v| v.as_u64()).unwrap_or(0);
    if count == 0 {
        return Err(DeckError::ValidationError(
            "The document contains no step sections".to_string(),
        ));
    }
    Ok(count)
}

/// Delete images left over from an earlier render with the same base name.
fn remove_stale_images(output_dir: &Path, base_name: &str, extension: &str) {
    let pattern = format!(
        "{}/{}_*.{}",
        glob::Pattern::escape(&output_dir.to_string_lossy()),
        base_name,
        extension
    );
    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Invalid glob pattern {}: {}", pattern, e);
            return;
        }
    };
    for path in entries.flatten() {
        debug!("Removing stale image {:?}", path);
        if let Err(e) = fs::remove_file(&path) {
            warn!("Failed to remove {:?}: {}", path, e);
        }
    }
}

/// Capture one image per step section of an exported deck
pub fn render_steps(
    html_path: &Path,
    output_dir: &Path,
    config: &RenderConfig,
) -> Result<Vec<PathBuf>> {
    info!("Rendering steps from HTML: {:?}", html_path);
    utils::ensure_directory_exists(output_dir)?;

    let (_browser, tab) = open_deck(html_path, config)?;
    let step_count = count_steps(&tab)?;
    let (format, extension) = config.screenshot_format();
    remove_stale_images(output_dir, &config.base_name, extension);

    info!("Loaded! Ready to render {} steps", step_count);
    let start_time = Instant::now();
    let mut output_files = Vec::with_capacity(step_count as usize);

    for index in 0..step_count {
        let js = format!(
            "document.querySelectorAll('section.step').forEach(function (s, i) {{ s.classList.toggle('current', i === {}); }}); true",
            index
        );
        tab.evaluate(&js, false)
            .map_err(|e| browser_error(format!("Failed to show step {}: {}", index + 1, e)))?;

        let output_file =
            output_dir.join(format!("{}_{:04}.{}", config.base_name, index + 1, extension));
        debug!("Rendering {:?}", output_file);

        let data = tab
            .capture_screenshot(format.clone(), None, None, true)
            .map_err(|e| {
                DeckError::ScreenshotError(format!("step {}: {}", index + 1, e))
            })?;
        fs::write(&output_file, &data)?;
        output_files.push(output_file);
    }

    info!(
        "Rendering complete. Captured {} steps in {:.2} seconds",
        output_files.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(output_files)
}

/// Print an exported deck to PDF, one page per step
pub fn render_pdf(html_path: &Path, pdf_path: &Path, config: &RenderConfig) -> Result<PathBuf> {
    info!("Printing {:?} to PDF {:?}", html_path, pdf_path);
    utils::ensure_parent_directory_exists(pdf_path)?;

    let (_browser, tab) = open_deck(html_path, config)?;
    let step_count = count_steps(&tab)?;

    let options = PrintToPdfOptions {
        print_background: Some(true),
        prefer_css_page_size: Some(true),
        ..Default::default()
    };
    let data = tab
        .print_to_pdf(Some(options))
        .map_err(|e| browser_error(format!("Failed to print PDF: {}", e)))?;
    fs::write(pdf_path, &data)?;

    info!("PDF with {} pages written to {:?}", step_count, pdf_path);
    Ok(pdf_path.to_path_buf())
}
