// ABOUTME: Configuration module for the stepdeck application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::deck::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::html::HtmlOptions;
use crate::render::RenderConfig;
use crate::resources::ResourceFile;
use log::warn;
use std::env;
use std::str::FromStr;

/// Global configuration for the application
pub struct Config {
    pub browser_path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub default_timeout_ms: u64,
    pub embed_resources: bool,
    pub image_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_path: env::var("BROWSER_PATH").ok(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            default_timeout_ms: 30000, // 30 seconds
            embed_resources: true,
            image_format: "png".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let browser_path = env::var("BROWSER_PATH").ok().filter(|p| !p.is_empty());
        let width = env_number("DECK_WIDTH").unwrap_or(defaults.width);
        let height = env_number("DECK_HEIGHT").unwrap_or(defaults.height);
        let default_timeout_ms =
            env_number("DEFAULT_TIMEOUT_MS").unwrap_or(defaults.default_timeout_ms);
        let embed_resources = env::var("EMBED_RESOURCES")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.embed_resources);
        let image_format = env::var("STEP_IMAGE_FORMAT").unwrap_or(defaults.image_format);

        Self {
            browser_path,
            width,
            height,
            default_timeout_ms,
            embed_resources,
            image_format,
        }
    }

    /// Get a render configuration with defaults from this config
    pub fn get_render_config(
        &self,
        width: Option<u32>,
        height: Option<u32>,
        format: Option<String>,
        base_name: Option<String>,
        timeout_ms: Option<u64>,
    ) -> RenderConfig {
        RenderConfig {
            width: width.unwrap_or(self.width),
            height: height.unwrap_or(self.height),
            format: format.unwrap_or_else(|| self.image_format.clone()),
            base_name: base_name.unwrap_or_else(|| "step".to_string()),
            timeout_ms: timeout_ms.unwrap_or(self.default_timeout_ms),
            browser_path: self.browser_path.clone(),
        }
    }

    /// Get HTML export options with defaults from this config
    pub fn get_html_options(
        &self,
        css_files: Vec<ResourceFile>,
        js_files: Vec<ResourceFile>,
        embed_resources: Option<bool>,
    ) -> HtmlOptions {
        HtmlOptions {
            css_files,
            js_files,
            embed_resources: embed_resources.unwrap_or(self.embed_resources),
            auto_reload_script: None,
            output_dir: None,
        }
    }
}

fn env_number<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, value);
            None
        }
    }
}
