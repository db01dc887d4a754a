// ABOUTME: Resource handling for the stepdeck application
// ABOUTME: Handles local and remote stylesheets and scripts included in exported decks

use crate::errors::{DeckError, Result};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Kind of resource, which decides the HTML tag used to include it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Stylesheet,
    Script,
}

/// A stylesheet or script, either a local file or a remote URL.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: String,
    pub kind: ResourceKind,
    pub is_remote: bool,
}

impl ResourceFile {
    /// Create a resource from a local path or an http(s) URL.
    pub fn new(path: &str, kind: ResourceKind) -> Self {
        let is_remote = Url::parse(path)
            .map(|url| url.scheme() == "http" || url.scheme() == "https")
            .unwrap_or(false);
        Self {
            path: path.to_string(),
            kind,
            is_remote,
        }
    }

    pub fn stylesheet(path: &str) -> Self {
        Self::new(path, ResourceKind::Stylesheet)
    }

    pub fn script(path: &str) -> Self {
        Self::new(path, ResourceKind::Script)
    }

    /// Get the content of the resource, fetching it if it is remote.
    pub fn content(&self) -> Result<String> {
        if self.is_remote {
            self.fetch_remote_content()
        } else {
            self.read_local_content()
        }
    }

    /// Fetch content from a remote URL, retrying with exponential backoff
    fn fetch_remote_content(&self) -> Result<String> {
        info!("Fetching remote resource: {}", self.path);

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(DeckError::FetchError)?;

        let mut retry_delay = 1000;
        let mut last_error = None;

        for attempt in 1..=3 {
            match client.get(&self.path).send() {
                Ok(response) if response.status().is_success() => {
                    return response.text().map_err(DeckError::FetchError);
                }
                Ok(response) => {
                    last_error = Some(DeckError::ValidationError(format!(
                        "HTTP error: {}",
                        response.status()
                    )));
                }
                Err(e) => last_error = Some(DeckError::FetchError(e)),
            }

            if attempt < 3 {
                info!(
                    "Fetch attempt {} failed, retrying in {} ms",
                    attempt, retry_delay
                );
                std::thread::sleep(Duration::from_millis(retry_delay));
                retry_delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DeckError::ValidationError("Unknown error fetching resource".to_string())
        }))
    }

    fn read_local_content(&self) -> Result<String> {
        info!("Reading local resource: {}", self.path);
        let path = Path::new(&self.path);
        if !path.exists() {
            return Err(DeckError::PathNotFoundError(path.to_path_buf()));
        }
        fs::read_to_string(path).map_err(DeckError::FileReadError)
    }

    /// HTML tag including this resource, embedding its content when `embed` is set.
    pub fn tag(&self, embed: bool) -> Result<String> {
        if !embed {
            return Ok(match self.kind {
                ResourceKind::Stylesheet => {
                    format!(r#"<link rel="stylesheet" href="{}">"#, self.path)
                }
                ResourceKind::Script => format!(r#"<script src="{}"></script>"#, self.path),
            });
        }

        let content = self.content()?;
        Ok(match self.kind {
            ResourceKind::Stylesheet => format!("<style>{}</style>", content),
            ResourceKind::Script => format!("<script>{}</script>", content),
        })
    }
}
