// ABOUTME: Image asset validation for decks
// ABOUTME: Checks that every referenced image exists and reads raster dimensions

use crate::deck::{Content, Deck};
use crate::errors::{DeckError, Result};
use crate::utils;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// An image referenced by a deck, resolved against the deck's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub slide: usize,
    pub path: PathBuf,
    /// Pixel size; `None` for vector images.
    pub dimensions: Option<(u32, u32)>,
}

fn is_vector(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// Resolve and validate every local image in the deck. A missing or undecodable image is an error.
pub fn check_images(deck: &Deck, base_dir: &Path) -> Result<Vec<ImageAsset>> {
    let mut assets = Vec::new();

    for (index, slide) in deck.slides().iter().enumerate() {
        for (_, content) in slide.contents() {
            let Content::Image { path, .. } = content else {
                continue;
            };

            if utils::is_url(&path.to_string_lossy()) {
                debug!("Slide {}: skipping remote image {:?}", index + 1, path);
                continue;
            }

            let resolved = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };

            if !resolved.is_file() {
                return Err(DeckError::PathNotFoundError(resolved));
            }

            let dimensions = if is_vector(&resolved) {
                None
            } else {
                let size = image::image_dimensions(&resolved).map_err(|e| {
                    DeckError::ImageError {
                        path: resolved.clone(),
                        message: e.to_string(),
                    }
                })?;
                Some(size)
            };

            debug!(
                "Slide {}: image {:?} ({:?})",
                index + 1,
                resolved,
                dimensions
            );
            assets.push(ImageAsset {
                slide: index + 1,
                path: resolved,
                dimensions,
            });
        }
    }

    info!("Checked {} image assets", assets.len());
    Ok(assets)
}
