// ABOUTME: Library module for the stepdeck program.
// ABOUTME: Builds slide decks with step-by-step code reveals and exports them to HTML, images and PDF.

pub mod assets;
pub mod config;
pub mod deck;
pub mod errors;
pub mod html;
pub mod markdown;
pub mod mask;
pub mod render;
pub mod resources;
pub mod reveal;
pub mod show;
pub mod utils;
pub mod watch;

// Reexport common types and functions
pub use assets::{check_images, ImageAsset};
pub use config::Config;
pub use deck::{BoxId, BoxOptions, Content, Deck, Slide, TextStyle};
pub use errors::{DeckError, Result};
pub use html::{generate_html, write_html_to_file, HtmlOptions};
pub use markdown::{load_deck, parse_deck};
pub use mask::{parse_masks, parse_reveal_counts};
pub use render::{render_pdf, render_steps, RenderConfig};
pub use resources::{ResourceFile, ResourceKind};
pub use reveal::{
    code_line_by_line, code_reveal, code_step, reveal_steps, CodeOptions, LineSelector,
    RevealedBlock, StepMask, INVISIBLE_SPACE,
};
pub use show::{StepRange, Visibility};
pub use watch::{watch_markdown, WatchConfig};
