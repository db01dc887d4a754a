// ABOUTME: Deck builder for the stepdeck library
// ABOUTME: Holds slides as arenas of nested boxes with per-slide fragment counters

use crate::errors::{DeckError, Result};
use crate::show::Visibility;
use log::debug;
use std::fmt;
use std::path::PathBuf;

/// Default page width in pixels.
pub const DEFAULT_WIDTH: u32 = 1920;
/// Default page height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Index of a box inside its slide's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxId(pub usize);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Styling applied to a run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub size: Option<u32>,
    pub bold: bool,
    pub color: Option<String>,
}

/// Something drawn inside a box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text { text: String, style: TextStyle },
    Code { language: String, source: String },
    /// Pre-rendered HTML fragment, inserted verbatim on export.
    Html(String),
    Image { path: PathBuf, alt: String },
}

/// Layout hints for a box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxStyle {
    pub horizontal: bool,
    /// Drawn on top of its siblings instead of after them.
    pub overlay: bool,
    pub width: Option<String>,
    pub height: Option<String>,
    pub padding: Option<u32>,
    pub bg_color: Option<String>,
}

/// Options used when creating a box.
#[derive(Debug, Clone, Default)]
pub struct BoxOptions {
    pub show: Option<String>,
    pub style: BoxStyle,
}

impl BoxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(mut self, spec: impl Into<String>) -> Self {
        self.show = Some(spec.into());
        self
    }

    pub fn horizontal(mut self) -> Self {
        self.style.horizontal = true;
        self
    }

    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.style.width = Some(width.into());
        self
    }

    pub fn height(mut self, height: impl Into<String>) -> Self {
        self.style.height = Some(height.into());
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.style.padding = Some(padding);
        self
    }

    pub fn bg_color(mut self, color: impl Into<String>) -> Self {
        self.style.bg_color = Some(color.into());
        self
    }
}

/// A rectangular layout node.
#[derive(Debug, Clone)]
pub struct BoxNode {
    pub parent: Option<BoxId>,
    pub children: Vec<BoxId>,
    pub visibility: Visibility,
    pub style: BoxStyle,
    pub content: Vec<Content>,
}

impl BoxNode {
    fn new(parent: Option<BoxId>, visibility: Visibility, style: BoxStyle) -> Self {
        Self {
            parent,
            children: Vec::new(),
            visibility,
            style,
            content: Vec::new(),
        }
    }
}

/// One slide: a tree of boxes plus the fragment counter used to resolve `next`/`last`.
#[derive(Debug, Clone)]
pub struct Slide {
    name: String,
    nodes: Vec<BoxNode>,
    current_fragment: u32,
}

impl Slide {
    fn new(name: String) -> Self {
        Self {
            name,
            nodes: vec![BoxNode::new(None, Visibility::always(), BoxStyle::default())],
            current_fragment: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> BoxId {
        BoxId(0)
    }

    pub fn current_fragment(&self) -> u32 {
        self.current_fragment
    }

    /// Number of steps this slide needs to show every box.
    pub fn steps(&self) -> u32 {
        self.nodes
            .iter()
            .map(|node| node.visibility.max_step())
            .max()
            .unwrap_or(1)
    }

    pub fn box_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: BoxId) -> Result<&BoxNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DeckError::UnknownBox(id.0, self.name.clone()))
    }

    fn node_mut(&mut self, id: BoxId) -> Result<&mut BoxNode> {
        let name = &self.name;
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| DeckError::UnknownBox(id.0, name.clone()))
    }

    pub fn children(&self, id: BoxId) -> Result<&[BoxId]> {
        Ok(&self.node(id)?.children)
    }

    /// Add a child box under `parent`.
    pub fn add_box(&mut self, parent: BoxId, options: BoxOptions) -> Result<BoxId> {
        self.node(parent)?;

        let visibility = match &options.show {
            Some(spec) => {
                let (visibility, current) = Visibility::parse(spec, self.current_fragment)?;
                self.current_fragment = current;
                visibility
            }
            None => Visibility::always(),
        };

        let id = BoxId(self.nodes.len());
        self.nodes
            .push(BoxNode::new(Some(parent), visibility, options.style));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Add a box layered over `parent`'s other children, shown only during `show`.
    pub fn overlay(&mut self, parent: BoxId, show: &str) -> Result<BoxId> {
        let mut options = BoxOptions::new().show(show);
        options.style.overlay = true;
        self.add_box(parent, options)
    }

    pub fn text(&mut self, id: BoxId, text: impl Into<String>, style: TextStyle) -> Result<()> {
        self.node_mut(id)?.content.push(Content::Text {
            text: text.into(),
            style,
        });
        Ok(())
    }

    pub fn code(
        &mut self,
        id: BoxId,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<()> {
        self.node_mut(id)?.content.push(Content::Code {
            language: language.into(),
            source: source.into(),
        });
        Ok(())
    }

    pub fn html(&mut self, id: BoxId, html: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.content.push(Content::Html(html.into()));
        Ok(())
    }

    pub fn image(&mut self, id: BoxId, path: impl Into<PathBuf>, alt: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.content.push(Content::Image {
            path: path.into(),
            alt: alt.into(),
        });
        Ok(())
    }

    /// A box is visible at `step` when it and all of its ancestors are.
    pub fn is_visible(&self, id: BoxId, step: u32) -> Result<bool> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id)?;
            if !node.visibility.contains(step) {
                return Ok(false);
            }
            current = node.parent;
        }
        Ok(true)
    }

    /// Iterate over every content item with the box that owns it.
    pub fn contents(&self) -> impl Iterator<Item = (BoxId, &Content)> {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(i, node)| node.content.iter().map(move |c| (BoxId(i), c)))
    }

    pub fn contents_mut(&mut self) -> impl Iterator<Item = &mut Content> {
        self.nodes.iter_mut().flat_map(|node| node.content.iter_mut())
    }
}

/// An ordered collection of slides, built explicitly and rendered once.
#[derive(Debug, Clone)]
pub struct Deck {
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub width: u32,
    pub height: u32,
    slides: Vec<Slide>,
}

impl Deck {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            date: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            slides: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Append a new slide and return it for population.
    pub fn add_slide(&mut self, name: impl Into<String>) -> &mut Slide {
        let name = name.into();
        debug!("Adding slide {} ({:?})", self.slides.len() + 1, name);
        self.slides.push(Slide::new(name));
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Total number of rendered pages, one per step of every slide.
    pub fn total_steps(&self) -> u32 {
        self.slides
            .iter()
            .map(Slide::steps)
            .fold(0, u32::saturating_add)
    }
}
