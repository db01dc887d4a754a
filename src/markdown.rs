// ABOUTME: Markdown front end for the stepdeck application
// ABOUTME: Splits a markdown deck into slides and turns annotated code blocks into step reveals

use crate::deck::{BoxId, BoxOptions, Content, Deck, Slide, TextStyle};
use crate::errors::{DeckError, Result};
use crate::mask;
use crate::reveal::{self, CodeOptions};
use crate::utils;
use comrak::nodes::{AstNode, NodeValue};
use comrak::{format_html, parse_document, Arena, ComrakOptions};
use log::{debug, info};
use std::fs;
use std::path::Path;

const TITLE_SIZE: u32 = 60;

/// Title, author and date taken from `% ` lines at the top of a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// How a fenced code block should be revealed, parsed from its info string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlockInfo {
    pub language: String,
    pub steps: Option<String>,
    pub reveal: Option<String>,
    pub line_by_line: bool,
    pub start: Option<u32>,
    pub until_end: bool,
}

impl CodeBlockInfo {
    pub fn is_stepped(&self) -> bool {
        self.steps.is_some() || self.reveal.is_some() || self.line_by_line
    }
}

/// Top-level blocks of one slide.
struct SlideSource<'a> {
    title: Option<String>,
    blocks: Vec<&'a AstNode<'a>>,
}

/// Read a markdown deck from disk.
///
/// Relative image paths are resolved against the deck's directory, so the deck
/// can be exported anywhere.
pub fn load_deck(path: &Path) -> Result<Deck> {
    info!("Loading deck from markdown: {:?}", path);
    utils::validate_file_exists(path)?;
    let markdown = fs::read_to_string(path)?;
    let mut deck = parse_deck(&markdown)?;

    let base_dir = utils::parent_dir(&utils::get_absolute_path(path)?);
    resolve_image_paths(&mut deck, &base_dir);
    Ok(deck)
}

/// Make every local, relative image path of the deck relative to `base_dir` instead.
pub fn resolve_image_paths(deck: &mut Deck, base_dir: &Path) {
    for slide in deck.slides_mut() {
        for content in slide.contents_mut() {
            let Content::Image { path, .. } = content else {
                continue;
            };
            if path.is_relative() && !utils::is_url(&path.to_string_lossy()) {
                *path = base_dir.join(&*path);
                debug!("Resolved image to {:?}", path);
            }
        }
    }
}

/// Build a deck from markdown source
pub fn parse_deck(markdown: &str) -> Result<Deck> {
    let (frontmatter, content) = parse_frontmatter(markdown);

    let mut options = ComrakOptions::default();
    options.render.unsafe_ = true;
    options.extension.table = true;
    options.extension.strikethrough = true;

    let arena = Arena::new();
    let document = parse_document(&arena, &content, &options);
    let sources = split_slides(document);

    let title = frontmatter
        .title
        .clone()
        .or_else(|| sources.iter().find_map(|s| s.title.clone()))
        .unwrap_or_else(|| "Presentation".to_string());

    let mut deck = Deck::new(title);
    deck.author = frontmatter.author;
    deck.date = Some(
        frontmatter
            .date
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
    );

    for (index, source) in sources.iter().enumerate() {
        let name = source
            .title
            .clone()
            .unwrap_or_else(|| format!("slide-{}", index + 1));
        let slide = deck.add_slide(name);
        build_slide(slide, source, &options)
            .map_err(|e| DeckError::MarkdownError(format!("slide {}: {}", index + 1, e)))?;
    }

    info!(
        "Parsed {} slides ({} steps in total)",
        deck.len(),
        deck.total_steps()
    );
    Ok(deck)
}

/// Parse frontmatter in the format: % Title\n% Author\n% Date
pub fn parse_frontmatter(content: &str) -> (Frontmatter, String) {
    let mut frontmatter = Frontmatter::default();
    let lines: Vec<&str> = content.lines().collect();

    let mut consumed = 0;
    for line in &lines {
        let Some(value) = line.strip_prefix("% ") else {
            break;
        };
        let value = Some(value.trim().to_string());
        match consumed {
            0 => frontmatter.title = value,
            1 => frontmatter.author = value,
            2 => frontmatter.date = value,
            _ => break,
        }
        consumed += 1;
    }

    let rest = lines[consumed..]
        .iter()
        .skip_while(|line| line.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    (frontmatter, rest)
}

/// Split a parsed document into slides. Every level-one heading and every
/// thematic break at the top level starts a new slide.
fn split_slides<'a>(document: &'a AstNode<'a>) -> Vec<SlideSource<'a>> {
    let mut slides = Vec::new();
    let mut current = SlideSource {
        title: None,
        blocks: Vec::new(),
    };

    for node in document.children() {
        let title = match &node.data.borrow().value {
            NodeValue::Heading(heading) if heading.level == 1 => {
                let mut text = String::new();
                collect_text(node, &mut text);
                Some(text.trim().to_string()).filter(|t| !t.is_empty())
            }
            NodeValue::ThematicBreak => None,
            _ => {
                current.blocks.push(node);
                continue;
            }
        };

        let next = SlideSource {
            title,
            blocks: Vec::new(),
        };
        let finished = std::mem::replace(&mut current, next);
        if finished.title.is_some() || !finished.blocks.is_empty() {
            slides.push(finished);
        }
    }
    if current.title.is_some() || !current.blocks.is_empty() {
        slides.push(current);
    }

    slides
}

/// Parse a fenced code block's info string, e.g. `rust steps='0 _ | ..' start=2`.
pub fn parse_code_info(info: &str) -> Result<CodeBlockInfo> {
    let mut parsed = CodeBlockInfo {
        until_end: true,
        ..CodeBlockInfo::default()
    };

    let mut chars = info.trim().chars().peekable();
    let mut first = true;

    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            key.push(c);
            chars.next();
        }

        let value = if chars.peek() == Some(&'=') {
            chars.next();
            let mut value = String::new();
            match chars.peek().copied() {
                Some(quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == quote {
                            closed = true;
                            break;
                        }
                        value.push(c);
                    }
                    if !closed {
                        return Err(DeckError::MarkdownError(format!(
                            "unterminated value for {:?} in {:?}",
                            key, info
                        )));
                    }
                }
                _ => {
                    while let Some(&c) = chars.peek() {
                        if c.is_whitespace() {
                            break;
                        }
                        value.push(c);
                        chars.next();
                    }
                }
            }
            Some(value)
        } else {
            None
        };

        match (key.as_str(), value) {
            (language, None) if first => parsed.language = language.to_string(),
            ("steps", Some(value)) => parsed.steps = Some(value),
            ("reveal", Some(value)) => parsed.reveal = Some(value),
            ("line-by-line", None) => parsed.line_by_line = true,
            ("start", Some(value)) => {
                let start = value.parse::<u32>().ok().filter(|s| *s > 0).ok_or_else(|| {
                    DeckError::MarkdownError(format!("invalid start step {:?}", value))
                })?;
                parsed.start = Some(start);
            }
            ("until-end", Some(value)) => {
                parsed.until_end = match value.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(DeckError::MarkdownError(format!(
                            "until-end must be true or false, got {:?}",
                            value
                        )))
                    }
                }
            }
            (other, _) => debug!("Ignoring code block attribute {:?}", other),
        }
        first = false;
    }

    Ok(parsed)
}

/// Parse `<!-- show: SPEC -->`, which sets the visibility of the following block.
fn show_directive(html: &str) -> Option<String> {
    let inner = html
        .trim()
        .strip_prefix("<!--")?
        .strip_suffix("-->")?
        .trim();
    let spec = inner.strip_prefix("show:")?.trim();
    if spec.is_empty() {
        None
    } else {
        Some(spec.to_string())
    }
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            _ => collect_text(child, out),
        }
    }
}

/// A paragraph holding a single image, returned as (url, alt text).
fn lone_image<'a>(node: &'a AstNode<'a>) -> Option<(String, String)> {
    let mut children = node.children();
    let child = children.next()?;
    if children.next().is_some() {
        return None;
    }
    let url = match &child.data.borrow().value {
        NodeValue::Image(link) => link.url.clone(),
        _ => return None,
    };
    let mut alt = String::new();
    collect_text(child, &mut alt);
    Some((url, alt))
}

fn render_node<'a>(node: &'a AstNode<'a>, options: &ComrakOptions) -> Result<String> {
    let mut output = Vec::new();
    format_html(node, options, &mut output)?;
    String::from_utf8(output).map_err(|e| DeckError::MarkdownError(e.to_string()))
}

/// The first step of a reveal that has no explicit `start`.
fn default_start(slide: &Slide, wrapper: BoxId, had_show: bool) -> Result<u32> {
    if had_show {
        let node = slide.node(wrapper)?;
        return Ok(node.visibility.ranges().first().map_or(1, |r| r.start));
    }
    if slide.steps() == 1 && slide.current_fragment() == 1 {
        return Ok(1);
    }
    slide
        .current_fragment()
        .checked_add(1)
        .ok_or_else(|| DeckError::MarkdownError("no step follows the current fragment".to_string()))
}

fn add_code_block(
    slide: &mut Slide,
    wrapper: BoxId,
    info: &CodeBlockInfo,
    literal: &str,
    had_show: bool,
) -> Result<()> {
    if !info.is_stepped() {
        return slide.code(wrapper, info.language.as_str(), literal.trim_end());
    }

    let start = match info.start {
        Some(start) => start,
        None => default_start(slide, wrapper, had_show)?,
    };
    let options = CodeOptions {
        language: if info.language.is_empty() {
            CodeOptions::default().language
        } else {
            info.language.clone()
        },
        until_end: info.until_end,
    };

    if let Some(steps) = &info.steps {
        let masks = mask::parse_masks(steps)?;
        reveal::code_step(slide, wrapper, literal, start, &masks, &options)?;
    } else if let Some(counts) = &info.reveal {
        let counts = mask::parse_reveal_counts(counts)?;
        reveal::code_reveal(slide, wrapper, literal, start, &counts, &options)?;
    } else {
        reveal::code_line_by_line(slide, wrapper, literal, start, &options)?;
    }
    Ok(())
}

fn build_slide(slide: &mut Slide, source: &SlideSource<'_>, options: &ComrakOptions) -> Result<()> {
    let root = slide.root();

    if let Some(title) = &source.title {
        let title_box = slide.add_box(root, BoxOptions::new().padding(20))?;
        slide.text(
            title_box,
            title.as_str(),
            TextStyle {
                size: Some(TITLE_SIZE),
                bold: true,
                color: None,
            },
        )?;
    }

    let mut pending_show: Option<String> = None;

    for &node in &source.blocks {
        let value = node.data.borrow().value.clone();

        if let NodeValue::HtmlBlock(block) = &value {
            if let Some(spec) = show_directive(&block.literal) {
                pending_show = Some(spec);
                continue;
            }
        }

        let had_show = pending_show.is_some();
        let mut box_options = BoxOptions::new();
        box_options.show = pending_show.take();
        let wrapper = slide.add_box(root, box_options)?;

        match value {
            NodeValue::CodeBlock(block) => {
                let info = parse_code_info(&block.info)?;
                add_code_block(slide, wrapper, &info, &block.literal, had_show)?;
            }
            NodeValue::Paragraph => match lone_image(node) {
                Some((url, alt)) => slide.image(wrapper, url, alt)?,
                None => slide.html(wrapper, render_node(node, options)?)?,
            },
            _ => slide.html(wrapper, render_node(node, options)?)?,
        }
    }

    if let Some(spec) = pending_show {
        debug!("Dangling show directive {:?} at the end of slide", spec);
    }
    Ok(())
}
