// ABOUTME: HTML export for the stepdeck application
// ABOUTME: Writes one section per slide step containing only the boxes visible at that step

use crate::deck::{BoxId, BoxNode, Content, Deck, Slide, TextStyle};
use crate::errors::Result;
use crate::resources::ResourceFile;
use crate::utils::{self, escape_html};
use log::{info, warn};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Options for HTML export
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    pub css_files: Vec<ResourceFile>,
    pub js_files: Vec<ResourceFile>,
    pub embed_resources: bool,
    pub auto_reload_script: Option<String>,
    /// Absolute directory the document is written to; local images are linked relative to it.
    pub output_dir: Option<PathBuf>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            css_files: Vec::new(),
            js_files: Vec::new(),
            embed_resources: true,
            auto_reload_script: None,
            output_dir: None,
        }
    }
}

impl HtmlOptions {
    /// Link images relative to the directory of `output_path`, creating that directory.
    pub fn for_output(mut self, output_path: &Path) -> Result<Self> {
        utils::ensure_parent_directory_exists(output_path)?;
        self.output_dir = Some(utils::get_absolute_path(&utils::parent_dir(output_path))?);
        Ok(self)
    }
}

const NAVIGATION_SCRIPT: &str = r#"<script>
(function () {
  var steps = document.querySelectorAll('section.step');
  var current = 0;
  function show(index) {
    if (index < 0 || index >= steps.length) return;
    steps[current].classList.remove('current');
    current = index;
    steps[current].classList.add('current');
  }
  if (steps.length > 0) steps[0].classList.add('current');
  document.addEventListener('keydown', function (e) {
    if (e.key === 'ArrowRight' || e.key === 'PageDown' || e.key === ' ') show(current + 1);
    if (e.key === 'ArrowLeft' || e.key === 'PageUp') show(current - 1);
  });
  window.stepdeck = { show: show, count: steps.length };
})();
</script>"#;

fn theme_css(width: u32, height: u32) -> String {
    format!(
        r#"<style>
html, body {{ margin: 0; padding: 0; background: #222; }}
section.step {{
  display: none; box-sizing: border-box; width: {width}px; height: {height}px;
  background: white; color: black; font-family: sans-serif; font-size: 40px;
  flex-direction: column; align-items: center; justify-content: center; overflow: hidden;
}}
section.step.current {{ display: flex; }}
.box {{ display: flex; flex-direction: column; align-items: center; box-sizing: border-box; }}
.box.horizontal {{ flex-direction: row; }}
.box.layered {{ display: grid; justify-items: center; }}
.box.layered > .overlay {{ grid-area: 1 / 1; }}
.text {{ text-align: center; }}
pre.code {{ background: #EEEEEE; margin: 0; padding: 10px 50px 10px 10px; text-align: left; font-size: 32px; }}
img {{ max-width: 100%; max-height: 100%; }}
@page {{ size: {width}px {height}px; margin: 0; }}
@media print {{
  html, body {{ background: white; }}
  section.step {{ display: flex !important; page-break-after: always; break-after: page; }}
}}
</style>"#,
        width = width,
        height = height
    )
}

fn text_style_attr(style: &TextStyle) -> String {
    let mut css = String::new();
    if let Some(size) = style.size {
        let _ = write!(css, "font-size: {}px;", size);
    }
    if style.bold {
        css.push_str("font-weight: bold;");
    }
    if let Some(color) = &style.color {
        let _ = write!(css, "color: {};", color);
    }
    if css.is_empty() {
        String::new()
    } else {
        format!(r#" style="{}""#, escape_html(&css))
    }
}

fn box_attrs(node: &BoxNode, layered: bool) -> String {
    let mut classes = vec!["box"];
    if node.style.horizontal {
        classes.push("horizontal");
    }
    if node.style.overlay {
        classes.push("overlay");
    }
    if layered {
        classes.push("layered");
    }

    let mut css = String::new();
    if let Some(width) = &node.style.width {
        let _ = write!(css, "width: {};", width);
    }
    if let Some(height) = &node.style.height {
        let _ = write!(css, "height: {};", height);
    }
    if let Some(padding) = node.style.padding {
        let _ = write!(css, "padding: {}px;", padding);
    }
    if let Some(color) = &node.style.bg_color {
        let _ = write!(css, "background: {};", color);
    }

    let mut attrs = format!(r#" class="{}""#, classes.join(" "));
    if !css.is_empty() {
        let _ = write!(attrs, r#" style="{}""#, escape_html(&css));
    }
    attrs
}

/// `src` for an image: relative to the output directory when both are absolute
/// paths, a `file://` URL for other absolute paths, the reference itself otherwise.
fn image_src(path: &Path, output_dir: Option<&Path>) -> String {
    let reference = path.to_string_lossy();
    if !path.is_absolute() || utils::is_url(&reference) {
        return reference.into_owned();
    }
    let Ok(target) = Url::from_file_path(path) else {
        return reference.into_owned();
    };
    output_dir
        .and_then(|dir| Url::from_directory_path(dir).ok())
        .and_then(|base| base.make_relative(&target))
        .unwrap_or_else(|| target.to_string())
}

fn render_content(content: &Content, options: &HtmlOptions, out: &mut String) {
    match content {
        Content::Text { text, style } => {
            let body = text
                .lines()
                .map(escape_html)
                .collect::<Vec<_>>()
                .join("<br>");
            let _ = write!(out, r#"<div class="text"{}>{}</div>"#, text_style_attr(style), body);
        }
        Content::Code { language, source } => {
            let _ = write!(
                out,
                r#"<pre class="code"><code class="language-{}">{}</code></pre>"#,
                escape_html(language),
                escape_html(source)
            );
        }
        Content::Html(html) => out.push_str(html),
        Content::Image { path, alt } => {
            let _ = write!(
                out,
                r#"<img src="{}" alt="{}">"#,
                escape_html(&image_src(path, options.output_dir.as_deref())),
                escape_html(alt)
            );
        }
    }
}

fn render_box(
    slide: &Slide,
    id: BoxId,
    step: u32,
    options: &HtmlOptions,
    out: &mut String,
) -> Result<()> {
    let node = slide.node(id)?;
    if !node.visibility.contains(step) {
        return Ok(());
    }

    let mut layered = false;
    for child in &node.children {
        if slide.node(*child)?.style.overlay {
            layered = true;
            break;
        }
    }

    let _ = write!(out, "<div{}>", box_attrs(node, layered));
    for content in &node.content {
        render_content(content, options, out);
    }
    for child in &node.children {
        render_box(slide, *child, step, options, out)?;
    }
    out.push_str("</div>");
    Ok(())
}

/// Render one step of a slide to the inner HTML of its section.
pub fn render_step(slide: &Slide, step: u32, options: &HtmlOptions) -> Result<String> {
    let mut out = String::new();
    render_box(slide, slide.root(), step, options, &mut out)?;
    Ok(out)
}

fn push_resources(html_doc: &mut String, resources: &[ResourceFile], embed: bool) {
    for resource in resources {
        match resource.tag(embed) {
            Ok(tag) => {
                html_doc.push_str(&tag);
                html_doc.push('\n');
            }
            Err(e) => {
                warn!("Failed to include resource {}: {}", resource.path, e);
            }
        }
    }
}

/// Generate a standalone HTML document with one section per slide step
pub fn generate_html(deck: &Deck, options: &HtmlOptions) -> Result<String> {
    info!(
        "Generating HTML for {} slides ({} steps)",
        deck.len(),
        deck.total_steps()
    );

    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str("<meta name=\"generator\" content=\"stepdeck\">\n");
    if let Some(author) = &deck.author {
        let _ = writeln!(html_doc, "<meta name=\"author\" content=\"{}\">", escape_html(author));
    }
    if let Some(date) = &deck.date {
        let _ = writeln!(html_doc, "<meta name=\"date\" content=\"{}\">", escape_html(date));
    }
    let _ = writeln!(html_doc, "<title>{}</title>", escape_html(&deck.title));
    html_doc.push_str(&theme_css(deck.width, deck.height));
    html_doc.push('\n');
    push_resources(&mut html_doc, &options.css_files, options.embed_resources);
    html_doc.push_str("</head>\n<body>\n");

    for (index, slide) in deck.slides().iter().enumerate() {
        let steps = slide.steps();
        for step in 1..=steps {
            let _ = write!(
                html_doc,
                r#"<section class="step" id="slide-{slide}-step-{step}" data-slide="{slide}" data-step="{step}" data-steps="{steps}" data-name="{name}">"#,
                slide = index + 1,
                step = step,
                steps = steps,
                name = escape_html(slide.name())
            );
            html_doc.push_str(&render_step(slide, step, options)?);
            html_doc.push_str("</section>\n");
        }
    }

    html_doc.push_str(NAVIGATION_SCRIPT);
    html_doc.push('\n');
    push_resources(&mut html_doc, &options.js_files, options.embed_resources);

    if let Some(script) = &options.auto_reload_script {
        html_doc.push_str(script);
        html_doc.push('\n');
    }

    html_doc.push_str("</body>\n</html>");
    Ok(html_doc)
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);
    utils::ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, html_content)?;
    Ok(())
}
