// ABOUTME: Step-by-step code reveal for the stepdeck library
// ABOUTME: Expands per-step line masks and attaches one overlay per step to a slide

use crate::deck::{BoxId, Slide};
use crate::errors::{DeckError, Result};
use log::debug;

/// Placeholder for hidden lines. U+2800 (braille blank) keeps the line height
/// where a normal space would be collapsed.
pub const INVISIBLE_SPACE: &str = "\u{2800}";

/// What to show in one line slot of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSelector {
    /// Original line at this 0-based index.
    Line(usize),
    /// Original line counted from the end, `FromEnd(1)` being the last line.
    FromEnd(usize),
    /// Literal replacement text.
    Text(String),
    /// Invisible placeholder.
    Hidden,
    /// Fill every remaining slot with the original lines, in order.
    RevealRest,
    /// Fill every remaining slot with placeholders.
    HideRest,
    /// Drop one original line from the block without leaving a placeholder.
    Omit,
}

/// One selector per line slot, for a single step.
pub type StepMask = Vec<LineSelector>;

/// The lines shown during one step of a reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedBlock {
    /// 0-based position of the mask that produced this block.
    pub step: usize,
    pub lines: Vec<String>,
}

impl RevealedBlock {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Options for the code box of each step.
#[derive(Debug, Clone)]
pub struct CodeOptions {
    pub language: String,
    /// Keep the last step visible for the rest of the slide.
    pub until_end: bool,
}

impl Default for CodeOptions {
    fn default() -> Self {
        Self {
            language: "rust".to_string(),
            until_end: true,
        }
    }
}

/// Split a snippet into lines, dropping surrounding blank lines and trailing whitespace.
pub fn split_source(source: &str) -> Vec<String> {
    let lines: Vec<&str> = source.lines().collect();
    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |i| i + 1);

    lines[start..end]
        .iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Expand the `RevealRest`/`HideRest`/`Omit` markers of a mask into concrete selectors.
///
/// `step` is the 0-based position of the mask and is only used for error messages.
/// The result contains only `Line`, `FromEnd`, `Text` and `Hidden` selectors, and its
/// length is checked against the number of lines that were not omitted.
pub fn expand_mask(mask: &[LineSelector], line_count: usize, step: usize) -> Result<StepMask> {
    let mut expanded = Vec::with_capacity(line_count);
    let mut omitted = 0;

    for (position, selector) in mask.iter().enumerate() {
        match selector {
            LineSelector::RevealRest | LineSelector::HideRest => {
                if position != mask.len() - 1 {
                    return Err(DeckError::MaskError(format!(
                        "step {}: {:?} must be the last entry of the mask",
                        step + 1,
                        selector
                    )));
                }
                let remaining = line_count.saturating_sub(expanded.len() + omitted);
                if *selector == LineSelector::RevealRest {
                    expanded.extend((position..position + remaining).map(LineSelector::Line));
                } else {
                    expanded.extend(std::iter::repeat(LineSelector::Hidden).take(remaining));
                }
            }
            LineSelector::Omit => omitted += 1,
            other => expanded.push(other.clone()),
        }
    }

    if omitted > line_count {
        return Err(DeckError::MaskError(format!(
            "step {}: omits {} lines but the snippet has only {}",
            step + 1,
            omitted,
            line_count
        )));
    }

    let expected = line_count - omitted;
    if expanded.len() != expected {
        return Err(DeckError::MaskLengthMismatch {
            step: step + 1,
            expected,
            actual: expanded.len(),
        });
    }

    Ok(expanded)
}

fn resolve_selector(lines: &[String], selector: &LineSelector, step: usize) -> Result<String> {
    let out_of_range = |index: i64| DeckError::LineOutOfRange {
        step: step + 1,
        index,
        line_count: lines.len(),
    };

    match selector {
        LineSelector::Line(index) => lines
            .get(*index)
            .cloned()
            .ok_or_else(|| out_of_range(*index as i64)),
        LineSelector::FromEnd(offset) => {
            if *offset == 0 || *offset > lines.len() {
                return Err(out_of_range(-(*offset as i64)));
            }
            Ok(lines[lines.len() - offset].clone())
        }
        LineSelector::Text(text) => Ok(text.clone()),
        LineSelector::Hidden => Ok(INVISIBLE_SPACE.to_string()),
        marker => Err(DeckError::MaskError(format!(
            "step {}: unexpanded marker {:?}",
            step + 1,
            marker
        ))),
    }
}

/// Resolve a single mask against the snippet lines.
pub fn resolve_mask(lines: &[String], mask: &[LineSelector], step: usize) -> Result<Vec<String>> {
    expand_mask(mask, lines.len(), step)?
        .iter()
        .map(|selector| resolve_selector(lines, selector, step))
        .collect()
}

/// Produce the visible lines of `source` for every mask, in order.
pub fn reveal_steps(source: &str, masks: &[StepMask]) -> Result<Vec<RevealedBlock>> {
    let lines = split_source(source);
    masks
        .iter()
        .enumerate()
        .map(|(step, mask)| {
            Ok(RevealedBlock {
                step,
                lines: resolve_mask(&lines, mask, step)?,
            })
        })
        .collect()
}

/// Attach one code overlay per mask under `parent`, the first one shown at `show_start`.
///
/// Each overlay is visible on exactly one step except the last one, which stays
/// visible until the end of the slide when `options.until_end` is set. All masks are
/// validated before the slide is touched. Returns the last overlay.
pub fn code_step(
    slide: &mut Slide,
    parent: BoxId,
    source: &str,
    show_start: u32,
    masks: &[StepMask],
    options: &CodeOptions,
) -> Result<BoxId> {
    if masks.is_empty() {
        return Err(DeckError::MaskError("at least one step is required".to_string()));
    }
    if show_start == 0 {
        return Err(DeckError::MaskError("steps start at 1".to_string()));
    }

    let blocks = reveal_steps(source, masks)?;
    let count = blocks.len();
    let last_step = u32::try_from(count - 1)
        .ok()
        .and_then(|offset| show_start.checked_add(offset))
        .ok_or_else(|| {
            DeckError::MaskError(format!(
                "{} steps starting at step {} run past the last representable step",
                count, show_start
            ))
        })?;
    debug!(
        "Revealing {} lines over {} steps starting at step {} on slide {:?}",
        split_source(source).len(),
        count,
        show_start,
        slide.name()
    );

    let mut last = None;
    for (step, block) in (show_start..=last_step).zip(blocks) {
        let show = if step == last_step && options.until_end {
            format!("{}+", step)
        } else {
            step.to_string()
        };

        let wrapper = slide.overlay(parent, &show)?;
        slide.code(wrapper, options.language.as_str(), block.text())?;
        last = Some(wrapper);
    }

    last.ok_or_else(|| DeckError::MaskError("no step was rendered".to_string()))
}

/// Masks revealing a growing prefix of the snippet: `[2, 1]` shows two lines, then three.
pub fn reveal_masks(line_count: usize, counts: &[usize]) -> Result<Vec<StepMask>> {
    let mut revealed = 0;
    counts
        .iter()
        .map(|count| {
            revealed += count;
            if revealed > line_count {
                return Err(DeckError::MaskError(format!(
                    "cannot reveal {} lines of a {}-line snippet",
                    revealed, line_count
                )));
            }
            let mut mask = show(revealed, 0);
            mask.extend(skip(line_count - revealed));
            Ok(mask)
        })
        .collect()
}

/// Masks revealing the snippet one line per step.
pub fn line_by_line_masks(line_count: usize) -> Vec<StepMask> {
    (1..=line_count)
        .map(|revealed| {
            let mut mask = show(revealed, 0);
            mask.extend(skip(line_count - revealed));
            mask
        })
        .collect()
}

/// Reveal a growing prefix of the snippet, `counts[i]` more lines at every step.
pub fn code_reveal(
    slide: &mut Slide,
    parent: BoxId,
    source: &str,
    show_start: u32,
    counts: &[usize],
    options: &CodeOptions,
) -> Result<BoxId> {
    let masks = reveal_masks(split_source(source).len(), counts)?;
    code_step(slide, parent, source, show_start, &masks, options)
}

/// Reveal the snippet one line per step.
pub fn code_line_by_line(
    slide: &mut Slide,
    parent: BoxId,
    source: &str,
    show_start: u32,
    options: &CodeOptions,
) -> Result<BoxId> {
    let masks = line_by_line_masks(split_source(source).len());
    code_step(slide, parent, source, show_start, &masks, options)
}

/// `n` consecutive original lines starting at `start`.
pub fn show(n: usize, start: usize) -> Vec<LineSelector> {
    (start..start + n).map(LineSelector::Line).collect()
}

/// `n` hidden slots.
pub fn skip(n: usize) -> Vec<LineSelector> {
    vec![LineSelector::Hidden; n]
}

/// The last `n` original lines, in order.
pub fn last(n: usize) -> Vec<LineSelector> {
    (1..=n).rev().map(LineSelector::FromEnd).collect()
}
