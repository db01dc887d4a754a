// ABOUTME: Textual syntax for step masks
// ABOUTME: Parses strings like `0 1 _ | 0:3 ..` into per-step line selectors

use crate::errors::{DeckError, Result};
use crate::reveal::{self, LineSelector, StepMask};
use std::iter::Peekable;
use std::str::Chars;

/// Parse a list of step masks.
///
/// Steps are separated by `|` and selectors by whitespace:
/// `3` original line, `-1` line from the end, `_` hidden, `_*4` four hidden lines,
/// `2:5` original lines 2 to 4, `"text"` literal text, `..` reveal the rest,
/// `~` hide the rest and `!` omit a line.
pub fn parse_masks(text: &str) -> Result<Vec<StepMask>> {
    let mut masks = Vec::new();
    let mut current: StepMask = Vec::new();
    let mut word = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                flush_word(&mut word, &mut current)?;
                current.push(LineSelector::Text(read_quoted(&mut chars)?));
            }
            '|' => {
                flush_word(&mut word, &mut current)?;
                finish_step(&mut masks, &mut current)?;
            }
            c if c.is_whitespace() => flush_word(&mut word, &mut current)?,
            c => word.push(c),
        }
    }
    flush_word(&mut word, &mut current)?;
    finish_step(&mut masks, &mut current)?;

    Ok(masks)
}

/// Parse cumulative reveal counts such as `2,1,3` or `2 1 3`.
pub fn parse_reveal_counts(text: &str) -> Result<Vec<usize>> {
    let counts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<usize>().map_err(|_| {
                DeckError::MaskError(format!("{:?} is not a line count", item))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if counts.is_empty() {
        return Err(DeckError::MaskError("no reveal counts given".to_string()));
    }
    Ok(counts)
}

fn finish_step(masks: &mut Vec<StepMask>, current: &mut StepMask) -> Result<()> {
    if current.is_empty() {
        return Err(DeckError::MaskError(format!(
            "step {} has no selectors",
            masks.len() + 1
        )));
    }
    masks.push(std::mem::take(current));
    Ok(())
}

fn flush_word(word: &mut String, current: &mut StepMask) -> Result<()> {
    if !word.is_empty() {
        current.extend(parse_token(word)?);
        word.clear();
    }
    Ok(())
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut literal = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(literal),
            '\\' => match chars.peek() {
                Some('"') | Some('\\') => {
                    if let Some(escaped) = chars.next() {
                        literal.push(escaped);
                    }
                }
                _ => literal.push('\\'),
            },
            c => literal.push(c),
        }
    }
    Err(DeckError::MaskError(format!(
        "unterminated literal \"{}",
        literal
    )))
}

fn parse_index(token: &str, text: &str) -> Result<usize> {
    text.parse::<usize>()
        .map_err(|_| DeckError::MaskError(format!("invalid selector {:?}", token)))
}

fn parse_token(token: &str) -> Result<Vec<LineSelector>> {
    let selectors = match token {
        "_" => vec![LineSelector::Hidden],
        ".." => vec![LineSelector::RevealRest],
        "~" => vec![LineSelector::HideRest],
        "!" => vec![LineSelector::Omit],
        _ => {
            if let Some(count) = token.strip_prefix("_*") {
                reveal::skip(parse_index(token, count)?)
            } else if let Some((from, to)) = token.split_once(':') {
                let from = parse_index(token, from)?;
                let to = parse_index(token, to)?;
                if to < from {
                    return Err(DeckError::MaskError(format!(
                        "range {:?} ends before it starts",
                        token
                    )));
                }
                reveal::show(to - from, from)
            } else if let Some(offset) = token.strip_prefix('-') {
                let offset = parse_index(token, offset)?;
                if offset == 0 {
                    return Err(DeckError::MaskError(
                        "-0 does not name a line; use -1 for the last line".to_string(),
                    ));
                }
                vec![LineSelector::FromEnd(offset)]
            } else {
                vec![LineSelector::Line(parse_index(token, token)?)]
            }
        }
    };
    Ok(selectors)
}
