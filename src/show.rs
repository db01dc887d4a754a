// ABOUTME: Visibility specifications for boxes within a slide
// ABOUTME: Parses show strings like "2+", "1-3", "next+" into step ranges

use crate::errors::{DeckError, Result};
use std::fmt;

/// An inclusive range of 1-based steps. `end == None` means "until the end of the slide".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl StepRange {
    pub fn contains(&self, step: u32) -> bool {
        step >= self.start && self.end.map_or(true, |end| step <= end)
    }

    /// The step this range pins down: the start of an open range, the end of a closed one.
    fn referenced_step(&self) -> u32 {
        self.end.unwrap_or(self.start)
    }
}

impl fmt::Display for StepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            None => write!(f, "{}+", self.start),
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}-{}", self.start, end),
        }
    }
}

/// The set of steps during which a box is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    ranges: Vec<StepRange>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::always()
    }
}

impl Visibility {
    /// Visible on every step.
    pub fn always() -> Self {
        Self::from_step(1)
    }

    /// Visible from `step` until the end of the slide.
    pub fn from_step(step: u32) -> Self {
        Self {
            ranges: vec![StepRange {
                start: step.max(1),
                end: None,
            }],
        }
    }

    /// Visible only on `step`.
    pub fn single(step: u32) -> Self {
        let step = step.max(1);
        Self {
            ranges: vec![StepRange {
                start: step,
                end: Some(step),
            }],
        }
    }

    pub fn ranges(&self) -> &[StepRange] {
        &self.ranges
    }

    pub fn contains(&self, step: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(step))
    }

    /// Largest step this visibility explicitly mentions.
    pub fn max_step(&self) -> u32 {
        self.ranges
            .iter()
            .map(StepRange::referenced_step)
            .max()
            .unwrap_or(1)
    }

    /// Parse a show specification relative to the slide's current fragment.
    ///
    /// Accepted items are `N`, `N+`, `N-M`, `next`, `next+`, `last` and `last+`,
    /// optionally separated by commas. `next` means one past the current fragment and
    /// `last` means the current fragment. Returns the parsed visibility together with
    /// the updated current fragment.
    pub fn parse(spec: &str, current_fragment: u32) -> Result<(Self, u32)> {
        let mut current = current_fragment.max(1);
        let mut ranges = Vec::new();

        for item in spec.split(',') {
            let item = item.trim();
            if item.is_empty() {
                return Err(spec_error(spec, "empty item"));
            }

            let (body, open) = match item.strip_suffix('+') {
                Some(body) => (body.trim(), true),
                None => (item, false),
            };

            let range = if let Some((from, to)) = body.split_once('-') {
                if open {
                    return Err(spec_error(spec, "a closed range cannot end with '+'"));
                }
                let start = parse_step(spec, from.trim(), current)?;
                let end = parse_step(spec, to.trim(), current)?;
                if end < start {
                    return Err(spec_error(spec, "range end is before its start"));
                }
                StepRange {
                    start,
                    end: Some(end),
                }
            } else {
                let start = parse_step(spec, body, current)?;
                StepRange {
                    start,
                    end: if open { None } else { Some(start) },
                }
            };

            current = current.max(range.referenced_step());
            ranges.push(range);
        }

        Ok((Self { ranges }, current))
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", items.join(","))
    }
}

fn parse_step(spec: &str, token: &str, current: u32) -> Result<u32> {
    match token {
        "next" => current
            .checked_add(1)
            .ok_or_else(|| spec_error(spec, "no step follows the current fragment")),
        "last" => Ok(current),
        _ => {
            let step = token
                .parse::<u32>()
                .map_err(|_| spec_error(spec, &format!("{:?} is not a step", token)))?;
            if step == 0 {
                return Err(spec_error(spec, "steps start at 1"));
            }
            Ok(step)
        }
    }
}

fn spec_error(spec: &str, reason: &str) -> DeckError {
    DeckError::ShowSpecError {
        spec: spec.to_string(),
        reason: reason.to_string(),
    }
}
