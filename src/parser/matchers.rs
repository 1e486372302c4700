//! One matcher per [`ActionKind`]: where to look and how to build the action.

use std::ops::Range;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::actions::{ActionBlock, ActionKind, ParsedAction};

/// Why a located object did not become an action.
#[derive(Debug, Error)]
pub(crate) enum BuildError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {expected:?}, found {found:?}")]
    WrongKind {
        expected: ActionKind,
        found: ActionKind,
    },
    #[error("empty prompt")]
    EmptyPrompt,
}

/// A fenced ```` ```json ```` block whose body starts with `{`.
#[derive(Debug, Clone)]
pub(crate) struct FencedBlock<'t> {
    /// Byte range of the whole block, fences included.
    pub span: Range<usize>,
    pub body: &'t str,
}

/// Locate every fenced object block in `text`, in order.
pub(crate) fn fenced_blocks<'t>(fence: &Regex, text: &'t str) -> Vec<FencedBlock<'t>> {
    fence
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            Some(FencedBlock {
                span: whole.range(),
                body: body.as_str(),
            })
        })
        .collect()
}

pub(crate) struct Matcher {
    pub kind: ActionKind,
    discriminator: Regex,
}

impl Matcher {
    pub fn new(kind: ActionKind) -> Result<Self, regex::Error> {
        let pattern = match kind.action_name() {
            None => r#""proposals""#.to_string(),
            Some(name) => format!(r#""action"\s*:\s*"{}""#, regex::escape(name)),
        };
        Ok(Self {
            kind,
            discriminator: Regex::new(&pattern)?,
        })
    }

    /// First fenced block carrying this matcher's discriminator.
    pub fn find_fenced<'b, 't>(&self, blocks: &'b [FencedBlock<'t>]) -> Option<&'b FencedBlock<'t>> {
        blocks.iter().find(|b| self.discriminator.is_match(b.body))
    }

    /// Smallest-start JSON object in bare text that encloses the discriminator.
    ///
    /// Returns the object's byte range and its parsed value.
    pub fn find_loose(&self, text: &str) -> Option<(Range<usize>, Value)> {
        if !self.kind.allows_loose_match() {
            return None;
        }
        let key = self.discriminator.find(text)?;
        text[..key.start()]
            .match_indices('{')
            .find_map(|(start, _)| {
                let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
                match stream.next() {
                    Some(Ok(value)) if value.is_object() => {
                        let end = start + stream.byte_offset();
                        (end >= key.end()).then_some((start..end, value))
                    }
                    _ => None,
                }
            })
    }

    /// Validate `value` and turn it into this matcher's action.
    pub fn build(&self, value: Value) -> Result<ParsedAction, BuildError> {
        let action = match self.kind {
            ActionKind::Proposals => ParsedAction::Proposals(serde_json::from_value(value)?),
            _ => ParsedAction::from(serde_json::from_value::<ActionBlock>(value)?),
        };
        if action.kind() != self.kind {
            return Err(BuildError::WrongKind {
                expected: self.kind,
                found: action.kind(),
            });
        }
        match &action {
            ParsedAction::ImageRequest { prompt } | ParsedAction::LayoutRequest { prompt }
                if prompt.trim().is_empty() =>
            {
                Err(BuildError::EmptyPrompt)
            }
            _ => Ok(action),
        }
    }
}
