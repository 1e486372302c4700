//! Extraction of structured actions from model replies.
//!
//! Matchers run in [`ActionKind::PRIORITY`] order against the full reply and
//! the first one that yields a valid action wins. A matcher first looks for
//! a fenced JSON block carrying its discriminator; only when no such block
//! exists do the single-product matchers scan the bare text. A located block
//! that fails to parse or validate abandons that matcher without falling
//! back, and the failure is only logged.

pub mod actions;
mod matchers;

use regex::Regex;
use tracing::{debug, warn};

pub use actions::{
    ActionKind, DishCategory, DishOption, EquipmentCategory, EquipmentItem, Ingredient, ParsedAction,
    ProposalList, Recipe, SelectedDish, Summary, SummaryRow,
};

use matchers::{Matcher, fenced_blocks};

/// Three backticks, optional `json` tag, body starting with `{`, closing fence.
pub(crate) const FENCED_BLOCK_PATTERN: &str = r"(?s)```(?:json)?[ \t]*\r?\n?(\{.*?)\s*```";

/// Text to show plus the action extracted from it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Reply with the matched block removed and trimmed; the untouched reply
    /// when nothing matched.
    pub display: String,
    /// Extracted action.
    pub action: Option<ParsedAction>,
}

impl ParseOutcome {
    fn unchanged(reply: &str) -> Self {
        Self {
            display: reply.to_string(),
            action: None,
        }
    }
}

/// Ordered set of action matchers.
pub struct ResponseParser {
    fence: Regex,
    matchers: Vec<Matcher>,
}

impl ResponseParser {
    /// Compile the fence pattern and one matcher per action kind.
    ///
    /// # Errors
    /// Returns an error if any regex pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        let matchers = ActionKind::PRIORITY
            .into_iter()
            .map(Matcher::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            fence: Regex::new(FENCED_BLOCK_PATTERN)?,
            matchers,
        })
    }

    /// Extract at most one action from `reply`.
    #[must_use]
    pub fn parse(&self, reply: &str) -> ParseOutcome {
        let blocks = fenced_blocks(&self.fence, reply);

        for matcher in &self.matchers {
            let (span, value) = if let Some(block) = matcher.find_fenced(&blocks) {
                match serde_json::from_str::<serde_json::Value>(block.body) {
                    Ok(value) => (block.span.clone(), value),
                    Err(err) => {
                        warn!(kind = ?matcher.kind, error = %err, "fenced action block is not valid JSON");
                        continue;
                    }
                }
            } else if let Some(found) = matcher.find_loose(reply) {
                found
            } else {
                continue;
            };

            match matcher.build(value) {
                Ok(action) => {
                    debug!(kind = ?matcher.kind, "action extracted");
                    return ParseOutcome {
                        display: excise(reply, span),
                        action: Some(action),
                    };
                }
                Err(err) => {
                    debug!(kind = ?matcher.kind, error = %err, "action rejected, trying next matcher");
                }
            }
        }

        ParseOutcome::unchanged(reply)
    }
}

fn excise(text: &str, span: std::ops::Range<usize>) -> String {
    let mut rest = String::with_capacity(text.len() - span.len());
    rest.push_str(&text[..span.start]);
    rest.push_str(&text[span.end..]);
    rest.trim().to_string()
}
