//! Session, message, product and proposal records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::{MessageId, ProductId, SessionId};

/// Which planning workflow a session runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    /// Single-product styling for the newsletter: propose, pick, render, list equipment.
    #[default]
    Ohisama,
    /// Multi-dish cover planning: pick three dishes, render each, then lay out the cover.
    CoopLetter,
}

impl WorkMode {
    /// Stable storage/wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ohisama => "ohisama",
            Self::CoopLetter => "coop_letter",
        }
    }

    /// Human label used in default session titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ohisama => "Ohisama Newsletter",
            Self::CoopLetter => "Co-op Letter",
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a work mode string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown work mode: {0}")]
pub struct UnknownWorkMode(pub String);

impl FromStr for WorkMode {
    type Err = UnknownWorkMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ohisama" => Ok(Self::Ohisama),
            "coop_letter" => Ok(Self::CoopLetter),
            other => Err(UnknownWorkMode(other.to_string())),
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The stylist.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One chat message. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Display text.
    pub content: String,
    /// Image the user uploaded with this message (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Image generated for this message (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A user-authored message, optionally carrying an uploaded image.
    #[must_use]
    pub fn user(content: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            image_url,
            generated_image_url: None,
            timestamp: Utc::now(),
        }
    }

    /// An assistant-authored message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: content.into(),
            image_url: None,
            generated_image_url: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a generated image.
    #[must_use]
    pub fn with_generated_image(mut self, url: impl Into<String>) -> Self {
        self.generated_image_url = Some(url.into());
        self
    }
}

/// A styling option offered by the model ("A" to "E").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Short label, usually a letter.
    pub id: String,
    /// Proposal title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Menu and ingredient notes.
    #[serde(default, rename = "menuMaterial", alias = "menu_material")]
    pub menu_material: String,
    /// Plates and props.
    #[serde(default)]
    pub equipment: String,
}

/// A physical item styled within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Source photo (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Shape descriptor ("fillet", "whole", "liquid", ...).
    #[serde(default)]
    pub shape: String,
    /// Proposal the stylist confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_proposal: Option<Proposal>,
    /// Rendered preview (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
    /// Recipe notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
}

impl Product {
    /// Fold a confirmed proposal into a product record.
    #[must_use]
    pub fn from_proposal(proposal: Proposal) -> Self {
        Self {
            id: ProductId::new(),
            name: proposal.title.clone(),
            image_url: None,
            shape: String::new(),
            selected_proposal: Some(proposal),
            generated_image_url: None,
            recipe: None,
        }
    }
}

/// One planning session: the persisted chat transcript and its products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session id.
    pub id: SessionId,
    /// Display title.
    pub title: String,
    /// Workflow variant.
    pub mode: WorkMode,
    /// Cover theme chosen in the multi-dish flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Transcript in insertion order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Products confirmed so far.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Whether the stylist closed this plan.
    #[serde(default)]
    pub is_completed: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session. Falls back to [`Session::default_title`] when `title` is `None`.
    #[must_use]
    pub fn new(mode: WorkMode, title: Option<String>) -> Self {
        let now = Utc::now();
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Self::default_title(mode, now));
        Self {
            id: SessionId::new(),
            title,
            mode,
            theme: None,
            messages: Vec::new(),
            products: Vec::new(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// `"<mode label> <YYYY-MM-DD>"`.
    #[must_use]
    pub fn default_title(mode: WorkMode, now: DateTime<Utc>) -> String {
        format!("{} {}", mode.label(), now.format("%Y-%m-%d"))
    }

    /// Append a message and bump `updated_at`.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Append a product and bump `updated_at`.
    pub fn push_product(&mut self, product: Product) {
        self.products.push(product);
        self.touch();
    }

    /// Attach a generated image to the most recent product that has none yet.
    ///
    /// Returns `false` when every product already has an image.
    pub fn attach_generated_image(&mut self, url: &str) -> bool {
        let Some(product) = self
            .products
            .iter_mut()
            .rev()
            .find(|p| p.generated_image_url.is_none())
        else {
            return false;
        };
        product.generated_image_url = Some(url.to_string());
        self.touch();
        true
    }

    /// Change the display title.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Flag the plan as finished.
    pub fn mark_completed(&mut self) {
        self.is_completed = true;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
