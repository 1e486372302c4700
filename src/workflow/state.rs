//! UI-visible state of one session and the inputs that change it.

use serde::{Deserialize, Serialize};

use crate::core::{Product, Proposal};
use crate::parser::{DishOption, EquipmentItem, ParsedAction, Recipe, SelectedDish, Summary};

/// Where the session stands, as the UI shows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing on screen but the chat.
    #[default]
    WaitingForInput,
    /// Styling options are listed.
    ProposalsShown,
    /// One option is selected and awaits confirmation.
    AwaitingProposalConfirmation,
    /// The stylist is typing a change to the selected option.
    ModificationRequested,
    /// A product image is rendering.
    ImagePending,
    /// The rendered image awaits approval.
    ImageShown,
    /// The equipment list is shown.
    EquipmentShown,
    /// The summary is shown.
    Completed,
    /// Candidate dishes are listed.
    DishOptionsShown,
    /// Working through the chosen dishes.
    DishesConfirmed,
    /// The cover layout is rendering.
    LayoutImagePending,
    /// The cover layout awaits approval.
    LayoutShown,
}

/// Rendered image of one cover dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishImage {
    /// Cover position.
    pub order: u32,
    /// Dish name.
    pub name: String,
    /// Data URL.
    pub image_url: String,
}

/// Everything the chat page renders besides the message list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    /// Current phase.
    pub phase: Phase,
    /// Options from the last proposals reply.
    pub proposals: Vec<Proposal>,
    /// Shape analysis that came with them.
    pub analysis: Option<String>,
    /// Option picked for confirmation.
    pub selected_proposal: Option<Proposal>,
    /// Final summary.
    pub summary: Option<Summary>,
    /// Recipes received so far.
    pub recipes: Vec<Recipe>,
    /// Prompt captured from the last image request, consumed by one render.
    pub pending_image_prompt: Option<String>,
    /// Latest product image, as a data URL.
    pub last_generated_image: Option<String>,
    /// Equipment to prepare.
    pub equipment_list: Vec<EquipmentItem>,
    /// Candidate cover dishes.
    pub dish_options: Vec<DishOption>,
    /// Chosen cover dishes.
    pub selected_dishes: Vec<SelectedDish>,
    /// Progress through `selected_dishes`, 0-based.
    pub current_dish_index: usize,
    /// Rendered dish images.
    pub dish_images: Vec<DishImage>,
    /// Rendered cover layout, as a data URL.
    pub layout_image: Option<String>,
    /// Render as soon as the next image request arrives.
    pub auto_generate_after_prompt: bool,
}

impl UiState {
    /// Whether an explicit image render is possible.
    #[must_use]
    pub const fn can_generate_image(&self) -> bool {
        self.pending_image_prompt.is_some()
    }

    /// Dish currently being worked on, multi-dish flow only.
    #[must_use]
    pub fn current_dish(&self) -> Option<&SelectedDish> {
        self.selected_dishes.get(self.current_dish_index)
    }
}

/// Part of the image a revision targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionAspect {
    /// Plate or bowl.
    Plate,
    /// Arrangement on the plate.
    Arrangement,
    /// Props around the plate.
    Props,
    /// Colour tone.
    Color,
    /// Anything else.
    Other,
}

impl RevisionAspect {
    /// Wording used in the revision message.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plate => "plate",
            Self::Arrangement => "arrangement",
            Self::Props => "props",
            Self::Color => "colour",
            Self::Other => "other details",
        }
    }
}

/// Something the stylist did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiCommand {
    /// Free text, optionally with an uploaded photo.
    SubmitMessage {
        /// Text typed by the stylist.
        content: String,
        /// Uploaded JPEG as base64.
        #[serde(default, alias = "imageBase64")]
        image_base64: Option<String>,
    },
    /// Open the confirmation prompt for one proposal.
    SelectProposal {
        /// Proposal label, e.g. `"A"`.
        #[serde(alias = "proposalId")]
        proposal_id: String,
    },
    /// Ask to tweak the selected proposal before confirming.
    RequestModification,
    /// Accept the selected proposal as is.
    ConfirmProposal,
    /// Render the pending image prompt.
    GenerateImage,
    /// Approve the rendered image.
    ConfirmImage,
    /// Ask for a change to the rendered image.
    RequestRevision {
        /// What to change.
        aspect: RevisionAspect,
        /// Free-text details.
        #[serde(default)]
        details: Option<String>,
    },
    /// Pick cover dishes by id.
    SelectDishes {
        /// Dish ids in cover order.
        #[serde(alias = "dishIds")]
        dish_ids: Vec<String>,
    },
    /// Current dish is done.
    NextDish,
    /// Approve the cover layout.
    ConfirmLayout,
}

/// Input to [`super::reduce`]: a command or the result of an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Stylist input.
    Command(UiCommand),
    /// Model answered a chat turn.
    ReplyReceived {
        /// Unmodified reply.
        raw: String,
        /// Reply with the action block removed.
        display: String,
        /// Extracted action.
        action: Option<ParsedAction>,
    },
    /// Product image rendered, as a data URL.
    ImageGenerated(String),
    /// Product image could not be rendered.
    ImageFailed,
    /// Cover layout rendered, as a data URL.
    LayoutGenerated(String),
    /// Cover layout could not be rendered.
    LayoutFailed,
}

/// Work the driver performs after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a user message, persist, and ask the model for a reply.
    SendUserMessage {
        /// Message text.
        content: String,
        /// Uploaded JPEG as base64.
        image_base64: Option<String>,
    },
    /// Render a product image.
    GenerateImage(String),
    /// Render the cover layout.
    GenerateLayout(String),
    /// Append and persist an assistant message.
    AppendAssistant {
        /// Message text.
        content: String,
        /// Generated image data URL.
        generated_image: Option<String>,
    },
    /// Change the session title and optionally its theme.
    RenameSession {
        /// New title.
        title: String,
        /// New theme.
        theme: Option<String>,
    },
    /// Add a product to the session.
    RecordProduct(Product),
    /// Attach a rendered image to the latest product without one.
    AttachProductImage(String),
}

impl Effect {
    pub(crate) fn assistant(content: impl Into<String>) -> Self {
        Self::AppendAssistant {
            content: content.into(),
            generated_image: None,
        }
    }
}

/// New state plus the effects it calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub state: UiState,
    /// Effects to run, in order.
    pub effects: Vec<Effect>,
}
