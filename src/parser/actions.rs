//! Structured actions the model embeds in its replies.

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::Proposal;

/// Accept `"3"` or `3` for free-text fields the model sometimes emits as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(s) => s,
        Loose::Number(n) => n.to_string(),
    })
}

/// Styling options for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalList {
    /// Options, usually A to E.
    pub proposals: Vec<Proposal>,
    /// Shape analysis that preceded the options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    /// Cover theme, when the model names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// One row of the final summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    /// Product or dish.
    #[serde(default)]
    pub product_name: String,
    /// Chosen styling and plating.
    #[serde(default)]
    pub menu_material: String,
    /// Plates and props.
    #[serde(default)]
    pub equipment: String,
}

/// Final summary of a planning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Cover theme (multi-dish flow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// One row per product or dish.
    #[serde(default)]
    pub table: Vec<SummaryRow>,
    /// Items to buy.
    #[serde(default)]
    pub shopping_list: Vec<String>,
    /// Every plate and prop used.
    #[serde(default)]
    pub equipment_list: Vec<String>,
    /// Short recipe lines (multi-dish flow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes: Option<Vec<String>>,
}

/// One recipe ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient.
    pub name: String,
    /// Quantity as written.
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
}

/// A short recipe card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Dish name.
    pub title: String,
    /// Yield, e.g. "2 servings".
    #[serde(default, deserialize_with = "string_or_number")]
    pub servings: String,
    /// Ingredients in order.
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Method steps in order.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Optional tip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
}

/// Equipment grouping; unknown values fold into `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCategory {
    /// Plates and bowls.
    Plate,
    /// Cutlery and tools.
    Utensil,
    /// Cloths, boards and backdrops.
    Prop,
    /// Garnish and ingredients.
    Food,
    /// Anything else.
    #[default]
    #[serde(other)]
    Other,
}

/// One thing to prepare on set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItem {
    /// What to prepare.
    pub name: String,
    /// How many, as written.
    #[serde(default, deserialize_with = "string_or_number")]
    pub quantity: String,
    /// Grouping.
    #[serde(default)]
    pub category: EquipmentCategory,
    /// Reference picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Size, colour or other notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Course of a candidate dish; unknown values fold into `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishCategory {
    /// Main dish.
    Main,
    /// Side dish.
    Side,
    /// Soup.
    Soup,
    /// Anything else.
    #[default]
    #[serde(other)]
    Other,
}

/// Candidate dish for a cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishOption {
    /// Label used when selecting.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Dish name.
    pub name: String,
    /// Course.
    #[serde(default)]
    pub category: DishCategory,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Why it suits the cover.
    #[serde(default)]
    pub appeal: String,
}

/// A dish the stylist committed to, in cover order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDish {
    /// Position on the cover, from 1.
    pub order: u32,
    /// Label of the chosen option.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Dish name.
    pub name: String,
}

/// Discriminant of [`ParsedAction`], in matcher priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Styling options.
    Proposals,
    /// Final summary.
    Summary,
    /// Product image prompt.
    ImageRequest,
    /// Recipe card.
    Recipe,
    /// Equipment to prepare.
    EquipmentList,
    /// Candidate dishes.
    DishSelection,
    /// Chosen dishes.
    DishesConfirmed,
    /// Cover layout prompt.
    LayoutRequest,
}

impl ActionKind {
    /// Every kind, highest priority first.
    pub const PRIORITY: [Self; 8] = [
        Self::Proposals,
        Self::Summary,
        Self::ImageRequest,
        Self::Recipe,
        Self::EquipmentList,
        Self::DishSelection,
        Self::DishesConfirmed,
        Self::LayoutRequest,
    ];

    /// Value of the `"action"` field, `None` for proposals which carry no tag.
    #[must_use]
    pub const fn action_name(self) -> Option<&'static str> {
        match self {
            Self::Proposals => None,
            Self::Summary => Some("summary"),
            Self::ImageRequest => Some("generate_image"),
            Self::Recipe => Some("recipe"),
            Self::EquipmentList => Some("equipment_list"),
            Self::DishSelection => Some("dish_selection"),
            Self::DishesConfirmed => Some("dishes_confirmed"),
            Self::LayoutRequest => Some("generate_layout"),
        }
    }

    /// Whether a bare (unfenced) object may still be recognised.
    #[must_use]
    pub const fn allows_loose_match(self) -> bool {
        matches!(
            self,
            Self::Proposals | Self::Summary | Self::ImageRequest | Self::Recipe | Self::EquipmentList
        )
    }
}

/// At most one of these is extracted per reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedAction {
    /// Styling options.
    Proposals(ProposalList),
    /// Final summary.
    Summary(Summary),
    /// Prompt for a product image.
    ImageRequest {
        /// Non-empty English prompt.
        prompt: String,
    },
    /// Recipe card.
    Recipe(Recipe),
    /// Equipment to prepare.
    EquipmentList {
        /// Items in the order given.
        items: Vec<EquipmentItem>,
    },
    /// Candidate dishes, optionally with a theme.
    DishSelection {
        /// Options to pick from.
        dishes: Vec<DishOption>,
        /// Cover theme.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        theme: Option<String>,
    },
    /// Dishes in cover order.
    DishesConfirmed {
        /// Chosen dishes.
        dishes: Vec<SelectedDish>,
    },
    /// Prompt for the cover layout image.
    LayoutRequest {
        /// Non-empty English prompt.
        prompt: String,
    },
}

impl ParsedAction {
    /// Discriminant.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Proposals(_) => ActionKind::Proposals,
            Self::Summary(_) => ActionKind::Summary,
            Self::ImageRequest { .. } => ActionKind::ImageRequest,
            Self::Recipe(_) => ActionKind::Recipe,
            Self::EquipmentList { .. } => ActionKind::EquipmentList,
            Self::DishSelection { .. } => ActionKind::DishSelection,
            Self::DishesConfirmed { .. } => ActionKind::DishesConfirmed,
            Self::LayoutRequest { .. } => ActionKind::LayoutRequest,
        }
    }
}

/// Tagged object as written by the model.
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ActionBlock {
    Summary {
        summary: Summary,
    },
    GenerateImage {
        prompt: String,
    },
    Recipe {
        recipe: Recipe,
    },
    EquipmentList {
        #[serde(rename = "equipmentList")]
        equipment_list: Vec<EquipmentItem>,
    },
    DishSelection {
        #[serde(rename = "dishList")]
        dish_list: Vec<DishOption>,
        #[serde(default)]
        theme: Option<String>,
    },
    DishesConfirmed {
        #[serde(rename = "selectedDishes")]
        selected_dishes: Vec<SelectedDish>,
    },
    GenerateLayout {
        prompt: String,
    },
}

impl From<ActionBlock> for ParsedAction {
    fn from(block: ActionBlock) -> Self {
        match block {
            ActionBlock::Summary { summary } => Self::Summary(summary),
            ActionBlock::GenerateImage { prompt } => Self::ImageRequest { prompt },
            ActionBlock::Recipe { recipe } => Self::Recipe(recipe),
            ActionBlock::EquipmentList { equipment_list } => Self::EquipmentList {
                items: equipment_list,
            },
            ActionBlock::DishSelection { dish_list, theme } => Self::DishSelection {
                dishes: dish_list,
                theme: theme.filter(|t| !t.trim().is_empty()),
            },
            ActionBlock::DishesConfirmed { selected_dishes } => Self::DishesConfirmed {
                dishes: selected_dishes,
            },
            ActionBlock::GenerateLayout { prompt } => Self::LayoutRequest { prompt },
        }
    }
}
