//! Fixed texts the reconciler sends or shows.

/// Shown with a freshly rendered product image.
pub const IMAGE_READY: &str = "Here is the finished image!";
/// Shown when a product image could not be rendered.
pub const IMAGE_FAILED: &str = "Image generation failed. Please try again.";
/// Shown with a freshly rendered cover layout.
pub const LAYOUT_READY: &str = "The cover layout image is ready!";
/// Shown when the cover layout could not be rendered.
pub const LAYOUT_FAILED: &str = "Layout image generation failed. Please try again.";
/// Shown when a message could not be persisted.
pub const SAVE_FAILED: &str = "Your message could not be saved. Please try again.";

/// Sent when the stylist approves the rendered image.
pub const IMAGE_CONFIRM: &str = "OK, that's final. Please give me the equipment list.";
/// Sent to move to the next dish of the cover.
pub const NEXT_DISH: &str = "OK, please move on to the next dish.";
/// Sent after the last dish.
pub const FINAL_LAYOUT: &str = "OK, please generate the final layout.";
/// Sent when the stylist approves the cover layout.
pub const LAYOUT_CONFIRM: &str = "This layout is OK. Please give me the summary.";

const ERROR_PREFIX: &str = "An error occurred";

/// User message confirming a proposal as is.
#[must_use]
pub fn confirm_proposal(id: &str, title: &str) -> String {
    format!("Let's go with option {id} ({title}). It's fine as it is.")
}

/// User message picking dishes by id.
#[must_use]
pub fn select_dishes(ids: &[String]) -> String {
    format!("I'll choose {}", ids.join(", "))
}

/// User message asking to change one aspect of the image.
#[must_use]
pub fn revision(aspect_label: &str, details: Option<&str>) -> String {
    match details.map(str::trim).filter(|d| !d.is_empty()) {
        Some(details) => format!("Please change the {aspect_label}: {details}"),
        None => format!("Please change the {aspect_label}."),
    }
}

/// Assistant message for a failed chat call.
#[must_use]
pub fn chat_error(raw: &str) -> String {
    if raw.starts_with(ERROR_PREFIX) {
        raw.to_string()
    } else {
        format!("{ERROR_PREFIX}: {raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_proposal_embeds_id_and_title() {
        assert_eq!(
            confirm_proposal("B", "Nordic"),
            "Let's go with option B (Nordic). It's fine as it is."
        );
    }

    #[test]
    fn test_revision_with_and_without_details() {
        assert_eq!(revision("plate", Some("a darker one")), "Please change the plate: a darker one");
        assert_eq!(revision("colour", Some("  ")), "Please change the colour.");
    }

    #[test]
    fn test_chat_error_prefix_not_doubled() {
        assert_eq!(chat_error("An error occurred: boom"), "An error occurred: boom");
        assert_eq!(chat_error("busy"), "An error occurred: busy");
    }
}
