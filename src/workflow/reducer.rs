//! Pure transition function of the reconciler.
//!
//! `reduce` never performs I/O. Chat turns, image renders and persistence are
//! returned as [`Effect`]s and their results come back as [`UiEvent`]s.

use tracing::debug;

use crate::core::{Product, WorkMode};
use crate::parser::ParsedAction;

use super::errors::{WorkflowError, WorkflowResult};
use super::state::{DishImage, Effect, Phase, Transition, UiCommand, UiEvent, UiState};
use super::templates;

fn invalid(state: &UiState, reason: &'static str) -> WorkflowError {
    WorkflowError::InvalidCommand {
        phase: state.phase,
        reason,
    }
}

const fn awaits_decision(phase: Phase) -> bool {
    matches!(phase, Phase::AwaitingProposalConfirmation | Phase::ModificationRequested)
}

fn send(content: impl Into<String>) -> Effect {
    Effect::SendUserMessage {
        content: content.into(),
        image_base64: None,
    }
}

/// Apply `event` to `state`.
///
/// # Errors
/// Returns [`WorkflowError::InvalidCommand`] when a command's precondition
/// does not hold; `state` is then left as it was.
pub fn reduce(state: &UiState, mode: WorkMode, event: UiEvent) -> WorkflowResult<Transition> {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        UiEvent::Command(command) => on_command(&mut next, mode, command, &mut effects)?,
        UiEvent::ReplyReceived {
            raw,
            display,
            action,
        } => {
            let content = if display.trim().is_empty() { raw } else { display };
            effects.push(Effect::assistant(content));
            if let Some(action) = action {
                on_action(&mut next, mode, action, &mut effects);
            }
        }
        UiEvent::ImageGenerated(data_url) => {
            next.pending_image_prompt = None;
            next.phase = Phase::ImageShown;
            next.last_generated_image = Some(data_url.clone());
            match mode {
                WorkMode::Ohisama => effects.push(Effect::AttachProductImage(data_url.clone())),
                WorkMode::CoopLetter => {
                    if let Some(dish) = next.current_dish() {
                        let image = DishImage {
                            order: dish.order,
                            name: dish.name.clone(),
                            image_url: data_url.clone(),
                        };
                        next.dish_images.push(image);
                    }
                }
            }
            effects.push(Effect::AppendAssistant {
                content: templates::IMAGE_READY.to_string(),
                generated_image: Some(data_url),
            });
        }
        UiEvent::ImageFailed => {
            next.pending_image_prompt = None;
            next.phase = Phase::WaitingForInput;
            effects.push(Effect::assistant(templates::IMAGE_FAILED));
        }
        UiEvent::LayoutGenerated(data_url) => {
            next.phase = Phase::LayoutShown;
            next.layout_image = Some(data_url.clone());
            effects.push(Effect::AppendAssistant {
                content: templates::LAYOUT_READY.to_string(),
                generated_image: Some(data_url),
            });
        }
        UiEvent::LayoutFailed => {
            next.phase = Phase::DishesConfirmed;
            effects.push(Effect::assistant(templates::LAYOUT_FAILED));
        }
    }

    debug!(from = ?state.phase, to = ?next.phase, effects = effects.len(), "ui transition");
    Ok(Transition {
        state: next,
        effects,
    })
}

fn on_command(
    next: &mut UiState,
    mode: WorkMode,
    command: UiCommand,
    effects: &mut Vec<Effect>,
) -> WorkflowResult<()> {
    match command {
        UiCommand::SubmitMessage {
            content,
            image_base64,
        } => {
            if content.trim().is_empty() && image_base64.is_none() {
                return Err(invalid(next, "empty message"));
            }
            if next.phase == Phase::ModificationRequested {
                next.phase = Phase::WaitingForInput;
            }
            effects.push(Effect::SendUserMessage {
                content,
                image_base64,
            });
        }
        UiCommand::SelectProposal { proposal_id } => {
            let proposal = next
                .proposals
                .iter()
                .find(|p| p.id == proposal_id)
                .cloned()
                .ok_or_else(|| invalid(next, "unknown proposal"))?;
            next.selected_proposal = Some(proposal);
            next.phase = Phase::AwaitingProposalConfirmation;
            next.auto_generate_after_prompt = false;
        }
        UiCommand::RequestModification => {
            if !awaits_decision(next.phase) {
                return Err(invalid(next, "no proposal awaiting a decision"));
            }
            if next.selected_proposal.is_none() {
                return Err(invalid(next, "no proposal selected"));
            }
            next.phase = Phase::ModificationRequested;
        }
        UiCommand::ConfirmProposal => {
            if !awaits_decision(next.phase) {
                return Err(invalid(next, "no proposal awaiting a decision"));
            }
            let proposal = next
                .selected_proposal
                .take()
                .ok_or_else(|| invalid(next, "no proposal selected"))?;
            next.auto_generate_after_prompt = true;
            next.phase = Phase::WaitingForInput;
            if mode == WorkMode::Ohisama {
                effects.push(Effect::RenameSession {
                    title: proposal.title.clone(),
                    theme: None,
                });
            }
            let message = templates::confirm_proposal(&proposal.id, &proposal.title);
            let mut product = Product::from_proposal(proposal);
            if let Some(analysis) = &next.analysis {
                product.shape.clone_from(analysis);
            }
            effects.push(Effect::RecordProduct(product));
            effects.push(send(message));
        }
        UiCommand::GenerateImage => {
            let prompt = next
                .pending_image_prompt
                .clone()
                .ok_or_else(|| invalid(next, "no pending image prompt"))?;
            next.auto_generate_after_prompt = false;
            next.phase = Phase::ImagePending;
            effects.push(Effect::GenerateImage(prompt));
        }
        UiCommand::ConfirmImage => {
            if next.phase != Phase::ImageShown {
                return Err(invalid(next, "no image to confirm"));
            }
            next.phase = Phase::WaitingForInput;
            effects.push(send(templates::IMAGE_CONFIRM));
        }
        UiCommand::RequestRevision { aspect, details } => {
            if next.phase != Phase::ImageShown {
                return Err(invalid(next, "no image to revise"));
            }
            next.phase = Phase::WaitingForInput;
            effects.push(send(templates::revision(aspect.label(), details.as_deref())));
        }
        UiCommand::SelectDishes { dish_ids } => {
            if next.phase != Phase::DishOptionsShown {
                return Err(invalid(next, "no dish options shown"));
            }
            if dish_ids.is_empty() {
                return Err(invalid(next, "no dishes selected"));
            }
            effects.push(send(templates::select_dishes(&dish_ids)));
        }
        UiCommand::NextDish => {
            if !matches!(next.phase, Phase::DishesConfirmed | Phase::ImageShown) {
                return Err(invalid(next, "no dish in progress"));
            }
            if next.selected_dishes.is_empty() {
                return Err(invalid(next, "no dishes confirmed"));
            }
            if next.current_dish_index + 1 < next.selected_dishes.len() {
                next.current_dish_index += 1;
                next.phase = Phase::DishesConfirmed;
                effects.push(send(templates::NEXT_DISH));
            } else {
                effects.push(send(templates::FINAL_LAYOUT));
            }
        }
        UiCommand::ConfirmLayout => {
            if next.layout_image.is_none() {
                return Err(invalid(next, "no layout to confirm"));
            }
            next.phase = Phase::WaitingForInput;
            effects.push(send(templates::LAYOUT_CONFIRM));
        }
    }
    Ok(())
}

fn on_action(next: &mut UiState, mode: WorkMode, action: ParsedAction, effects: &mut Vec<Effect>) {
    match action {
        ParsedAction::Proposals(list) => {
            next.proposals = list.proposals;
            next.analysis = list.analysis;
            next.selected_proposal = None;
            next.phase = Phase::ProposalsShown;
            if mode == WorkMode::CoopLetter {
                if let Some(theme) = list.theme.filter(|t| !t.trim().is_empty()) {
                    effects.push(Effect::RenameSession {
                        title: theme.clone(),
                        theme: Some(theme),
                    });
                }
            }
        }
        ParsedAction::Summary(summary) => {
            next.summary = Some(summary);
            next.phase = Phase::Completed;
        }
        ParsedAction::ImageRequest { prompt } => {
            next.pending_image_prompt = Some(prompt.clone());
            if next.auto_generate_after_prompt {
                next.auto_generate_after_prompt = false;
                next.phase = Phase::ImagePending;
                effects.push(Effect::GenerateImage(prompt));
            }
        }
        ParsedAction::Recipe(recipe) => next.recipes.push(recipe),
        ParsedAction::EquipmentList { items } => {
            next.equipment_list = items;
            next.phase = Phase::EquipmentShown;
        }
        ParsedAction::DishSelection { dishes, theme } => {
            next.dish_options = dishes;
            next.phase = Phase::DishOptionsShown;
            if let Some(theme) = theme {
                effects.push(Effect::RenameSession {
                    title: theme.clone(),
                    theme: Some(theme),
                });
            }
        }
        ParsedAction::DishesConfirmed { dishes } => {
            next.selected_dishes = dishes;
            next.current_dish_index = 0;
            next.dish_options.clear();
            next.dish_images.clear();
            next.phase = Phase::DishesConfirmed;
        }
        ParsedAction::LayoutRequest { prompt } => {
            next.phase = Phase::LayoutImagePending;
            effects.push(Effect::GenerateLayout(prompt));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Proposal;
    use crate::parser::{ProposalList, SelectedDish};

    fn proposal(id: &str, title: &str) -> Proposal {
        Proposal {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            menu_material: String::new(),
            equipment: String::new(),
        }
    }

    fn step(state: &UiState, mode: WorkMode, event: UiEvent) -> Transition {
        reduce(state, mode, event).unwrap()
    }

    fn command(cmd: UiCommand) -> UiEvent {
        UiEvent::Command(cmd)
    }

    fn reply(display: &str, action: Option<ParsedAction>) -> UiEvent {
        UiEvent::ReplyReceived {
            raw: format!("raw:{display}"),
            display: display.to_string(),
            action,
        }
    }

    fn with_proposals() -> UiState {
        step(
            &UiState::default(),
            WorkMode::Ohisama,
            reply(
                "Here are five ideas",
                Some(ParsedAction::Proposals(ProposalList {
                    proposals: vec![proposal("A", "Rustic"), proposal("B", "Nordic")],
                    analysis: Some("fillet".into()),
                    theme: None,
                })),
            ),
        )
        .state
    }

    #[test]
    fn test_select_proposal_sends_nothing() {
        let t = step(
            &with_proposals(),
            WorkMode::Ohisama,
            command(UiCommand::SelectProposal {
                proposal_id: "B".into(),
            }),
        );
        assert!(t.effects.is_empty());
        assert_eq!(t.state.phase, Phase::AwaitingProposalConfirmation);
        assert_eq!(t.state.selected_proposal.unwrap().title, "Nordic");
    }

    #[test]
    fn test_confirm_proposal_renames_records_and_sends() {
        let selected = step(
            &with_proposals(),
            WorkMode::Ohisama,
            command(UiCommand::SelectProposal {
                proposal_id: "A".into(),
            }),
        )
        .state;
        let t = step(&selected, WorkMode::Ohisama, command(UiCommand::ConfirmProposal));
        assert!(t.state.auto_generate_after_prompt);
        assert_eq!(
            t.effects[0],
            Effect::RenameSession {
                title: "Rustic".into(),
                theme: None
            }
        );
        assert!(matches!(&t.effects[1], Effect::RecordProduct(p) if p.name == "Rustic"));
        assert_eq!(
            t.effects[2],
            Effect::SendUserMessage {
                content: "Let's go with option A (Rustic). It's fine as it is.".into(),
                image_base64: None
            }
        );
    }

    fn selected(id: &str) -> UiState {
        step(
            &with_proposals(),
            WorkMode::Ohisama,
            command(UiCommand::SelectProposal { proposal_id: id.into() }),
        )
        .state
    }

    fn assert_rejected(state: &UiState, mode: WorkMode, cmd: UiCommand) {
        let err = reduce(state, mode, command(cmd)).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCommand { .. }), "{err}");
    }

    #[test]
    fn test_confirm_clears_selection_and_cannot_repeat() {
        let confirmed = step(&selected("A"), WorkMode::Ohisama, command(UiCommand::ConfirmProposal)).state;
        assert!(confirmed.selected_proposal.is_none());
        assert_rejected(&confirmed, WorkMode::Ohisama, UiCommand::ConfirmProposal);
    }

    #[test]
    fn test_confirm_rejected_outside_decision_phases() {
        for phase in [Phase::ImageShown, Phase::EquipmentShown, Phase::WaitingForInput] {
            let state = UiState {
                phase,
                ..selected("A")
            };
            assert_rejected(&state, WorkMode::Ohisama, UiCommand::ConfirmProposal);
            assert_rejected(&state, WorkMode::Ohisama, UiCommand::RequestModification);
        }
    }

    #[test]
    fn test_confirm_allowed_after_modification_request() {
        let modifying = step(&selected("B"), WorkMode::Ohisama, command(UiCommand::RequestModification)).state;
        assert_eq!(modifying.phase, Phase::ModificationRequested);
        let t = step(&modifying, WorkMode::Ohisama, command(UiCommand::ConfirmProposal));
        assert!(matches!(&t.effects[1], Effect::RecordProduct(p) if p.name == "Nordic"));
    }

    #[test]
    fn test_select_dishes_requires_dish_options() {
        let cmd = || UiCommand::SelectDishes {
            dish_ids: vec!["1".into()],
        };
        assert_rejected(&UiState::default(), WorkMode::CoopLetter, cmd());

        let shown = UiState {
            phase: Phase::DishOptionsShown,
            ..UiState::default()
        };
        let t = step(&shown, WorkMode::CoopLetter, command(cmd()));
        assert_eq!(t.effects, vec![send(templates::select_dishes(&["1".to_string()]))]);
    }

    #[test]
    fn test_next_dish_requires_dish_in_progress() {
        let state = UiState {
            phase: Phase::LayoutShown,
            selected_dishes: vec![SelectedDish {
                order: 1,
                id: "1".into(),
                name: "Dish 1".into(),
            }],
            ..UiState::default()
        };
        assert_rejected(&state, WorkMode::CoopLetter, UiCommand::NextDish);
    }

    #[test]
    fn test_confirm_without_selection_is_rejected() {
        let err = reduce(&with_proposals(), WorkMode::Ohisama, command(UiCommand::ConfirmProposal)).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCommand { .. }));
    }

    #[test]
    fn test_pending_prompt_is_set_once_then_cleared() {
        let mut state = with_proposals();
        state.selected_proposal = Some(proposal("A", "Rustic"));
        state = step(&state, WorkMode::Ohisama, command(UiCommand::ConfirmProposal)).state;

        let t = step(
            &state,
            WorkMode::Ohisama,
            reply(
                "Great choice!",
                Some(ParsedAction::ImageRequest {
                    prompt: "salmon on slate".into(),
                }),
            ),
        );
        assert_eq!(t.state.pending_image_prompt.as_deref(), Some("salmon on slate"));
        assert!(!t.state.auto_generate_after_prompt);
        assert_eq!(t.state.phase, Phase::ImagePending);
        assert_eq!(t.effects[0], Effect::assistant("Great choice!"));
        assert_eq!(t.effects[1], Effect::GenerateImage("salmon on slate".into()));

        let done = step(&t.state, WorkMode::Ohisama, UiEvent::ImageGenerated("data:image/png;base64,QUJD".into()));
        assert!(done.state.pending_image_prompt.is_none());
        assert_eq!(done.state.phase, Phase::ImageShown);
        assert_eq!(done.effects[0], Effect::AttachProductImage("data:image/png;base64,QUJD".into()));
    }

    #[test]
    fn test_image_request_without_auto_flag_waits_for_command() {
        let t = step(
            &UiState::default(),
            WorkMode::Ohisama,
            reply("", Some(ParsedAction::ImageRequest { prompt: "p".into() })),
        );
        assert_eq!(t.effects, vec![Effect::assistant("raw:")]);
        assert!(t.state.can_generate_image());

        let g = step(&t.state, WorkMode::Ohisama, command(UiCommand::GenerateImage));
        assert_eq!(g.effects, vec![Effect::GenerateImage("p".into())]);
    }

    #[test]
    fn test_generate_image_requires_pending_prompt() {
        let err = reduce(&UiState::default(), WorkMode::Ohisama, command(UiCommand::GenerateImage)).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidCommand {
                reason: "no pending image prompt",
                ..
            }
        ));
    }

    #[test]
    fn test_image_failure_clears_prompt_and_reports() {
        let state = UiState {
            pending_image_prompt: Some("p".into()),
            phase: Phase::ImagePending,
            ..UiState::default()
        };
        let t = step(&state, WorkMode::Ohisama, UiEvent::ImageFailed);
        assert!(t.state.pending_image_prompt.is_none());
        assert_eq!(t.effects, vec![Effect::assistant(templates::IMAGE_FAILED)]);
        assert!(reduce(&t.state, WorkMode::Ohisama, command(UiCommand::GenerateImage)).is_err());
    }

    #[test]
    fn test_revision_message() {
        let state = UiState {
            phase: Phase::ImageShown,
            ..UiState::default()
        };
        let t = step(
            &state,
            WorkMode::Ohisama,
            command(UiCommand::RequestRevision {
                aspect: crate::workflow::RevisionAspect::Plate,
                details: Some("use a black plate".into()),
            }),
        );
        assert_eq!(
            t.effects,
            vec![send("Please change the plate: use a black plate")]
        );
    }

    #[test]
    fn test_dish_flow_progress_and_layout() {
        let dishes: Vec<SelectedDish> = (1..=3)
            .map(|i| SelectedDish {
                order: i,
                id: i.to_string(),
                name: format!("Dish {i}"),
            })
            .collect();
        let mut state = step(
            &UiState::default(),
            WorkMode::CoopLetter,
            reply("Let's begin", Some(ParsedAction::DishesConfirmed { dishes })),
        )
        .state;
        assert_eq!(state.phase, Phase::DishesConfirmed);

        state = step(&state, WorkMode::CoopLetter, UiEvent::ImageGenerated("img1".into())).state;
        assert_eq!(state.dish_images[0].name, "Dish 1");

        state = step(&state, WorkMode::CoopLetter, command(UiCommand::NextDish)).state;
        state = step(&state, WorkMode::CoopLetter, command(UiCommand::NextDish)).state;
        assert_eq!(state.current_dish_index, 2);

        let last = step(&state, WorkMode::CoopLetter, command(UiCommand::NextDish));
        assert_eq!(last.state.current_dish_index, 2);
        assert_eq!(last.effects, vec![send(templates::FINAL_LAYOUT)]);

        let layout = step(
            &last.state,
            WorkMode::CoopLetter,
            reply("", Some(ParsedAction::LayoutRequest { prompt: "cover".into() })),
        );
        assert_eq!(layout.state.phase, Phase::LayoutImagePending);
        assert_eq!(layout.effects[1], Effect::GenerateLayout("cover".into()));
    }

    #[test]
    fn test_dish_selection_theme_renames_session() {
        let t = step(
            &UiState::default(),
            WorkMode::CoopLetter,
            reply(
                "Options",
                Some(ParsedAction::DishSelection {
                    dishes: vec![],
                    theme: Some("Autumn harvest".into()),
                }),
            ),
        );
        assert_eq!(
            t.effects[1],
            Effect::RenameSession {
                title: "Autumn harvest".into(),
                theme: Some("Autumn harvest".into())
            }
        );
    }

    #[test]
    fn test_summary_completes() {
        let summary = serde_json::from_value(serde_json::json!({"table": []})).unwrap();
        let t = step(
            &UiState::default(),
            WorkMode::Ohisama,
            reply("All done", Some(ParsedAction::Summary(summary))),
        );
        assert_eq!(t.state.phase, Phase::Completed);
    }
}
