//! Effect driver: runs the reducer's effects against the transport and store.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chat::{ChatTransport, ImageOutcome};
use crate::core::image::{GENERATED_MIME, UPLOAD_MIME, payload_of, to_data_url};
use crate::core::{Message, Session};
use crate::llm::ChatTurn;
use crate::parser::ResponseParser;
use crate::storage::SessionStore;

use super::errors::{WorkflowError, WorkflowResult};
use super::reducer::reduce;
use super::state::{Effect, UiCommand, UiEvent, UiState};
use super::templates;

/// Which render an image call is for.
#[derive(Clone, Copy)]
enum RenderTarget {
    Product,
    Layout,
}

/// Chat history as sent to the model.
#[must_use]
pub fn history(session: &Session) -> Vec<ChatTurn> {
    session
        .messages
        .iter()
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content.clone(),
            image_base64: m.image_url.as_deref().and_then(payload_of).map(str::to_string),
        })
        .collect()
}

/// Drives one session through commands, one effect at a time.
#[derive(Clone)]
pub struct Conversation {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn SessionStore>,
    parser: Arc<ResponseParser>,
}

impl Conversation {
    /// Create a driver.
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn SessionStore>,
        parser: Arc<ResponseParser>,
    ) -> Self {
        Self {
            transport,
            store,
            parser,
        }
    }

    /// Apply a stylist command and run every effect it leads to.
    ///
    /// Chat and image failures are reported inside the conversation and do
    /// not fail the call.
    ///
    /// # Errors
    /// [`WorkflowError::InvalidCommand`] when the command does not fit the
    /// state (nothing is changed), or [`WorkflowError::Store`] when a message
    /// could not be persisted.
    pub async fn handle(&self, session: &mut Session, ui: &mut UiState, command: UiCommand) -> WorkflowResult<()> {
        let mut queue = VecDeque::new();
        apply(session, ui, UiEvent::Command(command), &mut queue)?;

        while let Some(effect) = queue.pop_front() {
            if let Some(event) = self.run(session, effect).await? {
                apply(session, ui, event, &mut queue)?;
            }
        }
        Ok(())
    }

    async fn run(&self, session: &mut Session, effect: Effect) -> WorkflowResult<Option<UiEvent>> {
        match effect {
            Effect::SendUserMessage {
                content,
                image_base64,
            } => {
                let image_url = image_base64.as_deref().map(|b64| to_data_url(UPLOAD_MIME, b64));
                self.append(session, Message::user(content, image_url)).await?;
                self.request_reply(session).await
            }
            Effect::GenerateImage(prompt) => Ok(Some(self.render(&prompt, RenderTarget::Product).await)),
            Effect::GenerateLayout(prompt) => Ok(Some(self.render(&prompt, RenderTarget::Layout).await)),
            Effect::AppendAssistant {
                content,
                generated_image,
            } => {
                let mut message = Message::assistant(content);
                if let Some(url) = generated_image {
                    message = message.with_generated_image(url);
                }
                self.append(session, message).await?;
                Ok(None)
            }
            Effect::RenameSession { title, theme } => {
                info!(session = %session.id, title = %title, "renaming session");
                session.rename(title);
                if theme.is_some() {
                    session.theme = theme;
                }
                self.save_logged(session).await;
                Ok(None)
            }
            Effect::RecordProduct(product) => {
                session.push_product(product);
                self.save_logged(session).await;
                Ok(None)
            }
            Effect::AttachProductImage(url) => {
                if session.attach_generated_image(&url) {
                    self.save_logged(session).await;
                }
                Ok(None)
            }
        }
    }

    async fn request_reply(&self, session: &mut Session) -> WorkflowResult<Option<UiEvent>> {
        let turns = history(session);
        match self.transport.reply(session.mode, &turns).await {
            Ok(raw) => {
                let outcome = self.parser.parse(&raw);
                Ok(Some(UiEvent::ReplyReceived {
                    raw,
                    display: outcome.display,
                    action: outcome.action,
                }))
            }
            Err(err) => {
                warn!(session = %session.id, error = %err, "chat turn failed");
                let text = templates::chat_error(&err.to_string());
                self.append(session, Message::assistant(text)).await?;
                Ok(None)
            }
        }
    }

    async fn render(&self, prompt: &str, target: RenderTarget) -> UiEvent {
        let outcome = match self.transport.generate_image(prompt).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "image request failed");
                ImageOutcome::failed()
            }
        };
        match (outcome, target) {
            (ImageOutcome::Generated(b64), RenderTarget::Product) => {
                UiEvent::ImageGenerated(to_data_url(GENERATED_MIME, &b64))
            }
            (ImageOutcome::Generated(b64), RenderTarget::Layout) => {
                UiEvent::LayoutGenerated(to_data_url(GENERATED_MIME, &b64))
            }
            (ImageOutcome::Failed(_), RenderTarget::Product) => UiEvent::ImageFailed,
            (ImageOutcome::Failed(_), RenderTarget::Layout) => UiEvent::LayoutFailed,
        }
    }

    /// Append and persist; on failure the stylist sees a generic error in chat.
    async fn append(&self, session: &mut Session, message: Message) -> WorkflowResult<()> {
        session.push_message(message);
        if let Err(err) = self.store.upsert(session).await {
            error!(session = %session.id, error = %err, "failed to persist message");
            session.push_message(Message::assistant(templates::SAVE_FAILED));
            return Err(WorkflowError::Store(err));
        }
        Ok(())
    }

    async fn save_logged(&self, session: &Session) {
        if let Err(err) = self.store.upsert(session).await {
            error!(session = %session.id, error = %err, "failed to save session");
        }
    }
}

fn apply(session: &Session, ui: &mut UiState, event: UiEvent, queue: &mut VecDeque<Effect>) -> WorkflowResult<()> {
    let transition = reduce(ui, session.mode, event)?;
    *ui = transition.state;
    queue.extend(transition.effects);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatError, ChatFuture, ChatResult};
    use crate::core::{Proposal, Role, SessionId, WorkMode};
    use crate::storage::{InMemorySessionStore, StoreError, StoreFuture, StoreResult};
    use crate::workflow::Phase;
    use std::sync::Mutex;

    struct ScriptedTransport {
        replies: Mutex<VecDeque<ChatResult<String>>>,
        images: Mutex<VecDeque<ImageOutcome>>,
        image_prompts: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<ChatResult<String>>, images: Vec<ImageOutcome>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                images: Mutex::new(images.into()),
                image_prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl ChatTransport for ScriptedTransport {
        fn reply<'a>(&'a self, _mode: WorkMode, _turns: &'a [ChatTurn]) -> ChatFuture<'a, ChatResult<String>> {
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()));
            Box::pin(async move { next })
        }

        fn generate_image<'a>(&'a self, prompt: &'a str) -> ChatFuture<'a, ChatResult<ImageOutcome>> {
            self.image_prompts.lock().unwrap().push(prompt.to_string());
            let next = self.images.lock().unwrap().pop_front().unwrap_or_else(ImageOutcome::failed);
            Box::pin(async move { Ok(next) })
        }
    }

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn list(&self) -> StoreFuture<'_, StoreResult<Vec<Session>>> {
            Box::pin(async { Ok(Vec::new()) })
        }
        fn get(&self, _id: SessionId) -> StoreFuture<'_, StoreResult<Option<Session>>> {
            Box::pin(async { Ok(None) })
        }
        fn upsert(&self, _session: &Session) -> StoreFuture<'_, StoreResult<()>> {
            Box::pin(async { Err(StoreError::InvalidRecord("disk full".into())) })
        }
        fn delete(&self, _id: SessionId) -> StoreFuture<'_, StoreResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn conversation(transport: Arc<ScriptedTransport>, store: Arc<dyn SessionStore>) -> Conversation {
        Conversation::new(transport, store, Arc::new(ResponseParser::new().unwrap()))
    }

    fn ui_with_proposal() -> UiState {
        UiState {
            phase: Phase::ProposalsShown,
            proposals: vec![Proposal {
                id: "A".into(),
                title: "Rustic".into(),
                description: "oak board".into(),
                menu_material: "grilled salmon".into(),
                equipment: "oak board".into(),
            }],
            ..UiState::default()
        }
    }

    const IMAGE_REPLY: &str =
        "Great choice!\n```json\n{\"action\": \"generate_image\", \"prompt\": \"salmon on slate\"}\n```";
    const EQUIPMENT_REPLY: &str = "```json\n{\"action\": \"equipment_list\", \"equipmentList\": [{\"name\": \"slate\", \"quantity\": \"1\", \"category\": \"plate\"}]}\n```\nAnything else?";

    #[tokio::test]
    async fn test_confirm_generate_confirm_round_trip() {
        let transport = ScriptedTransport::new(
            vec![Ok(IMAGE_REPLY.into()), Ok(EQUIPMENT_REPLY.into())],
            vec![ImageOutcome::Generated("QUJD".into())],
        );
        let store = Arc::new(InMemorySessionStore::new());
        let convo = conversation(Arc::clone(&transport), store.clone());
        let mut session = Session::new(WorkMode::Ohisama, None);
        let mut ui = ui_with_proposal();

        convo
            .handle(&mut session, &mut ui, UiCommand::SelectProposal { proposal_id: "A".into() })
            .await
            .unwrap();
        assert!(session.messages.is_empty());

        convo.handle(&mut session, &mut ui, UiCommand::ConfirmProposal).await.unwrap();
        assert!(ui.pending_image_prompt.is_none());
        assert_eq!(ui.phase, Phase::ImageShown);

        convo.handle(&mut session, &mut ui, UiCommand::ConfirmImage).await.unwrap();

        let roles_and_text: Vec<(Role, &str)> = session
            .messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            roles_and_text,
            vec![
                (Role::User, "Let's go with option A (Rustic). It's fine as it is."),
                (Role::Assistant, "Great choice!"),
                (Role::Assistant, templates::IMAGE_READY),
                (Role::User, templates::IMAGE_CONFIRM),
                (Role::Assistant, "Anything else?"),
            ]
        );
        assert_eq!(
            session.messages[2].generated_image_url.as_deref(),
            Some("data:image/png;base64,QUJD")
        );
        assert_eq!(*transport.image_prompts.lock().unwrap(), vec!["salmon on slate".to_string()]);
        assert!(ui.pending_image_prompt.is_none());
        assert_eq!(ui.phase, Phase::EquipmentShown);
        assert_eq!(ui.equipment_list[0].name, "slate");

        assert_eq!(session.title, "Rustic");
        assert_eq!(
            session.products[0].generated_image_url.as_deref(),
            Some("data:image/png;base64,QUJD")
        );
        let stored = store.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 5);
        assert_eq!(stored.products.len(), 1);
    }

    #[tokio::test]
    async fn test_image_failure_appends_message_and_clears_prompt() {
        let transport = ScriptedTransport::new(vec![Ok(IMAGE_REPLY.into())], vec![ImageOutcome::failed()]);
        let convo = conversation(transport, Arc::new(InMemorySessionStore::new()));
        let mut session = Session::new(WorkMode::Ohisama, None);
        let mut ui = ui_with_proposal();
        ui.selected_proposal = Some(ui.proposals[0].clone());
        ui.phase = Phase::AwaitingProposalConfirmation;

        convo.handle(&mut session, &mut ui, UiCommand::ConfirmProposal).await.unwrap();

        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[2].content, templates::IMAGE_FAILED);
        assert!(ui.pending_image_prompt.is_none());
        let err = convo
            .handle(&mut session, &mut ui, UiCommand::GenerateImage)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCommand { .. }));
    }

    #[tokio::test]
    async fn test_chat_failure_is_shown_in_conversation() {
        let transport = ScriptedTransport::new(vec![Err(ChatError::RateLimited)], vec![]);
        let convo = conversation(transport, Arc::new(InMemorySessionStore::new()));
        let mut session = Session::new(WorkMode::Ohisama, None);
        let mut ui = UiState::default();

        convo
            .handle(
                &mut session,
                &mut ui,
                UiCommand::SubmitMessage {
                    content: "hello".into(),
                    image_base64: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(session.messages.len(), 2);
        assert!(session.messages[1].content.starts_with("An error occurred: "));
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates_with_chat_notice() {
        let transport = ScriptedTransport::new(vec![], vec![]);
        let convo = conversation(transport, Arc::new(BrokenStore));
        let mut session = Session::new(WorkMode::Ohisama, None);
        let mut ui = UiState::default();

        let err = convo
            .handle(
                &mut session,
                &mut ui,
                UiCommand::SubmitMessage {
                    content: "hello".into(),
                    image_base64: Some("QUJD".into()),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Store(_)));
        assert_eq!(session.messages.len(), 2);
        assert_eq!(
            session.messages[0].image_url.as_deref(),
            Some("data:image/jpeg;base64,QUJD")
        );
        assert_eq!(session.messages[1].content, templates::SAVE_FAILED);
    }

    #[tokio::test]
    async fn test_layout_request_renders_immediately() {
        let transport = ScriptedTransport::new(
            vec![Ok("```json\n{\"action\": \"generate_layout\", \"prompt\": \"cover\"}\n```".into())],
            vec![ImageOutcome::Generated("TEFZ".into())],
        );
        let convo = conversation(Arc::clone(&transport), Arc::new(InMemorySessionStore::new()));
        let mut session = Session::new(WorkMode::CoopLetter, None);
        let mut ui = UiState::default();

        convo
            .handle(
                &mut session,
                &mut ui,
                UiCommand::SubmitMessage {
                    content: "final layout please".into(),
                    image_base64: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(ui.phase, Phase::LayoutShown);
        assert_eq!(ui.layout_image.as_deref(), Some("data:image/png;base64,TEFZ"));
        let last = session.messages.last().unwrap();
        assert_eq!(last.content, templates::LAYOUT_READY);
        assert!(last.generated_image_url.is_some());
    }

    #[test]
    fn test_history_carries_uploaded_image_payload() {
        let mut session = Session::new(WorkMode::Ohisama, None);
        session.push_message(Message::user("photo", Some("data:image/jpeg;base64,QUJD".into())));
        session.push_message(Message::assistant("nice"));
        let turns = history(&session);
        assert_eq!(turns[0].image_base64.as_deref(), Some("QUJD"));
        assert_eq!(turns[1].role, Role::Assistant);
        assert!(turns[1].image_base64.is_none());
    }
}
