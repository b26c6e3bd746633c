use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use workbench_core::reveal::DisplaySurface;
use workbench_core::{
    prepare_outgoing, service_greeting, ChatLog, ContentTree, MessagePipeline, Role, TokenUsage,
    CLEARED_GREETING,
};
use workbench_logging::{bench_error, bench_info, bench_warn};

use crate::backend::{Backend, BackendRequest};
use crate::presenter::{RevealOutcome, TypewriterPresenter};
use crate::wire::{ChatReplyBody, ChatRequest};
use crate::{BackendError, FailureKind, SendError};

/// `chat_<unix millis>_<9 base36 characters>`
pub fn generate_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("chat_{}_{suffix}", chrono::Utc::now().timestamp_millis())
}

/// What a successful [`ChatSession::send`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub usage: Option<TokenUsage>,
    pub outcome: RevealOutcome,
}

/// One conversation with the configured assistant.
pub struct ChatSession<S> {
    backend: Arc<dyn Backend>,
    pipeline: MessagePipeline,
    presenter: TypewriterPresenter<S>,
    log: ChatLog,
    usage: Option<TokenUsage>,
}

impl<S: DisplaySurface> ChatSession<S> {
    pub async fn start(backend: Arc<dyn Backend>, presenter: TypewriterPresenter<S>) -> Self {
        Self::with_session_id(backend, presenter, generate_session_id()).await
    }

    pub async fn with_session_id(
        backend: Arc<dyn Backend>,
        presenter: TypewriterPresenter<S>,
        session_id: String,
    ) -> Self {
        let session = Self {
            backend,
            pipeline: MessagePipeline::new(),
            presenter,
            log: ChatLog::start(session_id),
            usage: None,
        };
        session.show_last_plain().await;
        session
    }

    pub fn session_id(&self) -> &str {
        self.log.session_id()
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    pub fn presenter(&self) -> &TypewriterPresenter<S> {
        &self.presenter
    }

    /// Sends one message and types out the reply. Failures are returned
    /// as-is; nothing is retried. Cancelling while the request is in flight
    /// abandons it with [`SendError::Cancelled`].
    pub async fn send(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, SendError> {
        let text = prepare_outgoing(text)?;
        self.log.append(Role::User, text);
        self.show_last_plain().await;

        let requested = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                bench_info!("chat request cancelled before a reply arrived");
                return Err(SendError::Cancelled);
            }
            requested = self.request_reply(text) => requested,
        };
        let reply = match requested {
            Ok(reply) => reply,
            Err(err) => {
                bench_error!("chat request failed: {err}");
                return Err(err);
            }
        };
        let content = reply.reply.ok_or_else(|| {
            SendError::MissingReply("response has no reply field".to_string())
        })?;

        if let (Some(used), Some(max)) = (reply.tokens_used, reply.max_tokens) {
            let usage = TokenUsage { used, max };
            if usage.is_near_limit() {
                bench_warn!("chat token usage near limit: {usage}");
            }
            self.usage = Some(usage);
        }

        self.log.append(Role::Ai, content.clone());
        let tree = self.pipeline.render(&content);
        let outcome = self.presenter.reveal(&tree, cancel).await;
        Ok(ChatReply {
            content,
            usage: self.usage,
            outcome,
        })
    }

    /// Empties the log and the surface, leaving one greeting.
    pub async fn clear(&mut self) {
        self.log.clear(CLEARED_GREETING);
        self.presenter.clear().await;
        self.show_last_plain().await;
    }

    /// Like [`ChatSession::clear`], announcing the new service and resetting
    /// token usage.
    pub async fn reset_for_service(&mut self, service: &str) {
        bench_info!("chat reset for service {service}");
        self.log.clear(service_greeting(service));
        self.usage = Some(TokenUsage::reset());
        self.presenter.clear().await;
        self.show_last_plain().await;
    }

    pub fn export_transcript(&self) -> String {
        self.log.transcript()
    }

    async fn request_reply(&self, text: &str) -> Result<ChatReplyBody, SendError> {
        let request = ChatRequest {
            message: text,
            session_id: self.log.session_id(),
        };
        let body = serde_json::to_value(request)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let value: Value = self
            .backend
            .send(BackendRequest::post_json("chat/", body))
            .await?
            .into_json()?;
        serde_json::from_value(value)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()).into())
    }

    async fn show_last_plain(&self) {
        if let Some(message) = self.log.last() {
            self.presenter
                .present(&ContentTree::plain(message.content.clone()))
                .await;
        }
    }
}
