//! Chat session: the conversation context held against the chat service, and the guarded
//! slot that creates it on first use.

use std::sync::Arc;

use super::transport::{ChatTransport, ChatTurn, FragmentStream, Role, TransportFactory};
use crate::error::GridResult;

/// Conversation context plus the transport it talks through.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    context: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>, system_instruction: &str) -> Self {
        Self {
            transport,
            context: vec![ChatTurn::new(Role::System, system_instruction)],
        }
    }

    /// Open a reply stream for `message` against the context so far.
    pub async fn open_stream(&self, message: &str) -> GridResult<FragmentStream> {
        self.transport.open_stream(&self.context, message).await
    }

    /// Remember a completed exchange so later sends carry the conversation.
    pub fn record_exchange(&mut self, message: &str, reply: &str) {
        self.context.push(ChatTurn::new(Role::User, message));
        self.context.push(ChatTurn::new(Role::Assistant, reply));
    }

    pub fn context(&self) -> &[ChatTurn] {
        &self.context
    }
}

/// Holds at most one [`ChatSession`], created lazily by the factory.
pub struct SessionSlot {
    factory: TransportFactory,
    system_instruction: String,
    session: Option<ChatSession>,
}

impl SessionSlot {
    pub fn new(factory: TransportFactory, system_instruction: impl Into<String>) -> Self {
        Self {
            factory,
            system_instruction: system_instruction.into(),
            session: None,
        }
    }

    /// Return the existing session or build one. A failed build leaves the slot empty; the
    /// next call tries again.
    pub fn get_or_try_init(&mut self) -> GridResult<&mut ChatSession> {
        let session = match self.session.take() {
            Some(existing) => existing,
            None => {
                let transport = (self.factory)()?;
                tracing::info!("chat session created");
                ChatSession::new(transport, &self.system_instruction)
            }
        };
        Ok(self.session.insert(session))
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }
}
