//! Remote session store capability: create/read/update/delete of the
//! session record, keyed by session id. Updates are merge patches.

use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::SessionId;
use crate::session::{SessionPatch, SessionRecord};
use crate::DEFAULT_CALL_TIMEOUT_MS;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum SessionOperation {
    Create {
        timeout_ms: u64,
    },
    Read {
        session_id: String,
        timeout_ms: u64,
    },
    Update {
        session_id: String,
        patch: SessionPatch,
        timeout_ms: u64,
    },
    Delete {
        session_id: String,
        timeout_ms: u64,
    },
}

impl Operation for SessionOperation {
    type Output = SessionResult;
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum SessionOutput {
    Created {
        session_id: String,
    },
    /// `None` when the record does not exist (yet).
    Record {
        record: Option<SessionRecord>,
    },
    Updated,
    /// Deleting an absent session also resolves here; delete is idempotent.
    Deleted,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session create failed: {reason}")]
    CreateFailed { reason: String },
    #[error("session read failed: {reason}")]
    ReadFailed { reason: String },
    #[error("session write failed: {reason}")]
    WriteFailed { reason: String },
    #[error("session backend timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

pub type SessionResult = Result<SessionOutput, SessionError>;

/// Typed access to the shell's session backend.
pub struct SessionBackend<Ev> {
    context: CapabilityContext<SessionOperation, Ev>,
}

impl<Ev> crux_core::capability::Capability<Ev> for SessionBackend<Ev> {
    type Operation = SessionOperation;
    type MappedSelf<MappedEv> = SessionBackend<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        SessionBackend::new(self.context.map_event(f))
    }
}

impl<Ev> SessionBackend<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<SessionOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn create<F>(&self, make_event: F)
    where
        F: FnOnce(SessionResult) -> Ev + Send + 'static,
    {
        self.request(
            SessionOperation::Create {
                timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            },
            make_event,
        );
    }

    pub fn read<F>(&self, session_id: &SessionId, make_event: F)
    where
        F: FnOnce(SessionResult) -> Ev + Send + 'static,
    {
        self.request(
            SessionOperation::Read {
                session_id: session_id.as_str().to_owned(),
                timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            },
            make_event,
        );
    }

    pub fn update<F>(&self, session_id: &SessionId, patch: SessionPatch, make_event: F)
    where
        F: FnOnce(SessionResult) -> Ev + Send + 'static,
    {
        self.request(
            SessionOperation::Update {
                session_id: session_id.as_str().to_owned(),
                patch,
                timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            },
            make_event,
        );
    }

    pub fn delete<F>(&self, session_id: &SessionId, make_event: F)
    where
        F: FnOnce(SessionResult) -> Ev + Send + 'static,
    {
        self.request(
            SessionOperation::Delete {
                session_id: session_id.as_str().to_owned(),
                timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            },
            make_event,
        );
    }

    fn request<F>(&self, operation: SessionOperation, make_event: F)
    where
        F: FnOnce(SessionResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
