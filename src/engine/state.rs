//! Run state and session lifecycle
//!
//! One `RunState` is exclusively owned by one test run. It holds the
//! variable store, the live external sessions opened by actions, and the
//! designation of the current session. Every session the run opens must be
//! released exactly once when the run ends, whatever the outcome.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::engine::variables::VariableStore;

/// Opaque handle identifying a live session within one run
pub type SessionHandle = u32;

/// External session collaborator (e.g. a browser session)
///
/// Sessions are created by actions and owned by the run state until the run
/// releases them.
#[async_trait]
pub trait Session: Send + Sync {
    /// Capture a screenshot of the session's current state
    ///
    /// Returns `None` when the session has nothing to capture.
    async fn screenshot(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    /// Release the session's external resources
    async fn close(&mut self) -> Result<()>;
}

/// Mutable context shared across all steps of one test run
pub struct RunState {
    /// Name of the test being run, used for artifact naming
    pub test_name: String,
    /// Live variables of the run
    pub variables: VariableStore,
    sessions: HashMap<SessionHandle, Box<dyn Session>>,
    current: Option<SessionHandle>,
    next_handle: SessionHandle,
}

impl RunState {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            variables: VariableStore::new(),
            sessions: HashMap::new(),
            current: None,
            next_handle: 1,
        }
    }

    /// Register a session opened by an action; it becomes the current one
    pub fn register_session(&mut self, session: Box<dyn Session>) -> SessionHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.sessions.insert(handle, session);
        self.current = Some(handle);
        handle
    }

    /// Designate a previously registered session as current
    pub fn set_current_session(&mut self, handle: SessionHandle) -> Result<()> {
        if !self.sessions.contains_key(&handle) {
            return Err(Error::SessionNotFound(handle));
        }
        self.current = Some(handle);
        Ok(())
    }

    /// The current session, if any is open
    pub fn current_session(&mut self) -> Option<&mut dyn Session> {
        let handle = self.current?;
        match self.sessions.get_mut(&handle) {
            Some(session) => Some(&mut **session),
            None => None,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Close and drop every live session
    ///
    /// Runs at the end of a test run regardless of outcome. A close failure
    /// is logged and never changes the reported run result.
    pub async fn release_sessions(&mut self) {
        self.current = None;
        for (handle, mut session) in self.sessions.drain() {
            if let Err(e) = session.close().await {
                tracing::warn!(session = handle, error = %e, "Failed to close session");
            } else {
                tracing::debug!(session = handle, "Session closed");
            }
        }
    }
}

// A panic unwinding out of a step must not leak live sessions. The run
// normally drains them in `release_sessions`; whatever is left here is
// closed best-effort on a spawned task.
impl Drop for RunState {
    fn drop(&mut self) {
        if self.sessions.is_empty() {
            return;
        }
        let sessions: Vec<_> = self.sessions.drain().collect();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                for (handle, mut session) in sessions {
                    if let Err(e) = session.close().await {
                        tracing::warn!(session = handle, error = %e, "Failed to close session");
                    }
                }
            });
        }
    }
}
