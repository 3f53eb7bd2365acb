//! Startup reconciliation between stored state and multiplexer reality.
//!
//! Execution ids stop being meaningful when the front end that minted them
//! exits. [`StateReconciler::startup`] re-stamps live sessions with a fresh
//! id and catches agents that died while nobody was watching.

use std::sync::Arc;

use corral_core::{AgentState, ExecutionId};
use corral_mux::Multiplexer;
use corral_store::SessionStore;
use tracing::{debug, info, instrument};

use crate::errors::Result;
use crate::events::AgentEvent;

/// Reconciles stored session state against live multiplexer sessions.
pub struct StateReconciler {
    store: Arc<SessionStore>,
    mux: Arc<dyn Multiplexer>,
}

impl StateReconciler {
    /// Create a reconciler over the given store and multiplexer.
    pub fn new(store: Arc<SessionStore>, mux: Arc<dyn Multiplexer>) -> Self {
        Self { store, mux }
    }

    /// Run startup reconciliation and return the fresh execution id.
    ///
    /// Generates a new id, then for every top-level session whose
    /// multiplexer session is currently running: stamps the new id without
    /// disturbing lifecycle state, probes for a live agent process, and
    /// forces `exited` when the agent is gone regardless of what was last
    /// recorded. Sessions without a running multiplexer session are left
    /// untouched. The returned id is what the caller injects into the
    /// environment of sessions it spawns afterwards.
    #[instrument(skip(self))]
    pub async fn startup(&self) -> Result<ExecutionId> {
        let execution_id = ExecutionId::new();
        let sessions = self.store.list(true)?;

        let mut stamped = 0usize;
        let mut forced = 0usize;
        for session in &sessions {
            if !self.mux.exists(&session.name).await? {
                continue;
            }
            self.store
                .update_execution_id(&session.name, execution_id.as_str())?;
            stamped += 1;

            if !self.mux.agent_running(&session.name).await? {
                debug!(session = %session.name, "agent process gone, forcing exited");
                self.store
                    .update_state(&session.name, AgentState::Exited, execution_id.as_str())?;
                forced += 1;
            }
        }

        info!(
            execution_id = %execution_id,
            total = sessions.len(),
            stamped,
            forced,
            "startup reconciliation complete"
        );
        Ok(execution_id)
    }

    /// Apply a hook event to a session.
    ///
    /// Events are idempotent state assignments, so replays and out-of-order
    /// delivery are harmless.
    pub fn apply_event(
        &self,
        session: &str,
        event: AgentEvent,
        execution_id: &ExecutionId,
    ) -> Result<()> {
        debug!(session, event = %event, "applying hook event");
        self.store
            .update_state(session, event.target_state(), execution_id.as_str())?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use corral_core::Session;
    use corral_mux::FakeMultiplexer;
    use crate::errors::HookError;

    fn setup(mux: FakeMultiplexer) -> StateReconciler {
        let store = Arc::new(SessionStore::open_in_memory().unwrap());
        StateReconciler::new(store, Arc::new(mux))
    }

    fn store(reconciler: &StateReconciler) -> &SessionStore {
        &reconciler.store
    }

    fn working(name: &str) -> Session {
        let mut session = Session::new(name);
        session.state = AgentState::Working;
        session.execution_id = "exec-old".to_string();
        session
    }

    // ── startup ──

    #[tokio::test]
    async fn startup_stamps_running_sessions_with_fresh_id() {
        let mux = FakeMultiplexer::new();
        mux.seed("alpha");
        let reconciler = setup(mux);
        store(&reconciler).add(&working("alpha")).unwrap();

        let id = reconciler.startup().await.unwrap();

        let alpha = store(&reconciler).get("alpha").unwrap();
        assert!(!id.is_unknown());
        assert_eq!(alpha.execution_id, id.as_str());
        assert_eq!(alpha.state, AgentState::Working);
    }

    #[tokio::test]
    async fn startup_leaves_dead_multiplexer_sessions_untouched() {
        let reconciler = setup(FakeMultiplexer::new());
        store(&reconciler).add(&working("alpha")).unwrap();

        reconciler.startup().await.unwrap();

        let alpha = store(&reconciler).get("alpha").unwrap();
        assert_eq!(alpha.execution_id, "exec-old");
        assert_eq!(alpha.state, AgentState::Working);
    }

    #[tokio::test]
    async fn startup_forces_exited_when_agent_is_gone() {
        let mux = FakeMultiplexer::new();
        mux.seed("alpha");
        mux.set_agent_running("alpha", false);
        let reconciler = setup(mux);
        store(&reconciler).add(&working("alpha")).unwrap();

        let id = reconciler.startup().await.unwrap();

        let alpha = store(&reconciler).get("alpha").unwrap();
        assert_eq!(alpha.state, AgentState::Exited);
        assert_eq!(alpha.execution_id, id.as_str());
    }

    #[tokio::test]
    async fn startup_covers_archived_sessions() {
        let mux = FakeMultiplexer::new();
        mux.seed("alpha");
        let reconciler = setup(mux);
        store(&reconciler).add(&working("alpha")).unwrap();
        store(&reconciler).toggle_archive("alpha").unwrap();

        let id = reconciler.startup().await.unwrap();

        let alpha = store(&reconciler).get("alpha").unwrap();
        assert_eq!(alpha.execution_id, id.as_str());
    }

    #[tokio::test]
    async fn startup_returns_a_distinct_id_each_run() {
        let reconciler = setup(FakeMultiplexer::new());
        let first = reconciler.startup().await.unwrap();
        let second = reconciler.startup().await.unwrap();
        assert_ne!(first, second);
    }

    // ── apply_event ──

    #[tokio::test]
    async fn apply_event_assigns_target_state_and_id() {
        let reconciler = setup(FakeMultiplexer::new());
        store(&reconciler).add(&working("alpha")).unwrap();
        let id = ExecutionId::from("exec-new");

        reconciler
            .apply_event("alpha", AgentEvent::NeedsInput, &id)
            .unwrap();

        let alpha = store(&reconciler).get("alpha").unwrap();
        assert_eq!(alpha.state, AgentState::Waiting);
        assert_eq!(alpha.execution_id, "exec-new");
    }

    #[tokio::test]
    async fn apply_event_is_idempotent() {
        let reconciler = setup(FakeMultiplexer::new());
        store(&reconciler).add(&working("alpha")).unwrap();
        let id = ExecutionId::from("exec-new");

        reconciler
            .apply_event("alpha", AgentEvent::Finished, &id)
            .unwrap();
        reconciler
            .apply_event("alpha", AgentEvent::Finished, &id)
            .unwrap();

        assert_eq!(store(&reconciler).get("alpha").unwrap().state, AgentState::Idle);
    }

    #[tokio::test]
    async fn apply_event_to_missing_session_fails() {
        let reconciler = setup(FakeMultiplexer::new());
        let id = ExecutionId::unknown();

        let err = reconciler
            .apply_event("ghost", AgentEvent::Finished, &id)
            .unwrap_err();
        assert_matches!(
            err,
            HookError::Store(corral_store::SessionStoreError::SessionNotFound(_))
        );
    }
}
