//! The turn orchestrator.
//!
//! [`Orchestrator::process_turn`] is the single entry point for a user
//! message. It admits the run (one per session, capped globally),
//! applies input guardrails, resolves the owning agent, drives the
//! specialist loop, honors at most one handoff, applies output
//! guardrails to the assembled answer, and commits the session only on
//! success. A provider failure leaves the session with the user's
//! message and nothing else from the failed turn.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use relay_core::agents::{AgentDescriptor, HandoffRecord};
use relay_core::events::{BaseEvent, RelayEvent};
use relay_core::ids::{AgentId, RunId, SessionId};
use relay_core::messages::Message;
use relay_guardrails::{Direction, GuardrailPipeline, GuardrailView};
use relay_llm::Provider;
use relay_settings::RuntimeSettings;
use relay_tools::ToolRegistry;
use relay_tools::customer::CustomerProfile;

use crate::agents::AgentRegistry;
use crate::errors::RuntimeError;
use crate::event_emitter::{EventEmitter, SessionEvents};
use crate::router::Router;
use crate::session::store::SessionHandle;
use crate::session::{Session, SessionStore};
use crate::specialist::{
    COULD_NOT_COMPLETE, SpecialistLimits, SpecialistOutcome, run_specialist,
};
use crate::tool_executor::duration_ceil_ms;

/// What the caller gets back from one completed turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnResponse {
    /// The final answer shown to the customer.
    pub text: String,
    /// The agent that owns the session after this turn.
    pub agent_id: AgentId,
    /// Whether a guardrail replaced the answer.
    pub blocked: bool,
    /// Whether the specialist was stopped before finishing.
    pub interrupted: bool,
    /// The ownership transfer that happened this turn, if any.
    pub handoff: Option<HandoffRecord>,
}

/// Book-keeping for one in-flight run.
struct ActiveRun {
    run_id: RunId,
    cancel: CancellationToken,
    _permit: OwnedSemaphorePermit,
}

/// The turn engine. One instance serves every session.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    guardrails: Arc<GuardrailPipeline>,
    agents: Arc<AgentRegistry>,
    router: Router,
    sessions: SessionStore,
    emitter: EventEmitter,
    active_runs: DashMap<SessionId, ActiveRun>,
    run_slots: Arc<Semaphore>,
    settings: RuntimeSettings,
}

impl Orchestrator {
    /// Wire up an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        guardrails: Arc<GuardrailPipeline>,
        agents: Arc<AgentRegistry>,
        settings: RuntimeSettings,
    ) -> Self {
        let router = Router::new(agents.clone());
        let run_slots = Arc::new(Semaphore::new(settings.max_concurrent_runs));
        Self {
            provider,
            tools,
            guardrails,
            agents,
            router,
            sessions: SessionStore::new(),
            emitter: EventEmitter::new(),
            active_runs: DashMap::new(),
            run_slots,
            settings,
        }
    }

    /// Subscribe to the runtime event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.emitter.subscribe()
    }

    /// Subscribe to the events of a single session, for a surface
    /// rendering one conversation.
    #[must_use]
    pub fn subscribe_session(&self, session_id: &SessionId) -> SessionEvents {
        self.emitter.subscribe_session(session_id)
    }

    /// The session store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Fetch or create the session for a customer.
    pub fn open_session(&self, id: &SessionId, customer: &CustomerProfile) -> SessionHandle {
        self.sessions.get_or_create(id, customer)
    }

    /// Cancel the in-flight run on a session, if any.
    ///
    /// Returns whether a run was actually signalled.
    pub fn abort(&self, session_id: &SessionId) -> bool {
        match self.active_runs.get(session_id) {
            Some(run) => {
                debug!(%session_id, run_id = %run.run_id, "aborting in-flight run");
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Process one user message as one turn.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn process_turn(
        &self,
        session_id: &SessionId,
        customer: &CustomerProfile,
        user_message: &str,
    ) -> Result<TurnResponse, RuntimeError> {
        let cancel = self.begin_run(session_id)?;
        let result = self
            .run_turn(session_id, customer, user_message, &cancel)
            .await;
        let _ = self.active_runs.remove(session_id);
        result
    }

    /// Admit a run: one per session, capped globally.
    fn begin_run(&self, session_id: &SessionId) -> Result<CancellationToken, RuntimeError> {
        if self.active_runs.contains_key(session_id) {
            return Err(RuntimeError::SessionBusy {
                session_id: session_id.to_string(),
            });
        }
        let Ok(permit) = self.run_slots.clone().try_acquire_owned() else {
            return Err(RuntimeError::ServerBusy {
                active: self.active_runs.len(),
                max: self.settings.max_concurrent_runs,
            });
        };
        let run_id = RunId::new();
        debug!(%run_id, "run admitted");
        let cancel = CancellationToken::new();
        let _ = self.active_runs.insert(
            session_id.clone(),
            ActiveRun {
                run_id,
                cancel: cancel.clone(),
                _permit: permit,
            },
        );
        Ok(cancel)
    }

    async fn run_turn(
        &self,
        session_id: &SessionId,
        customer: &CustomerProfile,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnResponse, RuntimeError> {
        let handle = self.sessions.get_or_create(session_id, customer);
        let mut session = handle.lock().await;
        let started = Instant::now();

        let _ = self.emitter.emit(RelayEvent::TurnStart {
            base: BaseEvent::now(session_id.clone()),
            agent_id: session.active_agent().cloned(),
        });

        let user_msg = Message::user(user_message);

        // Input guardrails run before anything touches the session.
        let verdict = {
            let view = GuardrailView {
                session_id,
                messages: session.messages(),
                scratch: session.scratch(),
            };
            self.guardrails
                .evaluate(Direction::Input, user_message, &view)
                .await
        };
        if verdict.blocked {
            let guardrail_id = verdict.guardrail_id.unwrap_or_default();
            warn!(guardrail_id, "input blocked");
            let _ = self.emitter.emit(RelayEvent::GuardrailBlocked {
                base: BaseEvent::now(session_id.clone()),
                direction: Direction::Input.to_string(),
                guardrail_id,
                info: verdict.info,
            });
            let text = self.settings.blocked_input_message.clone();
            session.push_message(user_msg);
            session.push_message(Message::assistant(text.clone()));
            let agent_id = self.owner_or_default(session.active_agent());
            self.emit_turn_end(session_id, &agent_id, started);
            return Ok(TurnResponse {
                text,
                agent_id,
                blocked: true,
                interrupted: false,
                handoff: None,
            });
        }

        // The turn works on a copy; nothing is visible to other turns
        // (or survives a failure) until the commit below.
        let mut working = session.clone();
        working.push_message(user_msg.clone());

        let agent = self.resolve_owner(&working, user_message).await;
        working.set_active_agent(Some(agent.id.clone()));

        let limits = SpecialistLimits {
            max_turns: self.settings.max_turns,
            tool_timeout_ms: self.settings.tool_timeout_ms,
        };

        let outcome = match run_specialist(
            &agent,
            &mut working,
            &self.provider,
            &self.tools,
            &self.emitter,
            cancel,
            &limits,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                // Keep the user's message, drop everything else from the
                // failed turn.
                session.push_message(user_msg);
                self.emit_turn_failed(session_id, &error);
                return Err(error);
            }
        };

        let mut handoff: Option<HandoffRecord> = None;
        let mut interrupted = false;
        let mut agent_id = agent.id.clone();

        let text = match outcome {
            SpecialistOutcome::FinalAnswer { text } => text,
            SpecialistOutcome::Interrupted { partial_text } => {
                interrupted = true;
                fallback_text(partial_text)
            }
            SpecialistOutcome::HandoffRequested {
                capability,
                reason,
                partial_text,
            } => {
                let target = self.resolve_handoff(&agent, &capability);
                let record = HandoffRecord {
                    from_agent: Some(agent.id.clone()),
                    to_agent: target.id.clone(),
                    reason,
                };
                let _ = self.emitter.emit(RelayEvent::Handoff {
                    base: BaseEvent::now(session_id.clone()),
                    record: record.clone(),
                });
                if !partial_text.is_empty() {
                    working.push_message(Message::assistant(partial_text));
                }
                working.set_active_agent(Some(target.id.clone()));
                agent_id = target.id.clone();
                handoff = Some(record);

                match run_specialist(
                    &target,
                    &mut working,
                    &self.provider,
                    &self.tools,
                    &self.emitter,
                    cancel,
                    &limits,
                )
                .await
                {
                    Ok(SpecialistOutcome::FinalAnswer { text }) => text,
                    Ok(SpecialistOutcome::Interrupted { partial_text }) => {
                        interrupted = true;
                        fallback_text(partial_text)
                    }
                    Ok(SpecialistOutcome::HandoffRequested {
                        capability,
                        partial_text,
                        ..
                    }) => {
                        // One transfer per turn; a second request is refused.
                        warn!(
                            from = %target.id,
                            capability,
                            "second handoff in one turn refused"
                        );
                        interrupted = true;
                        fallback_text(partial_text)
                    }
                    Err(error) => {
                        session.push_message(user_msg);
                        self.emit_turn_failed(session_id, &error);
                        return Err(error);
                    }
                }
            }
        };

        // Output guardrails see the assembled answer before it is
        // committed anywhere.
        let mut blocked = false;
        let verdict = {
            let view = GuardrailView {
                session_id,
                messages: working.messages(),
                scratch: working.scratch(),
            };
            self.guardrails
                .evaluate(Direction::Output, &text, &view)
                .await
        };
        let text = if verdict.blocked {
            let guardrail_id = verdict.guardrail_id.unwrap_or_default();
            warn!(guardrail_id, "output blocked");
            let _ = self.emitter.emit(RelayEvent::GuardrailBlocked {
                base: BaseEvent::now(session_id.clone()),
                direction: Direction::Output.to_string(),
                guardrail_id,
                info: verdict.info,
            });
            blocked = true;
            self.settings.blocked_output_message.clone()
        } else {
            text
        };

        working.push_message(Message::assistant(text.clone()));
        *session = working;

        self.emit_turn_end(session_id, &agent_id, started);
        Ok(TurnResponse {
            text,
            agent_id,
            blocked,
            interrupted,
            handoff,
        })
    }

    /// The agent that should run this turn: the session's active
    /// specialist when it still exists, otherwise the router's pick.
    async fn resolve_owner(&self, session: &Session, user_message: &str) -> Arc<AgentDescriptor> {
        if let Some(active) = session.active_agent() {
            if let Some(agent) = self.agents.get(active) {
                debug!(agent_id = %active, "session continues with active agent");
                return agent;
            }
            warn!(agent_id = %active, "active agent no longer registered, re-routing");
        }
        self.router
            .classify(&self.provider, user_message, session.active_agent())
            .await
    }

    /// Resolve a handoff capability to a target agent.
    ///
    /// An unknown capability, or one that resolves back to the
    /// requester, falls through to the default agent.
    fn resolve_handoff(&self, from: &AgentDescriptor, capability: &str) -> Arc<AgentDescriptor> {
        match self.agents.by_capability(capability) {
            Some(target) if target.id != from.id => target,
            Some(_) => {
                warn!(from = %from.id, capability, "handoff resolves to requester, using default");
                self.agents.default_agent()
            }
            None => {
                warn!(from = %from.id, capability, "unknown handoff capability, using default");
                self.agents.default_agent()
            }
        }
    }

    fn owner_or_default(&self, active: Option<&AgentId>) -> AgentId {
        active
            .cloned()
            .unwrap_or_else(|| self.agents.default_agent().id.clone())
    }

    fn emit_turn_end(&self, session_id: &SessionId, agent_id: &AgentId, started: Instant) {
        let _ = self.emitter.emit(RelayEvent::TurnEnd {
            base: BaseEvent::now(session_id.clone()),
            agent_id: agent_id.clone(),
            duration_ms: duration_ceil_ms(started.elapsed()),
        });
    }

    fn emit_turn_failed(&self, session_id: &SessionId, error: &RuntimeError) {
        let _ = self.emitter.emit(RelayEvent::TurnFailed {
            base: BaseEvent::now(session_id.clone()),
            error: error.to_string(),
            category: error.category().into(),
            recoverable: error.is_recoverable(),
        });
    }
}

fn fallback_text(partial_text: String) -> String {
    if partial_text.is_empty() {
        COULD_NOT_COMPLETE.to_owned()
    } else {
        partial_text
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
