//! End-to-end turns through the full stack: scripted provider, real
//! customer tools, pattern guardrails, and the orchestrator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, json};
use tokio::sync::Notify;
use relay_core::events::RelayEvent;
use relay_core::ids::SessionId;
use relay_core::messages::{Context, ToolCall};
use relay_core::tools::{Tool, ToolOutput, ToolParameterSchema};
use relay_guardrails::rules::PatternRule;
use relay_guardrails::{Direction, GuardrailPipeline};
use relay_llm::{
    Classification, ModelEventStream, Provider, ProviderOptions, ProviderResult, ScriptedProvider,
};
use relay_runtime::{AgentRegistry, Orchestrator, RuntimeError};
use relay_settings::RelaySettings;
use relay_tools::customer::{
    CalculateRefundTool, CustomerProfile, ListOrdersTool, LookupOrderTool, OrderStore,
    ProcessRefundTool,
};
use relay_tools::{RelayTool, ToolContext, ToolError, ToolRegistry};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn alice() -> CustomerProfile {
    CustomerProfile {
        customer_id: "CUST-123".into(),
        name: "Alice Johnson".into(),
        premium: true,
    }
}

fn bob() -> CustomerProfile {
    CustomerProfile {
        customer_id: "CUST-456".into(),
        name: "Bob Smith".into(),
        premium: false,
    }
}

fn customer_tools() -> ToolRegistry {
    let store = Arc::new(OrderStore::seeded());
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(LookupOrderTool::new(store.clone())));
    registry.register(Arc::new(ListOrdersTool::new(store.clone())));
    registry.register(Arc::new(CalculateRefundTool::new(store.clone())));
    registry.register(Arc::new(ProcessRefundTool::new(store)));
    registry
}

fn abuse_guardrails(settings: &RelaySettings) -> GuardrailPipeline {
    let mut pipeline = GuardrailPipeline::new();
    pipeline.register(Arc::new(
        PatternRule::new(
            "abuse_patterns",
            Direction::Input,
            &settings.guardrails.abuse_patterns,
        )
        .expect("default patterns compile"),
    ));
    pipeline
}

fn scripted() -> Arc<ScriptedProvider> {
    Arc::new(
        ScriptedProvider::new()
            .with_route("order", "orders")
            .with_route("refund", "refunds"),
    )
}

fn orchestrator_with(provider: Arc<ScriptedProvider>, tools: ToolRegistry) -> Orchestrator {
    let pipeline = abuse_guardrails(&RelaySettings::default());
    orchestrator_with_guardrails(provider, tools, pipeline)
}

fn orchestrator_with_guardrails(
    provider: Arc<ScriptedProvider>,
    tools: ToolRegistry,
    pipeline: GuardrailPipeline,
) -> Orchestrator {
    init_tracing();
    let settings = RelaySettings::default();
    let agents = Arc::new(
        AgentRegistry::new(
            settings.agent_descriptors(),
            settings.runtime.default_agent.clone().into(),
        )
        .expect("default agent registered"),
    );
    Orchestrator::new(
        provider,
        Arc::new(tools),
        Arc::new(pipeline),
        agents,
        settings.runtime,
    )
}

fn order_id_args(order_id: &str) -> Map<String, serde_json::Value> {
    let mut args = Map::new();
    let _ = args.insert("order_id".into(), json!(order_id));
    args
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: order status lookup
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn order_lookup_turn_runs_tool_and_answers() {
    let provider = scripted();
    provider.push_tool_calls(vec![ToolCall::new("lookup_order", order_id_args("ORD-001"))]);
    provider.push_text(
        "Your Wireless Headphones have shipped! Tracking 1Z999AA10123456784, arriving in 2 days.",
    );
    let orch = orchestrator_with(provider, customer_tools());
    let mut events = orch.subscribe();
    let sid = SessionId::from("s-orders");

    let response = orch
        .process_turn(&sid, &alice(), "Can you check on order ORD-001?")
        .await
        .unwrap();

    assert_eq!(response.agent_id.as_str(), "orders");
    assert!(response.text.contains("shipped"));
    assert!(!response.blocked);
    assert!(response.handoff.is_none());

    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    assert_eq!(session.active_agent().unwrap().as_str(), "orders");
    // user, tool result, final answer
    assert_eq!(session.messages().len(), 3);
    assert_eq!(session.messages()[1].role(), "tool");
    assert!(session.messages()[1].content().contains("Wireless Headphones"));
    assert!(session.messages()[1].content().contains("SHIPPED"));
    drop(session);

    let mut types = Vec::new();
    while let Ok(event) = events.try_recv() {
        types.push(event.event_type());
    }
    assert_eq!(
        types,
        vec![
            "turn_start",
            "tool_execution_start",
            "tool_execution_end",
            "assistant_delta",
            "turn_end",
        ]
    );
}

#[tokio::test]
async fn second_turn_stays_with_active_agent() {
    let provider = scripted();
    provider.push_text("Happy to help with your orders!");
    provider.push_tool_calls(vec![ToolCall::new("list_customer_orders", Map::new())]);
    provider.push_text("You have two orders: headphones and a phone case.");
    let orch = orchestrator_with(provider.clone(), customer_tools());
    let sid = SessionId::from("s-continuity");

    let first = orch
        .process_turn(&sid, &alice(), "I have a question about an order")
        .await
        .unwrap();
    assert_eq!(first.agent_id.as_str(), "orders");

    // "show me everything" matches no route; the active agent keeps it
    let second = orch
        .process_turn(&sid, &alice(), "show me everything on my account")
        .await
        .unwrap();
    assert_eq!(second.agent_id.as_str(), "orders");
    assert_eq!(provider.remaining(), 0);

    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    assert!(session.messages()[3].content().contains("ORD-001"));
    assert!(!session.messages()[3].content().contains("ORD-003"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: abusive input
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn abusive_message_blocked_with_canned_reply() {
    let provider = scripted();
    let orch = orchestrator_with(provider.clone(), customer_tools());
    let mut events = orch.subscribe();
    let sid = SessionId::from("s-abuse");

    let response = orch
        .process_turn(&sid, &alice(), "I will destroy you all!")
        .await
        .unwrap();

    assert!(response.blocked);
    assert!(response.text.contains("threats or abusive language"));
    // The model was never consulted
    assert_eq!(provider.remaining(), 0);

    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[0].content(), "I will destroy you all!");
    assert_eq!(session.messages()[1].role(), "assistant");
    drop(session);

    let mut saw_block = false;
    while let Ok(event) = events.try_recv() {
        if let RelayEvent::GuardrailBlocked {
            direction,
            guardrail_id,
            ..
        } = event
        {
            assert_eq!(direction, "input");
            assert_eq!(guardrail_id, "abuse_patterns");
            saw_block = true;
        }
    }
    assert!(saw_block);
}

#[tokio::test]
async fn session_recovers_after_blocked_turn() {
    let provider = scripted();
    provider.push_text("Of course, what can I do for you?");
    let orch = orchestrator_with(provider, customer_tools());
    let sid = SessionId::from("s-recover");

    let blocked = orch
        .process_turn(&sid, &alice(), "you idiots lost my package")
        .await
        .unwrap();
    assert!(blocked.blocked);

    let next = orch
        .process_turn(&sid, &alice(), "sorry, can you help me?")
        .await
        .unwrap();
    assert!(!next.blocked);
    assert_eq!(next.text, "Of course, what can I do for you?");

    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    assert_eq!(session.messages().len(), 4);
}

#[tokio::test]
async fn leaked_card_number_is_redacted_from_the_answer() {
    let provider = scripted();
    provider.push_text("Of course! Your order was charged to card 4242424242424242.");
    let settings = RelaySettings::default();
    let mut pipeline = abuse_guardrails(&settings);
    pipeline.register(Arc::new(
        PatternRule::new(
            "card_numbers",
            Direction::Output,
            &[r"\b\d{13,16}\b".to_owned()],
        )
        .expect("pattern compiles"),
    ));
    let orch = orchestrator_with_guardrails(provider, customer_tools(), pipeline);
    let mut events = orch.subscribe();
    let sid = SessionId::from("s-redact");

    let response = orch
        .process_turn(&sid, &alice(), "which card did you charge for my order?")
        .await
        .unwrap();

    assert!(response.blocked);
    assert!(!response.text.contains("4242"));
    assert_eq!(response.text, settings.runtime.blocked_output_message);

    // The substituted answer is what gets committed, not the model's text
    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    assert_eq!(session.messages().len(), 2);
    assert_eq!(
        session.messages()[1].content(),
        settings.runtime.blocked_output_message
    );
    drop(session);

    let mut saw_block = false;
    while let Ok(event) = events.try_recv() {
        if let RelayEvent::GuardrailBlocked {
            direction,
            guardrail_id,
            ..
        } = event
        {
            assert_eq!(direction, "output");
            assert_eq!(guardrail_id, "card_numbers");
            saw_block = true;
        }
    }
    assert!(saw_block);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: refund handoff
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refund_request_hands_off_to_refund_specialist() {
    let provider = scripted();
    // Turn 1: orders agent answers directly
    provider.push_text("ORD-002 was delivered three days ago.");
    // Turn 2: orders hands off; refunds calculates, then answers
    provider.push_handoff("refunds", "customer wants a refund for ORD-002");
    provider.push_tool_calls(vec![ToolCall::new("calculate_refund", {
        let mut args = order_id_args("ORD-002");
        let _ = args.insert("reason".into(), json!("wrong color"));
        args
    })]);
    provider.push_text("Good news: ORD-002 is eligible for a $19.99 refund.");
    let orch = orchestrator_with(provider, customer_tools());
    let sid = SessionId::from("s-refund");

    let first = orch
        .process_turn(&sid, &alice(), "What happened to my order ORD-002?")
        .await
        .unwrap();
    assert_eq!(first.agent_id.as_str(), "orders");

    let second = orch
        .process_turn(&sid, &alice(), "It's the wrong color. I want my money back.")
        .await
        .unwrap();

    assert_eq!(second.agent_id.as_str(), "refunds");
    assert!(second.text.contains("$19.99"));
    let handoff = second.handoff.expect("one handoff this turn");
    assert_eq!(handoff.from_agent.unwrap().as_str(), "orders");
    assert_eq!(handoff.to_agent.as_str(), "refunds");

    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    assert_eq!(session.active_agent().unwrap().as_str(), "refunds");
    let tool_msg = session
        .messages()
        .iter()
        .find(|m| m.role() == "tool")
        .expect("refund calculation recorded");
    assert!(tool_msg.content().contains("Refund eligible: $19.99"));
    assert!(!tool_msg.content().contains("manager approval"));
}

#[tokio::test]
async fn unknown_handoff_capability_falls_back_to_default() {
    let provider = scripted();
    provider.push_handoff("billing", "customer asked about invoices");
    provider.push_text("I can take it from here. What do you need?");
    let orch = orchestrator_with(provider, customer_tools());
    let sid = SessionId::from("s-unknown-cap");

    let response = orch
        .process_turn(&sid, &alice(), "question about my order invoice")
        .await
        .unwrap();

    assert_eq!(response.agent_id.as_str(), "concierge");
    let handoff = response.handoff.unwrap();
    assert_eq!(handoff.to_agent.as_str(), "concierge");
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario: tool failure
// ─────────────────────────────────────────────────────────────────────────────

struct BrokenLookupTool;

#[async_trait]
impl RelayTool for BrokenLookupTool {
    fn name(&self) -> &str {
        "lookup_order"
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "lookup_order".into(),
            description: "Look up order details by order ID.".into(),
            parameters: ToolParameterSchema::empty_object(),
        }
    }

    async fn execute(&self, _params: serde_json::Value, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Execution {
            message: "order database unreachable".into(),
        })
    }
}

#[tokio::test]
async fn tool_failure_becomes_graceful_apology() {
    let provider = scripted();
    provider.push_tool_calls(vec![ToolCall::new("lookup_order", Map::new())]);
    provider.push_text("I'm sorry, I couldn't retrieve your order right now. Please try again shortly.");
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(BrokenLookupTool));
    let orch = orchestrator_with(provider, registry);
    let sid = SessionId::from("s-broken");

    let response = orch
        .process_turn(&sid, &alice(), "Can you check on order ORD-001?")
        .await
        .unwrap();

    // The failure never aborts the turn; the agent apologizes instead
    assert!(!response.blocked);
    assert!(response.text.contains("sorry"));

    let session = orch.sessions().get(&sid).unwrap();
    let session = session.lock().await;
    let tool_msg = &session.messages()[1];
    assert_eq!(tool_msg.role(), "tool");
    assert!(tool_msg.content().contains("order database unreachable"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency and isolation
// ─────────────────────────────────────────────────────────────────────────────

/// A provider that holds its turn open until released.
struct GatedProvider {
    release: Arc<Notify>,
}

#[async_trait]
impl Provider for GatedProvider {
    fn name(&self) -> &str {
        "gated"
    }

    async fn stream(
        &self,
        _context: &Context,
        _options: &ProviderOptions,
    ) -> ProviderResult<ModelEventStream> {
        self.release.notified().await;
        let inner = ScriptedProvider::new();
        inner.push_text("done waiting");
        inner.stream(&Context { instructions: String::new(), messages: vec![], tools: vec![] }, &ProviderOptions::default()).await
    }

    async fn classify(
        &self,
        _message: &str,
        _capabilities: &[String],
    ) -> ProviderResult<Classification> {
        Ok(Classification::default())
    }
}

#[tokio::test]
async fn concurrent_turn_on_same_session_is_rejected() {
    init_tracing();
    let release = Arc::new(Notify::new());
    let settings = RelaySettings::default();
    let agents = Arc::new(
        AgentRegistry::new(
            settings.agent_descriptors(),
            settings.runtime.default_agent.clone().into(),
        )
        .unwrap(),
    );
    let orch = Arc::new(Orchestrator::new(
        Arc::new(GatedProvider {
            release: release.clone(),
        }),
        Arc::new(ToolRegistry::new()),
        Arc::new(GuardrailPipeline::new()),
        agents,
        settings.runtime,
    ));
    let sid = SessionId::from("s-busy");

    let first = {
        let orch = orch.clone();
        let sid = sid.clone();
        tokio::spawn(async move { orch.process_turn(&sid, &alice(), "hello").await })
    };
    // Let the first turn reach the gated provider
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let second = orch.process_turn(&sid, &alice(), "hello again").await;
    assert!(matches!(second, Err(RuntimeError::SessionBusy { .. })));

    release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.text, "done waiting");
    assert_eq!(first.agent_id.as_str(), "concierge");

    // The slot is freed; a follow-up turn is admitted
    release.notify_one();
    let third = orch.process_turn(&sid, &alice(), "third").await.unwrap();
    assert_eq!(third.text, "done waiting");
}

#[tokio::test]
async fn sessions_do_not_leak_into_each_other() {
    let provider = scripted();
    provider.push_text("Hi Alice!");
    provider.push_text("Hi Bob!");
    let orch = orchestrator_with(provider, customer_tools());

    let alice_sid = SessionId::from("s-alice");
    let bob_sid = SessionId::from("s-bob");
    let _ = orch
        .process_turn(&alice_sid, &alice(), "hello from alice")
        .await
        .unwrap();
    let _ = orch
        .process_turn(&bob_sid, &bob(), "hello from bob")
        .await
        .unwrap();

    let a = orch.sessions().get(&alice_sid).unwrap();
    let a = a.lock().await;
    let b = orch.sessions().get(&bob_sid).unwrap();
    let b = b.lock().await;

    assert_eq!(a.messages().len(), 2);
    assert_eq!(b.messages().len(), 2);
    assert_eq!(a.customer().customer_id, "CUST-123");
    assert_eq!(b.customer().customer_id, "CUST-456");
    assert_eq!(a.messages()[0].content(), "hello from alice");
    assert_eq!(b.messages()[0].content(), "hello from bob");
}

#[tokio::test]
async fn session_event_stream_skips_other_conversations() {
    let provider = scripted();
    provider.push_text("Hi Alice!");
    provider.push_text("Hi Bob!");
    let orch = orchestrator_with(provider, customer_tools());
    let alice_sid = SessionId::from("s-alice-events");
    let bob_sid = SessionId::from("s-bob-events");
    let mut alice_events = orch.subscribe_session(&alice_sid);

    let _ = orch
        .process_turn(&alice_sid, &alice(), "hello from alice")
        .await
        .unwrap();
    let _ = orch
        .process_turn(&bob_sid, &bob(), "hello from bob")
        .await
        .unwrap();
    drop(orch);

    let mut seen = Vec::new();
    while let Some(event) = alice_events.recv().await {
        assert_eq!(event.session_id().as_str(), "s-alice-events");
        seen.push(event.event_type());
    }
    assert_eq!(seen, vec!["turn_start", "assistant_delta", "turn_end"]);
}

#[tokio::test]
async fn committed_session_roundtrips_through_json() {
    let provider = scripted();
    provider.push_tool_calls(vec![ToolCall::new("lookup_order", order_id_args("ORD-001"))]);
    provider.push_text("It's on the way.");
    let orch = orchestrator_with(provider, customer_tools());
    let sid = SessionId::from("s-serde");

    let _ = orch
        .process_turn(&sid, &alice(), "where's order ORD-001?")
        .await
        .unwrap();

    let handle = orch.sessions().get(&sid).unwrap();
    let session = handle.lock().await;
    let json = serde_json::to_string(&*session).unwrap();
    let restored: relay_runtime::Session = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, *session);
    assert_eq!(restored.active_agent().unwrap().as_str(), "orders");
    assert_eq!(restored.messages().len(), 3);
}
