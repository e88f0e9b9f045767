//! End-to-end graph execution tests
//!
//! Each test builds a small workflow out of the built-in nodes and runs
//! it through the engine with a scripted LLM client, asserting on the
//! final value, the activation order, or both.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use xeroflow_engine::graph::{PROP_IS_END_NODE, PROP_IS_START_NODE};
use xeroflow_engine::{
    CancellationFlag, EngineConfig, EngineError, ExecutionEngine, GraphNode, LlmClient,
    LlmResponse, NodeGraph, NodeServices, NullEventSink, PropertySpec, ProviderConfig,
    ProviderKind, ReviewGate, RunStatus, VecEventSink,
};
use xeroflow_nodes::builtin_registry;

/// LLM client that replays a fixed script of responses.
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn invoke(&self, _provider: &ProviderConfig, _prompt: &str) -> LlmResponse {
        match self.responses.lock().pop_front() {
            Some(content) => LlmResponse::ok(content),
            None => LlmResponse::failure("script exhausted"),
        }
    }
}

/// LLM client that trips a cancellation flag from inside the call, so
/// the engine observes cancellation right after `process` returns.
struct CancellingLlm {
    cancel: CancellationFlag,
}

#[async_trait]
impl LlmClient for CancellingLlm {
    async fn invoke(&self, _provider: &ProviderConfig, _prompt: &str) -> LlmResponse {
        self.cancel.cancel();
        LlmResponse::ok("late result")
    }
}

/// Review gate with a fixed verdict, recording what it was shown.
struct FixedVerdict {
    approve: bool,
    seen: Mutex<Vec<String>>,
}

impl FixedVerdict {
    fn new(approve: bool) -> Arc<Self> {
        Arc::new(Self {
            approve,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ReviewGate for FixedVerdict {
    async fn confirm(&self, _node_id: &str, content: &str) -> bool {
        self.seen.lock().push(content.to_string());
        self.approve
    }
}

fn mock_config() -> Arc<EngineConfig> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = EngineConfig::default();
    config.interfaces.insert(
        "mock".to_string(),
        ProviderConfig {
            api_type: ProviderKind::OpenAi,
            url: "http://localhost/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "mock-model".to_string(),
            max_tokens: 256,
            temperature: 0.0,
        },
    );
    Arc::new(config)
}

fn services(llm: Arc<dyn LlmClient>) -> NodeServices {
    NodeServices::new(mock_config(), llm)
}

fn engine(llm: Arc<dyn LlmClient>) -> ExecutionEngine {
    ExecutionEngine::new(Arc::new(builtin_registry().unwrap()), services(llm))
}

/// Graph node with start/end markers and optional extra properties.
fn node(id: &str, node_type: &str, start: bool, end: bool) -> GraphNode {
    let mut node = GraphNode::new(id, node_type);
    node.properties
        .insert(PROP_IS_START_NODE, PropertySpec::boolean(start));
    node.properties
        .insert(PROP_IS_END_NODE, PropertySpec::boolean(end));
    node
}

fn with_interface(mut node: GraphNode) -> GraphNode {
    node.properties
        .insert("interface", PropertySpec::choice("mock", Vec::new()));
    node
}

async fn run(
    engine: &ExecutionEngine,
    graph: &NodeGraph,
    input: &str,
) -> xeroflow_engine::RunOutcome {
    engine
        .run(
            graph,
            Value::String(input.to_string()),
            &CancellationFlag::new(),
            &NullEventSink,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_linear_workflow_reaches_finish() {
    // start -> prompt -> finish
    let mut graph = NodeGraph::new();
    graph.add_node(with_interface(node("s", "start", true, false)));
    graph.add_node(with_interface(node("p", "prompt", false, false)));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("s", "prompt", "p", "input");
    graph.connect("p", "output", "f", "input");

    let engine = engine(ScriptedLlm::new(&["first reply", "second reply"]));
    let outcome = run(&engine, &graph, "hello").await;

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.final_output, Value::String("second reply".into()));
    assert_eq!(outcome.activations, 3);
}

#[tokio::test]
async fn test_conditional_router_takes_the_matching_branch() {
    // pass -> router -> (match: finish_a | no_match: finish_b)
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    let mut router = node("r", "conditional-router", false, false);
    router
        .properties
        .insert("search_string", PropertySpec::text("approved"));
    graph.add_node(router);
    graph.add_node(node("a", "finish", false, true));
    graph.add_node(node("b", "finish", false, true));
    graph.connect("in", "output", "r", "input");
    graph.connect("r", "match", "a", "input");
    graph.connect("r", "no_match", "b", "input");

    let engine = engine(ScriptedLlm::new(&[]));

    let sink = VecEventSink::new();
    let outcome = engine
        .run(
            &graph,
            Value::String("request approved by reviewer".into()),
            &CancellationFlag::new(),
            &sink,
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(sink.activation_order(), vec!["in", "r", "a"]);

    let sink = VecEventSink::new();
    let outcome = engine
        .run(
            &graph,
            Value::String("request denied".into()),
            &CancellationFlag::new(),
            &sink,
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.final_output, Value::String("request denied".into()));
    assert_eq!(sink.activation_order(), vec!["in", "r", "b"]);
}

#[tokio::test]
async fn test_conditional_router_ignores_case_by_default() {
    // pass -> router -> (match: finish_a | no_match: finish_b)
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    let mut router = node("r", "conditional-router", false, false);
    router
        .properties
        .insert("search_string", PropertySpec::text("foo"));
    graph.add_node(router);
    graph.add_node(node("a", "finish", false, true));
    graph.add_node(node("b", "finish", false, true));
    graph.connect("in", "output", "r", "input");
    graph.connect("r", "match", "a", "input");
    graph.connect("r", "no_match", "b", "input");

    let engine = engine(ScriptedLlm::new(&[]));

    // Lowercase search finds the uppercase occurrence.
    let sink = VecEventSink::new();
    let outcome = engine
        .run(
            &graph,
            Value::String("this has FOO in it".into()),
            &CancellationFlag::new(),
            &sink,
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(
        outcome.final_output,
        Value::String("this has FOO in it".into())
    );
    assert_eq!(sink.activation_order(), vec!["in", "r", "a"]);

    // With case_sensitive set, the same input misses.
    graph
        .nodes
        .get_mut("r")
        .unwrap()
        .properties
        .insert("case_sensitive", PropertySpec::boolean(true));

    let sink = VecEventSink::new();
    let outcome = engine
        .run(
            &graph,
            Value::String("this has FOO in it".into()),
            &CancellationFlag::new(),
            &sink,
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(sink.activation_order(), vec!["in", "r", "b"]);
}

#[tokio::test]
async fn test_merger_with_one_populated_input_emits_no_separator() {
    // pass -> merger (input1 only) -> finish
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    graph.add_node(node("merge", "merger", false, false));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("in", "output", "merge", "input1");
    graph.connect("merge", "output", "f", "input");

    let engine = engine(ScriptedLlm::new(&[]));
    let outcome = run(&engine, &graph, "A").await;

    assert_eq!(outcome.status, RunStatus::Finished);
    // input2 never arrives: the lone part passes through untouched.
    assert_eq!(outcome.final_output, Value::String("A".into()));
}

#[tokio::test]
async fn test_splitter_and_merger_diamond() {
    // pass -> splitter -> merger (both ports) -> finish
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    graph.add_node(node("split", "splitter", false, false));
    graph.add_node(node("merge", "merger", false, false));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("in", "output", "split", "input");
    graph.connect("split", "output1", "merge", "input1");
    graph.connect("split", "output2", "merge", "input2");
    graph.connect("merge", "output", "f", "input");

    let engine = engine(ScriptedLlm::new(&[]));
    let outcome = run(&engine, &graph, "x").await;

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.final_output, Value::String("x\n\nx".into()));
    // One activation per node: the merger fires once with both inputs.
    assert_eq!(outcome.activations, 4);
}

#[tokio::test]
async fn test_accumulator_loop_runs_exactly_the_configured_iterations() {
    // pass -> accumulator <-> prompt, accumulator carries the end marker
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    let mut acc = node("acc", "accumulator", false, true);
    acc.properties
        .insert("iterations", PropertySpec::number(3.0));
    graph.add_node(acc);
    graph.add_node(with_interface(node("p", "prompt", false, false)));
    graph.connect("in", "output", "acc", "input");
    graph.connect("acc", "output", "p", "input");
    graph.connect("p", "output", "acc", "loopback");

    let engine = engine(ScriptedLlm::new(&["r1", "r2"]));
    let sink = VecEventSink::new();
    let outcome = engine
        .run(
            &graph,
            Value::String("seed".into()),
            &CancellationFlag::new(),
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.final_output, Value::String("r1\n\nr2".into()));
    assert_eq!(
        sink.activation_order(),
        vec!["in", "acc", "p", "acc", "p", "acc"]
    );
}

#[tokio::test]
async fn test_accumulator_state_resets_between_runs() {
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    graph.add_node(node("acc", "accumulator", false, true));
    graph.add_node(with_interface(node("p", "prompt", false, false)));
    graph.connect("in", "output", "acc", "input");
    graph.connect("acc", "output", "p", "input");
    graph.connect("p", "output", "acc", "loopback");

    // Same script twice: back-to-back runs of one graph must behave
    // identically because per-run state never touches the graph.
    for _ in 0..2 {
        let engine = engine(ScriptedLlm::new(&["r1", "r2"]));
        let outcome = run(&engine, &graph, "seed").await;
        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(outcome.final_output, Value::String("r1\n\nr2".into()));
        assert_eq!(outcome.activations, 6);
    }
}

#[tokio::test]
async fn test_accumulate_output_delivers_approved_accumulation() {
    // pass -> accumulate-output <-> prompt, output2 -> finish
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    let mut acc = node("acc", "accumulate-output", false, true);
    acc.properties
        .insert("iterations", PropertySpec::number(2.0));
    graph.add_node(acc);
    graph.add_node(with_interface(node("p", "prompt", false, false)));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("in", "output", "acc", "input");
    graph.connect("acc", "output", "p", "input");
    graph.connect("p", "output", "acc", "loopback");
    graph.connect("acc", "output2", "f", "input");

    let review = FixedVerdict::new(true);
    let services = NodeServices::new(mock_config(), ScriptedLlm::new(&["r1"]))
        .with_review(review.clone());
    let engine = ExecutionEngine::new(Arc::new(builtin_registry().unwrap()), services);

    let outcome = run(&engine, &graph, "seed").await;
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.final_output, Value::String("r1".into()));
    assert_eq!(*review.seen.lock(), ["r1"]);
}

#[tokio::test]
async fn test_accumulate_output_rejection_ends_without_delivery() {
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    let mut acc = node("acc", "accumulate-output", false, true);
    acc.properties
        .insert("iterations", PropertySpec::number(2.0));
    graph.add_node(acc);
    graph.add_node(with_interface(node("p", "prompt", false, false)));
    graph.connect("in", "output", "acc", "input");
    graph.connect("acc", "output", "p", "input");
    graph.connect("p", "output", "acc", "loopback");

    let services = NodeServices::new(mock_config(), ScriptedLlm::new(&["r1"]))
        .with_review(FixedVerdict::new(false));
    let engine = ExecutionEngine::new(Arc::new(builtin_registry().unwrap()), services);

    let sink = VecEventSink::new();
    let outcome = engine
        .run(
            &graph,
            Value::String("seed".into()),
            &CancellationFlag::new(),
            &sink,
        )
        .await
        .unwrap();

    // A rejected accumulation emits nothing: the run drains as a dead
    // end instead of finishing through the delivery port.
    assert_eq!(outcome.status, RunStatus::DeadEnd);
    assert_eq!(sink.activation_order(), vec!["in", "acc", "p", "acc"]);
}

#[tokio::test]
async fn test_unknown_node_type_falls_back_and_dead_ends() {
    // The "teleport" type is not registered; its fallback reports the
    // loss on an unconnected port and the run soft-completes.
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    graph.add_node(node("t", "teleport", false, false));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("in", "output", "t", "input");
    graph.connect("t", "output", "f", "input");

    let engine = engine(ScriptedLlm::new(&[]));
    let outcome = run(&engine, &graph, "x").await;

    assert_eq!(outcome.status, RunStatus::DeadEnd);
    let text = outcome.final_output.as_str().unwrap_or_default().to_string();
    assert!(
        text.contains("teleport") && text.contains("no longer available"),
        "fallback message should name the lost type, got: {}",
        text
    );
}

#[tokio::test]
async fn test_cancellation_discards_inflight_result() {
    let mut graph = NodeGraph::new();
    graph.add_node(with_interface(node("s", "start", true, false)));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("s", "prompt", "f", "input");

    let cancel = CancellationFlag::new();
    let services = services(Arc::new(CancellingLlm {
        cancel: cancel.clone(),
    }));
    let engine = ExecutionEngine::new(Arc::new(builtin_registry().unwrap()), services);

    let sink = VecEventSink::new();
    let outcome = engine
        .run(&graph, Value::String("x".into()), &cancel, &sink)
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(outcome.final_output, Value::Null);
    // The start node ran, but its result was discarded: the finish node
    // never activates.
    assert_eq!(sink.activation_order(), vec!["s"]);
}

#[tokio::test]
async fn test_loop_limit_aborts_runaway_graph() {
    // Accumulator configured far beyond the activation ceiling.
    let mut graph = NodeGraph::new();
    graph.add_node(node("in", "pass-through", true, false));
    let mut acc = node("acc", "accumulator", false, true);
    acc.properties
        .insert("iterations", PropertySpec::number(100.0));
    graph.add_node(acc);
    graph.add_node(node("echo", "pass-through", false, false));
    graph.connect("in", "output", "acc", "input");
    graph.connect("acc", "output", "echo", "input");
    graph.connect("echo", "output", "acc", "loopback");

    let engine = engine(ScriptedLlm::new(&[])).with_max_activations(10);
    let err = engine
        .run(
            &graph,
            Value::String("seed".into()),
            &CancellationFlag::new(),
            &NullEventSink,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::LoopLimitExceeded(10)));
}

#[tokio::test]
async fn test_api_error_is_routable_text_not_an_engine_failure() {
    // Script exhausted: the prompt node reports the failure as output
    // text and the run still finishes.
    let mut graph = NodeGraph::new();
    graph.add_node(with_interface(node("s", "start", true, false)));
    graph.add_node(node("f", "finish", false, true));
    graph.connect("s", "prompt", "f", "input");

    let engine = engine(ScriptedLlm::new(&[]));
    let outcome = run(&engine, &graph, "x").await;

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(
        outcome.final_output,
        Value::String("API Error: script exhausted".into())
    );
}
