//! Integration tests for code generation
//!
//! These tests check generated program text after editor operations:
//! - Condition labels propagated from connections
//! - Loop sub-mode switching
//! - Determinism and independence from canvas placement
//! - One sink update per mutating operation

mod common;

use celebrimbor::graph::{LoopType, ParamValue, Parameters};
use celebrimbor::interaction::PointerButton;
use celebrimbor::{codegen, CodeSink, Graph, KindRegistry, PointerEvent, PortRef};
use common::{builders::GraphBuilder, editor};
use egui::{vec2, Pos2};
use mockall::mock;

mock! {
    pub Sink {}

    impl CodeSink for Sink {
        fn set_text(&mut self, code: &str);
    }
}

#[test]
fn test_if_condition_reflects_connected_action() {
    let mut builder = GraphBuilder::new();
    let branch = builder.add_at("if", 0.0, 0.0);
    let action = builder.add_at("action_execution", 400.0, 200.0);
    builder.link(action, "out", branch, "condition");
    let graph = builder.build();

    let name = graph.node(action).unwrap().name.clone();
    let text = codegen::generate(&graph);
    assert!(text.contains(&format!("    # condition: {}.out\n", name)));
    assert!(text.contains(&format!("    if {}.out:\n", name)));
}

#[test]
fn test_while_for_toggle_through_editor() {
    let mut editor = editor(Graph::new(KindRegistry::with_builtins()));
    let id = editor.create_node_at("while_loop", Pos2::new(200.0, 200.0)).unwrap();

    assert!(editor.set_loop_type(id, LoopType::For));
    assert!(editor.set_parameter(id, "for_start", ParamValue::Int(0)));
    assert!(editor.set_parameter(id, "for_end", ParamValue::Int(5)));
    assert!(editor.set_parameter(id, "for_step", ParamValue::Int(1)));
    let code = editor.code().to_string();
    assert!(code.contains("    # loop_type: for\n"));
    assert!(code.contains("    # for: start=0, end=5, step=1\n"));
    assert!(code.contains("    for i in range(0, 5, 1):\n"));

    assert!(editor.set_loop_type(id, LoopType::While));
    let code = editor.code();
    assert!(code.contains("    # loop_type: while\n"));
    assert!(code.contains("    while condition:\n"));
    assert!(!code.contains("for: start="));
    assert!(!code.contains("range("));
}

#[test]
fn test_loop_type_edit_keeps_selection_consistent() {
    let mut editor = editor(Graph::new(KindRegistry::with_builtins()));
    let id = editor.create_node_at("while_loop", Pos2::ZERO).unwrap();

    assert!(editor.set_parameter(id, "loop_type", ParamValue::text("for")));
    let code = editor.code();
    assert!(code.contains("    # Action: For\n"));
    assert!(code.contains("    # loop_type: for\n"));
    assert!(!code.contains("# Action: While"));
}

#[test]
fn test_elif_branches_in_output() {
    let mut editor = editor(Graph::new(KindRegistry::with_builtins()));
    let id = editor.create_node_at("if", Pos2::ZERO).unwrap();
    assert_eq!(editor.add_elif(id), Some(0));
    assert_eq!(editor.add_elif(id), Some(1));
    assert!(editor.set_parameter(
        id,
        "elif_conditions",
        ParamValue::List(vec![ParamValue::text("x > 1"), ParamValue::text("")]),
    ));

    let code = editor.code();
    assert!(code.contains("    # elif_0: x > 1\n"));
    assert!(code.contains("    elif x > 1:\n"));
    assert!(code.contains("    elif elif_condition_1:\n"));

    assert!(editor.remove_elif(id));
    assert!(!editor.code().contains("elif_condition_1"));
}

#[test]
fn test_generation_ignores_positions() {
    let build = |offset: f32| {
        let mut graph = Graph::new(KindRegistry::with_builtins());
        let sensor = graph
            .create_node("sensor_input", Pos2::new(offset, 0.0), &Parameters::new())
            .unwrap();
        let cmp = graph
            .create_node("comparison", Pos2::new(0.0, offset), &Parameters::new())
            .unwrap();
        graph
            .connect(&PortRef::new(sensor, "out"), &PortRef::new(cmp, "left"))
            .unwrap();
        graph
    };
    let a = build(0.0);
    let mut b = build(750.0);
    let moved = b.node_ids()[0];
    b.move_node(moved, vec2(-300.0, 90.0)).unwrap();

    assert_eq!(codegen::generate(&a), codegen::generate(&a));
    assert_eq!(codegen::generate(&a), codegen::generate(&b));
}

#[test]
fn test_one_sink_update_per_mutation() {
    let mut sink = MockSink::new();
    // Attach, two creates, connect, rename.
    sink.expect_set_text()
        .withf(|code| code.starts_with("# Auto-generated code\n"))
        .times(5)
        .return_const(());

    let mut editor = editor(Graph::new(KindRegistry::with_builtins())).with_sink(Box::new(sink));
    let a = editor.create_node_at("action_execution", Pos2::new(100.0, 100.0)).unwrap();
    let b = editor.create_node_at("stop", Pos2::new(500.0, 100.0)).unwrap();
    editor.graph().check_invariants().unwrap();

    // Connection gesture: three events, one mutation.
    let out = editor.graph().port_position(&PortRef::new(a, "out")).unwrap();
    let input = editor.graph().port_position(&PortRef::new(b, "in")).unwrap();
    editor.handle_event(PointerEvent::Press {
        pos: out,
        button: PointerButton::Primary,
        additive: false,
    });
    editor.handle_event(PointerEvent::Move { pos: input });
    editor.handle_event(PointerEvent::Release {
        pos: input,
        button: PointerButton::Primary,
    });
    assert_eq!(editor.graph().connection_count(), 1);

    // Neither view changes, moves nor rejected edits touch the code.
    editor.handle_event(PointerEvent::Scroll {
        pos: Pos2::ZERO,
        delta: 1.0,
    });
    assert!(!editor.set_parameter(a, "no_such_key", ParamValue::Int(1)));

    assert!(editor.rename_node(a, "Wave"));
    assert!(editor.code().contains("    # Wave (ID: 0)\n"));
}
