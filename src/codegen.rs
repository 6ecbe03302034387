//! Code generator: graph to program text.
//!
//! A full re-scan on every call; nodes are visited in id (creation) order so
//! the output depends only on graph contents, never on canvas placement.
//!
//! ```text
//! # Auto-generated code
//! # Generated by Celebrimbor
//!
//! def execute_workflow():
//!     # If (ID: 1)
//!     # condition: Action Execution.out
//!     # Conditional branch
//!     if Action Execution.out:
//!         pass  # true branch
//!     else:
//!         pass  # false branch
//!
//! if __name__ == '__main__':
//!     execute_workflow()
//! ```

use crate::graph::{Graph, Node};

const INDENT: &str = "    ";

pub const HEADER: [&str; 4] = [
    "# Auto-generated code",
    "# Generated by Celebrimbor",
    "",
    "def execute_workflow():",
];

pub const FOOTER: [&str; 2] = ["if __name__ == '__main__':", "    execute_workflow()"];

/// Render the whole graph as program text, newline-terminated.
pub fn generate(graph: &Graph) -> String {
    let mut text = generate_lines(graph).join("\n");
    text.push('\n');
    text
}

/// Render the whole graph as individual lines.
pub fn generate_lines(graph: &Graph) -> Vec<String> {
    let mut lines: Vec<String> = HEADER.iter().map(|s| s.to_string()).collect();

    if graph.node_count() == 0 {
        lines.push(format!("{INDENT}pass"));
        lines.push(String::new());
    }
    for node in graph.nodes() {
        node_lines(node, &mut lines);
    }

    lines.extend(FOOTER.iter().map(|s| s.to_string()));
    lines
}

fn node_lines(node: &Node, lines: &mut Vec<String>) {
    lines.push(format!("{INDENT}# {} (ID: {})", node.name, node.id));
    if let Some(selection) = node.selection() {
        lines.push(format!("{INDENT}# Action: {selection}"));
    }

    let kind = node.kind();
    for note in kind.annotate(node.params()) {
        lines.push(format!("{INDENT}# {note}"));
    }
    for line in kind.to_code(node.params()).lines() {
        if line.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("{INDENT}{line}"));
        }
    }
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LoopType, ParamValue, Parameters, PortRef};
    use egui::Pos2;

    #[test]
    fn test_empty_graph() {
        let graph = Graph::default();
        assert_eq!(
            generate(&graph),
            "# Auto-generated code\n# Generated by Celebrimbor\n\ndef execute_workflow():\n    pass\n\nif __name__ == '__main__':\n    execute_workflow()\n"
        );
    }

    #[test]
    fn test_action_node_block() {
        let mut graph = Graph::default();
        graph
            .create_node("action_execution", Pos2::ZERO, &Parameters::new())
            .unwrap();
        let lines = generate_lines(&graph);
        let body: Vec<&str> = lines[4..lines.len() - 2].iter().map(String::as_str).collect();
        assert_eq!(
            body,
            vec![
                "    # Action Execution (ID: 0)",
                "    # Action: Stand",
                "    # Action execution: stand",
                "    robot.run_action('stand')",
                "",
            ]
        );
    }

    #[test]
    fn test_nodes_in_id_order_not_position() {
        let mut graph = Graph::default();
        graph
            .create_node("stop", Pos2::new(500.0, 500.0), &Parameters::new())
            .unwrap();
        graph
            .create_node("sensor_input", Pos2::new(0.0, 0.0), &Parameters::new())
            .unwrap();
        let text = generate(&graph);
        let stop = text.find("# Stop (ID: 0)").unwrap();
        let sensor = text.find("# Sensor Input (ID: 1)").unwrap();
        assert!(stop < sensor);
    }

    #[test]
    fn test_condition_label_after_connect() {
        let mut graph = Graph::default();
        let a = graph
            .create_node("action_execution", Pos2::ZERO, &Parameters::new())
            .unwrap();
        let b = graph.create_node("if", Pos2::ZERO, &Parameters::new()).unwrap();
        graph
            .connect(&PortRef::new(a, "out"), &PortRef::new(b, "condition"))
            .unwrap();
        let text = generate(&graph);
        assert!(text.contains("    # condition: Action Execution.out\n"));
        assert!(text.contains("    if Action Execution.out:\n"));
    }

    #[test]
    fn test_for_fields_hidden_in_while_mode() {
        let mut graph = Graph::default();
        let id = graph
            .create_node("while_loop", Pos2::ZERO, &Parameters::new())
            .unwrap();
        graph.set_loop_type(id, LoopType::For).unwrap();
        graph.set_parameter(id, "for_end", ParamValue::Int(5)).unwrap();
        let text = generate(&graph);
        assert!(text.contains("# loop_type: for"));
        assert!(text.contains("# for: start=0, end=5, step=1"));

        graph.set_loop_type(id, LoopType::While).unwrap();
        let text = generate(&graph);
        assert!(text.contains("# loop_type: while"));
        assert!(!text.contains("for: start="));
    }

    #[test]
    fn test_deterministic() {
        let mut graph = Graph::default();
        graph.create_node("if", Pos2::ZERO, &Parameters::new()).unwrap();
        graph
            .create_node("comparison", Pos2::ZERO, &Parameters::new())
            .unwrap();
        assert_eq!(generate(&graph), generate(&graph));
    }
}
