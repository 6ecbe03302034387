//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use celebrimbor::{Editor, EditorConfig, Graph, Theme};

/// Editor over `graph` with default config and the built-in theme
pub fn editor(graph: Graph) -> Editor {
    Editor::new(graph, EditorConfig::default(), Box::new(Theme::default()))
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
