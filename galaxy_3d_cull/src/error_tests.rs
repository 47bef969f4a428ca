//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_node_display() {
    let err = Error::InvalidNode("NodeKey(3v1) not found".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid node"));
    assert!(display.contains("NodeKey(3v1)"));
}

#[test]
fn test_invalid_topology_display() {
    let err = Error::InvalidTopology("cycle detected".to_string());
    assert_eq!(format!("{}", err), "Invalid topology: cycle detected");
}

#[test]
fn test_bounds_write_not_permitted_display() {
    let err = Error::BoundsWriteNotPermitted("scene is in cull phase".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Bounds write not permitted"));
    assert!(display.contains("cull phase"));
}

#[test]
fn test_invalid_argument_display() {
    let err = Error::InvalidArgument("near must be > 0".to_string());
    assert_eq!(format!("{}", err), "Invalid argument: near must be > 0");
}

#[test]
fn test_invalid_operation_display() {
    let err = Error::InvalidOperation("no root".to_string());
    assert_eq!(format!("{}", err), "Invalid operation: no root");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::InvalidNode("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::InvalidTopology("t".to_string()));
    assert!(debug.contains("InvalidTopology"));

    let debug = format!("{:?}", Error::BoundsWriteNotPermitted("b".to_string()));
    assert!(debug.contains("BoundsWriteNotPermitted"));
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::InvalidArgument("fov".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
    assert_ne!(err1, Error::InvalidArgument("aspect".to_string()));
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::InvalidNode("gone".to_string()))
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert_eq!(outer(), Err(Error::InvalidNode("gone".to_string())));
}
