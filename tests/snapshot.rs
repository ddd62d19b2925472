//! Export/import round-trips for the versioned snapshot format.

use operlang::interpreter::{ExecState, Interpreter, Value};
use operlang::serialize::SNAPSHOT_VERSION;

const PROGRAM: &str = "func double(x) { return x + x }\nlet r = double(21)\nprint(r)";

#[test]
fn round_trip_reproduces_execution_behavior() {
    let mut original = Interpreter::new();
    original.load(PROGRAM).unwrap();
    let json = original.export().unwrap();

    let mut restored = Interpreter::new();
    assert!(restored.import(&json));

    original.run();
    restored.run();
    assert_eq!(original.console().lines(), restored.console().lines());
    assert_eq!(restored.get_variable("r"), Value::Number(42.0));
}

#[test]
fn round_trip_preserves_variables_and_breakpoints() {
    let mut original = Interpreter::new();
    original.load(PROGRAM).unwrap();
    original.run();
    original.set_breakpoint(1);
    let json = original.export().unwrap();

    let mut restored = Interpreter::new();
    assert!(restored.import(&json));
    assert_eq!(restored.get_variable("r"), Value::Number(42.0));
    assert!(restored.breakpoints().contains(&1));
    assert_eq!(restored.state(), ExecState::Idle);
    assert_eq!(restored.program_counter(), 0);

    // The imported breakpoint behaves like a locally set one
    restored.run();
    assert_eq!(restored.state(), ExecState::Paused);
    assert_eq!(restored.program_counter(), 1);
}

#[test]
fn version_mismatch_is_rejected() {
    let mut original = Interpreter::new();
    original.load(PROGRAM).unwrap();
    let json = original.export().unwrap().replace(
        &format!("\"version\": \"{}\"", SNAPSHOT_VERSION),
        "\"version\": \"2.0\"",
    );

    let mut restored = Interpreter::new();
    assert!(!restored.import(&json));
    assert!(restored.program().is_empty());
    assert_eq!(
        restored.console().last_line(),
        Some("Error importing program: Incompatible program version")
    );
}

#[test]
fn malformed_payload_is_rejected_and_state_untouched() {
    let mut interpreter = Interpreter::new();
    interpreter.load("print(1)").unwrap();

    assert!(!interpreter.import("this is not json"));
    assert!(!interpreter.import("{\"program\": []}"));

    // The previously loaded program is intact
    interpreter.run();
    assert_eq!(interpreter.console().last_line(), Some("1"));
}

#[test]
fn natives_survive_an_import() {
    let mut original = Interpreter::new();
    original.load("print(\"hi\")").unwrap();
    let json = original.export().unwrap();

    let mut restored = Interpreter::new();
    assert!(restored.import(&json));
    restored.run();
    assert_eq!(restored.console().last_line(), Some("hi"));
}

#[test]
fn only_user_functions_are_serialized() {
    let mut interpreter = Interpreter::new();
    interpreter.load(PROGRAM).unwrap();
    let json = interpreter.export().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let functions = value["functions"].as_array().unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0]["name"], "double");
    assert_eq!(value["version"], SNAPSHOT_VERSION);
}

#[test]
fn snapshot_program_uses_tagged_camel_case_nodes() {
    let mut interpreter = Interpreter::new();
    interpreter
        .load("if true { print(1) } else { print(2) }")
        .unwrap();
    let json = interpreter.export().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let statement = &value["program"][0];
    assert_eq!(statement["type"], "if");
    assert!(statement["elseBody"].is_array());
    assert_eq!(statement["body"][0]["type"], "expression");
    assert_eq!(statement["body"][0]["expression"]["type"], "call");
}
