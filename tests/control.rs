//! Breakpoints, stepping, stop, and the iteration budget.

use operlang::interpreter::{ExecState, ExecutionMode, Interpreter, Value};

const FIVE_ASSIGNMENTS: &str = "let a = 1\nlet b = 2\nlet c = 3\nlet d = 4\nlet e = 5";

#[test]
fn breakpoint_pauses_before_the_statement_runs() {
    let mut interpreter = Interpreter::new();
    interpreter.load(FIVE_ASSIGNMENTS).unwrap();
    interpreter.set_breakpoint(2);
    interpreter.run();

    assert_eq!(interpreter.state(), ExecState::Paused);
    assert!(!interpreter.is_running());
    assert_eq!(interpreter.program_counter(), 2);
    assert_eq!(interpreter.get_variable("b"), Value::Number(2.0));
    assert_eq!(interpreter.get_variable("c"), Value::Null);
    assert_eq!(
        interpreter.console().last_line(),
        Some("Breakpoint hit at instruction 2")
    );
}

#[test]
fn step_executes_exactly_one_statement_past_a_breakpoint() {
    let mut interpreter = Interpreter::new();
    interpreter.load(FIVE_ASSIGNMENTS).unwrap();
    interpreter.set_breakpoint(2);
    interpreter.run();

    interpreter.step();
    assert_eq!(interpreter.program_counter(), 3);
    assert_eq!(interpreter.get_variable("c"), Value::Number(3.0));
    assert_eq!(interpreter.get_variable("d"), Value::Null);
    assert_eq!(interpreter.state(), ExecState::Paused);
}

#[test]
fn clearing_a_breakpoint_lets_the_run_complete() {
    let mut interpreter = Interpreter::new();
    interpreter.load(FIVE_ASSIGNMENTS).unwrap();
    interpreter.set_breakpoint(2);
    interpreter.clear_breakpoint(2);
    interpreter.run();
    assert_eq!(interpreter.state(), ExecState::Completed);
    assert_eq!(interpreter.get_variable("e"), Value::Number(5.0));
}

#[test]
fn step_mode_pauses_after_each_statement() {
    let mut interpreter = Interpreter::new();
    interpreter.load(FIVE_ASSIGNMENTS).unwrap();
    interpreter.set_mode(ExecutionMode::Step);
    interpreter.run();

    assert_eq!(interpreter.state(), ExecState::Paused);
    assert_eq!(interpreter.program_counter(), 1);
    assert_eq!(interpreter.get_variable("a"), Value::Number(1.0));
    assert_eq!(interpreter.get_variable("b"), Value::Null);
}

#[test]
fn stepping_to_the_end_reaches_completed() {
    let mut interpreter = Interpreter::new();
    interpreter.load("let a = 1\nlet b = 2").unwrap();
    interpreter.step();
    interpreter.step();
    assert_eq!(interpreter.program_counter(), 2);
    assert_eq!(interpreter.state(), ExecState::Paused);

    // One more step past the end flips the state
    interpreter.step();
    assert_eq!(interpreter.state(), ExecState::Completed);
}

#[test]
fn stop_outside_a_run_changes_nothing() {
    let mut interpreter = Interpreter::new();
    interpreter.load("let a = 1").unwrap();
    assert_eq!(interpreter.state(), ExecState::Idle);
    interpreter.stop();
    assert_eq!(interpreter.state(), ExecState::Idle);
    assert!(!interpreter.is_running());
}

#[test]
fn top_level_infinite_loop_hits_the_budget() {
    let mut interpreter = Interpreter::new();
    interpreter.set_max_iterations(100);
    interpreter.load("while true { print(\"x\") }").unwrap();
    interpreter.run();

    assert_eq!(interpreter.state(), ExecState::Paused);
    assert!(!interpreter.is_running());
    assert_eq!(
        interpreter.console().last_line(),
        Some("Program exceeded maximum iterations - stopping execution")
    );
    // At most 100 dispatched statements produced output
    assert!(interpreter.console().lines().len() <= 101);
}

#[test]
fn nested_infinite_loop_hits_the_budget_too() {
    let mut interpreter = Interpreter::new();
    interpreter.set_max_iterations(100);
    interpreter
        .load("while true { while true { let x = 1 } }")
        .unwrap();
    interpreter.run();
    assert_eq!(interpreter.state(), ExecState::Paused);
    assert_eq!(
        interpreter.console().last_line(),
        Some("Program exceeded maximum iterations - stopping execution")
    );
}

#[test]
fn infinite_recursion_inside_a_loop_is_bounded() {
    let mut interpreter = Interpreter::new();
    interpreter.set_max_iterations(500);
    interpreter
        .load("func spin() { while true { let x = 1 } }\nspin()")
        .unwrap();
    interpreter.run();
    assert_eq!(interpreter.state(), ExecState::Paused);
}

#[test]
fn runtime_error_transitions_to_errored_and_halts() {
    let mut interpreter = Interpreter::new();
    interpreter
        .load("let a = 1\nget(a, 0)\nlet b = 2")
        .unwrap();
    interpreter.run();

    assert_eq!(interpreter.state(), ExecState::Errored);
    // The statement after the failure never ran
    assert_eq!(interpreter.get_variable("b"), Value::Null);
}

#[test]
fn run_restarts_from_the_top() {
    let mut interpreter = Interpreter::new();
    interpreter
        .load("let n = getVariable(\"n\") + 1\nprint(n)")
        .unwrap();
    interpreter.run();
    interpreter.run();
    // Each run starts at statement zero; null coerces to zero in +
    assert_eq!(
        interpreter.console().lines(),
        vec!["1".to_string(), "2".to_string()]
    );
}

#[test]
fn breakpoints_only_address_top_level_statements() {
    let mut interpreter = Interpreter::new();
    // Three nested statements, one top-level statement
    interpreter
        .load("if true { let a = 1\nlet b = 2\nlet c = 3 }")
        .unwrap();
    interpreter.set_breakpoint(1);
    interpreter.run();
    // Index 1 is past the end of the top-level list, so nothing pauses
    assert_eq!(interpreter.state(), ExecState::Completed);
    assert_eq!(interpreter.get_variable("c"), Value::Number(3.0));
}
