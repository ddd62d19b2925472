//=============================================
// src/lib.rs
//=============================================
// Author: OperatorLang Contributors
// License: MIT (see LICENSE)
// Goal: OperatorLang library surface
// Objective: Expose tokenizer, parser, interpreter, stdlib, and
//            collaborator modules to embedders and the CLI
//=============================================

pub mod ast;
pub mod canvas;
pub mod console;
pub mod interpreter;
pub mod parser;
pub mod serialize;
pub mod stdlib;
pub mod tokenizer;

pub use interpreter::{ExecState, ExecutionMode, Interpreter, Value};
