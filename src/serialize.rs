//=============================================
// src/serialize.rs
//=============================================
// Author: OperatorLang Contributors
// License: MIT (see LICENSE)
// Goal: Program snapshot interchange
// Objective: Export and import interpreter state (program, variables,
//            user functions, breakpoints) as versioned JSON
//=============================================

use serde::{Deserialize, Serialize};

use crate::ast::Stmt;
use crate::interpreter::{Interpreter, Value};

pub const SNAPSHOT_VERSION: &str = "1.0";

/// Serialized interpreter state. Native functions never appear here;
/// they are re-installed by construction on the importing side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    pub program: Vec<Stmt>,
    pub variables: Vec<(String, Value)>,
    pub functions: Vec<FunctionSnapshot>,
    pub breakpoints: Vec<usize>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSnapshot {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

impl Interpreter {
    /// Serialize the current program, environment, user functions, and
    /// breakpoints to pretty-printed JSON.
    pub fn export(&self) -> Result<String, serde_json::Error> {
        let mut variables: Vec<(String, Value)> = self
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        variables.sort_by(|a, b| a.0.cmp(&b.0));

        let mut functions: Vec<FunctionSnapshot> = self
            .user_functions()
            .map(|(name, params, body)| FunctionSnapshot {
                name: name.clone(),
                params: params.clone(),
                body: body.clone(),
            })
            .collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));

        let mut breakpoints: Vec<usize> = self.breakpoints.iter().copied().collect();
        breakpoints.sort_unstable();

        let snapshot = ProgramSnapshot {
            program: self.program.clone(),
            variables,
            functions,
            breakpoints,
            version: SNAPSHOT_VERSION.to_string(),
        };
        serde_json::to_string_pretty(&snapshot)
    }

    /// Restore interpreter state from a snapshot produced by `export`.
    ///
    /// Fail-closed: a malformed payload or version mismatch leaves the
    /// interpreter untouched apart from a console diagnostic, and the
    /// call reports `false`.
    pub fn import(&mut self, json: &str) -> bool {
        let snapshot: ProgramSnapshot = match serde_json::from_str(json) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.console
                    .write(&format!("Error importing program: {}", error));
                return false;
            }
        };

        if snapshot.version != SNAPSHOT_VERSION {
            self.console
                .write("Error importing program: Incompatible program version");
            return false;
        }

        self.program = snapshot.program;
        self.variables = snapshot.variables.into_iter().collect();
        for function in snapshot.functions {
            self.define_function(&function.name, function.params, function.body);
        }
        self.breakpoints = snapshot.breakpoints.into_iter().collect();
        self.reset_execution();
        true
    }
}
