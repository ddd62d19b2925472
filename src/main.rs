//=============================================
// src/main.rs
//=============================================
// Author: OperatorLang Contributors
// License: MIT (see LICENSE)
// Goal: OperatorLang CLI entrypoint for running .opl scripts
// Objective: Provide parsing, optional diagnostics, breakpoints,
//            stepping, and snapshot export/import from the shell
//=============================================

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser as ClapParser;

use operlang::canvas::{DrawOp, RecordingSurface};
use operlang::console::ConsoleSink;
use operlang::interpreter::{ExecState, ExecutionMode, Interpreter, LoadError};
use operlang::parser::ParseError;

//=============================================
//            Section 1: CLI Definition
//=============================================

#[derive(Debug, ClapParser)]
#[command(
    name = "operlang",
    about = "Runs OperatorLang scripts or restores saved program snapshots.",
    version
)]
struct Args {
    /// Path to the OperatorLang script to execute.
    script: Option<PathBuf>,

    /// Restore a program snapshot instead of loading a script.
    #[arg(long, conflicts_with = "script")]
    import: Option<PathBuf>,

    /// Write a program snapshot here after the run finishes.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Safety budget on dispatched statements.
    #[arg(long, default_value_t = operlang::interpreter::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Delay between top-level statements, in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Execution mode: normal, step, or fast.
    #[arg(long, default_value = "normal")]
    mode: String,

    /// Set a breakpoint on a top-level statement index (repeatable).
    #[arg(long = "breakpoint")]
    breakpoints: Vec<usize>,

    /// Pretty-print the parsed program.
    #[arg(long)]
    print_ast: bool,

    /// Dump the recorded drawing operations after the run.
    #[arg(long)]
    print_canvas: bool,
}

//=============================================
//            Section 2: Entry Point
//=============================================

fn main() -> Result<()> {
    let args = Args::parse();
    run_script(&args)
}

fn run_script(args: &Args) -> Result<()> {
    let mode = parse_mode(&args.mode)?;

    let surface = Rc::new(RefCell::new(RecordingSurface::new()));
    let mut interpreter =
        Interpreter::with_collaborators(ConsoleSink::with_echo(), surface.clone());
    interpreter.set_max_iterations(args.max_iterations);
    interpreter.set_delay_ms(args.delay_ms);
    interpreter.set_mode(mode);

    match (&args.script, &args.import) {
        (Some(script), None) => {
            let source = fs::read_to_string(script)
                .with_context(|| format!("Failed to read {}", script.display()))?;
            interpreter
                .load(&source)
                .map_err(|error| map_load_error(script, error))?;
        }
        (None, Some(snapshot)) => {
            let json = fs::read_to_string(snapshot)
                .with_context(|| format!("Failed to read {}", snapshot.display()))?;
            if !interpreter.import(&json) {
                bail!("Failed to import snapshot {}", snapshot.display());
            }
        }
        _ => bail!("Provide a script path or --import <snapshot>"),
    }

    for index in &args.breakpoints {
        interpreter.set_breakpoint(*index);
    }

    if args.print_ast {
        println!("{:#?}", interpreter.program());
    }

    if mode == ExecutionMode::Step {
        drive_stepping(&mut interpreter);
    } else {
        interpreter.run();
    }

    if args.print_canvas {
        print_canvas(surface.borrow().ops());
    }

    if let Some(path) = &args.export {
        let json = interpreter
            .export()
            .context("Failed to serialize program snapshot")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if interpreter.state() == ExecState::Errored {
        bail!("Script halted with a runtime error");
    }
    Ok(())
}

//=============================================
//            Section 3: Helpers
//=============================================

fn parse_mode(mode: &str) -> Result<ExecutionMode> {
    match mode {
        "normal" => Ok(ExecutionMode::Normal),
        "step" => Ok(ExecutionMode::Step),
        "fast" => Ok(ExecutionMode::Fast),
        other => Err(anyhow!(
            "Unknown mode '{other}' (expected normal, step, or fast)"
        )),
    }
}

// Step mode from the shell executes one statement at a time until the
// program completes or errors.
fn drive_stepping(interpreter: &mut Interpreter) {
    loop {
        interpreter.step();
        match interpreter.state() {
            ExecState::Completed | ExecState::Errored => break,
            _ => {}
        }
    }
}

fn map_load_error(path: &Path, error: LoadError) -> anyhow::Error {
    match error {
        LoadError::Lex(error) => anyhow!("{}: {}", path.display(), error),
        LoadError::Parse(ParseError::UnexpectedToken {
            expected,
            found,
            position,
        }) => anyhow!(
            "{}:{}:{}: expected {}, found {:?}",
            path.display(),
            position.line,
            position.column,
            expected,
            found
        ),
        LoadError::Parse(ParseError::InvalidSyntax { message, position }) => anyhow!(
            "{}:{}:{}: {}",
            path.display(),
            position.line,
            position.column,
            message
        ),
        LoadError::Parse(ParseError::UnexpectedEndOfInput { expected, position }) => anyhow!(
            "{}:{}:{}: unexpected end of input, expected {}",
            path.display(),
            position.line,
            position.column,
            expected
        ),
    }
}

fn print_canvas(ops: &[DrawOp]) {
    println!("; canvas ({} operations)", ops.len());
    for (index, op) in ops.iter().enumerate() {
        println!("{:04} | {:?}", index, op);
    }
}
