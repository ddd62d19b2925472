//=============================================
// src/stdlib.rs
//=============================================
// Author: OperatorLang Contributors
// License: MIT (see LICENSE)
// Goal: OperatorLang standard library
// Objective: Install the native function registry: math, comparison,
//            string, array, I/O, graphics, time, and system operations
//=============================================

use std::thread;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::interpreter::{Interpreter, NativeArity, RuntimeError, Value};

/// Cap on how far `set` may extend an array past its current length.
/// Values are stored densely, so an unbounded index would translate
/// directly into an unbounded allocation.
pub const MAX_ARRAY_GROWTH: usize = 10_000;

// Utility: positional argument as a number, Undefined past the end
fn arg_number(args: &[Value], index: usize) -> f64 {
    args.get(index)
        .map(Value::coerce_number)
        .unwrap_or(f64::NAN)
}

// Utility: positional argument rendered as text
fn arg_string(args: &[Value], index: usize) -> String {
    args.get(index)
        .map(|value| value.to_string())
        .unwrap_or_else(|| "undefined".to_string())
}

// Utility: optional flag; absent or undefined falls back to the default
fn arg_flag(args: &[Value], index: usize, default: bool) -> bool {
    match args.get(index) {
        None | Some(Value::Undefined) => default,
        Some(value) => value.is_truthy(),
    }
}

/// Join values with a separator; null and undefined render empty.
pub fn join_values(values: &[Value], separator: &str) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        match value {
            Value::Null | Value::Undefined => {}
            other => out.push_str(&other.to_string()),
        }
    }
    out
}

impl Interpreter {
    pub(crate) fn install_stdlib(&mut self) {
        use NativeArity::{Exact, Range};

        // Math operations
        self.register_native("add", Exact(2), Self::native_add);
        self.register_native("sub", Exact(2), Self::native_sub);
        self.register_native("mul", Exact(2), Self::native_mul);
        self.register_native("div", Exact(2), Self::native_div);
        self.register_native("mod", Exact(2), Self::native_mod);
        self.register_native("pow", Exact(2), Self::native_pow);
        self.register_native("sqrt", Exact(1), Self::native_sqrt);
        self.register_native("sin", Exact(1), Self::native_sin);
        self.register_native("cos", Exact(1), Self::native_cos);
        self.register_native("tan", Exact(1), Self::native_tan);
        self.register_native("floor", Exact(1), Self::native_floor);
        self.register_native("ceil", Exact(1), Self::native_ceil);
        self.register_native("round", Exact(1), Self::native_round);
        self.register_native("abs", Exact(1), Self::native_abs);
        self.register_native("random", Exact(2), Self::native_random);

        // Comparison operations
        self.register_native("eq", Exact(2), Self::native_eq);
        self.register_native("neq", Exact(2), Self::native_neq);
        self.register_native("lt", Exact(2), Self::native_lt);
        self.register_native("gt", Exact(2), Self::native_gt);
        self.register_native("lte", Exact(2), Self::native_lte);
        self.register_native("gte", Exact(2), Self::native_gte);
        self.register_native("and", Exact(2), Self::native_and);
        self.register_native("or", Exact(2), Self::native_or);
        self.register_native("not", Exact(1), Self::native_not);

        // String operations
        self.register_native("concat", Exact(2), Self::native_concat);
        self.register_native("substr", Exact(3), Self::native_substr);
        self.register_native("length", Exact(1), Self::native_length);
        self.register_native("tostring", Exact(1), Self::native_tostring);
        self.register_native("tonumber", Exact(1), Self::native_tonumber);

        // Array operations
        self.register_native("array", Range { min: 0, max: None }, Self::native_array);
        self.register_native("get", Exact(2), Self::native_get);
        self.register_native("set", Exact(3), Self::native_set);
        self.register_native("push", Exact(2), Self::native_push);
        self.register_native("pop", Exact(1), Self::native_pop);
        self.register_native(
            "join",
            Range {
                min: 1,
                max: Some(2),
            },
            Self::native_join,
        );
        self.register_native(
            "split",
            Range {
                min: 1,
                max: Some(2),
            },
            Self::native_split,
        );

        // I/O operations
        self.register_native("print", Range { min: 0, max: None }, Self::native_print);
        self.register_native("clear", Exact(0), Self::native_clear);

        // Graphics operations
        self.register_native(
            "clearCanvas",
            Range {
                min: 0,
                max: Some(1),
            },
            Self::native_clear_canvas,
        );
        self.register_native("setFillColor", Exact(1), Self::native_set_fill_color);
        self.register_native("setStrokeColor", Exact(1), Self::native_set_stroke_color);
        self.register_native("setLineWidth", Exact(1), Self::native_set_line_width);
        self.register_native(
            "drawRect",
            Range {
                min: 4,
                max: Some(5),
            },
            Self::native_draw_rect,
        );
        self.register_native(
            "drawCircle",
            Range {
                min: 3,
                max: Some(4),
            },
            Self::native_draw_circle,
        );
        self.register_native("drawLine", Exact(4), Self::native_draw_line);
        self.register_native(
            "drawText",
            Range {
                min: 3,
                max: Some(4),
            },
            Self::native_draw_text,
        );
        self.register_native("setFont", Exact(1), Self::native_set_font);
        self.register_native("saveGraphicsState", Exact(0), Self::native_save_graphics);
        self.register_native(
            "restoreGraphicsState",
            Exact(0),
            Self::native_restore_graphics,
        );
        self.register_native("translate", Exact(2), Self::native_translate);
        self.register_native("rotate", Exact(1), Self::native_rotate);
        self.register_native("scale", Exact(2), Self::native_scale);

        // Time operations
        self.register_native("delay", Exact(1), Self::native_delay);
        self.register_native("now", Exact(0), Self::native_now);

        // System operations
        self.register_native("getVariable", Exact(1), Self::native_get_variable);
        self.register_native("setVariable", Exact(2), Self::native_set_variable);

        // Type checking
        self.register_native("isNumber", Exact(1), Self::native_is_number);
        self.register_native("isString", Exact(1), Self::native_is_string);
        self.register_native("isArray", Exact(1), Self::native_is_array);
        self.register_native("isBoolean", Exact(1), Self::native_is_boolean);
        self.register_native("isNull", Exact(1), Self::native_is_null);
        self.register_native("isUndefined", Exact(1), Self::native_is_undefined);
    }

    //=============================================
    // Section 1: Math
    //=============================================

    fn native_add(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        // Mirrors the `+` operator, string concatenation included
        match (&args[0], &args[1]) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", args[0], args[1])))
            }
            (a, b) => Ok(Value::Number(a.coerce_number() + b.coerce_number())),
        }
    }

    fn native_sub(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0) - arg_number(args, 1)))
    }

    fn native_mul(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0) * arg_number(args, 1)))
    }

    fn native_div(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0) / arg_number(args, 1)))
    }

    fn native_mod(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0) % arg_number(args, 1)))
    }

    fn native_pow(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).powf(arg_number(args, 1))))
    }

    fn native_sqrt(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).sqrt()))
    }

    fn native_sin(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).sin()))
    }

    fn native_cos(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).cos()))
    }

    fn native_tan(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).tan()))
    }

    fn native_floor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).floor()))
    }

    fn native_ceil(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).ceil()))
    }

    fn native_round(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        // Half-up rounding: -0.5 rounds to 0
        let n = arg_number(args, 0);
        Ok(Value::Number((n + 0.5).floor()))
    }

    fn native_abs(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(arg_number(args, 0).abs()))
    }

    fn native_random(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let min = arg_number(args, 0);
        let max = arg_number(args, 1);
        let mut rng = rand::thread_rng();
        Ok(Value::Number(min + rng.r#gen::<f64>() * (max - min)))
    }

    //=============================================
    // Section 2: Comparison & Logic
    //=============================================

    fn native_eq(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(args[0] == args[1]))
    }

    fn native_neq(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(args[0] != args[1]))
    }

    fn native_lt(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(relational(args, |o| {
            o == std::cmp::Ordering::Less
        })))
    }

    fn native_gt(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(relational(args, |o| {
            o == std::cmp::Ordering::Greater
        })))
    }

    fn native_lte(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(relational(args, |o| {
            o != std::cmp::Ordering::Greater
        })))
    }

    fn native_gte(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(relational(args, |o| {
            o != std::cmp::Ordering::Less
        })))
    }

    fn native_and(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(if args[0].is_truthy() {
            args[1].clone()
        } else {
            args[0].clone()
        })
    }

    fn native_or(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(if args[0].is_truthy() {
            args[0].clone()
        } else {
            args[1].clone()
        })
    }

    fn native_not(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(!args[0].is_truthy()))
    }

    //=============================================
    // Section 3: Strings
    //=============================================

    fn native_concat(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Str(format!("{}{}", args[0], args[1])))
    }

    fn native_substr(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let text: Vec<char> = arg_string(args, 0).chars().collect();
        let clamp = |n: f64| -> usize {
            if n.is_nan() || n < 0.0 {
                0
            } else {
                (n as usize).min(text.len())
            }
        };
        let start = arg_number(args, 1);
        let mut from = clamp(start);
        let mut to = clamp(start + arg_number(args, 2));
        if from > to {
            std::mem::swap(&mut from, &mut to);
        }
        Ok(Value::Str(text[from..to].iter().collect()))
    }

    fn native_length(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let length = match &args[0] {
            Value::Array(items) => items.len(),
            Value::Str(s) => s.chars().count(),
            _ => 0,
        };
        Ok(Value::Number(length as f64))
    }

    fn native_tostring(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Str(args[0].to_string()))
    }

    fn native_tonumber(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(args[0].coerce_number()))
    }

    //=============================================
    // Section 4: Arrays
    //=============================================

    fn native_array(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Array(args.to_vec()))
    }

    fn native_get(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let Value::Array(items) = &args[0] else {
            return Err(RuntimeError::Type(format!(
                "Expected an array, got {}",
                args[0].type_name()
            )));
        };
        Ok(index_of(&args[1], items.len())
            .and_then(|index| items.get(index).cloned())
            .unwrap_or(Value::Undefined))
    }

    fn native_set(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let Value::Array(items) = &args[0] else {
            return Err(RuntimeError::Type(format!(
                "Expected an array, got {}",
                args[0].type_name()
            )));
        };
        let mut result = items.clone();
        if let Some(index) = index_of(&args[1], usize::MAX) {
            if index > result.len() + MAX_ARRAY_GROWTH {
                return Err(RuntimeError::Index(format!(
                    "Array index {} is too large",
                    index
                )));
            }
            if index >= result.len() {
                result.resize(index + 1, Value::Undefined);
            }
            result[index] = args[2].clone();
        }
        Ok(Value::Array(result))
    }

    fn native_push(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        // Non-arrays degrade to a fresh single-element array
        match &args[0] {
            Value::Array(items) => {
                let mut result = items.clone();
                result.push(args[1].clone());
                Ok(Value::Array(result))
            }
            _ => Ok(Value::Array(vec![args[1].clone()])),
        }
    }

    fn native_pop(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        match &args[0] {
            Value::Array(items) if !items.is_empty() => {
                let mut result = items.clone();
                result.pop();
                Ok(Value::Array(result))
            }
            _ => Ok(Value::Array(Vec::new())),
        }
    }

    fn native_join(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let Value::Array(items) = &args[0] else {
            return Ok(Value::Str(args[0].to_string()));
        };
        let separator = optional_separator(args.get(1));
        Ok(Value::Str(join_values(items, &separator)))
    }

    fn native_split(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let text = arg_string(args, 0);
        let separator = optional_separator(args.get(1));
        let parts: Vec<Value> = if separator.is_empty() {
            text.chars().map(|c| Value::Str(c.to_string())).collect()
        } else {
            text.split(separator.as_str())
                .map(|part| Value::Str(part.to_string()))
                .collect()
        };
        Ok(Value::Array(parts))
    }

    //=============================================
    // Section 5: I/O
    //=============================================

    fn native_print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let line = join_values(args, " ");
        interpreter.console.write(&line);
        Ok(args.last().cloned().unwrap_or(Value::Undefined))
    }

    fn native_clear(interpreter: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeError> {
        interpreter.console.clear();
        Ok(Value::Null)
    }

    //=============================================
    // Section 6: Graphics
    //=============================================

    fn native_clear_canvas(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let color = match args.first() {
            None | Some(Value::Undefined) => "#ffffff".to_string(),
            Some(value) => value.to_string(),
        };
        interpreter.canvas.borrow_mut().clear(&color);
        Ok(Value::Null)
    }

    fn native_set_fill_color(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter
            .canvas
            .borrow_mut()
            .set_fill_color(&arg_string(args, 0));
        Ok(args[0].clone())
    }

    fn native_set_stroke_color(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter
            .canvas
            .borrow_mut()
            .set_stroke_color(&arg_string(args, 0));
        Ok(args[0].clone())
    }

    fn native_set_line_width(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter
            .canvas
            .borrow_mut()
            .set_line_width(arg_number(args, 0));
        Ok(args[0].clone())
    }

    fn native_draw_rect(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.canvas.borrow_mut().draw_rect(
            arg_number(args, 0),
            arg_number(args, 1),
            arg_number(args, 2),
            arg_number(args, 3),
            arg_flag(args, 4, true),
        );
        Ok(Value::Null)
    }

    fn native_draw_circle(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.canvas.borrow_mut().draw_circle(
            arg_number(args, 0),
            arg_number(args, 1),
            arg_number(args, 2),
            arg_flag(args, 3, true),
        );
        Ok(Value::Null)
    }

    fn native_draw_line(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.canvas.borrow_mut().draw_line(
            arg_number(args, 0),
            arg_number(args, 1),
            arg_number(args, 2),
            arg_number(args, 3),
        );
        Ok(Value::Null)
    }

    fn native_draw_text(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let max_width = args
            .get(3)
            .filter(|value| value.is_truthy())
            .map(Value::coerce_number);
        interpreter.canvas.borrow_mut().draw_text(
            &arg_string(args, 0),
            arg_number(args, 1),
            arg_number(args, 2),
            max_width,
        );
        Ok(Value::Null)
    }

    fn native_set_font(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter
            .canvas
            .borrow_mut()
            .set_font(&arg_string(args, 0));
        Ok(args[0].clone())
    }

    fn native_save_graphics(
        interpreter: &mut Interpreter,
        _: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.canvas.borrow_mut().save_state();
        Ok(Value::Null)
    }

    fn native_restore_graphics(
        interpreter: &mut Interpreter,
        _: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.canvas.borrow_mut().restore_state();
        Ok(Value::Null)
    }

    fn native_translate(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter
            .canvas
            .borrow_mut()
            .translate(arg_number(args, 0), arg_number(args, 1));
        Ok(Value::Null)
    }

    fn native_rotate(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.canvas.borrow_mut().rotate(arg_number(args, 0));
        Ok(Value::Null)
    }

    fn native_scale(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter
            .canvas
            .borrow_mut()
            .scale(arg_number(args, 0), arg_number(args, 1));
        Ok(Value::Null)
    }

    //=============================================
    // Section 7: Time & System
    //=============================================

    // The sole suspension point in the language
    fn native_delay(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        let ms = arg_number(args, 0);
        if ms.is_finite() && ms > 0.0 {
            thread::sleep(Duration::from_secs_f64(ms / 1000.0));
        }
        Ok(Value::Undefined)
    }

    fn native_now(_: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Number(Utc::now().timestamp_millis() as f64))
    }

    fn native_get_variable(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        Ok(interpreter.get_variable(&arg_string(args, 0)))
    }

    fn native_set_variable(
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        interpreter.set_variable(&arg_string(args, 0), args[1].clone());
        Ok(args[1].clone())
    }

    //=============================================
    // Section 8: Type Checks
    //=============================================

    fn native_is_number(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(matches!(args[0], Value::Number(_))))
    }

    fn native_is_string(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(matches!(args[0], Value::Str(_))))
    }

    fn native_is_array(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(matches!(args[0], Value::Array(_))))
    }

    fn native_is_boolean(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
    }

    fn native_is_null(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(matches!(args[0], Value::Null)))
    }

    fn native_is_undefined(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
        Ok(Value::Bool(matches!(args[0], Value::Undefined)))
    }
}

// Utility: separator argument; falsy values collapse to the empty string
fn optional_separator(value: Option<&Value>) -> String {
    match value {
        Some(v) if v.is_truthy() => v.to_string(),
        _ => String::new(),
    }
}

// Utility: relational comparison over the first two arguments
fn relational(args: &[Value], test: fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::Str(a), Value::Str(b)) = (&args[0], &args[1]) {
        return test(a.cmp(b));
    }
    match args[0]
        .coerce_number()
        .partial_cmp(&args[1].coerce_number())
    {
        Some(ordering) => test(ordering),
        None => false,
    }
}

// Utility: non-negative integral index, or None when it cannot address
// an element
fn index_of(value: &Value, len: usize) -> Option<usize> {
    let n = value.coerce_number();
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return None;
    }
    let index = n as usize;
    if len != usize::MAX && index >= len {
        return None;
    }
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, RecordingSurface};
    use crate::console::ConsoleSink;
    use crate::interpreter::ExecState;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn eval_source(source: &str) -> Interpreter {
        let mut interpreter = Interpreter::new();
        interpreter.load(source).expect("program should parse");
        interpreter.run();
        interpreter
    }

    #[test]
    fn test_print_joins_arguments_and_returns_last() {
        let interpreter = eval_source("let r = print(1, \"two\", 3)");
        assert_eq!(interpreter.console().lines()[0], "1 two 3");
        assert_eq!(interpreter.get_variable("r"), Value::Number(3.0));
    }

    #[test]
    fn test_push_coerces_non_arrays() {
        let interpreter = eval_source("let a = push(5, 6)\nlet b = push(array(1), 2)");
        assert_eq!(
            interpreter.get_variable("a"),
            Value::Array(vec![Value::Number(6.0)])
        );
        assert_eq!(
            interpreter.get_variable("b"),
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn test_get_and_set_require_arrays() {
        let mut interpreter = Interpreter::new();
        interpreter.load("get(5, 0)").unwrap();
        interpreter.run();
        assert_eq!(interpreter.state(), ExecState::Errored);
        assert_eq!(
            interpreter.console().last_line(),
            Some("Runtime error: Type error: Expected an array, got number")
        );
    }

    #[test]
    fn test_get_out_of_range_is_undefined() {
        let interpreter = eval_source("let r = isUndefined(get(array(1, 2), 9))");
        assert_eq!(interpreter.get_variable("r"), Value::Bool(true));
    }

    #[test]
    fn test_set_returns_a_fresh_array() {
        let source = "let a = array(1, 2)\nlet b = set(a, 0, 9)\nlet first = get(a, 0)";
        let interpreter = eval_source(source);
        assert_eq!(
            interpreter.get_variable("b"),
            Value::Array(vec![Value::Number(9.0), Value::Number(2.0)])
        );
        assert_eq!(interpreter.get_variable("first"), Value::Number(1.0));
    }

    #[test]
    fn test_set_extends_with_undefined_padding() {
        let interpreter = eval_source("let r = set(array(1), 3, 9)");
        assert_eq!(
            interpreter.get_variable("r"),
            Value::Array(vec![
                Value::Number(1.0),
                Value::Undefined,
                Value::Undefined,
                Value::Number(9.0),
            ])
        );
    }

    #[test]
    fn test_set_rejects_runaway_indices() {
        let mut interpreter = Interpreter::new();
        interpreter.load("set(array(), 10000000, 1)").unwrap();
        interpreter.run();
        assert_eq!(interpreter.state(), ExecState::Errored);
        assert_eq!(
            interpreter.console().last_line(),
            Some("Runtime error: Index error: Array index 10000000 is too large")
        );
    }

    #[test]
    fn test_pop_on_empty_yields_empty() {
        let interpreter = eval_source("let r = pop(array())");
        assert_eq!(interpreter.get_variable("r"), Value::Array(Vec::new()));
    }

    #[test]
    fn test_join_and_split() {
        let source = "let j = join(array(1, 2, 3), \"-\")\nlet s = split(\"abc\")";
        let interpreter = eval_source(source);
        assert_eq!(interpreter.get_variable("j"), Value::Str("1-2-3".to_string()));
        assert_eq!(
            interpreter.get_variable("s"),
            Value::Array(vec![
                Value::Str("a".to_string()),
                Value::Str("b".to_string()),
                Value::Str("c".to_string()),
            ])
        );
    }

    #[test]
    fn test_substr_clamps_bounds() {
        let interpreter = eval_source("let r = substr(\"hello\", 1, 100)");
        assert_eq!(interpreter.get_variable("r"), Value::Str("ello".to_string()));
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut interpreter = Interpreter::new();
        interpreter
            .load("for i in range(0, 50) { let r = random(2, 5)\nif r < 2 || r >= 5 { print(\"out\") } }")
            .unwrap();
        interpreter.run();
        assert!(interpreter.console().lines().iter().all(|l| l != "out"));
    }

    #[test]
    fn test_graphics_calls_reach_the_surface() {
        let surface = Rc::new(RefCell::new(RecordingSurface::new()));
        let mut interpreter =
            Interpreter::with_collaborators(ConsoleSink::new(), surface.clone());
        interpreter
            .load("clearCanvas()\nsetFillColor(\"red\")\ndrawRect(1, 2, 3, 4, false)")
            .unwrap();
        interpreter.run();

        assert_eq!(
            surface.borrow().ops(),
            vec![
                DrawOp::Clear {
                    color: "#ffffff".to_string()
                },
                DrawOp::FillColor {
                    color: "red".to_string()
                },
                DrawOp::Rect {
                    x: 1.0,
                    y: 2.0,
                    width: 3.0,
                    height: 4.0,
                    fill: false
                },
            ]
        );
    }

    #[test]
    fn test_get_variable_native_reads_environment() {
        let interpreter = eval_source("let hidden = 42\nlet r = getVariable(\"hidden\")");
        assert_eq!(interpreter.get_variable("r"), Value::Number(42.0));
    }

    #[test]
    fn test_type_predicates() {
        let source = "let a = isNumber(1)\nlet b = isString(1)\nlet c = isNull(null)\nlet d = isArray(array())";
        let interpreter = eval_source(source);
        assert_eq!(interpreter.get_variable("a"), Value::Bool(true));
        assert_eq!(interpreter.get_variable("b"), Value::Bool(false));
        assert_eq!(interpreter.get_variable("c"), Value::Bool(true));
        assert_eq!(interpreter.get_variable("d"), Value::Bool(true));
    }

    #[test]
    fn test_join_values_renders_null_empty() {
        let values = vec![Value::Number(1.0), Value::Null, Value::Number(3.0)];
        assert_eq!(join_values(&values, ","), "1,,3");
    }
}
