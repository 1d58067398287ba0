//! Rhai host for player scripts.
//!
//! Scripts are ordinary Rhai code with loops, functions and variables. The
//! only capabilities registered on top of the language are the four movement
//! functions:
//!
//! ```text
//! fn stairs(n) {
//!     for i in 0..n {
//!         moveLeft(1);
//!         moveUp(1);
//!     }
//! }
//! moveUp(3);
//! stairs(2);
//! ```
//!
//! Movement calls are recorded while the script runs and forwarded to the
//! session only once it finishes cleanly, so a failing script never leaves a
//! partial queue behind.

use std::{cell::RefCell, rc::Rc};

use codewalk_core::{
    Direction, EnqueueError, MoveCommands, Script, ScriptError, StepCount, ValidationError,
};
use rhai::{Dynamic, Engine, EvalAltResult, ParseError, INT};
use tracing::{debug, info};

/// Operations a single script may perform before it is aborted.
pub(crate) const MAX_OPERATIONS: u64 = 50_000;

/// Deepest function call chain a script may build.
pub(crate) const MAX_CALL_LEVELS: usize = 32;

const MOVES: [(&str, Direction); 4] = [
    ("moveUp", Direction::Up),
    ("moveDown", Direction::Down),
    ("moveLeft", Direction::Left),
    ("moveRight", Direction::Right),
];

/// Script text handed to the session as a [`Script`].
#[derive(Clone, Debug)]
pub(crate) struct Program {
    source: String,
}

impl Program {
    /// Wraps the provided script text.
    pub(crate) fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Script for Program {
    fn run(&mut self, commands: &mut dyn MoveCommands) -> Result<(), ScriptError> {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let engine = sandbox(&calls);

        let ast = engine.compile(&self.source).map_err(|error| syntax(&error))?;
        let outcome = engine.run_ast(&ast);
        let recorded = calls.take();

        // A rejected count fails the script even if the script caught it.
        if let Some(rejected) = recorded.rejected {
            return Err(EnqueueError::from(rejected).into());
        }
        outcome.map_err(|error| failure(&error))?;

        debug!(calls = recorded.pending.len(), "script finished");
        for (direction, n) in recorded.pending {
            commands.enqueue(direction, n)?;
        }
        Ok(())
    }
}

/// Movement calls made by the running script.
#[derive(Debug, Default)]
struct Calls {
    pending: Vec<(Direction, i64)>,
    rejected: Option<ValidationError>,
}

fn sandbox(calls: &Rc<RefCell<Calls>>) -> Engine {
    let mut engine = Engine::new();
    let _ = engine
        .set_max_operations(MAX_OPERATIONS)
        .set_max_call_levels(MAX_CALL_LEVELS)
        .set_max_expr_depths(64, 32)
        .set_strict_variables(true)
        .disable_symbol("eval")
        .on_print(|text| info!(output = text, "script print"))
        .on_debug(|text, _, position| debug!(output = text, ?position, "script debug"));

    for (name, direction) in MOVES {
        let sink = Rc::clone(calls);
        let _ = engine.register_fn(name, move |count: Dynamic| {
            record(&sink, direction, step_count(&count))
        });
        let sink = Rc::clone(calls);
        let _ = engine.register_fn(name, move || {
            record(&sink, direction, Err(ValidationError::Missing))
        });
    }
    engine
}

fn step_count(value: &Dynamic) -> Result<INT, ValidationError> {
    if value.is_unit() {
        return Err(ValidationError::Missing);
    }
    let n = value.as_int().map_err(|_| ValidationError::NotAnInteger)?;
    StepCount::validate(n).map(|_| n)
}

fn record(
    calls: &Rc<RefCell<Calls>>,
    direction: Direction,
    count: Result<INT, ValidationError>,
) -> Result<(), Box<EvalAltResult>> {
    let mut calls = calls.borrow_mut();
    match count {
        Ok(n) => {
            calls.pending.push((direction, n));
            Ok(())
        }
        Err(error) => {
            let message = error.to_string();
            let _ = calls.rejected.get_or_insert(error);
            Err(message.into())
        }
    }
}

fn syntax(error: &ParseError) -> ScriptError {
    ScriptError::Syntax {
        line: error.position().line().unwrap_or(1),
        message: error.err_type().to_string(),
    }
}

fn failure(error: &EvalAltResult) -> ScriptError {
    match error {
        EvalAltResult::ErrorFunctionNotFound(signature, position) => ScriptError::Syntax {
            line: position.line().unwrap_or(1),
            message: format!("unknown function `{signature}`"),
        },
        EvalAltResult::ErrorVariableNotFound(name, position) => ScriptError::Syntax {
            line: position.line().unwrap_or(1),
            message: format!("unknown variable `{name}`"),
        },
        EvalAltResult::ErrorTooManyOperations(_) => {
            ScriptError::Failed(format!("script exceeded {MAX_OPERATIONS} operations"))
        }
        other => ScriptError::Failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(Direction, i64)>,
    }

    impl MoveCommands for Recorder {
        fn enqueue(&mut self, direction: Direction, n: i64) -> Result<(), EnqueueError> {
            self.calls.push((direction, n));
            Ok(())
        }
    }

    fn run(source: &str) -> (Result<(), ScriptError>, Vec<(Direction, i64)>) {
        let mut recorder = Recorder::default();
        let result = Program::new(source).run(&mut recorder);
        (result, recorder.calls)
    }

    #[test]
    fn calls_follow_source_order() {
        let (result, calls) = run("moveUp(9);\nmoveLeft( 9 ); // done\n");
        assert_eq!(result, Ok(()));
        assert_eq!(calls, vec![(Direction::Up, 9), (Direction::Left, 9)]);
    }

    #[test]
    fn loops_and_functions_expand_in_place() {
        let source = "
            fn stairs(n) {
                for i in 0..n {
                    moveDown(1);
                    moveLeft(3);
                }
            }
            moveRight(1);
            stairs(2);
        ";
        let (result, calls) = run(source);
        assert_eq!(result, Ok(()));
        assert_eq!(
            calls,
            vec![
                (Direction::Right, 1),
                (Direction::Down, 1),
                (Direction::Left, 3),
                (Direction::Down, 1),
                (Direction::Left, 3),
            ]
        );
    }

    #[test]
    fn syntax_errors_report_their_line_before_enqueueing() {
        let (result, calls) = run("moveUp(1);\nmoveSideways(2);");
        assert!(
            matches!(result, Err(ScriptError::Syntax { line: 2, .. })),
            "{result:?}"
        );
        assert!(calls.is_empty());

        let (result, _) = run("moveUp(1;\n");
        assert!(matches!(result, Err(ScriptError::Syntax { line: 1, .. })));

        let (result, _) = run("for i in 0..3 {\n moveUp(1);");
        assert!(matches!(result, Err(ScriptError::Syntax { .. })));

        let (result, _) = run("}");
        assert!(matches!(result, Err(ScriptError::Syntax { line: 1, .. })));

        let (result, _) = run("moveUp 3");
        assert!(matches!(result, Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn runaway_scripts_exhaust_their_operation_budget() {
        let nested = "
            for a in 0..100 { for b in 0..100 { for c in 0..100 {
                for d in 0..100 { for e in 0..100 { for f in 0..100 { } } }
            } } }
        ";
        for source in ["loop { }", "while true { }", nested] {
            let (result, calls) = run(source);
            assert!(matches!(result, Err(ScriptError::Failed(_))), "{source}");
            assert!(calls.is_empty());
        }

        let (result, calls) = run("moveUp(1); fn dig(n) { dig(n + 1) } dig(1);");
        assert!(matches!(result, Err(ScriptError::Failed(_))), "{result:?}");
        assert!(calls.is_empty());

        let (result, calls) = run("for i in 0..100 { moveUp(1); }");
        assert_eq!(result, Ok(()));
        assert_eq!(calls.len(), 100);
    }

    #[test]
    fn invalid_counts_surface_as_validation_errors() {
        let cases = [
            ("moveUp()", ValidationError::Missing),
            ("moveUp(())", ValidationError::Missing),
            ("moveUp(\"two\")", ValidationError::NotAnInteger),
            ("moveUp(1.5)", ValidationError::NotAnInteger),
            ("moveUp(0)", ValidationError::NotPositive),
            ("moveUp(-4)", ValidationError::NotPositive),
        ];
        for (source, expected) in cases {
            let (result, calls) = run(&format!("moveLeft(1); {source}"));
            assert_eq!(
                result,
                Err(ScriptError::Enqueue(EnqueueError::Validation(expected))),
                "{source}"
            );
            assert!(calls.is_empty(), "{source}");
        }
    }

    #[test]
    fn caught_rejections_still_fail_the_script() {
        let (result, calls) = run("try { moveUp(0); } catch (err) { }\nmoveLeft(1);");
        assert_eq!(
            result,
            Err(ScriptError::Enqueue(EnqueueError::Validation(
                ValidationError::NotPositive
            )))
        );
        assert!(calls.is_empty());
    }

    #[test]
    fn forwarding_stops_at_the_first_rejected_enqueue() {
        struct Capped(usize);

        impl MoveCommands for Capped {
            fn enqueue(&mut self, _: Direction, n: i64) -> Result<(), EnqueueError> {
                let requested = n as u64;
                if self.0 as u64 + requested > 10 {
                    return Err(EnqueueError::Capacity(codewalk_core::CapacityError {
                        queued: self.0,
                        requested,
                        capacity: 10,
                    }));
                }
                self.0 += n as usize;
                Ok(())
            }
        }

        let mut capped = Capped(0);
        let result = Program::new("for i in 0..4 { moveUp(3); }").run(&mut capped);
        assert!(matches!(
            result,
            Err(ScriptError::Enqueue(EnqueueError::Capacity(_)))
        ));
        assert_eq!(capped.0, 9);
    }
}
