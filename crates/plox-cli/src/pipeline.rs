//! Scan → parse → check → evaluate, with a diagnostics checkpoint between
//! phases.

use crate::eval::{interpret, Env};
use plox_ast::diag::Diagnostics;
use plox_parse::{parse, scan};
use plox_types::TypeChecker;
use std::io::{self, Write};
use tracing::{debug, error};

/// Outcome of running one source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// Lexical, syntax or type errors; nothing was evaluated.
    CompileFailure,
    /// Evaluation stopped at a runtime error.
    RuntimeFailure,
}

impl ExitStatus {
    /// Process exit code, following the sysexits convention.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::CompileFailure => 65,
            ExitStatus::RuntimeFailure => 70,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Run the static checker before evaluating.
    pub typecheck: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { typecheck: true }
    }
}

/// Checker and runtime state shared by consecutive runs, so a REPL line
/// can use what an earlier line declared.
pub struct Session {
    options: SessionOptions,
    checker: TypeChecker,
    env: Env,
    diags: Diagnostics,
}

impl Session {
    /// A session whose `print` output goes to stdout.
    pub fn new(options: SessionOptions) -> Self {
        Self::with_env(options, Env::new())
    }

    pub fn with_env(options: SessionOptions, env: Env) -> Self {
        Self {
            options,
            checker: TypeChecker::new(),
            env,
            diags: Diagnostics::new(),
        }
    }

    /// Run `source` through every phase, writing rendered diagnostics to
    /// `sink`. Stops after the first phase that reported anything.
    pub fn run(&mut self, source: &str, sink: &mut dyn Write) -> ExitStatus {
        let toks = scan(source, &mut self.diags);
        // lexical errors do not stop the parser
        let lexical_errors = self.flush(source, sink);
        let mut stmts = parse(toks, &mut self.diags);
        if self.flush(source, sink) || lexical_errors {
            debug!("halting after parse");
            return ExitStatus::CompileFailure;
        }

        if self.options.typecheck {
            self.checker.check_program(&mut stmts, &mut self.diags);
            if self.flush(source, sink) {
                debug!("halting after type check");
                return ExitStatus::CompileFailure;
            }
        }

        match interpret(&mut self.env, &stmts) {
            Ok(()) => ExitStatus::Success,
            Err(err) => {
                debug!(message = %err, "runtime error");
                self.diags.push(err.span, err.message);
                self.flush(source, sink);
                ExitStatus::RuntimeFailure
            }
        }
    }

    /// Report and clear pending diagnostics. Returns whether there were any.
    fn flush(&mut self, source: &str, sink: &mut dyn Write) -> bool {
        if self.diags.is_empty() {
            return false;
        }
        debug!(count = self.diags.len(), "reporting diagnostics");
        if let Err(e) = self.diags.report(source, sink) {
            error!("failed to write diagnostics: {e}");
            self.diags.clear();
        }
        true
    }
}

/// Run `source` once in a fresh session, printing to stdout and reporting
/// diagnostics to stderr.
pub fn run_pipeline(source: &str) -> ExitStatus {
    Session::new(SessionOptions::default()).run(source, &mut io::stderr())
}
