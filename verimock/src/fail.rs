// vim: tw=80
//! Failure taxonomy and the pluggable failure hook.
//!
//! The engine decides what a failure says, never how it is shown.  Every
//! failure is rendered to a message and handed to a [`FailHandler`]: the
//! mock's own handler if it has one, else the process-wide handler, else
//! [`panicking_fail_handler`].

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use thiserror::Error;
use tracing::warn;

use crate::times::Times;

/// Receives a failure message and the number of engine stack frames between
/// the failing expression and the handler.
pub type FailHandler = Arc<dyn Fn(&str, usize) + Send + Sync>;

/// Frames between a generated mock method and the handler call.
const CALLER_SKIP: usize = 2;

static GLOBAL_FAIL_HANDLER: RwLock<Option<FailHandler>> = RwLock::new(None);

/// Everything that can go wrong while stubbing, invoking or verifying.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MockError {
    #[error("{}", mixed_matchers(.expected, .recorded))]
    MixedMatchers { expected: usize, recorded: usize },

    #[error("When() requires an argument which has to be 'a method call on a mock'.")]
    NotAMockCall,

    #[error("Method \"{method}\" has no return value.  Stub it with when_void(|| mock.{method}(..)) instead of when(..).")]
    VoidWhen { method: String },

    #[error("Different number of return values: expected {expected}, got {actual}")]
    ReturnArity { expected: usize, actual: usize },

    #[error("Return value 'nil' not assignable to return type {return_type}")]
    NilNotAssignable { return_type: &'static str },

    #[error("Return value of type {value_type} not assignable to return type {return_type}")]
    TypeMismatch {
        value_type: &'static str,
        return_type: &'static str,
    },

    #[error("Mock invocation count for method \"{method}\" with params {params} does not match expectation.\n\n\tExpected: {expected}; but got: {actual}{detail}")]
    CountMismatch {
        method: String,
        params: String,
        expected: Times,
        actual: usize,
        detail: String,
    },

    #[error("Mock invocation count for method \"{method}\" with params {params} does not match expectation within {timeout:?}.\n\n\tExpected: {expected}; but got: {actual}")]
    EventuallyTimedOut {
        method: String,
        params: String,
        expected: Times,
        actual: usize,
        timeout: Duration,
    },

    #[error("Expected function call \"{method}\" with params {params} before function call \"{previous_method}\" with params {previous_params}")]
    OutOfOrder {
        method: String,
        params: String,
        previous_method: String,
        previous_params: String,
    },
}

fn mixed_matchers(expected: &usize, recorded: &usize) -> String {
    format!("Invalid use of matchers!\n\n {} matchers expected, {} recorded.\n\n\
             This error may occur if matchers are combined with raw values:\n    \
             //incorrect:\n    \
             mock.method(any::<i32>(), \"raw value\")\n\
             When using matchers, all arguments have to be provided by matchers.\n\
             For example:\n    \
             //correct:\n    \
             mock.method(any::<i32>(), eq(\"value by matcher\".to_owned()))",
            expected, recorded)
}

/// The default handler: panic with the failure message.
pub fn panicking_fail_handler() -> FailHandler {
    Arc::new(|message: &str, _caller_skip: usize| panic!("{}", message))
}

/// Install the handler used by every mock that has none of its own.
pub fn set_global_fail_handler(handler: FailHandler) {
    *GLOBAL_FAIL_HANDLER.write().unwrap_or_else(PoisonError::into_inner) =
        Some(handler);
}

/// Go back to panicking on failures.
pub fn reset_global_fail_handler() {
    *GLOBAL_FAIL_HANDLER.write().unwrap_or_else(PoisonError::into_inner) =
        None;
}

pub(crate) fn global_fail_handler() -> Option<FailHandler> {
    GLOBAL_FAIL_HANDLER.read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Render `error` and hand it to `handler`, or the global handler.
///
/// No engine lock may be held here; the handler will usually unwind.
pub(crate) fn report(handler: Option<FailHandler>, error: &MockError) {
    let message = error.to_string();
    warn!(%message, "mock failure");
    let handler = handler
        .or_else(global_fail_handler)
        .unwrap_or_else(panicking_fail_handler);
    handler(&message, CALLER_SKIP);
}
