// vim: tw=80
//! A stub-and-verify mock engine.
//!
//! Verimock is the runtime behind generated mock types.  A generated mock
//! wraps a [`GenericMock`] and forwards every method into it.  The engine
//! records the call, answers it from the programmed stubbings, and later
//! verifies how often, in what order, and eventually whether calls were made.
//!
//! # Usage
//!
//! * Create a mock.  It records every call made through it.
//! * Optionally stub methods with [`when`] (or [`when_void`] for methods with
//!   no return value) and queue answers on the returned [`OngoingStubbing`].
//! * Supply the mock to the code under test.  Unstubbed methods return the
//!   zero value of every return type.
//! * Afterwards verify the calls with a [`Verification`]: a call count, and
//!   optionally an [`InOrderContext`] or a timeout.
//!
//! ## Getting started
//!
//! This is what a generated mock for a simple trait boils down to.
//!
//! ```
//! use verimock::*;
//!
//! trait Display {
//!     fn show(&self, message: String);
//!     fn some_value(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct MockDisplay { mock: GenericMock }
//!
//! impl Display for MockDisplay {
//!     fn show(&self, message: String) {
//!         self.mock.invoke("show", params![message], &[]);
//!     }
//!     fn some_value(&self) -> String {
//!         self.mock.invoke("some_value", params![],
//!                          &[ReturnType::of::<String>()])
//!             .take(0)
//!     }
//! }
//!
//! let display = MockDisplay::default();
//! when(display.some_value()).then_return("Hello".to_owned());
//!
//! display.show(display.some_value());
//!
//! display.mock.verify(&Verification::once(), "show",
//!                     params![eq("Hello".to_owned())]);
//! ```
//!
//! ## Matching arguments
//!
//! Arguments of a stubbing or verification are either all raw values, which
//! match by equality, or all matchers: [`eq`], [`not_eq`], [`any`],
//! [`arg_that`] and [`arg_where`].  Matchers may not be mixed with raw values;
//! doing so is reported as a failure.
//!
//! ## Failures
//!
//! Failed verifications and invalid stubbings are reported through a
//! [`FailHandler`].  By default it panics with the failure message.  A
//! per-mock handler can be set with [`MockOptions::fail_handler`] and a
//! process-wide one with [`set_global_fail_handler`].

mod fail;
mod in_order;
mod invocation;
mod matcher;
mod mock;
mod registry;
mod stubbing;
mod times;
mod value;
mod verify;

pub use crate::{
    fail::{
        panicking_fail_handler,
        reset_global_fail_handler,
        set_global_fail_handler,
        FailHandler,
        MockError,
    },
    in_order::InOrderContext,
    invocation::Invocation,
    matcher::{
        any,
        arg_that,
        arg_where,
        eq,
        not_eq,
        AnyMatcher,
        EqMatcher,
        Matcher,
        NotEqMatcher,
        PredicateMatcher,
    },
    mock::{GenericMock, MockOptions, DEFAULT_POLL_INTERVAL},
    registry::{drain_matchers, pending_matchers, register_matcher},
    stubbing::{when, when_void, Callback, OngoingStubbing},
    times::{at_least, at_most, never, once, times, Times},
    value::{
        ArgValue,
        Literal,
        Nullable,
        Param,
        ReturnType,
        ReturnValue,
        ReturnValues,
    },
    verify::{get_invocation_params, OngoingVerification, Verification},
};
pub use predicates::prelude::{Predicate, predicate};
