// vim: tw=80
//! The process-wide fail handler.
//!
//! Kept in its own test binary, because the handler is global state.
#![deny(warnings)]

mod common;

use std::panic::{self, AssertUnwindSafe};

use common::*;
use verimock::*;

#[test]
fn global_handler() {
    let (global, global_messages) = collecting_handler();
    set_global_fail_handler(global);

    // Mocks without a handler of their own report to the global one
    let screen = MockScreen::new();
    screen.verify_was_called_once().show("Hello".to_owned());
    assert_eq!(1, global_messages.lock().unwrap().len());

    // Usage errors outside of any mock go there too
    when(5).then_return(6);
    assert_eq!(2, global_messages.lock().unwrap().len());
    assert!(global_messages.lock().unwrap()[1].starts_with("When() requires"));

    // A per-mock handler takes precedence
    let (own, own_messages) = collecting_handler();
    let other = MockScreen::with_options(MockOptions::new().fail_handler(own));
    other.verify_was_called_once().show("Hello".to_owned());
    assert_eq!(1, own_messages.lock().unwrap().len());
    assert_eq!(2, global_messages.lock().unwrap().len());

    // Back to panicking
    reset_global_fail_handler();
    let r = panic::catch_unwind(AssertUnwindSafe(|| {
        screen.verify_was_called_once().show("Hello".to_owned());
    }));
    let payload = r.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert!(message.starts_with("Mock invocation count for method \"show\""));
    assert_eq!(2, global_messages.lock().unwrap().len());
}

#[test]
fn panicking_handler() {
    let handler = panicking_fail_handler();
    let r = panic::catch_unwind(AssertUnwindSafe(|| handler("boom", 0)));
    let payload = r.unwrap_err();
    assert_eq!(Some(&"boom".to_owned()), payload.downcast_ref::<String>());
}
