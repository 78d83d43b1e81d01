// vim: tw=80
//! Verifying call order, on one mock or across several
#![deny(warnings)]

mod common;

use common::*;
use verimock::*;

fn abc() -> MockScreen {
    let screen = MockScreen::new();
    screen.show("a".to_owned());
    screen.show("b".to_owned());
    screen.show("c".to_owned());
    screen
}

#[test]
fn skipping_unverified_calls() {
    let screen = abc();
    let ctx = InOrderContext::new();
    screen.verify_was_called_in_order(once(), &ctx).show("a".to_owned());
    screen.verify_was_called_in_order(once(), &ctx).show("c".to_owned());
}

#[test]
#[should_panic(expected = "Expected function call \"show\" with params \
    [\"a\"] before function call \"show\" with params [\"b\"]")]
fn out_of_order() {
    let screen = abc();
    let ctx = InOrderContext::new();
    screen.verify_was_called_in_order(once(), &ctx).show("b".to_owned());
    screen.verify_was_called_in_order(once(), &ctx).show("a".to_owned());
}

#[test]
fn failure_does_not_advance_cursor() {
    let (handler, messages) = collecting_handler();
    let screen = MockScreen::with_options(MockOptions::new()
                                          .fail_handler(handler));
    screen.show("a".to_owned());
    screen.show("b".to_owned());
    let ctx = InOrderContext::new();
    assert_eq!(None, ctx.cursor());
    screen.verify_was_called_in_order(once(), &ctx).show("b".to_owned());
    let cursor = ctx.cursor();
    assert!(cursor.is_some());
    screen.verify_was_called_in_order(once(), &ctx).show("a".to_owned());
    assert_eq!(cursor, ctx.cursor());
    assert_eq!(1, messages.lock().unwrap().len());
}

#[test]
fn cursor_moves_to_last_match() {
    let screen = MockScreen::new();
    screen.show("a".to_owned());
    screen.show("a".to_owned());
    screen.show("b".to_owned());
    let ctx = InOrderContext::new();
    let v = screen.verify_was_called_in_order(times(2), &ctx)
        .show("a".to_owned());
    assert_eq!(v.0.invocations().last().map(Invocation::seq), ctx.cursor());
    screen.verify_was_called_in_order(once(), &ctx).show("b".to_owned());
}

#[test]
fn matchers_in_order() {
    let screen = abc();
    let ctx = InOrderContext::new();
    screen.verify_was_called_in_order(once(), &ctx).show(eq("a".to_owned()));
    screen.verify_was_called_in_order(times(2), &ctx).show(any());
}

#[test]
fn across_mocks() {
    let first = MockScreen::new();
    let second = MockScreen::new();
    first.show("one".to_owned());
    second.flash("two".to_owned(), 2);
    first.show("three".to_owned());
    let ctx = InOrderContext::new();
    first.verify_was_called_in_order(once(), &ctx).show("one".to_owned());
    second.verify_was_called_in_order(once(), &ctx).flash("two".to_owned(), 2);
    first.verify_was_called_in_order(once(), &ctx).show("three".to_owned());
}

#[test]
#[should_panic(expected = "Expected function call \"flash\" with params \
    [\"two\", 2] before function call \"show\" with params [\"three\"]")]
fn across_mocks_out_of_order() {
    let first = MockScreen::new();
    let second = MockScreen::new();
    first.show("one".to_owned());
    second.flash("two".to_owned(), 2);
    first.show("three".to_owned());
    let ctx = InOrderContext::new();
    first.verify_was_called_in_order(once(), &ctx).show("three".to_owned());
    second.verify_was_called_in_order(once(), &ctx).flash("two".to_owned(), 2);
}

/// Unordered verifications don't touch the context.
#[test]
fn mixed_with_unordered() {
    let screen = abc();
    let ctx = InOrderContext::new();
    screen.verify_was_called_in_order(once(), &ctx).show("b".to_owned());
    screen.verify_was_called_once().show("a".to_owned());
    screen.verify_was_called_in_order(once(), &ctx).show("c".to_owned());
}
