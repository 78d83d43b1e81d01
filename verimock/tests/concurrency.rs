// vim: tw=80
//! Mocks shared with a multithreaded system under test
#![deny(warnings)]

mod common;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use common::*;
use verimock::*;

#[test]
fn concurrent_invocations() {
    let screen = MockScreen::new();
    let threads = (0..8).map(|i| {
        let s = screen.clone();
        thread::spawn(move || {
            for j in 0..25 {
                s.flash(format!("thread {}", i), j);
            }
        })
    }).collect::<Vec<_>>();
    for t in threads {
        t.join().unwrap();
    }
    screen.verify_was_called(times(200)).flash(any(), any());
    screen.verify_was_called(times(25)).flash(eq("thread 3".to_owned()), any());
}

#[test]
fn log_order_is_sequence_order() {
    let screen = MockScreen::new();
    let threads = (0..4).map(|_| {
        let s = screen.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                s.show("x".to_owned());
            }
        })
    }).collect::<Vec<_>>();
    for t in threads {
        t.join().unwrap();
    }
    let seqs = screen.generic_mock()
        .invocations()
        .iter()
        .map(Invocation::seq)
        .collect::<Vec<_>>();
    assert_eq!(200, seqs.len());
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn stubbings_are_visible_from_other_threads() {
    let screen = MockScreen::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let c2 = counter.clone();
    when(screen.some_value()).then(move |_| {
        let n = c2.fetch_add(1, Ordering::SeqCst);
        vec![ReturnValue::new(format!("call {}", n))]
    });
    let threads = (0..4).map(|_| {
        let s = screen.clone();
        thread::spawn(move || s.some_value())
    }).collect::<Vec<_>>();
    let mut values = threads.into_iter()
        .map(|t| t.join().unwrap())
        .collect::<Vec<_>>();
    values.sort();
    assert_eq!(vec!["call 0", "call 1", "call 2", "call 3"], values);
}

/// Matchers registered on one thread are invisible to another, so
/// independent test threads can stub concurrently.
#[test]
fn arrange_context_is_per_thread() {
    let screen = MockScreen::new();
    let s2 = screen.clone();
    let t = thread::spawn(move || {
        when(s2.multiple_params_and_return_value(any(), eq(2)))
            .then_return("two".to_owned());
    });
    when(screen.multiple_params_and_return_value(any(), eq(1)))
        .then_return("one".to_owned());
    t.join().unwrap();
    assert_eq!("one",
               screen.multiple_params_and_return_value("x".to_owned(), 1));
    assert_eq!("two",
               screen.multiple_params_and_return_value("x".to_owned(), 2));
}

#[test]
fn usable_after_a_panicking_callback() {
    let screen = MockScreen::new();
    when(screen.some_value())
        .then(|_| panic!("callback failed"))
        .then_return("recovered".to_owned());
    let s2 = screen.clone();
    let r = thread::spawn(move || s2.some_value()).join();
    assert!(r.is_err());
    let r = panic::catch_unwind(AssertUnwindSafe(|| screen.some_value()));
    assert_eq!(Ok("recovered".to_owned()), r.map_err(|_| ()));
    screen.verify_was_called(times(2)).some_value();
}

/// Two calls answered by the same callback can be inside it at once.
#[test]
fn callbacks_run_concurrently() {
    let screen = MockScreen::new();
    let barrier = Arc::new(Barrier::new(2));
    when(screen.some_value()).then(move |_| {
        barrier.wait();
        vec![ReturnValue::new("met".to_owned())]
    });
    let threads = (0..2).map(|_| {
        let s = screen.clone();
        thread::spawn(move || s.some_value())
    }).collect::<Vec<_>>();
    for t in threads {
        assert_eq!("met", t.join().unwrap());
    }
}
