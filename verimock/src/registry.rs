// vim: tw=80
//! The arrange context: a thread-confined side channel between matcher
//! expressions, mock calls and the `when`/verify call that follows them.
//!
//! Argument positions of a mocked method are strongly typed, so an
//! expression like `any::<i32>()` cannot tell the engine "this position is a
//! pattern" through its value.  Instead it records its matcher here and
//! returns a placeholder.  The next stubbing or verification drains the
//! buffer.  Likewise every mock call remembers itself as the last invocation,
//! which is how `when(mock.method(..))` learns which call it is stubbing.
//!
//! The context is per thread.  It is meant for single-threaded arrange
//! phases; each test thread gets its own.

use std::{
    cell::RefCell,
    mem,
    sync::{Arc, Weak},
};

use crate::{
    fail::MockError,
    invocation::Invocation,
    matcher::Matcher,
    mock::MockInner,
    value::ReturnType,
};

/// The most recent call to any mock on this thread.
pub(crate) struct LastInvocation {
    pub mock: Weak<MockInner>,
    pub invocation: Invocation,
    pub return_types: Vec<ReturnType>,
    /// Was the call made while matchers were pending?
    pub arranging: bool,
}

#[derive(Default)]
struct ArrangeContext {
    matchers: Vec<Arc<dyn Matcher>>,
    last_invocation: Option<LastInvocation>,
}

thread_local! {
    static ARRANGE: RefCell<ArrangeContext> =
        RefCell::new(ArrangeContext::default());
}

/// Record a matcher for the next argument position.
pub fn register_matcher<M: Matcher>(matcher: M) {
    let matcher: Arc<dyn Matcher> = Arc::new(matcher);
    ARRANGE.with(|ctx| ctx.borrow_mut().matchers.push(matcher));
}

/// Take every pending matcher.
///
/// Returns either no matchers, meaning the call used raw values, or exactly
/// `expected_arity` of them.  Any other count means matchers and raw values
/// were mixed.  The buffer is empty afterwards either way.
pub fn drain_matchers(expected_arity: usize)
    -> Result<Vec<Arc<dyn Matcher>>, MockError>
{
    let matchers = ARRANGE.with(|ctx| mem::take(&mut ctx.borrow_mut().matchers));
    if matchers.is_empty() || matchers.len() == expected_arity {
        Ok(matchers)
    } else {
        Err(MockError::MixedMatchers {
            expected: expected_arity,
            recorded: matchers.len()
        })
    }
}

/// How many matchers are waiting to be drained.
pub fn pending_matchers() -> usize {
    ARRANGE.with(|ctx| ctx.borrow().matchers.len())
}

/// Remember `last` for the next `when`.
///
/// Returns true if both `last` and the call it replaces were made while
/// matchers were pending.  Nothing consumed the earlier one, so the pending
/// matchers are most likely stray.
pub(crate) fn record_last_invocation(last: LastInvocation) -> bool {
    let arranging = last.arranging;
    let previous = ARRANGE.with(|ctx| {
        ctx.borrow_mut().last_invocation.replace(last)
    });
    arranging && previous.map_or(false, |p| p.arranging)
}

pub(crate) fn take_last_invocation() -> Option<LastInvocation> {
    ARRANGE.with(|ctx| ctx.borrow_mut().last_invocation.take())
}
