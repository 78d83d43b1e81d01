// vim: tw=80
//! Recorded calls.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{matcher::{self, Matcher}, value::Param};

/// Shared by every mock, so that calls on different mocks can be ordered.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1
}

/// One real call to a mock method.
#[derive(Clone)]
pub struct Invocation {
    method: String,
    params: Vec<Param>,
    seq: u64,
}

impl Invocation {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Position of this call among all calls to all mocks.  Strictly
    /// increasing in call order.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{} {}{:?}", self.seq, self.method, self.params)
    }
}

/// Append-only record of the calls made to one mock.
#[derive(Default)]
pub(crate) struct InvocationLog(Vec<Invocation>);

impl InvocationLog {
    /// Record a call.  The caller must hold the mock's lock, so that log
    /// order and sequence order agree.
    pub fn append(&mut self, method: &str, params: Vec<Param>) -> Invocation {
        let invocation = Invocation {
            method: method.to_owned(),
            params,
            seq: next_sequence(),
        };
        self.0.push(invocation.clone());
        invocation
    }

    /// Forget an arrange-phase call that turned out to be a stubbing.
    pub fn remove(&mut self, seq: u64) {
        self.0.retain(|i| i.seq != seq);
    }

    /// Calls to `method` whose arguments satisfy every matcher, oldest first.
    pub fn matching<'a>(&'a self, method: &'a str,
                        matchers: &'a [Arc<dyn Matcher>])
        -> impl Iterator<Item=&'a Invocation> + 'a
    {
        self.0.iter()
            .filter(move |i| i.method == method &&
                    matcher::args_match(matchers, &i.params))
    }

    /// The most recent call to `method`, regardless of its arguments.
    pub fn last_named(&self, method: &str) -> Option<&Invocation> {
        self.0.iter().rev().find(|i| i.method == method)
    }

    pub fn snapshot(&self) -> Vec<Invocation> {
        self.0.clone()
    }
}
