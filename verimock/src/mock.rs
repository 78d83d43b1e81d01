// vim: tw=80
//! The engine shared by every mock.
//!
//! A generated mock owns one [`GenericMock`] and forwards each of its methods
//! into [`GenericMock::invoke`], passing the method name, the arguments as
//! [`Param`]s and a [`ReturnType`] per return slot.  Its verifier forwards
//! into [`GenericMock::verify`].

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, trace, warn};

use crate::{
    fail::{self, FailHandler, MockError},
    in_order::{Cursor, InOrderContext},
    invocation::{Invocation, InvocationLog},
    matcher::{self, Matcher},
    registry::{self, LastInvocation},
    stubbing::{Answer, OngoingStubbing, StubbingTable},
    value::{self, Literal, Param, ReturnType, ReturnValues},
    verify::{self, Verification},
};

/// How long eventual verification sleeps between checks, by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Construction-time settings of a [`GenericMock`].
#[derive(Clone)]
pub struct MockOptions {
    fail_handler: Option<FailHandler>,
    poll_interval: Duration,
}

impl MockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report this mock's failures to `handler` instead of the global one.
    pub fn fail_handler(mut self, handler: FailHandler) -> Self {
        self.fail_handler = Some(handler);
        self
    }

    /// Polling step of eventual verification.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for MockOptions {
    fn default() -> Self {
        MockOptions {
            fail_handler: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl fmt::Debug for MockOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MockOptions")
            .field("fail_handler", &self.fail_handler.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[derive(Default)]
struct MockState {
    log: InvocationLog,
    stubbings: StubbingTable,
}

pub(crate) struct MockInner {
    state: Mutex<MockState>,
    fail_handler: Mutex<Option<FailHandler>>,
    poll_interval: Duration,
}

/// Result of filtering the log for one verification.
enum Evaluation {
    Counted(Vec<Invocation>),
    /// The earliest matching call happened before the context's cursor.
    OutOfOrder(Cursor),
}

/// The call recorder, answer resolver and verifier behind one mock object.
///
/// Cloning a `GenericMock` yields another handle to the same mock, which is
/// how a mock is shared with threads of the system under test.
#[derive(Clone)]
pub struct GenericMock {
    inner: Arc<MockInner>,
}

impl GenericMock {
    pub fn new() -> Self {
        Self::with_options(MockOptions::default())
    }

    pub fn with_options(options: MockOptions) -> Self {
        let inner = MockInner {
            state: Mutex::new(MockState::default()),
            fail_handler: Mutex::new(options.fail_handler),
            poll_interval: options.poll_interval,
        };
        GenericMock { inner: Arc::new(inner) }
    }

    pub(crate) fn from_weak(weak: &Weak<MockInner>) -> Option<Self> {
        weak.upgrade().map(|inner| GenericMock { inner })
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_fail_handler(&self, handler: FailHandler) {
        *self.inner.fail_handler.lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// This mock's own handler.  `None` means the global handler is used.
    pub fn fail_handler(&self) -> Option<FailHandler> {
        self.inner.fail_handler.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn fail(&self, error: &MockError) {
        fail::report(self.fail_handler(), error)
    }

    /// Every call recorded so far, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().log.snapshot()
    }

    /// Record a call and compute its return values.
    ///
    /// Unstubbed calls return the zero value of every return slot.  A call
    /// made while matchers are pending is part of a `when(..)` expression;
    /// it is recorded but consults no stubbing.
    pub fn invoke(&self, method: &str, params: Vec<Param>,
                  return_types: &[ReturnType]) -> ReturnValues
    {
        let arranging = registry::pending_matchers() > 0;
        let (invocation, answer) = {
            let mut state = self.lock();
            let invocation = state.log.append(method, params);
            let answer = if arranging {
                None
            } else {
                state.stubbings.resolve(method, invocation.params())
            };
            (invocation, answer)
        };
        trace!(method, seq = invocation.seq(), arranging, "recorded invocation");
        let stale = registry::record_last_invocation(LastInvocation {
            mock: Arc::downgrade(&self.inner),
            invocation: invocation.clone(),
            return_types: return_types.to_vec(),
            arranging,
        });
        if stale {
            warn!(method, pending = registry::pending_matchers(),
                  "matchers are pending but no stubbing or verification \
                   consumed them; calls on this thread return zero values");
        }

        let values = match answer {
            None => return ReturnValues::zeros(return_types),
            Some(Answer::Return(literals)) => {
                literals.iter().map(Literal::produce).collect()
            },
            Some(Answer::Panic(raise)) => {
                raise();
                unreachable!("programmed panic returned")
            },
            Some(Answer::Callback(callback)) => callback(invocation.params()),
        };
        value::coerce(values, return_types).unwrap_or_else(|e| {
            self.fail(&e);
            ReturnValues::zeros(return_types)
        })
    }

    /// Turn the arrange-phase call `last` into a stubbing.
    pub(crate) fn stub_invocation(&self, last: LastInvocation)
        -> OngoingStubbing
    {
        let invocation = last.invocation;
        let matchers = match registry::drain_matchers(invocation.params().len())
        {
            Ok(m) if m.is_empty() => matcher::equal_to_all(invocation.params()),
            Ok(m) => m,
            Err(e) => {
                self.lock().log.remove(invocation.seq());
                self.fail(&e);
                return OngoingStubbing::detached();
            }
        };
        self.stub(invocation.method(), matchers, last.return_types,
                  Some(invocation.seq()))
    }

    /// Discard an arrange-phase call that cannot be stubbed.
    pub(crate) fn reject_invocation(&self, last: LastInvocation,
                                    error: &MockError)
    {
        drop(registry::drain_matchers(0));
        self.lock().log.remove(last.invocation.seq());
        self.fail(error);
    }

    /// Start a stubbing from explicit matchers, without the arrange context.
    pub fn stub_with_matchers(&self, method: &str,
                              matchers: Vec<Arc<dyn Matcher>>,
                              return_types: &[ReturnType]) -> OngoingStubbing
    {
        self.stub(method, matchers, return_types.to_vec(), None)
    }

    fn stub(&self, method: &str, matchers: Vec<Arc<dyn Matcher>>,
            return_types: Vec<ReturnType>, arrange_seq: Option<u64>)
        -> OngoingStubbing
    {
        let description = matcher::describe(&matchers);
        let id = {
            let mut state = self.lock();
            if let Some(seq) = arrange_seq {
                state.log.remove(seq);
            }
            state.stubbings.reset(method, matchers, return_types)
        };
        debug!(method, params = %description, "stubbing");
        OngoingStubbing::new(self.clone(), id)
    }

    pub(crate) fn append_answer<F>(&self, id: u64, f: F)
        -> Result<(), MockError>
        where F: FnOnce(&[ReturnType]) -> Result<Answer, MockError>
    {
        let mut state = self.lock();
        match state.stubbings.get_mut(id) {
            Some(stubbing) => {
                let answer = f(stubbing.return_types())?;
                debug!(?answer, "queued answer");
                stubbing.push(answer);
            },
            // Replaced by a later stubbing of the same call
            None => debug!(id, "dropping answer for a replaced stubbing"),
        }
        Ok(())
    }

    /// Check the calls to `method` against `verification`.
    ///
    /// `params` are raw values, or placeholders if every argument position
    /// was written with a matcher.  Returns the qualifying invocations.
    pub fn verify(&self, verification: &Verification<'_>, method: &str,
                  params: Vec<Param>) -> Vec<Invocation>
    {
        match registry::drain_matchers(params.len()) {
            Ok(matchers) if matchers.is_empty() => {
                let description = format!("{:?}", params);
                let matchers = matcher::equal_to_all(&params);
                self.verify_matching(verification, method, &matchers,
                                     description)
            },
            Ok(matchers) => {
                let description = matcher::describe(&matchers);
                self.verify_matching(verification, method, &matchers,
                                     description)
            },
            Err(e) => {
                self.fail(&e);
                Vec::new()
            }
        }
    }

    /// Like [`verify`](#method.verify), but with explicit matchers.
    pub fn verify_with_matchers(&self, verification: &Verification<'_>,
                                method: &str, matchers: &[Arc<dyn Matcher>])
        -> Vec<Invocation>
    {
        let description = matcher::describe(matchers);
        self.verify_matching(verification, method, matchers, description)
    }

    /// Regroup captured arguments by parameter position.
    pub fn get_invocation_params(invocations: &[Invocation])
        -> Vec<Vec<Param>>
    {
        verify::get_invocation_params(invocations)
    }

    fn verify_matching(&self, verification: &Verification<'_>, method: &str,
                       matchers: &[Arc<dyn Matcher>], description: String)
        -> Vec<Invocation>
    {
        let evaluation = match verification.timeout() {
            None => self.evaluate(verification, method, matchers),
            Some(timeout) => {
                self.poll(verification, method, matchers, timeout)
            }
        };
        let expected = verification.times();
        match evaluation {
            Evaluation::OutOfOrder(previous) => {
                self.fail(&MockError::OutOfOrder {
                    method: method.to_owned(),
                    params: description,
                    previous_method: previous.method,
                    previous_params: previous.params,
                });
                Vec::new()
            },
            Evaluation::Counted(invocations)
                if expected.matches(invocations.len()) =>
            {
                debug!(method, params = %description,
                       count = invocations.len(), "verified");
                if let (Some(ctx), Some(last)) =
                    (verification.in_order_context(), invocations.last())
                {
                    ctx.advance(last.seq(), method, &description);
                }
                invocations
            },
            Evaluation::Counted(invocations) => {
                let error = match verification.timeout() {
                    Some(timeout) => MockError::EventuallyTimedOut {
                        method: method.to_owned(),
                        params: description,
                        expected,
                        actual: invocations.len(),
                        timeout,
                    },
                    None => MockError::CountMismatch {
                        method: method.to_owned(),
                        params: description,
                        expected,
                        actual: invocations.len(),
                        detail: self.explain_mismatch(method, matchers),
                    },
                };
                self.fail(&error);
                invocations
            }
        }
    }

    fn evaluate(&self, verification: &Verification<'_>, method: &str,
                matchers: &[Arc<dyn Matcher>]) -> Evaluation
    {
        let matching: Vec<Invocation> = self.lock().log
            .matching(method, matchers)
            .cloned()
            .collect();
        let previous = verification.in_order_context()
            .and_then(InOrderContext::last_verified);
        match previous {
            Some(prev) if matching.first()
                .map_or(false, |first| first.seq() < prev.seq) =>
            {
                Evaluation::OutOfOrder(prev)
            },
            Some(prev) => Evaluation::Counted(matching.into_iter()
                .filter(|i| i.seq() > prev.seq)
                .collect()),
            None => Evaluation::Counted(matching),
        }
    }

    /// Re-evaluate until the count is satisfied or `timeout` elapses.  The
    /// last evaluation happens at or after the deadline.
    fn poll(&self, verification: &Verification<'_>, method: &str,
            matchers: &[Arc<dyn Matcher>], timeout: Duration) -> Evaluation
    {
        // A timeout too large to represent means no deadline at all
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let evaluation = self.evaluate(verification, method, matchers);
            let done = match &evaluation {
                Evaluation::OutOfOrder(_) => true,
                Evaluation::Counted(i) => verification.times().matches(i.len()),
            };
            if done {
                return evaluation;
            }
            let now = Instant::now();
            let step = match deadline {
                Some(deadline) if now >= deadline => return evaluation,
                Some(deadline) => self.inner.poll_interval.min(deadline - now),
                None => self.inner.poll_interval,
            };
            trace!(method, "waiting for invocations");
            thread::sleep(step);
        }
    }

    /// Describe why the latest call to `method` did not match, for matchers
    /// that can explain themselves.
    fn explain_mismatch(&self, method: &str, matchers: &[Arc<dyn Matcher>])
        -> String
    {
        let Some(last) = self.lock().log.last_named(method).cloned() else {
            return String::new();
        };
        let reasons = matchers.iter()
            .zip(last.params())
            .filter(|(m, p)| !m.matches(p))
            .filter_map(|(m, p)| m.explain(p))
            .collect::<Vec<_>>();
        if reasons.is_empty() {
            String::new()
        } else {
            format!("\n\nClosest call {:?} did not match:\n{}",
                    last.params(), reasons.join("\n"))
        }
    }
}

impl Default for GenericMock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GenericMock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GenericMock")
            .field("invocations", &self.lock().log.snapshot())
            .finish()
    }
}
