// vim: tw=80
//! Programmed answers.
//!
//! A stubbing binds a method name and a list of matchers to a queue of
//! answers.  Each matching call consumes the next answer, except that the
//! last one is never consumed: once the queue is down to one answer, it
//! repeats forever.

use fragile::Fragile;
use std::{
    fmt, panic,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    fail::{self, MockError},
    matcher::{self, Matcher},
    mock::GenericMock,
    registry,
    value::{self, Literal, Param, ReturnType, ReturnValue},
};

/// Computes the return values of a call from its arguments.
///
/// Runs with no engine lock held, so it may call back into its own mock and
/// may run on several threads at once.
pub type Callback = Arc<dyn Fn(&[Param]) -> Vec<ReturnValue> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Answer {
    Return(Vec<Literal>),
    Panic(Arc<dyn Fn() + Send + Sync>),
    Callback(Callback),
}

impl fmt::Debug for Answer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Answer::Return(values) => write!(f, "Return({:?})", values),
            Answer::Panic(_) => f.write_str("Panic"),
            Answer::Callback(_) => f.write_str("Callback"),
        }
    }
}

pub(crate) struct Stubbing {
    id: u64,
    method: String,
    matchers: Vec<Arc<dyn Matcher>>,
    return_types: Vec<ReturnType>,
    answers: Vec<Answer>,
    next: usize,
}

impl Stubbing {
    pub fn return_types(&self) -> &[ReturnType] {
        &self.return_types
    }

    pub fn push(&mut self, answer: Answer) {
        self.answers.push(answer);
    }

    fn next_answer(&mut self) -> Option<Answer> {
        let answer = self.answers.get(self.next)?.clone();
        if self.next + 1 < self.answers.len() {
            self.next += 1;
        }
        Some(answer)
    }
}

/// All stubbings of one mock, oldest first.
#[derive(Default)]
pub(crate) struct StubbingTable {
    stubbings: Vec<Stubbing>,
    next_id: u64,
}

impl StubbingTable {
    /// Start a fresh stubbing, replacing any stubbing of the same method with
    /// the same matchers.
    pub fn reset(&mut self, method: &str, matchers: Vec<Arc<dyn Matcher>>,
                 return_types: Vec<ReturnType>) -> u64
    {
        self.stubbings.retain(|s| {
            !(s.method == method &&
              matcher::same_matchers(&s.matchers, &matchers))
        });
        self.next_id += 1;
        self.stubbings.push(Stubbing {
            id: self.next_id,
            method: method.to_owned(),
            matchers,
            return_types,
            answers: Vec::new(),
            next: 0,
        });
        self.next_id
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Stubbing> {
        self.stubbings.iter_mut().find(|s| s.id == id)
    }

    /// Pick the answer for a call.  The newest stubbing whose matchers accept
    /// the arguments wins.  `None` means "return zero values".
    pub fn resolve(&mut self, method: &str, params: &[Param])
        -> Option<Answer>
    {
        self.stubbings.iter_mut()
            .rev()
            .find(|s| s.method == method &&
                  matcher::args_match(&s.matchers, params))
            .and_then(Stubbing::next_answer)
    }
}

/// Handle returned by [`when`], used to queue answers.
///
/// # Examples
/// ```
/// # use verimock::*;
/// let m = GenericMock::new();
/// let ty = [ReturnType::of::<String>()];
/// m.stub_with_matchers("some_value", vec![], &ty)
///     .then_return("Hello".to_owned())
///     .then_return("again".to_owned());
///
/// assert_eq!("Hello", m.invoke("some_value", params![], &ty).take::<String>(0));
/// assert_eq!("again", m.invoke("some_value", params![], &ty).take::<String>(0));
/// assert_eq!("again", m.invoke("some_value", params![], &ty).take::<String>(0));
/// ```
#[must_use = "a stubbing without answers returns zero values"]
pub struct OngoingStubbing {
    target: Option<(GenericMock, u64)>,
}

impl OngoingStubbing {
    pub(crate) fn new(mock: GenericMock, id: u64) -> Self {
        OngoingStubbing { target: Some((mock, id)) }
    }

    /// A handle for a stubbing that failed to start.  Answers are dropped.
    pub(crate) fn detached() -> Self {
        OngoingStubbing { target: None }
    }

    fn append<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(&[ReturnType]) -> Result<Answer, MockError>
    {
        if let Some((mock, id)) = &self.target {
            if let Err(e) = mock.append_answer(*id, f) {
                mock.fail(&e);
            }
        }
        self
    }

    /// Return `value` from a method with one return value.
    pub fn then_return<T>(&mut self, value: T) -> &mut Self
        where T: Clone + Send + Sync + 'static
    {
        self.then_return_values(vec![Literal::new(value)])
    }

    /// Return nil from a method with one nilable return value.
    pub fn then_return_nil(&mut self) -> &mut Self {
        self.then_return_values(vec![Literal::nil()])
    }

    /// Return several values, one per declared return slot.  Every value is
    /// checked against its slot right away.
    pub fn then_return_values(&mut self, values: Vec<Literal>) -> &mut Self {
        self.append(move |return_types| {
            value::check_arity(values.len(), return_types)?;
            values.iter()
                .zip(return_types)
                .try_for_each(|(v, ty)| v.check(ty))?;
            Ok(Answer::Return(values))
        })
    }

    /// Make the call panic with `payload`, unmodified.
    pub fn then_panic<P>(&mut self, payload: P) -> &mut Self
        where P: Clone + Send + Sync + 'static
    {
        let raise = move || {
            panic::panic_any(payload.clone());
        };
        self.append(move |_| Ok(Answer::Panic(Arc::new(raise))))
    }

    /// Compute the return values from the call's arguments.
    pub fn then<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&[Param]) -> Vec<ReturnValue> + Send + Sync + 'static
    {
        let callback: Callback = Arc::new(f);
        self.append(move |_| Ok(Answer::Callback(callback)))
    }

    /// Like [`then`](#method.then), but for a callback with mutable state.
    ///
    /// Calls through this answer are serialized.  The callback must not call
    /// the method it answers, or it will deadlock.
    pub fn then_mut<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&[Param]) -> Vec<ReturnValue> + Send + 'static
    {
        let f = Mutex::new(f);
        self.then(move |params| {
            let mut f = f.lock().unwrap_or_else(PoisonError::into_inner);
            (*f)(params)
        })
    }

    /// Single-threaded version of [`then_mut`](#method.then_mut).  Can be
    /// used when the callback isn't `Send`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that set up this answer.
    pub fn then_st<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&[Param]) -> Vec<ReturnValue> + 'static
    {
        let mut fragile = Fragile::new(f);
        self.then_mut(move |params| (fragile.get_mut())(params))
    }
}

impl fmt::Debug for OngoingStubbing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.target {
            Some((_, id)) => write!(f, "OngoingStubbing(#{})", id),
            None => f.write_str("OngoingStubbing(detached)"),
        }
    }
}

/// Stub the mock call that was just made.
///
/// The argument is the result of calling a mock method, with raw values or
/// with matchers in every argument position.  That call is not counted as an
/// invocation.
///
/// Stubbing the same method with the same matchers again replaces the
/// earlier stubbing rather than queueing behind it.
///
/// Methods with no return value must be stubbed with [`when_void`].
pub fn when<R>(_invocation: R) -> OngoingStubbing {
    stub_last_invocation(false)
}

/// Stub a method with no return value.  `trigger` must make exactly the
/// mock call to be stubbed.
///
/// # Examples
/// ```should_panic
/// # use verimock::*;
/// let m = GenericMock::new();
/// when_void(|| { m.invoke("show", params![any::<String>()], &[]); })
///     .then_panic("bla");
/// m.invoke("show", params!["Hello".to_owned()], &[]);
/// ```
pub fn when_void<F: FnOnce()>(trigger: F) -> OngoingStubbing {
    drop(registry::take_last_invocation());
    trigger();
    stub_last_invocation(true)
}

fn stub_last_invocation(void: bool) -> OngoingStubbing {
    let target = registry::take_last_invocation()
        .and_then(|last| {
            let mock = GenericMock::from_weak(&last.mock)?;
            Some((mock, last))
        });
    match target {
        Some((mock, last)) if !void && last.return_types.is_empty() => {
            let method = last.invocation.method().to_owned();
            mock.reject_invocation(last, &MockError::VoidWhen { method });
            OngoingStubbing::detached()
        },
        Some((mock, last)) => mock.stub_invocation(last),
        None => {
            drop(registry::drain_matchers(0));
            fail::report(None, &MockError::NotAMockCall);
            OngoingStubbing::detached()
        }
    }
}
