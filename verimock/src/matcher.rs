// vim: tw=80
//! Argument matchers.
//!
//! A [`Matcher`] is a predicate over one argument plus a label used in
//! failure messages.  The free functions in this module ([`eq`], [`any`],
//! [`arg_that`], ...) are meant to be written in argument position of a mock
//! call.  Each registers its matcher with the arrange context and returns a
//! placeholder value of the argument's type.
//!
//! # Examples
//! ```
//! # use verimock::*;
//! let m = GenericMock::new();
//! m.invoke("flash", params!["Hello".to_owned(), 333], &[]);
//!
//! // What a generated verifier does for `flash(any(), eq(333))`
//! let args = params![any::<String>(), eq(333)];
//! let calls = m.verify(&Verification::once(), "flash", args);
//! assert_eq!(1, calls.len());
//! ```

use downcast::*;
use predicates::prelude::{predicate, Predicate};
use predicates_tree::CaseTreeExt;
use std::{
    any::{self, TypeId},
    marker::PhantomData,
    sync::Arc,
};

use crate::{registry, value::{ArgValue, Param}};

/// A predicate over a single argument value.
pub trait Matcher: Any + Send + Sync {
    fn matches(&self, param: &Param) -> bool;

    /// Short human-readable description, like `Eq(5)`.
    fn label(&self) -> String;

    /// Does `other` select exactly the same arguments?  Stubbings whose
    /// matchers are all the same replace each other.
    fn same_as(&self, _other: &dyn Matcher) -> bool {
        false
    }

    /// Explain why `param` does not match, if the matcher can.
    fn explain(&self, _param: &Param) -> Option<String> {
        None
    }
}

downcast!(dyn Matcher);

/// Matches arguments equal to a value.  Arguments of a different type never
/// match.
#[derive(Debug)]
pub struct EqMatcher {
    value: Param,
}

impl EqMatcher {
    pub fn new<T: ArgValue>(value: T) -> Self {
        EqMatcher { value: Param::new(value) }
    }

    pub(crate) fn from_param(value: Param) -> Self {
        EqMatcher { value }
    }
}

impl Matcher for EqMatcher {
    fn matches(&self, param: &Param) -> bool {
        *param == self.value
    }

    fn label(&self) -> String {
        format!("Eq({:?})", self.value)
    }

    fn same_as(&self, other: &dyn Matcher) -> bool {
        other.downcast_ref::<EqMatcher>()
            .map_or(false, |other| other.value == self.value)
    }
}

/// Matches arguments of the right type that differ from a value.
#[derive(Debug)]
pub struct NotEqMatcher {
    value: Param,
}

impl NotEqMatcher {
    pub fn new<T: ArgValue>(value: T) -> Self {
        NotEqMatcher { value: Param::new(value) }
    }
}

impl Matcher for NotEqMatcher {
    fn matches(&self, param: &Param) -> bool {
        param.type_id() == self.value.type_id() && *param != self.value
    }

    fn label(&self) -> String {
        format!("NotEq({:?})", self.value)
    }

    fn same_as(&self, other: &dyn Matcher) -> bool {
        other.downcast_ref::<NotEqMatcher>()
            .map_or(false, |other| other.value == self.value)
    }
}

/// Matches every value of one type, including its "nil" values.
#[derive(Clone, Copy, Debug)]
pub struct AnyMatcher {
    type_id: TypeId,
    type_name: &'static str,
}

impl AnyMatcher {
    pub fn of<T: ArgValue>() -> Self {
        AnyMatcher {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
        }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, param: &Param) -> bool {
        param.type_id() == self.type_id
    }

    fn label(&self) -> String {
        format!("Any({})", self.type_name)
    }

    fn same_as(&self, other: &dyn Matcher) -> bool {
        other.downcast_ref::<AnyMatcher>()
            .map_or(false, |other| other.type_id == self.type_id)
    }
}

/// Matches with a caller-supplied [`Predicate`].
pub struct PredicateMatcher<T, P> {
    predicate: P,
    _t: PhantomData<fn(&T)>,
}

impl<T, P> PredicateMatcher<T, P>
    where T: ArgValue, P: Predicate<T> + Send + Sync + 'static
{
    pub fn new(predicate: P) -> Self {
        PredicateMatcher { predicate, _t: PhantomData }
    }
}

impl<T, P> Matcher for PredicateMatcher<T, P>
    where T: ArgValue, P: Predicate<T> + Send + Sync + 'static
{
    fn matches(&self, param: &Param) -> bool {
        param.downcast_ref::<T>()
            .map_or(false, |v| self.predicate.eval(v))
    }

    fn label(&self) -> String {
        format!("ArgThat({})", self.predicate)
    }

    fn explain(&self, param: &Param) -> Option<String> {
        let value = param.downcast_ref::<T>()?;
        self.predicate.find_case(false, value)
            .map(|case| case.tree().to_string())
    }
}

/// Does every matcher accept its argument?
pub(crate) fn args_match(matchers: &[Arc<dyn Matcher>], params: &[Param])
    -> bool
{
    matchers.len() == params.len() &&
        matchers.iter().zip(params).all(|(m, p)| m.matches(p))
}

pub(crate) fn same_matchers(a: &[Arc<dyn Matcher>], b: &[Arc<dyn Matcher>])
    -> bool
{
    a.len() == b.len() &&
        a.iter().zip(b).all(|(x, y)| x.same_as(&**y))
}

/// The implicit matchers of a call made with raw values.
pub(crate) fn equal_to_all(params: &[Param]) -> Vec<Arc<dyn Matcher>> {
    params.iter()
        .cloned()
        .map(|p| Arc::new(EqMatcher::from_param(p)) as Arc<dyn Matcher>)
        .collect()
}

pub(crate) fn describe(matchers: &[Arc<dyn Matcher>]) -> String {
    let labels = matchers.iter()
        .map(|m| m.label())
        .collect::<Vec<_>>();
    format!("[{}]", labels.join(", "))
}

/// Match an argument equal to `value`.
pub fn eq<T: ArgValue + Default>(value: T) -> T {
    registry::register_matcher(EqMatcher::new(value));
    T::default()
}

/// Match an argument of type `T` that is not equal to `value`.
pub fn not_eq<T: ArgValue + Default>(value: T) -> T {
    registry::register_matcher(NotEqMatcher::new(value));
    T::default()
}

/// Match any argument of type `T`.
pub fn any<T: ArgValue + Default>() -> T {
    registry::register_matcher(AnyMatcher::of::<T>());
    T::default()
}

/// Match arguments accepted by a [`Predicate`], such as
/// `arg_that(predicate::gt(3))`.
pub fn arg_that<T, P>(predicate: P) -> T
    where T: ArgValue + Default, P: Predicate<T> + Send + Sync + 'static
{
    registry::register_matcher(PredicateMatcher::new(predicate));
    T::default()
}

/// Match arguments for which `f` returns true.
pub fn arg_where<T, F>(f: F) -> T
    where T: ArgValue + Default, F: Fn(&T) -> bool + Send + Sync + 'static
{
    arg_that(predicate::function(f))
}
