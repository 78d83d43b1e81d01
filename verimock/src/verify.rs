// vim: tw=80
//! Verification settings and argument capture.

use std::{any, time::Duration};

use crate::{
    in_order::InOrderContext,
    invocation::Invocation,
    times::Times,
    value::{ArgValue, Param},
};

/// How a verification is performed: the required call count, an optional
/// ordering context and an optional time to wait for the calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct Verification<'a> {
    times: Times,
    in_order: Option<&'a InOrderContext>,
    timeout: Option<Duration>,
}

impl<'a> Verification<'a> {
    pub fn new(times: Times) -> Self {
        Verification { times, in_order: None, timeout: None }
    }

    /// Exactly one call, in any order, right now.
    pub fn once() -> Self {
        Self::default()
    }

    /// Check `times` and also that the calls came after everything verified
    /// so far through `ctx`.
    pub fn in_order(times: Times, ctx: &'a InOrderContext) -> Self {
        Self::new(times).with_in_order(ctx)
    }

    /// Keep checking until `times` is satisfied or `timeout` elapses.
    pub fn eventually(times: Times, timeout: Duration) -> Self {
        Self::new(times).with_timeout(timeout)
    }

    pub fn with_in_order(mut self, ctx: &'a InOrderContext) -> Self {
        self.in_order = Some(ctx);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn times(&self) -> Times {
        self.times
    }

    pub fn in_order_context(&self) -> Option<&'a InOrderContext> {
        self.in_order
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Regroup the arguments of `invocations` by parameter position.
///
/// Element `i` of the result holds the `i`th argument of every invocation,
/// in call order.
pub fn get_invocation_params(invocations: &[Invocation]) -> Vec<Vec<Param>> {
    let arity = invocations.iter()
        .map(|i| i.params().len())
        .max()
        .unwrap_or(0);
    (0..arity).map(|pos| {
        invocations.iter()
            .filter_map(|i| i.params().get(pos).cloned())
            .collect()
    }).collect()
}

/// The invocations that satisfied a verification, for argument capture.
#[derive(Clone, Debug, Default)]
pub struct OngoingVerification {
    invocations: Vec<Invocation>,
}

impl OngoingVerification {
    pub fn new(invocations: Vec<Invocation>) -> Self {
        OngoingVerification { invocations }
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// The argument at `position` of every qualifying call, in call order.
    ///
    /// A slice-typed parameter yields one `Vec` per call.
    ///
    /// # Panics
    ///
    /// If the argument is not a `T`.  That is a bug in the calling mock.
    pub fn all_captured<T: ArgValue + Clone>(&self, position: usize) -> Vec<T>
    {
        get_invocation_params(&self.invocations)
            .get(position)
            .map(|params| {
                params.iter()
                    .map(|p| p.downcast_ref::<T>()
                        .cloned()
                        .unwrap_or_else(|| panic!(
                            "Captured argument {} is a {}, not a {}",
                            position, p.type_name(), any::type_name::<T>())))
                    .collect()
            }).unwrap_or_default()
    }

    /// The argument at `position` of the last qualifying call.
    pub fn captured<T: ArgValue + Clone>(&self, position: usize) -> Option<T> {
        self.all_captured(position).pop()
    }
}
