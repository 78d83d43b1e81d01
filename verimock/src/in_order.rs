// vim: tw=80
//! Ordering of verifications across mocks.

use std::sync::{Mutex, PoisonError};

/// The last call verified through an [`InOrderContext`].
#[derive(Clone, Debug)]
pub(crate) struct Cursor {
    pub seq: u64,
    pub method: String,
    pub params: String,
}

/// A shared cursor that makes successive verifications check call order.
///
/// Pass the same context to every in-order verification, on any number of
/// mocks.  Each successful verification moves the cursor to the last call it
/// matched; a later verification fails if its earliest matching call happened
/// before the cursor.  Calls that are never verified are simply skipped.
///
/// # Examples
/// ```
/// # use verimock::*;
/// let m = GenericMock::new();
/// m.invoke("flash", params![1], &[]);
/// m.invoke("flash", params![2], &[]);
/// m.invoke("flash", params![3], &[]);
///
/// let ctx = InOrderContext::new();
/// m.verify(&Verification::in_order(once(), &ctx), "flash", params![1]);
/// m.verify(&Verification::in_order(once(), &ctx), "flash", params![3]);
/// ```
#[derive(Debug, Default)]
pub struct InOrderContext {
    cursor: Mutex<Option<Cursor>>,
}

impl InOrderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the last verified call, if any.
    pub fn cursor(&self) -> Option<u64> {
        self.last_verified().map(|c| c.seq)
    }

    pub(crate) fn last_verified(&self) -> Option<Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn advance(&self, seq: u64, method: &str, params: &str) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Cursor {
                seq,
                method: method.to_owned(),
                params: params.to_owned(),
            });
    }
}
