// vim: tw=80
//! Type-erased argument and return values.
//!
//! Every generated mock method forwards into one shared engine, so its
//! arguments travel as a uniform list of [`Param`]s and its return slots are
//! described by [`ReturnType`]s.  Programmed answers are checked against those
//! descriptors before they ever reach a typed return slot.

use downcast::*;
use std::{
    any::{self, TypeId},
    collections::{BTreeMap, HashMap},
    fmt,
    hash::BuildHasher,
    sync::Arc,
};

use crate::fail::MockError;

/// Object-safe view of one argument of a mocked method.
///
/// This is implemented for every `'static` type that is `Debug`, `PartialEq`,
/// `Send` and `Sync`, so generated code never needs to implement it by hand.
pub trait ArgValue: Any + fmt::Debug + Send + Sync {
    /// Type-aware equality.  Values of different types are never equal.
    fn eq_value(&self, other: &dyn ArgValue) -> bool;

    /// `TypeId` of the concrete value.
    fn value_type_id(&self) -> TypeId;

    /// Name of the concrete type, for diagnostics.
    fn value_type_name(&self) -> &'static str;
}

downcast!(dyn ArgValue);

impl<T> ArgValue for T
    where T: Any + fmt::Debug + PartialEq + Send + Sync
{
    fn eq_value(&self, other: &dyn ArgValue) -> bool {
        other.downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// One concrete argument of a recorded call.
///
/// Cloning a `Param` is cheap; the value itself is shared.
#[derive(Clone)]
pub struct Param(Arc<dyn ArgValue>);

impl Param {
    pub fn new<T: ArgValue>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Borrow the value as a `T`, if that is its type.
    pub fn downcast_ref<T: ArgValue>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>().ok()
    }

    pub fn is<T: ArgValue>(&self) -> bool {
        self.0.value_type_id() == TypeId::of::<T>()
    }

    pub fn type_id(&self) -> TypeId {
        self.0.value_type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.value_type_name()
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_value(&*other.0)
    }
}

/// Build the argument list of a mocked call.
///
/// # Examples
/// ```
/// # use verimock::*;
/// let args: Vec<Param> = params!["Hello".to_owned(), 333];
/// assert_eq!(2, args.len());
/// assert_eq!(Some(&333), args[1].downcast_ref::<i32>());
/// ```
#[macro_export]
macro_rules! params {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::Param::new($arg)),*]
    };
}

/// Types whose zero value plays the role of "nil".
///
/// Only return slots of these types accept a [`Literal::nil`] answer.
pub trait Nullable: Sized {
    fn null() -> Self;
}

impl<T> Nullable for Option<T> {
    fn null() -> Self {
        None
    }
}

impl<T> Nullable for Vec<T> {
    fn null() -> Self {
        Vec::new()
    }
}

impl<K, V, S: BuildHasher + Default> Nullable for HashMap<K, V, S> {
    fn null() -> Self {
        HashMap::default()
    }
}

impl<K, V> Nullable for BTreeMap<K, V> {
    fn null() -> Self {
        BTreeMap::new()
    }
}

/// An error-shaped return slot: nil means "no error".
impl<E> Nullable for Result<(), E> {
    fn null() -> Self {
        Ok(())
    }
}

type Erased = Box<dyn any::Any + Send>;

fn zero_of<T: Default + Send + 'static>() -> Erased {
    Box::new(T::default())
}

fn null_of<T: Nullable + Send + 'static>() -> Erased {
    Box::new(T::null())
}

/// Describes one declared return slot of a mocked method.
#[derive(Clone, Copy)]
pub struct ReturnType {
    type_id: TypeId,
    name: &'static str,
    zero: fn() -> Erased,
    nilable: bool,
}

impl ReturnType {
    /// A slot that does not accept nil.  Its zero value is `T::default()`.
    pub fn of<T: Default + Send + 'static>() -> Self {
        ReturnType {
            type_id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            zero: zero_of::<T>,
            nilable: false,
        }
    }

    /// A pointer-, collection-, interface- or error-shaped slot.  Nil is
    /// accepted and becomes `T::null()`, which is also the zero value.
    pub fn nilable<T: Nullable + Send + 'static>() -> Self {
        ReturnType {
            type_id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            zero: null_of::<T>,
            nilable: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_nilable(&self) -> bool {
        self.nilable
    }

    pub(crate) fn zero(&self) -> Erased {
        (self.zero)()
    }

    /// Can a value of the given dynamic type (`None` for nil) fill this slot?
    pub(crate) fn check(&self, found: Option<(TypeId, &'static str)>)
        -> Result<(), MockError>
    {
        match found {
            None if self.nilable => Ok(()),
            None => Err(MockError::NilNotAssignable {
                return_type: self.name
            }),
            Some((id, _)) if id == self.type_id => Ok(()),
            Some((_, name)) => Err(MockError::TypeMismatch {
                value_type: name,
                return_type: self.name
            }),
        }
    }
}

impl fmt::Debug for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ReturnType")
            .field("name", &self.name)
            .field("nilable", &self.nilable)
            .finish()
    }
}

/// A value produced for one return slot, typically by a `then` callback.
pub struct ReturnValue(Option<(Erased, TypeId, &'static str)>);

impl ReturnValue {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        ReturnValue(Some((Box::new(value), TypeId::of::<T>(),
                          any::type_name::<T>())))
    }

    pub fn nil() -> Self {
        ReturnValue(None)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }

    fn coerce(self, ty: &ReturnType) -> Result<Erased, MockError> {
        match self.0 {
            None => ty.check(None).map(|_| ty.zero()),
            Some((value, id, name)) => {
                ty.check(Some((id, name)))?;
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0 {
            None => f.write_str("nil"),
            Some((_, _, name)) => write!(f, "<{}>", name),
        }
    }
}

trait Produce: Send + Sync {
    fn produce(&self) -> ReturnValue;
}

struct Cloned<T>(T);

impl<T: Clone + Send + Sync + 'static> Produce for Cloned<T> {
    fn produce(&self) -> ReturnValue {
        ReturnValue::new(self.0.clone())
    }
}

/// A programmed return value.  It is cloned every time it is returned, so a
/// saturated answer queue can hand it out indefinitely.
#[derive(Clone)]
pub struct Literal {
    value: Option<Arc<dyn Produce>>,
    ty: Option<(TypeId, &'static str)>,
}

impl Literal {
    pub fn new<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Literal {
            value: Some(Arc::new(Cloned(value))),
            ty: Some((TypeId::of::<T>(), any::type_name::<T>())),
        }
    }

    pub fn nil() -> Self {
        Literal { value: None, ty: None }
    }

    pub(crate) fn check(&self, ty: &ReturnType) -> Result<(), MockError> {
        ty.check(self.ty)
    }

    pub(crate) fn produce(&self) -> ReturnValue {
        match &self.value {
            Some(p) => p.produce(),
            None => ReturnValue::nil(),
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.ty {
            None => f.write_str("nil"),
            Some((_, name)) => write!(f, "<{}>", name),
        }
    }
}

/// Check the number of return values against the declared slots.
pub(crate) fn check_arity(found: usize, types: &[ReturnType])
    -> Result<(), MockError>
{
    if found == types.len() {
        Ok(())
    } else {
        Err(MockError::ReturnArity { expected: types.len(), actual: found })
    }
}

/// Coerce produced values into their declared slots, turning nil into each
/// slot's null value.
pub(crate) fn coerce(values: Vec<ReturnValue>, types: &[ReturnType])
    -> Result<ReturnValues, MockError>
{
    check_arity(values.len(), types)?;
    values.into_iter()
        .zip(types)
        .map(|(v, ty)| v.coerce(ty).map(Some))
        .collect::<Result<Vec<_>, _>>()
        .map(ReturnValues)
}

/// The resolved, correctly typed return values of one mocked call.
#[derive(Default)]
pub struct ReturnValues(Vec<Option<Erased>>);

impl ReturnValues {
    pub(crate) fn zeros(types: &[ReturnType]) -> Self {
        ReturnValues(types.iter().map(|ty| Some(ty.zero())).collect())
    }

    /// Move the value of slot `index` out as a `T`.
    ///
    /// # Panics
    ///
    /// If the slot was already taken, or if `T` is not the type the slot
    /// was declared with.  Both indicate a bug in the calling mock.
    pub fn take<T: 'static>(&mut self, index: usize) -> T {
        let value = self.0.get_mut(index)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("No return value in slot {}", index));
        match value.downcast::<T>() {
            Ok(v) => *v,
            Err(_) => panic!("Return slot {} does not hold a {}", index,
                             any::type_name::<T>()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ReturnValues {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReturnValues({} slots)", self.0.len())
    }
}
