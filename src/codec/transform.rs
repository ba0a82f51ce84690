//! Write-time element transforms for collections.
//!
//! A transform looks at one element and either keeps it, replaces it, or
//! omits it from the encoded output. Transforms run in order; an omitted
//! element is not shown to later transforms.

use crate::error::BoxError;

/// The outcome of applying a [`Transform`] to one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step<T> {
    /// Pass the element on unchanged.
    Keep,
    /// Continue with this value in place of the element.
    Replace(T),
    /// Drop the element from the output.
    Omit,
}

/// A per-element mapping/filter applied while encoding a collection.
///
/// Any `Fn(&T) -> Result<Step<T>, BoxError>` is a transform. [`filter`] and
/// [`map`] cover the infallible cases.
pub trait Transform<T> {
    /// Decide what happens to `item`.
    ///
    /// # Errors
    /// An error aborts the encode; nothing is written.
    fn apply(&self, item: &T) -> Result<Step<T>, BoxError>;
}

impl<T, F> Transform<T> for F
where
    F: Fn(&T) -> Result<Step<T>, BoxError>,
{
    fn apply(&self, item: &T) -> Result<Step<T>, BoxError> {
        self(item)
    }
}

/// Keep elements for which `pred` returns `true`; omit the rest.
pub fn filter<T>(pred: impl Fn(&T) -> bool) -> impl Transform<T> {
    move |item: &T| -> Result<Step<T>, BoxError> {
        Ok(if pred(item) { Step::Keep } else { Step::Omit })
    }
}

/// Replace every element with `f(element)`.
pub fn map<T>(f: impl Fn(&T) -> T) -> impl Transform<T> {
    move |item: &T| -> Result<Step<T>, BoxError> { Ok(Step::Replace(f(item))) }
}
