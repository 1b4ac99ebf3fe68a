use std::fmt::Debug;
use std::ops::Add;

/// Element type a graph can be evaluated over: plain floats or symbolic scalars.
///
/// Structural nodes only move elements around, so `Clone` is all they need; `Add`
/// and `from_f64` are for the sum and constant kinds.
pub trait EvalScalar: Clone + Debug + Add<Output = Self> {
    fn from_f64(value: f64) -> Self;
}

impl<T> EvalScalar for T
where
    T: num_traits::Float + Debug,
{
    fn from_f64(value: f64) -> Self {
        <T as num_traits::NumCast>::from(value).unwrap_or_else(T::nan)
    }
}
