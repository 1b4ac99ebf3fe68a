use crate::scalar::EvalScalar;
use std::fmt;
use std::ops::Add;
use std::rc::Rc;

#[derive(Debug, PartialEq)]
enum SxNode {
    Constant(f64),
    Symbol(String),
    Sum(SxElem, SxElem),
}

/// Scalar symbolic expression, shared and immutable.
///
/// Only the operations the graph evaluator needs are supported: constants,
/// named symbols and sums.
#[derive(Debug, Clone, PartialEq)]
pub struct SxElem(Rc<SxNode>);

impl SxElem {
    pub fn sym(name: &str) -> Self {
        Self(Rc::new(SxNode::Symbol(name.to_string())))
    }

    /// `n` symbols named `{prefix}_0` .. `{prefix}_{n-1}`.
    pub fn sym_vector(prefix: &str, n: usize) -> Vec<Self> {
        (0..n).map(|i| Self::sym(&format!("{prefix}_{i}"))).collect()
    }

    pub fn constant(value: f64) -> Self {
        Self(Rc::new(SxNode::Constant(value)))
    }

    pub fn is_zero(&self) -> bool {
        matches!(*self.0, SxNode::Constant(v) if v == 0.0)
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(*self.0, SxNode::Symbol(_))
    }

    pub fn name(&self) -> Option<&str> {
        match &*self.0 {
            SxNode::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match *self.0 {
            SxNode::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// Same node, not just structurally equal.
    pub fn is_same(&self, other: &SxElem) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Add for SxElem {
    type Output = SxElem;

    fn add(self, rhs: SxElem) -> SxElem {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        if let (Some(a), Some(b)) = (self.value(), rhs.value()) {
            return SxElem::constant(a + b);
        }
        SxElem(Rc::new(SxNode::Sum(self, rhs)))
    }
}

impl From<f64> for SxElem {
    fn from(value: f64) -> Self {
        SxElem::constant(value)
    }
}

impl num_traits::Zero for SxElem {
    fn zero() -> Self {
        SxElem::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        SxElem::is_zero(self)
    }
}

impl EvalScalar for SxElem {
    fn from_f64(value: f64) -> Self {
        SxElem::constant(value)
    }
}

impl fmt::Display for SxElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            SxNode::Constant(v) => write!(f, "{v}"),
            SxNode::Symbol(name) => write!(f, "{name}"),
            SxNode::Sum(a, b) => write!(f, "({a}+{b})"),
        }
    }
}
