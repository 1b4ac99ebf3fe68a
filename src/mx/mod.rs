pub mod function;
pub mod observer;
pub mod ops;
mod workspace;

pub use workspace::*;

use crate::mx::ops::{AnyMxOp, Constant, MxOp, Reshape, Symbolic, Transpose};
use crate::sparsity::Sparsity;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::rc::Rc;
use std::slice::Iter;

/// Shared handle to a node of a matrix expression graph.
///
/// Nodes are immutable once created. Cloning the handle shares the node, and
/// [`Mx::is_same`] compares node identity.
#[derive(Clone)]
pub struct Mx(Rc<AnyMxOp>);

impl Mx {
    pub fn from_op(op: AnyMxOp) -> Self {
        Self(Rc::new(op))
    }

    pub fn sym(name: &str, sparsity: Sparsity) -> Self {
        Symbolic::create(name, sparsity)
    }

    pub fn constant(values: impl Into<Rc<[f64]>>, sparsity: Sparsity) -> Self {
        Constant::create(values, sparsity)
    }

    pub fn zeros(sparsity: Sparsity) -> Self {
        Constant::zeros(sparsity)
    }

    pub fn op(&self) -> &AnyMxOp {
        &self.0
    }

    pub fn sparsity(&self) -> &Sparsity {
        self.0.sparsity()
    }

    pub fn nnz(&self) -> usize {
        self.sparsity().nnz()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.sparsity().shape()
    }

    pub fn n_dep(&self) -> usize {
        self.0.dependencies().len()
    }

    pub fn dep(&self, i: usize) -> &Mx {
        &self.0.dependencies()[i]
    }

    /// Name of a free symbol, `None` for every other node kind.
    pub fn name(&self) -> Option<&str> {
        match self.op() {
            AnyMxOp::Symbolic(x) => Some(x.name()),
            _ => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self.op(), AnyMxOp::Symbolic(_))
    }

    pub fn is_zero(&self) -> bool {
        match self.op() {
            AnyMxOp::Constant(x) => x.is_zero(),
            _ => false,
        }
    }

    pub fn is_same(&self, other: &Mx) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the node, stable for as long as any handle to it is alive.
    pub fn key(&self) -> *const AnyMxOp {
        Rc::as_ptr(&self.0)
    }

    /// Same nonzeros under a new pattern.
    pub fn reshape(&self, sparsity: &Sparsity) -> Mx {
        if sparsity == self.sparsity() {
            return self.clone();
        }
        assert!(
            sparsity.is_reshape(self.sparsity()),
            "Cannot reshape {} into {}: nonzeros do not keep their linear positions",
            self.sparsity(),
            sparsity
        );
        self.0
            .get_reshape(sparsity)
            .unwrap_or_else(|| Reshape::create(self, sparsity.clone()))
    }

    pub fn reshape_to(&self, nrow: usize, ncol: usize) -> Mx {
        self.reshape(&self.sparsity().reshape(nrow, ncol))
    }

    /// Stack the columns into a single column.
    pub fn vec(&self) -> Mx {
        self.reshape_to(self.sparsity().numel(), 1)
    }

    pub fn transpose(&self) -> Mx {
        if let Some(x) = self.0.get_transpose() {
            return x;
        }
        let sparsity = self.sparsity();
        if sparsity.is_scalar() {
            self.clone()
        } else if sparsity.is_vector(true) {
            self.reshape(&sparsity.transpose())
        } else {
            Transpose::create(self)
        }
    }

    pub fn is_valid_input(&self) -> bool {
        self.0.is_valid_input()
    }

    pub fn n_primitives(&self) -> usize {
        self.0.n_primitives()
    }

    /// Free symbols this input expression is built from, in order.
    pub fn primitives(&self) -> Vec<Mx> {
        let mut out = Vec::with_capacity(self.n_primitives());
        self.collect_primitives(&mut out);
        out
    }

    pub fn collect_primitives(&self, out: &mut Vec<Mx>) {
        self.0.get_primitives(self, out);
    }

    /// Decompose `x`, shaped like this input expression, into one expression per primitive.
    pub fn split_primitives(&self, x: &Mx) -> Vec<Mx> {
        let mut out = Vec::with_capacity(self.n_primitives());
        self.split_primitives_into(x, &mut out);
        out
    }

    pub fn split_primitives_into(&self, x: &Mx, out: &mut Vec<Mx>) {
        self.0.split_primitives(x, out);
    }

    /// Inverse of [`Mx::split_primitives`], consuming one expression per primitive.
    pub fn join_primitives(&self, it: &mut Iter<'_, Mx>) -> Mx {
        self.0.join_primitives(it)
    }

    pub fn has_duplicates(&self) -> bool {
        self.0.has_duplicates()
    }

    pub fn reset_input(&self) {
        self.0.reset_input();
    }
}

impl fmt::Display for Mx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deps = self.0.dependencies();
        for (i, dep) in deps.iter().enumerate() {
            self.0.print_part(f, i)?;
            write!(f, "{dep}")?;
        }
        self.0.print_part(f, deps.len())
    }
}

impl fmt::Debug for Mx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mx({self})")
    }
}

impl Add<&Mx> for &Mx {
    type Output = Mx;

    fn add(self, rhs: &Mx) -> Mx {
        assert_eq!(
            self.sparsity(),
            rhs.sparsity(),
            "Cannot add {} and {}: sparsity differs",
            self.sparsity(),
            rhs.sparsity()
        );
        if self.is_zero() {
            rhs.clone()
        } else if rhs.is_zero() {
            self.clone()
        } else {
            ops::Addition::create(self, rhs)
        }
    }
}

impl Add for Mx {
    type Output = Mx;

    fn add(self, rhs: Mx) -> Mx {
        &self + &rhs
    }
}

impl AddAssign for Mx {
    fn add_assign(&mut self, rhs: Mx) {
        *self = &*self + &rhs;
    }
}
