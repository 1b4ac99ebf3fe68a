mod binary;
mod constant;
mod reshape;
mod symbolic;
mod transpose;

pub use binary::*;
pub use constant::*;
pub use reshape::*;
pub use symbolic::*;
pub use transpose::*;

use crate::codegen::CodeEmitter;
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::fmt;
use std::slice::Iter;

/// Everything a node kind has to answer, for every traversal mode.
///
/// `arg` and `res` are work slot indices handed out by the driver, which also
/// guarantees the slots have the sizes of the dependencies and of the node.
/// Modes that move data forward overwrite `res`; modes that move data backward
/// accumulate into `arg` (sum for adjoints, OR for dependency bits).
pub trait MxOp {
    fn dependencies(&self) -> &[Mx];

    fn sparsity(&self) -> &Sparsity;

    fn get_name(&self) -> String;

    /// Integer scratch the node needs in `eval_gen`, `sp_fwd` and `sp_rev`.
    fn sz_iw(&self) -> usize {
        0
    }

    fn eval_gen<T: EvalScalar>(&self, arg: &[usize], res: &[usize], work: &mut Workspace<T>);

    /// Apply the operation to new symbolic arguments.
    fn eval_mx(&self, arg: &[Mx], res: &mut [Mx]);

    /// `fseed[d][k]` is the tangent of dependency `k` in direction `d`; assigns `fsens[d]`.
    fn eval_fwd(&self, fseed: &[Vec<Mx>], fsens: &mut [Vec<Mx>]);

    /// `aseed[d][0]` is the adjoint of the output in direction `d`; adds into `asens[d][k]`.
    fn eval_adj(&self, aseed: &[Vec<Mx>], asens: &mut [Vec<Mx>]);

    fn sp_fwd(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>);

    fn sp_rev(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>);

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        arg: &[usize],
        res: &[usize],
        emitter: &mut E,
    ) -> fmt::Result;

    /// Text printed before dependency `part`, or after the last one when
    /// `part == dependencies().len()`.
    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result;

    /// Kind specific simplification of a reshape, `None` to create a plain reshape node.
    fn get_reshape(&self, _sparsity: &Sparsity) -> Option<Mx> {
        None
    }

    /// Kind specific simplification of a transpose, `None` for the generic rule.
    fn get_transpose(&self) -> Option<Mx> {
        None
    }

    /// Whether the expression may be used as a function input.
    fn is_valid_input(&self) -> bool {
        false
    }

    fn n_primitives(&self) -> usize {
        panic!("{} cannot be decomposed into primitives", self.get_name())
    }

    fn get_primitives(&self, _this: &Mx, _out: &mut Vec<Mx>) {
        panic!("{} cannot be decomposed into primitives", self.get_name())
    }

    fn split_primitives(&self, _x: &Mx, _out: &mut Vec<Mx>) {
        panic!("{} cannot be decomposed into primitives", self.get_name())
    }

    fn join_primitives(&self, _it: &mut Iter<'_, Mx>) -> Mx {
        panic!("{} cannot be assembled from primitives", self.get_name())
    }

    fn has_duplicates(&self) -> bool {
        false
    }

    fn reset_input(&self) {}
}

#[derive(Debug, Clone)]
pub enum AnyMxOp {
    Symbolic(Symbolic),
    Constant(Constant),
    Reshape(Reshape),
    Transpose(Transpose),
    Addition(Addition),
}

impl MxOp for AnyMxOp {
    fn dependencies(&self) -> &[Mx] {
        match self {
            AnyMxOp::Symbolic(x) => x.dependencies(),
            AnyMxOp::Constant(x) => x.dependencies(),
            AnyMxOp::Reshape(x) => x.dependencies(),
            AnyMxOp::Transpose(x) => x.dependencies(),
            AnyMxOp::Addition(x) => x.dependencies(),
        }
    }

    fn sparsity(&self) -> &Sparsity {
        match self {
            AnyMxOp::Symbolic(x) => x.sparsity(),
            AnyMxOp::Constant(x) => x.sparsity(),
            AnyMxOp::Reshape(x) => x.sparsity(),
            AnyMxOp::Transpose(x) => x.sparsity(),
            AnyMxOp::Addition(x) => x.sparsity(),
        }
    }

    fn get_name(&self) -> String {
        match self {
            AnyMxOp::Symbolic(x) => x.get_name(),
            AnyMxOp::Constant(x) => x.get_name(),
            AnyMxOp::Reshape(x) => x.get_name(),
            AnyMxOp::Transpose(x) => x.get_name(),
            AnyMxOp::Addition(x) => x.get_name(),
        }
    }

    fn sz_iw(&self) -> usize {
        match self {
            AnyMxOp::Symbolic(x) => x.sz_iw(),
            AnyMxOp::Constant(x) => x.sz_iw(),
            AnyMxOp::Reshape(x) => x.sz_iw(),
            AnyMxOp::Transpose(x) => x.sz_iw(),
            AnyMxOp::Addition(x) => x.sz_iw(),
        }
    }

    fn eval_gen<T: EvalScalar>(&self, arg: &[usize], res: &[usize], work: &mut Workspace<T>) {
        match self {
            AnyMxOp::Symbolic(x) => x.eval_gen(arg, res, work),
            AnyMxOp::Constant(x) => x.eval_gen(arg, res, work),
            AnyMxOp::Reshape(x) => x.eval_gen(arg, res, work),
            AnyMxOp::Transpose(x) => x.eval_gen(arg, res, work),
            AnyMxOp::Addition(x) => x.eval_gen(arg, res, work),
        }
    }

    fn eval_mx(&self, arg: &[Mx], res: &mut [Mx]) {
        match self {
            AnyMxOp::Symbolic(x) => x.eval_mx(arg, res),
            AnyMxOp::Constant(x) => x.eval_mx(arg, res),
            AnyMxOp::Reshape(x) => x.eval_mx(arg, res),
            AnyMxOp::Transpose(x) => x.eval_mx(arg, res),
            AnyMxOp::Addition(x) => x.eval_mx(arg, res),
        }
    }

    fn eval_fwd(&self, fseed: &[Vec<Mx>], fsens: &mut [Vec<Mx>]) {
        match self {
            AnyMxOp::Symbolic(x) => x.eval_fwd(fseed, fsens),
            AnyMxOp::Constant(x) => x.eval_fwd(fseed, fsens),
            AnyMxOp::Reshape(x) => x.eval_fwd(fseed, fsens),
            AnyMxOp::Transpose(x) => x.eval_fwd(fseed, fsens),
            AnyMxOp::Addition(x) => x.eval_fwd(fseed, fsens),
        }
    }

    fn eval_adj(&self, aseed: &[Vec<Mx>], asens: &mut [Vec<Mx>]) {
        match self {
            AnyMxOp::Symbolic(x) => x.eval_adj(aseed, asens),
            AnyMxOp::Constant(x) => x.eval_adj(aseed, asens),
            AnyMxOp::Reshape(x) => x.eval_adj(aseed, asens),
            AnyMxOp::Transpose(x) => x.eval_adj(aseed, asens),
            AnyMxOp::Addition(x) => x.eval_adj(aseed, asens),
        }
    }

    fn sp_fwd(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        match self {
            AnyMxOp::Symbolic(x) => x.sp_fwd(arg, res, work),
            AnyMxOp::Constant(x) => x.sp_fwd(arg, res, work),
            AnyMxOp::Reshape(x) => x.sp_fwd(arg, res, work),
            AnyMxOp::Transpose(x) => x.sp_fwd(arg, res, work),
            AnyMxOp::Addition(x) => x.sp_fwd(arg, res, work),
        }
    }

    fn sp_rev(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        match self {
            AnyMxOp::Symbolic(x) => x.sp_rev(arg, res, work),
            AnyMxOp::Constant(x) => x.sp_rev(arg, res, work),
            AnyMxOp::Reshape(x) => x.sp_rev(arg, res, work),
            AnyMxOp::Transpose(x) => x.sp_rev(arg, res, work),
            AnyMxOp::Addition(x) => x.sp_rev(arg, res, work),
        }
    }

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        arg: &[usize],
        res: &[usize],
        emitter: &mut E,
    ) -> fmt::Result {
        match self {
            AnyMxOp::Symbolic(x) => x.generate(stream, arg, res, emitter),
            AnyMxOp::Constant(x) => x.generate(stream, arg, res, emitter),
            AnyMxOp::Reshape(x) => x.generate(stream, arg, res, emitter),
            AnyMxOp::Transpose(x) => x.generate(stream, arg, res, emitter),
            AnyMxOp::Addition(x) => x.generate(stream, arg, res, emitter),
        }
    }

    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result {
        match self {
            AnyMxOp::Symbolic(x) => x.print_part(f, part),
            AnyMxOp::Constant(x) => x.print_part(f, part),
            AnyMxOp::Reshape(x) => x.print_part(f, part),
            AnyMxOp::Transpose(x) => x.print_part(f, part),
            AnyMxOp::Addition(x) => x.print_part(f, part),
        }
    }

    fn get_reshape(&self, sparsity: &Sparsity) -> Option<Mx> {
        match self {
            AnyMxOp::Symbolic(x) => x.get_reshape(sparsity),
            AnyMxOp::Constant(x) => x.get_reshape(sparsity),
            AnyMxOp::Reshape(x) => x.get_reshape(sparsity),
            AnyMxOp::Transpose(x) => x.get_reshape(sparsity),
            AnyMxOp::Addition(x) => x.get_reshape(sparsity),
        }
    }

    fn get_transpose(&self) -> Option<Mx> {
        match self {
            AnyMxOp::Symbolic(x) => x.get_transpose(),
            AnyMxOp::Constant(x) => x.get_transpose(),
            AnyMxOp::Reshape(x) => x.get_transpose(),
            AnyMxOp::Transpose(x) => x.get_transpose(),
            AnyMxOp::Addition(x) => x.get_transpose(),
        }
    }

    fn is_valid_input(&self) -> bool {
        match self {
            AnyMxOp::Symbolic(x) => x.is_valid_input(),
            AnyMxOp::Constant(x) => x.is_valid_input(),
            AnyMxOp::Reshape(x) => x.is_valid_input(),
            AnyMxOp::Transpose(x) => x.is_valid_input(),
            AnyMxOp::Addition(x) => x.is_valid_input(),
        }
    }

    fn n_primitives(&self) -> usize {
        match self {
            AnyMxOp::Symbolic(x) => x.n_primitives(),
            AnyMxOp::Constant(x) => x.n_primitives(),
            AnyMxOp::Reshape(x) => x.n_primitives(),
            AnyMxOp::Transpose(x) => x.n_primitives(),
            AnyMxOp::Addition(x) => x.n_primitives(),
        }
    }

    fn get_primitives(&self, this: &Mx, out: &mut Vec<Mx>) {
        match self {
            AnyMxOp::Symbolic(x) => x.get_primitives(this, out),
            AnyMxOp::Constant(x) => x.get_primitives(this, out),
            AnyMxOp::Reshape(x) => x.get_primitives(this, out),
            AnyMxOp::Transpose(x) => x.get_primitives(this, out),
            AnyMxOp::Addition(x) => x.get_primitives(this, out),
        }
    }

    fn split_primitives(&self, x: &Mx, out: &mut Vec<Mx>) {
        match self {
            AnyMxOp::Symbolic(op) => op.split_primitives(x, out),
            AnyMxOp::Constant(op) => op.split_primitives(x, out),
            AnyMxOp::Reshape(op) => op.split_primitives(x, out),
            AnyMxOp::Transpose(op) => op.split_primitives(x, out),
            AnyMxOp::Addition(op) => op.split_primitives(x, out),
        }
    }

    fn join_primitives(&self, it: &mut Iter<'_, Mx>) -> Mx {
        match self {
            AnyMxOp::Symbolic(x) => x.join_primitives(it),
            AnyMxOp::Constant(x) => x.join_primitives(it),
            AnyMxOp::Reshape(x) => x.join_primitives(it),
            AnyMxOp::Transpose(x) => x.join_primitives(it),
            AnyMxOp::Addition(x) => x.join_primitives(it),
        }
    }

    fn has_duplicates(&self) -> bool {
        match self {
            AnyMxOp::Symbolic(x) => x.has_duplicates(),
            AnyMxOp::Constant(x) => x.has_duplicates(),
            AnyMxOp::Reshape(x) => x.has_duplicates(),
            AnyMxOp::Transpose(x) => x.has_duplicates(),
            AnyMxOp::Addition(x) => x.has_duplicates(),
        }
    }

    fn reset_input(&self) {
        match self {
            AnyMxOp::Symbolic(x) => x.reset_input(),
            AnyMxOp::Constant(x) => x.reset_input(),
            AnyMxOp::Reshape(x) => x.reset_input(),
            AnyMxOp::Transpose(x) => x.reset_input(),
            AnyMxOp::Addition(x) => x.reset_input(),
        }
    }
}
