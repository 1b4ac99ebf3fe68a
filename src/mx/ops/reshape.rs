use crate::codegen::CodeEmitter;
use crate::mx::ops::{AnyMxOp, MxOp};
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::fmt;
use std::slice::Iter;

/// Reinterpretation of the nonzeros of `input` under a different sparsity pattern.
///
/// The nonzeros themselves are never touched, so every mode is a plain copy in
/// storage order.
#[derive(Debug, Clone)]
pub struct Reshape {
    input: Mx,
    sparsity: Sparsity,
}

impl Reshape {
    /// Panics if `sparsity` does not have as many nonzeros as `input`.
    pub fn create(input: &Mx, sparsity: Sparsity) -> Mx {
        assert_eq!(
            input.nnz(),
            sparsity.nnz(),
            "Cannot reshape {} into {}: number of nonzeros differs",
            input.sparsity(),
            sparsity
        );
        Mx::from_op(AnyMxOp::Reshape(Self {
            input: input.clone(),
            sparsity,
        }))
    }

    pub fn input(&self) -> &Mx {
        &self.input
    }

    // For vectors a reshape is also a transpose
    fn is_vector_transpose(&self) -> bool {
        self.input.sparsity().is_vector(true) && self.sparsity.is_vector(true)
    }
}

impl MxOp for Reshape {
    fn dependencies(&self) -> &[Mx] {
        std::slice::from_ref(&self.input)
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    fn get_name(&self) -> String {
        "Reshape".to_string()
    }

    fn eval_gen<T: EvalScalar>(&self, arg: &[usize], res: &[usize], work: &mut Workspace<T>) {
        work.copy(arg[0], res[0]);
    }

    fn eval_mx(&self, arg: &[Mx], res: &mut [Mx]) {
        res[0] = arg[0].reshape(&self.sparsity);
    }

    fn eval_fwd(&self, fseed: &[Vec<Mx>], fsens: &mut [Vec<Mx>]) {
        for (seed, sens) in fseed.iter().zip(fsens.iter_mut()) {
            sens[0] = seed[0].reshape(&self.sparsity);
        }
    }

    fn eval_adj(&self, aseed: &[Vec<Mx>], asens: &mut [Vec<Mx>]) {
        for (seed, sens) in aseed.iter().zip(asens.iter_mut()) {
            sens[0] += seed[0].reshape(self.input.sparsity());
        }
    }

    fn sp_fwd(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        work.copy(arg[0], res[0]);
    }

    fn sp_rev(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        work.copy_rev(arg[0], res[0]);
    }

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        arg: &[usize],
        res: &[usize],
        emitter: &mut E,
    ) -> fmt::Result {
        if arg[0] == res[0] {
            return Ok(());
        }
        let src = emitter.work(arg[0]);
        let dst = emitter.work(res[0]);
        emitter.copy_vector(stream, &src, self.sparsity.nnz(), &dst, "i", false)
    }

    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result {
        if self.is_vector_transpose() {
            if part != 0 {
                write!(f, "'")?;
            }
        } else if part == 0 {
            if self.sparsity.is_vector(false) {
                write!(f, "vec(")?;
            } else {
                write!(f, "reshape(")?;
            }
        } else {
            write!(f, ")")?;
        }
        Ok(())
    }

    fn get_reshape(&self, sparsity: &Sparsity) -> Option<Mx> {
        Some(self.input.reshape(sparsity))
    }

    fn get_transpose(&self) -> Option<Mx> {
        if self.is_vector_transpose() {
            Some(self.input.clone())
        } else {
            None
        }
    }

    fn is_valid_input(&self) -> bool {
        self.input.is_valid_input()
    }

    fn n_primitives(&self) -> usize {
        self.input.n_primitives()
    }

    fn get_primitives(&self, _this: &Mx, out: &mut Vec<Mx>) {
        self.input.collect_primitives(out);
    }

    fn split_primitives(&self, x: &Mx, out: &mut Vec<Mx>) {
        self.input
            .split_primitives_into(&x.reshape(self.input.sparsity()), out);
    }

    fn join_primitives(&self, it: &mut Iter<'_, Mx>) -> Mx {
        self.input.join_primitives(it).reshape(&self.sparsity)
    }

    fn has_duplicates(&self) -> bool {
        self.input.has_duplicates()
    }

    fn reset_input(&self) {
        self.input.reset_input();
    }
}
