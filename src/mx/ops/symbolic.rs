use crate::codegen::CodeEmitter;
use crate::mx::ops::{AnyMxOp, MxOp};
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::cell::Cell;
use std::fmt;
use std::slice::Iter;

/// Free symbolic matrix. Leaf of every expression graph and the only primitive input.
#[derive(Debug, Clone)]
pub struct Symbolic {
    name: String,
    sparsity: Sparsity,
    // Temporary mark used by duplicate detection
    marked: Cell<bool>,
}

impl Symbolic {
    pub fn create(name: &str, sparsity: Sparsity) -> Mx {
        Mx::from_op(AnyMxOp::Symbolic(Self {
            name: name.to_string(),
            sparsity,
            marked: Cell::new(false),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl MxOp for Symbolic {
    fn dependencies(&self) -> &[Mx] {
        &[]
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    fn get_name(&self) -> String {
        format!("Symbolic({})", self.name)
    }

    // Inputs are placed in their slots by the driver
    fn eval_gen<T: EvalScalar>(&self, _arg: &[usize], _res: &[usize], _work: &mut Workspace<T>) {}

    fn eval_mx(&self, _arg: &[Mx], _res: &mut [Mx]) {}

    fn eval_fwd(&self, _fseed: &[Vec<Mx>], _fsens: &mut [Vec<Mx>]) {}

    fn eval_adj(&self, _aseed: &[Vec<Mx>], _asens: &mut [Vec<Mx>]) {}

    fn sp_fwd(&self, _arg: &[usize], _res: &[usize], _work: &mut Workspace<BVec>) {}

    fn sp_rev(&self, _arg: &[usize], _res: &[usize], _work: &mut Workspace<BVec>) {}

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        _stream: &mut String,
        _arg: &[usize],
        _res: &[usize],
        _emitter: &mut E,
    ) -> fmt::Result {
        Ok(())
    }

    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result {
        if part == 0 {
            write!(f, "{}", self.name)?;
        }
        Ok(())
    }

    fn is_valid_input(&self) -> bool {
        true
    }

    fn n_primitives(&self) -> usize {
        1
    }

    fn get_primitives(&self, this: &Mx, out: &mut Vec<Mx>) {
        out.push(this.clone());
    }

    fn split_primitives(&self, x: &Mx, out: &mut Vec<Mx>) {
        out.push(x.clone());
    }

    fn join_primitives(&self, it: &mut Iter<'_, Mx>) -> Mx {
        match it.next() {
            Some(x) => x.clone(),
            None => panic!("Ran out of primitives while joining {}", self.name),
        }
    }

    fn has_duplicates(&self) -> bool {
        if self.marked.replace(true) {
            log::warn!("Symbol {} appears more than once", self.name);
            true
        } else {
            false
        }
    }

    fn reset_input(&self) {
        self.marked.set(false);
    }
}
