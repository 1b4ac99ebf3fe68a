use crate::codegen::CodeEmitter;
use crate::mx::ops::{AnyMxOp, MxOp};
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::fmt;
use std::fmt::Write;

/// Elementwise sum of two expressions with identical sparsity.
#[derive(Debug, Clone)]
pub struct Addition {
    operands: [Mx; 2],
    sparsity: Sparsity,
}

impl Addition {
    pub fn create(a: &Mx, b: &Mx) -> Mx {
        assert_eq!(
            a.sparsity(),
            b.sparsity(),
            "Cannot add {} and {}: sparsity differs",
            a.sparsity(),
            b.sparsity()
        );
        Mx::from_op(AnyMxOp::Addition(Self {
            operands: [a.clone(), b.clone()],
            sparsity: a.sparsity().clone(),
        }))
    }
}

impl MxOp for Addition {
    fn dependencies(&self) -> &[Mx] {
        &self.operands
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    fn get_name(&self) -> String {
        "Addition".to_string()
    }

    fn eval_gen<T: EvalScalar>(&self, arg: &[usize], res: &[usize], work: &mut Workspace<T>) {
        let sum: Vec<T> = work
            .slot(arg[0])
            .iter()
            .zip(work.slot(arg[1]))
            .map(|(a, b)| a.clone() + b.clone())
            .collect();
        work.slot_mut(res[0]).clone_from_slice(&sum);
    }

    fn eval_mx(&self, arg: &[Mx], res: &mut [Mx]) {
        res[0] = &arg[0] + &arg[1];
    }

    fn eval_fwd(&self, fseed: &[Vec<Mx>], fsens: &mut [Vec<Mx>]) {
        for (seed, sens) in fseed.iter().zip(fsens.iter_mut()) {
            sens[0] = &seed[0] + &seed[1];
        }
    }

    fn eval_adj(&self, aseed: &[Vec<Mx>], asens: &mut [Vec<Mx>]) {
        for (seed, sens) in aseed.iter().zip(asens.iter_mut()) {
            sens[0] += seed[0].clone();
            sens[1] += seed[0].clone();
        }
    }

    fn sp_fwd(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        let bits: Vec<BVec> = work
            .slot(arg[0])
            .iter()
            .zip(work.slot(arg[1]))
            .map(|(a, b)| a | b)
            .collect();
        work.slot_mut(res[0]).copy_from_slice(&bits);
    }

    fn sp_rev(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        let seed = work.slot(res[0]).to_vec();
        work.slot_mut(res[0]).fill(0);
        for &a in arg {
            for (x, s) in work.slot_mut(a).iter_mut().zip(&seed) {
                *x |= s;
            }
        }
    }

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        arg: &[usize],
        res: &[usize],
        emitter: &mut E,
    ) -> fmt::Result {
        let (a, b) = (emitter.work(arg[0]), emitter.work(arg[1]));
        let dst = emitter.work(res[0]);
        writeln!(
            stream,
            "  for (i=0; i<{}; ++i) {dst}[i] = {a}[i]+{b}[i];",
            self.sparsity.nnz()
        )
    }

    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result {
        match part {
            0 => write!(f, "("),
            1 => write!(f, "+"),
            _ => write!(f, ")"),
        }
    }
}
