use crate::codegen::CodeEmitter;
use crate::mx::ops::{AnyMxOp, MxOp};
use crate::mx::workspace::slot_pair;
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::fmt;
use std::fmt::Write;

/// Matrix transpose. Unlike a reshape this permutes the nonzeros.
#[derive(Debug, Clone)]
pub struct Transpose {
    input: Mx,
    sparsity: Sparsity,
}

impl Transpose {
    pub fn create(input: &Mx) -> Mx {
        Mx::from_op(AnyMxOp::Transpose(Self {
            input: input.clone(),
            sparsity: input.sparsity().transpose(),
        }))
    }

    // Visit the input nonzeros in storage order, together with the position each one
    // takes in the result. `iw` holds the next free position of every result column.
    fn for_each_position(&self, iw: &mut [usize], mut f: impl FnMut(usize, usize)) {
        let ncol_t = self.sparsity.ncol();
        iw[..ncol_t].copy_from_slice(&self.sparsity.colind()[..ncol_t]);
        let x_sp = self.input.sparsity();
        let (x_colind, x_row) = (x_sp.colind(), x_sp.row());
        for c in 0..x_sp.ncol() {
            for el in x_colind[c]..x_colind[c + 1] {
                let p = &mut iw[x_row[el]];
                f(el, *p);
                *p += 1;
            }
        }
    }
}

impl MxOp for Transpose {
    fn dependencies(&self) -> &[Mx] {
        std::slice::from_ref(&self.input)
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    fn get_name(&self) -> String {
        "Transpose".to_string()
    }

    fn sz_iw(&self) -> usize {
        self.sparsity.ncol()
    }

    fn eval_gen<T: EvalScalar>(&self, arg: &[usize], res: &[usize], work: &mut Workspace<T>) {
        let Workspace { slots, iw } = work;
        let (x, r) = slot_pair(slots, arg[0], res[0]);
        self.for_each_position(iw, |el, p| r[p] = x[el].clone());
    }

    fn eval_mx(&self, arg: &[Mx], res: &mut [Mx]) {
        res[0] = arg[0].transpose();
    }

    fn eval_fwd(&self, fseed: &[Vec<Mx>], fsens: &mut [Vec<Mx>]) {
        for (seed, sens) in fseed.iter().zip(fsens.iter_mut()) {
            sens[0] = seed[0].transpose();
        }
    }

    fn eval_adj(&self, aseed: &[Vec<Mx>], asens: &mut [Vec<Mx>]) {
        for (seed, sens) in aseed.iter().zip(asens.iter_mut()) {
            sens[0] += seed[0].transpose();
        }
    }

    fn sp_fwd(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        let Workspace { slots, iw } = work;
        let (x, r) = slot_pair(slots, arg[0], res[0]);
        self.for_each_position(iw, |el, p| r[p] = x[el]);
    }

    fn sp_rev(&self, arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        let Workspace { slots, iw } = work;
        let (x, r) = slot_pair(slots, arg[0], res[0]);
        self.for_each_position(iw, |el, p| {
            x[el] |= r[p];
            r[p] = 0;
        });
    }

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        arg: &[usize],
        res: &[usize],
        emitter: &mut E,
    ) -> fmt::Result {
        let (_, mapping) = self.input.sparsity().transpose_mapping();
        let table = emitter.add_integers(&mapping);
        let src = emitter.work(arg[0]);
        let dst = emitter.work(res[0]);
        writeln!(
            stream,
            "  for (i=0; i<{}; ++i) {dst}[i] = {src}[{table}[i]];",
            mapping.len()
        )
    }

    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result {
        if part != 0 {
            write!(f, "'")?;
        }
        Ok(())
    }

    fn get_transpose(&self) -> Option<Mx> {
        Some(self.input.clone())
    }
}
