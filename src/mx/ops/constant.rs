use crate::codegen::CodeEmitter;
use crate::mx::ops::{AnyMxOp, MxOp};
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Constant {
    values: Rc<[f64]>,
    sparsity: Sparsity,
}

impl Constant {
    pub fn create(values: impl Into<Rc<[f64]>>, sparsity: Sparsity) -> Mx {
        let values = values.into();
        assert_eq!(
            values.len(),
            sparsity.nnz(),
            "Constant with {} values does not fit a {} pattern",
            values.len(),
            sparsity
        );
        Mx::from_op(AnyMxOp::Constant(Self { values, sparsity }))
    }

    pub fn zeros(sparsity: Sparsity) -> Mx {
        Self::create(vec![0.0; sparsity.nnz()], sparsity)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// True for an all-zero constant, including one without any nonzeros.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

impl MxOp for Constant {
    fn dependencies(&self) -> &[Mx] {
        &[]
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sparsity
    }

    fn get_name(&self) -> String {
        "Constant".to_string()
    }

    fn eval_gen<T: EvalScalar>(&self, _arg: &[usize], res: &[usize], work: &mut Workspace<T>) {
        for (r, &v) in work.slot_mut(res[0]).iter_mut().zip(self.values.iter()) {
            *r = T::from_f64(v);
        }
    }

    fn eval_mx(&self, _arg: &[Mx], res: &mut [Mx]) {
        res[0] = Mx::from_op(AnyMxOp::Constant(self.clone()));
    }

    fn eval_fwd(&self, _fseed: &[Vec<Mx>], fsens: &mut [Vec<Mx>]) {
        for sens in fsens.iter_mut() {
            sens[0] = Self::zeros(self.sparsity.clone());
        }
    }

    fn eval_adj(&self, _aseed: &[Vec<Mx>], _asens: &mut [Vec<Mx>]) {}

    fn sp_fwd(&self, _arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        work.slot_mut(res[0]).fill(0);
    }

    fn sp_rev(&self, _arg: &[usize], res: &[usize], work: &mut Workspace<BVec>) {
        work.slot_mut(res[0]).fill(0);
    }

    fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        _arg: &[usize],
        res: &[usize],
        emitter: &mut E,
    ) -> fmt::Result {
        let table = emitter.add_constant(&self.values);
        let dst = emitter.work(res[0]);
        emitter.copy_vector(stream, &table, self.values.len(), &dst, "i", false)
    }

    fn print_part(&self, f: &mut fmt::Formatter<'_>, part: usize) -> fmt::Result {
        if part != 0 {
            return Ok(());
        }
        if self.is_zero() {
            write!(f, "zeros({})", self.sparsity)
        } else if self.sparsity.is_scalar() && self.values.len() == 1 {
            write!(f, "{}", self.values[0])
        } else {
            let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
            write!(f, "[{}]", values.join(", "))
        }
    }

    fn get_reshape(&self, sparsity: &Sparsity) -> Option<Mx> {
        Some(Self::create(self.values.clone(), sparsity.clone()))
    }

    fn get_transpose(&self) -> Option<Mx> {
        let (sparsity, mapping) = self.sparsity.transpose_mapping();
        let values: Vec<f64> = mapping.iter().map(|&k| self.values[k]).collect();
        Some(Self::create(values, sparsity))
    }
}
