use crate::codegen::CodeEmitter;
use crate::mx::observer::{MxFunctionObserver, TraversalMode};
use crate::mx::ops::{AnyMxOp, MxOp};
use crate::mx::{BVec, Mx, Workspace};
use crate::scalar::EvalScalar;
use crate::sparsity::Sparsity;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Write;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum MxFunctionError {
    #[error("Input {0} is not a valid function input")]
    InvalidInput(usize),
    #[error("The same symbol appears more than once among the inputs")]
    DuplicateInputs,
    #[error("Free variables in outputs: {0:?}")]
    FreeVariables(Vec<String>),
    #[error("Expected {expected} arguments, got {actual}")]
    WrongArgumentCount { expected: usize, actual: usize },
    #[error("Argument {index} has {actual} nonzeros, expected {expected}")]
    WrongArgumentSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Argument {index} has sparsity {actual}, expected {expected}")]
    SparsityMismatch {
        index: usize,
        expected: Sparsity,
        actual: Sparsity,
    },
}

/// One node of the sorted algorithm, with the work slots of its dependencies and result.
#[derive(Debug, Clone)]
pub struct AlgorithmStep {
    pub node: Mx,
    pub arg: Vec<usize>,
    pub res: Vec<usize>,
}

/// Expression graph compiled into a flat algorithm.
///
/// Step `k` writes work slot `k`. The primitives of all inputs come first, in
/// input order, followed by every other node in dependency order.
#[derive(Debug, Clone)]
pub struct MxFunction {
    inputs: Vec<Mx>,
    outputs: Vec<Mx>,
    algorithm: Vec<AlgorithmStep>,
    // Slots of the primitives of every input
    input_slots: Vec<Vec<usize>>,
    output_slots: Vec<usize>,
    sz_iw: usize,
}

impl MxFunction {
    pub fn new(inputs: Vec<Mx>, outputs: Vec<Mx>) -> Result<Self, MxFunctionError> {
        for (i, input) in inputs.iter().enumerate() {
            if !input.is_valid_input() {
                return Err(MxFunctionError::InvalidInput(i));
            }
        }

        let duplicates = inputs.iter().fold(false, |acc, x| x.has_duplicates() || acc);
        for input in &inputs {
            input.reset_input();
        }
        if duplicates {
            return Err(MxFunctionError::DuplicateInputs);
        }

        let mut algorithm = vec![];
        let mut slot_of: HashMap<*const AnyMxOp, usize> = HashMap::new();
        let mut input_slots = vec![];
        for input in &inputs {
            let mut slots = vec![];
            for primitive in input.primitives() {
                let k = algorithm.len();
                slot_of.insert(primitive.key(), k);
                slots.push(k);
                algorithm.push(AlgorithmStep {
                    node: primitive,
                    arg: vec![],
                    res: vec![k],
                });
            }
            input_slots.push(slots);
        }

        // Depth first post-order walk from the outputs
        let mut free = vec![];
        let mut seen_free = HashSet::new();
        let mut stack: Vec<(Mx, bool)> = outputs.iter().rev().map(|x| (x.clone(), false)).collect();
        while let Some((node, expanded)) = stack.pop() {
            if slot_of.contains_key(&node.key()) {
                continue;
            }
            if expanded {
                if !free.is_empty() {
                    // Missing dependencies, the error is reported below
                    continue;
                }
                let arg = node
                    .op()
                    .dependencies()
                    .iter()
                    .map(|d| slot_of[&d.key()])
                    .collect();
                let k = algorithm.len();
                slot_of.insert(node.key(), k);
                algorithm.push(AlgorithmStep {
                    node,
                    arg,
                    res: vec![k],
                });
            } else if node.is_symbolic() {
                if seen_free.insert(node.key()) {
                    free.push(node.to_string());
                }
            } else {
                let deps: Vec<Mx> = node.op().dependencies().to_vec();
                stack.push((node, true));
                for dep in deps.into_iter().rev() {
                    if !slot_of.contains_key(&dep.key()) {
                        stack.push((dep, false));
                    }
                }
            }
        }
        if !free.is_empty() {
            return Err(MxFunctionError::FreeVariables(free));
        }

        let output_slots = outputs.iter().map(|x| slot_of[&x.key()]).collect();
        let sz_iw = algorithm
            .iter()
            .map(|step| step.node.op().sz_iw())
            .max()
            .unwrap_or(0);
        log::debug!(
            "Sorted {} nodes for {} inputs and {} outputs",
            algorithm.len(),
            inputs.len(),
            outputs.len()
        );
        Ok(Self {
            inputs,
            outputs,
            algorithm,
            input_slots,
            output_slots,
            sz_iw,
        })
    }

    pub fn inputs(&self) -> &[Mx] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Mx] {
        &self.outputs
    }

    pub fn algorithm(&self) -> &[AlgorithmStep] {
        &self.algorithm
    }

    pub fn sz_iw(&self) -> usize {
        self.sz_iw
    }

    pub fn slot_sizes(&self) -> Vec<usize> {
        self.algorithm.iter().map(|step| step.node.nnz()).collect()
    }

    fn n_primitive_steps(&self) -> usize {
        self.input_slots.iter().map(Vec::len).sum()
    }

    fn check_arg_count(&self, actual: usize) -> Result<(), MxFunctionError> {
        if actual != self.inputs.len() {
            return Err(MxFunctionError::WrongArgumentCount {
                expected: self.inputs.len(),
                actual,
            });
        }
        Ok(())
    }

    fn check_buffers<T>(&self, buffers: &[Vec<T>], expected: &[Mx]) -> Result<(), MxFunctionError> {
        if buffers.len() != expected.len() {
            return Err(MxFunctionError::WrongArgumentCount {
                expected: expected.len(),
                actual: buffers.len(),
            });
        }
        for (index, (buffer, x)) in buffers.iter().zip(expected).enumerate() {
            if buffer.len() != x.nnz() {
                return Err(MxFunctionError::WrongArgumentSize {
                    index,
                    expected: x.nnz(),
                    actual: buffer.len(),
                });
            }
        }
        Ok(())
    }

    fn check_sparsity(&self, index: usize, x: &Mx, expected: &Mx) -> Result<(), MxFunctionError> {
        if x.sparsity() != expected.sparsity() {
            return Err(MxFunctionError::SparsityMismatch {
                index,
                expected: expected.sparsity().clone(),
                actual: x.sparsity().clone(),
            });
        }
        Ok(())
    }

    // Input nonzeros are the nonzeros of its primitives, one after the other
    fn load_inputs<T: Clone>(&self, work: &mut Workspace<T>, args: &[Vec<T>]) {
        for (arg, slots) in args.iter().zip(&self.input_slots) {
            let mut offset = 0;
            for &s in slots {
                let n = work.slot(s).len();
                work.slot_mut(s).clone_from_slice(&arg[offset..offset + n]);
                offset += n;
            }
        }
    }

    fn gather_inputs<T: Clone>(&self, work: &Workspace<T>) -> Vec<Vec<T>> {
        self.input_slots
            .iter()
            .map(|slots| slots.iter().flat_map(|&s| work.slot(s).iter().cloned()).collect())
            .collect()
    }

    fn gather_outputs<T: Clone>(&self, work: &Workspace<T>) -> Vec<Vec<T>> {
        self.output_slots
            .iter()
            .map(|&s| work.slot(s).to_vec())
            .collect()
    }

    pub fn eval<T: EvalScalar>(&self, args: &[Vec<T>]) -> Result<Vec<Vec<T>>, MxFunctionError> {
        self.eval_with_observer(args, &mut ())
    }

    pub fn eval_with_observer<T: EvalScalar>(
        &self,
        args: &[Vec<T>],
        observer: &mut impl MxFunctionObserver,
    ) -> Result<Vec<Vec<T>>, MxFunctionError> {
        self.check_buffers(args, &self.inputs)?;
        let mut work = Workspace::new(self.slot_sizes(), self.sz_iw, T::from_f64(0.0));
        self.load_inputs(&mut work, args);
        for (k, step) in self.algorithm.iter().enumerate() {
            log::trace!("Evaluating @{k} = {}", step.node.op().get_name());
            let start_instant = Instant::now();
            step.node.op().eval_gen(&step.arg, &step.res, &mut work);
            observer.on_node_executed(k, &step.node, TraversalMode::Eval, start_instant, Instant::now());
        }
        Ok(self.gather_outputs(&work))
    }

    /// Propagate dependency bits from the inputs to the outputs.
    pub fn sp_fwd(&self, seeds: &[Vec<BVec>]) -> Result<Vec<Vec<BVec>>, MxFunctionError> {
        self.sp_fwd_with_observer(seeds, &mut ())
    }

    pub fn sp_fwd_with_observer(
        &self,
        seeds: &[Vec<BVec>],
        observer: &mut impl MxFunctionObserver,
    ) -> Result<Vec<Vec<BVec>>, MxFunctionError> {
        self.check_buffers(seeds, &self.inputs)?;
        let mut work: Workspace<BVec> = Workspace::new(self.slot_sizes(), self.sz_iw, 0);
        self.load_inputs(&mut work, seeds);
        for (k, step) in self.algorithm.iter().enumerate() {
            let start_instant = Instant::now();
            step.node.op().sp_fwd(&step.arg, &step.res, &mut work);
            observer.on_node_executed(k, &step.node, TraversalMode::SpFwd, start_instant, Instant::now());
        }
        Ok(self.gather_outputs(&work))
    }

    /// Propagate dependency bits from the outputs back to the inputs.
    pub fn sp_rev(&self, seeds: &[Vec<BVec>]) -> Result<Vec<Vec<BVec>>, MxFunctionError> {
        self.sp_rev_with_observer(seeds, &mut ())
    }

    pub fn sp_rev_with_observer(
        &self,
        seeds: &[Vec<BVec>],
        observer: &mut impl MxFunctionObserver,
    ) -> Result<Vec<Vec<BVec>>, MxFunctionError> {
        self.check_buffers(seeds, &self.outputs)?;
        let mut work: Workspace<BVec> = Workspace::new(self.slot_sizes(), self.sz_iw, 0);
        for (seed, &s) in seeds.iter().zip(&self.output_slots) {
            for (w, b) in work.slot_mut(s).iter_mut().zip(seed) {
                *w |= b;
            }
        }
        for (k, step) in self.algorithm.iter().enumerate().rev() {
            let start_instant = Instant::now();
            step.node.op().sp_rev(&step.arg, &step.res, &mut work);
            observer.on_node_executed(k, &step.node, TraversalMode::SpRev, start_instant, Instant::now());
        }
        Ok(self.gather_inputs(&work))
    }

    /// Evaluate the function on symbolic arguments, building a new expression graph.
    pub fn call(&self, args: &[Mx]) -> Result<Vec<Mx>, MxFunctionError> {
        self.check_arg_count(args.len())?;
        for (index, (arg, input)) in args.iter().zip(&self.inputs).enumerate() {
            self.check_sparsity(index, arg, input)?;
        }
        let mut values: Vec<Mx> = self.algorithm.iter().map(|s| s.node.clone()).collect();
        for ((arg, input), slots) in args.iter().zip(&self.inputs).zip(&self.input_slots) {
            for (x, &s) in input.split_primitives(arg).into_iter().zip(slots) {
                values[s] = x;
            }
        }
        for step in &self.algorithm[self.n_primitive_steps()..] {
            let arg: Vec<Mx> = step.arg.iter().map(|&a| values[a].clone()).collect();
            let mut res = vec![step.node.clone()];
            step.node.op().eval_mx(&arg, &mut res);
            values[step.res[0]] = res.swap_remove(0);
        }
        Ok(self.output_slots.iter().map(|&s| values[s].clone()).collect())
    }

    /// Forward sensitivities. `fseed[d][i]` is the seed of input `i` in direction `d`,
    /// the result holds the sensitivity of every output in every direction.
    pub fn eval_fwd(&self, fseed: &[Vec<Mx>]) -> Result<Vec<Vec<Mx>>, MxFunctionError> {
        for seeds in fseed {
            self.check_arg_count(seeds.len())?;
            for (index, (seed, input)) in seeds.iter().zip(&self.inputs).enumerate() {
                self.check_sparsity(index, seed, input)?;
            }
        }
        let nfwd = fseed.len();
        let mut tangents: Vec<Vec<Mx>> = self
            .algorithm
            .iter()
            .map(|step| vec![Mx::zeros(step.node.sparsity().clone()); nfwd])
            .collect();
        for (d, seeds) in fseed.iter().enumerate() {
            for ((seed, input), slots) in seeds.iter().zip(&self.inputs).zip(&self.input_slots) {
                for (x, &s) in input.split_primitives(seed).into_iter().zip(slots) {
                    tangents[s][d] = x;
                }
            }
        }
        for step in &self.algorithm[self.n_primitive_steps()..] {
            let seeds: Vec<Vec<Mx>> = (0..nfwd)
                .map(|d| step.arg.iter().map(|&a| tangents[a][d].clone()).collect())
                .collect();
            let mut sens = vec![vec![Mx::zeros(step.node.sparsity().clone())]; nfwd];
            step.node.op().eval_fwd(&seeds, &mut sens);
            tangents[step.res[0]] = sens.into_iter().map(|mut s| s.swap_remove(0)).collect();
        }
        Ok((0..nfwd)
            .map(|d| {
                self.output_slots
                    .iter()
                    .map(|&s| tangents[s][d].clone())
                    .collect()
            })
            .collect())
    }

    /// Adjoint sensitivities. `aseed[d][o]` is the seed of output `o` in direction `d`,
    /// the result holds the sensitivity of every input in every direction.
    pub fn eval_adj(&self, aseed: &[Vec<Mx>]) -> Result<Vec<Vec<Mx>>, MxFunctionError> {
        for seeds in aseed {
            if seeds.len() != self.outputs.len() {
                return Err(MxFunctionError::WrongArgumentCount {
                    expected: self.outputs.len(),
                    actual: seeds.len(),
                });
            }
            for (index, (seed, output)) in seeds.iter().zip(&self.outputs).enumerate() {
                self.check_sparsity(index, seed, output)?;
            }
        }
        let nadj = aseed.len();
        let mut adjoints: Vec<Vec<Mx>> = self
            .algorithm
            .iter()
            .map(|step| vec![Mx::zeros(step.node.sparsity().clone()); nadj])
            .collect();
        for (d, seeds) in aseed.iter().enumerate() {
            for (seed, &s) in seeds.iter().zip(&self.output_slots) {
                adjoints[s][d] += seed.clone();
            }
        }
        for step in self.algorithm[self.n_primitive_steps()..].iter().rev() {
            let k = step.res[0];
            if adjoints[k].iter().all(Mx::is_zero) {
                continue;
            }
            let seeds: Vec<Vec<Mx>> = adjoints[k].iter().map(|x| vec![x.clone()]).collect();
            // Each dependency position gets its own accumulator so a node used
            // twice by the same step receives both contributions
            let mut sens: Vec<Vec<Mx>> = (0..nadj)
                .map(|_| {
                    step.arg
                        .iter()
                        .map(|&a| Mx::zeros(self.algorithm[a].node.sparsity().clone()))
                        .collect()
                })
                .collect();
            step.node.op().eval_adj(&seeds, &mut sens);
            for (d, sens) in sens.into_iter().enumerate() {
                for (x, &a) in sens.into_iter().zip(&step.arg) {
                    adjoints[a][d] += x;
                }
            }
        }
        Ok((0..nadj)
            .map(|d| {
                self.inputs
                    .iter()
                    .zip(&self.input_slots)
                    .map(|(input, slots)| {
                        let parts: Vec<Mx> = slots.iter().map(|&s| adjoints[s][d].clone()).collect();
                        input.join_primitives(&mut parts.iter())
                    })
                    .collect()
            })
            .collect())
    }

    /// Function of the inputs and `nfwd` seeds per input, returning the outputs
    /// followed by the forward sensitivities of every direction.
    pub fn forward(&self, nfwd: usize) -> Result<MxFunction, MxFunctionError> {
        let fseed: Vec<Vec<Mx>> = (0..nfwd)
            .map(|d| {
                self.inputs
                    .iter()
                    .enumerate()
                    .map(|(i, x)| Mx::sym(&format!("fwd{d}_i{i}"), x.sparsity().clone()))
                    .collect()
            })
            .collect();
        let fsens = self.eval_fwd(&fseed)?;
        let inputs = self.inputs.iter().cloned().chain(fseed.into_iter().flatten()).collect();
        let outputs = self.outputs.iter().cloned().chain(fsens.into_iter().flatten()).collect();
        MxFunction::new(inputs, outputs)
    }

    /// Function of the inputs and `nadj` seeds per output, returning the outputs
    /// followed by the adjoint sensitivities of every direction.
    pub fn reverse(&self, nadj: usize) -> Result<MxFunction, MxFunctionError> {
        let aseed: Vec<Vec<Mx>> = (0..nadj)
            .map(|d| {
                self.outputs
                    .iter()
                    .enumerate()
                    .map(|(o, x)| Mx::sym(&format!("adj{d}_o{o}"), x.sparsity().clone()))
                    .collect()
            })
            .collect();
        let asens = self.eval_adj(&aseed)?;
        let inputs = self.inputs.iter().cloned().chain(aseed.into_iter().flatten()).collect();
        let outputs = self.outputs.iter().cloned().chain(asens.into_iter().flatten()).collect();
        MxFunction::new(inputs, outputs)
    }

    /// Write the body of the generated function: load the arguments, run every
    /// step and store the results.
    pub fn generate<E: CodeEmitter + ?Sized>(
        &self,
        stream: &mut String,
        emitter: &mut E,
    ) -> fmt::Result {
        for (i, slots) in self.input_slots.iter().enumerate() {
            let mut offset = 0;
            for &s in slots {
                let n = self.algorithm[s].node.nnz();
                let dst = emitter.work(s);
                if offset == 0 {
                    emitter.copy_vector(stream, &format!("arg[{i}]"), n, &dst, "i", false)?;
                } else if n > 0 {
                    writeln!(stream, "  for (i=0; i<{n}; ++i) {dst}[i] = arg[{i}][i+{offset}];")?;
                }
                offset += n;
            }
        }
        for (k, step) in self.algorithm.iter().enumerate().skip(self.n_primitive_steps()) {
            emitter.comment(stream, &format!("#{k}: {}", step.node.op().get_name()))?;
            step.node.op().generate(stream, &step.arg, &step.res, emitter)?;
        }
        for (o, &s) in self.output_slots.iter().enumerate() {
            let src = emitter.work(s);
            let n = self.algorithm[s].node.nnz();
            emitter.copy_vector(stream, &src, n, &format!("res[{o}]"), "i", false)?;
        }
        Ok(())
    }
}

impl fmt::Display for MxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slots) in self.input_slots.iter().enumerate() {
            let names: Vec<String> = slots.iter().map(|&s| format!("@{s}")).collect();
            writeln!(f, "input[{i}] = {} ({})", self.inputs[i], names.join(", "))?;
        }
        for (k, step) in self.algorithm.iter().enumerate().skip(self.n_primitive_steps()) {
            write!(f, "@{k} = ")?;
            let op = step.node.op();
            for (j, &a) in step.arg.iter().enumerate() {
                op.print_part(f, j)?;
                write!(f, "@{a}")?;
            }
            op.print_part(f, step.arg.len())?;
            writeln!(f)?;
        }
        for (o, &s) in self.output_slots.iter().enumerate() {
            writeln!(f, "output[{o}] = @{s}")?;
        }
        Ok(())
    }
}
