use mx_graph::Mx;
use mx_graph::mx::function::MxFunction;

pub mod codegen;
pub mod dependency;
pub mod derivatives;
pub mod reshape;

/// How a test turns its expressions into a function.
pub enum FunctionBuilder {
    Direct,
    /// Sort once, call symbolically on fresh inputs, then sort the result again.
    Rebuilt,
}

impl FunctionBuilder {
    pub fn build(&self, inputs: Vec<Mx>, outputs: Vec<Mx>) -> MxFunction {
        let f = MxFunction::new(inputs, outputs).unwrap();
        match self {
            FunctionBuilder::Direct => f,
            FunctionBuilder::Rebuilt => {
                let fresh: Vec<Mx> = f
                    .inputs()
                    .iter()
                    .enumerate()
                    .map(|(i, x)| Mx::sym(&format!("r{i}"), x.sparsity().clone()))
                    .collect();
                let outputs = f.call(&fresh).unwrap();
                MxFunction::new(fresh, outputs).unwrap()
            }
        }
    }
}

fn test_eq(value: &[f64], correct: &[f64], atol: f64, rtol: f64) {
    assert_eq!(value.len(), correct.len());
    for (&a, &b) in value.iter().zip(correct) {
        let err = (a - b).abs();
        let limit = atol + rtol * (a.abs().max(b.abs()));
        assert!(err <= limit, "{a} != {b}: {err} <= {limit}");
    }
}

fn test_eq_f64(value: &[f64], correct: &[f64]) {
    test_eq(value, correct, 1e-12, 1e-12);
}

fn test_eq_f32(value: &[f32], correct: &[f32]) {
    let value: Vec<f64> = value.iter().map(|&x| x as f64).collect();
    let correct: Vec<f64> = correct.iter().map(|&x| x as f64).collect();
    test_eq(&value, &correct, 1e-5, 1.3e-6);
}

fn test_eq_f16(value: &[half::f16], correct: &[half::f16]) {
    let value: Vec<f64> = value.iter().map(|x| x.to_f64()).collect();
    let correct: Vec<f64> = correct.iter().map(|x| x.to_f64()).collect();
    test_eq(&value, &correct, 1e-5, 4e-3);
}

fn test_eq_bf16(value: &[half::bf16], correct: &[half::bf16]) {
    let value: Vec<f64> = value.iter().map(|x| x.to_f64()).collect();
    let correct: Vec<f64> = correct.iter().map(|x| x.to_f64()).collect();
    test_eq(&value, &correct, 1e-5, 1.6e-2);
}
