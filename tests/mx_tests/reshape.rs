use crate::mx_tests::{FunctionBuilder, test_eq_bf16, test_eq_f16, test_eq_f32, test_eq_f64};
use half::{bf16, f16};
use mx_graph::{Mx, Sparsity, SxElem};
use ndarray::array;

pub fn test_reshape_eval_f64(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2), x.vec()]);
    let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let out = f.eval(&[values.clone()]).unwrap();
    test_eq_f64(&out[0], &values);
    test_eq_f64(&out[1], &values);
    assert_eq!(f.outputs()[0].shape(), (3, 2));
    assert_eq!(f.outputs()[1].shape(), (6, 1));
}

pub fn test_reshape_eval_f32(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(1, 6)]);
    let values = vec![0.75f32, -2.5, 3.0, 4.0, 0.5, -1.0];
    let out = f.eval(&[values.clone()]).unwrap();
    test_eq_f32(&out[0], &values);
}

pub fn test_reshape_eval_f16(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 2));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(4, 1)]);
    let values: Vec<f16> = [0.75390625f32, 0.93359375, 0.13671875, 38.25]
        .iter()
        .map(|&v| f16::from_f32(v))
        .collect();
    let out = f.eval(&[values.clone()]).unwrap();
    test_eq_f16(&out[0], &values);
}

pub fn test_reshape_eval_bf16(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 2));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(1, 4)]);
    let values: Vec<bf16> = [4.40625f32, 5.65625, 38.25, -1.5]
        .iter()
        .map(|&v| bf16::from_f32(v))
        .collect();
    let out = f.eval(&[values.clone()]).unwrap();
    test_eq_bf16(&out[0], &values);
}

pub fn test_reshape_eval_sx(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2)]);
    let elements = SxElem::sym_vector("x", 6);
    let out = f.eval(&[elements.clone()]).unwrap();
    // A reshape moves the scalar expressions without building new ones
    for (a, b) in out[0].iter().zip(&elements) {
        assert!(a.is_same(b));
    }
}

pub fn test_reshape_sparse_pattern(builder: &FunctionBuilder) {
    // Nonzeros at (0,0), (2,0) and (1,2) of a 3x3 matrix
    let sp = Sparsity::from_triplets(3, 3, &[0, 2, 1], &[0, 0, 2]).unwrap();
    let x = Mx::sym("x", sp.clone());
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(1, 9)]);
    let out = f.eval(&[vec![1.0, 2.0, 3.0]]).unwrap();
    test_eq_f64(&out[0], &[1.0, 2.0, 3.0]);
    let out_sp = f.outputs()[0].sparsity();
    assert_eq!(out_sp.linear_indices().collect::<Vec<_>>(), vec![0, 2, 7]);
    assert_eq!(
        out_sp.to_dense(&out[0]),
        array![[1.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0]]
    );
    assert_eq!(
        sp.to_dense(&[1.0, 2.0, 3.0]),
        array![[1.0, 0.0, 0.0], [0.0, 0.0, 3.0], [2.0, 0.0, 0.0]]
    );
}

pub fn test_reshape_then_add(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let y = Mx::sym("y", Sparsity::dense(3, 2));
    let f = builder.build(vec![x.clone(), y.clone()], vec![&x.reshape_to(3, 2) + &y]);
    let out = f
        .eval(&[
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
        ])
        .unwrap();
    test_eq_f64(&out[0], &[11.0, 22.0, 33.0, 44.0, 55.0, 66.0]);
}

pub fn test_transpose_eval(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let v = Mx::sym("v", Sparsity::column(3));
    let f = builder.build(vec![x.clone(), v.clone()], vec![x.transpose(), v.transpose()]);
    let out = f
        .eval(&[vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]])
        .unwrap();
    test_eq_f64(&out[0], &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    test_eq_f64(&out[1], &[7.0, 8.0, 9.0]);
    assert_eq!(f.outputs()[1].shape(), (1, 3));
}

pub fn test_reshaped_input(builder: &FunctionBuilder) {
    // The function takes a 3x2 argument but computes with the 2x3 symbol behind it
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let input = x.reshape_to(3, 2);
    let f = builder.build(vec![input], vec![x.transpose()]);
    assert_eq!(f.inputs()[0].shape(), (3, 2));
    let out = f.eval(&[vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]).unwrap();
    test_eq_f64(&out[0], &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
}
