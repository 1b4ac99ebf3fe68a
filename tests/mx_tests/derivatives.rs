use crate::mx_tests::{FunctionBuilder, test_eq_f64};
use mx_graph::{Mx, Sparsity};

pub fn test_forward_of_reshape(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2)]);
    let fwd = f.forward(1).unwrap();
    assert_eq!(fwd.inputs().len(), 2);
    assert_eq!(fwd.outputs().len(), 2);
    assert_eq!(fwd.outputs()[1].shape(), (3, 2));
    let out = fwd
        .eval(&[
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![0.5, -1.0, 0.0, 2.0, 3.5, 1.0],
        ])
        .unwrap();
    test_eq_f64(&out[0], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    test_eq_f64(&out[1], &[0.5, -1.0, 0.0, 2.0, 3.5, 1.0]);
}

pub fn test_reverse_of_reshape(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2)]);
    let adj = f.reverse(1).unwrap();
    assert_eq!(adj.outputs()[1].shape(), (2, 3));
    let out = adj
        .eval(&[vec![0.0; 6], vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0]])
        .unwrap();
    test_eq_f64(&out[1], &[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
}

pub fn test_reverse_shared_input_accumulates(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2), x.vec()]);
    let adj = f.reverse(1).unwrap();
    // Inputs: x, seed of output 0, seed of output 1
    let out = adj
        .eval(&[
            vec![0.0; 6],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
        ])
        .unwrap();
    test_eq_f64(&out[2], &[11.0, 22.0, 33.0, 44.0, 55.0, 66.0]);
}

pub fn test_reverse_of_sum_same_operand(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::column(3));
    let f = builder.build(vec![x.clone()], vec![&x + &x]);
    let adj = f.reverse(1).unwrap();
    let out = adj
        .eval(&[vec![1.0, 1.0, 1.0], vec![1.0, 2.0, 3.0]])
        .unwrap();
    test_eq_f64(&out[0], &[2.0, 2.0, 2.0]);
    test_eq_f64(&out[1], &[2.0, 4.0, 6.0]);
}

pub fn test_reverse_of_transpose(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.transpose()]);
    let adj = f.reverse(1).unwrap();
    let out = adj
        .eval(&[vec![0.0; 6], vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0]])
        .unwrap();
    test_eq_f64(&out[1], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}
