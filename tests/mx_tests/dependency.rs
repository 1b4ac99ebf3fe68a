use crate::mx_tests::FunctionBuilder;
use mx_graph::{Mx, Sparsity};

pub fn test_sp_fwd_reshape(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2)]);
    let seeds = vec![0b1, 0b10, 0, 0, 0b10000, 0b100000];
    let out = f.sp_fwd(&[seeds.clone()]).unwrap();
    assert_eq!(out[0], seeds);
}

pub fn test_sp_rev_reshape(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2)]);
    let out = f.sp_rev(&[vec![0, 0, 0, 0, 1, 0]]).unwrap();
    assert_eq!(out[0], vec![0, 0, 0, 0, 1, 0]);
}

pub fn test_sp_rev_shared_input(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2), x.vec()]);
    let out = f
        .sp_rev(&[vec![0b01, 0, 0, 0, 0, 0], vec![0b10, 0, 0b10, 0, 0, 0]])
        .unwrap();
    assert_eq!(out[0], vec![0b11, 0, 0b10, 0, 0, 0]);
}

pub fn test_sp_fwd_transpose(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.transpose()]);
    let out = f.sp_fwd(&[vec![1, 2, 4, 8, 16, 32]]).unwrap();
    assert_eq!(out[0], vec![1, 4, 16, 2, 8, 32]);
    let back = f.sp_rev(&[vec![1, 0, 0, 2, 0, 0]]).unwrap();
    assert_eq!(back[0], vec![1, 2, 0, 0, 0, 0]);
}
