use crate::mx_tests::FunctionBuilder;
use mx_graph::codegen::{CodeGenerator, CodegenConfig};
use mx_graph::{Mx, Sparsity};

pub fn test_generated_code_reshape(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.reshape_to(3, 2)]);
    let code = CodeGenerator::default().generate("f", &f).unwrap();
    let expected = "\
void f(const double** arg, double** res) {
  int i;
  double w0[6];
  double w1[6];
  for (i=0; i<6; ++i) w0[i] = arg[0][i];
  for (i=0; i<6; ++i) w1[i] = w0[i];
  for (i=0; i<6; ++i) res[0][i] = w1[i];
}
";
    assert_eq!(code, expected);
}

pub fn test_generated_code_verbose_float(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.vec()]);
    let config = CodegenConfig::from_json(r#"{"real_type": "float", "verbose": true}"#).unwrap();
    let code = CodeGenerator::new(config).generate("g", &f).unwrap();
    assert!(code.starts_with("void g(const float** arg, float** res) {\n"));
    assert!(code.contains("  float w1[6];\n"));
    assert!(code.contains("  /* #1: Reshape */\n"));
}

pub fn test_generated_constant_table(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::column(2));
    let c = Mx::constant(vec![1.0, 2.5], Sparsity::column(2));
    let f = builder.build(vec![x.clone()], vec![&x + &c]);
    let code = CodeGenerator::default().generate("h", &f).unwrap();
    assert!(code.starts_with("static const double c0[2] = {1.0, 2.5};\n\n"));
    assert!(code.contains("  for (i=0; i<2; ++i) w1[i] = c0[i];\n"));
    assert!(code.contains("  for (i=0; i<2; ++i) w2[i] = w0[i]+w1[i];\n"));
}

pub fn test_generated_transpose_table(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let f = builder.build(vec![x.clone()], vec![x.transpose()]);
    let code = CodeGenerator::default().generate("t", &f).unwrap();
    assert!(code.starts_with("static const int m0[6] = {0, 2, 4, 1, 3, 5};\n"));
    assert!(code.contains("  for (i=0; i<6; ++i) w1[i] = w0[m0[i]];\n"));
}

pub fn test_generator_reuse(builder: &FunctionBuilder) {
    let x = Mx::sym("x", Sparsity::column(2));
    let c = Mx::constant(vec![1.0, 2.5], Sparsity::column(2));
    let f = builder.build(vec![x.clone()], vec![&x + &c]);
    let y = Mx::sym("y", Sparsity::dense(2, 3));
    let g = builder.build(vec![y.clone()], vec![y.reshape_to(3, 2)]);

    let mut generator = CodeGenerator::default();
    let first = generator.generate("f", &f).unwrap();
    assert!(first.contains("static const double c0[2] = {1.0, 2.5};"));
    let second = generator.generate("g", &g).unwrap();
    assert!(!second.contains("static const"));
    assert!(second.starts_with("void g(const double** arg, double** res) {\n"));
    // Generating again gives the same unit, tables numbered from zero
    assert_eq!(generator.generate("f", &f).unwrap(), first);
}
