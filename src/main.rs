use mx_graph::codegen::{CodeGenerator, CodegenConfig};
use mx_graph::{Mx, MxFunction, Sparsity, SxElem};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let x = Mx::sym("x", Sparsity::dense(2, 3));
    let y = Mx::sym("y", Sparsity::dense(3, 2));
    let f = MxFunction::new(vec![x.clone(), y.clone()], vec![&x.reshape_to(3, 2) + &y, x.vec()])?;
    print!("{f}");

    let values = f.eval(&[
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
    ])?;
    log::info!("Numeric outputs: {values:?}");

    let symbolic = f.eval(&[SxElem::sym_vector("x", 6), SxElem::sym_vector("y", 6)])?;
    for (i, out) in symbolic.iter().enumerate() {
        let elements: Vec<String> = out.iter().map(|e| e.to_string()).collect();
        println!("output[{i}] = [{}]", elements.join(", "));
    }

    let bits = f.sp_fwd(&[vec![1, 2, 4, 8, 16, 32], vec![0; 6]])?;
    log::info!("Forward dependency bits: {bits:?}");

    let adjoint = f.reverse(1)?;
    print!("{adjoint}");

    let config = match std::env::args().nth(1) {
        Some(path) => CodegenConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CodegenConfig::default(),
    };
    log::info!("Code generation config: {}", config.to_json()?);
    let code = CodeGenerator::new(config).generate("reshape_demo", &f)?;
    println!("{code}");
    Ok(())
}
