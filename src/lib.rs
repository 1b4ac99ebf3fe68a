pub mod codegen;
pub mod mx;
pub mod scalar;
pub mod sparsity;
pub mod sx;

pub use mx::Mx;
pub use mx::function::{MxFunction, MxFunctionError};
pub use sparsity::Sparsity;
pub use sx::SxElem;
