use crate::mx::function::MxFunction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("Formatting error: {0}")]
    Format(#[from] fmt::Error),
    #[error("Invalid code generation config: {0}")]
    Config(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    pub real_type: String,
    pub int_type: String,
    /// Emit a comment in front of the code of every node.
    pub verbose: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            real_type: "double".to_string(),
            int_type: "int".to_string(),
            verbose: false,
        }
    }
}

impl CodegenConfig {
    pub fn from_json(text: &str) -> Result<Self, CodegenError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, CodegenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What a node needs from the code generator to emit its own statements.
pub trait CodeEmitter {
    /// Name of the array backing a work slot.
    fn work(&self, slot: usize) -> String;

    /// Emit a copy of `n` elements from `src` to `dst`, using `it` as loop variable.
    /// With `rev` set the elements are visited from last to first.
    fn copy_vector(
        &mut self,
        stream: &mut String,
        src: &str,
        n: usize,
        dst: &str,
        it: &str,
        rev: bool,
    ) -> fmt::Result;

    /// Register a table of real constants, returning its name.
    fn add_constant(&mut self, values: &[f64]) -> String;

    /// Register a table of integers, returning its name.
    fn add_integers(&mut self, values: &[usize]) -> String;

    fn comment(&mut self, _stream: &mut String, _text: &str) -> fmt::Result {
        Ok(())
    }
}

/// Emits a self contained C function for an [`MxFunction`].
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    config: CodegenConfig,
    constants: Vec<Vec<f64>>,
    integers: Vec<Vec<usize>>,
}

impl CodeGenerator {
    pub fn new(config: CodegenConfig) -> Self {
        Self {
            config,
            constants: vec![],
            integers: vec![],
        }
    }

    /// `void name(const real** arg, real** res)`, with one local array per work slot.
    pub fn generate(&mut self, name: &str, function: &MxFunction) -> Result<String, CodegenError> {
        // Tables belong to one generated unit
        self.constants.clear();
        self.integers.clear();
        let mut body = String::new();
        function.generate(&mut body, self)?;

        let real = &self.config.real_type;
        let int = &self.config.int_type;
        let mut out = String::new();
        for (k, values) in self.constants.iter().enumerate() {
            let values: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
            writeln!(
                out,
                "static const {real} c{k}[{}] = {{{}}};",
                values.len(),
                values.join(", ")
            )?;
        }
        for (k, values) in self.integers.iter().enumerate() {
            let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(
                out,
                "static const {int} m{k}[{}] = {{{}}};",
                values.len(),
                values.join(", ")
            )?;
        }
        if !out.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "void {name}(const {real}** arg, {real}** res) {{")?;
        writeln!(out, "  {int} i;")?;
        for (s, n) in function.slot_sizes().into_iter().enumerate() {
            // Zero length arrays are not valid C
            writeln!(out, "  {real} w{s}[{}];", n.max(1))?;
        }
        out.push_str(&body);
        writeln!(out, "}}")?;
        log::debug!(
            "Generated {name} with {} work arrays and {} constant tables",
            function.algorithm().len(),
            self.constants.len() + self.integers.len()
        );
        Ok(out)
    }
}

impl CodeEmitter for CodeGenerator {
    fn work(&self, slot: usize) -> String {
        format!("w{slot}")
    }

    fn copy_vector(
        &mut self,
        stream: &mut String,
        src: &str,
        n: usize,
        dst: &str,
        it: &str,
        rev: bool,
    ) -> fmt::Result {
        if n == 0 {
            return Ok(());
        }
        if rev {
            writeln!(stream, "  for ({it}={}; {it}>=0; --{it}) {dst}[{it}] = {src}[{it}];", n - 1)
        } else {
            writeln!(stream, "  for ({it}=0; {it}<{n}; ++{it}) {dst}[{it}] = {src}[{it}];")
        }
    }

    fn add_constant(&mut self, values: &[f64]) -> String {
        let k = match self.constants.iter().position(|c| c.as_slice() == values) {
            Some(k) => k,
            None => {
                self.constants.push(values.to_vec());
                self.constants.len() - 1
            }
        };
        format!("c{k}")
    }

    fn add_integers(&mut self, values: &[usize]) -> String {
        let k = match self.integers.iter().position(|m| m.as_slice() == values) {
            Some(k) => k,
            None => {
                self.integers.push(values.to_vec());
                self.integers.len() - 1
            }
        };
        format!("m{k}")
    }

    fn comment(&mut self, stream: &mut String, text: &str) -> fmt::Result {
        if self.config.verbose {
            writeln!(stream, "  /* {text} */")?;
        }
        Ok(())
    }
}
