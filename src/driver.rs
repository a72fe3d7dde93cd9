use std::{fs, io, path::PathBuf};

use clap::Parser;
use log::{debug, info};
use minc_asm::{OperatingSystem, TargetContext};
use minc_asmgen::CodegenError;
use minc_emit::EmitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Could not read input file {}: {source}", .path.display())]
    Input { path: PathBuf, source: io::Error },
    #[error("Could not parse the AST in {}: {source}", .path.display())]
    Ast {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("Could not write to stdout: {0}")]
    Stdout(#[source] io::Error),
}

impl DriverError {
    /// Errors that can only happen when an earlier stage let an invalid AST through.
    pub fn is_internal(&self) -> bool {
        matches!(self, DriverError::Codegen(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    File(PathBuf),
    Stdout,
}

/// Code generator for validated minc programs.
///
/// The input is the JSON encoded AST produced by the front end after validation.
#[derive(Parser, Debug)]
#[command(name = "minc", version)]
pub struct Options {
    /// JSON file with the validated AST
    pub input_file: PathBuf,

    /// Where to write the assembly, `-` for stdout. Defaults to the input with a `.s` extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Operating system whose symbol and section conventions are used
    #[arg(long, default_value_t = OperatingSystem::host())]
    pub target_os: OperatingSystem,

    /// Stop after lowering and print the instruction program
    #[arg(long)]
    pub codegen: bool,
}

impl Options {
    pub fn target(&self) -> TargetContext {
        TargetContext::new(self.target_os)
    }

    pub fn assembly_file(&self) -> Output {
        match &self.output {
            Some(path) if path.as_os_str() == "-" => Output::Stdout,
            Some(path) => Output::File(path.clone()),
            None => Output::File(self.input_file.with_extension("s")),
        }
    }

    pub fn read_program(&self) -> Result<minc_ast::Program, DriverError> {
        let input = fs::read_to_string(&self.input_file).map_err(|source| DriverError::Input {
            path: self.input_file.clone(),
            source,
        })?;

        serde_json::from_str(&input).map_err(|source| DriverError::Ast {
            path: self.input_file.clone(),
            source,
        })
    }

    /// Runs the code gen without creating the file.
    pub fn run_code_gen(
        &self,
        program: &minc_ast::Program,
    ) -> Result<minc_asm::Program, DriverError> {
        let program = minc_asmgen::code_generation(program, &self.target())?;

        if self.codegen {
            println!("{:#?}", program);
        }

        Ok(program)
    }

    pub fn run_assembly_emission(&self, program: &minc_asm::Program) -> Result<(), DriverError> {
        let ctx = self.target();

        match self.assembly_file() {
            Output::File(path) => minc_emit::write_to_path(&path, program, &ctx)?,
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                minc_emit::write_program(&mut stdout, program, &ctx)
                    .map_err(DriverError::Stdout)?;
            }
        }

        Ok(())
    }
}

pub fn run(opts: &Options) -> Result<(), DriverError> {
    info!(
        "compiling {} for {}",
        opts.input_file.display(),
        opts.target_os
    );

    let program = opts.read_program()?;
    debug!("read {} function declarations", program.declarations.len());

    let program = opts.run_code_gen(&program)?;

    if opts.codegen {
        return Ok(());
    }

    opts.run_assembly_emission(&program)
}
