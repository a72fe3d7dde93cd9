use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use minc_asm::{
    Instruction, Label, OpCode, Operand, OperatingSystem, Program, Section, TargetContext, Width,
};
use thiserror::Error;

/// A structure that implements this trait can render itself as AT&T assembly for the given
/// target.
pub trait EmitAsm {
    fn emit(&self, ctx: &TargetContext) -> String;
}

impl EmitAsm for Label {
    fn emit(&self, ctx: &TargetContext) -> String {
        match (self, ctx.os) {
            (Label::Start, OperatingSystem::Linux) => "_start".to_owned(),
            (Label::Start, OperatingSystem::MacOs) => "start".to_owned(),
            (Label::Function(name), OperatingSystem::Linux) => name.to_owned(),
            (Label::Function(name), OperatingSystem::MacOs) => format!("_{name}"),
            (Label::Epilogue(name), _) => format!(".L{name}_epilogue"),
        }
    }
}

impl EmitAsm for Operand {
    fn emit(&self, ctx: &TargetContext) -> String {
        match self {
            Operand::Register(reg, width) => format!("%{}", reg.name(*width)),
            Operand::RegisterOffset(reg, _, offset) => {
                format!("{}(%{})", offset, reg.name(Width::Quad))
            }
            Operand::Constant(val) => format!("${}", val),
            Operand::Label(label) => label.emit(ctx),
        }
    }
}

impl EmitAsm for Section {
    fn emit(&self, ctx: &TargetContext) -> String {
        match (self, ctx.os) {
            (Section::Text, OperatingSystem::Linux) => ".section .text".to_owned(),
            (Section::Text, OperatingSystem::MacOs) => ".section __TEXT,__text".to_owned(),
            (Section::GnuStack, OperatingSystem::Linux) => {
                ".section .note.GNU-stack,\"\",@progbits".to_owned()
            }
            // Mach-O has no such note, the stack is never executable there.
            (Section::GnuStack, OperatingSystem::MacOs) => String::new(),
        }
    }
}

fn mnemonic(op: OpCode) -> &'static str {
    match op {
        OpCode::Section(_) => ".section",
        OpCode::Global => ".globl",
        OpCode::Mov => "mov",
        OpCode::Add => "add",
        OpCode::Sub => "sub",
        OpCode::Imul => "imul",
        OpCode::Jmp => "jmp",
        OpCode::Call => "call",
        OpCode::Ret => "ret",
        OpCode::Push => "push",
        OpCode::Pop => "pop",
        OpCode::Syscall => "syscall",
    }
}

/// The widest operand decides the suffix, size-agnostic operands leave it at 64 bit.
pub fn operand_size(operands: &[Operand]) -> Width {
    operands
        .iter()
        .filter_map(Operand::width)
        .max()
        .unwrap_or(Width::Quad)
}

impl EmitAsm for Instruction {
    fn emit(&self, ctx: &TargetContext) -> String {
        let mut out = String::new();

        if let Some(label) = &self.label {
            out.push_str(&format!("{}:\n", label.emit(ctx)));
        }

        // stored destination first, AT&T wants the source first
        let mut operands = self.operands.clone();
        if operands.len() > 1 {
            operands.rotate_right(1);
        }
        let operands = operands
            .iter()
            .map(|operand| operand.emit(ctx))
            .collect::<Vec<_>>()
            .join(", ");

        let line = match self.op {
            OpCode::Section(section) => section.emit(ctx),
            OpCode::Global => format!("{} {}", mnemonic(self.op), operands),
            op => {
                let suffix = if op.is_sized() {
                    operand_size(&self.operands).suffix().to_string()
                } else {
                    String::new()
                };

                if operands.is_empty() {
                    format!("\t{}{}", mnemonic(op), suffix)
                } else {
                    format!("\t{}{} {}", mnemonic(op), suffix, operands)
                }
            }
        };

        if !line.is_empty() {
            out.push_str(&line);
            out.push('\n');
        }

        out
    }
}

impl EmitAsm for Program {
    fn emit(&self, ctx: &TargetContext) -> String {
        trace!(
            "printing {} instructions for {}",
            self.instructions().len(),
            ctx.os
        );

        self.instructions()
            .iter()
            .map(|inst| inst.emit(ctx))
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Could not create output file {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("Could not write output file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

pub fn emit_program(program: &Program, ctx: &TargetContext) -> String {
    program.emit(ctx)
}

pub fn write_program<W: Write>(
    writer: &mut W,
    program: &Program,
    ctx: &TargetContext,
) -> io::Result<()> {
    writer.write_all(program.emit(ctx).as_bytes())?;
    writer.flush()
}

/// Prints the program into `path`. The file is only opened once the text is ready and is
/// flushed and closed before returning, whether writing succeeded or not.
pub fn write_to_path(path: &Path, program: &Program, ctx: &TargetContext) -> Result<(), EmitError> {
    let text = program.emit(ctx);

    let file = File::create(path).map_err(|source| EmitError::Create {
        path: path.to_owned(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|source| EmitError::Write {
            path: path.to_owned(),
            source,
        })?;

    debug!("wrote {} bytes of assembly to {}", text.len(), path.display());
    Ok(())
}
