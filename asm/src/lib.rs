pub mod target;

pub use target::{Architecture, OperatingSystem, TargetContext, TargetParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Width {
    Byte,
    Word,
    Long,
    Quad,
}

impl Width {
    /// The AT&T mnemonic suffix for this operand size.
    pub fn suffix(&self) -> char {
        match self {
            Width::Byte => 'b',
            Width::Word => 'w',
            Width::Long => 'l',
            Width::Quad => 'q',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    AX,
    CX,
    DX,
    DI,
    SI,
    R8,
    R9,
    R10,
    SP,
    BP,
}

impl Register {
    /// Name of the register view with the given width, without the `%` sigil.
    pub fn name(&self, width: Width) -> &'static str {
        match self {
            Register::AX => match width {
                Width::Byte => "al",
                Width::Word => "ax",
                Width::Long => "eax",
                Width::Quad => "rax",
            },
            Register::CX => match width {
                Width::Byte => "cl",
                Width::Word => "cx",
                Width::Long => "ecx",
                Width::Quad => "rcx",
            },
            Register::DX => match width {
                Width::Byte => "dl",
                Width::Word => "dx",
                Width::Long => "edx",
                Width::Quad => "rdx",
            },
            Register::DI => match width {
                Width::Byte => "dil",
                Width::Word => "di",
                Width::Long => "edi",
                Width::Quad => "rdi",
            },
            Register::SI => match width {
                Width::Byte => "sil",
                Width::Word => "si",
                Width::Long => "esi",
                Width::Quad => "rsi",
            },
            Register::R8 => match width {
                Width::Byte => "r8b",
                Width::Word => "r8w",
                Width::Long => "r8d",
                Width::Quad => "r8",
            },
            Register::R9 => match width {
                Width::Byte => "r9b",
                Width::Word => "r9w",
                Width::Long => "r9d",
                Width::Quad => "r9",
            },
            Register::R10 => match width {
                Width::Byte => "r10b",
                Width::Word => "r10w",
                Width::Long => "r10d",
                Width::Quad => "r10",
            },
            Register::SP => match width {
                Width::Byte => "spl",
                Width::Word => "sp",
                Width::Long => "esp",
                Width::Quad => "rsp",
            },
            Register::BP => match width {
                Width::Byte => "bpl",
                Width::Word => "bp",
                Width::Long => "ebp",
                Width::Quad => "rbp",
            },
        }
    }
}

/// A symbol an instruction can refer to. The printer decides how each kind is spelled on the
/// target, so declarations and references always agree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// The synthetic process entry point.
    Start,
    /// A user function, visible to the linker.
    Function(String),
    /// The single exit block of the named function, local to the object file.
    Epilogue(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operand {
    Register(Register, Width),
    /// A memory access of `Width` at `offset(%base)`, the base is always addressed in 64 bit.
    RegisterOffset(Register, Width, i64),
    /// Immediate value, kept in the textual form of the source literal.
    Constant(String),
    Label(Label),
}

impl Operand {
    pub fn constant(value: impl ToString) -> Self {
        Operand::Constant(value.to_string())
    }

    /// `None` for operands that do not constrain the operand size (constants and labels).
    pub fn width(&self) -> Option<Width> {
        match self {
            Operand::Register(_, width) | Operand::RegisterOffset(_, width, _) => Some(*width),
            Operand::Constant(_) | Operand::Label(_) => None,
        }
    }

    /// Returns the same location viewed with another width. Size-agnostic operands are
    /// returned unchanged.
    pub fn with_width(&self, width: Width) -> Self {
        match self {
            Operand::Register(reg, _) => Operand::Register(*reg, width),
            Operand::RegisterOffset(reg, _, offset) => {
                Operand::RegisterOffset(*reg, width, *offset)
            }
            operand => operand.clone(),
        }
    }

    pub fn is_register(&self, register: Register) -> bool {
        matches!(self, Operand::Register(reg, _) if *reg == register)
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::RegisterOffset(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Text,
    /// Marks the stack as non executable, only meaningful for ELF targets.
    GnuStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpCode {
    Section(Section),
    Global,
    Mov,
    Add,
    Sub,
    Imul,
    Jmp,
    Call,
    Ret,
    Push,
    Pop,
    Syscall,
}

impl OpCode {
    /// Whether the mnemonic takes an operand-size suffix.
    pub fn is_sized(&self) -> bool {
        matches!(
            self,
            OpCode::Mov | OpCode::Add | OpCode::Sub | OpCode::Imul | OpCode::Push | OpCode::Pop
        )
    }
}

/// A single machine instruction or directive. Operands are stored destination first, the
/// printer takes care of the AT&T order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instruction {
    pub label: Option<Label>,
    pub op: OpCode,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(op: OpCode, operands: Vec<Operand>) -> Self {
        Self {
            label: None,
            op,
            operands,
        }
    }

    /// Attaches `label` so it is printed right before this instruction.
    pub fn labeled(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn section(section: Section) -> Self {
        Self::new(OpCode::Section(section), vec![])
    }

    pub fn global(label: Label) -> Self {
        Self::new(OpCode::Global, vec![Operand::Label(label)])
    }

    pub fn mov(dst: Operand, src: Operand) -> Self {
        Self::new(OpCode::Mov, vec![dst, src])
    }

    pub fn add(dst: Operand, src: Operand) -> Self {
        Self::new(OpCode::Add, vec![dst, src])
    }

    pub fn sub(dst: Operand, src: Operand) -> Self {
        Self::new(OpCode::Sub, vec![dst, src])
    }

    pub fn imul(dst: Operand, src: Operand) -> Self {
        Self::new(OpCode::Imul, vec![dst, src])
    }

    pub fn jmp(target: Label) -> Self {
        Self::new(OpCode::Jmp, vec![Operand::Label(target)])
    }

    pub fn call(target: Label) -> Self {
        Self::new(OpCode::Call, vec![Operand::Label(target)])
    }

    pub fn ret() -> Self {
        Self::new(OpCode::Ret, vec![])
    }

    pub fn push(operand: Operand) -> Self {
        Self::new(OpCode::Push, vec![operand])
    }

    pub fn pop(operand: Operand) -> Self {
        Self::new(OpCode::Pop, vec![operand])
    }

    pub fn syscall() -> Self {
        Self::new(OpCode::Syscall, vec![])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program(pub Vec<Instruction>);

impl Program {
    pub fn push(&mut self, instruction: Instruction) {
        self.0.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.0
    }
}
