use serde::{Deserialize, Serialize};

pub type Identifier = String;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Var(Identifier),
    Constant(i32),
    Binary {
        op: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    FunctionCall(Identifier, Vec<Expression>),
}

impl Expression {
    pub fn binary(op: BinaryOperator, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn var(name: &str) -> Self {
        Expression::Var(name.to_owned())
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(name.to_owned(), args)
    }
}

/// The front end knows more operators than the backend lowers. Only `Add`, `Subtract` and
/// `Multiply` reach machine code, everything else is rejected during lowering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
        }
    }
}

/// The only value type of the language, a 32 bit signed integer.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Int,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    VarDecl(VariableDeclaration),
    Assignment {
        name: Identifier,
        value: Expression,
    },
    Expression(Expression),
    Return(Option<Expression>),
    Compound(Block),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: Identifier,
    pub ty: Type,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block(pub Vec<Statement>);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Identifier,
    pub ty: Type,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub params: Vec<Parameter>,
    /// Only records whether a return type was written, `int` is the only one there is.
    pub return_type: Option<Type>,
    pub body: Block,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub declarations: Vec<FunctionDeclaration>,
}
