use thiserror::Error;

/// Everything that can go wrong while lowering. The front end validates names and operators
/// before the backend ever runs, so each of these points at a compiler bug rather than at the
/// program being compiled.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodegenError {
    #[error("Variable \"{name}\" is already declared in function \"{function}\"")]
    VariableAlreadyDeclared { name: String, function: String },
    #[error("Could not find variable \"{name}\" in function \"{function}\"")]
    VariableNotFound { name: String, function: String },
    #[error("Could not find function \"{0}\"")]
    FunctionNotFound(String),
    #[error("Unsupported binary operator \"{0}\"")]
    UnsupportedOperator(&'static str),
    #[error("Stack cursor of \"{function}\" ended at {cursor}, its frame has {frame_size} bytes")]
    FrameSizeMismatch {
        function: String,
        frame_size: u64,
        cursor: i64,
    },
}
