use thiserror::Error;

use crate::decision::{DecisionError, ModelError};
use crate::eval::{EvalError, RegistryError};
use crate::parser::ParseError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    // function registration
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
