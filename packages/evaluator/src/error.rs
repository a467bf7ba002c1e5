use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

/// Runtime failure of a line, named after the Python exception it mirrors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("NameError: name '{name}' is not defined")]
    Name { name: String },

    #[error("TypeError: {0}")]
    Type(String),

    #[error("ValueError: {0}")]
    Value(String),

    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),

    #[error("IndexError: {0}")]
    Index(String),

    #[error("KeyError: {0}")]
    Key(String),

    #[error("OverflowError: {0}")]
    Overflow(String),

    #[error("AttributeError: {0}")]
    Attribute(String),
}

impl EvalError {
    pub fn undefined(name: impl Into<String>) -> Self {
        Self::Name { name: name.into() }
    }

    /// Exception class name
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::Name { .. } => "NameError",
            EvalError::Type(_) => "TypeError",
            EvalError::Value(_) => "ValueError",
            EvalError::ZeroDivision(_) => "ZeroDivisionError",
            EvalError::Index(_) => "IndexError",
            EvalError::Key(_) => "KeyError",
            EvalError::Overflow(_) => "OverflowError",
            EvalError::Attribute(_) => "AttributeError",
        }
    }

    pub(crate) fn overflow() -> Self {
        Self::Overflow("integer result out of range".to_string())
    }
}
