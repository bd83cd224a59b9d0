use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    /// Returns `true` if the error belongs to the locally recoverable classes
    /// (everything except transport failures).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Transport { .. })
    }

    pub fn decode(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Decode {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn unsupported_type(context: impl Into<String>, type_name: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnsupportedType {
                context: context.into(),
                type_name: type_name.into(),
            }
            .into(),
        )
    }

    pub fn shape_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Error {
        Error(
            ErrorKind::ShapeMismatch {
                name: name.into(),
                expected,
                actual,
            }
            .into(),
        )
    }

    pub fn cast(expected: impl Into<String>, class_name: impl Into<String>) -> Error {
        Error(
            ErrorKind::Cast {
                expected: expected.into(),
                class_name: class_name.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn transport(context: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Transport {
                context: context.into(),
                message: message.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("failed to decode '{element}': {message}")]
    Decode { element: String, message: String },

    #[error("unsupported element type {type_name} in {context}")]
    UnsupportedType { context: String, type_name: String },

    #[error("component count mismatch for '{name}': expected {expected}, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("cannot treat {class_name} as {expected}")]
    Cast { expected: String, class_name: String },

    #[error("transport failure in {context}: {message}")]
    Transport { context: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
