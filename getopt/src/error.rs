#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed option spec {spec:?}: {reason}")]
    Spec { spec: String, reason: String },

    #[error("missing argument to required option {0}")]
    MissingArgument(String),

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("argument required for {flag} ({help})")]
    ArgumentRequired { flag: String, help: String },

    #[error("bad value for {flag}: {source}")]
    Conversion {
        flag: String,
        #[source]
        source: ConversionError,
    },

    #[error("missing required option {0}")]
    MissingRequired(String),

    #[error("duplicate option key {spelling}: {existing} & {added}")]
    Duplicate {
        spelling: String,
        existing: String,
        added: String,
    },

    #[error("option has neither a short nor a long name ({0})")]
    NoSpelling(String),

    #[error("`{0}` cannot be used as a short option")]
    InvalidShort(char),
}

impl Error {
    /// True for errors raised while declaring options rather than parsing.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Error::Duplicate { .. } | Error::NoSpelling(_) | Error::InvalidShort(_)
        )
    }
}

/// A raw argument that could not be turned into the slot's value type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {input:?}: {reason}")]
pub struct ConversionError {
    pub input: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        ConversionError {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
