use std::fmt;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionError {
    #[error("{name} is required!")]
    MissingRequiredValue { name: String },

    #[error("{name} does not accept multiple values (got {count})!")]
    Multiplicity { name: String, count: usize },

    #[error("{value} is not a valid choice for {name}! Valid choices: {}", .choices.join(", "))]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("Could not parse '{value}' for {name} as a date with format '{format}'")]
    DateParse {
        name: String,
        value: String,
        format: String,
    },

    #[error("Unknown option '{name}'")]
    UnknownOption { name: String },
}

impl OptionError {
    /// Name of the option the failure belongs to.
    pub fn option_name(&self) -> &str {
        match self {
            OptionError::MissingRequiredValue { name }
            | OptionError::Multiplicity { name, .. }
            | OptionError::InvalidChoice { name, .. }
            | OptionError::DateParse { name, .. }
            | OptionError::UnknownOption { name } => name,
        }
    }
}

/// Every per-option failure found while constructing a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    errors: Vec<OptionError>,
}

impl ValidationError {
    pub(crate) fn new(errors: Vec<OptionError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[OptionError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<OptionError> {
        self.errors
    }

    /// Failures reported for one option.
    pub fn for_option<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a OptionError> + 'a {
        self.errors
            .iter()
            .filter(move |error| error.option_name() == name)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid option(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

/// Non-fatal findings recorded while constructing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionWarning {
    /// A value was supplied for an option this service ignores.
    Ignored { name: String },
}

impl Display for OptionWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OptionWarning::Ignored { name } => write!(f, "{} is ignored for this service!", name),
        }
    }
}
