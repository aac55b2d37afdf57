use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;
pub type SpectrumResult<T> = Result<T, SpectrumError>;

/// Failures raised by the spectral remapping and evolution engine.
///
/// Every variant is local and non-retryable: the call that detects it aborts.
/// Underflow below a target grid is not an error; it is accumulated on the
/// resulting spectrum instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectrumError {
    #[error("{context}: length mismatch, expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(
        "{context}: abscissa must be strictly increasing, index {index} has {current} after {previous}"
    )]
    UnorderedGrid {
        context: &'static str,
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("an energy grid needs at least 2 bins to define bin widths, got {actual}")]
    InsufficientBins { actual: usize },
    #[error(
        "target abscissa tops out at {target_top} below the input top {input_top}; overflow is not supported"
    )]
    OverflowNotSupported { target_top: f64, input_top: f64 },
    #[error("input energy {energy} lies above the representable range of the target grid")]
    Overflow { energy: f64 },
    #[error("{context}: energy abscissae do not agree")]
    AbscissaMismatch { context: &'static str },
    #[error("query {parameter}={value} lies outside the tabulated range [{low}, {high}]")]
    Domain {
        parameter: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },
    #[error(
        "transfer operators must be strictly decreasing in redshift, index {index} has {current} after {previous}"
    )]
    UnorderedRedshift {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error(
        "transfer operators must share one step width, index {index} has dlnz {actual} instead of {expected}"
    )]
    NonUniformStep {
        index: usize,
        expected: f64,
        actual: f64,
    },
    #[error("{context}: value at index {index} must be finite, got {value}")]
    NonFiniteValue {
        context: &'static str,
        index: usize,
        value: f64,
    },
    #[error("quadrature over [{low}, {high}] did not converge within depth {max_depth}")]
    Integration { low: f64, high: f64, max_depth: u32 },
    #[error("no transfer operators registered for '{kind}'")]
    MissingOperator { kind: &'static str },
    #[error("{0}")]
    InvalidArgument(String),
}

impl SpectrumError {
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "INPUT.SHAPE_MISMATCH",
            Self::UnorderedGrid { .. } => "INPUT.UNORDERED_GRID",
            Self::InsufficientBins { .. } => "INPUT.INSUFFICIENT_BINS",
            Self::OverflowNotSupported { .. } => "RUN.OVERFLOW_NOT_SUPPORTED",
            Self::Overflow { .. } => "RUN.OVERFLOW",
            Self::AbscissaMismatch { .. } => "INPUT.ABSCISSA_MISMATCH",
            Self::Domain { .. } => "INPUT.DOMAIN",
            Self::UnorderedRedshift { .. } => "INPUT.UNORDERED_REDSHIFT",
            Self::NonUniformStep { .. } => "INPUT.NON_UNIFORM_STEP",
            Self::NonFiniteValue { .. } => "INPUT.NON_FINITE",
            Self::Integration { .. } => "RUN.INTEGRATION",
            Self::MissingOperator { .. } => "INPUT.MISSING_OPERATOR",
            Self::InvalidArgument(_) => "INPUT.INVALID_ARGUMENT",
        }
    }

    pub const fn category(&self) -> EngineErrorCategory {
        match self {
            Self::OverflowNotSupported { .. } | Self::Overflow { .. } | Self::Integration { .. } => {
                EngineErrorCategory::ComputationError
            }
            _ => EngineErrorCategory::InputValidationError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl EngineErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    category: EngineErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl EngineError {
    pub fn new(
        category: EngineErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            EngineErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(EngineErrorCategory::IoSystemError, placeholder, message)
    }

    pub const fn category(&self) -> EngineErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl From<SpectrumError> for EngineError {
    fn from(error: SpectrumError) -> Self {
        Self::new(error.category(), error.placeholder(), error.to_string())
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for EngineError {}
