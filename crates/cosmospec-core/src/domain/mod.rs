pub mod errors;

pub use errors::{
    EngineError, EngineErrorCategory, EngineResult, SpectrumError, SpectrumResult,
};
