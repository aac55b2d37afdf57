pub mod dense;
pub mod library;
pub mod operator;
pub mod sequence;

pub use dense::DenseTransferFunction;
pub use library::{OperatorKind, OperatorLibrary};
pub use operator::TransferOperator;
pub use sequence::TransferOperatorSequence;
