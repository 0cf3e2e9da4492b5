use crate::dtype::DType;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// Two operands, such as the values and the sample weight, could not be broadcast together after rank alignment.
	#[error("shapes {lhs:?} and {rhs:?} are not broadcastable")]
	IncompatibleShapes { lhs: Vec<usize>, rhs: Vec<usize> },
	#[error("{0} cannot be represented as {1}")]
	Cast(String, &'static str),
	/// Metrics that wrap a function cannot be rebuilt from their configuration because the function itself is not serialized.
	#[error("adding {num_samples} samples to a count of {count} overflows")]
	CountOverflow { count: i64, num_samples: i64 },
	#[error("{name} cannot be constructed from its configuration")]
	FromConfigUnsupported { name: String },
	#[error("expected a configuration with dtype {expected}, found {found}")]
	DTypeMismatch { expected: DType, found: DType },
	#[error(transparent)]
	Json(#[from] serde_json::Error),
	#[error(transparent)]
	Array(#[from] ndarray::ShapeError),
}
