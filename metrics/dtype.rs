use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// The data type a metric accumulates and reports in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
	#[serde(rename = "float32")]
	Float32,
	#[serde(rename = "float64")]
	Float64,
}

impl Display for DType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DType::Float32 => write!(f, "float32"),
			DType::Float64 => write!(f, "float64"),
		}
	}
}

/// An `Element` is a floating point type a metric can use as its dtype.
pub trait Element: Float + Debug + Display + 'static {
	const DTYPE: DType;
}

impl Element for f32 {
	const DTYPE: DType = DType::Float32;
}

impl Element for f64 {
	const DTYPE: DType = DType::Float64;
}

#[test]
fn test_dtype_serialization() {
	assert_eq!(serde_json::to_string(&DType::Float32).unwrap(), "\"float32\"");
	let dtype: DType = serde_json::from_str("\"float64\"").unwrap();
	assert_eq!(dtype, <f64 as Element>::DTYPE);
	assert_eq!(DType::Float32.to_string(), "float32");
}
