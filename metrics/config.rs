use crate::{
	dtype::{DType, Element},
	error::{Error, Result},
};
use serde::{Deserialize, Serialize};

/// The configuration of a metric, which is enough to construct a fresh instance of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
	pub name: String,
	pub dtype: DType,
}

impl MetricConfig {
	pub fn new<T: Element>(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			dtype: T::DTYPE,
		}
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub(crate) fn check_dtype<T: Element>(&self) -> Result<()> {
		if self.dtype != T::DTYPE {
			return Err(Error::DTypeMismatch {
				expected: T::DTYPE,
				found: self.dtype,
			});
		}
		Ok(())
	}
}

#[test]
fn test_json() {
	let config = MetricConfig::new::<f32>("loss");
	let json = config.to_json().unwrap();
	assert_eq!(json, r#"{"name":"loss","dtype":"float32"}"#);
	assert_eq!(MetricConfig::from_json(&json).unwrap(), config);
	assert!(matches!(
		config.check_dtype::<f64>(),
		Err(Error::DTypeMismatch { .. })
	));
	assert!(MetricConfig::from_json("{\"name\":\"loss\"}").is_err());
}
