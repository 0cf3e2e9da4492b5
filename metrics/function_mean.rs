use crate::{
	config::MetricConfig,
	dtype::{DType, Element},
	error::{Error, Result},
	masked::Masked,
	mean::Mean,
	reduce::apply_mask,
	StreamingMetric,
};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed keyword arguments passed to a scoring function on every call.
pub type Kwargs = serde_json::Map<String, Value>;

/// A scoring function taking `(y_true, y_pred, kwargs)` and returning one score per sample.
pub type ScoreFn<T> = fn(ArrayViewD<T>, ArrayViewD<T>, &Kwargs) -> Result<ArrayD<T>>;

/**
`FunctionMean` computes the mean of a scoring function's per sample output over all batches seen.

```
use ndarray::prelude::*;
use tangram_reduction_metrics::{FunctionMean, Kwargs, Result, StreamingMetric};

fn absolute_difference(
	y_true: ArrayViewD<f32>,
	y_pred: ArrayViewD<f32>,
	_: &Kwargs,
) -> Result<ArrayD<f32>> {
	Ok((&y_pred - &y_true).mapv(f32::abs))
}

let mut metric = FunctionMean::<f32, _>::new("absolute_difference", absolute_difference);
let y_true = arr1(&[1.0, 2.0]).into_dyn();
let y_pred = arr1(&[2.0, 4.0]).into_dyn();
metric.update_state(y_true.view(), &y_pred, None).unwrap();
assert!((metric.result() - 1.5).abs() < 1e-6);
```

A mask attached to `y_pred` is merged into the sample weight when one is given.
*/
pub struct FunctionMean<T, F>
where
	T: Element,
{
	mean: Mean<T>,
	fn_name: String,
	f: F,
	kwargs: Kwargs,
}

/// The input to [`FunctionMean`](struct.FunctionMean.html).
pub struct PredictionInput<'a, T> {
	pub y_true: ArrayViewD<'a, T>,
	pub y_pred: Masked<'a, T>,
	pub sample_weight: Option<ArrayViewD<'a, T>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionMeanConfig {
	#[serde(flatten)]
	pub base: MetricConfig,
	#[serde(rename = "fn")]
	pub fn_name: String,
	#[serde(flatten)]
	pub kwargs: Kwargs,
}

impl<T, F> FunctionMean<T, F>
where
	T: Element,
	F: Fn(ArrayViewD<T>, ArrayViewD<T>, &Kwargs) -> Result<ArrayD<T>>,
{
	/// Create a `FunctionMean` for `f`. `fn_name` identifies `f` in the configuration and is also the default name of the metric.
	pub fn new(fn_name: impl Into<String>, f: F) -> Self {
		let fn_name = fn_name.into();
		Self {
			mean: Mean::new(fn_name.clone()),
			fn_name,
			f,
			kwargs: Kwargs::new(),
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.mean = Mean::new(name);
		self
	}

	pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.kwargs.insert(key.into(), value.into());
		self
	}

	pub fn name(&self) -> &str {
		self.mean.name()
	}

	pub fn dtype(&self) -> DType {
		self.mean.dtype()
	}

	pub fn kwargs(&self) -> &Kwargs {
		&self.kwargs
	}

	pub fn mean(&self) -> &Mean<T> {
		&self.mean
	}

	/// Score `y_pred` against `y_true` and fold the scores into the mean.
	pub fn update_state<'a>(
		&mut self,
		y_true: ArrayViewD<T>,
		y_pred: impl Into<Masked<'a, T>>,
		sample_weight: Option<ArrayViewD<T>>,
	) -> Result<()> {
		let y_pred = y_pred.into();
		let values = (self.f)(y_true, y_pred.values.view(), &self.kwargs)?;
		let sample_weight = match (sample_weight, &y_pred.mask) {
			(Some(sample_weight), Some(mask)) => Some(apply_mask(sample_weight.to_owned(), mask)?),
			(sample_weight, _) => sample_weight.map(|sample_weight| sample_weight.to_owned()),
		};
		self.mean.update_state(
			&values,
			sample_weight.as_ref().map(|sample_weight| sample_weight.view()),
		)
	}

	pub fn config(&self) -> FunctionMeanConfig {
		FunctionMeanConfig {
			base: self.mean.config(),
			fn_name: self.fn_name.clone(),
			kwargs: self.kwargs.clone(),
		}
	}

	/// Always fails, because the scoring function cannot be recovered from its name.
	pub fn from_config(config: FunctionMeanConfig) -> Result<Self> {
		Err(Error::FromConfigUnsupported {
			name: config.base.name,
		})
	}
}

impl<'a, T, F> StreamingMetric<'a> for FunctionMean<T, F>
where
	T: Element,
	F: Fn(ArrayViewD<T>, ArrayViewD<T>, &Kwargs) -> Result<ArrayD<T>>,
{
	type Input = PredictionInput<'a, T>;
	type Output = T;

	fn update(&mut self, input: Self::Input) -> Result<()> {
		self.update_state(input.y_true, input.y_pred, input.sample_weight)
	}

	fn result(&self) -> T {
		self.mean.result()
	}

	fn reset(&mut self) {
		self.mean.reset()
	}
}

#[cfg(test)]
fn difference(
	y_true: ArrayViewD<f32>,
	y_pred: ArrayViewD<f32>,
	kwargs: &Kwargs,
) -> Result<ArrayD<f32>> {
	let scale = kwargs.get("scale").and_then(Value::as_f64).unwrap_or(1.0) as f32;
	Ok((&y_pred - &y_true).mapv(|difference| difference * scale))
}

#[test]
fn test_kwargs_are_passed() {
	let mut metric = FunctionMean::<f32, _>::new("difference", difference).with_kwarg("scale", 2.0);
	let y_true = arr1(&[1.0, 1.0, 1.0]).into_dyn();
	let y_pred = arr1(&[2.0, 3.0, 4.0]).into_dyn();
	metric.update_state(y_true.view(), &y_pred, None).unwrap();
	assert!((metric.result() - 4.0).abs() < 1e-5);
	metric.reset();
	assert_eq!(metric.result(), 0.0);
	assert_eq!(metric.mean().count().read(), 0);
}

#[test]
fn test_mask_on_predictions_is_merged_into_weight() {
	let mut metric = FunctionMean::<f32, _>::new("difference", difference);
	let y_true = arr1(&[0.0, 0.0, 0.0, 0.0]).into_dyn();
	let y_pred = arr1(&[1.0, 2.0, 3.0, 50.0]).into_dyn();
	let mask = arr1(&[true, true, true, false]).into_dyn();
	let weight = arr1(&[1.0, 1.0, 1.0, 1.0]).into_dyn();
	metric
		.update(PredictionInput {
			y_true: y_true.view(),
			y_pred: Masked::with_mask(y_pred.view(), mask.view()),
			sample_weight: Some(weight.view()),
		})
		.unwrap();
	assert!((metric.result() - 2.0).abs() < 1e-5);
	assert_eq!(metric.mean().count().read(), 3);
}

#[test]
fn test_mask_without_weight_is_not_applied() {
	let mut metric = FunctionMean::<f32, _>::new("difference", difference);
	let y_true = arr1(&[0.0, 0.0]).into_dyn();
	let y_pred = arr1(&[1.0, 3.0]).into_dyn();
	let mask = arr1(&[true, false]).into_dyn();
	metric
		.update_state(y_true.view(), Masked::with_mask(y_pred.view(), mask.view()), None)
		.unwrap();
	assert!((metric.result() - 2.0).abs() < 1e-5);
}

#[test]
fn test_config() {
	let metric = FunctionMean::<f32, _>::new("difference", difference)
		.with_name("scaled_difference")
		.with_kwarg("scale", 0.5);
	let config = metric.config();
	assert_eq!(
		serde_json::to_string(&config).unwrap(),
		r#"{"name":"scaled_difference","dtype":"float32","fn":"difference","scale":0.5}"#
	);
	match FunctionMean::<f32, ScoreFn<f32>>::from_config(config) {
		Err(Error::FromConfigUnsupported { name }) => assert_eq!(name, "scaled_difference"),
		_ => panic!("expected from_config to be unsupported"),
	}
}
