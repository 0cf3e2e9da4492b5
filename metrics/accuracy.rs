use crate::{
	dtype::Element,
	error::{Error, Result},
	function_mean::{FunctionMean, FunctionMeanConfig, Kwargs, PredictionInput, ScoreFn},
	reduce::{broadcast_zip, cast, squeeze_to_same_rank, Reduction},
	StreamingMetric,
};
use ndarray::prelude::*;

const DEFAULT_THRESHOLD: f64 = 0.5;

/// Compute, for each sample, the proportion of predictions that match the label once thresholded. The threshold is read from the `threshold` kwarg and defaults to 0.5.
pub fn binary_accuracy<T>(
	y_true: ArrayViewD<T>,
	y_pred: ArrayViewD<T>,
	kwargs: &Kwargs,
) -> Result<ArrayD<T>>
where
	T: Element,
{
	let threshold = match kwargs.get("threshold") {
		Some(threshold) => threshold
			.as_f64()
			.ok_or_else(|| Error::Cast(threshold.to_string(), "f64"))?,
		None => DEFAULT_THRESHOLD,
	};
	let threshold: T = cast(threshold)?;
	let (y_true, y_pred) = squeeze_to_same_rank(y_true.to_owned(), y_pred.to_owned());
	let matches = broadcast_zip(&y_pred, &y_true, |prediction, label| {
		let prediction = if prediction > threshold {
			T::one()
		} else {
			T::zero()
		};
		if prediction == label {
			T::one()
		} else {
			T::zero()
		}
	})?;
	let ndim = matches.ndim();
	Reduction::Mean.reduce_axes(matches, ndim.min(1)..ndim)
}

/// The binary accuracy is the proportion of examples where the thresholded prediction equals the label.
pub struct BinaryAccuracy<T>(FunctionMean<T, ScoreFn<T>>)
where
	T: Element;

impl<T> Default for BinaryAccuracy<T>
where
	T: Element,
{
	fn default() -> Self {
		Self::with_threshold(DEFAULT_THRESHOLD)
	}
}

impl<T> BinaryAccuracy<T>
where
	T: Element,
{
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_threshold(threshold: f64) -> Self {
		Self(
			FunctionMean::new("binary_accuracy", binary_accuracy::<T> as ScoreFn<T>)
				.with_kwarg("threshold", threshold),
		)
	}

	pub fn config(&self) -> FunctionMeanConfig {
		self.0.config()
	}
}

impl<'a, T> StreamingMetric<'a> for BinaryAccuracy<T>
where
	T: Element,
{
	type Input = PredictionInput<'a, T>;
	type Output = T;

	fn update(&mut self, input: Self::Input) -> Result<()> {
		self.0.update(input)
	}

	fn result(&self) -> T {
		self.0.result()
	}

	fn reset(&mut self) {
		self.0.reset()
	}
}

#[test]
fn test_binary_accuracy() {
	let y_true = arr1(&[0.0, 1.0, 1.0, 0.0]).into_dyn();
	let y_pred = arr1(&[0.2, 0.8, 0.4, 0.6]).into_dyn();
	let mut accuracy = BinaryAccuracy::<f32>::new();
	accuracy
		.update(PredictionInput {
			y_true: y_true.view(),
			y_pred: (&y_pred).into(),
			sample_weight: None,
		})
		.unwrap();
	assert!((accuracy.result() - 0.5).abs() < 1e-5);
	let mut accuracy = BinaryAccuracy::<f32>::with_threshold(0.3);
	accuracy
		.update(PredictionInput {
			y_true: y_true.view(),
			y_pred: (&y_pred).into(),
			sample_weight: None,
		})
		.unwrap();
	assert!((accuracy.result() - 0.75).abs() < 1e-5);
}

#[test]
fn test_binary_accuracy_config() {
	let config = BinaryAccuracy::<f64>::with_threshold(0.25).config();
	insta::assert_debug_snapshot!(config.base, @r###"
	MetricConfig {
	    name: "binary_accuracy",
	    dtype: Float64,
	}
	"###);
	assert_eq!(config.fn_name, "binary_accuracy");
	assert_eq!(config.kwargs.get("threshold").and_then(|t| t.as_f64()), Some(0.25));
}

#[test]
fn test_invalid_threshold() {
	let mut kwargs = Kwargs::new();
	kwargs.insert("threshold".to_owned(), "high".into());
	let y = arr1(&[1.0f32]).into_dyn();
	assert!(binary_accuracy(y.view(), y.view(), &kwargs).is_err());
}
