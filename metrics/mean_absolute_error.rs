use crate::{
	dtype::Element,
	error::Result,
	function_mean::{FunctionMean, FunctionMeanConfig, Kwargs, PredictionInput, ScoreFn},
	reduce::{broadcast_zip, squeeze_to_same_rank, Reduction},
	StreamingMetric,
};
use ndarray::prelude::*;

/// Compute, for each sample, the mean of the absolute differences between the predictions and the labels.
pub fn mean_absolute_error<T>(
	y_true: ArrayViewD<T>,
	y_pred: ArrayViewD<T>,
	_kwargs: &Kwargs,
) -> Result<ArrayD<T>>
where
	T: Element,
{
	let (y_true, y_pred) = squeeze_to_same_rank(y_true.to_owned(), y_pred.to_owned());
	let absolute_error =
		broadcast_zip(&y_pred, &y_true, |prediction, label| (prediction - label).abs())?;
	let ndim = absolute_error.ndim();
	Reduction::Mean.reduce_axes(absolute_error, ndim.min(1)..ndim)
}

pub struct MeanAbsoluteError<T>(FunctionMean<T, ScoreFn<T>>)
where
	T: Element;

impl<T> Default for MeanAbsoluteError<T>
where
	T: Element,
{
	fn default() -> Self {
		Self(FunctionMean::new(
			"mean_absolute_error",
			mean_absolute_error::<T> as ScoreFn<T>,
		))
	}
}

impl<T> MeanAbsoluteError<T>
where
	T: Element,
{
	pub fn new() -> Self {
		Self::default()
	}

	pub fn config(&self) -> FunctionMeanConfig {
		self.0.config()
	}
}

impl<'a, T> StreamingMetric<'a> for MeanAbsoluteError<T>
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
fn test_weighted_mean_absolute_error() {
	let y_true = arr1(&[1.0, 1.0, 1.0]).into_dyn();
	let y_pred = arr1(&[0.0, 3.0, -9.0]).into_dyn();
	let weight = arr1(&[1.0, 1.0, 0.0]).into_dyn();
	let mut metric = MeanAbsoluteError::<f64>::new();
	metric
		.update(PredictionInput {
			y_true: y_true.view(),
			y_pred: (&y_pred).into(),
			sample_weight: Some(weight.view()),
		})
		.unwrap();
	assert!((metric.result() - 1.5).abs() < 1e-6);
}
