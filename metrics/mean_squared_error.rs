use crate::{
	dtype::Element,
	error::Result,
	function_mean::{FunctionMean, FunctionMeanConfig, Kwargs, PredictionInput, ScoreFn},
	reduce::{broadcast_zip, squeeze_to_same_rank, Reduction},
	StreamingMetric,
};
use ndarray::prelude::*;

/// Compute, for each sample, the mean of the squared differences between the predictions and the labels.
pub fn mean_squared_error<T>(
	y_true: ArrayViewD<T>,
	y_pred: ArrayViewD<T>,
	_kwargs: &Kwargs,
) -> Result<ArrayD<T>>
where
	T: Element,
{
	let (y_true, y_pred) = squeeze_to_same_rank(y_true.to_owned(), y_pred.to_owned());
	let squared_error = broadcast_zip(&y_pred, &y_true, |prediction, label| {
		(prediction - label).powi(2)
	})?;
	let ndim = squared_error.ndim();
	Reduction::Mean.reduce_axes(squared_error, ndim.min(1)..ndim)
}

/// The mean squared error is the mean of squared differences between the predicted value and the label.
pub struct MeanSquaredError<T>(FunctionMean<T, ScoreFn<T>>)
where
	T: Element;

impl<T> Default for MeanSquaredError<T>
where
	T: Element,
{
	fn default() -> Self {
		Self(FunctionMean::new(
			"mean_squared_error",
			mean_squared_error::<T> as ScoreFn<T>,
		))
	}
}

impl<T> MeanSquaredError<T>
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

impl<'a, T> StreamingMetric<'a> for MeanSquaredError<T>
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
fn test_mean_squared_error() {
	let y_true = arr2(&[[0.0, 1.0], [0.0, 0.0]]).into_dyn();
	let y_pred = arr2(&[[1.0, 1.0], [1.0, 0.0]]).into_dyn();
	let mut metric = MeanSquaredError::<f32>::new();
	metric
		.update(PredictionInput {
			y_true: y_true.view(),
			y_pred: (&y_pred).into(),
			sample_weight: None,
		})
		.unwrap();
	assert!((metric.result() - 0.5).abs() < 1e-5);
	let y_true = arr1(&[2.0, 2.0]).into_dyn();
	let y_pred = arr1(&[4.0, 2.0]).into_dyn();
	metric
		.update(PredictionInput {
			y_true: y_true.view(),
			y_pred: (&y_pred).into(),
			sample_weight: None,
		})
		.unwrap();
	// per sample errors are [0.5, 0.5, 4, 0]
	assert!((metric.result() - 1.25).abs() < 1e-5);
	assert_eq!(metric.config().fn_name, "mean_squared_error");
}

#[test]
fn test_labels_with_trailing_unit_axis() {
	let y_true = arr2(&[[1.0], [2.0], [3.0]]).into_dyn();
	let y_pred = arr1(&[1.0, 2.0, 5.0]).into_dyn();
	let errors = mean_squared_error::<f64>(y_true.view(), y_pred.view(), &Kwargs::new()).unwrap();
	assert_eq!(errors, arr1(&[0.0, 0.0, 4.0]).into_dyn());
}
