use crate::{
	config::MetricConfig,
	dtype::{DType, Element},
	error::{Error, Result},
	masked::Masked,
	reduce::{broadcast_zip, cast, expand_to_rank, reduce_to_samplewise_values, Reduction},
	variable::Variable,
	StreamingMetric, WeightedInput, EPSILON,
};
use ndarray::prelude::*;
use ndarray::IxDyn;
use num_traits::ToPrimitive;
use std::fmt::Debug;

/**
`Mean` computes the (weighted) mean of the values it is given.

If the values are `[1, 3, 5, 7]` their mean is 4. With a sample weight of `[1, 1, 0, 0]` the mean is 2.

The result is `total / (count + EPSILON)`, so a `Mean` that has not seen any samples reports 0 rather than NaN.
*/
#[derive(Clone, Debug)]
pub struct Mean<T>
where
	T: Element,
{
	name: String,
	total: Variable<T>,
	count: Variable<i64>,
}

impl<T> Default for Mean<T>
where
	T: Element,
{
	fn default() -> Self {
		Self::new("mean")
	}
}

impl<T> Mean<T>
where
	T: Element,
{
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			total: Variable::new("total", T::zero()),
			count: Variable::new("count", 0),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn dtype(&self) -> DType {
		T::DTYPE
	}

	pub fn total(&self) -> &Variable<T> {
		&self.total
	}

	pub fn count(&self) -> &Variable<i64> {
		&self.count
	}

	/**
	Add the values to the running total and the number of samples they represent to the running count.

	Without a sample weight every sample counts once. With one, the count grows by the weight broadcast over the sample axis and summed. The count is an integer, so fractional weights are truncated once per update.
	*/
	pub fn update_state<'a, A>(
		&mut self,
		values: impl Into<Masked<'a, A>>,
		sample_weight: Option<ArrayViewD<A>>,
	) -> Result<()>
	where
		A: 'a + ToPrimitive + Copy + Debug,
	{
		self.fold(values.into(), sample_weight)
	}

	/// Like [`update_state`](#method.update_state), for a sample weight whose element type differs from the values'.
	pub fn update_state_weighted<'a, A, W>(
		&mut self,
		values: impl Into<Masked<'a, A>>,
		sample_weight: ArrayViewD<W>,
	) -> Result<()>
	where
		A: 'a + ToPrimitive + Copy + Debug,
		W: ToPrimitive + Copy + Debug,
	{
		self.fold(values.into(), Some(sample_weight))
	}

	/// Both the new total and the new count are computed before either is assigned, so a failed update leaves the state as it was.
	fn fold<A, W>(&mut self, values: Masked<A>, sample_weight: Option<ArrayViewD<W>>) -> Result<()>
	where
		A: ToPrimitive + Copy + Debug,
		W: ToPrimitive + Copy + Debug,
	{
		let (values, sample_weight) =
			reduce_to_samplewise_values::<A, W, T>(&values, sample_weight, Reduction::Mean)?;
		let total = self.total.read() + values.sum();
		let n_samples = if values.ndim() == 0 {
			1
		} else {
			values.len_of(Axis(0))
		};
		let num_samples: T = match &sample_weight {
			Some(sample_weight) => weighted_sample_count(n_samples, sample_weight)?,
			None => cast(n_samples)?,
		};
		let num_samples: i64 = cast(num_samples)?;
		let count = self.count.read();
		let count = count
			.checked_add(num_samples)
			.ok_or(Error::CountOverflow { count, num_samples })?;
		self.total.assign(total);
		self.count.assign(count);
		log::trace!(
			"{}: {} samples counted as {}, total {} count {}",
			self.name,
			n_samples,
			num_samples,
			total,
			count,
		);
		Ok(())
	}

	pub fn config(&self) -> MetricConfig {
		MetricConfig::new::<T>(self.name.clone())
	}

	pub fn from_config(config: MetricConfig) -> Result<Self> {
		config.check_dtype::<T>()?;
		Ok(Self::new(config.name))
	}
}

/// Broadcast ones along the sample axis against the weight and sum. Axes of the weight past the sample axis are averaged, as the values were.
fn weighted_sample_count<T>(n_samples: usize, sample_weight: &ArrayD<T>) -> Result<T>
where
	T: Element,
{
	let ones = ArrayD::<T>::ones(IxDyn(&[n_samples]));
	let ones = expand_to_rank(ones, sample_weight.ndim());
	let weights = broadcast_zip(&ones, sample_weight, |one, weight| one * weight)?;
	let ndim = weights.ndim();
	let weights = if ndim > 1 {
		Reduction::Mean.reduce_axes(weights, 1..ndim)?
	} else {
		weights
	};
	Ok(weights.sum())
}

impl<'a, T> StreamingMetric<'a> for Mean<T>
where
	T: Element,
{
	type Input = WeightedInput<'a, T>;
	type Output = T;

	fn update(&mut self, input: Self::Input) -> Result<()> {
		self.update_state(input.values, input.sample_weight)
	}

	fn result(&self) -> T {
		let count = T::from(self.count.read()).unwrap_or_else(T::nan);
		let epsilon = T::from(EPSILON).unwrap_or_else(T::epsilon);
		self.total.read() / (count + epsilon)
	}

	fn reset(&mut self) {
		log::debug!("{}: reset", self.name);
		self.total.assign(T::zero());
		self.count.assign(0);
	}
}

#[cfg(test)]
fn assert_close(actual: f32, expected: f32) {
	assert!((actual - expected).abs() < 1e-5, "{} != {}", actual, expected);
}

#[test]
fn test_mean() {
	let mut mean = Mean::<f32>::default();
	mean.update_state(&arr1(&[1, 3, 5, 7]), None).unwrap();
	assert_close(mean.result(), 4.0);
	assert_eq!(mean.count().read(), 4);
	mean.update_state(&arr1(&[2, 2, 2, 2]), None).unwrap();
	assert_close(mean.result(), 3.0);
	assert_eq!(mean.result(), mean.result());
	assert_eq!(mean.total().read(), 24.0);
}

#[test]
fn test_weighted_mean() {
	let mut mean = Mean::<f32>::default();
	mean.update_state(&arr1(&[1, 3, 5, 7]), Some(arr1(&[1, 1, 0, 0]).view().into_dyn()))
		.unwrap();
	assert_close(mean.result(), 2.0);
	assert_eq!(mean.count().read(), 2);
}

#[test]
fn test_empty_mean_is_zero() {
	let mut mean = Mean::<f64>::default();
	assert_eq!(mean.result(), 0.0);
	mean.update_state(&arr1(&[10.0, 20.0]), None).unwrap();
	mean.reset();
	let result = mean.result();
	assert!(result.is_finite());
	assert_eq!(result, 0.0);
	assert_eq!(mean.count().read(), 0);
}

#[test]
fn test_negative_values() {
	let mut mean = Mean::<f64>::default();
	mean.update_state(&arr1(&[-1.0, -3.0]), None).unwrap();
	assert!((mean.result() + 2.0).abs() < 1e-6);
}

#[test]
fn test_vectors_with_per_sample_weight() {
	let mut mean = Mean::<f32>::default();
	let values = arr2(&[[1.0, 3.0], [2.0, 4.0], [10.0, 10.0]]);
	mean.update(WeightedInput {
		values: Masked::from(&values),
		sample_weight: Some(arr1(&[1.0, 1.0, 0.0]).view().into_dyn()),
	})
	.unwrap();
	// per sample means are [2, 3, 10], the last one is weighted out
	assert_close(mean.result(), 2.5);
	assert_eq!(mean.count().read(), 2);
}

#[test]
fn test_scalar_weight() {
	let mut mean = Mean::<f64>::default();
	mean.update_state(&arr1(&[1.0, 3.0, 5.0, 7.0]), Some(arr0(3.0).view().into_dyn()))
		.unwrap();
	assert_eq!(mean.count().read(), 3);
	assert!((mean.result() - 4.0).abs() < 1e-6);
}

#[test]
fn test_masked_values() {
	let mut mean = Mean::<f32>::default();
	let values = arr1(&[1.0, 3.0, 5.0, 100.0]);
	let mask = arr1(&[true, true, true, false]);
	mean.update_state(
		Masked::with_mask(values.view().into_dyn(), mask.view().into_dyn()),
		Some(arr1(&[1.0, 1.0, 1.0, 1.0]).view().into_dyn()),
	)
	.unwrap();
	assert_close(mean.result(), 3.0);
}

#[test]
fn test_shape_error_leaves_state_untouched() {
	let mut mean = Mean::<f32>::default();
	mean.update_state(&arr1(&[1.0, 2.0]), None).unwrap();
	let weight = arr1(&[1.0, 1.0]).into_dyn();
	let result = mean.update_state(&arr1(&[1.0, 2.0, 3.0]), Some(weight.view()));
	assert!(result.is_err());
	assert_eq!(mean.count().read(), 2);
	assert_close(mean.result(), 1.5);
}

#[test]
fn test_failed_update_leaves_state_untouched() {
	let mut mean = Mean::<f32>::default();
	mean.update_state(&arr1(&[1.0, 3.0]), None).unwrap();
	let weight = arr1(&[f32::NAN, 1.0]).into_dyn();
	let result = mean.update_state(&arr1(&[5.0, 7.0]), Some(weight.view()));
	assert!(matches!(result, Err(Error::Cast(..))));
	assert_eq!(mean.total().read(), 4.0);
	assert_eq!(mean.count().read(), 2);
	assert_close(mean.result(), 2.0);
}

#[test]
fn test_count_overflow() {
	let mut mean = Mean::<f64>::default();
	let weight = arr1(&[9.0e18]).into_dyn();
	mean.update_state(&arr1(&[1.0]), Some(weight.view())).unwrap();
	let count = mean.count().read();
	let total = mean.total().read();
	let result = mean.update_state(&arr1(&[1.0]), Some(weight.view()));
	assert!(matches!(result, Err(Error::CountOverflow { .. })));
	assert_eq!(mean.count().read(), count);
	assert_eq!(mean.total().read(), total);
}

#[test]
fn test_weight_with_the_shape_of_the_values() {
	let mut mean = Mean::<f64>::default();
	let values = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
	let weight = arr2(&[[2.0, 0.0, 1.0], [3.0, 3.0, 3.0]]);
	mean.update_state(&values, Some(weight.view().into_dyn()))
		.unwrap();
	// sum(v * w) = 50 and sum(w) = 12, the per sample weight means are [1, 3]
	assert_eq!(mean.count().read(), 4);
	assert!((mean.result() - 50.0 / 12.0).abs() < 1e-6);
}

#[test]
fn test_rank_two_mask_with_per_sample_weight() {
	let mut mean = Mean::<f32>::default();
	let values = arr2(&[[1.0, 2.0, 3.0], [40.0, 50.0, 60.0]]);
	let mask = arr2(&[[true, true, true], [false, false, false]]);
	let weight = arr1(&[1.0, 1.0]).into_dyn();
	mean.update_state(
		Masked::with_mask(values.view().into_dyn(), mask.view().into_dyn()),
		Some(weight.view()),
	)
	.unwrap();
	assert_eq!(mean.count().read(), 1);
	assert_close(mean.total().read(), 2.0);
	assert_close(mean.result(), 2.0);
}

#[test]
fn test_integer_values_with_float_weight() {
	let mut mean = Mean::<f64>::default();
	let weight = arr1(&[1.0f32, 1.0, 0.0, 0.0]).into_dyn();
	mean.update_state_weighted(&arr1(&[1u8, 3, 5, 7]), weight.view())
		.unwrap();
	assert_eq!(mean.count().read(), 2);
	assert!((mean.result() - 2.0).abs() < 1e-6);
}
