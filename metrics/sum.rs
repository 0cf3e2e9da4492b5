use crate::{
	config::MetricConfig,
	dtype::{DType, Element},
	error::Result,
	masked::Masked,
	reduce::{reduce_to_samplewise_values, Reduction},
	variable::Variable,
	StreamingMetric, WeightedInput,
};
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::fmt::Debug;

/**
`Sum` computes the (weighted) sum of the values it is given.

If the values are `[1, 3, 5, 7]` their sum is 16. With a sample weight of `[1, 1, 0, 0]` the sum is 4.

```
use ndarray::prelude::*;
use tangram_reduction_metrics::{StreamingMetric, Sum};

let mut sum = Sum::<f32>::default();
sum.update_state(&arr1(&[1, 3, 5, 7]), None).unwrap();
assert_eq!(sum.result(), 16.0);
```
*/
#[derive(Clone, Debug)]
pub struct Sum<T>
where
	T: Element,
{
	name: String,
	total: Variable<T>,
}

impl<T> Default for Sum<T>
where
	T: Element,
{
	fn default() -> Self {
		Self::new("sum")
	}
}

impl<T> Sum<T>
where
	T: Element,
{
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			total: Variable::new("total", T::zero()),
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

	/// Add the sum of `values`, weighted by `sample_weight`, to the running total.
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

	fn fold<A, W>(&mut self, values: Masked<A>, sample_weight: Option<ArrayViewD<W>>) -> Result<()>
	where
		A: ToPrimitive + Copy + Debug,
		W: ToPrimitive + Copy + Debug,
	{
		let (values_shape, weight_shape) = (
			values.shape().to_owned(),
			sample_weight.as_ref().map(|weight| weight.shape().to_owned()),
		);
		let (values, _) =
			reduce_to_samplewise_values::<A, W, T>(&values, sample_weight, Reduction::Sum)?;
		self.total.assign(self.total.read() + values.sum());
		log::trace!(
			"{}: values {:?} weight {:?} total {}",
			self.name,
			values_shape,
			weight_shape,
			self.total.read(),
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

impl<'a, T> StreamingMetric<'a> for Sum<T>
where
	T: Element,
{
	type Input = WeightedInput<'a, T>;
	type Output = T;

	fn update(&mut self, input: Self::Input) -> Result<()> {
		self.update_state(input.values, input.sample_weight)
	}

	fn result(&self) -> T {
		self.total.read()
	}

	fn reset(&mut self) {
		log::debug!("{}: reset", self.name);
		self.total.assign(T::zero());
	}
}

#[test]
fn test_sum() {
	let mut sum = Sum::<f32>::default();
	sum.update_state(&arr1(&[1, 3, 5, 7]), None).unwrap();
	assert_eq!(sum.result(), 16.0);
	sum.update_state(&arr1(&[-2, -2]), None).unwrap();
	assert_eq!(sum.result(), 12.0);
	assert_eq!(sum.result(), 12.0);
	sum.reset();
	assert_eq!(sum.result(), 0.0);
}

#[test]
fn test_weighted_sum() {
	let mut sum = Sum::<f64>::default();
	sum.update_state(&arr1(&[1, 3, 5, 7]), Some(arr1(&[1, 1, 0, 0]).view().into_dyn()))
		.unwrap();
	assert_eq!(sum.result(), 4.0);
	let values = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
	sum.update(WeightedInput {
		values: Masked::from(&values),
		sample_weight: Some(arr1(&[0.5, 2.0]).view().into_dyn()),
	})
	.unwrap();
	assert_eq!(sum.result(), 4.0 + 1.5 + 14.0);
}

#[test]
fn test_integer_values_with_float_weight() {
	let mut sum = Sum::<f32>::default();
	let weight = arr1(&[0.5f32, 0.25, 0.0]).into_dyn();
	sum.update_state_weighted(&arr1(&[2i64, 4, 6]), weight.view())
		.unwrap();
	assert_eq!(sum.result(), 2.0);
}

#[test]
fn test_sum_config() {
	let sum = Sum::<f32>::new("total_loss");
	insta::assert_debug_snapshot!(sum.config(), @r###"
	MetricConfig {
	    name: "total_loss",
	    dtype: Float32,
	}
	"###);
	let restored = Sum::<f32>::from_config(sum.config()).unwrap();
	assert_eq!(restored.name(), "total_loss");
	assert!(Sum::<f64>::from_config(sum.config()).is_err());
}
