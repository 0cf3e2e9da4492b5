/*!
This crate computes streaming, weighted reductions such as the [`Sum`](struct.Sum.html) and [`Mean`](struct.Mean.html) of values produced one batch at a time, for example while evaluating a model. Each batch can have any rank, an optional mask marking valid elements, and an optional sample weight. [`FunctionMean`](struct.FunctionMean.html) averages the output of a scoring function such as [`mean_squared_error`](fn.mean_squared_error.html) over all batches seen.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod accuracy;
mod config;
mod dtype;
mod error;
mod function_mean;
mod masked;
mod mean;
mod mean_absolute_error;
mod mean_squared_error;
mod reduce;
mod sum;
mod variable;

pub use self::accuracy::{binary_accuracy, BinaryAccuracy};
pub use self::config::MetricConfig;
pub use self::dtype::{DType, Element};
pub use self::error::{Error, Result};
pub use self::function_mean::{FunctionMean, FunctionMeanConfig, Kwargs, PredictionInput, ScoreFn};
pub use self::masked::Masked;
pub use self::mean::Mean;
pub use self::mean_absolute_error::{mean_absolute_error, MeanAbsoluteError};
pub use self::mean_squared_error::{mean_squared_error, MeanSquaredError};
pub use self::reduce::{
	apply_mask, broadcast_shape, reduce_to_samplewise_values, squeeze_to_same_rank, Reduction,
};
pub use self::sum::Sum;
pub use self::variable::Variable;

use ndarray::ArrayViewD;

/// Added to the count before dividing, so that a mean over zero samples is 0 instead of NaN.
pub const EPSILON: f64 = 1e-7;

/**
The `StreamingMetric` trait defines a common interface to metrics that are computed over input that arrives in batches.

After being initialized, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. `result()` reads the `Output` at any point without changing the state, and `reset()` returns the metric to its freshly constructed state.

An instance is meant to be owned by a single caller. Updates from several threads must be serialized by the caller.

# Examples

Here is a basic example implementation of a `Max` metric, which takes `f32`s as input and produces an `f32` as output that is the maximum of all the inputs.

```
use tangram_reduction_metrics::{Result, StreamingMetric};

struct Max(f32);

impl StreamingMetric<'_> for Max {
	type Input = f32;
	type Output = f32;
	fn update(&mut self, input: Self::Input) -> Result<()> {
		self.0 = self.0.max(input);
		Ok(())
	}
	fn result(&self) -> Self::Output { self.0 }
	fn reset(&mut self) { self.0 = f32::NEG_INFINITY }
}
```

The generic lifetime `'a` allows `Input`s to borrow from their enclosing scope.
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `result()`.
	type Output;
	/// Fold the `Input` `input` into this metric's state.
	fn update(&mut self, input: Self::Input) -> Result<()>;
	/// Produce the `Output` for everything seen since construction or the last `reset()`.
	fn result(&self) -> Self::Output;
	/// Return to the state of a freshly constructed metric.
	fn reset(&mut self);
}

/// The input to [`Sum`](struct.Sum.html) and [`Mean`](struct.Mean.html).
pub struct WeightedInput<'a, T> {
	pub values: Masked<'a, T>,
	pub sample_weight: Option<ArrayViewD<'a, T>>,
}
