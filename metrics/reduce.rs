/*!
Reduction of a batch of values of any rank to one value per sample.
*/

use crate::{
	dtype::Element,
	error::{Error, Result},
	masked::Masked,
};
use itertools::{EitherOrBoth, Itertools};
use ndarray::prelude::*;
use num_traits::{NumCast, ToPrimitive};
use std::{fmt::Debug, ops::Range};

/// How values are collapsed along the axes a sample weight does not cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reduction {
	Sum,
	Mean,
}

impl Reduction {
	/// Reduce `array` over every axis in `axes`, removing them.
	pub fn reduce_axes<T>(self, mut array: ArrayD<T>, axes: Range<usize>) -> Result<ArrayD<T>>
	where
		T: Element,
	{
		// Go from the last axis so that the remaining axis indexes stay valid.
		for axis in axes.rev() {
			let len = array.len_of(Axis(axis));
			let sum = array.sum_axis(Axis(axis));
			array = match self {
				Reduction::Sum => sum,
				Reduction::Mean => {
					let len: T = cast(len)?;
					sum.mapv(|value| value / len)
				}
			};
		}
		Ok(array)
	}
}

/**
Reduce `values` to one value per sample, weighting them by `sample_weight` if it is given.

The values and the weight are cast to `T`. A mask attached to the values is merged into the weight with [`apply_mask`](fn.apply_mask.html). If the ranks of the values and the weight differ they are aligned with [`squeeze_to_same_rank`](fn.squeeze_to_same_rank.html), the values are collapsed with `reduction` down to the rank of the weight, and multiplied by it. Finally all axes but the sample axis are collapsed with `reduction`.

Returns the per sample values along with the weight as it was applied, or `None` if no weight was given.
*/
pub fn reduce_to_samplewise_values<A, W, T>(
	values: &Masked<A>,
	sample_weight: Option<ArrayViewD<W>>,
	reduction: Reduction,
) -> Result<(ArrayD<T>, Option<ArrayD<T>>)>
where
	A: ToPrimitive + Copy + Debug,
	W: ToPrimitive + Copy + Debug,
	T: Element,
{
	let mut reduced: ArrayD<T> = cast_array(&values.values)?;
	let sample_weight = match sample_weight {
		Some(sample_weight) => {
			let mut sample_weight: ArrayD<T> = cast_array(&sample_weight)?;
			if let Some(mask) = &values.mask {
				sample_weight = apply_mask(sample_weight, mask)?;
			}
			let (aligned, sample_weight) = squeeze_to_same_rank(reduced, sample_weight);
			reduced = expand_to_rank(aligned, sample_weight.ndim());
			let (weight_ndim, values_ndim) = (sample_weight.ndim(), reduced.ndim());
			if values_ndim > weight_ndim {
				reduced = reduction.reduce_axes(reduced, weight_ndim..values_ndim)?;
			}
			reduced = broadcast_zip(&reduced, &sample_weight, |value, weight| value * weight)?;
			Some(sample_weight)
		}
		None => None,
	};
	let values_ndim = reduced.ndim();
	if values_ndim > 1 {
		reduced = reduction.reduce_axes(reduced, 1..values_ndim)?;
	}
	Ok((reduced, sample_weight))
}

/**
Merge a mask into a sample weight. Masked out positions get a weight of zero and all other positions keep their weight.

The mask's shape is a prefix of the values' shape, so once a trailing size one axis is squeezed away, the lower rank operand is aligned on the sample axis by appending size one axes.
*/
pub fn apply_mask<T>(sample_weight: ArrayD<T>, mask: &ArrayViewD<bool>) -> Result<ArrayD<T>>
where
	T: Element,
{
	let mask = mask.mapv(|valid| if valid { T::one() } else { T::zero() });
	let (mask, sample_weight) = squeeze_to_same_rank(mask, sample_weight);
	let ndim = mask.ndim().max(sample_weight.ndim());
	let mask = expand_to_rank(mask, ndim);
	let sample_weight = expand_to_rank(sample_weight, ndim);
	broadcast_zip(&sample_weight, &mask, |weight, valid| weight * valid)
}

/// If the ranks of `x1` and `x2` differ by one and the higher rank array has a trailing axis of size one, drop that axis.
pub fn squeeze_to_same_rank<A, B>(x1: ArrayD<A>, x2: ArrayD<B>) -> (ArrayD<A>, ArrayD<B>) {
	let (x1_ndim, x2_ndim) = (x1.ndim(), x2.ndim());
	if x1_ndim == x2_ndim + 1 && x1.shape()[x1_ndim - 1] == 1 {
		(x1.index_axis_move(Axis(x1_ndim - 1), 0), x2)
	} else if x2_ndim == x1_ndim + 1 && x2.shape()[x2_ndim - 1] == 1 {
		(x1, x2.index_axis_move(Axis(x2_ndim - 1), 0))
	} else {
		(x1, x2)
	}
}

/// Append axes of size one to `array` until it has rank `ndim`.
pub(crate) fn expand_to_rank<T>(mut array: ArrayD<T>, ndim: usize) -> ArrayD<T> {
	while array.ndim() < ndim {
		let axis = Axis(array.ndim());
		array = array.insert_axis(axis);
	}
	array
}

/// Compute the shape two arrays broadcast to, aligning their trailing axes. Returns `None` if they are not broadcastable.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Option<Vec<usize>> {
	let mut shape = lhs
		.iter()
		.rev()
		.zip_longest(rhs.iter().rev())
		.map(|pair| match pair {
			EitherOrBoth::Both(&lhs, &rhs) if lhs == rhs || rhs == 1 => Some(lhs),
			EitherOrBoth::Both(&lhs, &rhs) if lhs == 1 => Some(rhs),
			EitherOrBoth::Both(_, _) => None,
			EitherOrBoth::Left(&len) | EitherOrBoth::Right(&len) => Some(len),
		})
		.collect::<Option<Vec<_>>>()?;
	shape.reverse();
	Some(shape)
}

/// Broadcast `lhs` and `rhs` against each other and combine them elementwise with `f`.
pub(crate) fn broadcast_zip<T, F>(lhs: &ArrayD<T>, rhs: &ArrayD<T>, f: F) -> Result<ArrayD<T>>
where
	T: Element,
	F: Fn(T, T) -> T,
{
	let incompatible = || Error::IncompatibleShapes {
		lhs: lhs.shape().to_owned(),
		rhs: rhs.shape().to_owned(),
	};
	let shape = broadcast_shape(lhs.shape(), rhs.shape()).ok_or_else(incompatible)?;
	let mut output = lhs.broadcast(shape).ok_or_else(incompatible)?.to_owned();
	output.zip_mut_with(rhs, |output, &rhs| *output = f(*output, rhs));
	Ok(output)
}

pub(crate) fn cast<V, T>(value: V) -> Result<T>
where
	V: ToPrimitive + Copy + Debug,
	T: NumCast,
{
	T::from(value)
		.ok_or_else(|| Error::Cast(format!("{:?}", value), std::any::type_name::<T>()))
}

pub(crate) fn cast_array<V, T>(array: &ArrayViewD<V>) -> Result<ArrayD<T>>
where
	V: ToPrimitive + Copy + Debug,
	T: NumCast,
{
	let data = array
		.iter()
		.map(|value| cast(*value))
		.collect::<Result<Vec<T>>>()?;
	Ok(ArrayD::from_shape_vec(array.raw_dim(), data)?)
}

#[cfg(test)]
fn assert_close(actual: &ArrayD<f32>, expected: &[f32]) {
	assert_eq!(actual.len(), expected.len());
	for (actual, expected) in actual.iter().zip(expected) {
		assert!((actual - expected).abs() < 1e-6, "{} != {}", actual, expected);
	}
}

#[test]
fn test_no_weight() {
	let values = arr1(&[1, 3, 5, 7]);
	let (reduced, weight) =
		reduce_to_samplewise_values::<i32, i32, f32>(&Masked::from(&values), None, Reduction::Sum)
			.unwrap();
	assert_eq!(reduced.shape(), &[4]);
	assert_close(&reduced, &[1.0, 3.0, 5.0, 7.0]);
	assert!(weight.is_none());
}

#[test]
fn test_no_weight_collapses_trailing_axes() {
	let values = ndarray::arr3(&[[[1.0, 2.0], [3.0, 4.0]], [[5.0, 6.0], [7.0, 8.0]]]);
	let (sum, _) =
		reduce_to_samplewise_values::<f64, f64, f32>(&Masked::from(&values), None, Reduction::Sum)
			.unwrap();
	assert_close(&sum, &[10.0, 26.0]);
	let (mean, _) =
		reduce_to_samplewise_values::<f64, f64, f32>(&Masked::from(&values), None, Reduction::Mean)
			.unwrap();
	assert_close(&mean, &[2.5, 6.5]);
}

#[test]
fn test_per_sample_weight_on_vectors() {
	let values = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
	let weight = arr1(&[1.0, 0.0, 2.0]);
	let (sum, sum_weight) = reduce_to_samplewise_values::<f64, f64, f32>(
		&Masked::from(&values),
		Some(weight.view().into_dyn()),
		Reduction::Sum,
	)
	.unwrap();
	assert_eq!(sum.shape(), &[3]);
	assert_close(&sum, &[3.0, 0.0, 22.0]);
	assert_close(&sum_weight.unwrap(), &[1.0, 0.0, 2.0]);
	let (mean, _) = reduce_to_samplewise_values::<f64, f64, f32>(
		&Masked::from(&values),
		Some(weight.view().into_dyn()),
		Reduction::Mean,
	)
	.unwrap();
	assert_close(&mean, &[1.5, 0.0, 11.0]);
}

#[test]
fn test_trailing_unit_axis_is_squeezed() {
	let values = arr1(&[2.0, 4.0]);
	let weight = arr2(&[[0.5], [1.0]]);
	let (reduced, weight) = reduce_to_samplewise_values::<f64, f64, f32>(
		&Masked::from(&values),
		Some(weight.view().into_dyn()),
		Reduction::Sum,
	)
	.unwrap();
	assert_close(&reduced, &[1.0, 4.0]);
	assert_eq!(weight.unwrap().shape(), &[2]);
}

#[test]
fn test_weight_of_higher_rank() {
	let values = arr1(&[1.0, 2.0]);
	let weight = arr2(&[[1.0, 0.0, 1.0], [1.0, 1.0, 1.0]]);
	let (reduced, _) = reduce_to_samplewise_values::<f64, f64, f32>(
		&Masked::from(&values),
		Some(weight.view().into_dyn()),
		Reduction::Sum,
	)
	.unwrap();
	assert_close(&reduced, &[2.0, 6.0]);
}

#[test]
fn test_scalar_weight() {
	let values = arr1(&[1.0, 3.0, 5.0, 7.0]);
	let weight = arr0(2.0);
	let (reduced, _) = reduce_to_samplewise_values::<f64, f64, f32>(
		&Masked::from(&values),
		Some(weight.view().into_dyn()),
		Reduction::Sum,
	)
	.unwrap();
	assert_eq!(reduced.ndim(), 0);
	assert_close(&reduced, &[32.0]);
}

#[test]
fn test_mask_is_merged_into_weight() {
	let values = arr1(&[1.0, 3.0, 5.0, 7.0]);
	let mask = arr1(&[true, true, false, true]);
	let weight = arr1(&[1.0, 2.0, 1.0, 1.0]);
	let masked = Masked::with_mask(values.view().into_dyn(), mask.view().into_dyn());
	let (reduced, weight) = reduce_to_samplewise_values::<f64, f64, f32>(
		&masked,
		Some(weight.view().into_dyn()),
		Reduction::Sum,
	)
	.unwrap();
	assert_close(&reduced, &[1.0, 6.0, 0.0, 7.0]);
	assert_close(&weight.unwrap(), &[1.0, 2.0, 0.0, 1.0]);
}

#[test]
fn test_apply_mask_aligns_on_the_sample_axis() {
	let weight = arr1(&[1.0f32, 2.0]).into_dyn();
	let mask = arr2(&[[true, false, true], [false, false, true]]);
	let merged = apply_mask(weight, &mask.view().into_dyn()).unwrap();
	assert_eq!(merged.shape(), &[2, 3]);
	assert_close(&merged, &[1.0, 0.0, 1.0, 0.0, 0.0, 2.0]);
}

#[test]
fn test_incompatible_shapes() {
	let values = arr1(&[1.0, 2.0, 3.0, 4.0]);
	let weight = arr1(&[1.0, 2.0, 3.0]);
	let result = reduce_to_samplewise_values::<f64, f64, f32>(
		&Masked::from(&values),
		Some(weight.view().into_dyn()),
		Reduction::Mean,
	);
	match result {
		Err(Error::IncompatibleShapes { lhs, rhs }) => {
			assert_eq!(lhs, vec![4]);
			assert_eq!(rhs, vec![3]);
		}
		_ => panic!("expected incompatible shapes"),
	}
}

#[test]
fn test_broadcast_shape() {
	assert_eq!(broadcast_shape(&[4, 1], &[3]), Some(vec![4, 3]));
	assert_eq!(broadcast_shape(&[], &[2, 2]), Some(vec![2, 2]));
	assert_eq!(broadcast_shape(&[4], &[3]), None);
}
