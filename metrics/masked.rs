use ndarray::prelude::*;
use ndarray::Data;

/// A batch of values together with an optional mask marking which elements are valid.
///
/// The mask travels alongside the values rather than inside them. Its shape is a prefix of the values' shape, or the same shape.
#[derive(Clone, Debug)]
pub struct Masked<'a, A> {
	pub values: ArrayViewD<'a, A>,
	pub mask: Option<ArrayViewD<'a, bool>>,
}

impl<'a, A> Masked<'a, A> {
	pub fn new(values: ArrayViewD<'a, A>) -> Self {
		Self { values, mask: None }
	}

	pub fn with_mask(values: ArrayViewD<'a, A>, mask: ArrayViewD<'a, bool>) -> Self {
		Self {
			values,
			mask: Some(mask),
		}
	}

	pub fn shape(&self) -> &[usize] {
		self.values.shape()
	}
}

impl<'a, A, D> From<ArrayView<'a, A, D>> for Masked<'a, A>
where
	D: Dimension,
{
	fn from(values: ArrayView<'a, A, D>) -> Self {
		Self::new(values.into_dyn())
	}
}

impl<'a, A, S, D> From<&'a ArrayBase<S, D>> for Masked<'a, A>
where
	S: Data<Elem = A>,
	D: Dimension,
{
	fn from(values: &'a ArrayBase<S, D>) -> Self {
		Self::new(values.view().into_dyn())
	}
}

#[test]
fn test_from_array() {
	let values = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
	let masked = Masked::from(&values);
	assert_eq!(masked.shape(), &[2, 2]);
	assert!(masked.mask.is_none());
	let mask = arr1(&[true, false]);
	let masked = Masked::with_mask(values.view().into_dyn(), mask.view().into_dyn());
	assert_eq!(masked.mask.unwrap().shape(), &[2]);
}
