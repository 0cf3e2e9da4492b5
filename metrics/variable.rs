/// A `Variable` is a named scalar cell holding part of a metric's state.
#[derive(Clone, Debug)]
pub struct Variable<T> {
	name: &'static str,
	value: T,
}

impl<T> Variable<T>
where
	T: Copy,
{
	pub fn new(name: &'static str, initial_value: T) -> Self {
		Self {
			name,
			value: initial_value,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Read the current value. The caller gets a copy, so the state cannot be changed through it.
	pub fn read(&self) -> T {
		self.value
	}

	pub fn assign(&mut self, value: T) {
		self.value = value;
	}
}

#[test]
fn test_variable() {
	let mut total = Variable::new("total", 0.0f32);
	let mut snapshot = total.read();
	snapshot += 1.0;
	assert_eq!(total.read(), 0.0);
	total.assign(snapshot);
	assert_eq!(total.read(), 1.0);
	assert_eq!(total.name(), "total");
}
