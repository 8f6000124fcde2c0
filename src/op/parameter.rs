use std::cell::Cell;
use std::rc::Rc;

use crate::scalar::Scalar;

/// A shared scalar box, read at every evaluation of the nodes that hold it.
///
/// Steppers keep one clone and put others into [`super::ScaleOp`] nodes of a
/// residual graph; setting the value between Newton solves retunes the whole
/// graph. As with [`super::ConstantOp`], mutation during a solve is not
/// supported.
pub struct Parameter<T: Scalar> {
    value: Rc<Cell<T>>,
}

impl<T: Scalar> Clone for Parameter<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: Scalar> Parameter<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(Cell::new(value)),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn set(&self, value: T) {
        self.value.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_value() {
        let p = Parameter::new(1.0);
        let q = p.clone();
        q.set(2.5);
        assert_eq!(p.get(), 2.5);
    }
}
