//! Value traits for record fields, totals and keys.
//!
//! Every bound here is checked at compile time: a field or total type without a
//! well-defined zero (`Default`) cannot be used to build a collection.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::hash::Hash;

/// A type that can be stored in one of a record's two fields.
///
/// `Default` supplies the zero "before" state of a freshly pushed record and the
/// zero "after" state of an erased one.
pub trait Field: Clone + Default + PartialEq + Debug + Send + Sync + 'static {}

impl<T> Field for T where T: Clone + Default + PartialEq + Debug + Send + Sync + 'static {}

/// A type usable as an application key for keyed lookup.
pub trait Key: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Key for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// A type that can hold an aggregate total.
///
/// `accumulate` is the default Add-mode application; `rank` is the total order
/// used by the count-indexed tracker for Min/Max modes.
pub trait Total: Clone + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Adds `delta` into `self`.
    fn accumulate(&mut self, delta: &Self);

    /// Total order over values. Must be consistent with `PartialEq` for values
    /// that compare equal.
    fn rank(&self, other: &Self) -> Ordering;
}

/// Lossless intermediate representation for numeric casts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Repr {
    /// Any integer value.
    Int(i128),
    /// Any floating point value.
    Float(f64),
}

/// A primitive number usable by the default delta and extract strategies.
///
/// Integer arithmetic wraps, so unsigned totals accept negative deltas and
/// still land on the right value once all records are accounted for.
pub trait Numeric: Total + Copy + PartialOrd {
    /// Converts into the intermediate representation.
    fn to_repr(self) -> Repr;

    /// Converts from the intermediate representation (`as` semantics).
    fn from_repr(repr: Repr) -> Self;

    /// Addition.
    fn plus(self, rhs: Self) -> Self;

    /// Subtraction.
    fn minus(self, rhs: Self) -> Self;

    /// Multiplication.
    fn times(self, rhs: Self) -> Self;

    /// Casts into another numeric type.
    #[inline]
    fn cast<U: Numeric>(self) -> U {
        U::from_repr(self.to_repr())
    }
}

macro_rules! impl_integer {
    ($($t:ty),* $(,)?) => {$(
        impl Total for $t {
            #[inline]
            fn accumulate(&mut self, delta: &Self) {
                *self = self.wrapping_add(*delta);
            }

            #[inline]
            fn rank(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }

        impl Numeric for $t {
            #[inline]
            fn to_repr(self) -> Repr {
                Repr::Int(self as i128)
            }

            #[inline]
            fn from_repr(repr: Repr) -> Self {
                match repr {
                    Repr::Int(v) => v as $t,
                    Repr::Float(v) => v as $t,
                }
            }

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty),* $(,)?) => {$(
        impl Total for $t {
            #[inline]
            fn accumulate(&mut self, delta: &Self) {
                *self += *delta;
            }

            #[inline]
            fn rank(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }
        }

        impl Numeric for $t {
            #[inline]
            fn to_repr(self) -> Repr {
                Repr::Float(self as f64)
            }

            #[inline]
            fn from_repr(repr: Repr) -> Self {
                match repr {
                    Repr::Int(v) => v as $t,
                    Repr::Float(v) => v as $t,
                }
            }

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_int_to_float() {
        let v: f64 = 10i64.cast();
        assert_eq!(v, 10.0);
    }

    #[test]
    fn test_cast_float_to_int_truncates() {
        let v: i64 = 2.9f64.cast();
        assert_eq!(v, 2);
        let v: i64 = (-2.9f64).cast();
        assert_eq!(v, -2);
    }

    #[test]
    fn test_unsigned_wrapping_roundtrip() {
        let mut total = 5u64;
        let delta = 3u64.minus(7);
        total.accumulate(&delta);
        assert_eq!(total, 1);
        total.accumulate(&4);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_float_rank_is_total() {
        assert_eq!(1.0f64.rank(&2.0), Ordering::Less);
        assert_eq!(f64::NAN.rank(&f64::NAN), Ordering::Equal);
        assert_eq!((-0.0f64).rank(&0.0), Ordering::Less);
    }

    #[test]
    fn test_numeric_ops() {
        assert_eq!(1.5f64.times(10.0), 15.0);
        assert_eq!(7i32.plus(3).minus(4), 6);
        assert_eq!(i8::MAX.plus(1), i8::MIN);
    }
}
