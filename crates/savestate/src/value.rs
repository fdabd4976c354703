use std::collections::VecDeque;
use std::fmt;

use arrayvec::ArrayString;
use bytemuck::Pod;

use crate::wrapper::StateWrapper;

/// A value that can be saved and restored through [`StateWrapper::do_value`].
///
/// `transfer` must issue the same sequence of wrapper calls in both modes.
pub trait StateValue {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>);
}

macro_rules! impl_state_value_pod {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StateValue for $ty {
                #[inline]
                fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
                    sw.do_pod(self);
                }
            }
        )*
    };
}

impl_state_value_pod!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl StateValue for bool {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        sw.do_bool(self);
    }
}

impl StateValue for String {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        sw.do_string(self);
    }
}

impl<const CAP: usize> StateValue for ArrayString<CAP> {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        sw.do_small_string(self);
    }
}

impl<T: StateValue, const N: usize> StateValue for [T; N] {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        sw.do_slice(self);
    }
}

impl<T: StateValue> StateValue for [T] {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        sw.do_slice(self);
    }
}

/// `u32` element count, then each element.
impl<T: StateValue + Default> StateValue for Vec<T> {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        let len = sw.do_collection_len(self.len());
        if sw.is_reading() {
            sw.read_vec_chunked(self, len, T::default, |sw, chunk| sw.do_slice(chunk));
        } else {
            sw.do_slice(self);
        }
    }
}

impl<T: StateValue + Default> StateValue for VecDeque<T> {
    fn transfer(&mut self, sw: &mut StateWrapper<'_>) {
        if sw.is_writing() {
            sw.do_collection_len(self.len());
            let (front, back) = self.as_mut_slices();
            sw.do_slice(front);
            sw.do_slice(back);
            return;
        }

        let mut items = Vec::from(std::mem::take(self));
        items.transfer(sw);
        *self = VecDeque::from(items);
    }
}

/// Enum stored as its integer representation.
///
/// ```
/// use savestate::StateEnum;
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// enum TimerMode {
///     #[default]
///     OneShot,
///     Periodic,
/// }
///
/// impl StateEnum for TimerMode {
///     type Repr = u8;
///
///     fn to_repr(self) -> u8 {
///         self as u8
///     }
///
///     fn from_repr(repr: u8) -> Option<Self> {
///         match repr {
///             0 => Some(TimerMode::OneShot),
///             1 => Some(TimerMode::Periodic),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait StateEnum: Copy + Default {
    type Repr: Pod + fmt::Display;

    fn to_repr(self) -> Self::Repr;
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}
