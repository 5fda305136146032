//! Defines the scalar element trait and its binding to hardware lanes.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use wide::{f32x8, f64x4};

/// Trait describing a scalar element the lazy engine can evaluate.
///
/// Each element type is paired with a fixed-width SIMD lane type. `LANES` scalars are
/// processed per kernel invocation; anything left over is handled one scalar at a time.
pub trait Element:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Hardware lane holding `LANES` scalars.
    type Lane: Copy
        + Add<Output = Self::Lane>
        + Sub<Output = Self::Lane>
        + Mul<Output = Self::Lane>
        + Div<Output = Self::Lane>;

    /// Number of scalars per lane.
    const LANES: usize;

    /// Short name used in logs and reports.
    const NAME: &'static str;

    /// Loads the first `LANES` scalars of `src` into a lane.
    fn load(src: &[Self]) -> Self::Lane;

    /// Stores a lane into the first `LANES` scalars of `dst`.
    fn store(lane: Self::Lane, dst: &mut [Self]);

    /// Computes `a * b + c` across a lane.
    fn lane_mul_add(a: Self::Lane, b: Self::Lane, c: Self::Lane) -> Self::Lane;

    /// Computes `self * b + c` for a single scalar.
    fn mul_add(self, b: Self, c: Self) -> Self;

    /// Converts from a 64-bit float into this element type.
    fn from_f64(v: f64) -> Self;

    /// Converts the element into a 64-bit float for interoperability.
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($scalar:ty, $lane:ty, $width:literal) => {
        impl Element for $scalar {
            type Lane = $lane;

            const LANES: usize = $width;
            const NAME: &'static str = stringify!($scalar);

            #[inline]
            fn load(src: &[Self]) -> Self::Lane {
                let mut lane: [$scalar; $width] = [0.0; $width];
                lane.copy_from_slice(&src[..$width]);
                <$lane>::from(lane)
            }

            #[inline]
            fn store(lane: Self::Lane, dst: &mut [Self]) {
                dst[..$width].copy_from_slice(&lane.to_array());
            }

            #[inline]
            fn lane_mul_add(a: Self::Lane, b: Self::Lane, c: Self::Lane) -> Self::Lane {
                a.mul_add(b, c)
            }

            #[inline]
            fn mul_add(self, b: Self, c: Self) -> Self {
                <$scalar>::mul_add(self, b, c)
            }

            fn from_f64(v: f64) -> Self {
                v as $scalar
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element!(f32, f32x8, 8);
impl_element!(f64, f64x4, 4);
