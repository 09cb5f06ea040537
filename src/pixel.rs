/// Four-channel accumulator used for the random colour matte
///
/// Channel layout of a rank-0 matte pixel: `[unused, random_a, random_b, coverage]`.

use std::ops::{Add, AddAssign, Mul};

#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pixel4(pub [f32; 4]);

impl Pixel4 {
    #[inline(always)]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self([a, b, c, d])
    }

    #[inline(always)]
    pub fn as_array(&self) -> &[f32; 4] {
        &self.0
    }
}

impl Add for Pixel4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        let (a, b) = (self.0, rhs.0);
        Self([a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]])
    }
}

impl AddAssign for Pixel4 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Pixel4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, s: f32) -> Self {
        Self(self.0.map(|v| v * s))
    }
}
