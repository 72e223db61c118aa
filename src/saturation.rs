// Togglable output clamp consumed by the integrator and the anti-windup controller
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use num_traits::Float;

/// Errors raised when configuring a [`Saturation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum SaturationError {
    /// Either limit is NaN, or the lower limit exceeds the upper limit
    #[cfg_attr(
        feature = "std",
        error("Saturation limits must be non-NaN with min <= max")
    )]
    InvalidLimits,
}

/// A scalar clamp over `[min, max]` that can be switched off.
///
/// When disabled, [`apply`](Saturation::apply) passes its input through unchanged. Limits may be
/// infinite to clamp on one side only.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Saturation<T> {
    min: T,
    max: T,
    enabled: bool,
}

impl<T: Float> Default for Saturation<T> {
    /// An unbounded, disabled clamp
    fn default() -> Self {
        Self {
            min: T::neg_infinity(),
            max: T::infinity(),
            enabled: false,
        }
    }
}

impl<T: Float> Saturation<T> {
    /// Creates an enabled clamp over `[min, max]`.
    pub fn new(min: T, max: T) -> Result<Self, SaturationError> {
        let mut saturation = Self::default();
        saturation.configure(min, max)?;
        saturation.enable(true);
        Ok(saturation)
    }

    /// Sets the limits without changing whether the clamp is enabled.
    ///
    /// # Returns
    /// - `Ok(())` if the limits were set.
    /// - `Err(SaturationError::InvalidLimits)` if either limit is NaN or `min > max`. The previous
    ///   limits are kept.
    pub fn configure(&mut self, min: T, max: T) -> Result<(), SaturationError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(SaturationError::InvalidLimits);
        }
        self.min = min;
        self.max = max;
        Ok(())
    }

    /// Switches the clamp on or off.
    pub fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether the clamp is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the lower limit.
    pub fn min(&self) -> T {
        self.min
    }

    /// Returns the upper limit.
    pub fn max(&self) -> T {
        self.max
    }

    /// Clamps `value` into `[min, max]` if enabled, otherwise returns it unchanged.
    ///
    /// NaN passes through in both cases.
    #[inline]
    pub fn apply(&self, value: T) -> T {
        if !self.enabled {
            return value;
        }
        if value > self.max {
            self.max
        } else if value < self.min {
            self.min
        } else {
            value
        }
    }
}
