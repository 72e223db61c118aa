// Generic Z transfer function evaluated as a recurrence over a circular history buffer
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

use alloc::vec::Vec;
use num_traits::Float;

use crate::saturation::{Saturation, SaturationError};
use crate::DiscreteSystem;

/// Errors raised when configuring or stepping a [`TransferFunction`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum TransferFunctionError {
    /// The system is not causal (numerator longer than denominator) or has no denominator at all
    #[cfg_attr(
        feature = "std",
        error("Invalid system: numerator of length {numerator_len} requires a non-empty denominator at least as long, got {denominator_len}")
    )]
    InvalidSystem {
        /// Length of the rejected numerator
        numerator_len: usize,
        /// Length of the rejected denominator
        denominator_len: usize,
    },

    /// The leading denominator coefficient is zero, so the system cannot be normalized
    #[cfg_attr(feature = "std", error("Leading denominator coefficient must be non-zero"))]
    DivisionByZero,

    /// The transfer function was stepped before a successful initialization
    #[cfg_attr(
        feature = "std",
        error("Transfer function stepped before a successful init")
    )]
    Uninitialized,
}

/// Recurrence coefficients of a transfer function, normalized so that the leading denominator
/// coefficient is one.
///
/// For `H(z) = (b0 + b1 z^-1 + ... + bn z^-n) / (a0 + a1 z^-1 + ... + an z^-n)` the output is
///
/// ```text
/// y[k] = c0 x[k] + Σ input[i-1] x[k-i] + Σ output[i-1] y[k-i],  i = 1..=n
/// ```
///
/// with `c0 = b0/a0`, `input[i-1] = bi/a0` and `output[i-1] = -ai/a0`.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedCoefficients<T> {
    c0: T,
    input: Vec<T>,
    output: Vec<T>,
}

impl<T: Float> NormalizedCoefficients<T> {
    /// Derives the recurrence coefficients from numerator and denominator coefficients, both
    /// ordered from the highest power of `z` down.
    ///
    /// A numerator shorter than the denominator is left-padded with zeros, i.e. it has a pure
    /// delay and no direct feedthrough.
    pub fn derive(numerator: &[T], denominator: &[T]) -> Result<Self, TransferFunctionError> {
        if denominator.is_empty() || numerator.len() > denominator.len() {
            return Err(TransferFunctionError::InvalidSystem {
                numerator_len: numerator.len(),
                denominator_len: denominator.len(),
            });
        }

        let lead = denominator[0];
        if lead == T::zero() {
            return Err(TransferFunctionError::DivisionByZero);
        }

        let order = denominator.len() - 1;
        let padding = denominator.len() - numerator.len();
        let padded = |i: usize| {
            if i < padding {
                T::zero()
            } else {
                numerator[i - padding] / lead
            }
        };

        Ok(Self {
            c0: padded(0),
            input: (1..=order).map(padded).collect(),
            output: denominator[1..].iter().map(|&a| -a / lead).collect(),
        })
    }

    /// Builds the coefficients of a system whose denominator already has a leading one.
    pub(crate) fn from_monic(numerator: &[T], denominator: &[T]) -> Self {
        debug_assert!(numerator.len() == denominator.len() && denominator[0] == T::one());
        Self {
            c0: numerator[0],
            input: numerator[1..].to_vec(),
            output: denominator[1..].iter().map(|&a| -a).collect(),
        }
    }

    /// Returns the direct feedthrough coefficient.
    pub fn c0(&self) -> T {
        self.c0
    }

    /// Returns the coefficients applied to past inputs, most recent first.
    pub fn input(&self) -> &[T] {
        &self.input
    }

    /// Returns the coefficients applied to past outputs, most recent first.
    pub fn output(&self) -> &[T] {
        &self.output
    }

    /// Returns the number of past samples the recurrence depends on.
    pub fn order(&self) -> usize {
        self.output.len()
    }
}

/// Fixed-capacity ring of `(input, output)` pairs.
///
/// `cursor` points at the most recent pair; the pair of age `k` (`k = 0` being the most recent)
/// lives at `(cursor + k) mod capacity`. Pushing overwrites the oldest slot and moves the cursor
/// onto it, so no data is ever shifted.
#[derive(Clone, Debug)]
struct HistoryBuffer<T> {
    slots: Vec<(T, T)>,
    cursor: usize,
}

impl<T: Float> HistoryBuffer<T> {
    fn new(capacity: usize) -> Self {
        let mut history = Self {
            slots: Vec::new(),
            cursor: 0,
        };
        history.resize(capacity);
        history
    }

    /// Resizes to `capacity` and zeroes every slot
    fn resize(&mut self, capacity: usize) {
        self.slots.clear();
        self.slots.resize(capacity, (T::zero(), T::zero()));
        self.cursor = 0;
    }

    fn clear(&mut self) {
        self.slots.fill((T::zero(), T::zero()));
        self.cursor = 0;
    }

    #[cfg(test)]
    fn get(&self, age: usize) -> (T, T) {
        self.slots[(self.cursor + age) % self.slots.len()]
    }

    #[inline]
    fn push(&mut self, input: T, output: T) {
        let oldest = if self.cursor == 0 {
            self.slots.len() - 1
        } else {
            self.cursor - 1
        };
        self.slots[oldest] = (input, output);
        self.cursor = oldest;
    }
}

/// A causal discrete transfer function `H(z) = N(z) / D(z)` of arbitrary order, evaluated one
/// sample at a time.
///
/// Each [`step`](DiscreteSystem::step) costs `order` multiply-accumulates for each of the input and
/// output histories, plus O(1) bookkeeping: the history is a ring buffer addressed through a
/// cursor rather than a shift register.
///
/// A transfer function created with [`new_uninit`](TransferFunction::new_uninit) is not ready until
/// [`init`](TransferFunction::init) succeeds; use [`try_step`](TransferFunction::try_step) to be
/// told about it instead of panicking.
///
/// The output can optionally be clamped with
/// [`set_output_limits`](TransferFunction::set_output_limits). The clamped value is what gets
/// recorded in the history, so saturation feeds back into the recurrence.
#[derive(Clone, Debug)]
pub struct TransferFunction<T> {
    coefficients: NormalizedCoefficients<T>,
    history: HistoryBuffer<T>,
    saturation: Saturation<T>,
    ready: bool,
}

impl<T: Float> Default for TransferFunction<T> {
    fn default() -> Self {
        Self::new_uninit()
    }
}

impl<T: Float> TransferFunction<T> {
    /// Creates a transfer function from numerator and denominator coefficients, both ordered from
    /// the highest power of `z` down, at rest.
    ///
    /// # Errors
    /// - [`TransferFunctionError::InvalidSystem`] if the denominator is empty or shorter than the
    ///   numerator.
    /// - [`TransferFunctionError::DivisionByZero`] if `denominator[0]` is zero.
    pub fn new(numerator: &[T], denominator: &[T]) -> Result<Self, TransferFunctionError> {
        let mut tf = Self::new_uninit();
        tf.init(numerator, denominator)?;
        Ok(tf)
    }

    /// Creates an empty transfer function. It cannot be stepped until
    /// [`init`](TransferFunction::init) succeeds.
    pub fn new_uninit() -> Self {
        Self {
            coefficients: NormalizedCoefficients {
                c0: T::zero(),
                input: Vec::new(),
                output: Vec::new(),
            },
            history: HistoryBuffer::new(0),
            saturation: Saturation::default(),
            ready: false,
        }
    }

    /// (Re)defines the transfer function and returns it to rest.
    ///
    /// On failure nothing changes: a ready transfer function keeps its previous coefficients and
    /// history, and an uninitialized one stays uninitialized.
    pub fn init(
        &mut self,
        numerator: &[T],
        denominator: &[T],
    ) -> Result<(), TransferFunctionError> {
        let coefficients = match NormalizedCoefficients::derive(numerator, denominator) {
            Ok(coefficients) => coefficients,
            Err(err) => {
                log::warn!(
                    "Rejected transfer function with {} numerator and {} denominator coefficients",
                    numerator.len(),
                    denominator.len()
                );
                return Err(err);
            }
        };

        if !coefficients.c0.is_finite()
            || coefficients
                .input
                .iter()
                .chain(coefficients.output.iter())
                .any(|c| !c.is_finite())
        {
            log::warn!("Transfer function has non-finite normalized coefficients");
        }

        self.history.resize(coefficients.order());
        self.coefficients = coefficients;
        self.ready = true;
        log::debug!("Initialized transfer function of order {}", self.order());
        Ok(())
    }

    /// Replaces the coefficients while keeping the history, so the output continues from the
    /// current state instead of from rest.
    ///
    /// If the order changes, or the transfer function was never initialized, this behaves like
    /// [`init`](TransferFunction::init). On failure nothing changes.
    pub fn retune(
        &mut self,
        numerator: &[T],
        denominator: &[T],
    ) -> Result<(), TransferFunctionError> {
        let coefficients = NormalizedCoefficients::derive(numerator, denominator)?;
        if !self.ready || coefficients.order() != self.order() {
            return self.init(numerator, denominator);
        }
        self.install(coefficients);
        Ok(())
    }

    /// Installs coefficients of the current order without touching the history.
    pub(crate) fn install(&mut self, coefficients: NormalizedCoefficients<T>) {
        if !self.ready || coefficients.order() != self.order() {
            self.history.resize(coefficients.order());
        }
        self.coefficients = coefficients;
        self.ready = true;
    }

    /// Enables the output clamp with limits `[min, max]`.
    pub fn set_output_limits(&mut self, min: T, max: T) -> Result<(), SaturationError> {
        self.saturation.configure(min, max)?;
        self.saturation.enable(true);
        Ok(())
    }

    /// Disables the output clamp.
    pub fn clear_output_limits(&mut self) {
        self.saturation.enable(false);
    }

    /// Returns whether the output clamp is enabled.
    pub fn is_output_limited(&self) -> bool {
        self.saturation.is_enabled()
    }

    /// Returns the lower output limit.
    pub fn output_min(&self) -> T {
        self.saturation.min()
    }

    /// Returns the upper output limit.
    pub fn output_max(&self) -> T {
        self.saturation.max()
    }

    /// Returns whether [`init`](TransferFunction::init) has succeeded at least once.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Returns the order of the system, i.e. the denominator length minus one.
    pub fn order(&self) -> usize {
        self.coefficients.order()
    }

    /// Returns the normalized recurrence coefficients.
    pub fn coefficients(&self) -> &NormalizedCoefficients<T> {
        &self.coefficients
    }

    /// Steps the transfer function, reporting an error instead of panicking if it is not ready.
    pub fn try_step(&mut self, input: T) -> Result<T, TransferFunctionError> {
        if !self.ready {
            return Err(TransferFunctionError::Uninitialized);
        }
        Ok(self.advance(input))
    }

    #[inline]
    fn advance(&mut self, input: T) -> T {
        let coefficients = &self.coefficients;
        let order = coefficients.order();

        let mut output = coefficients.c0 * input;
        if order == 0 {
            return self.saturation.apply(output);
        }

        let slots = &self.history.slots;
        let mut slot = self.history.cursor;
        for (&b, &a) in coefficients.input.iter().zip(coefficients.output.iter()) {
            let (past_input, past_output) = slots[slot];
            output = output + b * past_input + a * past_output;
            slot += 1;
            if slot == order {
                slot = 0;
            }
        }

        let output = self.saturation.apply(output);
        self.history.push(input, output);
        output
    }
}

impl<T: Float> DiscreteSystem<T> for TransferFunction<T> {
    /// # Panics
    /// Panics if the transfer function has never been successfully initialized. See
    /// [`TransferFunction::try_step`] for a non-panicking alternative.
    #[inline]
    fn step(&mut self, input: T) -> T {
        assert!(
            self.ready,
            "Transfer function stepped before a successful init"
        );
        self.advance(input)
    }

    /// Zeroes the history without touching the coefficients.
    fn reset_state(&mut self) {
        self.history.clear();
    }
}
