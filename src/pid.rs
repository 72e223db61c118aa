// Bilinear PID primitives, their composites and the back-calculation anti-windup controller
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

use crate::saturation::{Saturation, SaturationError};
use crate::ztf::{NormalizedCoefficients, TransferFunction, TransferFunctionError};
use crate::DiscreteSystem;

/// Errors raised when a PID parameter is rejected.
///
/// A setter that returns an error leaves every parameter and cached coefficient untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum PidConfigError {
    /// Kp is not finite
    #[cfg_attr(feature = "std", error("Proportional gain must be finite"))]
    InvalidProportionalGain,

    /// Ki is not finite
    #[cfg_attr(feature = "std", error("Integral gain must be finite"))]
    InvalidIntegralGain,

    /// Kd is not finite
    #[cfg_attr(feature = "std", error("Derivative gain must be finite"))]
    InvalidDerivativeGain,

    /// Kn is negative or not finite
    #[cfg_attr(
        feature = "std",
        error("Derivative filter coefficient must be finite and non-negative")
    )]
    InvalidFilterCoefficient,

    /// Ts is zero, negative or not finite
    #[cfg_attr(feature = "std", error("Sample time must be finite and positive"))]
    InvalidSampleTime,

    /// Kb is not finite
    #[cfg_attr(feature = "std", error("Back-calculation gain must be finite"))]
    InvalidBackCalculationGain,

    /// Either limit is NaN, or the lower limit exceeds the upper limit
    #[cfg_attr(
        feature = "std",
        error("Output limits must be non-NaN with min <= max")
    )]
    InvalidOutputLimits,
}

impl From<SaturationError> for PidConfigError {
    fn from(err: SaturationError) -> Self {
        match err {
            SaturationError::InvalidLimits => PidConfigError::InvalidOutputLimits,
        }
    }
}

fn finite<T: Float>(value: T, err: PidConfigError) -> Result<T, PidConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(err)
    }
}

fn check_kp<T: Float>(kp: T) -> Result<T, PidConfigError> {
    finite(kp, PidConfigError::InvalidProportionalGain)
}

fn check_ki<T: Float>(ki: T) -> Result<T, PidConfigError> {
    finite(ki, PidConfigError::InvalidIntegralGain)
}

fn check_kd<T: Float>(kd: T) -> Result<T, PidConfigError> {
    finite(kd, PidConfigError::InvalidDerivativeGain)
}

fn check_kn<T: Float>(kn: T) -> Result<T, PidConfigError> {
    if kn.is_finite() && kn >= T::zero() {
        Ok(kn)
    } else {
        Err(PidConfigError::InvalidFilterCoefficient)
    }
}

fn check_ts<T: Float>(ts: T) -> Result<T, PidConfigError> {
    if ts.is_finite() && ts > T::zero() {
        Ok(ts)
    } else {
        Err(PidConfigError::InvalidSampleTime)
    }
}

fn two<T: Float>() -> T {
    T::one() + T::one()
}

/// Proportional term: `y = Kp * x`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct P<T> {
    kp: T,
}

impl<T: Float> P<T> {
    /// Creates a proportional term with gain `kp`.
    pub fn new(kp: T) -> Result<Self, PidConfigError> {
        Ok(Self { kp: check_kp(kp)? })
    }

    /// Returns the proportional gain.
    pub fn kp(&self) -> T {
        self.kp
    }

    /// Sets the proportional gain.
    ///
    /// # Returns
    /// - `Ok(())` if the gain was set successfully.
    /// - `Err(PidConfigError::InvalidProportionalGain)` if the gain is not finite.
    pub fn set_param(&mut self, kp: T) -> Result<(), PidConfigError> {
        self.kp = check_kp(kp)?;
        Ok(())
    }
}

impl<T: Float> DiscreteSystem<T> for P<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.kp * input
    }

    /// The proportional term is stateless, so this does nothing.
    fn reset_state(&mut self) {}
}

/// Cached coefficient of the trapezoidal integrator, `Ki * Ts / 2`
fn integrator_coefficient<T: Float>(ki: T, ts: T) -> T {
    ki * ts / two::<T>()
}

/// Integral term `Ki / s`, discretized with the bilinear transform:
///
/// ```text
/// y[k] = Ki * Ts / 2 * (x[k] + x[k-1]) + y[k-1]
/// ```
///
/// The integrator optionally owns an output clamp, disabled by default. Once enabled through
/// [`set_output_limits`](I::set_output_limits), the *stored* output is clamped, so the clamped
/// value re-enters the recurrence on the next tick. This bounds the integral of a standalone
/// integrator, but it is not back-calculation anti-windup; see [`PidAntiWindup`] for that.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct I<T> {
    /// Integral gain
    ki: T,

    /// Sample time in seconds
    ts: T,

    /// Cached `Ki * Ts / 2`, derived from `ki` and `ts`
    coefficient: T,

    last_input: T,
    last_output: T,
    saturation: Saturation<T>,
}

impl<T: Float> I<T> {
    /// Creates an integrator with gain `ki` and sample time `ts` (in seconds), at rest and
    /// without an output clamp.
    pub fn new(ki: T, ts: T) -> Result<Self, PidConfigError> {
        let ki = check_ki(ki)?;
        let ts = check_ts(ts)?;
        Ok(Self {
            ki,
            ts,
            coefficient: integrator_coefficient(ki, ts),
            last_input: T::zero(),
            last_output: T::zero(),
            saturation: Saturation::default(),
        })
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> T {
        self.ki
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.ts
    }

    /// Returns the integral accumulated so far, i.e. the last output.
    pub fn last_output(&self) -> T {
        self.last_output
    }

    /// Sets the integral gain, keeping the sample time.
    pub fn set_gain(&mut self, ki: T) -> Result<(), PidConfigError> {
        self.set_param(ki, self.ts)
    }

    /// Sets the integral gain and the sample time.
    ///
    /// # Returns
    /// - `Ok(())` if both were set successfully.
    /// - `Err(PidConfigError::InvalidIntegralGain)` if `ki` is not finite.
    /// - `Err(PidConfigError::InvalidSampleTime)` if `ts` is not finite and positive.
    pub fn set_param(&mut self, ki: T, ts: T) -> Result<(), PidConfigError> {
        let ki = check_ki(ki)?;
        let ts = check_ts(ts)?;
        self.ki = ki;
        self.ts = ts;
        self.coefficient = integrator_coefficient(ki, ts);
        Ok(())
    }

    /// Enables the output clamp with limits `[min, max]`.
    pub fn set_output_limits(&mut self, min: T, max: T) -> Result<(), PidConfigError> {
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
}

impl<T: Float> DiscreteSystem<T> for I<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.last_output = self
            .saturation
            .apply(self.coefficient * (input + self.last_input) + self.last_output);
        self.last_input = input;
        self.last_output
    }

    fn reset_state(&mut self) {
        self.last_input = T::zero();
        self.last_output = T::zero();
    }
}

/// Cached coefficients of the filtered derivative
#[derive(Copy, Clone, Debug, PartialEq)]
struct DerivativeCoefficients<T> {
    input: T,
    output: T,
}

impl<T: Float> DerivativeCoefficients<T> {
    fn derive(kd: T, kn: T, ts: T) -> Self {
        let kn_ts = kn * ts;
        if kn_ts > two::<T>() {
            log::warn!("Derivative filter has Kn * Ts > 2, its step response will oscillate");
        }
        let den = two::<T>() + kn_ts;
        Self {
            input: two::<T>() * kd * kn / den,
            output: (two::<T>() - kn_ts) / den,
        }
    }
}

/// Derivative term with a first-order low-pass filter, `Kd * Kn / (1 + Kn / s)`, discretized
/// with the bilinear transform:
///
/// ```text
/// y[k] = 2 Kd Kn / (2 + Kn Ts) * (x[k] - x[k-1]) + (2 - Kn Ts) / (2 + Kn Ts) * y[k-1]
/// ```
///
/// A smaller filter coefficient `Kn` attenuates high-frequency noise more, at the cost of a
/// slower derivative. Keep `Kn * Ts <= 2`: beyond that the output coefficient turns negative and
/// the step response oscillates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct D<T> {
    kd: T,
    kn: T,
    ts: T,
    coefficients: DerivativeCoefficients<T>,
    last_input: T,
    last_output: T,
}

impl<T: Float> D<T> {
    /// Creates a filtered derivative with gain `kd`, filter coefficient `kn` and sample time `ts`.
    pub fn new(kd: T, kn: T, ts: T) -> Result<Self, PidConfigError> {
        let kd = check_kd(kd)?;
        let kn = check_kn(kn)?;
        let ts = check_ts(ts)?;
        Ok(Self {
            kd,
            kn,
            ts,
            coefficients: DerivativeCoefficients::derive(kd, kn, ts),
            last_input: T::zero(),
            last_output: T::zero(),
        })
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> T {
        self.kd
    }

    /// Returns the filter coefficient.
    pub fn kn(&self) -> T {
        self.kn
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.ts
    }

    /// Sets the derivative gain and the filter coefficient, keeping the sample time.
    pub fn set_gains(&mut self, kd: T, kn: T) -> Result<(), PidConfigError> {
        self.set_param(kd, kn, self.ts)
    }

    /// Sets the derivative gain, the filter coefficient and the sample time.
    ///
    /// # Returns
    /// - `Ok(())` if all were set successfully.
    /// - `Err(PidConfigError::InvalidDerivativeGain)` if `kd` is not finite.
    /// - `Err(PidConfigError::InvalidFilterCoefficient)` if `kn` is negative or not finite.
    /// - `Err(PidConfigError::InvalidSampleTime)` if `ts` is not finite and positive.
    pub fn set_param(&mut self, kd: T, kn: T, ts: T) -> Result<(), PidConfigError> {
        let kd = check_kd(kd)?;
        let kn = check_kn(kn)?;
        let ts = check_ts(ts)?;
        self.kd = kd;
        self.kn = kn;
        self.ts = ts;
        self.coefficients = DerivativeCoefficients::derive(kd, kn, ts);
        Ok(())
    }
}

impl<T: Float> DiscreteSystem<T> for D<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.last_output = self.coefficients.input * (input - self.last_input)
            + self.coefficients.output * self.last_output;
        self.last_input = input;
        self.last_output
    }

    fn reset_state(&mut self) {
        self.last_input = T::zero();
        self.last_output = T::zero();
    }
}

/// A PID controller, `Kp + Ki/s + Kd * Kn / (1 + Kn/s)`, built from independent [`P`], [`I`]
/// and [`D`] terms that all see the same input.
///
/// The parameters can be copied verbatim from Simulink's Discrete PID Controller configured with
/// trapezoidal integrator and filter methods.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pid<T> {
    p: P<T>,
    i: I<T>,
    d: D<T>,
}

impl<T: Float> Pid<T> {
    /// Creates a PID controller at rest.
    ///
    /// # Arguments
    /// - `kp`: proportional gain
    /// - `ki`: integral gain
    /// - `kd`: derivative gain
    /// - `kn`: derivative filter coefficient
    /// - `ts`: sample time in seconds, i.e. the period between two calls to `step`
    pub fn new(kp: T, ki: T, kd: T, kn: T, ts: T) -> Result<Self, PidConfigError> {
        Ok(Self {
            p: P::new(kp)?,
            i: I::new(ki, ts)?,
            d: D::new(kd, kn, ts)?,
        })
    }

    /// Sets every gain and the sample time. Nothing changes if any parameter is invalid.
    pub fn set_param(&mut self, kp: T, ki: T, kd: T, kn: T, ts: T) -> Result<(), PidConfigError> {
        check_kp(kp)?;
        check_ki(ki)?;
        check_kd(kd)?;
        check_kn(kn)?;
        check_ts(ts)?;
        self.p.set_param(kp)?;
        self.i.set_param(ki, ts)?;
        self.d.set_param(kd, kn, ts)?;
        log::debug!("Retuned PID controller and sample time");
        Ok(())
    }

    /// Sets every gain, keeping the sample time. Nothing changes if any gain is invalid.
    pub fn set_gains(&mut self, kp: T, ki: T, kd: T, kn: T) -> Result<(), PidConfigError> {
        self.set_param(kp, ki, kd, kn, self.i.ts())
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.i.ts()
    }

    /// Returns the proportional term.
    pub fn p(&self) -> &P<T> {
        &self.p
    }

    /// Returns the integral term.
    pub fn i(&self) -> &I<T> {
        &self.i
    }

    /// Clamps the integral term to `[min, max]`. See [`I::set_output_limits`].
    pub fn set_integrator_limits(&mut self, min: T, max: T) -> Result<(), PidConfigError> {
        self.i.set_output_limits(min, max)
    }

    /// Removes the integral clamp.
    pub fn clear_integrator_limits(&mut self) {
        self.i.clear_output_limits();
    }

    /// Returns the derivative term.
    pub fn d(&self) -> &D<T> {
        &self.d
    }

    /// Fuses the three terms into a single second-order transfer function, at rest.
    ///
    /// With the integrator clamp disabled, the result produces the same output sequence as this
    /// controller up to floating-point rounding.
    pub fn transfer_function(&self) -> Result<TransferFunction<T>, TransferFunctionError> {
        let (numerator, denominator) = self.fused();
        TransferFunction::new(&numerator, &denominator)
    }

    /// Numerator and monic denominator of the fused second-order realization
    fn fused(&self) -> ([T; 3], [T; 3]) {
        let kp = self.p.kp;
        let k = self.i.coefficient;
        let c = self.d.coefficients.input;
        let r = self.d.coefficients.output;
        let one = T::one();

        // Kp + k (1 + z^-1) / (1 - z^-1) + c (1 - z^-1) / (1 - r z^-1)
        (
            [
                kp + k + c,
                -kp * (one + r) + k * (one - r) - two::<T>() * c,
                kp * r - k * r + c,
            ],
            [one, -(one + r), r],
        )
    }
}

impl<T: Float> DiscreteSystem<T> for Pid<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.p.step(input) + self.i.step(input) + self.d.step(input)
    }

    fn reset_state(&mut self) {
        self.p.reset_state();
        self.i.reset_state();
        self.d.reset_state();
    }
}

/// A PI controller, `Kp + Ki/s`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pi<T> {
    p: P<T>,
    i: I<T>,
}

impl<T: Float> Pi<T> {
    /// Creates a PI controller at rest.
    pub fn new(kp: T, ki: T, ts: T) -> Result<Self, PidConfigError> {
        Ok(Self {
            p: P::new(kp)?,
            i: I::new(ki, ts)?,
        })
    }

    /// Sets both gains and the sample time. Nothing changes if any parameter is invalid.
    pub fn set_param(&mut self, kp: T, ki: T, ts: T) -> Result<(), PidConfigError> {
        check_kp(kp)?;
        self.i.set_param(ki, ts)?;
        self.p.set_param(kp)?;
        log::debug!("Retuned PI controller and sample time");
        Ok(())
    }

    /// Sets both gains, keeping the sample time.
    pub fn set_gains(&mut self, kp: T, ki: T) -> Result<(), PidConfigError> {
        self.set_param(kp, ki, self.i.ts())
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.i.ts()
    }

    /// Returns the proportional term.
    pub fn p(&self) -> &P<T> {
        &self.p
    }

    /// Returns the integral term.
    pub fn i(&self) -> &I<T> {
        &self.i
    }

    /// Clamps the integral term to `[min, max]`. See [`I::set_output_limits`].
    pub fn set_integrator_limits(&mut self, min: T, max: T) -> Result<(), PidConfigError> {
        self.i.set_output_limits(min, max)
    }

    /// Removes the integral clamp.
    pub fn clear_integrator_limits(&mut self) {
        self.i.clear_output_limits();
    }

    /// Fuses both terms into a single first-order transfer function, at rest.
    pub fn transfer_function(&self) -> Result<TransferFunction<T>, TransferFunctionError> {
        let kp = self.p.kp;
        let k = self.i.coefficient;
        TransferFunction::new(&[kp + k, k - kp], &[T::one(), -T::one()])
    }
}

impl<T: Float> DiscreteSystem<T> for Pi<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.p.step(input) + self.i.step(input)
    }

    fn reset_state(&mut self) {
        self.p.reset_state();
        self.i.reset_state();
    }
}

/// A PD controller, `Kp + Kd * Kn / (1 + Kn/s)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pd<T> {
    p: P<T>,
    d: D<T>,
}

impl<T: Float> Pd<T> {
    /// Creates a PD controller at rest.
    pub fn new(kp: T, kd: T, kn: T, ts: T) -> Result<Self, PidConfigError> {
        Ok(Self {
            p: P::new(kp)?,
            d: D::new(kd, kn, ts)?,
        })
    }

    /// Sets every gain and the sample time. Nothing changes if any parameter is invalid.
    pub fn set_param(&mut self, kp: T, kd: T, kn: T, ts: T) -> Result<(), PidConfigError> {
        check_kp(kp)?;
        self.d.set_param(kd, kn, ts)?;
        self.p.set_param(kp)?;
        log::debug!("Retuned PD controller and sample time");
        Ok(())
    }

    /// Sets every gain, keeping the sample time.
    pub fn set_gains(&mut self, kp: T, kd: T, kn: T) -> Result<(), PidConfigError> {
        self.set_param(kp, kd, kn, self.d.ts())
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.d.ts()
    }

    /// Returns the proportional term.
    pub fn p(&self) -> &P<T> {
        &self.p
    }

    /// Returns the derivative term.
    pub fn d(&self) -> &D<T> {
        &self.d
    }

    /// Fuses both terms into a single first-order transfer function, at rest.
    pub fn transfer_function(&self) -> Result<TransferFunction<T>, TransferFunctionError> {
        let kp = self.p.kp;
        let c = self.d.coefficients.input;
        let r = self.d.coefficients.output;
        TransferFunction::new(&[kp + c, -kp * r - c], &[T::one(), -r])
    }
}

impl<T: Float> DiscreteSystem<T> for Pd<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.p.step(input) + self.d.step(input)
    }

    fn reset_state(&mut self) {
        self.p.reset_state();
        self.d.reset_state();
    }
}

/// A PID controller realized as a single second-order recurrence whose output is clamped to
/// `[output_min, output_max]`.
///
/// The clamped output is the one recorded in the recurrence history, so once saturated the
/// controller resumes from the limit instead of from the unbounded value it would have reached.
/// This is the simplest form of anti-windup; unlike [`PidAntiWindup`] it has no tuning knob,
/// and unlike [`I::set_output_limits`] it bounds the whole output rather than the integral term.
///
/// Retuning keeps the recurrence history, so the output does not jump back to rest.
#[derive(Clone, Debug)]
pub struct ClampedPid<T> {
    /// Source of truth for the gains; never stepped
    terms: Pid<T>,
    realization: TransferFunction<T>,
}

impl<T: Float> ClampedPid<T> {
    /// Creates a clamped PID controller at rest. See [`Pid::new`] for the gains.
    pub fn new(
        kp: T,
        ki: T,
        kd: T,
        kn: T,
        ts: T,
        output_min: T,
        output_max: T,
    ) -> Result<Self, PidConfigError> {
        let terms = Pid::new(kp, ki, kd, kn, ts)?;
        let mut realization = TransferFunction::new_uninit();
        realization.set_output_limits(output_min, output_max)?;

        let mut pid = Self { terms, realization };
        pid.refresh();
        Ok(pid)
    }

    fn refresh(&mut self) {
        let (numerator, denominator) = self.terms.fused();
        self.realization.install(NormalizedCoefficients::from_monic(&numerator, &denominator));
    }

    /// Sets every gain and the sample time. Nothing changes if any parameter is invalid.
    pub fn set_param(&mut self, kp: T, ki: T, kd: T, kn: T, ts: T) -> Result<(), PidConfigError> {
        self.terms.set_param(kp, ki, kd, kn, ts)?;
        self.refresh();
        Ok(())
    }

    /// Sets every gain, keeping the sample time.
    pub fn set_gains(&mut self, kp: T, ki: T, kd: T, kn: T) -> Result<(), PidConfigError> {
        self.set_param(kp, ki, kd, kn, self.terms.ts())
    }

    /// Sets the output limits.
    pub fn set_output_limits(&mut self, min: T, max: T) -> Result<(), PidConfigError> {
        self.realization.set_output_limits(min, max)?;
        Ok(())
    }

    /// Returns the proportional gain.
    pub fn kp(&self) -> T {
        self.terms.p().kp()
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> T {
        self.terms.i().ki()
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> T {
        self.terms.d().kd()
    }

    /// Returns the derivative filter coefficient.
    pub fn kn(&self) -> T {
        self.terms.d().kn()
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.terms.ts()
    }

    /// Returns the lower output limit.
    pub fn output_min(&self) -> T {
        self.realization.output_min()
    }

    /// Returns the upper output limit.
    pub fn output_max(&self) -> T {
        self.realization.output_max()
    }

    /// Returns the underlying recurrence.
    pub fn realization(&self) -> &TransferFunction<T> {
        &self.realization
    }
}

impl<T: Float> DiscreteSystem<T> for ClampedPid<T> {
    #[inline]
    fn step(&mut self, input: T) -> T {
        self.realization.step(input)
    }

    fn reset_state(&mut self) {
        self.realization.reset_state();
    }
}

/// A PID controller with output saturation and back-calculation anti-windup.
///
/// Each tick, the P and D terms are added to the integral accumulated up to the previous tick and
/// the sum is clamped to `[output_min, output_max]`. Whatever the clamp removed is fed back into
/// the next integrator input, scaled by `Kb`:
///
/// ```text
/// pre  = i[k-1] + p[k] + d[k]
/// post = clamp(pre, output_min, output_max)
/// i[k] = I(Ki * x[k] + Kb * (post - pre))
/// ```
///
/// The wrapped integrator runs with unit gain so that `Ki` and `Kb` can be tuned separately.
/// While the output stays within its limits the feedback term is exactly zero.
///
/// Construct it with [`PidAntiWindupBuilder`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidAntiWindup<T> {
    p: P<T>,
    d: D<T>,
    i: I<T>,

    /// Integral gain, applied at the integrator input
    ki: T,

    /// Back-calculation gain
    kb: T,

    output_saturation: Saturation<T>,
    last_integrator_output: T,
}

impl<T: Float> PidAntiWindup<T> {
    /// Returns the integral gain.
    pub fn ki(&self) -> T {
        self.ki
    }

    /// Returns the back-calculation gain.
    pub fn kb(&self) -> T {
        self.kb
    }

    /// Returns the sample time.
    pub fn ts(&self) -> T {
        self.i.ts()
    }

    /// Returns the lower output limit.
    pub fn output_min(&self) -> T {
        self.output_saturation.min()
    }

    /// Returns the upper output limit.
    pub fn output_max(&self) -> T {
        self.output_saturation.max()
    }

    /// Returns the integral term fed into the next output.
    pub fn last_integrator_output(&self) -> T {
        self.last_integrator_output
    }

    /// Returns the proportional term.
    pub fn p(&self) -> &P<T> {
        &self.p
    }

    /// Returns the derivative term.
    pub fn d(&self) -> &D<T> {
        &self.d
    }

    /// Sets every gain and the sample time. Nothing changes if any parameter is invalid.
    pub fn set_param(&mut self, kp: T, ki: T, kd: T, kn: T, ts: T) -> Result<(), PidConfigError> {
        check_kp(kp)?;
        let ki = check_ki(ki)?;
        check_kd(kd)?;
        check_kn(kn)?;
        check_ts(ts)?;
        self.p.set_param(kp)?;
        self.i.set_param(T::one(), ts)?;
        self.d.set_param(kd, kn, ts)?;
        self.ki = ki;
        log::debug!("Retuned anti-windup PID controller and sample time");
        Ok(())
    }

    /// Sets every gain, keeping the sample time.
    pub fn set_gains(&mut self, kp: T, ki: T, kd: T, kn: T) -> Result<(), PidConfigError> {
        self.set_param(kp, ki, kd, kn, self.i.ts())
    }

    /// Sets the back-calculation gain.
    pub fn set_kb(&mut self, kb: T) -> Result<(), PidConfigError> {
        self.kb = finite(kb, PidConfigError::InvalidBackCalculationGain)?;
        Ok(())
    }

    /// Sets the output limits. Infinite limits disable clamping on that side.
    pub fn set_output_limits(&mut self, min: T, max: T) -> Result<(), PidConfigError> {
        self.output_saturation.configure(min, max)?;
        Ok(())
    }
}

impl<T: Float> DiscreteSystem<T> for PidAntiWindup<T> {
    fn step(&mut self, input: T) -> T {
        let p = self.p.step(input);
        let d = self.d.step(input);
        let pre_saturation = self.last_integrator_output + p + d;
        let post_saturation = self.output_saturation.apply(pre_saturation);
        let back_calculation = post_saturation - pre_saturation;
        self.last_integrator_output = self.i.step(input * self.ki + back_calculation * self.kb);
        post_saturation
    }

    fn reset_state(&mut self) {
        self.p.reset_state();
        self.d.reset_state();
        self.i.reset_state();
        self.last_integrator_output = T::zero();
    }
}

fn literal<T: Float>(value: f64) -> T {
    <T as num_traits::NumCast>::from(value).unwrap_or_else(T::nan)
}

/// Builder for [`PidAntiWindup`], validating every parameter in [`build`](Self::build).
#[derive(Copy, Clone, Debug)]
pub struct PidAntiWindupBuilder<T> {
    /// Proportional gain.
    /// Defaults to 1.0.
    kp: T,

    /// Integral gain.
    /// Defaults to 0.0.
    ki: T,

    /// Derivative gain.
    /// Defaults to 0.0.
    kd: T,

    /// Derivative filter coefficient.
    /// Defaults to 100.0.
    kn: T,

    /// Sample time in seconds.
    /// Defaults to 0.01.
    ts: T,

    /// Back-calculation gain.
    /// Defaults to 1.0.
    kb: T,

    /// Lower output limit.
    /// Defaults to negative infinity, i.e. no limit.
    output_min: T,

    /// Upper output limit.
    /// Defaults to positive infinity, i.e. no limit.
    output_max: T,
}

impl<T: Float> Default for PidAntiWindupBuilder<T> {
    fn default() -> Self {
        Self {
            kp: T::one(),
            ki: T::zero(),
            kd: T::zero(),
            kn: literal(100.0),
            ts: literal(0.01),
            kb: T::one(),
            output_min: T::neg_infinity(),
            output_max: T::infinity(),
        }
    }
}

impl<T: Float> PidAntiWindupBuilder<T> {
    /// Sets the proportional gain.
    pub fn kp(mut self, kp: T) -> Self {
        self.kp = kp;
        self
    }

    /// Sets the integral gain.
    pub fn ki(mut self, ki: T) -> Self {
        self.ki = ki;
        self
    }

    /// Sets the derivative gain.
    pub fn kd(mut self, kd: T) -> Self {
        self.kd = kd;
        self
    }

    /// Sets the derivative filter coefficient.
    pub fn kn(mut self, kn: T) -> Self {
        self.kn = kn;
        self
    }

    /// Sets the sample time in seconds.
    pub fn sample_time(mut self, ts: T) -> Self {
        self.ts = ts;
        self
    }

    /// Sets the back-calculation gain.
    pub fn kb(mut self, kb: T) -> Self {
        self.kb = kb;
        self
    }

    /// Sets the output limits.
    pub fn output_limits(mut self, output_min: T, output_max: T) -> Self {
        self.output_min = output_min;
        self.output_max = output_max;
        self
    }

    /// Validates the parameters and builds a controller at rest.
    pub fn build(self) -> Result<PidAntiWindup<T>, PidConfigError> {
        Ok(PidAntiWindup {
            p: P::new(self.kp)?,
            d: D::new(self.kd, self.kn, self.ts)?,
            i: I::new(T::one(), self.ts)?,
            ki: check_ki(self.ki)?,
            kb: finite(self.kb, PidConfigError::InvalidBackCalculationGain)?,
            output_saturation: Saturation::new(self.output_min, self.output_max)?,
            last_integrator_output: T::zero(),
        })
    }
}
