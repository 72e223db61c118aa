#![warn(missing_docs)]

//! # Discrete Control Library
//!
//! Discrete-time transfer functions and a family of PID controllers built for fixed-rate control
//! loops.
//!
//! Every system in this crate is advanced by calling [`DiscreteSystem::step`] exactly once per
//! sampling period `Ts`. There is no notion of wall-clock time: `Ts` is baked into the cached
//! coefficients of each controller, so the caller is responsible for the tick cadence.
//!
//! ## Features
//!
//! - A generic order-N IIR engine ([`ztf::TransferFunction`]) evaluating any causal
//!   `H(z) = N(z) / D(z)` with O(1) history bookkeeping per sample.
//! - PID primitives discretized with the bilinear (trapezoidal) transform, numerically equivalent
//!   to Simulink's Discrete PID Controller with trapezoidal integrator and filter methods:
//!   `Kp + Ki/s + Kd * Kn / (1 + Kn/s)`, `s = 2/Ts * (z - 1)/(z + 1)`.
//! - PID, PI and PD composites, each convertible to a single fused transfer function.
//! - A PID controller with output saturation and back-calculation anti-windup, and a simpler
//!   fused PID whose clamped output is fed back into its own recurrence.
//!
//! ## Usage
//!
//! ### Transfer function
//!
//! ```rust
//! use discrete_control::ztf::TransferFunction;
//! use discrete_control::DiscreteSystem;
//!
//! // y[n] = 0.5 x[n] + 0.5 x[n-1] + 0.2 y[n-1]
//! let mut tf = TransferFunction::new(&[0.5, 0.5], &[1.0, -0.2]).expect("Causal system");
//!
//! assert_eq!(tf.step(1.0), 0.5);
//! assert_eq!(tf.step(1.0), 0.5 + 0.5 + 0.2 * 0.5);
//!
//! tf.reset_state();
//! assert_eq!(tf.step(1.0), 0.5);
//! ```
//!
//! ### PID controller
//!
//! ```rust
//! use discrete_control::pid::Pid;
//! use discrete_control::DiscreteSystem;
//!
//! // Kp, Ki, Kd, Kn, Ts
//! let mut pid = Pid::new(1.23, 0.54, 0.1, 100.0, 0.01).expect("Invalid PID parameters");
//!
//! let error = 0.5;
//! let _control = pid.step(error);
//!
//! // Retune the gains between ticks without touching the sample time
//! assert!(pid.set_gains(2.0, 0.6, 0.1, 100.0).is_ok());
//! ```
//!
//! ### Anti-windup PID controller
//!
//! ```rust
//! use discrete_control::pid::PidAntiWindupBuilder;
//! use discrete_control::DiscreteSystem;
//!
//! let mut pid = PidAntiWindupBuilder::default()
//!     .kp(2.0)
//!     .ki(5.0)
//!     .kb(1.0)
//!     .sample_time(0.01)
//!     .output_limits(-5.0, 5.0)
//!     .build()
//!     .expect("Invalid PID parameters");
//!
//! // A large error saturates the output; the integrator is held back by back-calculation
//! assert_eq!(pid.step(10.0), 5.0);
//! ```
//!
//! ## License
//!
//! MIT
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// Output clamping shared by the integrator and the anti-windup controller
pub mod saturation;

/// The generic Z transfer function engine
pub mod ztf;

/// PID primitives, composites and the anti-windup controllers
pub mod pid;

#[doc(hidden)]
#[cfg(feature = "simulation")]
pub mod sim;

/// The common contract of every filter and controller in this crate.
///
/// Implementors are advanced by exactly one call to [`step`](DiscreteSystem::step) per sampling
/// tick. Consecutive calls must represent consecutive, equally spaced samples.
pub trait DiscreteSystem<T> {
    /// Feeds one input sample into the system and returns the output for this tick.
    fn step(&mut self, input: T) -> T;

    /// Returns the system to rest, as though its input and output had been zero forever.
    fn reset_state(&mut self);
}

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
