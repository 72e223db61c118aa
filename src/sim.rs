use alloc::vec::Vec;
use nalgebra as na;

/// Shape of a [`SignalGenerator`] reference
pub enum WaveForm {
    /// Unit sine
    Sine,
    /// Unit square wave, the sign of a sine
    Square,
}

/// Generates a periodic reference sampled every `ts` seconds
pub struct SignalGenerator {
    fcn: fn(f64) -> f64,
    ts: f64,
    amplitude: f64,
    offset: f64,
}

impl SignalGenerator {
    /// Creates a generator of `amplitude * waveform(t) + offset`
    pub fn new(waveform: WaveForm, ts: f64, amplitude: f64, offset: f64) -> Self {
        Self {
            fcn: match waveform {
                WaveForm::Sine => f64::sin,
                WaveForm::Square => |x| x.sin().signum(),
            },
            ts,
            amplitude,
            offset,
        }
    }

    /// Samples the reference at `tick`
    pub fn generate(&self, tick: usize) -> f64 {
        self.amplitude * (self.fcn)(tick as f64 * self.ts) + self.offset
    }
}

/// Fourth-order Runge-Kutta step of `x' = f(x)` over `h` seconds
pub fn rk4_step<F>(f: F, x: na::Vector2<f64>, h: f64) -> na::Vector2<f64>
where
    F: Fn(na::Vector2<f64>) -> na::Vector2<f64>,
{
    let k1 = f(x);
    let k2 = f(x + k1 * (h / 2.0));
    let k3 = f(x + k2 * (h / 2.0));
    let k4 = f(x + k3 * h);
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// Second-order plant driven towards its input `u`, with unit DC gain
pub struct MassSpringDamper {
    mat_a: na::Matrix2<f64>,
    mat_b: na::Vector2<f64>,
}

impl MassSpringDamper {
    /// State-space realization with state `[p, p']`:
    /// ┌     ┐   ┌              ┐┌    ┐   ┌     ┐
    /// │ p'  │ = │  0     1     ││ p  │ + │ 0   │ u
    /// │ p'' │   │  -ωₙ²  -2ζωₙ ││ p' │   │ ωₙ² │
    /// └     ┘   └              ┘└    ┘   └     ┘
    pub fn new(natural_frequency: f64, damping_ratio: f64) -> Self {
        let omega_sq = natural_frequency.powi(2);
        let two_zeta_omega = 2.0 * natural_frequency * damping_ratio;
        Self {
            mat_a: na::Matrix2::new(0.0, 1.0, -omega_sq, -two_zeta_omega),
            mat_b: na::Vector2::new(0.0, omega_sq),
        }
    }

    /// State derivative under input `u`
    pub fn derivative(&self, x: na::Vector2<f64>, u: f64) -> na::Vector2<f64> {
        self.mat_a * x + self.mat_b * u
    }

    /// The measured position `p`
    pub fn position(&self, x: na::Vector2<f64>) -> f64 {
        x[0]
    }
}

/// Runs `controller` in closed loop around `plant` tracking `reference`, holding the control for
/// one sample between ticks. Returns the plant output and the control at every tick.
pub fn closed_loop<C>(
    controller: &mut C,
    plant: &MassSpringDamper,
    reference: impl Fn(usize) -> f64,
    ts: f64,
    ticks: usize,
) -> (Vec<f64>, Vec<f64>)
where
    C: crate::DiscreteSystem<f64>,
{
    let mut state = na::Vector2::<f64>::zeros();
    let mut outputs = Vec::with_capacity(ticks);
    let mut controls = Vec::with_capacity(ticks);

    for tick in 0..ticks {
        let output = plant.position(state);
        let control = controller.step(reference(tick) - output);
        state = rk4_step(|x| plant.derivative(x, control), state, ts);
        outputs.push(output);
        controls.push(control);
    }
    (outputs, controls)
}
