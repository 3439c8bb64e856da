//! Fixed-step fourth-order Runge-Kutta integration over concentration
//! vectors.
//!
//! ```text
//! y' = y + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
//! ```
//!
//! Every intermediate stage state and the final combination are clamped to
//! `max(0, .)` so a transient negative excursion cannot run away. The clamp
//! is a guard, not a substitute for well-posed kinetics. There is no
//! adaptive step control and no stiffness detection; stiff regimes are
//! avoided by parameter choice upstream.
//!
//! A NaN or infinite component in a derivative evaluation is replaced by 0
//! for that component and logged; integration itself never fails.

use ndarray::Array1;
use tracing::warn;

/// Tolerance used when comparing accumulated times against interval
/// boundaries.
const TIME_EPS: f64 = 1e-9;

/// Replace non-finite derivative components with 0.
fn sanitize_derivative(dydt: &mut Array1<f64>, t: f64) {
    for (i, v) in dydt.iter_mut().enumerate() {
        if !v.is_finite() {
            warn!(component = i, t, value = %*v, "non-finite derivative neutralized");
            *v = 0.0;
        }
    }
}

fn clamped(y: Array1<f64>) -> Array1<f64> {
    y.mapv(|v| v.max(0.0))
}

/// Advance `y` from `t` to `t + dt` with one RK4 step.
///
/// `f(y, t)` returns the derivative vector. Returns a fresh vector; the
/// input is never mutated.
pub fn step<F>(y: &Array1<f64>, t: f64, dt: f64, f: &F) -> Array1<f64>
where
    F: Fn(&Array1<f64>, f64) -> Array1<f64>,
{
    let half = 0.5 * dt;

    let mut k1 = f(y, t);
    sanitize_derivative(&mut k1, t);

    let y2 = clamped(y + &(&k1 * half));
    let mut k2 = f(&y2, t + half);
    sanitize_derivative(&mut k2, t + half);

    let y3 = clamped(y + &(&k2 * half));
    let mut k3 = f(&y3, t + half);
    sanitize_derivative(&mut k3, t + half);

    let y4 = clamped(y + &(&k3 * dt));
    let mut k4 = f(&y4, t + dt);
    sanitize_derivative(&mut k4, t + dt);

    let increment = (k1 + &(k2 * 2.0) + &(k3 * 2.0) + k4) * (dt / 6.0);
    clamped(y + &increment)
}

/// Integrate from `t_start` to `t_end`, recording `y0` at `t_start` and a
/// sample whenever `output_interval` sim-seconds have elapsed since the
/// previous sample, plus one at termination.
///
/// Callers choose `output_interval >= dt`.
pub fn integrate<F>(
    y0: &Array1<f64>,
    t_start: f64,
    t_end: f64,
    dt: f64,
    f: &F,
    output_interval: f64,
) -> Vec<(f64, Array1<f64>)>
where
    F: Fn(&Array1<f64>, f64) -> Array1<f64>,
{
    let mut samples = vec![(t_start, clamped(y0.clone()))];
    if dt <= 0.0 || t_end <= t_start {
        return samples;
    }

    let mut y = samples[0].1.clone();
    let mut t = t_start;
    let mut last_output = t_start;

    while t < t_end - TIME_EPS {
        y = step(&y, t, dt, f);
        t += dt;
        if t - last_output >= output_interval - TIME_EPS {
            samples.push((t, y.clone()));
            last_output = t;
        }
    }

    if t - last_output > TIME_EPS {
        samples.push((t, y));
    }
    samples
}
