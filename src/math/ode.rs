//! Adaptive Cash-Karp Runge-Kutta integrator for systems `dy/dx = f(x, y)`.
//!
//! Integration may run in either direction (`x2 < x1` is allowed), which the
//! method-of-lines scheme uses to march backward in time.

use crate::core::FdmError;

const SAFETY: f64 = 0.9;
const PGROW: f64 = -0.2;
const PSHRNK: f64 = -0.25;
const ERRCON: f64 = 1.89e-4;
const TINY: f64 = 1.0e-30;

const A2: f64 = 0.2;
const A3: f64 = 0.3;
const A4: f64 = 0.6;
const A5: f64 = 1.0;
const A6: f64 = 0.875;
const B21: f64 = 0.2;
const B31: f64 = 3.0 / 40.0;
const B32: f64 = 9.0 / 40.0;
const B41: f64 = 0.3;
const B42: f64 = -0.9;
const B43: f64 = 1.2;
const B51: f64 = -11.0 / 54.0;
const B52: f64 = 2.5;
const B53: f64 = -70.0 / 27.0;
const B54: f64 = 35.0 / 27.0;
const B61: f64 = 1631.0 / 55296.0;
const B62: f64 = 175.0 / 512.0;
const B63: f64 = 575.0 / 13824.0;
const B64: f64 = 44275.0 / 110592.0;
const B65: f64 = 253.0 / 4096.0;
const C1: f64 = 37.0 / 378.0;
const C3: f64 = 250.0 / 621.0;
const C4: f64 = 125.0 / 594.0;
const C6: f64 = 512.0 / 1771.0;
const DC1: f64 = C1 - 2825.0 / 27648.0;
const DC3: f64 = C3 - 18575.0 / 48384.0;
const DC4: f64 = C4 - 13525.0 / 55296.0;
const DC5: f64 = -277.0 / 14336.0;
const DC6: f64 = C6 - 0.25;

/// Embedded 4(5) Cash-Karp integrator with step-size control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveRungeKutta {
    /// Relative accuracy target.
    pub eps: f64,
    /// Initial step size (absolute value).
    pub h1: f64,
    /// Minimum admissible step size.
    pub hmin: f64,
    /// Maximum number of accepted steps.
    pub max_steps: usize,
}

impl AdaptiveRungeKutta {
    /// Creates an integrator with accuracy `eps` and initial step `h1`.
    pub fn new(eps: f64, h1: f64) -> Self {
        Self {
            eps,
            h1,
            hmin: 0.0,
            max_steps: 10_000,
        }
    }

    /// Integrates from `x1` to `x2` starting at `y_start`.
    pub fn integrate<F>(
        &self,
        mut f: F,
        y_start: Vec<f64>,
        x1: f64,
        x2: f64,
    ) -> Result<Vec<f64>, FdmError>
    where
        F: FnMut(f64, &[f64]) -> Result<Vec<f64>, FdmError>,
    {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(FdmError::configuration(
                "runge-kutta accuracy must be finite and > 0",
            ));
        }
        if x1 == x2 {
            return Ok(y_start);
        }

        let n = y_start.len();
        let mut y = y_start;
        let mut x = x1;
        let mut h = if x2 >= x1 { self.h1.abs() } else { -self.h1.abs() };
        if h == 0.0 {
            h = x2 - x1;
        }
        let mut yscal = vec![0.0; n];

        for _ in 0..self.max_steps {
            let dydx = f(x, &y)?;
            for i in 0..n {
                yscal[i] = y[i].abs() + (dydx[i] * h).abs() + TINY;
            }
            if (x + h - x2) * (x + h - x1) > 0.0 {
                h = x2 - x;
            }
            let (hdid, hnext) = self.quality_step(&mut f, &mut y, &dydx, &mut x, h, &yscal)?;
            debug_assert!(hdid != 0.0);

            if (x - x2) * (x2 - x1) >= 0.0 {
                return Ok(y);
            }
            if hnext.abs() <= self.hmin {
                return Err(FdmError::numerical("runge-kutta step size too small").at_time(x));
            }
            h = hnext;
        }
        Err(FdmError::numerical("runge-kutta exceeded maximum number of steps").at_time(x))
    }

    fn quality_step<F>(
        &self,
        f: &mut F,
        y: &mut Vec<f64>,
        dydx: &[f64],
        x: &mut f64,
        htry: f64,
        yscal: &[f64],
    ) -> Result<(f64, f64), FdmError>
    where
        F: FnMut(f64, &[f64]) -> Result<Vec<f64>, FdmError>,
    {
        let mut h = htry;
        loop {
            let (ytemp, yerr) = cash_karp_step(f, y, dydx, *x, h)?;
            let errmax = yerr
                .iter()
                .zip(yscal)
                .map(|(e, s)| (e / s).abs())
                .fold(0.0_f64, f64::max)
                / self.eps;
            if errmax.is_nan() {
                return Err(FdmError::numerical("runge-kutta error estimate is not finite")
                    .at_time(*x));
            }
            if errmax <= 1.0 {
                let hnext = if errmax > ERRCON {
                    SAFETY * h * errmax.powf(PGROW)
                } else {
                    5.0 * h
                };
                *x += h;
                *y = ytemp;
                return Ok((h, hnext));
            }
            let htemp = SAFETY * h * errmax.powf(PSHRNK);
            h = if h >= 0.0 {
                htemp.max(0.1 * h)
            } else {
                htemp.min(0.1 * h)
            };
            if *x + h == *x {
                return Err(FdmError::numerical("runge-kutta step size underflow").at_time(*x));
            }
        }
    }
}

fn cash_karp_step<F>(
    f: &mut F,
    y: &[f64],
    dydx: &[f64],
    x: f64,
    h: f64,
) -> Result<(Vec<f64>, Vec<f64>), FdmError>
where
    F: FnMut(f64, &[f64]) -> Result<Vec<f64>, FdmError>,
{
    let n = y.len();
    let stage = |coeffs: &[(f64, &[f64])]| -> Vec<f64> {
        (0..n)
            .map(|i| y[i] + h * coeffs.iter().map(|(c, k)| c * k[i]).sum::<f64>())
            .collect()
    };

    let ak2 = f(x + A2 * h, &stage(&[(B21, dydx)]))?;
    let ak3 = f(x + A3 * h, &stage(&[(B31, dydx), (B32, &ak2[..])]))?;
    let ak4 = f(
        x + A4 * h,
        &stage(&[(B41, dydx), (B42, &ak2[..]), (B43, &ak3[..])]),
    )?;
    let ak5 = f(
        x + A5 * h,
        &stage(&[
            (B51, dydx),
            (B52, &ak2[..]),
            (B53, &ak3[..]),
            (B54, &ak4[..]),
        ]),
    )?;
    let ak6 = f(
        x + A6 * h,
        &stage(&[
            (B61, dydx),
            (B62, &ak2[..]),
            (B63, &ak3[..]),
            (B64, &ak4[..]),
            (B65, &ak5[..]),
        ]),
    )?;

    let yout = stage(&[
        (C1, dydx),
        (C3, &ak3[..]),
        (C4, &ak4[..]),
        (C6, &ak6[..]),
    ]);
    let yerr = (0..n)
        .map(|i| {
            h * (DC1 * dydx[i] + DC3 * ak3[i] + DC4 * ak4[i] + DC5 * ak5[i] + DC6 * ak6[i])
        })
        .collect();
    Ok((yout, yerr))
}
