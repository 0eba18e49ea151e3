use std::f64::consts::PI;

use crate::Error;

/// Smooth switching function going from 1 at `x <= 0` to 0 at `x >= 1` as
/// `1/2 (1 + cos(π x))`. Returns the value and the derivative with respect
/// to `x`.
#[inline]
pub(crate) fn cosine_switch(x: f64) -> (f64, f64) {
    if x <= 0.0 {
        return (1.0, 0.0);
    } else if x >= 1.0 {
        return (0.0, 0.0);
    }

    let (sin, cos) = f64::sin_cos(PI * x);
    return (0.5 * (1.0 + cos), -0.5 * PI * sin);
}

/// Smooth switching function going from 1 at `x <= 0` to 0 at `x >= 1` as
/// `1 - (10 x^3 - 15 x^4 + 6 x^5)`, with zero first and second derivatives at
/// both ends. Returns the value and the derivative with respect to `x`.
#[inline]
pub(crate) fn polynomial_switch(x: f64) -> (f64, f64) {
    if x <= 0.0 {
        return (1.0, 0.0);
    } else if x >= 1.0 {
        return (0.0, 0.0);
    }

    let x2 = x * x;
    let x3 = x2 * x;
    let value = 1.0 - x3 * (10.0 - 15.0 * x + 6.0 * x2);
    let derivative = -30.0 * x2 * (1.0 - 2.0 * x + x2);
    return (value, derivative);
}

/// Possible values for the smoothing cutoff function. All functions are 1
/// for `r <= cutoff - width` and 0 for `r >= cutoff`, and continuous with
/// a continuous first derivative in between.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type")]
pub enum CutoffFunction {
    /// Shifted cosine switching function
    /// `f(r) = 1/2 * (1 + cos(π (r - cutoff + width) / width ))`. This is
    /// the form used by Tersoff, and (written with a sine) by Albe and
    /// Erhart.
    ShiftedCosine {
        width: f64,
    },
    /// Switching function with a vanishing second derivative at the inner
    /// boundary, `f(x) = 1/2 + 9/16 cos(π x) - 1/16 cos(3 π x)` with `x = (r -
    /// cutoff + width) / width`, used by Kumagai et al.
    SmoothCosine {
        width: f64,
    },
    /// Fifth order polynomial switch `f(x) = 1 - 10 x^3 + 15 x^4 - 6 x^5`
    Polynomial {
        width: f64,
    },
}

impl CutoffFunction {
    /// Width of the switching region
    pub fn width(&self) -> f64 {
        match *self {
            CutoffFunction::ShiftedCosine { width } |
            CutoffFunction::SmoothCosine { width } |
            CutoffFunction::Polynomial { width } => width,
        }
    }

    pub fn validate(&self, cutoff: f64) -> Result<(), Error> {
        let width = self.width();
        if !(width > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "expected positive width for cutoff function, got {}", width
            )));
        }

        if width > cutoff {
            return Err(Error::InvalidParameter(format!(
                "cutoff function width ({}) can not be larger than the cutoff ({})", width, cutoff
            )));
        }
        return Ok(());
    }

    /// Evaluate the cutoff function and its derivative at the distance `r`
    /// for the given `cutoff`
    #[inline]
    pub fn compute(&self, r: f64, cutoff: f64) -> (f64, f64) {
        let width = self.width();
        let x = (r - cutoff + width) / width;

        let (value, derivative) = match self {
            CutoffFunction::ShiftedCosine { .. } => cosine_switch(x),
            CutoffFunction::Polynomial { .. } => polynomial_switch(x),
            CutoffFunction::SmoothCosine { .. } => {
                if x <= 0.0 {
                    (1.0, 0.0)
                } else if x >= 1.0 {
                    (0.0, 0.0)
                } else {
                    let value = 0.5 + 9.0 / 16.0 * f64::cos(PI * x) - 1.0 / 16.0 * f64::cos(3.0 * PI * x);
                    let derivative = -9.0 / 16.0 * PI * f64::sin(PI * x) + 3.0 / 16.0 * PI * f64::sin(3.0 * PI * x);
                    (value, derivative)
                }
            }
        };

        return (value, derivative / width);
    }
}
