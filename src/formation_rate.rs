//! The aggregate formation rate: the expected number of new entries into pair seeking per
//! eligible individual per day. It may vary with simulated time, which is measured in days and
//! converted to calendar years for the time-varying forms.

use serde::{Deserialize, Serialize};

use crate::demographics::DAYS_PER_YEAR;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormationRate {
    Constant {
        rate: f64,
    },
    /// A logistic curve in calendar years rising from `min` to `max`, centered on `mid_year`.
    SigmoidVariableFunctionOfTime {
        min: f64,
        max: f64,
        mid_year: f64,
        rate: f64,
    },
    /// Piecewise-linear through `(times[i], values[i])`, with `times` in years and held
    /// constant beyond either end.
    InterpolatedValues {
        times: Vec<f64>,
        values: Vec<f64>,
    },
}

impl FormationRate {
    /// Evaluates the rate at `current_time` (days). The rate is per day and stays fixed across
    /// the step, so `_dt` does not change the value.
    #[must_use]
    pub fn evaluate(&self, current_time: f64, _dt: f64) -> f64 {
        let year = current_time / DAYS_PER_YEAR;
        match self {
            FormationRate::Constant { rate } => *rate,
            FormationRate::SigmoidVariableFunctionOfTime {
                min,
                max,
                mid_year,
                rate,
            } => min + (max - min) / (1.0 + (-rate * (year - mid_year)).exp()),
            FormationRate::InterpolatedValues { times, values } => {
                interpolate(times, values, year)
            }
        }
    }

    /// Every value the function can take lies within the returned bounds.
    pub(crate) fn bounds(&self) -> (f64, f64) {
        match self {
            FormationRate::Constant { rate } => (*rate, *rate),
            FormationRate::SigmoidVariableFunctionOfTime { min, max, .. } => {
                (min.min(*max), min.max(*max))
            }
            FormationRate::InterpolatedValues { values, .. } => values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &value| {
                    (lo.min(value), hi.max(value))
                }),
        }
    }
}

fn interpolate(times: &[f64], values: &[f64], year: f64) -> f64 {
    let upper = times.partition_point(|&time| time <= year);
    if upper == 0 {
        return values[0];
    }
    if upper == times.len() {
        return values[times.len() - 1];
    }
    let (t0, t1) = (times[upper - 1], times[upper]);
    let (v0, v1) = (values[upper - 1], values[upper]);
    v0 + (v1 - v0) * (year - t0) / (t1 - t0)
}
