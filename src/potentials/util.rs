/* ************************************************************************ **
** This file is part of nnip, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of nnip is provided under this permissive license, **
** and that the project as a whole is licensed under the GPL 3.0.           **
** ************************************************************************ */

#[cfg(test)]
pub(crate) fn uniform(a: f64, b: f64) -> f64 { ::rand::random::<f64>() * (b - a) + a }

/// Switches from 0 to 1 as x goes from `interval.0` to `interval.1`.
///
/// Returns the value and its derivative with respect to `x`.
#[inline(always)]
fn switch(
    interpolate: impl FnOnce(f64) -> (f64, f64),
    interval: (f64, f64),
    x: f64,
) -> (f64, f64) {
    match IntervalSide::classify(interval, x) {
        IntervalSide::Left => (0.0, 0.0),
        IntervalSide::Inside => {
            let width = interval.1 - interval.0;
            let alpha = (x - interval.0) / width;
            let (value, d_alpha) = interpolate(alpha);
            (value, d_alpha / width)
        },
        IntervalSide::Right => (1.0, 0.0),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IntervalSide { Left, Inside, Right }

impl IntervalSide {
    /// Determine if a value is before the beginning or after the end of a directed interval.
    ///
    /// `interval.1 < interval.0` is allowed, and flips which side is "left".
    /// Neither endpoint is considered to lie in the interval.
    #[inline(always)]
    pub fn classify(interval: (f64, f64), x: f64) -> Self {
        let (start, end) = interval;
        let before_start = if start < end { x <= start } else { start <= x };
        let after_end = if start < end { end <= x } else { x <= end };
        match (before_start, after_end) {
            (true, _) => IntervalSide::Left,
            (false, true) => IntervalSide::Right,
            (false, false) => IntervalSide::Inside,
        }
    }
}

/// Smooth steps across a directed interval.
///
/// Each function returns `(value, d_value/d_x)`.  The value is 0 on the
/// `interval.0` side and 1 on the `interval.1` side, so a switch that turns
/// something *off* between `a < b` is written as `poly3((b, a), x)`.
pub mod switch {
    /// C1-continuous step.
    pub fn poly3(interval: (f64, f64), x: f64) -> (f64, f64) {
        super::switch(raw_poly3, interval, x)
    }

    // y(0) = 0, y'(0) = 0, y(1) = 1, y'(1) = 0
    //
    // Central differences report a derivative of about `step` instead of 0
    // near the endpoints.
    fn raw_poly3(x: f64) -> (f64, f64) {
        let value = x * x * (3.0 - 2.0 * x);
        let d_x = 6.0 * x * (1.0 - x);
        (value, d_x)
    }
}
