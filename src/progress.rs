//! Progress reporting with nested sub-ranges.
//!
//! A [`Progress`] maps its local `[0, 1]` onto an absolute range
//! `[min, max]` and forwards values to the caller's callback, skipping
//! updates that advance by less than `epsilon`. Stages receive a
//! sub-range of their parent so they can report in their own `[0, 1]`.

/// Callback receiving the overall completed fraction in `[0, 1]`.
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Sync);

pub(crate) struct Progress<'a> {
    callback: Option<ProgressFn<'a>>,
    min: f64,
    max: f64,
    epsilon: f64,
    /// Last value handed to the callback, in absolute units.
    d_prev: f64,
    /// Upper end of a silenced sub-range, in parent units.
    b: f64,
}

impl<'a> Progress<'a> {
    pub fn new(callback: Option<ProgressFn<'a>>, epsilon: f64) -> Self {
        Progress { callback, min: 0.0, max: 1.0, epsilon, d_prev: 0.0, b: 1.0 }
    }

    /// A reporter that never calls anything.
    pub fn silent() -> Self {
        Progress::new(None, 0.0)
    }

    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    /// Report local progress `d` in `[0, 1]`.
    pub fn update(&mut self, d: f64) {
        if let Some(callback) = self.callback {
            let scaled = self.min * (1.0 - d) + self.max * d;
            if d == 1.0 || scaled >= self.d_prev + self.epsilon {
                callback(scaled);
                self.d_prev = scaled;
            }
        }
    }

    /// Open the sub-range `[a, b]` of this reporter's local range.
    ///
    /// A sub-range narrower than `epsilon` is silenced; closing it with
    /// [`Progress::end_subrange`] then advances the parent to `b` in one
    /// step.
    pub fn subrange(&self, a: f64, b: f64) -> Progress<'a> {
        let Some(callback) = self.callback else {
            return Progress::silent();
        };
        let min = self.min * (1.0 - a) + self.max * a;
        let max = self.min * (1.0 - b) + self.max * b;
        if max - min < self.epsilon {
            return Progress { b, ..Progress::silent() };
        }
        Progress {
            callback: Some(callback),
            min,
            max,
            epsilon: self.epsilon,
            d_prev: self.d_prev,
            b,
        }
    }

    /// Close a sub-range opened with [`Progress::subrange`].
    pub fn end_subrange(&mut self, sub: Progress<'a>) {
        if self.callback.is_none() {
            return;
        }
        if sub.callback.is_none() {
            self.update(sub.b);
        } else {
            self.d_prev = sub.d_prev;
        }
    }
}
