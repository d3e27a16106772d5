/// Discrete exponential low-pass filter over a force time series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceSmoother {
    smoothing_time: f64,
    previous: Option<f64>,
}

impl ForceSmoother {
    pub fn new(smoothing_time: f64) -> Self {
        Self {
            smoothing_time,
            previous: None,
        }
    }

    pub fn smoothing_time(&self) -> f64 {
        self.smoothing_time
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// Blends `current_force` into the running value with weight `1 − exp(−dt/τ)`.
    ///
    /// The first call after construction or [`reset`](Self::reset) returns its input.
    pub fn smooth(&mut self, current_force: f64, time_step: f64) -> f64 {
        let smoothed = match self.previous {
            None => current_force,
            Some(previous) => {
                let decay = (-time_step / self.smoothing_time).exp();
                decay * previous + (1.0 - decay) * current_force
            }
        };
        self.previous = Some(smoothed);
        smoothed
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
