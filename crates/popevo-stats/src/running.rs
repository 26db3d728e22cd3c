use std::collections::VecDeque;

/// Moving average over the most recent `window` values.
///
/// Used to smooth the per-generation mean of the top performers, which is
/// noisy when the environment is stochastic.
///
/// # Examples
///
/// ```
/// use popevo_stats::running::RunningMean;
///
/// let mut running = RunningMean::new(3);
/// assert_eq!(running.mean(), None);
/// for v in [1.0, 2.0, 3.0, 4.0] {
///     running.push(v);
/// }
/// assert_eq!(running.mean(), Some(3.0));
/// assert_eq!(running.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct RunningMean {
    window: usize,
    values: VecDeque<f32>,
    sum: f32,
}

impl RunningMean {
    /// Creates an empty running mean over the last `window` values.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    #[must_use]
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "window must be positive");
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    /// Adds a value, evicting the oldest one once the window is full.
    pub fn push(&mut self, value: f32) {
        if self.values.len() == self.window
            && let Some(old) = self.values.pop_front()
        {
            self.sum -= old;
        }
        self.values.push_back(value);
        self.sum += value;
    }

    /// Returns the mean of the values currently in the window.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.sum / self.values.len() as f32)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }
}
