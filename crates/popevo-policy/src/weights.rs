//! Flat parameter-vector operations used to initialise and mutate policies.
//!
//! # Operations
//!
//! - **Initialization**: [`random`] generates uniformly distributed parameters
//! - **Mutation**: [`mutate`] applies clipped Gaussian perturbations
//! - **Constraint**: [`clip`] forces every parameter into a [`ParamRange`]
//!
//! Every operation keeps parameters inside the policy's [`ParamRange`]. This
//! is the min-max weight constraint: no mutation can push a weight outside it.

use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Closed interval every policy parameter must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    /// Creates the range `[-limit, limit]`.
    ///
    /// ```
    /// use popevo_policy::weights::ParamRange;
    ///
    /// let range = ParamRange::symmetric(2.0);
    /// assert_eq!(range.clamp(5.0), 2.0);
    /// assert_eq!(range.clamp(-5.0), -2.0);
    /// assert!(range.contains(0.5));
    /// ```
    #[must_use]
    pub fn symmetric(limit: f32) -> Self {
        let limit = limit.abs();
        Self {
            min: -limit,
            max: limit,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Creates a parameter vector by applying a function to each index.
///
/// # Examples
///
/// ```
/// use popevo_policy::weights;
///
/// let params = weights::from_fn(|i| 1.0 / (i as f32 + 1.0), 3);
/// assert_eq!(params, vec![1.0, 0.5, 1.0 / 3.0]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Generates `len` parameters sampled uniformly from `range`.
pub fn random<R>(rng: &mut R, range: ParamRange, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(range.min..=range.max), len)
}

/// Applies Gaussian mutation to a parameter vector in-place.
///
/// For each parameter, with probability `rate`:
///
/// 1. Sample a perturbation from `N(0, sigma)`
/// 2. Add it to the parameter
/// 3. Clamp the result to `range`
///
/// Returns the number of parameters that were perturbed. `rate = 0` leaves
/// the vector untouched.
///
/// # Panics
///
/// Panics if `sigma` is negative or not finite, or if `rate` is outside `[0, 1]`.
pub fn mutate<R>(params: &mut [f32], sigma: f32, range: ParamRange, rate: f32, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    if rate <= 0.0 {
        return 0;
    }
    let normal = Normal::new(0.0, sigma).expect("sigma must be finite and non-negative");
    let mut mutated = 0;
    for p in params {
        if rng.random_bool(rate.into()) {
            *p = range.clamp(*p + rng.sample(normal));
            mutated += 1;
        }
    }
    mutated
}

/// Clamps every parameter into `range`.
pub fn clip(params: &mut [f32], range: ParamRange) {
    for p in params {
        *p = range.clamp(*p);
    }
}
