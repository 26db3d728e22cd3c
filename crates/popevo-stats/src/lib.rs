//! Statistical summaries used when reporting on evolving populations.
//!
//! This crate has no knowledge of agents or environments. It only turns
//! sequences of `f32` values into summaries:
//!
//! - **Descriptive statistics**: min, max, mean, median, variance, standard deviation
//! - **Running means**: windowed moving averages over a stream of values
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`running`]: Windowed running mean for tracking progress across generations
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use popevo_stats::descriptive::DescriptiveStats;
//!
//! let rewards = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(rewards).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Tracking a running mean
//!
//! ```
//! use popevo_stats::running::RunningMean;
//!
//! let mut running = RunningMean::new(2);
//! running.push(1.0);
//! running.push(3.0);
//! running.push(5.0);
//! assert_eq!(running.mean(), Some(4.0));
//! ```

pub mod descriptive;
pub mod running;
