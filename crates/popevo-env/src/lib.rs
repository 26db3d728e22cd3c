//! Environment abstraction and episode harness.
//!
//! Environments implement the closed [`Environment`] capability trait: a
//! fixed set of required hooks (start state, observation, transition) and
//! two optional ones (rendering and a built-in action choice). The
//! [`Harness`] binds an environment to validated [`EpisodeParams`] and drives
//! bounded episodes, turning hook failures and malformed hook output into
//! [`HarnessError`]s.
//!
//! # Architecture
//!
//! ```text
//! Harness (episode bookkeeping, validation)
//!     ↓ calls
//! Environment hooks (start_state, observe, take_action, display, default_action)
//!     ↓ produce
//! EpisodeSummary / Episode (total reward, steps, end reason, optional trace)
//! ```
//!
//! # Example
//!
//! ```
//! use popevo_env::{EpisodeParams, Harness, gridworld::GridWorld};
//! use rand::SeedableRng as _;
//!
//! let world = GridWorld::new(4, 4).unwrap();
//! let harness = Harness::new(world, EpisodeParams::default()).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let summary = harness.run_episode_with_default_actions(&mut rng).unwrap();
//! assert!(summary.end.is_terminated());
//! ```

pub use self::{environment::*, error::*, harness::*};

pub mod environment;
mod error;
pub mod gridworld;
pub mod harness;
