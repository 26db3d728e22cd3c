//! Goal-seeking grid world used by the CLI demo.
//!
//! An agent and a goal are placed on distinct random cells of a
//! `width x height` grid. Each step the agent moves one cell. Reaching the
//! goal ends the episode with a bonus, walking off the grid ends it with a
//! penalty, and every other move costs a little.
//!
//! The observation does not depend on the grid size, so policies trained on
//! a small grid can be rebound to a larger one.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Environment, HookError, Termination, Transition};

pub const GOAL_REWARD: f32 = 10.0;
pub const WALL_PENALTY: f32 = -10.0;
pub const STEP_COST: f32 = -0.1;

const OBSERVATION_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    pub agent: Position,
    pub goal: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridWorld {
    width: usize,
    height: usize,
}

impl GridWorld {
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        match width.checked_mul(height) {
            Some(cells) if cells >= 2 => {}
            Some(_) => return Err(ConfigError::GridTooSmall { width, height }),
            None => return Err(ConfigError::GridTooLarge { width, height }),
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    fn step(&self, pos: Position, mv: Move) -> Option<Position> {
        let Position { x, y } = pos;
        let (x, y) = match mv {
            Move::Up => (x, y.checked_sub(1)?),
            Move::Down => (x, y + 1),
            Move::Left => (x.checked_sub(1)?, y),
            Move::Right => (x + 1, y),
        };
        (x < self.width && y < self.height).then_some(Position { x, y })
    }

    fn cell(&self, index: usize) -> Position {
        Position {
            x: index % self.width,
            y: index / self.width,
        }
    }
}

impl Environment for GridWorld {
    type State = GridState;

    fn observation_len(&self) -> usize {
        OBSERVATION_LEN
    }

    fn action_count(&self) -> usize {
        Move::ALL.len()
    }

    fn start_state<R>(&self, rng: &mut R) -> Result<GridState, HookError>
    where
        R: Rng + ?Sized,
    {
        let cells = self.width * self.height;
        let agent = rng.random_range(0..cells);
        let mut goal = rng.random_range(0..cells - 1);
        if goal >= agent {
            goal += 1;
        }
        Ok(GridState {
            agent: self.cell(agent),
            goal: self.cell(goal),
        })
    }

    #[expect(clippy::cast_precision_loss)]
    fn observe(&self, state: &GridState) -> Result<Vec<f32>, HookError> {
        let GridState { agent, goal } = *state;
        let dx = (goal.x as f32 - agent.x as f32) / self.width as f32;
        let dy = (goal.y as f32 - agent.y as f32) / self.height as f32;
        let blocked = |mv| f32::from(u8::from(self.step(agent, mv).is_none()));
        Ok(vec![
            dx,
            dy,
            blocked(Move::Up),
            blocked(Move::Down),
            blocked(Move::Left),
            blocked(Move::Right),
        ])
    }

    fn take_action<R>(
        &self,
        state: GridState,
        action: usize,
        _rng: &mut R,
    ) -> Result<Transition<GridState>, HookError>
    where
        R: Rng + ?Sized,
    {
        let mv = Move::from_index(action)
            .ok_or_else(|| HookError::new(format!("unknown move index {action}")))?;
        let Some(agent) = self.step(state.agent, mv) else {
            return Ok(Transition::terminal(state, WALL_PENALTY, Termination::Penalty));
        };
        let next = GridState { agent, ..state };
        if agent == state.goal {
            Ok(Transition::terminal(next, GOAL_REWARD, Termination::GoalReached))
        } else {
            Ok(Transition::running(next, STEP_COST))
        }
    }

    fn display(&self, state: &GridState) -> Option<String> {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position { x, y };
                let c = if pos == state.agent {
                    'A'
                } else if pos == state.goal {
                    'G'
                } else {
                    '.'
                };
                out.push(c);
            }
            if y + 1 < self.height {
                out.push('\n');
            }
        }
        Some(out)
    }

    /// Walks along the axis with the larger remaining distance.
    fn default_action(&self, observation: &[f32]) -> Option<Result<usize, HookError>> {
        let [dx, dy, ..] = *observation else {
            return Some(Err(HookError::new("observation too short")));
        };
        let mv = if dx.abs() >= dy.abs() {
            if dx >= 0.0 { Move::Right } else { Move::Left }
        } else if dy >= 0.0 {
            Move::Down
        } else {
            Move::Up
        };
        Some(Ok(mv.index()))
    }

    fn has_default_action(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{EpisodeParams, Harness};

    fn state(agent: (usize, usize), goal: (usize, usize)) -> GridState {
        GridState {
            agent: Position {
                x: agent.0,
                y: agent.1,
            },
            goal: Position {
                x: goal.0,
                y: goal.1,
            },
        }
    }

    #[test]
    fn test_rejects_single_cell_grid() {
        assert_eq!(
            GridWorld::new(1, 1).unwrap_err(),
            ConfigError::GridTooSmall {
                width: 1,
                height: 1
            }
        );
        assert!(GridWorld::new(2, 1).is_ok());
    }

    #[test]
    fn test_rejects_overflowing_grid() {
        assert_eq!(
            GridWorld::new(usize::MAX, 2).unwrap_err(),
            ConfigError::GridTooLarge {
                width: usize::MAX,
                height: 2
            }
        );
        assert!(GridWorld::new(usize::MAX, 1).is_ok());
    }

    #[test]
    fn test_start_state_places_agent_and_goal_apart() {
        let world = GridWorld::new(2, 1).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let s = world.start_state(&mut rng).unwrap();
            assert_ne!(s.agent, s.goal);
            assert!(s.agent.x < 2 && s.goal.x < 2);
        }
    }

    #[test]
    fn test_observation_is_size_independent() {
        let small = GridWorld::new(4, 4).unwrap();
        let large = GridWorld::new(10, 10).unwrap();
        assert_eq!(small.observation_len(), large.observation_len());

        let obs = small.observe(&state((0, 0), (2, 0))).unwrap();
        assert_eq!(obs, vec![0.5, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_transitions() {
        let world = GridWorld::new(4, 4).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);

        let t = world
            .take_action(state((0, 0), (1, 0)), Move::Right.index(), &mut rng)
            .unwrap();
        assert_eq!(t.reward, GOAL_REWARD);
        assert_eq!(t.termination, Some(Termination::GoalReached));

        let t = world
            .take_action(state((0, 0), (3, 3)), Move::Up.index(), &mut rng)
            .unwrap();
        assert_eq!(t.reward, WALL_PENALTY);
        assert_eq!(t.termination, Some(Termination::Penalty));

        let t = world
            .take_action(state((0, 0), (3, 3)), Move::Down.index(), &mut rng)
            .unwrap();
        assert_eq!(t.reward, STEP_COST);
        assert_eq!(t.state.agent, Position { x: 0, y: 1 });
        assert!(!t.is_done());

        assert!(world.take_action(t.state, 9, &mut rng).is_err());
    }

    #[test]
    fn test_display_renders_grid() {
        let world = GridWorld::new(3, 2).unwrap();
        let frame = world.display(&state((0, 0), (2, 1))).unwrap();
        assert_eq!(frame, "A..\n..G");
    }

    #[test]
    fn test_default_action_always_reaches_goal() {
        let world = GridWorld::new(10, 10).unwrap();
        let harness = Harness::new(
            world,
            EpisodeParams {
                steps_per_episode: 40,
                stat_every: 1,
            },
        )
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let summary = harness.run_episode_with_default_actions(&mut rng).unwrap();
            assert_eq!(
                summary.end,
                crate::EpisodeEnd::Terminated(Termination::GoalReached)
            );
        }
    }
}
