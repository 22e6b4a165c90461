//! Decoding of the bit-packed movement paths sent by walk requests.
//!
//! Directions are packed two per byte, high nibble first. The first
//! direction of every path is sent rotated one step clockwise by the client,
//! so the decoder turns it back counter-clockwise before use; every following
//! direction is taken as-is.

use common::{Direction, Point};

/// Largest number of steps a walk request can carry.
pub const MAX_WALK_STEPS: usize = 15;

/// A single move from one cell to a neighbouring one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkStep {
    pub direction: Direction,
    pub from: Point,
    pub to: Point,
}

/// Decoded steps of a walk request, in the order they are walked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkPath {
    source: Point,
    steps: Vec<WalkStep>,
}

impl WalkPath {
    #[must_use]
    pub fn source(&self) -> Point {
        self.source
    }

    #[must_use]
    pub fn steps(&self) -> &[WalkStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cell reached after the last step, or the source for an empty path.
    #[must_use]
    pub fn target(&self) -> Point {
        self.steps.last().map_or(self.source, |step| step.to)
    }

    /// Steps in last-in-first-out order: popping from the returned vector
    /// yields them in walking order.
    #[must_use]
    pub fn into_replay_stack(self) -> Vec<WalkStep> {
        let mut steps = self.steps;
        steps.reverse();
        steps
    }
}

/// Returns the `index`-th nibble of `packed`, high nibble first.
fn nibble_at(packed: &[u8], index: usize) -> Option<u8> {
    let byte = *packed.get(index / 2)?;
    Some(if index % 2 == 0 { byte >> 4 } else { byte & 0x0F })
}

/// Decodes up to `step_count` directions from `packed`, walking from `source`.
///
/// Decoding stops early at an undefined direction, at the end of `packed`, or
/// at a step that would leave the map; the steps decoded so far are kept.
#[must_use]
pub fn decode_walk_path(source: Point, packed: &[u8], step_count: usize) -> WalkPath {
    let step_count = step_count.min(MAX_WALK_STEPS);
    let mut steps = Vec::with_capacity(step_count);
    let mut current = source;

    for index in 0..step_count {
        let Some(raw) = nibble_at(packed, index) else {
            break;
        };
        let mut direction = Direction::from_nibble(raw);
        if index == 0 {
            direction = direction.rotate_left();
        }
        if !direction.is_defined() {
            break;
        }
        let Some(next) = current.step(direction) else {
            break;
        };
        steps.push(WalkStep {
            direction,
            from: current,
            to: next,
        });
        current = next;
    }

    WalkPath { source, steps }
}

/// Packs directions the way the client does, including the rotation of the
/// first direction. An odd count is padded with an undefined nibble.
#[must_use]
pub fn encode_walk_directions(directions: &[Direction]) -> Vec<u8> {
    let nibbles = directions.iter().enumerate().map(|(index, direction)| {
        if index == 0 {
            direction.rotate_right().to_nibble()
        } else {
            direction.to_nibble()
        }
    });

    let mut packed = Vec::with_capacity(directions.len().div_ceil(2));
    let mut pending: Option<u8> = None;
    for nibble in nibbles {
        match pending.take() {
            Some(high) => packed.push((high << 4) | nibble),
            None => pending = Some(nibble),
        }
    }
    if let Some(high) = pending {
        packed.push((high << 4) | Direction::Undefined.to_nibble());
    }
    packed
}
