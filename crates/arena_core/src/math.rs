//! Positions and world bounds.
//!
//! The arena uses plain `f64` coordinates. Every position that enters the
//! registry is validated against [`Bounds`], and every move is clamped back
//! into them, so a stored position is always inside the world.

use serde::{Deserialize, Serialize};

use crate::kind::Direction;

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Whether `other` lies within `reach` of this point (inclusive).
    #[must_use]
    pub fn within(self, other: Self, reach: f64) -> bool {
        self.distance_squared(other) <= reach * reach
    }

    /// Offset by `step` along `direction`, without clamping.
    #[must_use]
    pub fn offset(self, direction: Direction, step: f64) -> Self {
        match direction {
            Direction::Up => Self::new(self.x, self.y + step),
            Direction::Right => Self::new(self.x + step, self.y),
            Direction::Down => Self::new(self.x, self.y - step),
            Direction::Left => Self::new(self.x - step, self.y),
        }
    }
}

/// Rectangular world bounds, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(0.0, 1000.0, 0.0, 1000.0)
    }
}

impl Bounds {
    /// Create bounds from explicit limits.
    #[must_use]
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Whether the point lies inside the bounds. NaN coordinates never do.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Clamp a position into the bounds.
    #[must_use]
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.clamp(self.min_x, self.max_x),
            position.y.clamp(self.min_y, self.max_y),
        )
    }

    /// Width of the world.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the world.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point of the world.
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// Whether the bounds describe a non-empty, finite rectangle.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }
}
