use crate::types::Point;

/// Fraction of the remaining distance covered per frame.
pub const POINTER_SMOOTHING: f32 = 0.1;

/// Eases the drawn pointer toward the last observed pointer position.
///
/// Each step applies `current += (target - current) * factor`; this is a
/// per-frame exponential ease, not time-based interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSmoother {
    current: Point,
    target: Point,
    factor: f32,
}

impl PointerSmoother {
    pub fn new(factor: f32) -> Self {
        Self {
            current: Point::default(),
            target: Point::default(),
            factor: factor.clamp(0.0, 1.0),
        }
    }

    /// Places both positions at `point` with no pending motion.
    pub fn reset(&mut self, point: Point) {
        self.current = point;
        self.target = point;
    }

    pub fn set_target(&mut self, point: Point) {
        self.target = point;
    }

    pub fn step(&mut self) -> Point {
        self.current.x += (self.target.x - self.current.x) * self.factor;
        self.current.y += (self.target.y - self.current.y) * self.factor;
        self.current
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn target(&self) -> Point {
        self.target
    }
}

impl Default for PointerSmoother {
    fn default() -> Self {
        Self::new(POINTER_SMOOTHING)
    }
}
