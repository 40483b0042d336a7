//! Integer geometry for patch addressing.

/// Integer pixel position; `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the point shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
///
/// Coordinates are signed so a requested rectangle may start outside an
/// image before it is clamped; a rectangle with zero width or height covers
/// no pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of side `2 * half + 1` centered on `center`.
    pub const fn centered(center: Point, half: i32) -> Self {
        Self {
            x: center.x - half,
            y: center.y - half,
            width: 2 * half + 1,
            height: 2 * half + 1,
        }
    }

    /// Number of covered pixels; zero for degenerate rectangles.
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Returns true if the rectangle lies inside a `width x height` grid.
    pub fn is_inside(&self, width: usize, height: usize) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width >= 0
            && self.height >= 0
            && self.right() as i64 <= width as i64
            && self.bottom() as i64 <= height as i64
    }

    /// Shrinks the rectangle against the borders of a `width x height` grid.
    ///
    /// Each side is clipped independently. A rectangle that misses the grid
    /// collapses to zero area at the nearest valid corner.
    pub fn clamped(&self, width: usize, height: usize) -> Self {
        let (x, w) = clamp_span(self.x, self.width, width as i32);
        let (y, h) = clamp_span(self.y, self.height, height as i32);
        Self::new(x, y, w, h)
    }
}

fn clamp_span(start: i32, len: i32, extent: i32) -> (i32, i32) {
    let clamped = start.clamp(0, extent - 1);
    let len = len - (clamped - start).abs();
    (clamped, len.clamp(0, extent - clamped))
}
