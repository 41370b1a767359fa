/// Pixel adjacency used by growth and neighborhood tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Axis-aligned neighbors only.
    C4,
    /// Axis-aligned and diagonal neighbors.
    #[default]
    C8,
}

const OFFSETS_C4: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
const OFFSETS_C8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Connectivity {
    /// `(dx, dy)` offsets of the neighborhood, excluding the center.
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::C4 => &OFFSETS_C4,
            Self::C8 => &OFFSETS_C8,
        }
    }
}

/// Returns the neighbor of `(x, y)` at `(dx, dy)` if it lies inside a
/// `width x height` grid. Neighbors never wrap across rows.
pub fn neighbor(
    x: usize,
    y: usize,
    dx: isize,
    dy: isize,
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    if nx >= width || ny >= height {
        return None;
    }
    Some((nx, ny))
}
