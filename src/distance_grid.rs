
/// The largest width or height a grid can have while the sentinel
/// still loses every comparison against a real offset.
pub const MAX_DIMENSION: u32 = u16::MAX as u32;


/// The vector from a cell to the seed it currently knows about, in pixels.
/// A cell that is itself a seed holds `(0, 0)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct SeedOffset {
    pub dx: i32,
    pub dy: i32,
}

impl SeedOffset {
    /// The cell is its own nearest seed.
    pub const ZERO: SeedOffset = SeedOffset { dx: 0, dy: 0 };

    /// No seed found yet. Also returned for every coordinate outside the grid.
    pub const FAR: SeedOffset = SeedOffset { dx: 1 << 20, dy: 1 << 20 };

    #[inline]
    pub const fn new(dx: i32, dy: i32) -> Self {
        SeedOffset { dx, dy }
    }

    /// The squared euclidean length. Computed in 64 bits,
    /// so that the sentinel cannot overflow.
    #[inline]
    pub const fn squared_length(self) -> i64 {
        let dx = self.dx as i64;
        let dy = self.dy as i64;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.squared_length() as f64).sqrt() as f32
    }

    /// The offset as seen from a cell `(dx, dy)` away from the cell holding this offset.
    #[inline(always)]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        SeedOffset { dx: self.dx + dx, dy: self.dy + dy }
    }
}

impl Default for SeedOffset {
    fn default() -> Self {
        SeedOffset::FAR
    }
}


/// A row-major grid of nearest-seed offsets.
///
/// Reading outside of the grid yields [`SeedOffset::FAR`] and writing outside of it does nothing,
/// which lets the transform probe one cell beyond every edge without special cases.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DistanceGrid {
    width: u32,
    height: u32,
    cells: Vec<SeedOffset>,
}

impl DistanceGrid {

    /// Allocate a grid with every cell set to [`SeedOffset::FAR`].
    pub fn new(width: u32, height: u32) -> Self {
        DistanceGrid {
            width, height,
            cells: vec![SeedOffset::FAR; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn cells(&self) -> &[SeedOffset] {
        &self.cells
    }

    /// The offset stored at `(x, y)`, or [`SeedOffset::FAR`] for coordinates outside the grid.
    #[inline(always)]
    pub fn get(&self, x: i32, y: i32) -> SeedOffset {
        match self.flatten_index(x, y) {
            Some(index) => self.cells[index],
            None => SeedOffset::FAR,
        }
    }

    /// Store an offset at `(x, y)`. Ignored for coordinates outside the grid.
    #[inline(always)]
    pub fn set(&mut self, x: i32, y: i32, offset: SeedOffset) {
        if let Some(index) = self.flatten_index(x, y) {
            self.cells[index] = offset;
        }
    }

    /// The distance in pixels from `(x, y)` to its nearest known seed.
    #[inline]
    pub fn distance(&self, x: i32, y: i32) -> f32 {
        self.get(x, y).length()
    }

    /// Whether any cell is a seed. A grid without seeds
    /// only ever holds values derived from the sentinel.
    pub fn has_seed(&self) -> bool {
        self.cells.iter().any(|&cell| cell == SeedOffset::ZERO)
    }

    /// Both axes are checked on their own, so an `x` beyond the row
    /// never wraps around into the previous or next row.
    #[inline]
    fn flatten_index(&self, x: i32, y: i32) -> Option<usize> {
        let inside = x >= 0 && y >= 0
            && (x as i64) < self.width as i64
            && (y as i64) < self.height as i64;

        if inside { Some(self.width as usize * y as usize + x as usize) }
        else { None }
    }
}
