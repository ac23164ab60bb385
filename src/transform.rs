//! The eight-point sequential euclidean distance transform (`8SSEDT`).
//!
//! Every cell of a seeded [`DistanceGrid`] converges to the offset of its nearest seed
//! by comparing itself against already visited neighbours in two sweeps:
//! one top-to-bottom and one bottom-to-top. Each row of a sweep
//! is scanned in both directions. There is no iteration to a fixed point,
//! so the cost is always linear in the number of cells.

use crate::distance_grid::{DistanceGrid, SeedOffset};


/// Neighbours visited before a cell when scanning a row
/// left-to-right in the top-to-bottom sweep.
const FORWARD_NEIGHBOURS: [(i32, i32); 4] = [(-1, 0), (0, -1), (-1, -1), (1, -1)];

/// Neighbours visited before a cell when scanning a row
/// right-to-left in the bottom-to-top sweep.
const BACKWARD_NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 1), (1, 1)];


/// Which of the two sweeps a row belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pass {
    /// Rows from top to bottom.
    Forward,

    /// Rows from bottom to top.
    Backward,
}


/// Remembers how far the transform of a grid has progressed,
/// so that it can be continued at any row boundary.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SweepCursor {
    rows_swept: u32,
}

impl SweepCursor {
    pub fn new() -> Self {
        SweepCursor::default()
    }

    /// The number of rows completed so far, counting both sweeps.
    /// A grid is fully transformed after `2 * height` rows.
    #[inline]
    pub fn rows_swept(&self) -> u32 {
        self.rows_swept
    }

    /// The sweep that the next row belongs to, or `None` when the grid is done.
    pub fn pass(&self, height: u32) -> Option<Pass> {
        if self.rows_swept < height { Some(Pass::Forward) }
        else if self.rows_swept < total_rows(height) { Some(Pass::Backward) }
        else { None }
    }

    #[inline]
    pub fn is_complete(&self, height: u32) -> bool {
        self.pass(height).is_none()
    }

    /// Sweep at most `max_rows` further rows of the grid.
    /// Returns the number of rows actually swept, which is zero once the grid is done.
    pub fn advance(&mut self, grid: &mut DistanceGrid, max_rows: u32) -> u32 {
        let height = grid.height();
        let mut swept = 0;

        while swept < max_rows {
            match self.pass(height) {
                Some(Pass::Forward) => sweep_row_forward(grid, self.rows_swept as i32),
                Some(Pass::Backward) => sweep_row_backward(grid, (total_rows(height) - 1 - self.rows_swept) as i32),
                None => break,
            }

            self.rows_swept += 1;
            swept += 1;
        }

        swept
    }
}

#[inline]
fn total_rows(height: u32) -> u32 {
    height.saturating_mul(2)
}


/// Converge every cell of the grid to the offset of its nearest seed.
pub fn transform(grid: &mut DistanceGrid) {
    SweepCursor::new().advance(grid, u32::MAX);
}


fn sweep_row_forward(grid: &mut DistanceGrid, y: i32) {
    let width = grid.width() as i32;

    for x in 0..width {
        let mut offset = grid.get(x, y);
        for &(dx, dy) in &FORWARD_NEIGHBOURS {
            offset = compare(grid, offset, x, y, dx, dy);
        }

        grid.set(x, y, offset);
    }

    // catch seeds to the right that the left-to-right scan could not see yet
    for x in (0..width).rev() {
        let offset = compare(grid, grid.get(x, y), x, y, 1, 0);
        grid.set(x, y, offset);
    }
}

fn sweep_row_backward(grid: &mut DistanceGrid, y: i32) {
    let width = grid.width() as i32;

    for x in (0..width).rev() {
        let mut offset = grid.get(x, y);
        for &(dx, dy) in &BACKWARD_NEIGHBOURS {
            offset = compare(grid, offset, x, y, dx, dy);
        }

        grid.set(x, y, offset);
    }

    for x in 0..width {
        let offset = compare(grid, grid.get(x, y), x, y, -1, 0);
        grid.set(x, y, offset);
    }
}

/// Keep the shorter of the current offset and the neighbour's offset
/// translated by the step to that neighbour. Ties keep the current offset.
#[inline(always)]
fn compare(grid: &DistanceGrid, current: SeedOffset, x: i32, y: i32, dx: i32, dy: i32) -> SeedOffset {
    let candidate = grid.get(x + dx, y + dy).translated(dx, dy);

    if candidate.squared_length() < current.squared_length() { candidate }
    else { current }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn single_seed(width: u32, height: u32, seed_x: i32, seed_y: i32) -> DistanceGrid {
        let mut grid = DistanceGrid::new(width, height);
        grid.set(seed_x, seed_y, SeedOffset::ZERO);
        grid
    }

    fn euclidean(x: i32, y: i32, seed_x: i32, seed_y: i32) -> f32 {
        (((x - seed_x).pow(2) + (y - seed_y).pow(2)) as f32).sqrt()
    }

    #[test]
    fn corner_seed_reaches_three_four_five() {
        let mut grid = single_seed(8, 8, 0, 0);
        transform(&mut grid);

        assert_eq!(grid.get(3, 4), SeedOffset::new(-3, -4));
        assert_eq!(grid.distance(3, 4), 5.0);
        assert_eq!(grid.distance(7, 0), 7.0);
        assert_eq!(grid.distance(0, 0), 0.0);
    }

    #[test]
    fn single_seed_distances_are_exact() {
        for &(width, height, seed_x, seed_y) in &[(9, 9, 4, 4), (7, 5, 6, 2), (16, 16, 3, 11)] {
            let mut grid = single_seed(width, height, seed_x, seed_y);
            transform(&mut grid);

            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    let expected = euclidean(x, y, seed_x, seed_y);
                    assert!(
                        (grid.distance(x, y) - expected).abs() < 1e-4,
                        "seed ({}, {}): distance at ({}, {}) was {}, expected {}",
                        seed_x, seed_y, x, y, grid.distance(x, y), expected
                    );
                }
            }
        }
    }

    #[test]
    fn offsets_point_at_the_nearer_seed() {
        let mut grid = DistanceGrid::new(10, 1);
        grid.set(0, 0, SeedOffset::ZERO);
        grid.set(9, 0, SeedOffset::ZERO);
        transform(&mut grid);

        assert_eq!(grid.get(2, 0), SeedOffset::new(-2, 0));
        assert_eq!(grid.get(7, 0), SeedOffset::new(2, 0));
    }

    #[test]
    fn grid_without_seeds_stays_far() {
        let mut grid = DistanceGrid::new(6, 6);
        transform(&mut grid);

        assert!(!grid.has_seed());
        assert!(grid.cells().iter().all(|cell| cell.length() > 1_000_000.0));
    }

    #[test]
    fn chunked_sweeps_match_a_single_call() {
        let mut whole = DistanceGrid::new(13, 11);
        whole.set(2, 9, SeedOffset::ZERO);
        whole.set(11, 1, SeedOffset::ZERO);
        whole.set(6, 5, SeedOffset::ZERO);

        let mut chunked = whole.clone();
        transform(&mut whole);

        let mut cursor = SweepCursor::new();
        let mut chunks = Vec::new();
        while !cursor.is_complete(chunked.height()) {
            chunks.push(cursor.advance(&mut chunked, 3));
        }

        assert_eq!(chunks, vec![3, 3, 3, 3, 3, 3, 3, 1]);
        assert_eq!(cursor.rows_swept(), 22);
        assert_eq!(cursor.advance(&mut chunked, 3), 0);
        assert_eq!(chunked, whole);
    }

    #[test]
    fn cursor_reports_its_pass() {
        let mut grid = DistanceGrid::new(2, 2);
        let mut cursor = SweepCursor::new();

        assert_eq!(cursor.pass(2), Some(Pass::Forward));
        cursor.advance(&mut grid, 2);
        assert_eq!(cursor.pass(2), Some(Pass::Backward));
        cursor.advance(&mut grid, 2);
        assert_eq!(cursor.pass(2), None);
    }
}
