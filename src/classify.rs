//! Seeding of distance grids from a thresholded mask.

use std::ops::Range;

use crate::binary_image::{BinaryMask, GrayscaleImage};
use crate::distance_grid::{DistanceGrid, SeedOffset};


/// Which side of the mask acts as the seed points of a grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Polarity {
    /// Pixels inside the shape are seeds.
    /// The transformed grid holds the distance to the shape.
    Inside,

    /// Pixels outside the shape are seeds.
    /// The transformed grid holds the distance to the background.
    Outside,
}

impl Polarity {
    #[inline]
    pub fn is_seed(self, inside: bool) -> bool {
        match self {
            Polarity::Inside => inside,
            Polarity::Outside => !inside,
        }
    }
}


/// Seed the given rows of a grid: `(0, 0)` where the pixel is on the seeded side,
/// [`SeedOffset::FAR`] everywhere else. Rows beyond the image are skipped.
pub fn seed_rows<I>(grid: &mut DistanceGrid, mask: &BinaryMask<'_, I>, polarity: Polarity, rows: Range<u32>)
    where I: GrayscaleImage + ?Sized
{
    debug_assert_eq!((grid.width(), grid.height()), (mask.width(), mask.height()), "Grid dimension mismatch");

    let end = rows.end.min(mask.height());
    for y in rows.start..end {
        for x in 0..mask.width() {
            let seed = if polarity.is_seed(mask.is_inside(x, y)) { SeedOffset::ZERO } else { SeedOffset::FAR };
            grid.set(x as i32, y as i32, seed);
        }
    }
}

/// Seed the given rows of both grids at once, the first with inside seeds
/// and the second with outside seeds.
pub fn classify_rows<I>(
    inside: &mut DistanceGrid, outside: &mut DistanceGrid,
    image: &I, threshold: f32, rows: Range<u32>
)
    where I: GrayscaleImage + ?Sized
{
    let mask = BinaryMask::with_threshold(image, threshold);
    seed_rows(inside, &mask, Polarity::Inside, rows.clone());
    seed_rows(outside, &mask, Polarity::Outside, rows);
}

/// Allocate and fully seed the inside-seeded and the outside-seeded grid of an image.
pub fn classify<I>(image: &I, threshold: f32) -> (DistanceGrid, DistanceGrid)
    where I: GrayscaleImage + ?Sized
{
    let mut inside = DistanceGrid::new(image.width(), image.height());
    let mut outside = DistanceGrid::new(image.width(), image.height());
    classify_rows(&mut inside, &mut outside, image, threshold, 0..image.height());
    (inside, outside)
}
