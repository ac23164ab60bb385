
/// An image that can report the luminance of each pixel, normalized to `0.0..=1.0`.
/// Grayscale images can be created from byte slices or from `image` gray and RGBA buffers.
pub trait GrayscaleImage {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn luminance(&self, x: u32, y: u32) -> f32;
}

/// An image which is described by a slice of bytes with one byte per pixel.
pub struct GrayscaleByteImage<'b> {
    width: u32,
    height: u32,

    /// A row-major image vector with one byte per pixel.
    buffer: &'b [u8],
}

impl<'b> GrayscaleByteImage<'b> {
    pub fn from_slice(width: u32, height: u32, buffer: &'b [u8]) -> Self {
        debug_assert_eq!(buffer.len(), width as usize * height as usize, "Buffer dimension mismatch");
        GrayscaleByteImage { width, height, buffer }
    }
}

impl GrayscaleImage for GrayscaleByteImage<'_> {
    #[inline]
    fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn luminance(&self, x: u32, y: u32) -> f32 {
        byte_luminance(self.buffer[self.width as usize * y as usize + x as usize])
    }
}

impl GrayscaleImage for image::GrayImage {
    #[inline]
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    #[inline]
    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn luminance(&self, x: u32, y: u32) -> f32 {
        byte_luminance(self.get_pixel(x, y).0[0])
    }
}

/// Color pixels are weighted with the NTSC luma coefficients
/// `0.299 r + 0.587 g + 0.114 b`. Alpha is ignored.
impl GrayscaleImage for image::RgbaImage {
    #[inline]
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    #[inline]
    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn luminance(&self, x: u32, y: u32) -> f32 {
        let [red, green, blue, _] = self.get_pixel(x, y).0;
        let luma = 0.299 * f32::from(red) + 0.587 * f32::from(green) + 0.114 * f32::from(blue);
        (luma / 255.0).min(1.0)
    }
}

#[inline]
fn byte_luminance(byte: u8) -> f32 {
    f32::from(byte) / 255.0
}


/// Represents a grayscale image cut into two regions at a threshold,
/// with pixels darker than the threshold being inside-the-shape.
pub struct BinaryMask<'i, I: ?Sized> {
    image: &'i I,

    /// A pixel must be darker than this luminance
    /// in order to be inside the shape.
    threshold: f32,
}

impl<'i, I: GrayscaleImage + ?Sized> BinaryMask<'i, I> {
    /// Create a mask with all pixels darker than the threshold being inside-the-shape.
    pub fn with_threshold(image: &'i I, threshold: f32) -> Self {
        BinaryMask { image, threshold }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn is_inside(&self, x: u32, y: u32) -> bool {
        self.image.luminance(x, y) < self.threshold
    }
}
