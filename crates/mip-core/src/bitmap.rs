use crate::Error;

/// Number of bytes a `width x height` bitmap with `bytes_per_pixel` occupies.
///
/// Fails with [`Error::InvalidDimensions`] when any factor is zero and with
/// [`Error::SizeMismatch`] when the product overflows `usize`.
pub fn buffer_len(width: usize, height: usize, bytes_per_pixel: usize) -> Result<usize, Error> {
    if width == 0 || height == 0 || bytes_per_pixel == 0 {
        return Err(Error::InvalidDimensions {
            width,
            height,
            bytes_per_pixel,
        });
    }

    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(bytes_per_pixel))
        .ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: 0,
        })
}

/// Owned, tightly packed bitmap.
///
/// Pixels are row-major with no row padding, so the buffer length is always
/// `width * height * bytes_per_pixel`. Channel layout inside a pixel is opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn from_vec(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, Error> {
        let expected = buffer_len(width, height, bytes_per_pixel)?;
        if pixels.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            pixels,
        })
    }

    /// Allocates a zero-filled bitmap, reporting allocation failure instead of
    /// aborting.
    pub fn try_zeroed(width: usize, height: usize, bytes_per_pixel: usize) -> Result<Self, Error> {
        let len = buffer_len(width, height, bytes_per_pixel)?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { requested: len })?;
        pixels.resize(len, 0);

        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            pixels,
        })
    }

    /// Copies a view into a freshly allocated bitmap.
    pub fn try_copy_of(src: &BitmapView<'_>) -> Result<Self, Error> {
        let len = src.pixels().len();
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { requested: len })?;
        pixels.extend_from_slice(src.pixels());

        Ok(Self {
            width: src.width(),
            height: src.height(),
            bytes_per_pixel: src.bytes_per_pixel(),
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn row_bytes(&self) -> usize {
        self.width * self.bytes_per_pixel
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn row(&self, y: usize) -> &[u8] {
        self.as_view().row(y)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        self.as_view().pixel(x, y)
    }

    pub fn as_view(&self) -> BitmapView<'_> {
        BitmapView {
            width: self.width,
            height: self.height,
            bytes_per_pixel: self.bytes_per_pixel,
            pixels: &self.pixels,
        }
    }
}

/// Borrowed bitmap whose dimensions and buffer length are already validated.
#[derive(Debug, Clone, Copy)]
pub struct BitmapView<'a> {
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    pixels: &'a [u8],
}

impl<'a> BitmapView<'a> {
    pub fn from_slice(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        pixels: &'a [u8],
    ) -> Result<Self, Error> {
        let expected = buffer_len(width, height, bytes_per_pixel)?;
        if pixels.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn row_bytes(&self) -> usize {
        self.width * self.bytes_per_pixel
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "row index out of bounds");
        let row_bytes = self.row_bytes();
        let start = y * row_bytes;
        &self.pixels[start..start + row_bytes]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.bytes_per_pixel;
        self.pixels.get(start..start + self.bytes_per_pixel)
    }
}

/// Unvalidated description of a source image as handed over by a caller.
///
/// `pixels` may be absent, which is reported as [`Error::NullBuffer`] when the
/// description is validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapSource<'a> {
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
    pub pixels: Option<&'a [u8]>,
}

impl<'a> BitmapSource<'a> {
    pub fn new(width: usize, height: usize, bytes_per_pixel: usize, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            bytes_per_pixel,
            pixels: Some(pixels),
        }
    }

    /// Checks dimensions first, then buffer presence, then buffer length.
    pub fn validate(&self) -> Result<BitmapView<'a>, Error> {
        if self.width == 0 || self.height == 0 || self.bytes_per_pixel == 0 {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
                bytes_per_pixel: self.bytes_per_pixel,
            });
        }
        let pixels = self.pixels.ok_or(Error::NullBuffer)?;
        BitmapView::from_slice(self.width, self.height, self.bytes_per_pixel, pixels)
    }
}

impl<'a> From<BitmapView<'a>> for BitmapSource<'a> {
    fn from(view: BitmapView<'a>) -> Self {
        Self::new(view.width, view.height, view.bytes_per_pixel, view.pixels)
    }
}

impl<'a> From<&'a Bitmap> for BitmapSource<'a> {
    fn from(bitmap: &'a Bitmap) -> Self {
        bitmap.as_view().into()
    }
}

#[cfg(test)]
mod tests {
    use super::{Bitmap, BitmapSource, BitmapView, buffer_len};
    use crate::Error;

    #[test]
    fn buffer_len_rejects_zero_and_overflow() {
        assert_eq!(buffer_len(3, 2, 4), Ok(24));
        assert!(matches!(
            buffer_len(0, 2, 1),
            Err(Error::InvalidDimensions { width: 0, .. })
        ));
        assert!(matches!(
            buffer_len(2, 2, 0),
            Err(Error::InvalidDimensions {
                bytes_per_pixel: 0,
                ..
            })
        ));
        assert!(matches!(
            buffer_len(usize::MAX, 2, 1),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn from_vec_checks_exact_length() {
        let err = Bitmap::from_vec(2, 2, 3, vec![0u8; 11]).expect_err("short buffer");
        assert_eq!(
            err,
            Error::SizeMismatch {
                expected: 12,
                actual: 11
            }
        );

        let bmp = Bitmap::from_vec(2, 2, 3, (0u8..12).collect()).expect("valid bitmap");
        assert_eq!(bmp.row_bytes(), 6);
        assert_eq!(bmp.row(1), &[6, 7, 8, 9, 10, 11]);
        assert_eq!(bmp.pixel(1, 0), Some(&[3u8, 4, 5][..]));
        assert_eq!(bmp.pixel(2, 0), None);
    }

    #[test]
    fn copy_of_view_is_independent() {
        let data = vec![1u8, 2, 3, 4];
        let view = BitmapView::from_slice(2, 1, 2, &data).expect("valid view");
        let copy = Bitmap::try_copy_of(&view).expect("copy");

        assert_eq!(copy.pixels(), data.as_slice());
        assert_ne!(copy.pixels().as_ptr(), data.as_ptr());
        assert_eq!(copy.bytes_per_pixel(), 2);
    }

    #[test]
    fn zeroed_bitmap_has_exact_len() {
        let bmp = Bitmap::try_zeroed(5, 3, 3).expect("alloc");
        assert_eq!(bmp.pixels().len(), 45);
        assert!(bmp.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn source_validation_order() {
        let missing = BitmapSource {
            width: 0,
            height: 4,
            bytes_per_pixel: 1,
            pixels: None,
        };
        assert!(matches!(
            missing.validate(),
            Err(Error::InvalidDimensions { .. })
        ));

        let null = BitmapSource {
            width: 4,
            height: 4,
            bytes_per_pixel: 1,
            pixels: None,
        };
        assert_eq!(null.validate().map(|_| ()), Err(Error::NullBuffer));

        let data = [7u8; 16];
        let ok = BitmapSource::new(4, 4, 1, &data).validate().expect("valid");
        assert_eq!(ok.width(), 4);
        assert_eq!(ok.pixel(3, 3), Some(&[7u8][..]));
    }
}
