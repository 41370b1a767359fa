use crate::Error;

/// Owned row-major image with `stride == width`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = grid_len(width, height, data.len())?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    pub fn as_view_mut(&mut self) -> ImageViewMut<'_, T> {
        ImageViewMut {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &mut self.data,
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

/// Borrowed read-only view. `stride` is counted in elements and may exceed
/// `width` for padded buffers.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn from_slice(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        check_strided(width, height, stride, data.len())?;
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }
}

impl<T: Clone> ImageView<'_, T> {
    /// Copies the visible pixels into a contiguous owned image.
    pub fn to_image(&self) -> Image<T> {
        let mut data = Vec::with_capacity(self.width * self.height);
        for row in self.rows() {
            data.extend_from_slice(row);
        }

        Image {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl ImageView<'_, u8> {
    /// Number of foreground (nonzero) cells.
    pub fn count_nonzero(&self) -> usize {
        self.rows()
            .map(|row| row.iter().filter(|&&v| v != 0).count())
            .sum()
    }
}

/// Borrowed mutable view with the same layout rules as [`ImageView`].
#[derive(Debug)]
pub struct ImageViewMut<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a mut [T],
}

impl<'a, T> ImageViewMut<'a, T> {
    pub fn from_slice_mut(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a mut [T],
    ) -> Result<Self, Error> {
        check_strided(width, height, stride, data.len())?;
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.stride + x)
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.stride,
            data: self.data,
        }
    }
}

fn grid_len(width: usize, height: usize, actual: usize) -> Result<usize, Error> {
    width.checked_mul(height).ok_or(Error::SizeMismatch {
        expected: usize::MAX,
        actual,
    })
}

fn check_strided(width: usize, height: usize, stride: usize, len: usize) -> Result<(), Error> {
    if stride < width {
        return Err(Error::InvalidStride);
    }

    let min_len = min_required_len(width, height, stride).ok_or(Error::SizeMismatch {
        expected: usize::MAX,
        actual: len,
    })?;

    if len < min_len {
        return Err(Error::SizeMismatch {
            expected: min_len,
            actual: len,
        });
    }
    Ok(())
}

fn min_required_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }

    let rows_before_last = height.checked_sub(1)?;
    let base = rows_before_last.checked_mul(stride)?;
    base.checked_add(width)
}
