use std::ops::Range;

/// Picture or preview buffers could not be provided.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("a {width}x{height} picture with {channels} channels overflows addressable memory")]
    Overflow {
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("out of memory while allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("batch needs {requested} bytes but the memory budget is {budget} bytes")]
    BudgetExceeded { requested: usize, budget: usize },
}

/// Float count of a `width x height` buffer with `channels` interleaved channels.
pub fn buffer_len(width: usize, height: usize, channels: usize) -> Result<usize, AllocationError> {
    width
        .checked_mul(height)
        .and_then(|px| px.checked_mul(channels))
        .filter(|len| len.checked_mul(size_of::<f32>()).is_some())
        .ok_or(AllocationError::Overflow {
            width,
            height,
            channels,
        })
}

/// Row-major float image with channels interleaved per pixel in declared order.
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    width: usize,
    height: usize,
    channel_names: Vec<String>,
    data: Vec<f32>,
}

impl Picture {
    /// Zero-filled picture. Allocation failure is reported instead of aborting.
    pub fn try_new(
        width: usize,
        height: usize,
        channel_names: Vec<String>,
    ) -> Result<Self, AllocationError> {
        let len = buffer_len(width, height, channel_names.len())?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| AllocationError::OutOfMemory {
                bytes: len * size_of::<f32>(),
            })?;
        data.resize(len, 0.0);
        Ok(Self {
            width,
            height,
            channel_names,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len() * size_of::<f32>()
    }

    /// Channel values of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.channel_count();
        let start = (y * self.width + x) * ch;
        self.data.get(start..start + ch)
    }

    pub fn row(&self, y: usize) -> Option<&[f32]> {
        if y >= self.height {
            return None;
        }
        let len = self.row_len();
        self.data.get(y * len..(y + 1) * len)
    }

    /// Whether this buffer can be reused for a picture of the given shape.
    pub fn fits(&self, width: usize, height: usize, channel_names: &[String]) -> bool {
        self.width == width && self.height == height && self.channel_names == channel_names
    }

    pub(crate) fn reset(&mut self) {
        self.data.fill(0.0);
    }

    pub fn rows_mut(&mut self) -> RowsMut<'_> {
        let row_len = self.row_len();
        RowsMut {
            data: &mut self.data,
            first_row: 0,
            rows: self.height,
            row_len,
        }
    }

    /// Split the buffer into disjoint row views. `ranges` must be sorted, contiguous and
    /// start at row 0, as produced by [`partition_rows`](crate::render::slices::partition_rows).
    pub fn split_rows(&mut self, ranges: &[Range<usize>]) -> Vec<RowsMut<'_>> {
        let mut out = Vec::with_capacity(ranges.len());
        let mut rest = self.rows_mut();
        for r in ranges {
            let (head, tail) = rest.split_at_row(r.end);
            out.push(head);
            rest = tail;
        }
        out
    }

    /// 8-bit RGBA conversion of the first four channels, clamped to `0..=1`. One channel is
    /// read as gray, two as gray and alpha, three as opaque RGB.
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let ch = self.channel_count();
        let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut img = image::RgbaImage::new(self.width as u32, self.height as u32);
        for (i, px) in img.pixels_mut().enumerate() {
            let src = &self.data[i * ch..i * ch + ch];
            let rgba = match *src {
                [] => [0.0, 0.0, 0.0, 1.0],
                [v] => [v, v, v, 1.0],
                [v, a] => [v, v, v, a],
                [r, g, b] => [r, g, b, 1.0],
                [r, g, b, a, ..] => [r, g, b, a],
            };
            px.0 = rgba.map(to8);
        }
        img
    }

    fn row_len(&self) -> usize {
        self.width * self.channel_count()
    }
}

/// Mutable view of a contiguous band of picture rows.
#[derive(Debug)]
pub struct RowsMut<'a> {
    data: &'a mut [f32],
    first_row: usize,
    rows: usize,
    row_len: usize,
}

impl<'a> RowsMut<'a> {
    /// View `data` as `rows` rows of `row_len` floats starting at absolute row `first_row`.
    pub fn new(data: &'a mut [f32], first_row: usize, rows: usize, row_len: usize) -> Option<Self> {
        (rows.checked_mul(row_len) == Some(data.len())).then_some(Self {
            data,
            first_row,
            rows,
            row_len,
        })
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Absolute rows covered by this view.
    pub fn row_range(&self) -> Range<usize> {
        self.first_row..self.first_row + self.rows
    }

    /// Row `y` in absolute picture coordinates.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [f32]> {
        if !self.row_range().contains(&y) {
            return None;
        }
        let start = (y - self.first_row) * self.row_len;
        self.data.get_mut(start..start + self.row_len)
    }

    /// Split before absolute row `y`; `y` is clamped to the view.
    pub fn split_at_row(self, y: usize) -> (RowsMut<'a>, RowsMut<'a>) {
        let at = y.clamp(self.first_row, self.first_row + self.rows) - self.first_row;
        let (head, tail) = self.data.split_at_mut(at * self.row_len);
        (
            RowsMut {
                data: head,
                first_row: self.first_row,
                rows: at,
                row_len: self.row_len,
            },
            RowsMut {
                data: tail,
                first_row: self.first_row + at,
                rows: self.rows - at,
                row_len: self.row_len,
            },
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/picture.rs"]
mod tests;
