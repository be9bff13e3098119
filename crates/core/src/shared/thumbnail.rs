use ndarray::ArrayView3;

/// A decoded analysis image: contiguous RGB bytes in row-major order.
///
/// Photos are decoded once at the I/O boundary and reduced to a small
/// square; detection only ever sees this representation.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Thumbnail {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Thumbnail data length must match dimensions")
    }

    /// Copies the pixels inside `[x1, x2) × [y1, y2)`, clamped to the image.
    ///
    /// Returns `None` when the clamped rectangle is empty.
    pub fn crop(&self, x1: i64, y1: i64, x2: i64, y2: i64) -> Option<Thumbnail> {
        let x1 = x1.clamp(0, self.width as i64) as usize;
        let y1 = y1.clamp(0, self.height as i64) as usize;
        let x2 = x2.clamp(0, self.width as i64) as usize;
        let y2 = y2.clamp(0, self.height as i64) as usize;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let row_len = self.width as usize * Self::CHANNELS;
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * Self::CHANNELS);
        for row in y1..y2 {
            let start = row * row_len + x1 * Self::CHANNELS;
            let end = row * row_len + x2 * Self::CHANNELS;
            data.extend_from_slice(&self.data[start..end]);
        }
        Some(Thumbnail::new(data, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}
