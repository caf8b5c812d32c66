//! Camera frames as handed to detector backends.
//!
//! A `Frame` is ephemeral: the host loop captures it, backends borrow it for one
//! `detect` call, and it is dropped at the end of the tick. Nothing in this crate
//! keeps frames across ticks.

/// One RGB frame (row-major, 3 bytes per pixel).
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

// Frames are not Clone: a frame is owned by exactly one tick.

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Pixel bytes for inference.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer length matches `width * height * 3`.
    pub fn is_well_formed(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(3))
            .is_some_and(|expected| expected == self.data.len())
    }
}
