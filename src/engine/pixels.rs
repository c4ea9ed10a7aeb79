use image::{Rgba, RgbaImage};

use crate::foundation::error::{SdBatchError, SdBatchResult};

/// Packed RGB pixels as exchanged with the engine.
///
/// Row-major, three bytes per pixel in R,G,B order, no padding, no alpha. The length is always
/// `width * height * 3`; [`RgbBuffer::new`] rejects anything else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> SdBatchResult<Self> {
        let expected = packed_len(width, height);
        if data.len() != expected {
            return Err(SdBatchError::engine(format!(
                "RGB data length {} does not match {width} x {height} x 3 = {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

pub fn packed_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Convert an engine buffer into an opaque RGBA image. The buffer is consumed.
pub fn decode_rgb(buf: RgbBuffer) -> SdBatchResult<RgbaImage> {
    let (width, height) = (buf.width, buf.height);
    let mut rgba = Vec::with_capacity(buf.data.len() / 3 * 4);
    for px in buf.data.chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    drop(buf);

    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| SdBatchError::image(format!("invalid {width}x{height} RGBA buffer")))
}

/// Pack an image for the engine, dropping alpha.
pub fn encode_rgb(img: &RgbaImage) -> RgbBuffer {
    let mut data = Vec::with_capacity(packed_len(img.width(), img.height()));
    for Rgba([r, g, b, _]) in img.pixels() {
        data.extend_from_slice(&[*r, *g, *b]);
    }
    RgbBuffer {
        width: img.width(),
        height: img.height(),
        data,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/pixels.rs"]
mod tests;
