use crate::{
    engine::{
        backend::GenerationEngine,
        pixels::{RgbBuffer, packed_len},
    },
    foundation::error::{SdBatchError, SdBatchResult},
    params::GenerationParameters,
};

/// Model-free engine that paints a deterministic gradient keyed by seed and prompt.
///
/// Useful for exercising job files, naming and records without loading weights.
#[derive(Debug, Default)]
pub struct PreviewEngine {
    calls: u64,
}

impl PreviewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of generations served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl GenerationEngine for PreviewEngine {
    fn txt2img(&mut self, params: &GenerationParameters) -> SdBatchResult<RgbBuffer> {
        self.calls += 1;
        RgbBuffer::new(params.width(), params.height(), paint(params))
    }

    fn img2img(
        &mut self,
        start: &RgbBuffer,
        params: &GenerationParameters,
    ) -> SdBatchResult<RgbBuffer> {
        if start.as_bytes().len() != params.rgb_len() {
            return Err(SdBatchError::engine(
                "start image does not match requested dimensions",
            ));
        }
        self.calls += 1;

        let t = params.strength().clamp(0.0, 1.0);
        let data = start
            .as_bytes()
            .iter()
            .zip(paint(params))
            .map(|(&s, p)| (f32::from(s) * (1.0 - t) + f32::from(p) * t).round() as u8)
            .collect();
        RgbBuffer::new(params.width(), params.height(), data)
    }
}

fn paint(params: &GenerationParameters) -> Vec<u8> {
    let (w, h) = (params.width(), params.height());
    let key = fnv1a(params.prompt().as_bytes(), params.seed());
    let base = [key as u8, (key >> 8) as u8, (key >> 16) as u8];

    let mut out = Vec::with_capacity(packed_len(w, h));
    for y in 0..h {
        let gy = (u64::from(y) * 255 / u64::from(h.max(1))) as u8;
        for x in 0..w {
            let gx = (u64::from(x) * 255 / u64::from(w.max(1))) as u8;
            out.extend_from_slice(&[
                base[0].wrapping_add(gx),
                base[1].wrapping_add(gy),
                base[2].wrapping_add(gx / 2 + gy / 2),
            ]);
        }
    }
    out
}

fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64 ^ seed;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

#[cfg(test)]
#[path = "../../tests/unit/engine/preview.rs"]
mod tests;
