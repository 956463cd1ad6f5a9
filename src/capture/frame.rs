/// Raw interleaved RGB24 video frame as read back from the camera surface.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Interleaved RGB bytes, `width * height * 3` long.
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Crop to the largest centered square.
    pub fn crop_center_square(&self) -> RawFrame {
        let size = self.width.min(self.height);
        if size == self.width && size == self.height {
            return self.clone();
        }

        let sx = (self.width - size) / 2;
        let sy = (self.height - size) / 2;

        let mut pixels = Vec::with_capacity((size * size * 3) as usize);
        for row in sy..sy + size {
            let start = ((row * self.width + sx) * 3) as usize;
            let end = start + (size * 3) as usize;
            pixels.extend_from_slice(&self.pixels[start..end]);
        }

        RawFrame {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Scale to `target x target` by nearest-neighbour sampling, in both
    /// directions: a source smaller than the target is scaled up.
    pub fn scale_to(&self, target: u32) -> RawFrame {
        if self.width == target && self.height == target {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity((target * target * 3) as usize);
        for y in 0..target {
            let src_y = y as u64 * self.height as u64 / target as u64;
            for x in 0..target {
                let src_x = x as u64 * self.width as u64 / target as u64;
                let idx = ((src_y * self.width as u64 + src_x) * 3) as usize;
                pixels.extend_from_slice(&self.pixels[idx..idx + 3]);
            }
        }

        RawFrame {
            width: target,
            height: target,
            pixels,
        }
    }
}

/// Convert floating-point samples to 16-bit little-endian PCM bytes.
///
/// Samples are clamped so out-of-range input cannot wrap.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        pcm.extend_from_slice(&value.to_le_bytes());
    }
    pcm
}
