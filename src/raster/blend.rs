use image::Rgba;
use serde::{Deserialize, Serialize};

/// How a painted pixel combines with the raster underneath.
///
/// Pixels are straight (non-premultiplied) RGBA8, the layout of
/// [`image::RgbaImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Paint over the destination
    #[default]
    SourceOver,
    /// Remove destination coverage by the source alpha
    DestinationOut,
}

impl BlendMode {
    pub fn apply(self, dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
        match self {
            Self::SourceOver => source_over(dst, src),
            Self::DestinationOut => destination_out(dst, src[3]),
        }
    }
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match (src[3], dst[3]) {
        (u8::MAX, _) => return src,
        (0, _) => return dst,
        (_, 0) => return src,
        _ => {}
    }

    let sa = unit(src[3]);
    let da = unit(dst[3]);
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for channel in 0..3 {
        let sc = unit(src[channel]);
        let dc = unit(dst[channel]);
        out[channel] = byte((sc * sa + dc * da * (1.0 - sa)) / out_a);
    }
    out[3] = byte(out_a);
    Rgba(out)
}

pub fn destination_out(dst: Rgba<u8>, src_alpha: u8) -> Rgba<u8> {
    if src_alpha == u8::MAX {
        return TRANSPARENT;
    }

    let alpha = byte(unit(dst[3]) * (1.0 - unit(src_alpha)));
    if alpha == 0 {
        TRANSPARENT
    } else {
        Rgba([dst[0], dst[1], dst[2], alpha])
    }
}

fn unit(value: u8) -> f32 {
    value as f32 / 255.0
}

fn byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
