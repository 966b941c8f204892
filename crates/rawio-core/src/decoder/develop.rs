//! Developing rawloader sensor data into display RGB.
//!
//! rawloader stops at unpacked sensor values. This module takes a
//! [`RawImage`] the rest of the way:
//!
//! 1. crop to the visible area
//! 2. per-colour black/white levels and white balance
//! 3. bilinear demosaic of CFA data (3x3 neighbourhood per colour)
//! 4. camera to sRGB matrix, when the camera carries one
//! 5. sRGB transfer curve
//!
//! Output is 16 bits per sample, big-endian. Three-channel pixels are
//! written B, G, R; monochrome sensors produce one channel.

use rawloader::{RawImage, RawImageData};

use crate::adapter::{AdapterError, RawSamples, Size};

// sRGB D65
const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266, 1.876_010_8, 0.041_556],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// Rows of the visible area: top, left, width, height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Area {
    top: usize,
    left: usize,
    width: usize,
    height: usize,
}

impl Area {
    fn visible(image: &RawImage) -> Self {
        let [top, right, bottom, left] = image.crops;
        let width = image.width.saturating_sub(left + right);
        let height = image.height.saturating_sub(top + bottom);
        if width == 0 || height == 0 {
            return Self {
                top: 0,
                left: 0,
                width: image.width,
                height: image.height,
            };
        }
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Size of the developed image, i.e. the sensor size after crops.
pub(crate) fn visible_size(image: &RawImage) -> Size {
    let area = Area::visible(image);
    Size::new(area.width as u32, area.height as u32)
}

/// Develop a fully unpacked sensor image.
///
/// # Errors
///
/// - `AdapterError::UnsupportedChannelLayout` - `cpp` is not 1 or 3
/// - `AdapterError::Decode` - the sample buffer is shorter than the geometry
pub(crate) fn develop(image: &RawImage) -> Result<RawSamples, AdapterError> {
    let needed = image
        .width
        .checked_mul(image.height)
        .and_then(|n| n.checked_mul(image.cpp))
        .ok_or_else(|| AdapterError::Decode("Sensor size overflows".to_string()))?;
    let available = match &image.data {
        RawImageData::Integer(values) => values.len(),
        RawImageData::Float(values) => values.len(),
    };
    if available < needed {
        return Err(AdapterError::Decode(format!(
            "Sensor data holds {} samples, {}x{}x{} needs {}",
            available, image.width, image.height, image.cpp, needed
        )));
    }

    let area = Area::visible(image);
    let levels = Levels::new(image);
    let tone = Tone::new(image);

    match image.cpp {
        1 if image.cfa.is_valid() => Ok(demosaic(image, area, &levels, &tone)),
        1 => Ok(monochrome(image, area, &levels)),
        3 => Ok(rgb(image, area, &levels, &tone)),
        n => Err(AdapterError::UnsupportedChannelLayout(
            u8::try_from(n).unwrap_or(u8::MAX),
        )),
    }
}

/// Maps raw values to white-balanced `0.0..=1.0` per sensor colour.
struct Levels {
    black: [f32; 4],
    scale: [f32; 4],
}

impl Levels {
    fn new(image: &RawImage) -> Self {
        let wb = white_balance(image);
        let mut black = [0.0; 4];
        let mut scale = [0.0; 4];
        for c in 0..4 {
            // Float data is already normalized.
            let (b, w) = match image.data {
                RawImageData::Integer(_) => {
                    (image.blacklevels[c] as f32, image.whitelevels[c] as f32)
                }
                RawImageData::Float(_) => (0.0, 1.0),
            };
            black[c] = b;
            scale[c] = wb[c] / (w - b).max(1.0);
        }
        Self { black, scale }
    }

    #[inline]
    fn at(&self, data: &RawImageData, index: usize, colour: usize) -> f32 {
        let raw = match data {
            RawImageData::Integer(values) => values[index] as f32,
            RawImageData::Float(values) => values[index],
        };
        ((raw - self.black[colour]) * self.scale[colour]).clamp(0.0, 1.0)
    }
}

/// Camera white balance normalized to green, neutral when the file has none.
fn white_balance(image: &RawImage) -> [f32; 4] {
    let usable = |wb: &[f32; 4]| wb[..3].iter().all(|v| v.is_finite() && *v > 0.0);

    let wb = if usable(&image.wb_coeffs) {
        image.wb_coeffs
    } else {
        image.neutralwb()
    };
    if !usable(&wb) {
        return [1.0; 4];
    }

    let e = if wb[3].is_finite() && wb[3] > 0.0 {
        wb[3] / wb[1]
    } else {
        1.0
    };
    [wb[0] / wb[1], 1.0, wb[2] / wb[1], e]
}

/// Camera RGB to encoded sRGB.
struct Tone {
    matrix: Option<[[f32; 3]; 3]>,
}

impl Tone {
    fn new(image: &RawImage) -> Self {
        Self {
            matrix: camera_to_srgb(image),
        }
    }

    fn apply(&self, cam: [f32; 3]) -> [f32; 3] {
        let linear = match &self.matrix {
            Some(m) => [0, 1, 2].map(|i| m[i][0] * cam[0] + m[i][1] * cam[1] + m[i][2] * cam[2]),
            None => cam,
        };
        linear.map(|v| srgb_encode(v.clamp(0.0, 1.0)))
    }
}

/// Row-normalized camera to sRGB matrix; `None` if the camera has no usable one.
fn camera_to_srgb(image: &RawImage) -> Option<[[f32; 3]; 3]> {
    if image.xyz_to_cam.iter().flatten().all(|v| *v == 0.0) {
        return None;
    }

    let cam_to_xyz = image.cam_to_xyz_normalized();
    let mut m = [[0.0f32; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = (0..3).map(|k| XYZ_TO_SRGB[i][k] * cam_to_xyz[k][j]).sum();
        }
    }

    // Neutral camera values stay neutral.
    for row in &mut m {
        let sum: f32 = row.iter().sum();
        if !sum.is_finite() || sum.abs() < f32::EPSILON {
            return None;
        }
        row.iter_mut().for_each(|v| *v /= sum);
    }

    m.iter().flatten().all(|v| v.is_finite()).then_some(m)
}

fn srgb_encode(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn to_u16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0).round() as u16
}

/// Append one pixel in B, G, R order.
#[inline]
fn push_bgr(out: &mut Vec<u8>, rgb: [f32; 3]) {
    for c in [2, 1, 0] {
        out.extend_from_slice(&to_u16(rgb[c]).to_be_bytes());
    }
}

/// Output channel for a CFA colour; the fourth colour counts as green.
#[inline]
fn channel_of(colour: usize) -> usize {
    if colour == 3 {
        1
    } else {
        colour
    }
}

fn demosaic(image: &RawImage, area: Area, levels: &Levels, tone: &Tone) -> RawSamples {
    let (w, h) = (image.width, image.height);
    let cfa = &image.cfa;
    let mut out = Vec::with_capacity(area.width * area.height * 3 * 2);

    for row in area.top..area.top + area.height {
        for col in area.left..area.left + area.width {
            let own = cfa.color_at(row, col);
            let mut sum = [0.0f32; 3];
            let mut count = [0u32; 3];

            for r in row.saturating_sub(1)..=(row + 1).min(h - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(w - 1) {
                    let colour = cfa.color_at(r, c);
                    let ch = channel_of(colour);
                    sum[ch] += levels.at(&image.data, r * w + c, colour);
                    count[ch] += 1;
                }
            }

            let mut cam = [0.0f32; 3];
            for ch in 0..3 {
                cam[ch] = if ch == channel_of(own) {
                    levels.at(&image.data, row * w + col, own)
                } else if count[ch] > 0 {
                    sum[ch] / count[ch] as f32
                } else {
                    0.0
                };
            }
            push_bgr(&mut out, tone.apply(cam));
        }
    }

    RawSamples::new(area.width as u32, area.height as u32, 3, 16, out)
}

fn rgb(image: &RawImage, area: Area, levels: &Levels, tone: &Tone) -> RawSamples {
    let w = image.width;
    let mut out = Vec::with_capacity(area.width * area.height * 3 * 2);

    for row in area.top..area.top + area.height {
        for col in area.left..area.left + area.width {
            let base = (row * w + col) * 3;
            let cam = [0, 1, 2].map(|c| levels.at(&image.data, base + c, c));
            push_bgr(&mut out, tone.apply(cam));
        }
    }

    RawSamples::new(area.width as u32, area.height as u32, 3, 16, out)
}

fn monochrome(image: &RawImage, area: Area, levels: &Levels) -> RawSamples {
    let w = image.width;
    let mut out = Vec::with_capacity(area.width * area.height * 2);

    for row in area.top..area.top + area.height {
        for col in area.left..area.left + area.width {
            let v = srgb_encode(levels.at(&image.data, row * w + col, 0));
            out.extend_from_slice(&to_u16(v).to_be_bytes());
        }
    }

    RawSamples::new(area.width as u32, area.height as u32, 1, 16, out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rawloader::{Orientation, CFA};

    /// Sensor image with unit white balance, full 16-bit range and no matrix.
    pub(crate) fn sensor(
        width: usize,
        height: usize,
        cpp: usize,
        cfa: &str,
        data: Vec<u16>,
    ) -> RawImage {
        RawImage {
            make: "Test".to_string(),
            model: "Sensor".to_string(),
            clean_make: "Test".to_string(),
            clean_model: "Sensor".to_string(),
            width,
            height,
            cpp,
            wb_coeffs: [1.0, 1.0, 1.0, f32::NAN],
            whitelevels: [65535; 4],
            blacklevels: [0; 4],
            xyz_to_cam: [[0.0; 3]; 4],
            cfa: CFA::new(cfa),
            crops: [0; 4],
            blackareas: Vec::new(),
            orientation: Orientation::Normal,
            data: RawImageData::Integer(data),
        }
    }

    /// Decode big-endian B, G, R samples back to R, G, B triples.
    fn rgb_pixels(samples: &RawSamples) -> Vec<[u16; 3]> {
        samples
            .data
            .chunks_exact(6)
            .map(|p| {
                let v = |i: usize| u16::from_be_bytes([p[i], p[i + 1]]);
                [v(4), v(2), v(0)]
            })
            .collect()
    }

    #[test]
    fn test_demosaic_red_scene() {
        // RGGB tile lit only on the red photosite
        let image = sensor(2, 2, 1, "RGGB", vec![65535, 0, 0, 0]);
        let out = develop(&image).unwrap();

        assert_eq!((out.width, out.height, out.channels, out.bits), (2, 2, 3, 16));
        assert_eq!(rgb_pixels(&out), vec![[65535, 0, 0]; 4]);
    }

    #[test]
    fn test_demosaic_flat_field_is_neutral() {
        let image = sensor(4, 4, 1, "RGGB", vec![65535; 16]);
        let out = develop(&image).unwrap();
        assert!(rgb_pixels(&out).iter().all(|p| *p == [65535, 65535, 65535]));
    }

    #[test]
    fn test_demosaic_honors_cfa_pattern() {
        // Same data, BGGR: the lit photosite is blue
        let image = sensor(2, 2, 1, "BGGR", vec![65535, 0, 0, 0]);
        let out = develop(&image).unwrap();
        assert_eq!(rgb_pixels(&out), vec![[0, 0, 65535]; 4]);
    }

    #[test]
    fn test_per_colour_black_levels() {
        // Each colour sits exactly at its own black level
        let mut image = sensor(2, 2, 1, "RGGB", vec![100, 200, 200, 300]);
        image.blacklevels = [100, 200, 300, 200];
        image.whitelevels = [4095; 4];
        let out = develop(&image).unwrap();
        assert!(rgb_pixels(&out).iter().all(|p| *p == [0, 0, 0]));
    }

    #[test]
    fn test_white_balance_scales_channels() {
        // Half-level grey with red gain 2 clips red to full
        let mut image = sensor(2, 2, 1, "RGGB", vec![32768; 4]);
        image.wb_coeffs = [2.0, 1.0, 1.0, f32::NAN];
        let out = develop(&image).unwrap();
        for p in rgb_pixels(&out) {
            assert_eq!(p[0], 65535);
            assert!(p[1] < 65535);
            assert_eq!(p[1], p[2]);
        }
    }

    #[test]
    fn test_rgb_sensor_keeps_channel_identity() {
        let image = sensor(1, 1, 3, "", vec![65535, 0, 0]);
        let out = develop(&image).unwrap();
        // Stored B, G, R
        assert_eq!(out.data, vec![0, 0, 0, 0, 0xFF, 0xFF]);
        assert_eq!(rgb_pixels(&out), vec![[65535, 0, 0]]);
    }

    #[test]
    fn test_monochrome_sensor_single_channel() {
        let image = sensor(2, 1, 1, "", vec![0, 65535]);
        let out = develop(&image).unwrap();
        assert_eq!(out.channels, 1);
        assert_eq!(out.data, vec![0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn test_crops_define_visible_area() {
        let mut image = sensor(6, 4, 1, "RGGB", vec![65535; 24]);
        image.crops = [1, 2, 1, 0];
        assert_eq!(visible_size(&image), Size::new(4, 2));

        let out = develop(&image).unwrap();
        assert_eq!(out.size(), Size::new(4, 2));
        assert_eq!(out.data.len(), 4 * 2 * 3 * 2);
    }

    #[test]
    fn test_crops_covering_sensor_are_ignored() {
        let mut image = sensor(2, 2, 1, "RGGB", vec![0; 4]);
        image.crops = [2, 0, 2, 0];
        assert_eq!(visible_size(&image), Size::new(2, 2));
    }

    #[test]
    fn test_truncated_sensor_data() {
        let image = sensor(4, 4, 1, "RGGB", vec![0; 15]);
        assert!(matches!(develop(&image), Err(AdapterError::Decode(_))));
    }

    #[test]
    fn test_unsupported_cpp() {
        let image = sensor(1, 1, 4, "", vec![0; 4]);
        assert_eq!(
            develop(&image),
            Err(AdapterError::UnsupportedChannelLayout(4))
        );
    }

    #[test]
    fn test_float_data_is_normalized() {
        let mut image = sensor(1, 1, 3, "", Vec::new());
        image.data = RawImageData::Float(vec![0.0, 1.0, 2.0]);
        let out = develop(&image).unwrap();
        assert_eq!(rgb_pixels(&out), vec![[0, 65535, 65535]]);
    }

    #[test]
    fn test_camera_matrix_keeps_white_neutral() {
        let mut image = sensor(2, 2, 1, "RGGB", vec![65535; 4]);
        // Roughly a real camera's XYZ to camera matrix
        image.xyz_to_cam = [
            [0.6722, -0.0635, -0.0963],
            [-0.4287, 1.2460, 0.2028],
            [-0.0908, 0.2162, 0.5668],
            [0.0, 0.0, 0.0],
        ];
        assert!(camera_to_srgb(&image).is_some());

        let out = develop(&image).unwrap();
        for p in rgb_pixels(&out) {
            for c in p {
                assert!(c >= 65000, "expected near white, got {:?}", p);
            }
        }
    }

    #[test]
    fn test_missing_matrix_is_identity() {
        let image = sensor(2, 2, 1, "RGGB", vec![0; 4]);
        assert!(camera_to_srgb(&image).is_none());
    }

    #[test]
    fn test_white_balance_fallbacks() {
        let mut image = sensor(1, 1, 3, "", vec![0; 3]);
        image.wb_coeffs = [f32::NAN; 4];
        // No matrix either, so the neutral estimate is unusable too
        assert_eq!(white_balance(&image), [1.0; 4]);

        image.wb_coeffs = [2000.0, 1000.0, 1500.0, f32::NAN];
        assert_eq!(white_balance(&image), [2.0, 1.0, 1.5, 1.0]);
    }

    #[test]
    fn test_srgb_encode_endpoints() {
        assert_eq!(srgb_encode(0.0), 0.0);
        assert!((srgb_encode(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_encode(0.18) > 0.45);
    }
}
