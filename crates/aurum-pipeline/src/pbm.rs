//! Raw PBM (P4) encoding of a bi-level mask.
//!
//! The trace engine consumes 1-bit rasters; raw PBM is the smallest
//! format it accepts. In PBM, bit 1 = black, rows are packed MSB-first
//! and padded to a byte boundary.
//!
//! The caller is expected to have inverted polarity already so that
//! black (bit 1, sample value 0) is the foreground. Any sample below
//! 128 encodes as black.
//!
//! This is a pure function with no I/O: it returns the encoded bytes.

use image::GrayImage;

/// Sample values below this encode as black (bit 1).
const BLACK_BELOW: u8 = 128;

/// Encode a grayscale mask as a raw PBM (P4) byte buffer.
#[must_use = "returns the encoded PBM bytes"]
pub fn encode_pbm(image: &GrayImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let row_bytes = (width as usize).div_ceil(8);

    let mut out = format!("P4\n{width} {height}\n").into_bytes();
    out.reserve(row_bytes * height as usize);

    for y in 0..height {
        let mut byte = 0u8;
        for x in 0..width {
            if image.get_pixel(x, y).0[0] < BLACK_BELOW {
                byte |= 0x80 >> (x % 8);
            }
            if x % 8 == 7 {
                out.push(byte);
                byte = 0;
            }
        }
        if width % 8 != 0 {
            out.push(byte);
        }
    }

    out
}
