//! Raw ARGB payloads of ICNS slots (`ic04`, `ic05`).
//!
//! The payload is the `ARGB` magic followed by the alpha, red, green and blue
//! planes, each compressed with the ICNS flavor of PackBits: a header byte
//! below 0x80 copies `header + 1` literal bytes, a header byte of 0x80 or more
//! repeats the next byte `header - 0x80 + 3` times.

use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};

pub const ARGB_MAGIC: &[u8; 4] = b"ARGB";

const MAX_LITERAL: usize = 128;
const MIN_RUN: usize = 3;
const MAX_RUN: usize = 130;

pub fn is_argb(data: &[u8]) -> bool {
    data.starts_with(ARGB_MAGIC)
}

/// Decode an ARGB payload holding a `width`x`height` image
pub fn decode_argb(data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
    let Some(compressed) = data.strip_prefix(ARGB_MAGIC.as_slice()) else {
        bail!("ARGB payload is missing its magic");
    };

    let plane_len = (width * height) as usize;
    let planes = decompress(compressed, plane_len * 4)
        .with_context(|| format!("Corrupt {width}x{height} ARGB payload"))?;
    let (alpha, rest) = planes.split_at(plane_len);
    let (red, rest) = rest.split_at(plane_len);
    let (green, blue) = rest.split_at(plane_len);

    let mut image = RgbaImage::new(width, height);
    for (i, pixel) in image.pixels_mut().enumerate() {
        *pixel = Rgba([red[i], green[i], blue[i], alpha[i]]);
    }
    Ok(image)
}

/// Encode an image as an ARGB payload
pub fn encode_argb(image: &RgbaImage) -> Vec<u8> {
    let mut data = ARGB_MAGIC.to_vec();
    // planes are stored alpha first
    for channel in [3, 0, 1, 2] {
        let plane: Vec<u8> = image.pixels().map(|pixel| pixel[channel]).collect();
        compress(&plane, &mut data);
    }
    data
}

fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut bytes = data.iter().copied();

    while out.len() < expected_len {
        let header = bytes.next().context("RLE stream ends early")?;
        if header & 0x80 != 0 {
            let count = usize::from(header - 0x80) + MIN_RUN;
            let value = bytes.next().context("RLE run is missing its value")?;
            out.extend(std::iter::repeat(value).take(count));
        } else {
            for _ in 0..=header {
                out.push(bytes.next().context("RLE literal ends early")?);
            }
        }
    }

    if out.len() != expected_len {
        bail!(
            "RLE stream decodes to {} bytes, expected {expected_len}",
            out.len()
        );
    }
    Ok(out)
}

fn compress(data: &[u8], out: &mut Vec<u8>) {
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&byte| byte == data[i])
            .count();

        if run >= MIN_RUN {
            push_literals(&data[literal_start..i], out);
            out.push(0x80 + (run - MIN_RUN) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
        }
    }
    push_literals(&data[literal_start..], out);
}

fn push_literals(literals: &[u8], out: &mut Vec<u8>) {
    for chunk in literals.chunks(MAX_LITERAL) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}
