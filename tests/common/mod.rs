#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

fn solid_svg(width: u32, height: u32, fill: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><rect width="{width}" height="{height}" fill="{fill}"/></svg>"#
    )
}

/// Lay out a blue square master icon and badge artwork:
/// red 2:1 status badges, green square mini badges and a yellow square console badge.
pub fn write_fixtures(root: &Path) -> (PathBuf, PathBuf) {
    let master = root.join("icon.svg");
    fs::write(&master, solid_svg(100, 100, "#0000ff")).expect("Failed to write master icon");

    let badges = root.join("icon_badges");
    fs::create_dir_all(&badges).expect("Failed to create badge directory");
    for status in ["dev", "beta", "rc"] {
        fs::write(
            badges.join(format!("status_{status}.svg")),
            solid_svg(20, 10, "#ff0000"),
        )
        .expect("Failed to write status badge");
        fs::write(
            badges.join(format!("status_{status}_mini.svg")),
            solid_svg(10, 10, "#00ff00"),
        )
        .expect("Failed to write mini status badge");
    }
    fs::write(badges.join("console.svg"), solid_svg(10, 10, "#ffff00"))
        .expect("Failed to write console badge");

    (master, badges)
}

pub fn run_generator(master: &Path, badges: &Path, output: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_badged-icon-gen"))
        .arg(master)
        .arg("--badges")
        .arg(badges)
        .arg("--output")
        .arg(output)
        .args(extra)
        .output()
        .expect("Failed to run badged-icon-gen")
}

pub fn assert_success(output: &Output) {
    if !output.status.success() {
        eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        panic!("badged-icon-gen failed with status: {}", output.status);
    }
}

/// Decode every frame of an ICO file, in directory order
pub fn read_ico_frames(path: &Path) -> Vec<RgbaImage> {
    let bytes = fs::read(path).expect("Failed to read ICO file");
    assert_eq!(&bytes[0..4], &[0, 0, 1, 0], "Not an icon resource");
    let count = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;

    (0..count)
        .map(|i| {
            let entry = &bytes[6 + i * 16..6 + (i + 1) * 16];
            let len = u32::from_le_bytes(entry[8..12].try_into().unwrap()) as usize;
            let offset = u32::from_le_bytes(entry[12..16].try_into().unwrap()) as usize;
            image::load_from_memory(&bytes[offset..offset + len])
                .expect("Failed to decode ICO frame")
                .to_rgba8()
        })
        .collect()
}

/// Encode a solid-color image as an ICNS ARGB payload
pub fn solid_argb(size: u32, color: Rgba<u8>) -> Vec<u8> {
    let mut data = b"ARGB".to_vec();
    let [r, g, b, a] = color.0;
    for value in [a, r, g, b] {
        let mut remaining = (size * size) as usize;
        while remaining > 0 {
            let run = remaining.min(130);
            assert!(run >= 3, "remainder too short for a run");
            data.push(0x80 + (run - 3) as u8);
            data.push(value);
            remaining -= run;
        }
    }
    data
}

/// Decode an ICNS ARGB payload
pub fn decode_argb(data: &[u8], size: u32) -> RgbaImage {
    assert!(data.starts_with(b"ARGB"), "Payload is not ARGB");
    let plane_len = (size * size) as usize;
    let mut planes = Vec::new();
    let mut i = 4;
    while planes.len() < plane_len * 4 {
        let header = data[i];
        if header >= 0x80 {
            let count = (header - 0x80) as usize + 3;
            planes.extend(std::iter::repeat(data[i + 1]).take(count));
            i += 2;
        } else {
            let count = header as usize + 1;
            planes.extend_from_slice(&data[i + 1..i + 1 + count]);
            i += 1 + count;
        }
    }
    assert_eq!(planes.len(), plane_len * 4);

    RgbaImage::from_fn(size, size, |x, y| {
        let p = (y * size + x) as usize;
        Rgba([
            planes[plane_len + p],
            planes[2 * plane_len + p],
            planes[3 * plane_len + p],
            planes[p],
        ])
    })
}
