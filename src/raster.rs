use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::path::Path;

/// SVG unit resolution. One point maps to one pixel.
const SVG_DPI: f32 = 72.0;

/// Read an SVG file into memory
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Render SVG bytes to an RGBA raster exactly `height` pixels tall.
///
/// The width follows the document's aspect ratio. The renderer works in
/// premultiplied alpha, the returned image holds straight alpha so it can be
/// blended and encoded by the `image` crate.
pub fn rasterize_svg(svg_bytes: &[u8], height: u32) -> Result<RgbaImage> {
    let options = usvg::Options {
        dpi: SVG_DPI,
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_data(svg_bytes, &options).context("Failed to parse SVG")?;

    let svg_size = tree.size();
    let width = scaled_width(svg_size.width(), svg_size.height(), height);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .with_context(|| format!("Can't allocate a {width}x{height} pixmap"))?;
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / svg_size.width(),
        height as f32 / svg_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    log::trace!("rasterized SVG at {width}x{height}");

    let mut raster = RgbaImage::new(width, height);
    for (pixel, premultiplied) in raster.pixels_mut().zip(pixmap.pixels()) {
        let color = premultiplied.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }

    Ok(raster)
}

fn scaled_width(svg_width: f32, svg_height: f32, height: u32) -> u32 {
    let width = (svg_width * height as f32 / svg_height).round() as u32;
    width.max(1)
}
