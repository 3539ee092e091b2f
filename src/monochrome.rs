use image::{Rgba, RgbaImage};

/// Turn an icon into a white silhouette for themed launcher icons.
///
/// Each pixel scores `min(alpha, 255 - min(r, g, b))`, so dark opaque areas
/// score high and light or transparent ones score low. Scores are stretched so
/// the highest one becomes fully opaque. An image where every score is zero
/// comes out fully transparent.
pub fn derive_monochrome(image: &RgbaImage) -> RgbaImage {
    let scores: Vec<u8> = image.pixels().map(silhouette_score).collect();
    let max_score = scores.iter().copied().max().unwrap_or(0);

    if max_score == 0 {
        log::debug!("monochrome source has no visible dark pixels");
    }

    let mut silhouette = RgbaImage::new(image.width(), image.height());
    for (pixel, score) in silhouette.pixels_mut().zip(scores) {
        *pixel = Rgba([255, 255, 255, normalize(score, max_score)]);
    }
    silhouette
}

fn silhouette_score(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, a] = pixel.0;
    a.min(255 - r.min(g).min(b))
}

fn normalize(score: u8, max_score: u8) -> u8 {
    if max_score == 0 {
        return 0;
    }
    let scaled = (255 * u32::from(score) + u32::from(max_score) / 2) / u32::from(max_score);
    scaled as u8
}
