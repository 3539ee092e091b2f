//! Badge artwork, placement tables and the compositor that stamps badges
//! onto a base icon.

use crate::raster::{load_file, rasterize_svg};
use anyhow::{Context, Result};
use clap::ValueEnum;
use image::{imageops, RgbaImage};
use std::{fmt, path::Path};

/// Build variant the icons are generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildStatus {
    Dev,
    Beta,
    Rc,
    Stable,
}

impl BuildStatus {
    /// Every variant, in the order icons are generated by default
    pub const ALL: [BuildStatus; 4] = [
        BuildStatus::Beta,
        BuildStatus::Rc,
        BuildStatus::Dev,
        BuildStatus::Stable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BuildStatus::Dev => "dev",
            BuildStatus::Beta => "beta",
            BuildStatus::Rc => "rc",
            BuildStatus::Stable => "stable",
        }
    }

    /// Whether icons of this variant carry a status badge
    pub fn is_badged(self) -> bool {
        !matches!(self, BuildStatus::Stable)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where and how big a badge is drawn on an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDimensions {
    pub x: u32,
    pub y: u32,
    pub height: u32,
    /// Measure `x`/`y` from the bottom-right corner instead of the top-left one
    pub pos_reverse: bool,
}

impl BadgeDimensions {
    pub const fn new(x: u32, y: u32, height: u32) -> Self {
        Self {
            x,
            y,
            height,
            pos_reverse: false,
        }
    }

    pub const fn reversed(x: u32, y: u32, height: u32) -> Self {
        Self {
            x,
            y,
            height,
            pos_reverse: true,
        }
    }

    /// Same placement on an icon `factor` times larger
    pub fn scaled(self, factor: u32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            height: self.height * factor,
            ..self
        }
    }
}

// Icon pixel size -> status badge placement
const STATUS_BADGE_DIMENSIONS: [(u32, BadgeDimensions); 11] = [
    (512, BadgeDimensions::new(10, 10, 128)), // macos
    (256, BadgeDimensions::new(10, 10, 64)),  // win32, macos
    (192, BadgeDimensions::new(0, 0, 64)),    // android
    (144, BadgeDimensions::new(0, 0, 48)),    // android
    (128, BadgeDimensions::new(10, 10, 32)),  // win32, macos
    (96, BadgeDimensions::new(0, 0, 32)),     // android
    (72, BadgeDimensions::new(0, 0, 24)),     // android
    (64, BadgeDimensions::new(0, 0, 16)),     // win32
    (48, BadgeDimensions::new(0, 0, 16)),     // win32, android
    (32, BadgeDimensions::new(0, 0, 11)),     // win32, macos
    (16, BadgeDimensions::new(0, 0, 6)),      // win32, macos
];

const CONSOLE_BADGE_DIMENSIONS: [(u32, BadgeDimensions); 6] = [
    (256, BadgeDimensions::reversed(10, 10, 80)),
    (128, BadgeDimensions::reversed(10, 10, 40)),
    (64, BadgeDimensions::reversed(0, 0, 24)),
    (48, BadgeDimensions::reversed(0, 0, 17)),
    (32, BadgeDimensions::reversed(0, 0, 13)),
    (16, BadgeDimensions::reversed(0, 0, 8)),
];

/// Status badge placement for an icon of `size` pixels
pub fn status_badge_dimensions(size: u32) -> Result<BadgeDimensions> {
    lookup(&STATUS_BADGE_DIMENSIONS, size)
        .with_context(|| format!("No status badge placement for {size}px icons"))
}

/// Console badge placement for a Windows icon of `size` pixels
pub fn console_badge_dimensions(size: u32) -> Result<BadgeDimensions> {
    lookup(&CONSOLE_BADGE_DIMENSIONS, size)
        .with_context(|| format!("No console badge placement for {size}px icons"))
}

fn lookup(table: &[(u32, BadgeDimensions)], size: u32) -> Option<BadgeDimensions> {
    table
        .iter()
        .find(|(table_size, _)| *table_size == size)
        .map(|(_, dimensions)| *dimensions)
}

/// Status badge artwork for one build variant
#[derive(Debug, Clone)]
pub struct StatusArtwork {
    pub full: Vec<u8>,
    pub mini: Vec<u8>,
}

impl StatusArtwork {
    /// Load `status_<status>.svg` and `status_<status>_mini.svg`, or nothing
    /// for variants that carry no badge.
    pub fn load(badges_dir: &Path, status: BuildStatus) -> Result<Option<Self>> {
        if !status.is_badged() {
            return Ok(None);
        }

        let full = load_file(&badges_dir.join(format!("status_{status}.svg")))?;
        let mini = load_file(&badges_dir.join(format!("status_{status}_mini.svg")))?;
        Ok(Some(Self { full, mini }))
    }
}

/// A badge to composite: vector artwork plus its placement
#[derive(Debug, Clone, Copy)]
pub struct Badge<'a> {
    pub svg_bytes: &'a [u8],
    pub dimensions: BadgeDimensions,
}

impl<'a> Badge<'a> {
    pub fn new(svg_bytes: &'a [u8], dimensions: BadgeDimensions) -> Self {
        Self {
            svg_bytes,
            dimensions,
        }
    }
}

/// Top-left corner of a `badge_width`x`badge_height` badge on a
/// `base_width`x`base_height` icon
pub fn badge_position(
    dimensions: &BadgeDimensions,
    base_width: u32,
    base_height: u32,
    badge_width: u32,
    badge_height: u32,
) -> (i64, i64) {
    if dimensions.pos_reverse {
        (
            i64::from(base_width) - i64::from(badge_width) - i64::from(dimensions.x),
            i64::from(base_height) - i64::from(badge_height) - i64::from(dimensions.y),
        )
    } else {
        (i64::from(dimensions.x), i64::from(dimensions.y))
    }
}

/// Alpha-composite `badges` onto a copy of `base`, in order
pub fn assemble_icon_image(base: &RgbaImage, badges: &[Badge<'_>]) -> Result<RgbaImage> {
    let mut icon = base.clone();

    for badge in badges {
        let badge_png = rasterize_svg(badge.svg_bytes, badge.dimensions.height)
            .with_context(|| format!("Failed to rasterize {}px badge", badge.dimensions.height))?;

        let (x, y) = badge_position(
            &badge.dimensions,
            icon.width(),
            icon.height(),
            badge_png.width(),
            badge_png.height(),
        );
        log::debug!(
            "badge {}x{} at ({x}, {y}) on {}x{} icon",
            badge_png.width(),
            badge_png.height(),
            icon.width(),
            icon.height()
        );

        imageops::overlay(&mut icon, &badge_png, x, y);
    }

    Ok(icon)
}
