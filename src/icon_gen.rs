use crate::{
    badge::{
        assemble_icon_image, console_badge_dimensions, status_badge_dimensions, Badge,
        BuildStatus, StatusArtwork,
    },
    icns_argb::{decode_argb, encode_argb, is_argb},
    monochrome::derive_monochrome,
    raster::{load_file, rasterize_svg},
    Args,
};
use anyhow::{anyhow, bail, Context, Result};
use icns::IconFamily;
use image::{
    codecs::{
        ico::{IcoEncoder, IcoFrame},
        png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    },
    imageops, ColorType, DynamicImage, ImageEncoder, ImageFormat, Rgb, RgbImage, RgbaImage,
};
use std::{
    fs::{create_dir_all, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
    str::FromStr,
};

/// ICO frame sizes, largest first. 512 and 1024 are left out to keep the file small.
const WINDOWS_ICON_SIZES: [u32; 6] = [256, 128, 64, 48, 32, 16];

/// Android density buckets and their scale factor over mdpi
const ANDROID_DENSITIES: [(&str, f32); 5] = [
    ("mdpi", 1.0),
    ("hdpi", 1.5),
    ("xhdpi", 2.0),
    ("xxhdpi", 3.0),
    ("xxxhdpi", 4.0),
];

// mdpi pixel sizes: legacy icon, adaptive foreground canvas and its safe zone
const ANDROID_ICON_SIZE: f32 = 48.0;
const ANDROID_FOREGROUND_SIZE: f32 = 108.0;
const ANDROID_FOREGROUND_CONTENTS_SIZE: f32 = 66.0;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

pub fn generate_icons(args: &Args) -> Result<()> {
    let master = load_file(&args.input).context("Failed to load master icon")?;

    let has_platform_flags = args.windows || args.android || args.macos;
    let windows = args.windows || !has_platform_flags;
    let android = args.android || !has_platform_flags;
    let macos = args.macos || !has_platform_flags;

    let icns_template = match (&args.icns_template, macos) {
        (Some(path), true) => Some(path.as_path()),
        (None, true) if args.macos => bail!("--macos requires --icns-template"),
        (None, true) => {
            println!("Skipping macOS icons: no --icns-template given");
            None
        }
        (_, false) => None,
    };

    let console_badge = if windows {
        Some(load_file(&args.badges.join("console.svg"))?)
    } else {
        None
    };

    let android_background = if android {
        Some(parse_color(&args.android_background)?)
    } else {
        None
    };

    for &status in &args.status {
        let artwork = StatusArtwork::load(&args.badges, status)?;

        if let Some(console_badge) = &console_badge {
            let icons_dir = args.output.join("windows").join("icons");
            create_dir_all(&icons_dir)?;

            let name = &args.name;
            compose_windows_icon(
                &master,
                status,
                artwork.as_ref(),
                None,
                &icons_dir.join(format!("{name}_{status}.ico")),
            )?;
            compose_windows_icon(
                &master,
                status,
                artwork.as_ref(),
                Some(console_badge.as_slice()),
                &icons_dir.join(format!("{name}_console_{status}.ico")),
            )?;
        }

        if let Some(background) = android_background {
            let out_dir = args.output.join("android").join("icons").join(status.label());
            compose_android_icons(&master, status, artwork.as_ref(), background, &out_dir)?;
        }

        if let Some(template) = icns_template {
            let icons_dir = args.output.join("macos").join("icons");
            compose_macos_icons(template, status, artwork.as_ref(), &icons_dir)?;
        }
    }

    Ok(())
}

/// Write a multi-resolution ICO, optionally tagged with the console badge
pub fn compose_windows_icon(
    master: &[u8],
    status: BuildStatus,
    artwork: Option<&StatusArtwork>,
    console_badge: Option<&[u8]>,
    out_path: &Path,
) -> Result<()> {
    println!("Generating {}...", out_path.display());
    let mut frames = Vec::new();

    for size in WINDOWS_ICON_SIZES {
        let mut badges = Vec::new();
        if let Some(artwork) = artwork {
            let svg_bytes = if size == 16 {
                &artwork.mini
            } else {
                &artwork.full
            };
            badges.push(Badge::new(svg_bytes, status_badge_dimensions(size)?));
        }
        if let Some(console_badge) = console_badge {
            badges.push(Badge::new(console_badge, console_badge_dimensions(size)?));
        }

        let base = rasterize_svg(master, size)
            .with_context(|| format!("Failed to rasterize {size}px {status} icon"))?;
        let icon = assemble_icon_image(&base, &badges)?;
        let (width, height) = icon.dimensions();

        // Only the 256px layer can be compressed according to the ico specs
        if size == 256 {
            let mut buf = Vec::new();
            write_png(&icon, &mut buf)?;
            frames.push(IcoFrame::with_encoded(buf, width, height, ColorType::Rgba8)?);
        } else {
            frames.push(IcoFrame::as_png(
                icon.as_raw(),
                width,
                height,
                ColorType::Rgba8,
            )?);
        }
    }

    let mut out_file = BufWriter::new(
        File::create(out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?,
    );
    let encoder = IcoEncoder::new(&mut out_file);
    encoder.encode_images(&frames)?;
    out_file.flush()?;

    println!("✓ Generated {}", out_path.display());
    Ok(())
}

/// Write the mipmap tree for one build variant: legacy icons, adaptive
/// foreground/background layers and the shared monochrome icon.
pub fn compose_android_icons(
    master: &[u8],
    status: BuildStatus,
    artwork: Option<&StatusArtwork>,
    background: Rgb<u8>,
    out_dir: &Path,
) -> Result<()> {
    println!("Generating Android {status} icons...");
    create_dir_all(out_dir)?;

    let mut mdpi_foreground = None;

    for (density, factor) in ANDROID_DENSITIES {
        let size = (ANDROID_ICON_SIZE * factor) as u32;
        let foreground_size = (ANDROID_FOREGROUND_SIZE * factor) as u32;
        let contents_size = (ANDROID_FOREGROUND_CONTENTS_SIZE * factor) as u32;

        let mipmap_dir = out_dir.join(format!("mipmap-{density}"));
        create_dir_all(&mipmap_dir)?;

        let mut badges = Vec::new();
        if let Some(artwork) = artwork {
            badges.push(Badge::new(&artwork.full, status_badge_dimensions(size)?));
        }

        let base = rasterize_svg(master, size)
            .with_context(|| format!("Failed to rasterize {density} icon"))?;
        let icon = assemble_icon_image(&base, &badges)?;
        save_png(&DynamicImage::ImageRgba8(icon), &mipmap_dir.join("icon.png"))?;
        println!("  ✓ Generated mipmap-{density}/icon.png");

        // The foreground holds the same artwork shrunk into the adaptive safe zone
        let foreground_badges: Vec<Badge<'_>> = badges
            .iter()
            .map(|badge| {
                let mut dimensions = badge.dimensions;
                dimensions.height = (dimensions.height as f32 * contents_size as f32
                    / size as f32)
                    .round() as u32;
                Badge::new(badge.svg_bytes, dimensions)
            })
            .collect();
        let contents_base = rasterize_svg(master, contents_size)
            .with_context(|| format!("Failed to rasterize {density} foreground"))?;
        let contents = assemble_icon_image(&contents_base, &foreground_badges)?;

        let mut foreground = RgbaImage::new(foreground_size, foreground_size);
        let margin = i64::from((foreground_size - contents_size) / 2);
        imageops::replace(&mut foreground, &contents, margin, margin);
        save_png(
            &DynamicImage::ImageRgba8(foreground.clone()),
            &mipmap_dir.join("icon_foreground.png"),
        )?;
        println!("  ✓ Generated mipmap-{density}/icon_foreground.png");

        let background_img = RgbImage::from_pixel(foreground_size, foreground_size, background);
        save_png(
            &DynamicImage::ImageRgb8(background_img),
            &mipmap_dir.join("icon_background.png"),
        )?;
        println!("  ✓ Generated mipmap-{density}/icon_background.png");

        if mdpi_foreground.is_none() {
            mdpi_foreground = Some(foreground);
        }
    }

    let default_dir = out_dir.join("mipmap");
    copy_dir_files(&out_dir.join("mipmap-mdpi"), &default_dir)?;
    println!("  ✓ Copied mipmap-mdpi to mipmap");

    let mdpi_foreground =
        mdpi_foreground.ok_or_else(|| anyhow!("No mdpi foreground was generated"))?;
    // TODO: badge interiors come out semi-transparent; the white/alpha mix should keep them solid
    let monochrome = derive_monochrome(&mdpi_foreground);
    save_png(
        &DynamicImage::ImageRgba8(monochrome),
        &default_dir.join("icon_monochrome.png"),
    )?;
    println!("  ✓ Generated mipmap/icon_monochrome.png");

    Ok(())
}

/// How an ICNS slot stores its pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotEncoding {
    Png,
    Argb,
}

/// Pixel width and density of the ICNS slot types that carry RGBA pixels
fn icns_slot_geometry(ostype: &[u8; 4]) -> Option<(u32, u32)> {
    let geometry = match ostype {
        b"ic04" | b"icp4" => (16, 1),
        b"icp5" => (32, 1),
        b"icp6" => (64, 1),
        b"ic07" => (128, 1),
        b"ic08" => (256, 1),
        b"ic09" => (512, 1),
        b"ic05" | b"ic11" => (32, 2),
        b"ic12" => (64, 2),
        b"ic13" => (256, 2),
        b"ic14" => (512, 2),
        b"ic10" => (1024, 2),
        _ => return None,
    };
    Some(geometry)
}

const TOC_OSTYPE: &[u8; 4] = b"TOC ";
/// ostype plus length
const ELEMENT_HEADER_LEN: usize = 8;

/// Refresh the `TOC ` slot, if any, so it lists the final length of every other slot
fn rebuild_toc(family: &mut IconFamily) {
    let toc: Vec<u8> = family
        .elements
        .iter()
        .filter(|element| &element.ostype.0 != TOC_OSTYPE)
        .flat_map(|element| {
            let len = (element.data.len() + ELEMENT_HEADER_LEN) as u32;
            element.ostype.0.into_iter().chain(len.to_be_bytes())
        })
        .collect();

    if let Some(element) = family
        .elements
        .iter_mut()
        .find(|element| &element.ostype.0 == TOC_OSTYPE)
    {
        element.data = toc;
    }
}

/// Rewrite the PNG and ARGB slots of an ICNS template with status badges.
/// Any other slot is copied as-is.
pub fn compose_macos_icons(
    template: &Path,
    status: BuildStatus,
    artwork: Option<&StatusArtwork>,
    out_dir: &Path,
) -> Result<()> {
    let stem = template
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("Invalid ICNS template name: {}", template.display()))?;
    let out_path = out_dir.join(format!("{stem}_{status}.icns"));
    println!("Generating {}...", out_path.display());

    create_dir_all(out_dir)?;
    let reader = BufReader::new(
        File::open(template)
            .with_context(|| format!("Failed to open {}", template.display()))?,
    );
    let mut family = IconFamily::read(reader).context("Failed to read ICNS template")?;

    for element in &mut family.elements {
        let ostype = element.ostype;
        let Some((pixel_size, density)) = icns_slot_geometry(&ostype.0) else {
            log::debug!("keeping {ostype} slot untouched");
            continue;
        };

        let encoding = if element.data.starts_with(PNG_SIGNATURE) {
            SlotEncoding::Png
        } else if is_argb(&element.data) {
            SlotEncoding::Argb
        } else {
            log::debug!("keeping {ostype} slot with non-PNG payload untouched");
            continue;
        };

        let image = match encoding {
            SlotEncoding::Png => image::load_from_memory_with_format(&element.data, ImageFormat::Png)
                .with_context(|| format!("Failed to decode {ostype} PNG"))?
                .to_rgba8(),
            SlotEncoding::Argb => decode_argb(&element.data, pixel_size, pixel_size)
                .with_context(|| format!("Failed to decode {ostype} slot"))?,
        };

        let mut badges = Vec::new();
        if let Some(artwork) = artwork {
            let base_size = pixel_size / density;
            let dimensions = status_badge_dimensions(base_size)?.scaled(density);
            let svg_bytes = if base_size > 16 {
                &artwork.full
            } else {
                &artwork.mini
            };
            badges.push(Badge::new(svg_bytes, dimensions));
        }

        let icon = assemble_icon_image(&image, &badges)?;
        element.data = match encoding {
            SlotEncoding::Png => {
                let mut buf = Vec::new();
                write_png(&icon, &mut buf)?;
                buf
            }
            SlotEncoding::Argb => encode_argb(&icon),
        };
        log::debug!("rewrote {ostype} slot ({encoding:?}, {pixel_size}px @{density}x)");
    }

    rebuild_toc(&mut family);

    let mut out_file = BufWriter::new(
        File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?,
    );
    family.write(&mut out_file)?;
    out_file.flush()?;

    println!("✓ Generated {}", out_path.display());
    Ok(())
}

fn copy_dir_files(from: &Path, to: &Path) -> Result<()> {
    create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::copy(entry.path(), to.join(entry.file_name()))
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Parse a CSS color into an opaque RGB pixel
fn parse_color(color: &str) -> Result<Rgb<u8>> {
    let color = css_color::Srgb::from_str(color)
        .map_err(|_| anyhow!("Invalid background color: {color}"))?;
    let channel = |value: f32| (value * 255.).round() as u8;
    Ok(Rgb([
        channel(color.red),
        channel(color.green),
        channel(color.blue),
    ]))
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    let mut file = File::create(path).context("Failed to create PNG file")?;
    image
        .write_to(&mut file, image::ImageOutputFormat::Png)
        .context("Failed to write PNG")?;
    Ok(())
}

// Encode an RGBA image as PNG with compression
fn write_png<W: Write>(image: &RgbaImage, w: W) -> Result<()> {
    let encoder = PngEncoder::new_with_quality(w, CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)?;
    Ok(())
}
