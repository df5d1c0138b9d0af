use std::{fmt, fs::File, path::Path};

use anyhow::{bail, Context, Result};
use image::{codecs::png::PngEncoder, ImageEncoder, RgbaImage};
use libkap::{Chart, ColorPalette, Metadata};
use tracing::{debug, info, instrument, warn};

/// Width and height of the rendered image
///
/// `RA=` wins when present; otherwise the widest row and the highest row number are used.
/// `RA=` may not exceed the extent of the decoded raster.
fn image_size(chart: &Chart, metadata: &Metadata) -> Result<(u32, u32)> {
    let rows = chart.raster_segment();
    let widest = rows
        .values()
        .map(|runs| runs.iter().map(|run| u64::from(run.length())).sum::<u64>())
        .max()
        .unwrap_or_default();
    let widest = u32::try_from(widest).context("raster row is too wide")?;
    let last_row = rows.keys().last().copied().unwrap_or_default();

    let (width, height) = match metadata.size {
        Some(size) => (size.width, size.height),
        None => {
            warn!("No RA= field in the header, sizing the image from the raster");
            (widest, last_row)
        }
    };
    if widest > width {
        bail!("raster rows are {widest} pixels wide, but the image is {width} pixels wide");
    }
    if width > widest || height > last_row {
        bail!("RA={width},{height} is larger than the raster ({widest}x{last_row})");
    }
    Ok((width, height))
}

/// Renders every row of `chart` with the palette `palette`
///
/// # Errors
///
/// Fails if the header does not define `palette`, or if the image size does not match the raster
pub fn to_rgba_image(chart: &Chart, metadata: &Metadata, palette: ColorPalette) -> Result<RgbaImage> {
    let colors = metadata
        .palette_for(palette)
        .with_context(|| format!("chart has no {palette} palette"))?;
    let (width, height) = image_size(chart, metadata)?;
    debug!("Rendering {width}x{height} pixels with {} colors", colors.len());

    let pixel_count = usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .with_context(|| format!("{width}x{height} image is too large"))?;
    let mut pixels = vec![[0, 0, 0, 0xFF]; pixel_count];
    if width > 0 {
        for (row, buffer) in (0..height).zip(pixels.chunks_mut(width as usize)) {
            chart.render_row_rgba(colors, row, buffer);
        }
    }
    RgbaImage::from_raw(width, height, pixels.into_iter().flatten().collect())
        .context("pixel buffer does not match the image size")
}

/// Converts a BSB/KAP file into a PNG image
///
/// # Errors
///
/// Fails if the file cannot be decoded, rendered or written
#[instrument]
pub fn kap_to_image(bsb_file: &Path, output_name: &Path, palette: ColorPalette) -> Result<()> {
    let chart = Chart::from_file(bsb_file)
        .with_context(|| format!("Failed to decode {}", bsb_file.display()))?;
    debug!("Read bsb from file");
    let metadata = chart.metadata();
    let image = to_rgba_image(&chart, &metadata, palette)?;

    let output = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_name)?;

    info!("Writing applied palette image to {}", output_name.display());
    let encoder = PngEncoder::new(output);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    info!("Successfully wrote palette image to {}", output_name.display());
    Ok(())
}

fn show<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Header summary printed by `kapview info`
struct Summary<'a> {
    chart: &'a Chart,
    metadata: &'a Metadata,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { chart, metadata } = self;
        writeln!(f, "name:        {}", show(metadata.name.as_deref()))?;
        writeln!(
            f,
            "size:        {}",
            show(metadata.size.map(|s| format!("{}x{}", s.width, s.height)))
        )?;
        writeln!(f, "version:     {}", show(metadata.version))?;
        writeln!(f, "bit depth:   {}", show(chart.bit_depth()))?;
        writeln!(f, "rows:        {}", chart.raster_segment().len())?;
        if let Some(chart_parameters) = &metadata.chart {
            writeln!(
                f,
                "chart:       {} ({})",
                show(chart_parameters.name.as_deref()),
                show(chart_parameters.number.as_deref())
            )?;
        }
        if let Some(edition) = &metadata.edition {
            writeln!(
                f,
                "edition:     {} / {} ({})",
                show(edition.source_edition.as_deref()),
                show(edition.raster_edition),
                show(edition.edition_date)
            )?;
        }
        let palettes: Vec<_> = metadata
            .palette
            .iter()
            .map(|p| (ColorPalette::Rgb, p))
            .chain(metadata.palettes.iter().map(|(k, p)| (*k, p)))
            .map(|(kind, p)| format!("{kind} ({})", p.len()))
            .collect();
        writeln!(f, "palettes:    {}", palettes.join(", "))?;
        writeln!(
            f,
            "border:      {} points",
            metadata.border.as_ref().map_or(0, Vec::len)
        )?;
        for panel in &metadata.panels {
            writeln!(
                f,
                "panel:       {} {} {} {}",
                show(panel.name.as_deref()),
                show(panel.number.as_deref()),
                show(panel.kind.as_deref()),
                show(panel.file_name.as_deref())
            )?;
        }
        for comment in &metadata.comments {
            writeln!(f, "! {comment}")?;
        }
        Ok(())
    }
}

/// Human readable summary of a chart's header
#[must_use]
pub fn describe(chart: &Chart, metadata: &Metadata) -> String {
    Summary { chart, metadata }.to_string()
}

/// Prints the header summary of a BSB/KAP file
///
/// # Errors
///
/// Fails if the file cannot be decoded
#[instrument]
pub fn print_info(bsb_file: &Path) -> Result<()> {
    let chart = Chart::from_file(bsb_file)
        .with_context(|| format!("Failed to decode {}", bsb_file.display()))?;
    print!("{}", describe(&chart, &chart.metadata()));
    Ok(())
}
