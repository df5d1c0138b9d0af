/// Demonstrates how to create a png file from a [`Chart`]
/// using the [`image`] crate
///
/// ```"not rust"
/// cargo run --example kap_to_png -- chart.kap chart.png
/// ```
use image::{codecs::png::PngEncoder, ImageEncoder};
use libkap::{Chart, ColorPalette};
use std::fs::File;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: kap_to_png <input.kap> <output.png>");
    };
    let chart = Chart::from_file(&input)?;
    let metadata = chart.metadata();
    let size = metadata
        .size
        .ok_or_else(|| anyhow::anyhow!("{input} has no RA= field"))?;
    let palette = metadata
        .palette_for(ColorPalette::Rgb)
        .cloned()
        .unwrap_or_default();

    let mut as_rgba = vec![[0; 4]; size.width as usize * size.height as usize];
    for (row, buffer) in (0..size.height).zip(as_rgba.chunks_mut(size.width as usize)) {
        chart.render_row_rgba(&palette, row, buffer);
    }
    let as_rgba: Vec<u8> = as_rgba.into_iter().flatten().collect();

    let output = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output)?;

    let encoder = PngEncoder::new(output);
    encoder.write_image(
        &as_rgba,
        size.width,
        size.height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
