use tracing::trace;

use crate::{chart::RasterSegment, palette::Palette, palette::Rgb};

/// Renders the 0-based output row `row` of `raster_segment` into `buffer`
///
/// Raster rows are numbered from 1, so output row `row` reads raster row
/// `row + 1`. Each run writes `convert` of its palette color over the next
/// `length` pixels; indexes missing from `palette` are drawn as
/// [`Rgb::BLACK`]. A row absent from the raster leaves `buffer` untouched, as
/// do pixels past the end of the row's runs.
///
/// # Panics
///
/// Panics if `buffer` is shorter than the total run length of the row. No
/// clipping is done: the width is whatever the runs add up to.
pub fn render_row<T: Clone>(
    raster_segment: &RasterSegment,
    palette: &Palette,
    row: u32,
    buffer: &mut [T],
    convert: impl Fn(Rgb) -> T,
) {
    let Some(runs) = row
        .checked_add(1)
        .and_then(|number| raster_segment.get(&number))
    else {
        trace!("row {row} has no raster data");
        return;
    };
    let mut x = 0;
    for run in runs {
        let end = x + run.length() as usize;
        buffer[x..end].fill(convert(palette.color(run.color_index())));
        x = end;
    }
}

/// [`render_row`] into opaque RGBA pixels
///
/// # Panics
///
/// See [`render_row`]
pub fn render_row_rgba(
    raster_segment: &RasterSegment,
    palette: &Palette,
    row: u32,
    buffer: &mut [[u8; 4]],
) {
    render_row(raster_segment, palette, row, buffer, Rgb::to_rgba);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::RasterRun;

    fn segment() -> RasterSegment {
        [
            (1, vec![RasterRun::new(1, 2), RasterRun::new(2, 1)]),
            (2, vec![RasterRun::new(5, 3)]),
        ]
        .into_iter()
        .collect()
    }

    fn palette() -> Palette {
        [(1, Rgb::new(10, 20, 30)), (2, Rgb::new(40, 50, 60))]
            .into_iter()
            .collect()
    }

    #[test]
    fn writes_runs_left_to_right() {
        let mut buffer = [[0; 4]; 3];
        render_row_rgba(&segment(), &palette(), 0, &mut buffer);
        assert_eq!(
            buffer,
            [[10, 20, 30, 0xFF], [10, 20, 30, 0xFF], [40, 50, 60, 0xFF]]
        );
    }

    #[test]
    fn missing_palette_index_is_black() {
        let mut buffer = [[7; 4]; 3];
        render_row_rgba(&segment(), &palette(), 1, &mut buffer);
        assert_eq!(buffer, [[0, 0, 0, 0xFF]; 3]);
    }

    #[test]
    fn missing_row_leaves_buffer_untouched() {
        let mut buffer = [[7; 4]; 3];
        render_row_rgba(&segment(), &palette(), 2, &mut buffer);
        assert_eq!(buffer, [[7; 4]; 3]);
        render_row_rgba(&segment(), &palette(), u32::MAX, &mut buffer);
        assert_eq!(buffer, [[7; 4]; 3]);
    }

    #[test]
    fn longer_buffer_keeps_its_tail() {
        let mut buffer = vec![Rgb::new(9, 9, 9); 5];
        render_row(&segment(), &palette(), 0, &mut buffer, |c| c);
        assert_eq!(buffer[2], Rgb::new(40, 50, 60));
        assert_eq!(buffer[3..], [Rgb::new(9, 9, 9); 2]);
    }

    #[test]
    #[should_panic]
    fn short_buffer_panics() {
        let mut buffer = [[0; 4]; 2];
        render_row_rgba(&segment(), &palette(), 0, &mut buffer);
    }
}
