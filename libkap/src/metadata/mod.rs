//! Typed values derived from the header entries of a chart
//!
//! Header records are only loosely specified, so nothing here is mandatory:
//! every field of [`Metadata`] is optional and extraction never fails. The
//! built-in pipeline ([`MetadataPipeline::standard`]) runs the
//! [`extractors`] in a fixed order; custom pipelines can mix them with
//! extractors of their own.

use std::{collections::BTreeMap, sync::LazyLock};

use bon::Builder;
use chrono::NaiveDate;
use tracing::debug;

use crate::{
    chart::TextEntry,
    palette::{ColorPalette, Palette},
};

pub mod extractors;
mod parse;
mod pipeline;

pub use pipeline::{Extractor, MetadataPipeline};

/// Image size in pixels, from `RA=width,height`
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Number of rows
    pub height: u32,
    /// Number of pixels per row
    pub width: u32,
}

/// A border polygon vertex in decimal degrees
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude, positive north
    pub latitude: f64,
    /// Longitude, positive east
    pub longitude: f64,
}

/// Record identifier: K01..K99
///
/// Field definitions:
/// ```"not rust"
/// NA=Panel name
/// NU=Panel number
/// TY=Panel type e.g. Base, Inset
/// FN=File name of the panel image e.g. 341201.KAP
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Builder)]
#[non_exhaustive]
pub struct PanelRecord {
    /// NA
    pub name: Option<String>,
    /// NU
    pub number: Option<String>,
    /// TY
    pub kind: Option<String>,
    /// FN
    pub file_name: Option<String>,
}

/// Record identifier: BSB (or NOS for older GEO/NOS files)
///
/// Field definitions:
/// ```"not rust"
/// RA=width,height - width and height of raster image data in pixels
/// NA=Name given to the BSB chart (can represent more than one .KAP)
/// NU=Number of chart (especially when more than one chart is grouped or tiled together)
/// DU=Drawing Units in pixels/inch (same as DPI resolution) e.g. 50, 150, 175, 254, 300
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Builder)]
#[non_exhaustive]
pub struct PanelGeneralParameters {
    /// NA
    pub name: Option<String>,
    /// NU
    pub number: Option<String>,
    /// RA
    pub size: Option<Size>,
    /// DU
    pub drawing_units: Option<u32>,
}

/// Record identifier: CHT
#[derive(Default, Debug, Clone, PartialEq, Eq, Builder)]
#[non_exhaustive]
pub struct ChartGeneralParameters {
    /// NA
    pub name: Option<String>,
    /// NU
    pub number: Option<String>,
}

/// Record identifier: CED
///
/// Field definitions:
/// ```"not rust"
/// SE=Source edition
/// RE=Raster edition
/// ED=Edition date e.g. 11/01/2005
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Builder)]
#[non_exhaustive]
pub struct ChartEdition {
    /// SE
    pub source_edition: Option<String>,
    /// RE
    pub raster_edition: Option<u32>,
    /// ED
    pub edition_date: Option<NaiveDate>,
}

/// Typed header values of a chart
#[derive(Default, Debug, Clone, PartialEq, Builder)]
#[non_exhaustive]
pub struct Metadata {
    /// Chart name (`NA=` of the BSB record)
    pub name: Option<String>,

    /// Image size (`RA=` of the BSB record)
    pub size: Option<Size>,

    /// Record identifier: RGB
    ///
    /// The default palette, used to render the raster
    pub palette: Option<Palette>,

    /// Record identifier: PLY
    ///
    /// Border polygon, in vertex order
    pub border: Option<Vec<Coordinate>>,

    /// Panel records, ordered by record identifier
    #[builder(default)]
    pub panels: Vec<PanelRecord>,

    /// Chart identity
    pub chart: Option<ChartGeneralParameters>,

    /// Every field of the BSB record known to this crate
    pub general_parameters: Option<PanelGeneralParameters>,

    /// Record identifier: CED
    pub edition: Option<ChartEdition>,

    /// Record identifier: VER
    ///
    /// Version number of BSB format e.g. 1, 2.0, 3.0, 3.07, 4.0
    pub version: Option<f32>,

    /// Comment lines
    #[builder(default)]
    pub comments: Vec<String>,

    /// Palettes other than RGB (DAY, DSK, NGT, NGR, GRY, PRC, PRG)
    #[builder(default)]
    pub palettes: BTreeMap<ColorPalette, Palette>,
}

impl Metadata {
    /// Returns the palette stored under `kind`
    ///
    /// [`ColorPalette::Rgb`] maps to [`Metadata::palette`].
    #[must_use]
    pub fn palette_for(&self, kind: ColorPalette) -> Option<&Palette> {
        match kind {
            ColorPalette::Rgb => self.palette.as_ref(),
            kind => self.palettes.get(&kind),
        }
    }
}

impl MetadataPipeline<Metadata> {
    /// The pipeline behind [`extract_metadata`]
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_extractor(extractors::name_and_size(), |m, (name, size)| Metadata {
                name,
                size,
                ..m
            })
            .with_extractor(extractors::general_parameters(), |m, general_parameters| {
                Metadata {
                    general_parameters,
                    ..m
                }
            })
            .with_extractor(extractors::primary_palette(), |m, palette| Metadata {
                palette,
                ..m
            })
            .with_extractor(extractors::border(), |m, border| Metadata { border, ..m })
            .with_extractor(extractors::panels(), |m, panels| Metadata { panels, ..m })
            .with_extractor(extractors::chart_parameters(), |m, chart| Metadata {
                chart,
                ..m
            })
            .with_extractor(extractors::edition(), |m, edition| Metadata {
                edition,
                ..m
            })
            .with_extractor(extractors::version(), |m, version| Metadata {
                version,
                ..m
            })
            .with_extractor(extractors::comments(), |m, comments| Metadata {
                comments,
                ..m
            })
            .with_extractor(extractors::alternate_palettes(), |m, palettes| Metadata {
                palettes,
                ..m
            })
    }
}

static STANDARD: LazyLock<MetadataPipeline<Metadata>> = LazyLock::new(MetadataPipeline::standard);

/// Runs the built-in extractors over `entries`
///
/// ```rust
/// use libkap::{extract_metadata, TextEntry};
///
/// let entries = [
///     TextEntry::new("BSB", ["NA=SAANICH INLET,NU=3441,RA=1171,2098,DU=254"]),
///     TextEntry::new("RGB", ["1,0,0,0"]),
/// ];
/// let metadata = extract_metadata(&entries);
/// assert_eq!(metadata.name.as_deref(), Some("SAANICH INLET"));
/// assert_eq!(metadata.size.map(|s| s.width), Some(1171));
/// assert_eq!(metadata.palette.map(|p| p.len()), Some(1));
/// ```
#[must_use]
pub fn extract_metadata(entries: &[TextEntry]) -> Metadata {
    let metadata = STANDARD.run(Metadata::default(), entries);
    debug!("extracted metadata for {:?}", metadata.name);
    metadata
}
