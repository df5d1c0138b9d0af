//! Built-in extractors for the record types of BSB/KAP headers
//!
//! Field values follow the `XX=value` convention of the header records: a
//! value runs up to the next comma. The first match wins for single-valued
//! fields. Missing fields are left unset and never make extraction fail.

use std::{collections::BTreeMap, str::FromStr, sync::LazyLock};

use chrono::NaiveDate;
use itertools::Itertools;
use regex::Regex;
use tracing::{debug, warn};

use super::{
    parse, ChartEdition, ChartGeneralParameters, Coordinate, Extractor, PanelGeneralParameters,
    PanelRecord, Size,
};
use crate::{
    chart::TextEntry,
    palette::{ColorPalette, Palette},
};

// Dates are written month first by NOAA and Maptech, ISO by some converters
const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%d/%m/%Y"];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

macro_rules! patterns {
    ($($name:ident = $pattern:literal;)*) => {
        $(static $name: LazyLock<Regex> = LazyLock::new(|| compile($pattern));)*
    };
}

patterns! {
    BSB_TYPE = "^BSB$";
    RGB_TYPE = "^RGB$";
    PLY_TYPE = "^PLY$";
    PANEL_TYPE = r"^K\d{2}$";
    CHT_TYPE = "^CHT$";
    CED_TYPE = "^CED$";
    VER_TYPE = "^VER$";
    COMMENT_TYPE = "^!$";
    ALTERNATE_PALETTE_TYPE = "^(DAY|DSK|NGT|NGR|GRY|PRC|PRG)$";

    NAME = "NA=([^,]+)";
    NUMBER = "NU=([^,]+)";
    SIZE = r"RA=(\d+),(\d+)";
    DRAWING_UNITS = r"DU=(\d+)";
    PANEL_KIND = "TY=([^,]+)";
    FILE_NAME = "FN=([^,]+)";
    SOURCE_EDITION = "SE=([^,]+)";
    RASTER_EDITION = r"RE=(\d+)";
    EDITION_DATE = "ED=([^,]+)";
}

fn lines<'a>(entries: &'a [&'a TextEntry]) -> impl Iterator<Item = &'a str> + 'a {
    entries
        .iter()
        .flat_map(|entry| entry.lines())
        .map(String::as_str)
}

/// First capture of `re` over `lines`
fn first_field<'a>(mut lines: impl Iterator<Item = &'a str>, re: &Regex) -> Option<&'a str> {
    lines.find_map(|line| re.captures(line)?.get(1).map(|m| m.as_str()))
}

fn first_owned_field<'a>(lines: impl Iterator<Item = &'a str>, re: &Regex) -> Option<String> {
    first_field(lines, re).map(str::to_owned)
}

fn first_number<'a, T: FromStr>(lines: impl Iterator<Item = &'a str>, re: &Regex) -> Option<T> {
    first_field(lines, re).and_then(|n| n.parse().ok())
}

fn first_size<'a>(mut lines: impl Iterator<Item = &'a str>) -> Option<Size> {
    lines.find_map(|line| {
        let caps = SIZE.captures(line)?;
        let width = caps.get(1)?.as_str().parse().ok()?;
        let height = caps.get(2)?.as_str().parse().ok()?;
        Some(Size { height, width })
    })
}

fn read_palette<'a>(lines: impl Iterator<Item = &'a str>) -> Palette {
    lines.filter_map(parse::palette_line).collect()
}

fn read_name_and_size(entries: &[&TextEntry]) -> (Option<String>, Option<Size>) {
    let name = first_owned_field(lines(entries), &NAME);
    let size = first_size(lines(entries));
    debug!("chart name: {name:?}, size: {size:?}");
    (name, size)
}

/// Chart name (`NA=`) and image size (`RA=width,height`) from `BSB` records
#[must_use]
pub fn name_and_size() -> Extractor<(Option<String>, Option<Size>)> {
    Extractor::new(BSB_TYPE.clone(), read_name_and_size)
}

fn read_general_parameters(entries: &[&TextEntry]) -> Option<PanelGeneralParameters> {
    let parameters = PanelGeneralParameters {
        name: first_owned_field(lines(entries), &NAME),
        number: first_owned_field(lines(entries), &NUMBER),
        size: first_size(lines(entries)),
        drawing_units: first_number(lines(entries), &DRAWING_UNITS),
    };
    (parameters != PanelGeneralParameters::default()).then_some(parameters)
}

/// General parameters (`NA=`, `NU=`, `RA=`, `DU=`) of the `BSB` record
#[must_use]
pub fn general_parameters() -> Extractor<Option<PanelGeneralParameters>> {
    Extractor::new(BSB_TYPE.clone(), read_general_parameters)
}

fn read_primary_palette(entries: &[&TextEntry]) -> Option<Palette> {
    let palette = read_palette(lines(entries));
    debug!("primary palette holds {} colors", palette.len());
    (!palette.is_empty()).then_some(palette)
}

/// The default palette, from `RGB` records of the form `index,r,g,b`
///
/// An index defined twice keeps its last color.
#[must_use]
pub fn primary_palette() -> Extractor<Option<Palette>> {
    Extractor::new(RGB_TYPE.clone(), read_primary_palette)
}

fn read_alternate_palettes(entries: &[&TextEntry]) -> BTreeMap<ColorPalette, Palette> {
    let mut palettes = BTreeMap::new();
    for entry in entries {
        let Ok(kind) = ColorPalette::from_str(entry.entry_type()) else {
            warn!("Unrecognized palette record: {}", entry.entry_type());
            continue;
        };
        palettes
            .entry(kind)
            .or_insert_with(Palette::new)
            .extend(read_palette(entry.lines().iter().map(String::as_str)));
    }
    palettes.retain(|_, palette| !palette.is_empty());
    palettes
}

/// The day, dusk, night and gray palettes, keyed by their record identifier
#[must_use]
pub fn alternate_palettes() -> Extractor<BTreeMap<ColorPalette, Palette>> {
    Extractor::new(ALTERNATE_PALETTE_TYPE.clone(), read_alternate_palettes)
}

fn read_border(entries: &[&TextEntry]) -> Option<Vec<Coordinate>> {
    let border: Vec<_> = lines(entries)
        .filter_map(parse::border_line)
        .sorted_by_key(|(order, _)| *order)
        .map(|(_, coordinate)| coordinate)
        .collect();
    (!border.is_empty()).then_some(border)
}

/// The chart border from `PLY` records of the form `order,latitude,longitude`
///
/// Points are ordered by `order`, not by their position in the file.
#[must_use]
pub fn border() -> Extractor<Option<Vec<Coordinate>>> {
    Extractor::new(PLY_TYPE.clone(), read_border)
}

fn read_panels(entries: &[&TextEntry]) -> Vec<PanelRecord> {
    entries
        .iter()
        .sorted_by(|a, b| a.entry_type().cmp(b.entry_type()))
        .filter_map(|entry| {
            let lines = || entry.lines().iter().map(String::as_str);
            let record = PanelRecord {
                name: first_owned_field(lines(), &NAME),
                number: first_owned_field(lines(), &NUMBER),
                kind: first_owned_field(lines(), &PANEL_KIND),
                file_name: first_owned_field(lines(), &FILE_NAME),
            };
            (record != PanelRecord::default()).then_some(record)
        })
        .collect()
}

/// Panel records from `K01`..`K99` records, in record identifier order
#[must_use]
pub fn panels() -> Extractor<Vec<PanelRecord>> {
    Extractor::new(PANEL_TYPE.clone(), read_panels)
}

fn read_chart_parameters(entries: &[&TextEntry]) -> Option<ChartGeneralParameters> {
    entries.iter().find_map(|entry| {
        let lines = || entry.lines().iter().map(String::as_str);
        let chart = ChartGeneralParameters {
            name: first_owned_field(lines(), &NAME),
            number: first_owned_field(lines(), &NUMBER),
        };
        (chart != ChartGeneralParameters::default()).then_some(chart)
    })
}

/// Chart name and number from the first `CHT` record holding either
#[must_use]
pub fn chart_parameters() -> Extractor<Option<ChartGeneralParameters>> {
    Extractor::new(CHT_TYPE.clone(), read_chart_parameters)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok());
    if date.is_none() {
        warn!("Unrecognized edition date: {value}");
    }
    date
}

fn read_edition(entries: &[&TextEntry]) -> Option<ChartEdition> {
    entries.iter().find_map(|entry| {
        let lines = || entry.lines().iter().map(String::as_str);
        let edition = ChartEdition {
            source_edition: first_owned_field(lines(), &SOURCE_EDITION),
            raster_edition: first_number(lines(), &RASTER_EDITION),
            edition_date: first_field(lines(), &EDITION_DATE).and_then(parse_date),
        };
        (edition != ChartEdition::default()).then_some(edition)
    })
}

/// Chart edition parameters (`SE=`, `RE=`, `ED=`) from the `CED` record
#[must_use]
pub fn edition() -> Extractor<Option<ChartEdition>> {
    Extractor::new(CED_TYPE.clone(), read_edition)
}

fn read_version(entries: &[&TextEntry]) -> Option<f32> {
    lines(entries).find_map(parse::version)
}

/// BSB format version from the `VER` record
#[must_use]
pub fn version() -> Extractor<Option<f32>> {
    Extractor::new(VER_TYPE.clone(), read_version)
}

fn read_comments(entries: &[&TextEntry]) -> Vec<String> {
    lines(entries).map(|line| line.trim().to_owned()).collect()
}

/// Comment lines (starting with `!`), trimmed
#[must_use]
pub fn comments() -> Extractor<Vec<String>> {
    Extractor::new(COMMENT_TYPE.clone(), read_comments)
}
