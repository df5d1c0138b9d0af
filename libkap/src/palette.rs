use std::collections::{btree_map, BTreeMap};

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A palette color
#[derive(Default, Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Color used for indexes missing from a palette
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);

    /// Creates a new [`Rgb`]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the color as opaque RGBA
    #[must_use]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xFF]
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(value: Rgb) -> Self {
        [value.r, value.g, value.b]
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// Mapping of palette indexes to colors
///
/// BSB files start their indexes at 1; index 0 is normally unused.
#[derive(Default, Debug, Eq, PartialEq, Clone)]
pub struct Palette(BTreeMap<u8, Rgb>);

impl Palette {
    /// Creates an empty [`Palette`]
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets the color of `index`, returning the color it replaced
    pub fn insert(&mut self, index: u8, color: Rgb) -> Option<Rgb> {
        self.0.insert(index, color)
    }

    /// Returns the color of `index` if the palette defines it
    #[must_use]
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.0.get(&index).copied()
    }

    /// Returns the color of `index`, or [`Rgb::BLACK`] if the palette lacks it
    #[must_use]
    pub fn color(&self, index: u8) -> Rgb {
        self.get(index).unwrap_or(Rgb::BLACK)
    }

    /// Number of defined indexes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no index is defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(index, color)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (u8, Rgb)> + '_ {
        self.0.iter().map(|(&i, &c)| (i, c))
    }
}

impl FromIterator<(u8, Rgb)> for Palette {
    fn from_iter<T: IntoIterator<Item = (u8, Rgb)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Palette {
    type Item = (u8, Rgb);
    type IntoIter = btree_map::IntoIter<u8, Rgb>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<(u8, Rgb)> for Palette {
    fn extend<T: IntoIterator<Item = (u8, Rgb)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

#[derive(
    Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Copy, Clone, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
/// The different palettes a BSB/KAP image file can contain, named after their record identifier
pub enum ColorPalette {
    /// Default color palette (RGB)
    Rgb,
    /// Day color palette (DAY)
    Day,
    /// Dusk color palette (DSK)
    Dsk,
    /// Night color palette (NGT)
    Ngt,
    /// Night red color palette (NGR)
    Ngr,
    /// Gray color palette (GRY)
    Gry,
    /// Optional color palette (PRC)
    Prc,
    /// Optional gray color palette (PRG)
    Prg,
}

impl ColorPalette {
    /// Returns the record identifier of the palette
    #[must_use]
    pub fn as_str(self) -> &'static str {
        Into::<&'static str>::into(self)
    }
}
