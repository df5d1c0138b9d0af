use std::str::FromStr;

use nom::{
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    number::complete::float,
    sequence::{pair, terminated, tuple},
    IResult,
};

use super::Coordinate;
use crate::palette::Rgb;

fn unpack_ires<T>((_, value): (&str, T)) -> T {
    value
}

fn number<T: FromStr>(input: &str) -> IResult<&str, T> {
    map_res(digit1, |d: &str| d.parse::<T>())(input)
}

fn comma_terminated<T: FromStr>(input: &str) -> IResult<&str, T> {
    terminated(number, tag(","))(input)
}

/// Signed decimal without exponent, e.g. `-123.559587398261`, `+48`, `.5`
fn decimal(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit0,
            opt(pair(char('.'), digit1)),
        ))),
        str::parse::<f64>,
    )(input)
}

/// `index,r,g,b`
pub fn index_rgb(input: &str) -> IResult<&str, (u8, Rgb)> {
    let (input, index) = comma_terminated(input)?;
    let (input, r) = comma_terminated(input)?;
    let (input, g) = comma_terminated(input)?;
    let (input, b) = number(input)?;
    Ok((input, (index, Rgb::new(r, g, b))))
}

/// `order,latitude,longitude`
pub fn index_coordinate(input: &str) -> IResult<&str, (u32, Coordinate)> {
    let (input, order) = comma_terminated(input)?;
    let (input, latitude) = terminated(decimal, tag(","))(input)?;
    let (input, longitude) = decimal(input)?;
    Ok((
        input,
        (
            order,
            Coordinate {
                latitude,
                longitude,
            },
        ),
    ))
}

fn version_number(input: &str) -> IResult<&str, f32> {
    float(input)
}

/// A palette line, which must hold nothing but `index,r,g,b`
pub fn palette_line(line: &str) -> Option<(u8, Rgb)> {
    all_consuming(index_rgb)(line).ok().map(unpack_ires)
}

/// A border line, which must hold nothing but `order,latitude,longitude`
pub fn border_line(line: &str) -> Option<(u32, Coordinate)> {
    all_consuming(index_coordinate)(line).ok().map(unpack_ires)
}

pub fn version(line: &str) -> Option<f32> {
    all_consuming(version_number)(line.trim()).ok().map(unpack_ires)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_palette_lines() {
        assert_eq!(palette_line("3,201,208,184"), Some((3, Rgb::new(201, 208, 184))));
        assert_eq!(palette_line("3,201,208"), None);
        assert_eq!(palette_line("3,201,208,184,1"), None);
        assert_eq!(palette_line("300,0,0,0"), None);
        assert_eq!(palette_line("1,256,0,0"), None);
    }

    #[test]
    fn parses_border_lines() {
        assert_eq!(
            border_line("1,48.483188901744,-123.559587398261"),
            Some((
                1,
                Coordinate {
                    latitude: 48.483_188_901_744,
                    longitude: -123.559_587_398_261
                }
            ))
        );
        assert_eq!(border_line("2,+48,123"), Some((2, Coordinate { latitude: 48.0, longitude: 123.0 })));
        assert_eq!(border_line("48.48,-123.55"), None);
        assert_eq!(border_line("1,48.48,-123.55 trailing"), None);
        assert_eq!(border_line("3,.5,-.25"), Some((3, Coordinate { latitude: 0.5, longitude: -0.25 })));
    }

    #[test]
    fn border_lines_reject_non_decimal_numbers() {
        assert_eq!(border_line("1,nan,inf"), None);
        assert_eq!(border_line("1,NaN,-infinity"), None);
        assert_eq!(border_line("1,4.8e1,-1.2E2"), None);
        assert_eq!(border_line("1,48.,-123"), None);
        assert_eq!(border_line("1,+,-123"), None);
        assert_eq!(border_line("1,,-123"), None);
    }

    #[test]
    fn parses_versions() {
        assert_eq!(version("3.07"), Some(3.07));
        assert_eq!(version(" 2.0 "), Some(2.0));
        assert_eq!(version("v2"), None);
    }
}
