//! Rendering of raw BPF map keys and values.
//!
//! Map dumps hand back opaque byte blobs. This crate turns them into text
//! under a [`RenderConfig`] (format, integer width, byte order) and parses
//! user-typed byte lists back into blobs for map updates.

use std::borrow::Cow;

use thiserror::Error;

/// How a blob is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataFormat {
    #[default]
    Hex,
    Decimal,
    Char,
    Raw,
}

impl DataFormat {
    pub const ALL: [DataFormat; 4] = [Self::Hex, Self::Decimal, Self::Char, Self::Raw];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Decimal => "decimal",
            Self::Char => "char",
            Self::Raw => "raw",
        }
    }

    /// Next format in display order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Integer width used to group bytes for hex/decimal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum DataWidth {
    #[default]
    W8,
    W16,
    W32,
    W64,
}

impl DataWidth {
    pub const ALL: [DataWidth; 4] = [Self::W8, Self::W16, Self::W32, Self::W64];

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.bytes() == bytes)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::W8 => "8-bit",
            Self::W16 => "16-bit",
            Self::W32 => "32-bit",
            Self::W64 => "64-bit",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl TryFrom<u8> for DataWidth {
    type Error = String;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes as usize)
            .ok_or_else(|| format!("invalid data width {bytes}, expected 1, 2, 4 or 8"))
    }
}

impl From<DataWidth> for u8 {
    fn from(width: DataWidth) -> Self {
        width.bytes() as u8
    }
}

/// Byte order used to read each width-sized group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    pub fn label(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Little => Self::Big,
            Self::Big => Self::Little,
        }
    }
}

/// The full rendering configuration for map blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub format: DataFormat,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: DataWidth,
    #[cfg_attr(feature = "serde", serde(default))]
    pub endianness: Endianness,
}

impl RenderConfig {
    pub fn new(format: DataFormat, width: DataWidth, endianness: Endianness) -> Self {
        Self {
            format,
            width,
            endianness,
        }
    }

    /// Short description for status lines, e.g. "hex 32-bit little".
    pub fn describe(&self) -> String {
        format!(
            "{} {} {}",
            self.format.label(),
            self.width.label(),
            self.endianness.label()
        )
    }
}

/// Right-pad `data` with zero bytes up to a multiple of `width`.
///
/// Never truncates; data that is already aligned is borrowed unchanged.
pub fn pad(data: &[u8], width: DataWidth) -> Cow<'_, [u8]> {
    let w = width.bytes();
    let rem = data.len() % w;
    if rem == 0 {
        return Cow::Borrowed(data);
    }
    let mut padded = Vec::with_capacity(data.len() + w - rem);
    padded.extend_from_slice(data);
    padded.resize(data.len() + w - rem, 0);
    Cow::Owned(padded)
}

/// Render a blob as text.
///
/// Empty input renders as an empty string under every configuration.
/// `Char` and `Raw` look at the bytes as-is and ignore width and byte order.
pub fn format_bytes(data: &[u8], config: &RenderConfig) -> String {
    if data.is_empty() {
        return String::new();
    }

    match config.format {
        DataFormat::Hex => {
            render_groups(&pad(data, config.width), config.width, config.endianness, Radix::Hex)
        }
        DataFormat::Decimal => render_groups(
            &pad(data, config.width),
            config.width,
            config.endianness,
            Radix::Decimal,
        ),
        DataFormat::Char => as_char(data),
        DataFormat::Raw => format!("{data:?}"),
    }
}

/// Render a key/value pair with the same configuration.
pub fn format_entry(key: &[u8], value: &[u8], config: &RenderConfig) -> (String, String) {
    (format_bytes(key, config), format_bytes(value, config))
}

#[derive(Clone, Copy)]
enum Radix {
    Hex,
    Decimal,
}

/// Split aligned data into width-sized unsigned integers. Misaligned input
/// yields an empty string instead of a partial rendering.
fn render_groups(data: &[u8], width: DataWidth, endianness: Endianness, radix: Radix) -> String {
    let w = width.bytes();
    if data.len() % w != 0 {
        return String::new();
    }

    data.chunks_exact(w)
        .map(|chunk| {
            let value = read_uint(chunk, endianness);
            match radix {
                // `#` counts the "0x" prefix towards the field width.
                Radix::Hex => format!("{value:#0digits$x}", digits = 2 * w + 2),
                Radix::Decimal => value.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_uint(chunk: &[u8], endianness: Endianness) -> u64 {
    let mut buf = [0u8; 8];
    match endianness {
        Endianness::Little => {
            buf[..chunk.len()].copy_from_slice(chunk);
            u64::from_le_bytes(buf)
        }
        Endianness::Big => {
            buf[8 - chunk.len()..].copy_from_slice(chunk);
            u64::from_be_bytes(buf)
        }
    }
}

fn as_char(data: &[u8]) -> String {
    data.iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseBytesError {
    #[error("invalid byte {token:?}: expected 0-255 or 0x00-0xff")]
    InvalidToken { token: String },
}

/// Parse a user-typed byte list such as `0x41 0x00 7` or `[65, 0]`.
///
/// Tokens are separated by whitespace or commas; surrounding brackets are
/// accepted so raw-format output can be pasted back in.
pub fn parse_bytes(text: &str) -> Result<Vec<u8>, ParseBytesError> {
    let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|token| {
            let parsed = match token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
            {
                Some(hex) => u8::from_str_radix(hex, 16),
                None => token.parse::<u8>(),
            };
            parsed.map_err(|_| ParseBytesError::InvalidToken {
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(format: DataFormat, width: DataWidth, endianness: Endianness) -> RenderConfig {
        RenderConfig::new(format, width, endianness)
    }

    #[test]
    fn pad_extends_to_width_multiple() {
        let inputs: [&[u8]; 4] = [b"", b"A", b"AAAAA", b"AAAAAAAAA"];
        for width in DataWidth::ALL {
            for data in inputs {
                let padded = pad(data, width);
                assert_eq!(padded.len() % width.bytes(), 0);
                assert!(padded.starts_with(data));
                assert!(padded[data.len()..].iter().all(|&b| b == 0));
            }
        }
        assert_eq!(&*pad(b"AAAAA", DataWidth::W64), b"AAAAA\0\0\0");
        assert_eq!(&*pad(b"AAAAAAAAA", DataWidth::W16), b"AAAAAAAAA\0");
        assert!(matches!(pad(b"AAAA", DataWidth::W32), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_input_renders_empty_everywhere() {
        for format in DataFormat::ALL {
            for width in DataWidth::ALL {
                for endianness in [Endianness::Little, Endianness::Big] {
                    assert_eq!(format_bytes(&[], &cfg(format, width, endianness)), "");
                }
            }
        }
    }

    #[test]
    fn single_byte_hex_and_decimal() {
        use DataFormat::*;
        use DataWidth::*;
        use Endianness::*;

        let cases = [
            (Hex, W8, Little, "0x41"),
            (Hex, W8, Big, "0x41"),
            (Hex, W16, Little, "0x0041"),
            (Hex, W16, Big, "0x4100"),
            (Hex, W32, Little, "0x00000041"),
            (Hex, W32, Big, "0x41000000"),
            (Hex, W64, Little, "0x0000000000000041"),
            (Hex, W64, Big, "0x4100000000000000"),
            (Decimal, W8, Big, "65"),
            (Decimal, W16, Little, "65"),
            (Decimal, W16, Big, "16640"),
            (Decimal, W32, Big, "1090519040"),
            (Decimal, W64, Little, "65"),
            (Decimal, W64, Big, "4683743612465315840"),
        ];
        for (format, width, endianness, expected) in cases {
            assert_eq!(
                format_bytes(&[0x41], &cfg(format, width, endianness)),
                expected,
                "{format:?} {width:?} {endianness:?}"
            );
        }
    }

    #[test]
    fn groups_are_space_separated() {
        let data = [0x01, 0x00, 0x02, 0x00, 0xff];
        let little = cfg(DataFormat::Hex, DataWidth::W16, Endianness::Little);
        assert_eq!(format_bytes(&data, &little), "0x0001 0x0002 0x00ff");
        let dec = cfg(DataFormat::Decimal, DataWidth::W8, Endianness::Big);
        assert_eq!(format_bytes(&data, &dec), "1 0 2 0 255");
    }

    #[test]
    fn raw_and_char_ignore_width_and_order() {
        let data = b"hi\x00\x7f!";
        for format in [DataFormat::Raw, DataFormat::Char] {
            let base = format_bytes(data, &cfg(format, DataWidth::W8, Endianness::Little));
            for width in DataWidth::ALL {
                for endianness in [Endianness::Little, Endianness::Big] {
                    assert_eq!(format_bytes(data, &cfg(format, width, endianness)), base);
                }
            }
        }
        assert_eq!(
            format_bytes(data, &cfg(DataFormat::Char, DataWidth::W64, Endianness::Big)),
            "hi..!"
        );
        assert_eq!(
            format_bytes(&[65, 0], &cfg(DataFormat::Raw, DataWidth::W32, Endianness::Big)),
            "[65, 0]"
        );
    }

    #[test]
    fn misaligned_groups_render_nothing() {
        assert_eq!(
            render_groups(&[1, 2, 3], DataWidth::W16, Endianness::Little, Radix::Hex),
            ""
        );
        assert_eq!(
            render_groups(&[1, 2, 3, 4, 5], DataWidth::W32, Endianness::Big, Radix::Decimal),
            ""
        );
    }

    #[test]
    fn parse_bytes_accepts_hex_decimal_and_brackets() {
        assert_eq!(parse_bytes("0x41 0x00 7"), Ok(vec![0x41, 0, 7]));
        assert_eq!(parse_bytes("[65, 0]"), Ok(vec![65, 0]));
        assert_eq!(parse_bytes("  "), Ok(vec![]));
        assert_eq!(
            parse_bytes("0x41 256"),
            Err(ParseBytesError::InvalidToken {
                token: "256".to_string()
            })
        );
        assert!(parse_bytes("zz").is_err());
    }

    #[test]
    fn config_cycles_wrap_around() {
        assert_eq!(DataFormat::Raw.next(), DataFormat::Hex);
        assert_eq!(DataWidth::W64.next(), DataWidth::W8);
        assert_eq!(Endianness::Big.toggle(), Endianness::Little);
        assert_eq!(DataWidth::try_from(4u8), Ok(DataWidth::W32));
        assert!(DataWidth::try_from(3u8).is_err());
    }
}
