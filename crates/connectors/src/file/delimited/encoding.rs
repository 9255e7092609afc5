use std::str::FromStr;

pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Character encodings supported by the delimited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Encoding {
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| format!("invalid UTF-8: {e}")),
            // Every byte maps to the code point of the same value.
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    Err(format!("non-ASCII byte 0x{:02x} at offset {pos}", bytes[pos]))
                } else {
                    Ok(bytes.iter().map(|&b| b as char).collect())
                }
            }
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "UTF-8" | "UTF8" => Ok(Encoding::Utf8),
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => Ok(Encoding::Latin1),
            "US-ASCII" | "ASCII" => Ok(Encoding::Ascii),
            other => Err(format!("unsupported encoding '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("ISO_8859_1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert!("EBCDIC".parse::<Encoding>().is_err());
    }

    #[test]
    fn latin1_decodes_high_bytes() {
        assert_eq!(Encoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xe9]).unwrap(), "café");
        assert!(Encoding::Utf8.decode(&[0x63, 0xe9]).is_err());
        assert!(Encoding::Ascii.decode(&[0xe9]).is_err());
    }
}
