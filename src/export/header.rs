//! ENVI-style text header written next to the binary cube.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::HsiError;

/// Metadata describing a band-sequential float cube.
///
/// `samples` holds the number of rows and `lines` the number of columns.
/// This is swapped relative to the usual ENVI convention and kept for
/// compatibility with existing generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnviHeader {
    /// Number of image rows
    pub samples: u32,
    /// Number of image columns
    pub lines: u32,
    /// Number of spectral bands
    pub bands: usize,
    /// 0 for little-endian data
    pub byte_order: u8,
    /// Bytes before the first data value
    pub header_offset: u64,
}

impl EnviHeader {
    /// Header for a little-endian `width` x `height` x `bands` float cube.
    pub fn for_cube(width: u32, height: u32, bands: usize) -> Self {
        Self {
            samples: height,
            lines: width,
            bands,
            byte_order: 0,
            header_offset: 0,
        }
    }

    /// Path of the header belonging to `data_path` (`cube.bsq` -> `cube.hdr`).
    pub fn path_for(data_path: &Path) -> PathBuf {
        data_path.with_extension("hdr")
    }
}

impl fmt::Display for EnviHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: [(&str, String); 7] = [
            ("interleave", "bsq".to_string()),
            ("data type", "float".to_string()),
            ("byte order", self.byte_order.to_string()),
            ("header offset", self.header_offset.to_string()),
            ("samples", self.samples.to_string()),
            ("lines", self.lines.to_string()),
            ("bands", self.bands.to_string()),
        ];
        for (key, value) in entries {
            writeln!(f, "{key:<15} = {value}")?;
        }
        Ok(())
    }
}

impl FromStr for EnviHeader {
    type Err = HsiError;

    /// Parse `key = value` lines; unknown keys are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut header = EnviHeader::for_cube(0, 0, 0);
        for line in s.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            let invalid = || HsiError::invalid_format(format!("Invalid header line '{line}'"));
            match key.trim() {
                "interleave" if value != "bsq" => {
                    return Err(HsiError::invalid_format(format!(
                        "Unsupported interleave '{value}'"
                    )));
                }
                "data type" if value != "float" => {
                    return Err(HsiError::invalid_format(format!(
                        "Unsupported data type '{value}'"
                    )));
                }
                "byte order" => header.byte_order = value.parse().map_err(|_| invalid())?,
                "header offset" => header.header_offset = value.parse().map_err(|_| invalid())?,
                "samples" => header.samples = value.parse().map_err(|_| invalid())?,
                "lines" => header.lines = value.parse().map_err(|_| invalid())?,
                "bands" => header.bands = value.parse().map_err(|_| invalid())?,
                _ => {}
            }
        }
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_text_layout() {
        let header = EnviHeader::for_cube(640, 480, 50);
        let expected = "\
interleave      = bsq
data type       = float
byte order      = 0
header offset   = 0
samples         = 480
lines           = 640
bands           = 50
";
        assert_eq!(header.to_string(), expected);
    }

    #[test]
    fn test_header_parses_back() {
        let header = EnviHeader::for_cube(3, 7, 12);
        let text = format!("ENVI\ndescription = {{generated}}\n{header}");
        assert_eq!(text.parse::<EnviHeader>().unwrap(), header);
    }

    #[test]
    fn test_header_rejects_other_interleave() {
        assert!("interleave = bil\n".parse::<EnviHeader>().is_err());
    }

    #[test]
    fn test_header_path() {
        assert_eq!(
            EnviHeader::path_for(Path::new("/tmp/cube.bsq")),
            PathBuf::from("/tmp/cube.hdr")
        );
        assert_eq!(
            EnviHeader::path_for(Path::new("cube")),
            PathBuf::from("cube.hdr")
        );
    }
}
