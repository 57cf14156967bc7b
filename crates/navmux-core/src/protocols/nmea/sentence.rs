use std::fmt::Write as _;

use crate::state::{HEADING_DECIMALS, round_heading};

pub const DEFAULT_TALKER: &str = "HE";

/// THS mode indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThsMode {
    #[default]
    Autonomous,
    Estimated,
    Manual,
    Simulator,
    NotValid,
}

impl ThsMode {
    pub const fn as_char(self) -> char {
        match self {
            Self::Autonomous => 'A',
            Self::Estimated => 'E',
            Self::Manual => 'M',
            Self::Simulator => 'S',
            Self::NotValid => 'V',
        }
    }
}

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// True heading sentence: `$<talker>HDT,<heading>,T*<cs>\r\n`.
///
/// # Examples
/// ```
/// use navmux_core::nmea::hdt;
///
/// assert_eq!(hdt(274.07, "HE"), "$HEHDT,274.0700,T*19\r\n");
/// ```
pub fn hdt(heading_deg: f64, talker: &str) -> String {
    let body = format!("{talker}HDT,{},T", format_heading(heading_deg));
    finish(&body)
}

/// True heading and status sentence: `$<talker>THS,<heading>,<mode>*<cs>\r\n`.
pub fn ths(heading_deg: f64, mode: ThsMode, talker: &str) -> String {
    let body = format!("{talker}THS,{},{}", format_heading(heading_deg), mode.as_char());
    finish(&body)
}

/// Sentence identifier (talker + formatter) of a framed NMEA/AIS line.
///
/// The leading `$`/`!` is optional; returns `None` when fewer than five
/// identifier characters precede the first field separator.
pub fn sentence_tag(line: &str) -> Option<&str> {
    let body = line.strip_prefix(['$', '!']).unwrap_or(line);
    let tag = body.split([',', '*', '\r', '\n']).next()?;
    if tag.len() >= 5 && tag.is_ascii() {
        Some(tag)
    } else {
        None
    }
}

fn format_heading(heading_deg: f64) -> String {
    let decimals = HEADING_DECIMALS as usize;
    format!("{:.decimals$}", round_heading(heading_deg))
}

fn finish(body: &str) -> String {
    let mut sentence = String::with_capacity(body.len() + 6);
    sentence.push('$');
    sentence.push_str(body);
    let _ = write!(sentence, "*{:02X}\r\n", checksum(body));
    sentence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify(sentence: &str) -> bool {
        let Some(rest) = sentence.strip_prefix('$') else {
            return false;
        };
        let Some((body, tail)) = rest.split_once('*') else {
            return false;
        };
        let expected = u8::from_str_radix(&tail[..2], 16).unwrap();
        checksum(body) == expected
    }

    #[test]
    fn hdt_has_valid_checksum() {
        let sentence = hdt(91.23456, DEFAULT_TALKER);
        assert!(sentence.starts_with("$HEHDT,91.2346,T*"));
        assert!(sentence.ends_with("\r\n"));
        assert!(verify(&sentence));
    }

    #[test]
    fn ths_includes_mode() {
        let sentence = ths(0.0, ThsMode::Autonomous, "GP");
        assert!(sentence.starts_with("$GPTHS,0.0000,A*"));
        assert!(verify(&sentence));
        assert!(ths(10.0, ThsMode::NotValid, "HE").contains(",V*"));
    }

    #[test]
    fn known_sentence_checksum() {
        // $GPGLL,4916.45,N,12311.12,W,225444,A*31
        assert_eq!(checksum("GPGLL,4916.45,N,12311.12,W,225444,A"), 0x31);
    }

    #[test]
    fn sentence_tag_extracts_identifier() {
        assert_eq!(sentence_tag("$GPGGA,123519,4807.038,N*47\r\n"), Some("GPGGA"));
        assert_eq!(sentence_tag("!AIVDM,1,1,,A,13aEOK?P00PD2wVMdLDRhgvL289?,0*26"), Some("AIVDM"));
        assert_eq!(sentence_tag("GNRMC,"), Some("GNRMC"));
        assert_eq!(sentence_tag("$GP\r\n"), None);
    }
}
