//! Caption scheme resolution.
//!
//! DASH signals embedded captions with an `Accessibility` descriptor whose
//! scheme URI names CEA-608 or CEA-708; HLS uses an `INSTREAM-ID` of
//! `CC1`..`CC4` or `SERVICE1`..`SERVICE63`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// DASH accessibility scheme for CEA-608 captions.
pub const CEA608_SCHEME_URI: &str = "urn:scte:dash:cc:cea-608:2015";

/// DASH accessibility scheme for CEA-708 captions.
pub const CEA708_SCHEME_URI: &str = "urn:scte:dash:cc:cea-708:2015";

/// Caption bitstream carried in the SEI of a video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CeaScheme {
    Cea608,
    Cea708,
}

impl CeaScheme {
    /// The DASH accessibility scheme URI.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Cea608 => CEA608_SCHEME_URI,
            Self::Cea708 => CEA708_SCHEME_URI,
        }
    }

    /// Resolve a DASH accessibility scheme URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            CEA608_SCHEME_URI => Some(Self::Cea608),
            CEA708_SCHEME_URI => Some(Self::Cea708),
            _ => None,
        }
    }

    /// Resolve an HLS `INSTREAM-ID`.
    pub fn from_instream_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_uppercase();
        if id.starts_with("CC") {
            Some(Self::Cea608)
        } else if id.starts_with("SERVICE") {
            Some(Self::Cea708)
        } else {
            None
        }
    }
}

impl fmt::Display for CeaScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cea608 => write!(f, "cea608"),
            Self::Cea708 => write!(f, "cea708"),
        }
    }
}

impl FromStr for CeaScheme {
    type Err = Error;

    /// Accepts a scheme URI, an INSTREAM-ID or `cea608`/`cea708`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "");
        match normalized.as_str() {
            "cea608" | "608" => return Ok(Self::Cea608),
            "cea708" | "708" => return Ok(Self::Cea708),
            _ => {}
        }
        Self::from_uri(s.trim())
            .or_else(|| Self::from_instream_id(s))
            .ok_or_else(|| Error::invalid_scheme(s))
    }
}

impl TryFrom<String> for CeaScheme {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CeaScheme> for String {
    fn from(scheme: CeaScheme) -> Self {
        scheme.to_string()
    }
}

/// Map an HLS `INSTREAM-ID` to the stream label used in cue ids.
///
/// `CC1`..`CC4` keep their name, `SERVICEn` becomes `svcn`.
pub fn stream_label(instream_id: &str) -> Result<String> {
    let id = instream_id.trim().to_ascii_uppercase();
    let (prefix, max) = if id.starts_with("SERVICE") {
        ("SERVICE", 63)
    } else if id.starts_with("CC") {
        ("CC", 4)
    } else {
        return Err(Error::invalid_stream(instream_id));
    };
    let number: u8 = id[prefix.len()..]
        .parse()
        .map_err(|_| Error::invalid_stream(instream_id))?;
    if number == 0 || number > max {
        return Err(Error::invalid_stream(instream_id));
    }
    Ok(match prefix {
        "CC" => format!("CC{number}"),
        _ => format!("svc{number}"),
    })
}

/// Parse a DASH accessibility value into `(stream label, language)` pairs.
///
/// CEA-608 values look like `CC1=eng;CC3=swe`, CEA-708 values like
/// `1=lang:eng;2=lang:spa`. Malformed tokens are skipped.
pub fn stream_languages(scheme: CeaScheme, value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|token| {
            let (id, rest) = token.split_once('=')?;
            let id = id.trim();
            if id.is_empty() {
                return None;
            }
            match scheme {
                CeaScheme::Cea608 => {
                    let lang = rest.trim();
                    (!lang.is_empty()).then(|| (id.to_string(), lang.to_lowercase()))
                }
                CeaScheme::Cea708 => {
                    let (_, lang) = rest.split_once(':')?;
                    let lang = lang.split(',').next()?.trim();
                    (!lang.is_empty()).then(|| (format!("svc{id}"), lang.to_lowercase()))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_parsing() {
        assert_eq!(CEA608_SCHEME_URI.parse::<CeaScheme>().unwrap(), CeaScheme::Cea608);
        assert_eq!("urn:scte:dash:cc:cea-708:2015".parse::<CeaScheme>().unwrap(), CeaScheme::Cea708);
        assert_eq!("CC3".parse::<CeaScheme>().unwrap(), CeaScheme::Cea608);
        assert_eq!("SERVICE12".parse::<CeaScheme>().unwrap(), CeaScheme::Cea708);
        assert_eq!("cea-608".parse::<CeaScheme>().unwrap(), CeaScheme::Cea608);
        assert!("urn:unknown".parse::<CeaScheme>().is_err());
    }

    #[test]
    fn test_scheme_serde_round_trip() {
        let json = serde_json::to_string(&CeaScheme::Cea708).unwrap();
        assert_eq!(json, "\"cea708\"");
        let scheme: CeaScheme = serde_json::from_str("\"urn:scte:dash:cc:cea-608:2015\"").unwrap();
        assert_eq!(scheme, CeaScheme::Cea608);
    }

    #[test]
    fn test_stream_label() {
        assert_eq!(stream_label("CC2").unwrap(), "CC2");
        assert_eq!(stream_label("SERVICE7").unwrap(), "svc7");
        assert!(stream_label("CC5").is_err());
        assert!(stream_label("SERVICE64").is_err());
        assert!(stream_label("SUB1").is_err());
    }

    #[test]
    fn test_stream_languages() {
        assert_eq!(
            stream_languages(CeaScheme::Cea608, "CC1=ENG;CC3=swe;bad"),
            vec![
                ("CC1".to_string(), "eng".to_string()),
                ("CC3".to_string(), "swe".to_string())
            ]
        );
        assert_eq!(
            stream_languages(CeaScheme::Cea708, "1=lang:eng;2=lang:spa,war:1;3=x"),
            vec![
                ("svc1".to_string(), "eng".to_string()),
                ("svc2".to_string(), "spa".to_string())
            ]
        );
    }
}
