//! Caption cue model shared by the decoders and the report writer.
//!
//! Field names serialize in the camelCase layout the captions JSON files use.
//! Region percentages follow the WebVTT convention of 0-100.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caption color names used by both CEA-608 and CEA-708.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Cyan => "cyan",
            Self::Red => "red",
            Self::Magenta => "magenta",
            Self::Yellow => "yellow",
            Self::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CSS-like style attached to a text run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionAlign {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionScroll {
    None,
    Up,
}

/// Placement of a CEA-708 window, all values in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub width: f64,
    pub height: f64,
    #[serde(rename = "regionAnchorX")]
    pub region_anchor_x: f64,
    #[serde(rename = "regionAnchorY")]
    pub region_anchor_y: f64,
    #[serde(rename = "viewportanchorX")]
    pub viewport_anchor_x: f64,
    #[serde(rename = "viewportanchorY")]
    pub viewport_anchor_y: f64,
    pub align: RegionAlign,
    pub style: Option<Style>,
    pub scroll: RegionScroll,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 16.0,
            region_anchor_x: 0.0,
            region_anchor_y: 0.0,
            viewport_anchor_x: 0.0,
            viewport_anchor_y: 0.0,
            align: RegionAlign::Center,
            style: None,
            scroll: RegionScroll::Up,
        }
    }
}

/// A timed caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub id: String,
    pub begin: f64,
    pub end: f64,
    /// Vertical line position in percent.
    pub position: f64,
    pub texts: Vec<Text>,
    pub raw_text: String,
    pub lang: String,
    pub region: Option<Region>,
    pub offset: f64,
}

impl Cue {
    /// An empty cue shell; the id is `{begin}_{end}_{stream}`.
    pub fn new(begin: f64, end: f64, stream: &str) -> Self {
        Self {
            id: format!("{begin}_{end}_{stream}"),
            begin,
            end,
            position: 0.0,
            texts: Vec::new(),
            raw_text: String::new(),
            lang: String::new(),
            region: None,
            offset: 0.0,
        }
    }

    /// Caption stream label, the id suffix after the last `_`.
    pub fn stream(&self) -> &str {
        self.id.rsplit('_').next().unwrap_or("unknown")
    }
}

/// Join run texts with single spaces, collapsing all inner whitespace.
pub fn build_raw_text(texts: &[Text]) -> String {
    texts
        .iter()
        .flat_map(|t| t.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_id_and_stream() {
        let cue = Cue::new(1.5, 3.0, "CC1");
        assert_eq!(cue.id, "1.5_3_CC1");
        assert_eq!(cue.stream(), "CC1");

        let cue = Cue::new(0.0, 2.0, "svc2");
        assert_eq!(cue.id, "0_2_svc2");
        assert_eq!(cue.stream(), "svc2");
    }

    #[test]
    fn test_raw_text_collapses_whitespace() {
        let texts = vec![
            Text {
                text: "  Hello\t".to_string(),
                style: None,
            },
            Text {
                text: "big   world ".to_string(),
                style: None,
            },
            Text {
                text: "   ".to_string(),
                style: None,
            },
        ];
        assert_eq!(build_raw_text(&texts), "Hello big world");
    }

    #[test]
    fn test_cue_json_layout() {
        let mut cue = Cue::new(0.0, 1.0, "svc1");
        cue.raw_text = "Hi".to_string();
        cue.texts.push(Text {
            text: "Hi".to_string(),
            style: Some(Style {
                color: Some("white".to_string()),
                ..Style::default()
            }),
        });
        cue.region = Some(Region::default());

        let json = serde_json::to_value(&cue).unwrap();
        assert_eq!(json["rawText"], "Hi");
        assert_eq!(json["texts"][0]["style"]["color"], "white");
        assert!(json["texts"][0]["style"].get("fontStyle").is_none());
        assert_eq!(json["region"]["viewportanchorX"], 0.0);
        assert_eq!(json["region"]["align"], "center");
        assert_eq!(json["region"]["scroll"], "up");
    }

    #[test]
    fn test_color_names() {
        assert_eq!(Color::Magenta.to_string(), "magenta");
        assert_eq!(serde_json::to_string(&Color::Cyan).unwrap(), "\"cyan\"");
    }
}
