//! Visual style catalog and aspect ratio definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A selectable visual style.
///
/// A style contributes a text modifier appended to every flattened prompt;
/// it carries no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageStyle {
    /// Stable identifier used for lookup
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Text appended to every flattened prompt
    pub prompt_modifier: &'static str,
}

/// The built-in style catalog.
pub const VISUAL_STYLES: &[ImageStyle] = &[
    ImageStyle {
        id: "cinematic",
        name: "Cinematic",
        prompt_modifier: "cinematic lighting, 35mm film grain, high budget movie production, bokeh, 4k, hyperrealistic",
    },
    ImageStyle {
        id: "ancient",
        name: "Ancient Cinematic",
        prompt_modifier: "cinematic shot, ancient historical setting, epic scale, golden hour lighting, dust and atmosphere, 8k resolution, highly detailed textures, dramatic shadows, period accurate details",
    },
    ImageStyle {
        id: "photorealistic",
        name: "Photorealistic",
        prompt_modifier: "award winning photography, natural lighting, 8k resolution, highly detailed, sharp focus",
    },
    ImageStyle {
        id: "cyberpunk",
        name: "Cyberpunk",
        prompt_modifier: "neon lights, futuristic city, cybernetic details, synthwave aesthetic, night time, rain",
    },
    ImageStyle {
        id: "anime",
        name: "Anime",
        prompt_modifier: "anime style, Studio Ghibli inspired, vibrant colors, detailed background, cel shaded",
    },
    ImageStyle {
        id: "watercolor",
        name: "Watercolor",
        prompt_modifier: "watercolor painting, soft brush strokes, artistic, pastel colors, paper texture, dreamy",
    },
    ImageStyle {
        id: "minimalist",
        name: "Minimalist",
        prompt_modifier: "minimalist design, clean lines, solid colors, abstract, modern art, vector style",
    },
];

impl ImageStyle {
    /// Look up a style by its identifier.
    pub fn by_id(id: &str) -> Option<&'static ImageStyle> {
        VISUAL_STYLES.iter().find(|s| s.id == id)
    }

    /// The default style (first catalog entry).
    pub fn default_style() -> &'static ImageStyle {
        &VISUAL_STYLES[0]
    }
}

impl FromStr for ImageStyle {
    type Err = StyleLookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageStyle::by_id(&s.to_lowercase())
            .copied()
            .ok_or_else(|| StyleLookupError(s.to_string()))
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Error)]
#[error("Unknown style: {0}")]
pub struct StyleLookupError(String);

/// Requestable aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    /// Square (1:1)
    #[serde(rename = "1:1")]
    Square,
    /// Standard landscape (16:9)
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// Standard portrait (9:16)
    #[serde(rename = "9:16")]
    Portrait,
    /// Classic wide (4:3)
    #[serde(rename = "4:3")]
    Wide,
    /// Classic tall (3:4)
    #[serde(rename = "3:4")]
    Tall,
}

impl AspectRatio {
    pub const ALL: &'static [AspectRatio] = &[
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Wide,
        AspectRatio::Tall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Wide => "4:3",
            AspectRatio::Tall => "3:4",
        }
    }

    /// Map to the nearest physically supported video aspect.
    ///
    /// The video backend supports only landscape 16:9 and portrait 9:16;
    /// wide buckets map to landscape, tall and square buckets to portrait.
    pub fn video_bucket(&self) -> VideoAspect {
        match self {
            AspectRatio::Landscape | AspectRatio::Wide => VideoAspect::Landscape,
            AspectRatio::Portrait | AspectRatio::Tall | AspectRatio::Square => {
                VideoAspect::Portrait
            }
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(AspectRatio::Square),
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "4:3" => Ok(AspectRatio::Wide),
            "3:4" => Ok(AspectRatio::Tall),
            _ => Err(AspectRatioParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unsupported aspect ratio: {0}, expected one of 1:1, 16:9, 9:16, 4:3, 3:4")]
pub struct AspectRatioParseError(String);

/// The two aspect ratios the video backend physically supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoAspect {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspect {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoAspect::Landscape => "16:9",
            VideoAspect::Portrait => "9:16",
        }
    }
}

impl fmt::Display for VideoAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
