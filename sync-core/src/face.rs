//! Watch-face vocabulary.
//!
//! Settings travel and persist as plain integers, floats and strings. These
//! types give the renderer and the editor a typed view of them. Unknown codes
//! decode to `None`; the `*_or_default` constructors fall back the same way
//! the renderer does when it reads a value it does not understand.

use serde::{Deserialize, Serialize};

/// ARGB color constants.
pub mod color {
    /// Opaque white.
    pub const WHITE: i32 = 0xFFFF_FFFFu32 as i32;
    /// Dark holo blue, the default background.
    pub const HOLO_BLUE_DARK: i32 = 0xFF00_99CCu32 as i32;
    /// Background color applied when an image transfer fails.
    pub const FALLBACK_BACKGROUND: i32 = 0x0000_0000;
}

/// Large text preset (default).
pub const TEXT_SIZE_LARGE: f32 = 30.0;
/// Medium text preset.
pub const TEXT_SIZE_MEDIUM: f32 = 25.0;
/// Small text preset.
pub const TEXT_SIZE_SMALL: f32 = 20.0;
/// Extra-small text preset.
pub const TEXT_SIZE_EXTRA_SMALL: f32 = 15.0;

/// Text size presets offered by the editor, largest first.
pub const TEXT_SIZE_PRESETS: [f32; 4] = [
    TEXT_SIZE_LARGE,
    TEXT_SIZE_MEDIUM,
    TEXT_SIZE_SMALL,
    TEXT_SIZE_EXTRA_SMALL,
];

/// Which background representation is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Solid color from `background_color`.
    Color,
    /// Image file transferred from `background_asset`.
    Image,
}

impl BackgroundMode {
    /// Decode a stored code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Color),
            1 => Some(Self::Image),
            _ => None,
        }
    }

    /// Decode, treating unknown codes as `Color`.
    pub fn from_code_or_default(code: i32) -> Self {
        Self::from_code(code).unwrap_or(Self::Color)
    }

    /// Stored code.
    pub fn code(self) -> i32 {
        match self {
            Self::Color => 0,
            Self::Image => 1,
        }
    }
}

/// Text weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    /// Regular.
    Normal,
    /// Bold (default).
    Bold,
    /// Italic.
    Italic,
    /// Bold and italic.
    BoldItalic,
}

impl TextStyle {
    /// Decode a stored code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Bold),
            2 => Some(Self::Italic),
            3 => Some(Self::BoldItalic),
            _ => None,
        }
    }

    /// Decode, treating unknown codes as `Bold`.
    pub fn from_code_or_default(code: i32) -> Self {
        Self::from_code(code).unwrap_or(Self::Bold)
    }

    /// Build from the editor's bold/italic toggles.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => Self::BoldItalic,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (false, false) => Self::Normal,
        }
    }

    /// Stored code.
    pub fn code(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Bold => 1,
            Self::Italic => 2,
            Self::BoldItalic => 3,
        }
    }

    /// Whether the style is bold.
    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Whether the style is italic.
    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Vertical alignment of the time text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vertical {
    /// Top edge.
    Top,
    /// Centered.
    Center,
    /// Bottom edge.
    Bottom,
}

/// Horizontal alignment of the time text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizontal {
    /// Left edge.
    Left,
    /// Centered.
    Center,
    /// Right edge.
    Right,
}

/// Position of the time text on a 3x3 grid, row-major from the top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    /// Row 0, column 0.
    TopLeft,
    /// Row 0, column 1.
    TopCenter,
    /// Row 0, column 2.
    TopRight,
    /// Row 1, column 0.
    CenterLeft,
    /// Row 1, column 1 (default).
    CenterCenter,
    /// Row 1, column 2.
    CenterRight,
    /// Row 2, column 0.
    BottomLeft,
    /// Row 2, column 1.
    BottomCenter,
    /// Row 2, column 2.
    BottomRight,
}

impl TextPosition {
    const ALL: [TextPosition; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::CenterLeft,
        Self::CenterCenter,
        Self::CenterRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Decode a stored code.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Decode, treating unknown codes as `CenterCenter`.
    pub fn from_code_or_default(code: i32) -> Self {
        Self::from_code(code).unwrap_or(Self::CenterCenter)
    }

    /// Stored code.
    pub fn code(self) -> i32 {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(4) as i32
    }

    /// Alignment pair for laying out the text.
    pub fn alignment(self) -> (Vertical, Horizontal) {
        let code = self.code();
        let vertical = match code / 3 {
            0 => Vertical::Top,
            1 => Vertical::Center,
            _ => Vertical::Bottom,
        };
        let horizontal = match code % 3 {
            0 => Horizontal::Left,
            1 => Horizontal::Center,
            _ => Horizontal::Right,
        };
        (vertical, horizontal)
    }
}

/// Capitalization applied to the time phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCase {
    /// Leave the phrase as produced (default).
    NoCaps,
    /// Upper-case everything.
    AllCaps,
    /// Upper-case the first letter only.
    FirstCap,
}

impl TextCase {
    /// Decode a stored code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::NoCaps),
            1 => Some(Self::AllCaps),
            2 => Some(Self::FirstCap),
            _ => None,
        }
    }

    /// Decode, treating unknown codes as `NoCaps`.
    pub fn from_code_or_default(code: i32) -> Self {
        Self::from_code(code).unwrap_or(Self::NoCaps)
    }

    /// Stored code.
    pub fn code(self) -> i32 {
        match self {
            Self::NoCaps => 0,
            Self::AllCaps => 1,
            Self::FirstCap => 2,
        }
    }

    /// Apply this capitalization to a phrase.
    pub fn apply(self, phrase: &str) -> String {
        match self {
            Self::NoCaps => phrase.to_string(),
            Self::AllCaps => phrase.to_uppercase(),
            Self::FirstCap => {
                let mut chars = phrase.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// A font the renderer can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    /// Code stored in `text_font`.
    pub code: &'static str,
    /// Name shown in the editor.
    pub display_name: &'static str,
    /// Whether a bold face ships with the font.
    pub has_bold: bool,
    /// Whether an italic face ships with the font.
    pub has_italic: bool,
    /// Whether a bold-italic face ships with the font.
    pub has_bold_italic: bool,
}

const FONTS: [Font; 5] = [
    Font {
        code: Font::DEFAULT_CODE,
        display_name: "Default",
        has_bold: true,
        has_italic: true,
        has_bold_italic: true,
    },
    Font {
        code: "crafty-girls",
        display_name: "Crafty Girls",
        has_bold: false,
        has_italic: false,
        has_bold_italic: false,
    },
    Font {
        code: "dancing-script",
        display_name: "Dancing Script",
        has_bold: true,
        has_italic: false,
        has_bold_italic: false,
    },
    Font {
        code: "lobster-two",
        display_name: "Lobster Two",
        has_bold: true,
        has_italic: true,
        has_bold_italic: true,
    },
    Font {
        code: "press-start-2p",
        display_name: "Press Start 2P",
        has_bold: false,
        has_italic: false,
        has_bold_italic: false,
    },
];

impl Font {
    /// Code of the system font.
    pub const DEFAULT_CODE: &'static str = "default";

    /// All fonts, default first.
    pub fn all() -> &'static [Font] {
        &FONTS
    }

    /// Look up a font by code, falling back to the default font.
    pub fn find(code: &str) -> &'static Font {
        FONTS.iter().find(|f| f.code == code).unwrap_or(&FONTS[0])
    }

    /// Whether `code` names a shipped font.
    pub fn is_known(code: &str) -> bool {
        FONTS.iter().any(|f| f.code == code)
    }

    /// Whether the font has a face for `style`.
    pub fn supports(&self, style: TextStyle) -> bool {
        match style {
            TextStyle::Normal => true,
            TextStyle::Bold => self.has_bold,
            TextStyle::Italic => self.has_italic,
            TextStyle::BoldItalic => self.has_bold_italic,
        }
    }
}
