use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-letter Unicode general category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneralCategory {
    #[serde(rename = "Lu")]
    UppercaseLetter,
    #[serde(rename = "Ll")]
    LowercaseLetter,
    #[serde(rename = "Lt")]
    TitlecaseLetter,
    #[serde(rename = "Lm")]
    ModifierLetter,
    #[serde(rename = "Lo")]
    OtherLetter,
    #[serde(rename = "Mn")]
    NonspacingMark,
    #[serde(rename = "Mc")]
    SpacingMark,
    #[serde(rename = "Me")]
    EnclosingMark,
    #[serde(rename = "Nd")]
    DecimalNumber,
    #[serde(rename = "Nl")]
    LetterNumber,
    #[serde(rename = "No")]
    OtherNumber,
    #[serde(rename = "Pc")]
    ConnectorPunctuation,
    #[serde(rename = "Pd")]
    DashPunctuation,
    #[serde(rename = "Ps")]
    OpenPunctuation,
    #[serde(rename = "Pe")]
    ClosePunctuation,
    #[serde(rename = "Pi")]
    InitialPunctuation,
    #[serde(rename = "Pf")]
    FinalPunctuation,
    #[serde(rename = "Po")]
    OtherPunctuation,
    #[serde(rename = "Sm")]
    MathSymbol,
    #[serde(rename = "Sc")]
    CurrencySymbol,
    #[serde(rename = "Sk")]
    ModifierSymbol,
    #[serde(rename = "So")]
    OtherSymbol,
    #[serde(rename = "Zs")]
    SpaceSeparator,
    #[serde(rename = "Zl")]
    LineSeparator,
    #[serde(rename = "Zp")]
    ParagraphSeparator,
    #[serde(rename = "Cc")]
    Control,
    #[serde(rename = "Cf")]
    Format,
    #[serde(rename = "Cs")]
    Surrogate,
    #[serde(rename = "Co")]
    PrivateUse,
    #[serde(rename = "Cn")]
    Unassigned,
}

impl GeneralCategory {
    const ALL: [GeneralCategory; 30] = [
        Self::UppercaseLetter,
        Self::LowercaseLetter,
        Self::TitlecaseLetter,
        Self::ModifierLetter,
        Self::OtherLetter,
        Self::NonspacingMark,
        Self::SpacingMark,
        Self::EnclosingMark,
        Self::DecimalNumber,
        Self::LetterNumber,
        Self::OtherNumber,
        Self::ConnectorPunctuation,
        Self::DashPunctuation,
        Self::OpenPunctuation,
        Self::ClosePunctuation,
        Self::InitialPunctuation,
        Self::FinalPunctuation,
        Self::OtherPunctuation,
        Self::MathSymbol,
        Self::CurrencySymbol,
        Self::ModifierSymbol,
        Self::OtherSymbol,
        Self::SpaceSeparator,
        Self::LineSeparator,
        Self::ParagraphSeparator,
        Self::Control,
        Self::Format,
        Self::Surrogate,
        Self::PrivateUse,
        Self::Unassigned,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::UppercaseLetter => "Lu",
            Self::LowercaseLetter => "Ll",
            Self::TitlecaseLetter => "Lt",
            Self::ModifierLetter => "Lm",
            Self::OtherLetter => "Lo",
            Self::NonspacingMark => "Mn",
            Self::SpacingMark => "Mc",
            Self::EnclosingMark => "Me",
            Self::DecimalNumber => "Nd",
            Self::LetterNumber => "Nl",
            Self::OtherNumber => "No",
            Self::ConnectorPunctuation => "Pc",
            Self::DashPunctuation => "Pd",
            Self::OpenPunctuation => "Ps",
            Self::ClosePunctuation => "Pe",
            Self::InitialPunctuation => "Pi",
            Self::FinalPunctuation => "Pf",
            Self::OtherPunctuation => "Po",
            Self::MathSymbol => "Sm",
            Self::CurrencySymbol => "Sc",
            Self::ModifierSymbol => "Sk",
            Self::OtherSymbol => "So",
            Self::SpaceSeparator => "Zs",
            Self::LineSeparator => "Zl",
            Self::ParagraphSeparator => "Zp",
            Self::Control => "Cc",
            Self::Format => "Cf",
            Self::Surrogate => "Cs",
            Self::PrivateUse => "Co",
            Self::Unassigned => "Cn",
        }
    }

    pub fn is_letter(&self) -> bool {
        matches!(
            self,
            Self::UppercaseLetter
                | Self::LowercaseLetter
                | Self::TitlecaseLetter
                | Self::ModifierLetter
                | Self::OtherLetter
        )
    }

    pub fn is_mark(&self) -> bool {
        matches!(
            self,
            Self::NonspacingMark | Self::SpacingMark | Self::EnclosingMark
        )
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::DecimalNumber | Self::LetterNumber | Self::OtherNumber
        )
    }

    pub fn is_separator(&self) -> bool {
        matches!(
            self,
            Self::SpaceSeparator | Self::LineSeparator | Self::ParagraphSeparator
        )
    }
}

impl FromStr for GeneralCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.code() == s)
            .ok_or_else(|| format!("unknown general category '{}'", s))
    }
}

impl fmt::Display for GeneralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Bidirectional character type from UAX #9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidiClass {
    L,
    R,
    AL,
    EN,
    ES,
    ET,
    AN,
    CS,
    NSM,
    BN,
    B,
    S,
    WS,
    ON,
    LRE,
    LRO,
    RLE,
    RLO,
    PDF,
    LRI,
    RLI,
    FSI,
    PDI,
}

impl BidiClass {
    const ALL: [BidiClass; 23] = [
        Self::L,
        Self::R,
        Self::AL,
        Self::EN,
        Self::ES,
        Self::ET,
        Self::AN,
        Self::CS,
        Self::NSM,
        Self::BN,
        Self::B,
        Self::S,
        Self::WS,
        Self::ON,
        Self::LRE,
        Self::LRO,
        Self::RLE,
        Self::RLO,
        Self::PDF,
        Self::LRI,
        Self::RLI,
        Self::FSI,
        Self::PDI,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::R => "R",
            Self::AL => "AL",
            Self::EN => "EN",
            Self::ES => "ES",
            Self::ET => "ET",
            Self::AN => "AN",
            Self::CS => "CS",
            Self::NSM => "NSM",
            Self::BN => "BN",
            Self::B => "B",
            Self::S => "S",
            Self::WS => "WS",
            Self::ON => "ON",
            Self::LRE => "LRE",
            Self::LRO => "LRO",
            Self::RLE => "RLE",
            Self::RLO => "RLO",
            Self::PDF => "PDF",
            Self::LRI => "LRI",
            Self::RLI => "RLI",
            Self::FSI => "FSI",
            Self::PDI => "PDI",
        }
    }

    /// Strong right-to-left classes.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Self::R | Self::AL)
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::B | Self::S | Self::WS)
    }
}

impl FromStr for BidiClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.code() == s)
            .ok_or_else(|| format!("unknown bidi class '{}'", s))
    }
}

impl fmt::Display for BidiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// UTS #39 identifier status, extended with the two states a dataset can
/// express for codepoints that must never appear in an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentifierStatus {
    Allowed,
    Restricted,
    Disallowed,
    Unassigned,
}

impl FromStr for IdentifierStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allowed" => Ok(Self::Allowed),
            "Restricted" => Ok(Self::Restricted),
            "Disallowed" => Ok(Self::Disallowed),
            "Unassigned" => Ok(Self::Unassigned),
            other => Err(format!("unknown identifier status '{}'", other)),
        }
    }
}

impl fmt::Display for IdentifierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "Allowed"),
            Self::Restricted => write!(f, "Restricted"),
            Self::Disallowed => write!(f, "Disallowed"),
            Self::Unassigned => write!(f, "Unassigned"),
        }
    }
}
