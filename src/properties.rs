//! Ready-made [`PropertySpec`]s for common UCD files.
//!
//! Enumerated properties are decoded by exact name through a [`ValueMap`]
//! built once per spec; prefix matching would confuse values such as `L`,
//! `LV` and `LVT`.  Binary properties that share a file (PropList,
//! DerivedCoreProperties) are stored as bit flags and merged with bitwise OR.

use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, info};

use crate::codegen::TableValue;
use crate::error::{LoadError, SkipReason};
use crate::lexical::{parse_hex, parse_range};
use crate::loader::{FieldLayout, PropertySpec, TableSizing};
use crate::record::{Lines, Record};
use crate::table::InsertPolicy;
use crate::types::Interval;

/// A mapping from canonical UCD value names to stored values.
pub struct ValueMap<V> {
    names: BTreeMap<&'static str, V>,
}

impl<V: Copy> ValueMap<V> {
    pub fn new(entries: &[(&'static str, V)]) -> ValueMap<V> {
        ValueMap {
            names: entries.iter().copied().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<V> {
        self.names.get(name).copied()
    }

    /// A decoder that yields `None` for unknown names.
    pub fn into_decoder(self) -> impl Fn(&str) -> Option<V> + Send + Sync + 'static
    where
        V: Send + Sync + 'static,
    {
        move |name| self.get(name)
    }

    /// A decoder that maps unknown names to `fallback`.
    pub fn into_decoder_or(self, fallback: V) -> impl Fn(&str) -> Option<V> + Send + Sync + 'static
    where
        V: Send + Sync + 'static,
    {
        move |name| Some(self.get(name).unwrap_or(fallback))
    }
}

macro_rules! property_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every value with its name as written in the UCD.
            pub const NAMES: &'static [(&'static str, $name)] = &[$(($value, $name::$variant),)+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn value_map() -> ValueMap<$name> {
                ValueMap::new(Self::NAMES)
            }
        }

        impl quote::ToTokens for $name {
            fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
                let ordinal = *self as u8;
                tokens.extend(quote::quote! { #ordinal });
            }
        }

        impl TableValue for $name {
            fn value_type() -> proc_macro2::TokenStream {
                quote::quote! { u8 }
            }
        }
    };
}

property_enum! {
    /// `Grapheme_Cluster_Break`, from `GraphemeBreakProperty.txt`.
    pub enum GraphemeClusterBreak {
        Other = "Other",
        CR = "CR",
        LF = "LF",
        Control = "Control",
        Extend = "Extend",
        ZWJ = "ZWJ",
        RegionalIndicator = "Regional_Indicator",
        Prepend = "Prepend",
        SpacingMark = "SpacingMark",
        L = "L",
        V = "V",
        T = "T",
        LV = "LV",
        LVT = "LVT",
        ExtendedPictographic = "Extended_Pictographic",
    }
}

property_enum! {
    /// `Word_Break`, from `WordBreakProperty.txt`.
    pub enum WordBreak {
        Other = "Other",
        CR = "CR",
        LF = "LF",
        Newline = "Newline",
        Extend = "Extend",
        ZWJ = "ZWJ",
        RegionalIndicator = "Regional_Indicator",
        Format = "Format",
        Katakana = "Katakana",
        HebrewLetter = "Hebrew_Letter",
        ALetter = "ALetter",
        SingleQuote = "Single_Quote",
        DoubleQuote = "Double_Quote",
        MidNumLet = "MidNumLet",
        MidLetter = "MidLetter",
        MidNum = "MidNum",
        Numeric = "Numeric",
        ExtendNumLet = "ExtendNumLet",
        WSegSpace = "WSegSpace",
    }
}

property_enum! {
    /// `Sentence_Break`, from `SentenceBreakProperty.txt`.
    pub enum SentenceBreak {
        Other = "Other",
        CR = "CR",
        LF = "LF",
        Extend = "Extend",
        Sep = "Sep",
        Format = "Format",
        Sp = "Sp",
        Lower = "Lower",
        Upper = "Upper",
        OLetter = "OLetter",
        Numeric = "Numeric",
        ATerm = "ATerm",
        SContinue = "SContinue",
        STerm = "STerm",
        Close = "Close",
    }
}

property_enum! {
    /// `Line_Break`, from `LineBreak.txt`.  Unknown values map to `XX`.
    pub enum LineBreak {
        BK = "BK",
        CR = "CR",
        LF = "LF",
        CM = "CM",
        SG = "SG",
        GL = "GL",
        CB = "CB",
        SP = "SP",
        ZW = "ZW",
        NL = "NL",
        WJ = "WJ",
        JL = "JL",
        JV = "JV",
        JT = "JT",
        H2 = "H2",
        H3 = "H3",
        XX = "XX",
        OP = "OP",
        CL = "CL",
        CP = "CP",
        QU = "QU",
        NS = "NS",
        EX = "EX",
        SY = "SY",
        IS = "IS",
        PR = "PR",
        PO = "PO",
        NU = "NU",
        AL = "AL",
        ID = "ID",
        IN = "IN",
        HY = "HY",
        BA = "BA",
        BB = "BB",
        B2 = "B2",
        ZWJ = "ZWJ",
        EB = "EB",
        EM = "EM",
        AI = "AI",
        CJ = "CJ",
        RI = "RI",
        SA = "SA",
        HL = "HL",
    }
}

property_enum! {
    /// `East_Asian_Width`, from `EastAsianWidth.txt`.
    pub enum EastAsianWidth {
        Neutral = "N",
        Wide = "W",
        Fullwidth = "F",
        Narrow = "Na",
        Halfwidth = "H",
        Ambiguous = "A",
    }
}

property_enum! {
    /// `Vertical_Orientation`, from `VerticalOrientation.txt`.
    pub enum VerticalOrientation {
        Rotated = "R",
        Upright = "U",
        TransformedUpright = "Tu",
        TransformedRotated = "Tr",
    }
}

property_enum! {
    /// `Joining_Type`, from field 2 of `ArabicShaping.txt`.
    pub enum JoiningType {
        NonJoining = "U",
        LeftJoining = "L",
        RightJoining = "R",
        DualJoining = "D",
        JoinCausing = "C",
        Transparent = "T",
    }
}

property_enum! {
    /// `General_Category`, from `DerivedGeneralCategory.txt`.
    pub enum GeneralCategory {
        UppercaseLetter = "Lu",
        LowercaseLetter = "Ll",
        TitlecaseLetter = "Lt",
        ModifierLetter = "Lm",
        OtherLetter = "Lo",
        NonspacingMark = "Mn",
        SpacingMark = "Mc",
        EnclosingMark = "Me",
        DecimalNumber = "Nd",
        LetterNumber = "Nl",
        OtherNumber = "No",
        ConnectorPunctuation = "Pc",
        DashPunctuation = "Pd",
        OpenPunctuation = "Ps",
        ClosePunctuation = "Pe",
        InitialPunctuation = "Pi",
        FinalPunctuation = "Pf",
        OtherPunctuation = "Po",
        MathSymbol = "Sm",
        CurrencySymbol = "Sc",
        ModifierSymbol = "Sk",
        OtherSymbol = "So",
        SpaceSeparator = "Zs",
        LineSeparator = "Zl",
        ParagraphSeparator = "Zp",
        Control = "Cc",
        Format = "Cf",
        Surrogate = "Cs",
        PrivateUse = "Co",
        Unassigned = "Cn",
    }
}

property_enum! {
    /// `Bidi_Class`, from `DerivedBidiClass.txt`.
    pub enum BidiClass {
        LeftToRight = "L",
        RightToLeft = "R",
        ArabicLetter = "AL",
        EuropeanNumber = "EN",
        EuropeanSeparator = "ES",
        EuropeanTerminator = "ET",
        ArabicNumber = "AN",
        CommonSeparator = "CS",
        NonspacingMark = "NSM",
        BoundaryNeutral = "BN",
        ParagraphSeparator = "B",
        SegmentSeparator = "S",
        WhiteSpace = "WS",
        OtherNeutral = "ON",
        LeftToRightEmbedding = "LRE",
        LeftToRightOverride = "LRO",
        RightToLeftEmbedding = "RLE",
        RightToLeftOverride = "RLO",
        PopDirectionalFormat = "PDF",
        LeftToRightIsolate = "LRI",
        RightToLeftIsolate = "RLI",
        FirstStrongIsolate = "FSI",
        PopDirectionalIsolate = "PDI",
    }
}

property_enum! {
    /// `Script`, from `Scripts.txt`.  Only widely used scripts are told
    /// apart; the rest are `Untracked`.
    pub enum Script {
        Untracked = "Untracked",
        Common = "Common",
        Inherited = "Inherited",
        Latin = "Latin",
        Greek = "Greek",
        Cyrillic = "Cyrillic",
        Armenian = "Armenian",
        Hebrew = "Hebrew",
        Arabic = "Arabic",
        Syriac = "Syriac",
        Devanagari = "Devanagari",
        Bengali = "Bengali",
        Tamil = "Tamil",
        Thai = "Thai",
        Georgian = "Georgian",
        Hangul = "Hangul",
        Ethiopic = "Ethiopic",
        Hiragana = "Hiragana",
        Katakana = "Katakana",
        Han = "Han",
    }
}

property_enum! {
    /// `Hangul_Syllable_Type`, from `HangulSyllableType.txt`.
    pub enum HangulSyllableType {
        LeadingJamo = "L",
        VowelJamo = "V",
        TrailingJamo = "T",
        LvSyllable = "LV",
        LvtSyllable = "LVT",
    }
}

bitflags! {
    /// Binary properties from `PropList.txt`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct PropList: u32 {
        const WHITE_SPACE = 1 << 0;
        const BIDI_CONTROL = 1 << 1;
        const JOIN_CONTROL = 1 << 2;
        const DASH = 1 << 3;
        const HYPHEN = 1 << 4;
        const QUOTATION_MARK = 1 << 5;
        const TERMINAL_PUNCTUATION = 1 << 6;
        const OTHER_MATH = 1 << 7;
        const HEX_DIGIT = 1 << 8;
        const ASCII_HEX_DIGIT = 1 << 9;
        const OTHER_ALPHABETIC = 1 << 10;
        const IDEOGRAPHIC = 1 << 11;
        const DIACRITIC = 1 << 12;
        const EXTENDER = 1 << 13;
        const OTHER_LOWERCASE = 1 << 14;
        const OTHER_UPPERCASE = 1 << 15;
        const NONCHARACTER_CODE_POINT = 1 << 16;
        const PATTERN_WHITE_SPACE = 1 << 17;
        const PATTERN_SYNTAX = 1 << 18;
        const REGIONAL_INDICATOR = 1 << 19;
        const SENTENCE_TERMINAL = 1 << 20;
        const VARIATION_SELECTOR = 1 << 21;
        const PREPENDED_CONCATENATION_MARK = 1 << 22;
    }
}

impl PropList {
    pub const NAMES: &'static [(&'static str, PropList)] = &[
        ("White_Space", PropList::WHITE_SPACE),
        ("Bidi_Control", PropList::BIDI_CONTROL),
        ("Join_Control", PropList::JOIN_CONTROL),
        ("Dash", PropList::DASH),
        ("Hyphen", PropList::HYPHEN),
        ("Quotation_Mark", PropList::QUOTATION_MARK),
        ("Terminal_Punctuation", PropList::TERMINAL_PUNCTUATION),
        ("Other_Math", PropList::OTHER_MATH),
        ("Hex_Digit", PropList::HEX_DIGIT),
        ("ASCII_Hex_Digit", PropList::ASCII_HEX_DIGIT),
        ("Other_Alphabetic", PropList::OTHER_ALPHABETIC),
        ("Ideographic", PropList::IDEOGRAPHIC),
        ("Diacritic", PropList::DIACRITIC),
        ("Extender", PropList::EXTENDER),
        ("Other_Lowercase", PropList::OTHER_LOWERCASE),
        ("Other_Uppercase", PropList::OTHER_UPPERCASE),
        ("Noncharacter_Code_Point", PropList::NONCHARACTER_CODE_POINT),
        ("Pattern_White_Space", PropList::PATTERN_WHITE_SPACE),
        ("Pattern_Syntax", PropList::PATTERN_SYNTAX),
        ("Regional_Indicator", PropList::REGIONAL_INDICATOR),
        ("Sentence_Terminal", PropList::SENTENCE_TERMINAL),
        ("Variation_Selector", PropList::VARIATION_SELECTOR),
        ("Prepended_Concatenation_Mark", PropList::PREPENDED_CONCATENATION_MARK),
    ];
}

bitflags! {
    /// Binary properties from `DerivedCoreProperties.txt`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct CoreProperties: u32 {
        const MATH = 1 << 0;
        const ALPHABETIC = 1 << 1;
        const LOWERCASE = 1 << 2;
        const UPPERCASE = 1 << 3;
        const CASED = 1 << 4;
        const CASE_IGNORABLE = 1 << 5;
        const CHANGES_WHEN_LOWERCASED = 1 << 6;
        const CHANGES_WHEN_UPPERCASED = 1 << 7;
        const CHANGES_WHEN_TITLECASED = 1 << 8;
        const CHANGES_WHEN_CASEFOLDED = 1 << 9;
        const CHANGES_WHEN_CASEMAPPED = 1 << 10;
        const ID_START = 1 << 11;
        const ID_CONTINUE = 1 << 12;
        const XID_START = 1 << 13;
        const XID_CONTINUE = 1 << 14;
        const DEFAULT_IGNORABLE_CODE_POINT = 1 << 15;
        const GRAPHEME_EXTEND = 1 << 16;
        const GRAPHEME_BASE = 1 << 17;
    }
}

impl CoreProperties {
    pub const NAMES: &'static [(&'static str, CoreProperties)] = &[
        ("Math", CoreProperties::MATH),
        ("Alphabetic", CoreProperties::ALPHABETIC),
        ("Lowercase", CoreProperties::LOWERCASE),
        ("Uppercase", CoreProperties::UPPERCASE),
        ("Cased", CoreProperties::CASED),
        ("Case_Ignorable", CoreProperties::CASE_IGNORABLE),
        ("Changes_When_Lowercased", CoreProperties::CHANGES_WHEN_LOWERCASED),
        ("Changes_When_Uppercased", CoreProperties::CHANGES_WHEN_UPPERCASED),
        ("Changes_When_Titlecased", CoreProperties::CHANGES_WHEN_TITLECASED),
        ("Changes_When_Casefolded", CoreProperties::CHANGES_WHEN_CASEFOLDED),
        ("Changes_When_Casemapped", CoreProperties::CHANGES_WHEN_CASEMAPPED),
        ("ID_Start", CoreProperties::ID_START),
        ("ID_Continue", CoreProperties::ID_CONTINUE),
        ("XID_Start", CoreProperties::XID_START),
        ("XID_Continue", CoreProperties::XID_CONTINUE),
        ("Default_Ignorable_Code_Point", CoreProperties::DEFAULT_IGNORABLE_CODE_POINT),
        ("Grapheme_Extend", CoreProperties::GRAPHEME_EXTEND),
        ("Grapheme_Base", CoreProperties::GRAPHEME_BASE),
    ];
}

bitflags! {
    /// Emoji properties from `emoji-data.txt`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EmojiProperties: u8 {
        const EMOJI = 1 << 0;
        const EMOJI_PRESENTATION = 1 << 1;
        const EMOJI_MODIFIER = 1 << 2;
        const EMOJI_MODIFIER_BASE = 1 << 3;
        const EMOJI_COMPONENT = 1 << 4;
        const EXTENDED_PICTOGRAPHIC = 1 << 5;
    }
}

impl EmojiProperties {
    pub const NAMES: &'static [(&'static str, EmojiProperties)] = &[
        ("Emoji", EmojiProperties::EMOJI),
        ("Emoji_Presentation", EmojiProperties::EMOJI_PRESENTATION),
        ("Emoji_Modifier", EmojiProperties::EMOJI_MODIFIER),
        ("Emoji_Modifier_Base", EmojiProperties::EMOJI_MODIFIER_BASE),
        ("Emoji_Component", EmojiProperties::EMOJI_COMPONENT),
        ("Extended_Pictographic", EmojiProperties::EXTENDED_PICTOGRAPHIC),
    ];
}

macro_rules! flags_to_tokens {
    ($($name:ident: $bits:ident),+) => {
        $(
            impl quote::ToTokens for $name {
                fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
                    let bits = self.bits();
                    tokens.extend(quote::quote! { #bits });
                }
            }

            impl TableValue for $name {
                fn value_type() -> proc_macro2::TokenStream {
                    quote::quote! { $bits }
                }
            }
        )+
    };
}

flags_to_tokens!(PropList: u32, CoreProperties: u32, EmojiProperties: u8);

pub fn grapheme_cluster_break() -> PropertySpec<GraphemeClusterBreak> {
    PropertySpec::new(
        "grapheme break",
        FieldLayout::RANGE_VALUE,
        GraphemeClusterBreak::value_map().into_decoder_or(GraphemeClusterBreak::Other),
    )
    .sizing(TableSizing::Estimate(20_000))
}

pub fn word_break() -> PropertySpec<WordBreak> {
    PropertySpec::new(
        "word break",
        FieldLayout::RANGE_VALUE,
        WordBreak::value_map().into_decoder_or(WordBreak::Other),
    )
    .sizing(TableSizing::Estimate(40_000))
}

pub fn sentence_break() -> PropertySpec<SentenceBreak> {
    PropertySpec::new(
        "sentence break",
        FieldLayout::RANGE_VALUE,
        SentenceBreak::value_map().into_decoder_or(SentenceBreak::Other),
    )
    .sizing(TableSizing::Estimate(40_000))
}

pub fn line_break() -> PropertySpec<LineBreak> {
    PropertySpec::new(
        "line break",
        FieldLayout::RANGE_VALUE,
        LineBreak::value_map().into_decoder_or(LineBreak::XX),
    )
    .sizing(TableSizing::Estimate(400_000))
}

pub fn east_asian_width() -> PropertySpec<EastAsianWidth> {
    PropertySpec::new(
        "east asian width",
        FieldLayout::RANGE_VALUE,
        EastAsianWidth::value_map().into_decoder(),
    )
    .sizing(TableSizing::Estimate(400_000))
}

pub fn vertical_orientation() -> PropertySpec<VerticalOrientation> {
    PropertySpec::new(
        "vertical orientation",
        FieldLayout::RANGE_VALUE,
        VerticalOrientation::value_map().into_decoder(),
    )
    .sizing(TableSizing::Estimate(400_000))
}

/// `ArabicShaping.txt`: `<code>; <name>; <joining type>; <joining group>`.
pub fn joining_type() -> PropertySpec<JoiningType> {
    PropertySpec::new(
        "joining type",
        FieldLayout {
            min_fields: 4,
            key_field: 0,
            value_field: 2,
        },
        JoiningType::value_map().into_decoder(),
    )
    .sizing(TableSizing::Estimate(1024))
}

pub fn prop_list() -> PropertySpec<PropList> {
    PropertySpec::new(
        "property list",
        FieldLayout::RANGE_VALUE,
        ValueMap::new(PropList::NAMES).into_decoder(),
    )
    .policy(InsertPolicy::merge_bits())
    .sizing(TableSizing::Estimate(200_000))
}

pub fn derived_core_properties() -> PropertySpec<CoreProperties> {
    PropertySpec::new(
        "derived core property",
        FieldLayout::RANGE_VALUE,
        ValueMap::new(CoreProperties::NAMES).into_decoder(),
    )
    .policy(InsertPolicy::merge_bits())
    .sizing(TableSizing::Estimate(400_000))
}

/// Extended_Pictographic code points from `emoji-data.txt`, as grapheme
/// break values.  Meant for [`load_supplement`] over a table loaded with
/// [`grapheme_cluster_break`]; code points that already have a break value
/// keep it.
///
/// [`load_supplement`]: crate::loader::load_supplement
pub fn extended_pictographic() -> PropertySpec<GraphemeClusterBreak> {
    PropertySpec::new("grapheme break", FieldLayout::RANGE_VALUE, |_| {
        Some(GraphemeClusterBreak::ExtendedPictographic)
    })
    .filter(1, &["Extended_Pictographic"])
    .policy(InsertPolicy::KeepFirst)
    .sizing(TableSizing::Estimate(4000))
}

pub fn emoji_properties() -> PropertySpec<EmojiProperties> {
    PropertySpec::new(
        "emoji property",
        FieldLayout::RANGE_VALUE,
        ValueMap::new(EmojiProperties::NAMES).into_decoder(),
    )
    .policy(InsertPolicy::merge_bits())
    .sizing(TableSizing::Estimate(4000))
}

pub fn general_category() -> PropertySpec<GeneralCategory> {
    PropertySpec::new(
        "derived general category",
        FieldLayout::RANGE_VALUE,
        GeneralCategory::value_map().into_decoder(),
    )
    .sizing(TableSizing::Estimate(1 << 20))
}

pub fn bidi_class() -> PropertySpec<BidiClass> {
    PropertySpec::new(
        "derived bidi class",
        FieldLayout::RANGE_VALUE,
        BidiClass::value_map().into_decoder(),
    )
    .sizing(TableSizing::Estimate(400_000))
}

pub fn scripts() -> PropertySpec<Script> {
    PropertySpec::new(
        "script",
        FieldLayout::RANGE_VALUE,
        Script::value_map().into_decoder_or(Script::Untracked),
    )
    .sizing(TableSizing::Estimate(200_000))
}

pub fn hangul_syllable_type() -> PropertySpec<HangulSyllableType> {
    PropertySpec::new(
        "hangul syllable type",
        FieldLayout::RANGE_VALUE,
        HangulSyllableType::value_map().into_decoder(),
    )
    .sizing(TableSizing::Estimate(12_000))
}

/// Parse a field that must be exactly one hex code point.
fn single_code_point(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    Some(parse_hex(text))
}

/// Simple case folding from `CaseFolding.txt`: statuses `C` (common) and `S`
/// (simple) only.  The first mapping recorded for a code point is kept.
pub fn case_folding() -> PropertySpec<u32> {
    PropertySpec::new(
        "case folding",
        FieldLayout {
            min_fields: 3,
            key_field: 0,
            value_field: 2,
        },
        single_code_point,
    )
    // Simple foldings only; full (`F`) foldings map to several code points.
    .filter(1, &["C", "S"])
    .policy(InsertPolicy::KeepFirst)
    .sizing(TableSizing::Estimate(1600))
}

/// `BidiMirroring.txt`: `<code>; <mirrored code>`.
pub fn bidi_mirroring() -> PropertySpec<u32> {
    PropertySpec::new(
        "bidi mirroring",
        FieldLayout::RANGE_VALUE,
        single_code_point,
    )
    .sizing(TableSizing::Estimate(600))
}

/// An entry of `BidiBrackets.txt`: the paired bracket and whether this one
/// opens the pair.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct BidiBracket {
    pub pair: u32,
    pub opening: bool,
}

impl quote::ToTokens for BidiBracket {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let BidiBracket { pair, opening } = *self;
        tokens.extend(quote::quote! { (#pair, #opening) });
    }
}

impl TableValue for BidiBracket {
    fn value_type() -> proc_macro2::TokenStream {
        quote::quote! { (u32, bool) }
    }
}

/// `BidiBrackets.txt`: `<code>; <paired bracket>; <o or c>`.
pub fn bidi_brackets() -> PropertySpec<BidiBracket> {
    PropertySpec::from_record(
        "bidi bracket",
        FieldLayout {
            min_fields: 3,
            key_field: 0,
            value_field: 1,
        },
        |record| {
            let pair = single_code_point(record.field(1)?)?;
            let opening = match record.field(2)? {
                "o" => true,
                "c" => false,
                _ => return None,
            };
            Some(BidiBracket { pair, opening })
        },
    )
    .sizing(TableSizing::Estimate(128))
}

/// `DerivedCombiningClass.txt`: decimal canonical combining classes.
pub fn combining_class() -> PropertySpec<u8> {
    PropertySpec::new(
        "derived combining class",
        FieldLayout::RANGE_VALUE,
        |value| value.parse::<u8>().ok(),
    )
    .sizing(TableSizing::Estimate(1000))
}

/// `DerivedAge.txt`: version `major.minor` stored as `major * 10 + minor`.
pub fn derived_age() -> PropertySpec<u16> {
    PropertySpec::new("derived age", FieldLayout::RANGE_VALUE, |value| {
        let (major, minor) = value.split_once('.').unwrap_or((value, "0"));
        let major = major.parse::<u16>().ok()?;
        let minor = minor.parse::<u16>().ok()?;
        major.checked_mul(10)?.checked_add(minor)
    })
    .sizing(TableSizing::Estimate(300_000))
}

/// `DerivedNumericValues.txt`: the decimal value in field 1.  `inf` and
/// `NaN` are not numeric values.
pub fn numeric_values() -> PropertySpec<f64> {
    PropertySpec::new("derived numeric value", FieldLayout::RANGE_VALUE, |value| {
        value.parse::<f64>().ok().filter(|value| value.is_finite())
    })
    .sizing(TableSizing::Estimate(2000))
}

/// A character name from `DerivedName.txt`.
///
/// Ranges of ideographs share a name pattern ending in `*`, which stands for
/// the code point in hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharacterName {
    Fixed(Arc<str>),
    Prefixed(Arc<str>),
}

impl CharacterName {
    pub fn parse(text: &str) -> Option<CharacterName> {
        if text.is_empty() {
            return None;
        }
        Some(match text.strip_suffix('*') {
            Some(prefix) => CharacterName::Prefixed(prefix.into()),
            None => CharacterName::Fixed(text.into()),
        })
    }

    /// The full name of `code`.
    pub fn for_code_point(&self, code: u32) -> String {
        match self {
            CharacterName::Fixed(name) => name.to_string(),
            CharacterName::Prefixed(prefix) => format!("{prefix}{code:04X}"),
        }
    }
}

pub fn derived_name() -> PropertySpec<CharacterName> {
    PropertySpec::new("derived name", FieldLayout::RANGE_VALUE, CharacterName::parse)
        .sizing(TableSizing::Estimate(300_000))
}

/// A named block from `Blocks.txt`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub range: Interval,
    pub name: String,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; {}", self.range, self.name)
    }
}

/// The blocks of the code space, sorted by start.  Blocks are few and large,
/// so they are kept as ranges rather than expanded into a table.
#[derive(Clone, Debug, Default)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    /// Read `Blocks.txt`.  Malformed lines and blocks overlapping an earlier
    /// one are skipped.
    pub fn load<R: BufRead>(reader: R, source: &str) -> Result<BlockList, LoadError> {
        let mut blocks: Vec<Block> = Vec::new();
        for line in Lines::new(reader) {
            let line = line?;
            let Some(record) = Record::parse(&line.text) else {
                continue;
            };
            let block = record.require(2).and_then(|()| {
                let range = parse_range(record.fields[0]);
                if !range.is_valid() {
                    return Err(SkipReason::InvalidRange);
                }
                if record.fields[1].is_empty() {
                    return Err(SkipReason::UnknownValue);
                }
                Ok(Block {
                    range,
                    name: record.fields[1].to_string(),
                })
            });
            match block {
                Ok(block) => {
                    let overlaps = blocks.iter().any(|other| {
                        block.range.start <= other.range.end && other.range.start <= block.range.end
                    });
                    if overlaps {
                        debug!(line = line.number, %block, "skipped overlapping block");
                    } else {
                        blocks.push(block);
                    }
                }
                Err(reason) => {
                    debug!(line = line.number, text = %line.text, "skipped record: {reason}")
                }
            }
        }
        blocks.sort_by_key(|block| block.range.start);
        info!("parsed {} block entries from {}", blocks.len(), source);
        Ok(BlockList { blocks })
    }

    /// The block containing `code`, if any.
    pub fn lookup(&self, code: u32) -> Option<&Block> {
        let index = self
            .blocks
            .partition_point(|block| block.range.end < code);
        self.blocks
            .get(index)
            .filter(|block| block.range.contains(code))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

#[cfg(test)]
use crate::loader::load;

#[cfg(test)]
static GRAPHEME_BREAK_TXT: &str = include_str!("data/GraphemeBreakProperty.txt");

#[cfg(test)]
static PROP_LIST_TXT: &str = include_str!("data/PropList.txt");

#[cfg(test)]
static CASE_FOLDING_TXT: &str = include_str!("data/CaseFolding.txt");

#[cfg(test)]
static BLOCKS_TXT: &str = include_str!("data/Blocks.txt");

#[cfg(test)]
static EMOJI_DATA_TXT: &str = include_str!("data/emoji-data.txt");

#[test]
fn grapheme_break_values() {
    let loaded = load(&grapheme_cluster_break(), GRAPHEME_BREAK_TXT.as_bytes(), "GraphemeBreakProperty.txt")
        .expect("loads");

    assert_eq!(loaded.get(0x000D), Some(&GraphemeClusterBreak::CR));
    assert_eq!(loaded.get(0x000A), Some(&GraphemeClusterBreak::LF));
    assert_eq!(loaded.get(0x0000), Some(&GraphemeClusterBreak::Control));
    assert_eq!(loaded.get(0x0300), Some(&GraphemeClusterBreak::Extend));
    assert_eq!(loaded.get(0x1100), Some(&GraphemeClusterBreak::L));
    assert_eq!(loaded.get(0xAC00), Some(&GraphemeClusterBreak::LV));
    assert_eq!(loaded.get(0xAC01), Some(&GraphemeClusterBreak::LVT));
    assert_eq!(loaded.get(0x1F1E6), Some(&GraphemeClusterBreak::RegionalIndicator));
    assert_eq!(loaded.get(0x0041), None);

    // 32 C0 controls, 112 combining marks, 19 leading jamo, 26 regional
    // indicators and two Hangul syllables.
    let report = loaded.report();
    assert_eq!(report.skipped, 0);
    assert_eq!(report.inserted, 32 + 112 + 19 + 26 + 2);
    assert_eq!(report.entries, report.inserted);
}

#[test]
fn unknown_break_values_fall_back_to_other() {
    let loaded = load(&word_break(), "0041 ; Not_A_Value\n".as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.get(0x41), Some(&WordBreak::Other));
}

#[test]
fn exact_names_not_prefixes() {
    let map = GraphemeClusterBreak::value_map();
    assert_eq!(map.get("L"), Some(GraphemeClusterBreak::L));
    assert_eq!(map.get("LV"), Some(GraphemeClusterBreak::LV));
    assert_eq!(map.get("LVT"), Some(GraphemeClusterBreak::LVT));
    assert_eq!(map.get("LVTX"), None);

    let widths = EastAsianWidth::value_map();
    assert_eq!(widths.get("N"), Some(EastAsianWidth::Neutral));
    assert_eq!(widths.get("Na"), Some(EastAsianWidth::Narrow));
    assert_eq!(EastAsianWidth::Narrow.name(), "Na");
}

#[test]
fn prop_list_flags_merge() {
    let loaded = load(&prop_list(), PROP_LIST_TXT.as_bytes(), "PropList.txt").expect("loads");

    assert_eq!(loaded.get(0x0020), Some(&PropList::WHITE_SPACE.union(PropList::PATTERN_WHITE_SPACE)));
    assert_eq!(loaded.get(0x0009), Some(&PropList::WHITE_SPACE.union(PropList::PATTERN_WHITE_SPACE)));
    assert_eq!(loaded.get(0x00A0), Some(&PropList::WHITE_SPACE));
    assert_eq!(loaded.get(0x200D), Some(&PropList::JOIN_CONTROL));
    assert_eq!(
        loaded.get(0x0041),
        Some(&PropList::HEX_DIGIT.union(PropList::ASCII_HEX_DIGIT))
    );
    assert_eq!(loaded.get(0x0047), None);

    // `Logical_Order_Exception` is not tracked.
    assert_eq!(loaded.report().skipped, 1);
    assert_eq!(loaded.get(0x0E40), None);
}

#[test]
fn case_folding_statuses() {
    let loaded = load(&case_folding(), CASE_FOLDING_TXT.as_bytes(), "CaseFolding.txt").expect("loads");

    assert_eq!(loaded.get(0x0041), Some(&0x0061));
    assert_eq!(loaded.get(0x00B5), Some(&0x03BC));
    assert_eq!(loaded.get(0x1E9E), Some(&0x00DF));
    // Full (`F`) and Turkic (`T`) foldings are not simple foldings.
    assert_eq!(loaded.get(0x00DF), None);
    assert_eq!(loaded.get(0x0049), Some(&0x0069));
    assert_eq!(loaded.report().skipped, 3);
}

#[test]
fn numeric_fields() {
    let input = "0300..0314    ; 230 # Mn  [21] COMBINING GRAVE ACCENT..COMBINING REVERSED COMMA ABOVE\n0334 ; 1\n";
    let loaded = load(&combining_class(), input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.get(0x0301), Some(&230));
    assert_eq!(loaded.get(0x0334), Some(&1));

    let input = "0000..001F    ; 1.1 #  [32] <control-0000>..<control-001F>\n1F6DC ; 15.0\n";
    let loaded = load(&derived_age(), input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.get(0x0000), Some(&11));
    assert_eq!(loaded.get(0x1F6DC), Some(&150));

    let input = "0030 ; 0.0 ; ; 0 # Nd DIGIT ZERO\n00BD ; 0.5 ; ; 1/2 # No VULGAR FRACTION ONE HALF\n";
    let loaded = load(&numeric_values(), input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.get(0x00BD), Some(&0.5));

    let input = "0030 ; inf\n0031 ; NaN\n0032 ; 2.0\n";
    let loaded = load(&numeric_values(), input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.get(0x30), None);
    assert_eq!(loaded.get(0x31), None);
    assert_eq!(loaded.get(0x32), Some(&2.0));
    assert_eq!(loaded.report().skipped, 2);
}

#[test]
fn joining_types_from_arabic_shaping() {
    let input = "0620; YEH WITH RING; D; YEH\n0622; ALEF WITH MADDA ABOVE; R; ALEF\n0640; TATWEEL; C; No_Joining_Group\n";
    let loaded = load(&joining_type(), input.as_bytes(), "ArabicShaping.txt").expect("loads");
    assert_eq!(loaded.get(0x0620), Some(&JoiningType::DualJoining));
    assert_eq!(loaded.get(0x0622), Some(&JoiningType::RightJoining));
    assert_eq!(loaded.get(0x0640), Some(&JoiningType::JoinCausing));
}

#[test]
fn name_patterns() {
    let input = "0020          ; SPACE\n4E00..9FFF    ; CJK UNIFIED IDEOGRAPH-*\n";
    let loaded = load(&derived_name(), input.as_bytes(), "DerivedName.txt").expect("loads");
    let name = |code| loaded.get(code).map(|name| name.for_code_point(code));
    assert_eq!(name(0x20).as_deref(), Some("SPACE"));
    assert_eq!(name(0x4E2D).as_deref(), Some("CJK UNIFIED IDEOGRAPH-4E2D"));
    assert_eq!(name(0x41), None);
}

#[test]
fn blocks_by_range() {
    let blocks = BlockList::load(BLOCKS_TXT.as_bytes(), "Blocks.txt").expect("loads");
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks.lookup(0x41).map(|block| block.name.as_str()), Some("Basic Latin"));
    assert_eq!(blocks.lookup(0xE9).map(|block| block.name.as_str()), Some("Latin-1 Supplement"));
    assert_eq!(blocks.lookup(0x0300).map(|block| block.name.as_str()), Some("Combining Diacritical Marks"));
    assert_eq!(blocks.lookup(0x1F600).map(|block| block.name.as_str()), Some("Emoticons"));
    assert_eq!(blocks.lookup(0x0250), None, "IPA Extensions is not in the excerpt");
    let starts = blocks.iter().map(|block| block.range.start).collect::<Vec<_>>();
    assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn pictographs_join_grapheme_breaks() {
    use crate::loader::load_supplement;

    let breaks = load(&grapheme_cluster_break(), GRAPHEME_BREAK_TXT.as_bytes(), "GraphemeBreakProperty.txt")
        .expect("loads");
    let breaks = load_supplement(breaks, &extended_pictographic(), EMOJI_DATA_TXT.as_bytes(), "emoji-data.txt")
        .expect("loads");

    assert_eq!(breaks.get(0x00A9), Some(&GraphemeClusterBreak::ExtendedPictographic));
    assert_eq!(breaks.get(0x1F600), Some(&GraphemeClusterBreak::ExtendedPictographic));
    assert_eq!(breaks.get(0x1F1E6), Some(&GraphemeClusterBreak::RegionalIndicator));
    assert_eq!(breaks.get(0x0023), None);

    let report = breaks.report();
    assert_eq!(report.skipped, 7, "records for other emoji properties");
    assert_eq!(report.entries, 191 + 81);
}

#[test]
fn emoji_flags_merge() {
    let loaded = load(&emoji_properties(), EMOJI_DATA_TXT.as_bytes(), "emoji-data.txt").expect("loads");
    assert_eq!(
        loaded.get(0x1F600),
        Some(
            &(EmojiProperties::EMOJI
                | EmojiProperties::EMOJI_PRESENTATION
                | EmojiProperties::EXTENDED_PICTOGRAPHIC)
        )
    );
    assert_eq!(
        loaded.get(0x0023),
        Some(&(EmojiProperties::EMOJI | EmojiProperties::EMOJI_COMPONENT))
    );
    assert_eq!(loaded.get(0x1F3FB), Some(&EmojiProperties::EMOJI_MODIFIER));
    assert_eq!(loaded.report().skipped, 0);
}

#[test]
fn general_categories_and_bidi_classes() {
    let input = "\
0000..001F    ; Cc #  [32] <control-0000>..<control-001F>
0041..005A    ; Lu #  [26] LATIN CAPITAL LETTER A..LATIN CAPITAL LETTER Z
01C5          ; Lt #       LATIN CAPITAL LETTER D WITH SMALL LETTER Z WITH CARON
0300..036F    ; Mn # [112] COMBINING GRAVE ACCENT..COMBINING LATIN SMALL LETTER X
0378          ; Xx # not a category
";
    let loaded = load(&general_category(), input.as_bytes(), "DerivedGeneralCategory.txt").expect("loads");
    assert_eq!(loaded.get(0x0007), Some(&GeneralCategory::Control));
    assert_eq!(loaded.get(0x0041), Some(&GeneralCategory::UppercaseLetter));
    assert_eq!(loaded.get(0x01C5), Some(&GeneralCategory::TitlecaseLetter));
    assert_eq!(loaded.get(0x0301), Some(&GeneralCategory::NonspacingMark));
    assert_eq!(loaded.get(0x0378), None);
    assert_eq!(loaded.report().skipped, 1);

    let input = "\
# @missing: 0000..10FFFF; L
@missing: 0590..05FF; R
0041..005A    ; L # L&  [26] LATIN CAPITAL LETTER A..LATIN CAPITAL LETTER Z
05D0..05EA    ; R # Lo  [27] HEBREW LETTER ALEF..HEBREW LETTER TAV
0627          ; AL # Lo       ARABIC LETTER ALEF
0030..0039    ; EN # Nd  [10] DIGIT ZERO..DIGIT NINE
200F          ; R # Cf       RIGHT-TO-LEFT MARK
2067          ; RLI # Cf       RIGHT-TO-LEFT ISOLATE
";
    let loaded = load(&bidi_class(), input.as_bytes(), "DerivedBidiClass.txt").expect("loads");
    assert_eq!(loaded.get(0x0041), Some(&BidiClass::LeftToRight));
    assert_eq!(loaded.get(0x05D0), Some(&BidiClass::RightToLeft));
    assert_eq!(loaded.get(0x0627), Some(&BidiClass::ArabicLetter));
    assert_eq!(loaded.get(0x0035), Some(&BidiClass::EuropeanNumber));
    assert_eq!(loaded.get(0x2067), Some(&BidiClass::RightToLeftIsolate));
    assert_eq!(loaded.get(0x05FF), None, "defaults are not materialised");
    assert_eq!(loaded.report().records, 6);
}

#[test]
fn scripts_and_hangul_syllable_types() {
    let input = "\
0041..005A    ; Latin # L&  [26] LATIN CAPITAL LETTER A..LATIN CAPITAL LETTER Z
0020          ; Common # Zs       SPACE
0300..036F    ; Inherited # Mn [112] COMBINING GRAVE ACCENT..COMBINING LATIN SMALL LETTER X
05D0..05EA    ; Hebrew # Lo  [27] HEBREW LETTER ALEF..HEBREW LETTER TAV
1800..1801    ; Mongolian # Po   [2] MONGOLIAN BIRGA..MONGOLIAN ELLIPSIS
";
    let loaded = load(&scripts(), input.as_bytes(), "Scripts.txt").expect("loads");
    assert_eq!(loaded.get(0x0051), Some(&Script::Latin));
    assert_eq!(loaded.get(0x0020), Some(&Script::Common));
    assert_eq!(loaded.get(0x0301), Some(&Script::Inherited));
    assert_eq!(loaded.get(0x05D0), Some(&Script::Hebrew));
    assert_eq!(loaded.get(0x1800), Some(&Script::Untracked));
    assert_eq!(loaded.get(0x4E00), None);

    let input = "\
1100..115F    ; L # Lo  [96] HANGUL CHOSEONG KIYEOK..HANGUL CHOSEONG FILLER
1160..11A7    ; V # Lo  [72] HANGUL JUNGSEONG FILLER..HANGUL JUNGSEONG O-YAE
11A8..11FF    ; T # Lo  [88] HANGUL JONGSEONG KIYEOK..HANGUL JONGSEONG SSANGNIEUN
AC00          ; LV # Lo       HANGUL SYLLABLE GA
AC01..AC1B    ; LVT # Lo  [27] HANGUL SYLLABLE GAG..HANGUL SYLLABLE GAH
";
    let loaded = load(&hangul_syllable_type(), input.as_bytes(), "HangulSyllableType.txt").expect("loads");
    assert_eq!(loaded.get(0x1100), Some(&HangulSyllableType::LeadingJamo));
    assert_eq!(loaded.get(0x1160), Some(&HangulSyllableType::VowelJamo));
    assert_eq!(loaded.get(0x11A8), Some(&HangulSyllableType::TrailingJamo));
    assert_eq!(loaded.get(0xAC00), Some(&HangulSyllableType::LvSyllable));
    assert_eq!(loaded.get(0xAC1B), Some(&HangulSyllableType::LvtSyllable));
    assert_eq!(loaded.len(), 96 + 72 + 88 + 1 + 27);
}

#[test]
fn bracket_pairs() {
    let input = "\
# BidiBrackets-15.1.0.txt
0028; 0029; o # LEFT PARENTHESIS
0029; 0028; c # RIGHT PARENTHESIS
005B; 005D; o # LEFT SQUARE BRACKET
2329; 232A; x # unknown bracket type
232A; 2329 # too few fields
";
    let loaded = load(&bidi_brackets(), input.as_bytes(), "BidiBrackets.txt").expect("loads");
    assert_eq!(loaded.get(0x28), Some(&BidiBracket { pair: 0x29, opening: true }));
    assert_eq!(loaded.get(0x29), Some(&BidiBracket { pair: 0x28, opening: false }));
    assert_eq!(loaded.get(0x5B), Some(&BidiBracket { pair: 0x5D, opening: true }));
    assert_eq!(loaded.get(0x2329), None);
    assert_eq!(loaded.get(0x232A), None);
    assert_eq!(loaded.report().skipped, 2);
}
