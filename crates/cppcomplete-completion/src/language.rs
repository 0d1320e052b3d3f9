use std::path::Path;

/// Language variant detection and keyword legality
///
/// A [`LanguageVariant`] restricts which keywords a candidate source may offer.
/// It is resolved from the buffer's content type or file extension.
use serde::{Deserialize, Serialize};

use crate::types::Candidate;

pub const C_CONTENT_TYPE: &str = "text/x-c";
pub const CPP_CONTENT_TYPE: &str = "text/x-c++";
pub const HEADER_CONTENT_TYPE: &str = "text/x-h";

/// Reserved words that only exist in C++
const CPP_ONLY: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "bitand", "bitor", "bool", "catch", "char8_t",
    "char16_t", "char32_t", "class", "co_await", "co_return", "co_yield", "compl", "concept",
    "const_cast", "consteval", "constexpr", "constinit", "decltype", "delete", "dynamic_cast",
    "explicit", "export", "false", "friend", "mutable", "namespace", "new", "noexcept", "not",
    "not_eq", "nullptr", "operator", "or", "or_eq", "private", "protected", "public",
    "reinterpret_cast", "requires", "static_assert", "static_cast", "template", "this",
    "thread_local", "throw", "true", "try", "typeid", "typename", "using", "virtual", "wchar_t",
    "xor", "xor_eq", "__VA_OPT__",
];

/// Reserved words that only exist in C
const C_ONLY: &[&str] = &[
    "restrict", "_Alignas", "_Alignof", "_Atomic", "_Bool", "_Complex", "_Generic", "_Imaginary",
    "_Noreturn", "_Static_assert", "_Thread_local",
];

/// Source language variant of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageVariant {
    C,
    Cpp,
}

impl LanguageVariant {
    /// Detect the variant from a content type
    ///
    /// Headers (`text/x-h`) are ambiguous and resolve to C++, which accepts the
    /// larger keyword set.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            C_CONTENT_TYPE => Some(LanguageVariant::C),
            CPP_CONTENT_TYPE | HEADER_CONTENT_TYPE => Some(LanguageVariant::Cpp),
            _ => None,
        }
    }

    /// Detect the variant from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "c" => Some(LanguageVariant::C),
            "cc" | "cpp" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h" | "ipp" | "tpp" => {
                Some(LanguageVariant::Cpp)
            }
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            LanguageVariant::C => C_CONTENT_TYPE,
            LanguageVariant::Cpp => CPP_CONTENT_TYPE,
        }
    }

    /// Whether `word` is legal in this variant
    pub fn accepts_word(&self, word: &str) -> bool {
        match self {
            LanguageVariant::C => !CPP_ONLY.contains(&word),
            LanguageVariant::Cpp => !C_ONLY.contains(&word),
        }
    }

    /// Whether a candidate may be offered in this variant
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        self.accepts_word(&candidate.text)
    }
}
