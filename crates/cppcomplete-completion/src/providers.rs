/// Pluggable candidate sources
///
/// A [`CandidateSource`] supplies the full, unfiltered candidate list for a
/// context. The controller calls it at most once per session and narrows the
/// cached result itself, so sources never see prefixes.
use crate::config::{CompletionSettings, DEFAULT_MACRO_PLACEHOLDERS};
use crate::error::CompletionResult;
use crate::language::LanguageVariant;
use crate::types::{Candidate, CandidateKind, ContextTag, Tier};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Supplies the candidate list for a context tag
pub trait CandidateSource: Send + Sync {
    /// Produce every candidate for `tag`
    ///
    /// Must not block on I/O; the controller runs it on a blocking worker but
    /// expects a table lookup.
    fn produce(&self, tag: ContextTag) -> Vec<Candidate>;
}

/// Predicate deciding whether a candidate may be offered
pub type CandidatePredicate = Arc<dyn Fn(&Candidate) -> bool + Send + Sync>;

/// One row of a keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub text: String,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub priority: i32,
    /// Defaults to `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

impl KeywordEntry {
    pub fn new(text: impl Into<String>, tier: Tier) -> Self {
        Self {
            text: text.into(),
            tier,
            priority: 0,
            sort_key: None,
        }
    }

    pub fn to_candidate(&self) -> Candidate {
        let candidate = Candidate::new(self.text.clone(), self.tier).with_priority(self.priority);
        match &self.sort_key {
            Some(key) => candidate.with_sort_key(key.clone()),
            None => candidate,
        }
    }
}

/// Static keyword data handed to a [`KeywordCandidateSource`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub keywords: Vec<KeywordEntry>,
}

/// Keywords shown on a bare trigger
const FIRST_TIER_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "char", "class", "const", "continue", "default", "delete",
    "do", "double", "else", "enum", "extern", "false", "float", "for", "if", "inline", "int",
    "long", "namespace", "new", "nullptr", "private", "protected", "public", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "template", "this", "true", "typedef",
    "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "while",
];

/// Keywords offered once a prefix is typed or everything is requested
const ALL_TIER_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "bitand", "bitor", "catch", "char8_t",
    "char16_t", "char32_t", "co_await", "co_return", "co_yield", "compl", "concept",
    "const_cast", "consteval", "constexpr", "constinit", "decltype", "dynamic_cast", "explicit",
    "export", "friend", "goto", "mutable", "noexcept", "not", "not_eq", "operator", "or",
    "or_eq", "register", "reinterpret_cast", "requires", "static_assert", "static_cast",
    "thread_local", "throw", "try", "typeid", "wchar_t", "xor", "xor_eq", "restrict", "_Alignas",
    "_Alignof", "_Atomic", "_Bool", "_Complex", "_Generic", "_Imaginary", "_Noreturn",
    "_Static_assert", "_Thread_local",
];

impl KeywordTable {
    pub fn new(keywords: Vec<KeywordEntry>) -> Self {
        Self { keywords }
    }

    /// Built-in C/C++ table covering both variants
    pub fn builtin() -> Self {
        let first = FIRST_TIER_KEYWORDS
            .iter()
            .map(|word| KeywordEntry::new(*word, Tier::First));
        let all = ALL_TIER_KEYWORDS
            .iter()
            .map(|word| KeywordEntry::new(*word, Tier::All));
        Self::new(first.chain(all).collect())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Candidate source backed by a keyword table
///
/// The predicate is applied while the source is built, so `produce` is a
/// clone of prepared lists.
#[derive(Clone)]
pub struct KeywordCandidateSource {
    table: Arc<KeywordTable>,
    placeholder_names: Vec<String>,
    predicate: Option<CandidatePredicate>,
    keywords: Arc<Vec<Candidate>>,
    placeholders: Arc<Vec<Candidate>>,
}

impl KeywordCandidateSource {
    /// Create a source with the default macro placeholders
    pub fn new(table: Arc<KeywordTable>) -> Self {
        let mut source = Self {
            table,
            placeholder_names: DEFAULT_MACRO_PLACEHOLDERS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            predicate: None,
            keywords: Arc::new(Vec::new()),
            placeholders: Arc::new(Vec::new()),
        };
        source.rebuild();
        source
    }

    /// Source over [`KeywordTable::builtin`]
    pub fn builtin() -> Self {
        Self::new(Arc::new(KeywordTable::builtin()))
    }

    /// Build a source from settings: table, placeholders and variant
    pub fn from_settings(settings: &CompletionSettings) -> CompletionResult<Self> {
        let table = settings.load_keyword_table()?;
        let source = Self::new(Arc::new(table)).with_placeholders(settings.macro_placeholders.clone());
        Ok(match settings.variant {
            Some(variant) => source.for_variant(variant),
            None => source,
        })
    }

    /// Replace the names offered inside `#define` replacement lists
    pub fn with_placeholders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholder_names = names.into_iter().map(Into::into).collect();
        self.rebuild();
        self
    }

    /// Drop every candidate the predicate rejects
    pub fn with_predicate(mut self, predicate: CandidatePredicate) -> Self {
        self.predicate = Some(predicate);
        self.rebuild();
        self
    }

    /// Restrict candidates to the keywords legal in `variant`
    pub fn for_variant(self, variant: LanguageVariant) -> Self {
        self.with_predicate(Arc::new(move |candidate: &Candidate| variant.accepts(candidate)))
    }

    pub fn table(&self) -> &Arc<KeywordTable> {
        &self.table
    }

    fn rebuild(&mut self) {
        let keep = |candidate: &Candidate| match &self.predicate {
            Some(predicate) => predicate(candidate),
            None => true,
        };

        let keywords: Vec<Candidate> = self
            .table
            .keywords
            .iter()
            .map(KeywordEntry::to_candidate)
            .filter(|candidate| keep(candidate))
            .collect();
        let placeholders: Vec<Candidate> = self
            .placeholder_names
            .iter()
            .map(|name| Candidate::new(name.clone(), Tier::First).with_kind(CandidateKind::MacroArgument))
            .filter(|candidate| keep(candidate))
            .collect();

        self.keywords = Arc::new(keywords);
        self.placeholders = Arc::new(placeholders);
    }
}

impl std::fmt::Debug for KeywordCandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordCandidateSource")
            .field("keywords", &self.keywords.len())
            .field("placeholders", &self.placeholder_names)
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}

impl CandidateSource for KeywordCandidateSource {
    fn produce(&self, tag: ContextTag) -> Vec<Candidate> {
        match tag {
            ContextTag::Normal | ContextTag::Comment => self.keywords.as_ref().clone(),
            ContextTag::PreprocessorDefine => {
                let mut candidates = Vec::with_capacity(self.keywords.len() + self.placeholders.len());
                candidates.extend(self.placeholders.iter().cloned());
                candidates.extend(self.keywords.iter().cloned());
                candidates
            }
        }
    }
}

/// Concatenates the candidates of several sources, in registration order
#[derive(Default, Clone)]
pub struct CandidateSourceRegistry {
    sources: Vec<Arc<dyn CandidateSource>>,
}

impl CandidateSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn CandidateSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl CandidateSource for CandidateSourceRegistry {
    fn produce(&self, tag: ContextTag) -> Vec<Candidate> {
        self.sources
            .iter()
            .flat_map(|source| source.produce(tag))
            .collect()
    }
}

/// Factory for keyword sources by language variant
pub struct CandidateSourceFactory;

impl CandidateSourceFactory {
    /// Built-in keywords restricted to a variant
    pub fn create(variant: LanguageVariant) -> Arc<dyn CandidateSource> {
        Arc::new(KeywordCandidateSource::builtin().for_variant(variant))
    }

    /// Built-in keywords for the variant detected from a file path
    ///
    /// Unknown extensions get the unrestricted table.
    pub fn from_path(path: &Path) -> Arc<dyn CandidateSource> {
        match LanguageVariant::from_path(path) {
            Some(variant) => Self::create(variant),
            None => Arc::new(KeywordCandidateSource::builtin()),
        }
    }
}
