//! Identifier casing: classification, conversion and the Rust naming table.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;

/// A casing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Case {
    #[serde(rename = "kebab-case")]
    Kebab,
    #[serde(rename = "snake_case")]
    Snake,
    #[serde(rename = "camelCase")]
    Camel,
    #[serde(rename = "PascalCase")]
    Pascal,
}

/// Classification priority. A lowercase single word matches kebab, snake and
/// camel alike and classifies as kebab.
pub const PRIORITY: [Case; 4] = [Case::Kebab, Case::Snake, Case::Camel, Case::Pascal];

static KEBAB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").unwrap());
static SNAKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").unwrap());
static CAMEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*([A-Z][a-z0-9]*)*$").unwrap());
static PASCAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").unwrap());

impl Case {
    fn pattern(self) -> &'static Regex {
        match self {
            Case::Kebab => &KEBAB,
            Case::Snake => &SNAKE,
            Case::Camel => &CAMEL,
            Case::Pascal => &PASCAL,
        }
    }

    /// Whether `s` is spelled in this style.
    pub fn matches(self, s: &str) -> bool {
        self.pattern().is_match(s)
    }

    /// Split `s` into words the way this style delimits them.
    ///
    /// Characters that are never part of a word in any style (`-`, `_`,
    /// spaces, dots...) always separate words, so the result only ever holds
    /// alphanumeric runs.
    pub fn split(self, s: &str) -> Vec<String> {
        let parts: Vec<String> = match self {
            Case::Kebab => s.split('-').map(str::to_string).collect(),
            Case::Snake => s.split('_').map(str::to_string).collect(),
            Case::Camel | Case::Pascal => split_humps(s),
        };
        parts
            .iter()
            .flat_map(|p| p.split(|c: char| !c.is_ascii_alphanumeric()))
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Join words in this style.
    pub fn join(self, words: &[String]) -> String {
        match self {
            Case::Kebab => lower_all(words).join("-"),
            Case::Snake => lower_all(words).join("_"),
            Case::Camel => {
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            Case::Pascal => words.iter().map(|w| capitalize(w)).collect(),
        }
    }
}

/// Split at lower/digit→upper transitions and before the last capital of an
/// acronym run (`HTTPServer` → `HTTP`, `Server`).
fn split_humps(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn lower_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Uppercase the first character, keep the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First style in [`PRIORITY`] that `s` matches, camelCase when none does.
pub fn case_of(s: &str) -> Case {
    PRIORITY
        .into_iter()
        .find(|case| case.matches(s))
        .unwrap_or(Case::Camel)
}

/// Convert `s` to `target`, splitting it by its own classified style.
pub fn to_case(s: &str, target: Case) -> String {
    to_case_from(s, target, case_of(s))
}

/// Convert `s` to `target`, splitting it as if it were spelled in `from`.
pub fn to_case_from(s: &str, target: Case, from: Case) -> String {
    target.join(&from.split(s))
}

/// Whether `s` can be written as a Rust identifier, raw or not.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Convert `s` to `target` as an identifier: when there are no words or the
/// first word starts with a digit, a leading `v` word is added.
pub fn to_identifier(s: &str, target: Case, from: Case) -> String {
    let mut words = from.split(s);
    if words
        .first()
        .is_none_or(|w| w.starts_with(|c: char| c.is_ascii_digit()))
    {
        words.insert(0, "v".to_string());
    }
    target.join(&words)
}

/// Most frequent style among `names`, each classified by [`case_of`].
/// Ties go to the style encountered first.
pub fn dominant_case<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Case> {
    let mut counts: Vec<(Case, usize)> = Vec::new();
    for name in names {
        let case = case_of(name);
        match counts.iter_mut().find(|(c, _)| *c == case) {
            Some((_, n)) => *n += 1,
            None => counts.push((case, 1)),
        }
    }

    let mut best: Option<(Case, usize)> = None;
    for (case, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((case, n));
        }
    }
    best.map(|(case, _)| case)
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const NON_RAW: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Escape a Rust identifier: `r#type`, `self_`.
pub fn escape_ident(name: &str) -> Cow<'_, str> {
    if NON_RAW.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else if KEYWORDS.contains(&name) {
        Cow::Owned(format!("r#{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Declaration kinds that carry a naming rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Enum,
    Struct,
    TypeAlias,
    Module,
}

/// Casing required for a declaration's own name and for its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convention {
    pub ident: Case,
    pub members: Option<Case>,
}

/// The Rust naming table.
pub fn rust_convention(kind: DeclKind) -> Convention {
    match kind {
        DeclKind::Enum => Convention {
            ident: Case::Pascal,
            members: Some(Case::Pascal),
        },
        DeclKind::Struct => Convention {
            ident: Case::Pascal,
            members: Some(Case::Snake),
        },
        DeclKind::TypeAlias => Convention {
            ident: Case::Pascal,
            members: None,
        },
        DeclKind::Module => Convention {
            ident: Case::Snake,
            members: None,
        },
    }
}
