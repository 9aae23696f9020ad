//! Best-effort textual repair of near-JSON model output.
//!
//! The pipeline is an ordered list of named rewrite rules, applied
//! unconditionally and without schema awareness. Every rule is lossy in some
//! corner; the known failure modes are documented on each rule rather than
//! hidden inside one opaque transformation. In particular, feeding already
//! valid JSON through [`sanitize`] is NOT guaranteed to preserve its parsed
//! value; the tests at the bottom pin the accepted corruptions.

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::compiled;

static FENCE: LazyLock<Regex> = LazyLock::new(|| compiled(r"```[A-Za-z]*\n?"));
static CONTRACTION: LazyLock<Regex> = LazyLock::new(|| compiled(r#"(\w)"(\w)"#));
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| compiled(r"([{,]\s*)(\w+):"));
static BARE_VALUE: LazyLock<Regex> = LazyLock::new(|| compiled(r#":\s*([^",\[\]{}\s]+)([,\]}])"#));
static QUOTED_INTEGER: LazyLock<Regex> = LazyLock::new(|| compiled(r#":\s*"(\d+)"([,\]}])"#));
static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| compiled(r#":\s*"(true|false|null)"([,\]}])"#));

/// One named rewrite step of the repair pipeline.
#[derive(Clone, Copy)]
pub struct RewriteRule {
    /// Rule name, for logs and tests.
    pub name: &'static str,
    apply: fn(&str) -> String,
}

impl RewriteRule {
    /// Applies the rewrite to `text`.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        (self.apply)(text)
    }
}

/// The repair pipeline, in application order.
pub static RULES: [RewriteRule; 7] = [
    RewriteRule {
        name: "strip_code_fences",
        apply: strip_code_fences,
    },
    RewriteRule {
        name: "normalize_quotes",
        apply: normalize_quotes,
    },
    RewriteRule {
        name: "restore_contractions",
        apply: restore_contractions,
    },
    RewriteRule {
        name: "quote_bare_keys",
        apply: quote_bare_keys,
    },
    RewriteRule {
        name: "quote_bare_values",
        apply: quote_bare_values,
    },
    RewriteRule {
        name: "unquote_integers",
        apply: unquote_integers,
    },
    RewriteRule {
        name: "unquote_literals",
        apply: unquote_literals,
    },
];

/// Runs the full repair pipeline over raw model text.
///
/// Trims surrounding whitespace, then applies every rule of [`RULES`] in
/// order. The output is handed to the JSON decoder; it may still fail to
/// parse, and for some valid inputs it parses to a different value than the
/// input would have.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for rule in &RULES {
        let rewritten = rule.apply(&text);
        if rewritten != text {
            tracing::trace!(rule = rule.name, "sanitizer rewrote response");
            text = rewritten;
        }
    }
    text
}

/// Removes every ``` fence marker, with or without a language tag.
///
/// Fence markers inside string values are removed too; a response that
/// legitimately contains triple backticks in a field loses them.
fn strip_code_fences(text: &str) -> String {
    FENCE.replace_all(text, "").into_owned()
}

/// Rewrites every `'` to `"`, normalizing single-quoted JSON.
///
/// Also hits apostrophes inside legitimate double-quoted strings;
/// `restore_contractions` undoes only the letter-adjacent cases, so an
/// apostrophe at a word edge (`'twas`, `runnin'`) stays corrupted.
fn normalize_quotes(text: &str) -> String {
    text.replace('\'', "\"")
}

/// Turns a `"` sandwiched between two word characters back into `'`,
/// repairing contractions broken by `normalize_quotes`.
fn restore_contractions(text: &str) -> String {
    CONTRACTION.replace_all(text, "$1'$2").into_owned()
}

/// Inserts quotes around an unquoted object key before a colon.
///
/// Matches inside string values as well: a value containing `, word:` gains
/// spurious quotes around `word`.
fn quote_bare_keys(text: &str) -> String {
    BARE_KEY.replace_all(text, "$1\"$2\":").into_owned()
}

/// Quotes a bare non-structural scalar standing where a value belongs.
fn quote_bare_values(text: &str) -> String {
    BARE_VALUE.replace_all(text, ": \"$1\"$2").into_owned()
}

/// Unquotes values that are purely digits.
///
/// A field that deliberately holds a numeric string (`"count": "42"`)
/// decodes as a number after this rule, and a digit string with a leading
/// zero stops parsing altogether. Signs and decimal points are left quoted
/// on purpose.
fn unquote_integers(text: &str) -> String {
    QUOTED_INTEGER.replace_all(text, ": $1$2").into_owned()
}

/// Unquotes values that are exactly `true`, `false`, or `null`.
fn unquote_literals(text: &str) -> String {
    QUOTED_LITERAL.replace_all(text, ": $1$2").into_owned()
}
