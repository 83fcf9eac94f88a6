use super::errors::GrammarError;
use hashbrown::HashMap;
use lazy_static::lazy_static;
use regex::Regex;

/// Exhaustive list of the Unicode general categories usable in a character class
pub static UNICODE_CATEGORIES: &[&str] = &[
    "C", "Cc", "Cf", "Co", "L", "Ll", "Lm", "Lo", "Lt", "Lu", "M", "Mc", "Me", "Mn", "N", "Nd",
    "Nl", "No", "P", "Pc", "Pd", "Pe", "Pf", "Pi", "Po", "Ps", "S", "Sc", "Sk", "Sm", "So", "Z",
    "Zl", "Zp", "Zs",
];

lazy_static! {
    // One anchored single-character program per category, compiled once per process
    static ref CATEGORY_MATCHERS: HashMap<&'static str, Regex> = UNICODE_CATEGORIES
        .iter()
        .filter_map(|name| {
            Regex::new(&format!(r"\A\p{{{}}}\z", name))
                .ok()
                .map(|re| (*name, re))
        })
        .collect();
}

/// Check if a code point belongs to a Unicode general category
///
/// Returns `None` if the category is not known.
pub fn category_contains(category: &str, c: char) -> Option<bool> {
    let matcher = CATEGORY_MATCHERS.get(category)?;
    let mut buf = [0; 4];
    Some(matcher.is_match(c.encode_utf8(&mut buf)))
}

/// A character class (`[a-z_\p{Lu}]`), matching exactly one code point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    /// Single characters
    chars: Vec<char>,

    /// Inclusive ranges
    ranges: Vec<(char, char)>,

    /// Unicode general categories
    categories: Vec<&'static str>,

    /// Compare the input lowercased
    ignore_case: bool,

    /// Flip the outcome of a match (`[^...]`)
    inverted: bool,

    /// Textual form, reported in "expected" lists
    want: String,
}

impl CharClass {
    /// Create an empty class, which matches nothing until members are added
    pub fn new() -> Self {
        let mut class = Self {
            chars: vec![],
            ranges: vec![],
            categories: vec![],
            ignore_case: false,
            inverted: false,
            want: String::new(),
        };
        class.render();
        class
    }

    /// Add every character of `chars` to the class
    pub fn with_chars(mut self, chars: &str) -> Self {
        self.chars.extend(chars.chars());
        self.render();
        self
    }

    /// Add an inclusive range to the class
    pub fn with_range(mut self, from: char, to: char) -> Self {
        self.ranges.push((from, to));
        self.render();
        self
    }

    /// Add a Unicode general category (e.g. `Lu` or `N`) to the class
    pub fn with_category(mut self, category: &str) -> Result<Self, GrammarError> {
        let known = UNICODE_CATEGORIES
            .iter()
            .find(|candidate| **candidate == category)
            .ok_or_else(|| GrammarError::UnknownUnicodeClass(category.to_string()))?;

        self.categories.push(known);
        self.render();
        Ok(self)
    }

    /// Make the class case-insensitive
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self.render();
        self
    }

    /// Invert the class (`[^...]`)
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self.render();
        self
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Get the class's textual form
    pub fn want(&self) -> &str {
        &self.want
    }

    /// Check if a code point is listed in the class
    ///
    /// The `inverted` flag is NOT applied here: the caller decides what a listed character means.
    pub fn contains(&self, c: char) -> bool {
        let c = if self.ignore_case { fold(c) } else { c };

        if self.chars.iter().any(|&listed| self.normalize(listed) == c) {
            return true;
        }

        if self
            .ranges
            .iter()
            .any(|&(from, to)| (self.normalize(from)..=self.normalize(to)).contains(&c))
        {
            return true;
        }

        self.categories
            .iter()
            .any(|category| category_contains(category, c).unwrap_or(false))
    }

    fn normalize(&self, c: char) -> char {
        if self.ignore_case {
            fold(c)
        } else {
            c
        }
    }

    // Recompute the textual form after each change
    fn render(&mut self) {
        let mut want = String::from("[");

        if self.inverted {
            want.push('^');
        }

        for &c in &self.chars {
            push_escaped(&mut want, c);
        }

        for &(from, to) in &self.ranges {
            push_escaped(&mut want, from);
            want.push('-');
            push_escaped(&mut want, to);
        }

        for category in &self.categories {
            if category.len() == 1 {
                want.push_str(&format!("\\p{}", category));
            } else {
                want.push_str(&format!("\\p{{{}}}", category));
            }
        }

        want.push(']');

        if self.ignore_case {
            want.push('i');
        }

        self.want = want;
    }
}

impl Default for CharClass {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple lowercase folding of a single code point
pub(crate) fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();

    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        // Multi-character lowercase forms don't fit in a single rune
        _ => c,
    }
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        ']' | '\\' | '-' | '^' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        _ => out.push(c),
    }
}
