//! Word-form normalisation.
//!
//! Every node carries a few derived spellings of its surface form so that
//! feature templates can back off from rare words: a lowercase form, a
//! simplified form with numbers and hyperlinks collapsed, and a form where
//! each digit is replaced by `0`. Word shapes and orthographic flags are
//! computed here as well.

use bitflags::bitflags;

/// Placeholder that replaces any hyperlink or e-mail address.
pub const HYPERLINK: &str = "#hlink#";

bitflags! {
    /// Orthographic properties of a word form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Orthographic: u16 {
        const HYPERLINK = 1;
        const ALL_UPPER = 1 << 1;
        const ALL_LOWER = 1 << 2;
        const ALL_DIGIT = 1 << 3;
        const ALL_PUNCT = 1 << 4;
        const ALL_DIGIT_OR_PUNCT = 1 << 5;
        const NO_LOWER = 1 << 6;
        /// First character is uppercase and the token does not start the sentence.
        const FST_UPPER = 1 << 7;
        /// Exactly one uppercase character after the first one.
        const UPPER_1 = 1 << 8;
        /// Two or more uppercase characters after the first one.
        const UPPER_2 = 1 << 9;
        const HAS_DIGIT = 1 << 10;
        const HAS_PERIOD = 1 << 11;
        const HAS_HYPHEN = 1 << 12;
        const HAS_OTHER_PUNCT = 1 << 13;
    }
}

impl Orthographic {
    /// Flags that depend on letter case.
    pub const CASED: Self = Self::ALL_UPPER
        .union(Self::ALL_LOWER)
        .union(Self::NO_LOWER)
        .union(Self::FST_UPPER)
        .union(Self::UPPER_1)
        .union(Self::UPPER_2);

    /// Computes the flags of `form`.
    ///
    /// `sentence_initial` suppresses [`Orthographic::FST_UPPER`], which is
    /// uninformative for the first token of a sentence.
    pub fn of(form: &str, sentence_initial: bool) -> Self {
        if is_hyperlink(form) {
            return Self::HYPERLINK;
        }

        let chars: Vec<char> = form.chars().collect();
        if chars.is_empty() {
            return Self::empty();
        }

        let (mut upper, mut lower, mut digit, mut punct) = (0, 0, 0, 0);
        for &c in &chars {
            if c.is_uppercase() {
                upper += 1;
            } else if c.is_lowercase() {
                lower += 1;
            } else if c.is_numeric() {
                digit += 1;
            } else if is_punct(c) {
                punct += 1;
            }
        }

        let n = chars.len();
        if upper == n {
            return Self::ALL_UPPER;
        }
        if lower == n {
            return Self::ALL_LOWER;
        }
        if digit == n {
            return Self::ALL_DIGIT;
        }
        if punct == n {
            return Self::ALL_PUNCT;
        }
        if digit + punct == n {
            return Self::ALL_DIGIT_OR_PUNCT;
        }
        if lower == 0 {
            return Self::NO_LOWER;
        }

        let mut flags = Self::empty();
        if !sentence_initial && chars[0].is_uppercase() {
            flags |= Self::FST_UPPER;
        }
        match chars[1..].iter().filter(|c| c.is_uppercase()).count() {
            0 => {}
            1 => flags |= Self::UPPER_1,
            _ => flags |= Self::UPPER_2,
        }
        for &c in &chars {
            if c.is_numeric() {
                flags |= Self::HAS_DIGIT;
            } else if c == '.' {
                flags |= Self::HAS_PERIOD;
            } else if c == '-' {
                flags |= Self::HAS_HYPHEN;
            } else if is_punct(c) {
                flags |= Self::HAS_OTHER_PUNCT;
            }
        }
        flags
    }

    /// Names of the set flags, in declaration order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        self.iter_names().map(|(name, _)| name)
    }
}

/// Returns `true` if `c` is a punctuation or symbol character.
pub fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(c,
            '\u{00A1}'..='\u{00BF}'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{205E}'
            | '\u{20A0}'..='\u{20CF}'
            | '\u{3001}'..='\u{3003}'
            | '\u{3008}'..='\u{3011}')
}

/// Returns `true` if every character of `s` is punctuation.
pub fn is_punct_only(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_punct)
}

fn is_currency(c: char) -> bool {
    matches!(c, '$' | '\u{00A2}'..='\u{00A5}' | '\u{20A0}'..='\u{20CF}')
}

/// Returns `true` if `s` looks like a URL or an e-mail address.
pub fn is_hyperlink(s: &str) -> bool {
    let lower = s.to_lowercase();
    const SCHEMES: [&str; 5] = ["http://", "https://", "ftp://", "www.", "mailto:"];
    if SCHEMES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    match lower.split_once('@') {
        Some((user, domain)) => {
            !user.is_empty() && domain.len() > 2 && domain.chars().skip(1).any(|c| c == '.')
        }
        None => false,
    }
}

/// Simplified form: hyperlinks become [`HYPERLINK`], lone currency symbols
/// become `$`, quotes and bullets are unified, digit sequences (with their
/// inner separators and a trailing `%`) collapse to a single `0`, and runs of
/// three or more identical punctuation marks are cut down to two.
pub fn simplify(form: &str) -> String {
    if is_hyperlink(form) {
        return HYPERLINK.to_string();
    }

    let mut chars = form.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if is_currency(c) {
            return "$".to_string();
        }
        if matches!(c, '-' | '\u{2010}'..='\u{2015}' | '\u{2022}' | '\u{00B7}' | '*') {
            return "-".to_string();
        }
    }

    let normalized: String = form
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '`' => '\'',
            _ => c,
        })
        .collect();
    let normalized = normalized.replace("''", "\"");

    collapse_punct(&collapse_digits(&normalized))
}

/// Replaces each digit by `0`.
pub fn undigitalize(form: &str) -> String {
    form.chars()
        .map(|c| if c.is_ascii_digit() { '0' } else { c })
        .collect()
}

fn collapse_digits(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        out.push('0');
        i += 1;
        loop {
            if i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            } else if i + 1 < chars.len()
                && matches!(chars[i], '.' | ',' | ':' | '-' | '/')
                && chars[i + 1].is_ascii_digit()
            {
                i += 2;
            } else {
                break;
            }
        }
        if i < chars.len() && chars[i] == '%' {
            i += 1;
        }
    }
    out
}

fn collapse_punct(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev = None;
    let mut run = 0;
    for c in s.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= 2 || !is_punct(c) {
            out.push(c);
        }
    }
    out
}

/// Word shape: uppercase letters map to `A`, lowercase to `a`, digits to `1`,
/// punctuation to `.` and anything else to `x`. Consecutive characters of the
/// same class are kept at most `max_repetitions` times.
pub fn shape(form: &str, max_repetitions: usize) -> String {
    let mut out = String::new();
    let mut prev = '\0';
    let mut count = 0;
    for c in form.chars() {
        let class = if c.is_uppercase() {
            'A'
        } else if c.is_lowercase() {
            'a'
        } else if c.is_numeric() {
            '1'
        } else if is_punct(c) {
            '.'
        } else {
            'x'
        };
        if class == prev {
            count += 1;
        } else {
            prev = class;
            count = 0;
        }
        if count < max_repetitions {
            out.push(class);
        }
    }
    out
}
