//! Porter suffix-stripping stemmer.
//!
//! Implements the five steps of Porter's 1980 algorithm with the tables from
//! the paper. Index keys are produced by this function when stemming is on,
//! so a stem that differs by one letter makes a term unreachable.
//!
//! The algorithm is defined over `a-z`. Input is lowercased first; anything
//! shorter than three characters, or containing non-ASCII characters, comes
//! back lowercased and otherwise untouched.

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

// Longer suffixes precede the shorter ones they end with (ement, ment, ent).
const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

/// Reduce `term` to its Porter stem.
pub fn stem(term: &str) -> String {
    let lowered = term.to_lowercase();
    if !lowered.is_ascii() || lowered.len() < 3 {
        return lowered;
    }

    let mut word = Word::new(lowered);
    word.step1a();
    word.step1b();
    word.step1c();
    word.substitute(STEP2);
    word.substitute(STEP3);
    word.step4();
    word.step5();
    word.into_string()
}

/// Lowercase ASCII word being stemmed in place.
///
/// Predicates take an `end` so they can be asked about a prefix (the stem that
/// would remain after removing a suffix) without allocating.
struct Word {
    b: Vec<u8>,
}

impl Word {
    fn new(word: String) -> Self {
        Self { b: word.into_bytes() }
    }

    fn into_string(self) -> String {
        self.b.into_iter().map(char::from).collect()
    }

    fn len(&self) -> usize {
        self.b.len()
    }

    /// `y` is a consonant at the start of a word or after a vowel.
    fn is_consonant(&self, i: usize) -> bool {
        match self.b[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant pairs in `b[..end]`, reading it as
    /// `[C](VC)^m[V]`.
    fn measure(&self, end: usize) -> usize {
        let mut i = 0;
        while i < end && self.is_consonant(i) {
            i += 1;
        }
        let mut m = 0;
        loop {
            while i < end && !self.is_consonant(i) {
                i += 1;
            }
            if i >= end {
                return m;
            }
            while i < end && self.is_consonant(i) {
                i += 1;
            }
            m += 1;
        }
    }

    fn has_vowel(&self, end: usize) -> bool {
        (0..end).any(|i| !self.is_consonant(i))
    }

    fn ends_double_consonant(&self, end: usize) -> bool {
        end >= 2 && self.b[end - 1] == self.b[end - 2] && self.is_consonant(end - 1)
    }

    /// consonant-vowel-consonant ending where the last consonant is not w, x or y.
    fn ends_cvc(&self, end: usize) -> bool {
        end >= 3
            && self.is_consonant(end - 3)
            && !self.is_consonant(end - 2)
            && self.is_consonant(end - 1)
            && !matches!(self.b[end - 1], b'w' | b'x' | b'y')
    }

    fn ends_with(&self, suffix: &str) -> bool {
        self.b.ends_with(suffix.as_bytes())
    }

    fn last(&self) -> Option<u8> {
        self.b.last().copied()
    }

    fn replace_tail(&mut self, stem_len: usize, replacement: &str) {
        self.b.truncate(stem_len);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    /// Plurals: sses -> ss, ies -> i, s -> "" (but ss stays).
    fn step1a(&mut self) {
        if self.ends_with("sses") || self.ends_with("ies") {
            self.b.truncate(self.len() - 2);
        } else if !self.ends_with("ss") && self.ends_with("s") {
            self.b.pop();
        }
    }

    /// Past tense and gerunds, then the repair pass on what is left.
    fn step1b(&mut self) {
        if self.ends_with("eed") {
            if self.measure(self.len() - 3) > 0 {
                self.b.pop();
            }
            return;
        }

        let suffix_len = if self.ends_with("ed") {
            2
        } else if self.ends_with("ing") {
            3
        } else {
            return;
        };
        let stem_len = self.len() - suffix_len;
        if !self.has_vowel(stem_len) {
            return;
        }
        self.b.truncate(stem_len);

        let end = self.len();
        if self.ends_with("at") || self.ends_with("bl") || self.ends_with("iz") {
            self.b.push(b'e');
        } else if self.ends_double_consonant(end) && !matches!(self.last(), Some(b'l' | b's' | b'z')) {
            self.b.pop();
        } else if self.measure(end) == 1 && self.ends_cvc(end) {
            self.b.push(b'e');
        }
    }

    fn step1c(&mut self) {
        let end = self.len();
        if self.ends_with("y") && self.has_vowel(end - 1) {
            self.b[end - 1] = b'i';
        }
    }

    /// Steps 2 and 3: the first suffix in `table` that the word ends with is
    /// replaced when the remaining stem has m > 0.
    fn substitute(&mut self, table: &[(&str, &str)]) {
        if let Some((suffix, replacement)) = table.iter().find(|(suffix, _)| self.ends_with(suffix)) {
            let stem_len = self.len() - suffix.len();
            if self.measure(stem_len) > 0 {
                self.replace_tail(stem_len, replacement);
            }
        }
    }

    fn step4(&mut self) {
        let Some(suffix) = STEP4.iter().find(|suffix| self.ends_with(suffix)) else {
            return;
        };
        let stem_len = self.len() - suffix.len();
        let ion_allowed = *suffix != "ion"
            || matches!(stem_len.checked_sub(1).map(|i| self.b[i]), Some(b's' | b't'));
        if ion_allowed && self.measure(stem_len) > 1 {
            self.b.truncate(stem_len);
        }
    }

    fn step5(&mut self) {
        if self.ends_with("e") {
            let stem_len = self.len() - 1;
            let m = self.measure(stem_len);
            if m > 1 || (m == 1 && !self.ends_cvc(stem_len)) {
                self.b.pop();
            }
        }
        if self.ends_with("ll") && self.measure(self.len()) > 1 {
            self.b.pop();
        }
    }
}
