//! # Character Classes
//!
//! The grammars of the stack are defined in terms of a handful of character
//! classes. The checks here return the offending characters (sorted, each
//! once) so validation messages can quote and highlight them.

use std::collections::BTreeSet;

/// RFC 1738 `hsegment` characters, excluding `*` (the extension separator)
/// and `%`, which is only allowed as the start of a `%XX` escape.
pub fn is_hsegment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-.~!$&'()+,:;=@".contains(c)
}

/// Characters recommended in identifier segment keys and values: `[A-Z0-9-+:]`.
pub fn is_recommended_segment_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '-' | '+' | ':')
}

/// Characters recommended in an issuer: `[A-Z0-9.-]`.
pub fn is_recommended_issuer_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-')
}

/// T-REX keys, alphanumeric and error values: `[A-Z0-9.-]`.
pub fn is_trex_key_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-')
}

/// Characters of `s` for which `allowed` is false.
pub fn disallowed_chars(s: &str, allowed: impl Fn(char) -> bool) -> BTreeSet<char> {
    s.chars().filter(|c| !allowed(*c)).collect()
}

/// Characters of `s` that break the `hsegment` class. `%XX` escapes are fine;
/// a `%` not followed by two hex digits is reported.
pub fn hsegment_violations(s: &str) -> BTreeSet<char> {
    let chars: Vec<char> = s.chars().collect();
    let mut bad = BTreeSet::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '%'
            && chars.get(i + 1).is_some_and(|h| h.is_ascii_hexdigit())
            && chars.get(i + 2).is_some_and(|h| h.is_ascii_hexdigit())
        {
            i += 3;
            continue;
        }
        if !is_hsegment_char(c) {
            bad.insert(c);
        }
        i += 1;
    }
    bad
}

/// Full match of `(?!-)([A-Za-z0-9-]{1,63}(?<!-)\.)+[A-Za-z]{2,63}`.
///
/// At least two labels; every label but the last is 1–63 of `[A-Za-z0-9-]`
/// and does not end in `-`; the first does not start with `-`; the top-level
/// label is 2–63 ASCII letters.
pub fn is_domain_name(s: &str) -> bool {
    if s.starts_with('-') {
        return false;
    }
    let labels: Vec<&str> = s.split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let tld_ok = (2..=63).contains(&tld.len()) && tld.bytes().all(|b| b.is_ascii_alphabetic());
    let labels_ok = rest.iter().all(|label| {
        (1..=63).contains(&label.len())
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    });
    tld_ok && labels_ok
}

/// `'a','b'`: the quoting used in validation messages.
pub fn quote_chars(chars: &BTreeSet<char>) -> String {
    chars
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Each character as its own highlight pattern.
pub fn char_patterns(chars: &BTreeSet<char>) -> Vec<String> {
    chars.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_names() {
        assert!(is_domain_name("METTORIUS.COM"));
        assert!(is_domain_name("pac.example.org"));
        assert!(is_domain_name("A-B.CO"));
        assert!(is_domain_name("X.-Y.COM"));
        assert!(!is_domain_name("-A.COM"));
        assert!(!is_domain_name("A-.COM"));
        assert!(!is_domain_name("LOCALHOST"));
        assert!(!is_domain_name("A.C"));
        assert!(!is_domain_name("A.C0M"));
        assert!(!is_domain_name("A..COM"));
        assert!(!is_domain_name(""));
        assert!(!is_domain_name("A_B.COM"));
    }

    #[test]
    fn test_hsegment_percent_escapes() {
        assert!(hsegment_violations("A%20B").is_empty());
        assert_eq!(hsegment_violations("A%2"), BTreeSet::from(['%']));
        assert_eq!(hsegment_violations("A B*"), BTreeSet::from([' ', '*']));
        assert!(hsegment_violations("a_b-c.d~e!f$g&h'i(j)k+l,m:n;o=p@q").is_empty());
    }

    #[test]
    fn test_recommended_segment_chars() {
        assert!(disallowed_chars("AZ09-+:", is_recommended_segment_char).is_empty());
        assert_eq!(
            disallowed_chars("Ab.c", is_recommended_segment_char),
            BTreeSet::from(['.', 'b', 'c'])
        );
    }

    #[test]
    fn test_quote_chars_sorted() {
        let chars = BTreeSet::from(['b', 'a']);
        assert_eq!(quote_chars(&chars), "'a','b'");
        assert_eq!(char_patterns(&chars), vec!["a", "b"]);
    }
}
