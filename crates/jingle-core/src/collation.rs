//! Name ordering and matching
//!
//! Tiles are listed in Polish alphabetical order: case-insensitive, with each
//! Polish letter (ą, ć, ę, ł, ń, ó, ś, ź, ż) sorting right after its base
//! letter. Other Latin accents are ignored for ordering (é sorts as e).
//!
//! Settings import matches names with [`match_key`], which drops every
//! diacritic, folds case and collapses whitespace.

use std::cmp::Ordering;

/// Polish alphabet in collation order
const POLISH_ALPHABET: &str = "aąbcćdeęfghijklłmnńoópqrsśtuvwxyzźż";

/// Letters whose accent is significant in Polish ordering
const POLISH_LETTERS: &str = "ąćęłńóśźż";

/// Strip the diacritic from a lowercase Latin letter
///
/// Covers precomposed letters from Latin-1, Latin Extended-A and the
/// commonly used part of Latin Extended-B.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' | 'ǎ' | 'ǟ' | 'ǡ' | 'ǻ' | 'ȁ'
        | 'ȃ' | 'ȧ' => 'a',
        'ƀ' => 'b',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' | 'ȅ' | 'ȇ' | 'ȩ' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' | 'ǧ' | 'ǵ' => 'g',
        'ĥ' | 'ħ' | 'ȟ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' | 'ǐ' | 'ȉ' | 'ȋ' => 'i',
        'ĵ' | 'ǰ' => 'j',
        'ķ' | 'ǩ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' | 'ŉ' | 'ǹ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' | 'ơ' | 'ǒ' | 'ǫ' | 'ǭ' | 'ǿ'
        | 'ȍ' | 'ȏ' | 'ȫ' | 'ȭ' | 'ȯ' | 'ȱ' => 'o',
        'ŕ' | 'ŗ' | 'ř' | 'ȑ' | 'ȓ' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => 's',
        'ţ' | 'ť' | 'ŧ' | 'ț' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' | 'ư' | 'ǔ' | 'ǖ' | 'ǘ'
        | 'ǚ' | 'ǜ' | 'ȕ' | 'ȗ' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' | 'ȳ' => 'y',
        'ź' | 'ż' | 'ž' | 'ƶ' => 'z',
        other => other,
    }
}

/// Combining diacritical marks, as left behind by decomposed input
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

/// Primary collation weight of one character
///
/// Groups: whitespace and punctuation, then digits, then letters, then
/// everything else, mirroring the usual locale ordering.
fn weight(c: char) -> (u8, u32) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    let letter = if POLISH_LETTERS.contains(lower) {
        lower
    } else {
        fold_diacritic(lower)
    };

    if let Some(index) = POLISH_ALPHABET.chars().position(|a| a == letter) {
        (2, index as u32)
    } else if letter.is_ascii_digit() {
        (1, letter as u32)
    } else if letter.is_whitespace() || letter.is_ascii_punctuation() {
        (0, letter as u32)
    } else {
        (3, letter as u32)
    }
}

/// Compare two names in Polish order, ignoring case
///
/// Names that differ only in case or non-Polish accents compare equal, so a
/// stable sort keeps their original order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let weights = |s: &str| {
        s.chars()
            .filter(|c| !is_combining_mark(*c))
            .map(weight)
            .collect::<Vec<_>>()
    };
    weights(a).cmp(&weights(b))
}

/// Key used to match tile names during settings import
pub fn match_key(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !is_combining_mark(*c))
                .flat_map(char::to_lowercase)
                .map(fold_diacritic)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort_by(|a, b| compare_names(a, b));
        names
    }

    #[test]
    fn test_polish_letters_follow_base_letter() {
        assert_eq!(
            sorted(&["b", "ą", "a", "ć", "c"]),
            vec!["a", "ą", "b", "c", "ć"]
        );
        assert_eq!(sorted(&["ż", "ź", "z"]), vec!["z", "ź", "ż"]);
        assert_eq!(sorted(&["łza", "lato", "mama"]), vec!["lato", "łza", "mama"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(compare_names("Zebra", "zebra"), Ordering::Equal);
        assert_eq!(sorted(&["beta", "Alfa"]), vec!["Alfa", "beta"]);
    }

    #[test]
    fn test_foreign_accents_ignored() {
        assert_eq!(compare_names("café", "cafe"), Ordering::Equal);
    }

    #[test]
    fn test_digits_before_letters() {
        assert_eq!(sorted(&["intro", "01 jingle"]), vec!["01 jingle", "intro"]);
    }

    #[test]
    fn test_stable_for_equal_names() {
        let mut names = vec!["Gong", "gong", "GONG"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, vec!["Gong", "gong", "GONG"]);
    }

    #[test]
    fn test_match_key_normalises() {
        assert_eq!(match_key("  Żółta   Łódź.mp3 "), "zolta lodz.mp3");
        assert_eq!(match_key("Intro\tJingle"), match_key("intro jingle"));
    }

    #[test]
    fn test_match_key_folds_wider_latin() {
        assert_eq!(match_key("Ștefan Țară"), "stefan tara");
        assert_eq!(match_key("ŽUŽU Ǎǐǒǔ"), "zuzu aiou");
        assert_eq!(match_key("Ǧǩ Ơư"), "gk ou");
    }

    #[test]
    fn test_decomposed_input_matches_precomposed() {
        assert_eq!(match_key("Cafe\u{301} Zo\u{301}\u{142}w"), match_key("Café Zółw"));
        assert_eq!(compare_names("e\u{301}cho", "écho"), Ordering::Equal);
    }
}
