use unicode_normalization::UnicodeNormalization;

/// Canonical comparison form: NFKC, whitespace runs collapsed to one space, trimmed.
pub fn normalize(text: &str) -> String {
    let composed = text.nfkc().collect::<String>();
    collapse_whitespace(&composed)
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unifies_full_width_variants() {
        assert_eq!(normalize("ＡＢＣ１２３"), "ABC123");
        assert_eq!(normalize("ｶﾀｶﾅ"), "カタカナ");
        assert_eq!(normalize("愛知県\u{3000}名古屋市"), "愛知県 名古屋市");
    }

    #[test]
    fn normalize_collapses_and_trims_whitespace() {
        assert_eq!(normalize("  a\t\tb\n\nc  "), "a b c");
        assert_eq!(normalize("\u{3000}\u{3000}"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "",
            "   ",
            "plain ascii text",
            "ＦＵＬＬ　ＷＩＤＴＨ　ｔｅｘｔ",
            "ﾊﾝｶｸ ｶﾀｶﾅ ﾃﾞｽ",
            "e\u{0301} composed",
            " \u{00B4}leading spacing accent",
            "ligature \u{FB01}ne and \u{2460} circled",
            "mixed\r\n line\u{000B}breaks\u{2028}here",
            "㍿ ㌔ ㈱",
        ];

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }
}
