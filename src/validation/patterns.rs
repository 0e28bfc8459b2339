//! Compiled patterns and the forbidden-content screen.

use regex::Regex;
use std::sync::OnceLock;

/// Literal fragments rejected anywhere in user text (matched case-insensitively).
pub const FORBIDDEN_WORDS: &[&str] = &[
    "<iframe",
    "<object",
    "<embed",
    "document.cookie",
    "eval(",
    "exec(",
    "drop table",
    "delete from",
    "insert into",
    "union select",
];

const FORBIDDEN_PATTERNS: &[&str] = &[
    r"(?i)<script",
    r"(?i)javascript:",
    r"(?i)on\w+=",
    r"(?i)data:text/html",
    r"(?i)vbscript:",
];

fn compile(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn forbidden_patterns() -> &'static [Regex] {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    CELL.get_or_init(|| {
        FORBIDDEN_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("static pattern compiles"))
            .collect()
    })
}

/// True if the text contains a blocklisted word or a script-injection pattern.
pub fn contains_forbidden(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FORBIDDEN_WORDS.iter().any(|w| lowered.contains(w))
        || forbidden_patterns().iter().any(|re| re.is_match(text))
}

/// `<amount> <description>` with a mandatory description.
pub fn expense_strict() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^(\d+[.,]?\d*)\s+(.+)$")
}

/// `<amount> [description]`.
pub fn expense_loose() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^(\d+[.,]?\d*)(?:\s+(.*))?$")
}

/// Expense descriptions: Cyrillic/Latin letters, digits, space, light punctuation.
pub fn description_charset() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r#"^[a-zA-Zа-яА-ЯёЁ0-9 .,!?()\-:;"']+$"#)
}

pub fn command() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^/[a-zA-Z0-9_]+$")
}

pub fn callback_charset() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^[a-zA-Zа-яА-ЯёЁ0-9_|:.\-]+$")
}

pub fn username() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^[A-Za-z0-9_]{5,32}$")
}

/// Person names: any letter, space, hyphen, apostrophe.
pub fn person_name() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^[\p{L} '\-]+$")
}

pub fn currency_code() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compile(&CELL, r"^[A-Z]{3}$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_patterns() {
        assert!(contains_forbidden("<SCRIPT>alert(1)"));
        assert!(contains_forbidden("click javascript:void(0)"));
        assert!(contains_forbidden("img onerror=boom"));
        assert!(contains_forbidden("data:text/html;base64,xx"));
        assert!(contains_forbidden("VBScript:msgbox"));
        assert!(contains_forbidden("1; DROP TABLE users"));
        // no word boundary: the handler name may be glued to other text
        assert!(contains_forbidden("phone=5"));
        assert!(contains_forbidden("x_onload=alert"));
    }

    #[test]
    fn test_ordinary_text_is_allowed() {
        assert!(!contains_forbidden("200 продукты"));
        assert!(!contains_forbidden("total 5"));
        assert!(!contains_forbidden("category|Транспорт"));
    }

    #[test]
    fn test_charsets() {
        assert!(description_charset().is_match("Кофе с молоком, 2 шт."));
        assert!(!description_charset().is_match("кофе <b>"));
        assert!(callback_charset().is_match("category|Транспорт"));
        assert!(!callback_charset().is_match("a b"));
        assert!(person_name().is_match("Jean-Luc O'Neil"));
        assert!(person_name().is_match("Анна"));
        assert!(!person_name().is_match("R2D2"));
    }
}
