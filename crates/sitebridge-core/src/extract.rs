//! Token extraction from opaque response bodies.
//!
//! The target servers document none of these formats, so every extractor is a
//! small pattern-matching heuristic kept apart from control flow. They never
//! fail loudly: anything that does not match yields `None` (or an empty list)
//! and the caller decides what that means.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Success marker followed by the numeric subject id: `OK[42,` or `OK[42]`.
static SUBJECT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"OK\[(\d+)[,\]]").expect("subject regex is hardcoded and valid"));

/// First double-quoted literal in an RPC payload.
static QUOTED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quoted literal regex is hardcoded and valid"));

static HIDDEN_INPUT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"input[type="hidden"]"#).expect("hidden input selector is hardcoded and valid")
});

/// Value of the form input named `field`.
///
/// Matches `name="<field>" ... value="..."` within one tag, in either
/// attribute order, with single or double quotes, ignoring case.
///
/// ```
/// use sitebridge_core::extract::anti_forgery_token;
///
/// let page = r#"<input type="hidden" name="anticsrf" value="XYZ123"/>"#;
/// assert_eq!(anti_forgery_token("anticsrf", page).as_deref(), Some("XYZ123"));
/// assert_eq!(anti_forgery_token("anticsrf", "<form></form>"), None);
/// ```
pub fn anti_forgery_token(field: &str, html: &str) -> Option<String> {
    let name = regex::escape(field);
    let name_first = format!(
        r#"(?i)name\s*=\s*["']{name}["'][^>]*?value\s*=\s*["']([^"']+)["']"#
    );
    let value_first = format!(
        r#"(?i)value\s*=\s*["']([^"']+)["'][^>]*?name\s*=\s*["']{name}["']"#
    );

    [name_first, value_first].iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Every named hidden input on the page, in document order.
///
/// Inputs without a `value` attribute map to an empty string.
pub fn hidden_inputs(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(&HIDDEN_INPUT)
        .filter_map(|input| {
            let element = input.value();
            let name = element.attr("name")?;
            let value = element.attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Numeric subject id following the RPC success marker.
///
/// `None` when the payload is an error envelope or the first value is not a
/// number.
pub fn subject_id(rpc: &str) -> Option<String> {
    SUBJECT_PATTERN
        .captures(rpc)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First quoted literal in an RPC payload.
///
/// Deliberately permissive: the literal's position in the server's array
/// serialization is not stable across versions.
pub fn quoted_literal(rpc: &str) -> Option<String> {
    QUOTED_PATTERN
        .captures(rpc)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anti_forgery_token_from_login_page() {
        let page = r#"<form><input type="hidden" name="anticsrf" value="XYZ123"></form>"#;
        assert_eq!(anti_forgery_token("anticsrf", page).as_deref(), Some("XYZ123"));
    }

    #[test]
    fn anti_forgery_token_single_quotes_and_case() {
        let page = r#"<INPUT NAME='AntiCsrf'   VALUE='tok-9'>"#;
        assert_eq!(anti_forgery_token("anticsrf", page).as_deref(), Some("tok-9"));
    }

    #[test]
    fn anti_forgery_token_value_before_name() {
        let page = r#"<input value="v-1" type="hidden" name="anticsrf">"#;
        assert_eq!(anti_forgery_token("anticsrf", page).as_deref(), Some("v-1"));
    }

    #[test]
    fn anti_forgery_token_does_not_cross_tags() {
        let page = r#"<input name="anticsrf"><input name="other" value="nope">"#;
        assert_eq!(anti_forgery_token("anticsrf", page), None);
    }

    #[test]
    fn anti_forgery_field_is_escaped() {
        let page = r#"<input name="LoginForm[token]" value="t">"#;
        assert_eq!(anti_forgery_token("LoginForm[token]", page).as_deref(), Some("t"));
    }

    #[test]
    fn hidden_inputs_in_document_order() {
        let page = r#"
            <form>
              <input type="hidden" name="YII_CSRF_TOKEN" value="csrf-1">
              <input type="text" name="LoginForm[user_email]" value="">
              <input type="hidden" name="returnUrl">
              <input type="hidden" value="anonymous">
            </form>"#;
        assert_eq!(
            hidden_inputs(page),
            vec![
                ("YII_CSRF_TOKEN".to_string(), "csrf-1".to_string()),
                ("returnUrl".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn subject_id_after_success_marker() {
        assert_eq!(subject_id("//OK[42,0,[],0,7]").as_deref(), Some("42"));
        assert_eq!(subject_id("OK[42]").as_deref(), Some("42"));
    }

    #[test]
    fn subject_id_absent_on_error_envelope() {
        assert_eq!(subject_id("ERR[1,\"denied\"]"), None);
        assert_eq!(subject_id("//EX[2,0,\"x\"]"), None);
        assert_eq!(subject_id("<html>login</html>"), None);
    }

    #[test]
    fn quoted_literal_first_match() {
        assert_eq!(
            quoted_literal(r#"//OK[1,["abcdEFGH1234","second"],0,7]"#).as_deref(),
            Some("abcdEFGH1234")
        );
        assert_eq!(quoted_literal("//OK[1,2,3]"), None);
    }
}
