//! PII masking rules applied to every log message regardless of emitter.

use lazy_static::lazy_static;
use regex::Regex;

const STREET_SUFFIXES: &str =
    "Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln|Way|Court|Ct|Place|Pl|Circle|Cir|Terrace|Ter";

lazy_static! {
    // 123 Main Street, Springfield, IL
    static ref STREET_ADDRESS: Regex = Regex::new(&format!(
        r"\b\d+\s+(?:[A-Za-z0-9.']+\s+){{0,4}}(?:{})\.?\s*,?\s+([A-Za-z][A-Za-z .']*?),\s*([A-Z]{{2}})\b",
        STREET_SUFFIXES
    ))
    .expect("street address pattern");

    // No recognised suffix: still mask the leading tokens before "City, ST".
    static ref LOOSE_ADDRESS: Regex =
        Regex::new(r"\b\d+\s+[A-Za-z0-9 .']+?,\s+([A-Za-z][A-Za-z .']*?),\s*([A-Z]{2})\b")
            .expect("loose address pattern");

    static ref LONG_DIGIT_RUN: Regex = Regex::new(r"\d{10,}").expect("digit run pattern");

    static ref SHORT_PHONE: Regex =
        Regex::new(r"\b\d{3}-\d{4}\b|\b\d{7}\b").expect("short phone pattern");
}

/// Mask personally identifying substrings in a log message.
///
/// Rules, in order: street-style addresses, runs of 10+ digits (account and
/// phone numbers keep their last four), then 7-digit phone forms.
pub fn mask_pii(input: &str) -> String {
    let masked = STREET_ADDRESS.replace_all(input, |caps: &regex::Captures| {
        format!("*** {}, {} ***", caps[1].to_uppercase(), &caps[2])
    });
    let masked = LOOSE_ADDRESS.replace_all(&masked, |caps: &regex::Captures| {
        format!("*** {}, {} ***", caps[1].to_uppercase(), &caps[2])
    });
    let masked = LONG_DIGIT_RUN.replace_all(&masked, |caps: &regex::Captures| {
        let digits = &caps[0];
        format!("***-***-{}", &digits[digits.len() - 4..])
    });
    SHORT_PHONE.replace_all(&masked, "***-***-****").into_owned()
}

/// Null in, null out: absent values stay absent instead of becoming a
/// masked placeholder.
pub fn mask_pii_opt(input: Option<&str>) -> Option<String> {
    input.map(mask_pii)
}

/// Mask the host portion of a client address: last octet for IPv4, the
/// whole literal for IPv6.
pub fn mask_client_ip(ip: &str) -> String {
    if ip.contains(':') {
        return "masked".to_string();
    }
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() == 4 && parts.iter().all(|p| p.parse::<u8>().is_ok()) {
        format!("{}.{}.{}.***", parts[0], parts[1], parts[2])
    } else {
        ip.to_string()
    }
}

/// Replacement for user-controlled strings that vanish entirely under
/// sanitization.
pub const EMPTY_PLACEHOLDER: &str = "-";

/// Strip CR/LF and other control characters so user-controlled values cannot
/// forge log lines.
pub fn sanitize_log_value(value: &str) -> String {
    let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
    if cleaned.trim().is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}

const MAX_USER_AGENT: usize = 256;

/// Bound User-Agent values; an ellipsis marks truncation.
pub fn truncate_user_agent(ua: &str) -> String {
    if ua.chars().count() <= MAX_USER_AGENT {
        ua.to_string()
    } else {
        let mut out: String = ua.chars().take(MAX_USER_AGENT).collect();
        out.push('…');
        out
    }
}

const SENSITIVE_PARAMS: [&str; 7] = [
    "token",
    "password",
    "secret",
    "api_key",
    "apikey",
    "access_token",
    "refresh_token",
];

/// Redact the values of sensitive query parameters while keeping the
/// parameter names visible.
pub fn redact_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    query
        .split('&')
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let name = parts.next().unwrap_or("");
            match parts.next() {
                Some(value) => {
                    if SENSITIVE_PARAMS.contains(&name.to_ascii_lowercase().as_str()) {
                        format!("{}=***", name)
                    } else {
                        format!("{}={}", name, value)
                    }
                }
                None => name.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}
