//! Guessing who wrote an email: person, company and phone.

use crate::html::compact_ws;

use super::patterns::{
    contains_any, COMPANY_LABELS, COMPANY_SEPARATOR, CONTACT_LABEL, CONTACT_TOKENS, NOISE_TOKENS,
    PHONE_CANDIDATE, SIGNOFF_CUES, SIGNOFF_PATTERNS, WEBMAIL_DOMAINS, WORD_SEPARATOR,
};

const SIGNATURE_WINDOW: usize = 400;
const LEADING_WINDOW: usize = 800;
const NAME_WINDOW: usize = 240;
const MAX_NAME_LEN: usize = 60;
const MIN_PHONE_DIGITS: usize = 10;

/// First `n` characters of `text`.
fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Text following each sign-off cue found in `body`, `window` chars long.
fn signature_blocks(body: &str, window: usize) -> Vec<&str> {
    SIGNOFF_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.find(body))
        .map(|found| take_chars(&body[found.start()..], window))
        .collect()
}

/// Longest run of at least ten digits among phone-shaped tokens.
pub fn extract_phone(text: &str) -> String {
    let mut best = String::new();
    for found in PHONE_CANDIDATE.find_iter(text) {
        let digits: String = found.as_str().chars().filter(char::is_ascii_digit).collect();
        if digits.len() >= MIN_PHONE_DIGITS && digits.len() > best.len() {
            best = digits;
        }
    }
    best
}

/// "acme-tech" -> "Acme Tech".
pub fn titlecase(text: &str) -> String {
    WORD_SEPARATOR
        .split(text)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Reduce a signature fragment to a plausible company name.
pub fn clean_company(text: &str) -> String {
    let parts: Vec<String> = COMPANY_SEPARATOR.split(text).map(compact_ws).collect();
    parts
        .iter()
        .find(|part| {
            let len = part.chars().count();
            (2..=MAX_NAME_LEN).contains(&len) && !contains_any(&part.to_lowercase(), NOISE_TOKENS)
        })
        .cloned()
        .unwrap_or_else(|| {
            parts
                .first()
                .map(|first| take_chars(first, MAX_NAME_LEN).trim().to_string())
                .unwrap_or_default()
        })
}

/// A `Company: ...` label near the signature, else in the opening text.
fn labeled_company(body: &str) -> Option<String> {
    let blocks = signature_blocks(body, SIGNATURE_WINDOW);
    let candidate = if blocks.is_empty() {
        take_chars(body, LEADING_WINDOW).to_string()
    } else {
        blocks.join("\n")
    };

    COMPANY_LABELS.iter().find_map(|pattern| {
        let caps = pattern.captures(&candidate)?;
        let value = compact_ws(&caps[1]);
        let value = CONTACT_LABEL.split(&value).next().unwrap_or_default();
        let value = value.trim_matches([' ', '-', '|', '·', ':', ';', ',']);
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Brand guessed from the sender domain, skipping free-mail providers.
fn domain_company(from_addr: &str) -> Option<String> {
    let (_, domain) = from_addr.split_once('@')?;
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    let mut core = labels[labels.len() - 2];
    if WEBMAIL_DOMAINS.contains(&core.to_lowercase().as_str()) {
        if labels.len() < 3 {
            return None;
        }
        core = labels[labels.len() - 3];
    }
    Some(titlecase(core))
}

/// Display name usable as a company: at most two words, no address syntax.
fn display_name_company(display_name: &str) -> Option<String> {
    let short = display_name.split_whitespace().count() <= 2;
    let clean = !display_name.contains(['@', '<', '>']);
    (!display_name.is_empty() && short && clean).then(|| display_name.to_string())
}

/// Company cascade: signature label, then sender domain, then display name.
pub fn guess_company(display_name: &str, from_addr: &str, body: &str) -> String {
    let raw = labeled_company(body)
        .or_else(|| domain_company(from_addr))
        .or_else(|| display_name_company(display_name))
        .unwrap_or_default();
    clean_company(&raw)
}

/// The sender's name: the display name, else the first plausible line
/// after a sign-off.
pub fn guess_person_name(display_name: &str, body: &str) -> String {
    if display_name.chars().count() >= 2 {
        return display_name.to_string();
    }

    for block in signature_blocks(body, NAME_WINDOW) {
        let candidate = block
            .lines()
            .skip(1)
            .map(compact_ws)
            .find(|line| !line.is_empty() && !is_signoff_line(line));
        if let Some(line) = candidate {
            let len = line.chars().count();
            if (2..=MAX_NAME_LEN).contains(&len) && !contains_any(&line.to_lowercase(), CONTACT_TOKENS) {
                return line;
            }
        }
    }
    String::new()
}

fn is_signoff_line(line: &str) -> bool {
    let bare = line.trim_end_matches([',', '.', '!']).to_lowercase();
    SIGNOFF_CUES.contains(&bare.as_str())
}
