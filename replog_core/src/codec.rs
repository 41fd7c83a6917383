//! Pure value transforms for set inputs and timer durations.
//!
//! Everything in this module is stateless. Inputs are sanitized rather
//! than validated-and-rejected: unparsable text collapses to an empty or
//! truncated string, and numeric parsing downstream defaults to 0.

const WEIGHT_MAX_CHARS: usize = 7;
const REPS_MAX_CHARS: usize = 7;
const RIR_MAX_CHARS: usize = 5;
const TIMER_MINUTES_CAP: u32 = 99;
const TIMER_SECONDS_CAP: u32 = 59;

/// Sanitize free-text weight input
///
/// Keeps digits and at most one `.`, truncated to 7 characters.
pub fn sanitize_weight(raw: &str) -> String {
    sanitize(raw, '.', WEIGHT_MAX_CHARS)
}

/// Sanitize free-text reps input (plain integer or `lo-hi` range)
///
/// Keeps digits and at most one `-`, truncated to 7 characters.
pub fn sanitize_reps(raw: &str) -> String {
    sanitize(raw, '-', REPS_MAX_CHARS)
}

/// Sanitize free-text RIR input, same shape as reps but capped at 5 chars
pub fn sanitize_rir(raw: &str) -> String {
    sanitize(raw, '-', RIR_MAX_CHARS)
}

fn sanitize(raw: &str, separator: char, max_chars: usize) -> String {
    let mut out = String::with_capacity(raw.len().min(max_chars));
    let mut seen_separator = false;

    for c in raw.chars() {
        if out.len() >= max_chars {
            break;
        }
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == separator && !seen_separator {
            seen_separator = true;
            out.push(c);
        }
    }

    out
}

/// Reduce a possibly ranged value (`"lo-hi"`) to its lower bound
///
/// Plain numeric strings return their value; unparsable input yields 0.
pub fn range_lower(text: &str) -> f64 {
    let lower = match text.split_once('-') {
        Some((lo, _)) => lo,
        None => text,
    };
    lower.trim().parse::<f64>().unwrap_or(0.0)
}

/// Collapse a ranged value to its textual lower bound
///
/// Non-range input is returned unchanged; a range with an unparsable
/// lower bound collapses to `"0"`.
pub fn collapse_range(text: &str) -> String {
    match text.split_once('-') {
        Some((lo, _)) if lo.trim().parse::<f64>().is_ok() => lo.trim().to_string(),
        Some(_) => "0".to_string(),
        None => text.to_string(),
    }
}

/// Derive the total for a set: `round(weight * reps)`, using the lower
/// bound when reps is a range
///
/// The total is blank only when weight and reps are both empty; otherwise
/// unparsable operands default to 0 and the rounded product is returned.
pub fn derive_total(weight: &str, reps: &str) -> String {
    if weight.is_empty() && reps.is_empty() {
        return String::new();
    }
    let w = weight.parse::<f64>().unwrap_or(0.0);
    let r = range_lower(reps);
    ((w * r).round() as i64).to_string()
}

/// Re-format raw timer digit input while editing
///
/// Two or fewer digits pass through unchanged (seconds-only while
/// editing). Three or more: the last two digits become seconds capped at
/// 59, the remainder becomes minutes capped at 99, rendered `M:SS` with
/// no leading zero on minutes.
pub fn format_timer_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 2 {
        return digits;
    }

    let split = digits.len() - 2;
    // The minute part is all digits, so a failed parse means overflow;
    // treat it as over the cap rather than zero.
    let minutes = digits[..split]
        .parse::<u32>()
        .unwrap_or(TIMER_MINUTES_CAP)
        .min(TIMER_MINUTES_CAP);
    let seconds = digits[split..]
        .parse::<u32>()
        .unwrap_or(0)
        .min(TIMER_SECONDS_CAP);

    format!("{}:{:02}", minutes, seconds)
}

/// Parse a stored duration (`M:SS` or plain seconds) into total seconds
///
/// Unparsable input yields 0.
pub fn parse_duration(text: &str) -> u32 {
    match text.split_once(':') {
        Some((minutes, seconds)) => {
            let m = minutes.trim().parse::<u32>().unwrap_or(0);
            let s = seconds.trim().parse::<u32>().unwrap_or(0);
            m * 60 + s
        }
        None => text.trim().parse::<u32>().unwrap_or(0),
    }
}

/// Render a seconds count as `M:SS` with no leading zero on minutes
pub fn format_seconds(total: u32) -> String {
    format!("{}:{:02}", total / 60, total % 60)
}

/// Normalize a bare 1-2 digit stored timer value to canonical `00:SS`
///
/// Applied when that set's countdown expires; any other shape is left
/// alone and `None` is returned.
pub fn normalize_expired(text: &str) -> Option<String> {
    if text.is_empty() || text.len() > 2 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let seconds = text.parse::<u32>().unwrap_or(0);
    Some(format!("00:{:02}", seconds))
}
