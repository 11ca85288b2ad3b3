//! Emphasis-markup parser.
//!
//! Converts a weighted prompt string into an ordered sequence of
//! (text, weight) spans. `(span)` multiplies the enclosed weight by 1.1,
//! `[span]` divides by 1.1, `(span:w)` multiplies by the explicit `w`,
//! nesting compounds multiplicatively, and `\(` escapes a literal bracket.
//! Pure function of the string; no I/O.

use pw_types::{ConfigError, PwError, PwResult};

/// Default multiplier applied by a `(span)` group; `[span]` divides by it.
const ATTENTION_MULTIPLIER: f64 = 1.1;

/// Parse a prompt's emphasis markup into weighted spans.
///
/// Adjacent spans with equal weight are merged and whitespace is normalized,
/// so rejoining the span texts with single spaces reproduces the prompt
/// modulo whitespace when weights are discarded.
pub fn parse_prompt_attention(text: &str) -> PwResult<Vec<(String, f64)>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<(String, f64)> = Vec::new();
    let mut round: Vec<usize> = Vec::new();
    let mut square: Vec<usize> = Vec::new();
    let mut buf = String::new();
    let mut i = 0usize;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                // Escaped character, kept literal.
                if i + 1 < chars.len() {
                    buf.push(chars[i + 1]);
                    i += 2;
                } else {
                    buf.push('\\');
                    i += 1;
                }
            }
            '(' => {
                flush(&mut buf, &mut spans);
                round.push(spans.len());
                i += 1;
            }
            '[' => {
                flush(&mut buf, &mut spans);
                square.push(spans.len());
                i += 1;
            }
            ')' => {
                flush(&mut buf, &mut spans);
                let start = round.pop().ok_or_else(|| unmatched(')', i))?;
                multiply_from(&mut spans, start, ATTENTION_MULTIPLIER);
                i += 1;
            }
            ']' => {
                flush(&mut buf, &mut spans);
                let start = square.pop().ok_or_else(|| unmatched(']', i))?;
                multiply_from(&mut spans, start, 1.0 / ATTENTION_MULTIPLIER);
                i += 1;
            }
            ':' if !round.is_empty() => {
                // `(span:1.4)` closes the innermost round group with an
                // explicit weight. A colon not followed by a weight and a
                // closing bracket stays literal text.
                match explicit_weight(&chars, i + 1)? {
                    Some((weight, next)) => {
                        flush(&mut buf, &mut spans);
                        let start = round.pop().expect("round stack checked non-empty");
                        multiply_from(&mut spans, start, weight);
                        i = next;
                    }
                    None => {
                        buf.push(':');
                        i += 1;
                    }
                }
            }
            c => {
                buf.push(c);
                i += 1;
            }
        }
    }

    if !round.is_empty() || !square.is_empty() {
        return Err(ConfigError::UnparsableMarkup {
            message: "unclosed emphasis bracket".to_string(),
        }
        .into());
    }
    flush(&mut buf, &mut spans);

    Ok(normalize(spans))
}

fn flush(buf: &mut String, spans: &mut Vec<(String, f64)>) {
    if !buf.is_empty() {
        spans.push((std::mem::take(buf), 1.0));
    }
}

fn multiply_from(spans: &mut [(String, f64)], start: usize, factor: f64) {
    for span in &mut spans[start..] {
        span.1 *= factor;
    }
}

fn unmatched(bracket: char, position: usize) -> PwError {
    ConfigError::UnparsableMarkup {
        message: format!("unmatched '{bracket}' at position {position}"),
    }
    .into()
}

/// Try to read `\s*<number>\s*)` starting at `from`.
///
/// Returns the weight and the index just past the closing bracket, `None`
/// when the colon is literal text, or an error when the group closes with
/// an empty or malformed weight.
fn explicit_weight(chars: &[char], from: usize) -> PwResult<Option<(f64, usize)>> {
    let mut j = from;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    let number_start = j;
    while j < chars.len() && (chars[j].is_ascii_digit() || matches!(chars[j], '.' | '+' | '-')) {
        j += 1;
    }
    let number: String = chars[number_start..j].iter().collect();
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    if j >= chars.len() || chars[j] != ')' {
        return Ok(None);
    }
    if number.is_empty() {
        return Err(ConfigError::UnparsableMarkup {
            message: "empty explicit weight before ')'".to_string(),
        }
        .into());
    }
    let weight: f64 = number.parse().map_err(|_| ConfigError::UnparsableMarkup {
        message: format!("malformed explicit weight '{number}'"),
    })?;
    Ok(Some((weight, j + 1)))
}

/// Collapse whitespace, drop empty spans, and merge adjacent equal weights.
fn normalize(spans: Vec<(String, f64)>) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = Vec::new();
    for (text, weight) in spans {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some((prev, w)) if *w == weight => {
                prev.push(' ');
                prev.push_str(&text);
            }
            _ => out.push((text, weight)),
        }
    }
    out
}
