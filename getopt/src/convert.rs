//! Text to value conversions used by the typed slots.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::error::ConversionError;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A scalar that can be read from a single command-line argument.
pub trait FromArg: Sized {
    /// Short type name shown in help output.
    const KIND: &'static str;

    fn from_arg(arg: &str) -> Result<Self, ConversionError>;
}

impl FromArg for String {
    const KIND: &'static str = "string";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        Ok(arg.to_string())
    }
}

impl FromArg for i64 {
    const KIND: &'static str = "int";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        parse_int(arg)
    }
}

impl FromArg for i32 {
    const KIND: &'static str = "int";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        let n = parse_int(arg)?;
        i32::try_from(n).map_err(|_| ConversionError::new(arg, "out of range for i32"))
    }
}

impl FromArg for u64 {
    const KIND: &'static str = "uint";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        parse_uint(arg)
    }
}

impl FromArg for u32 {
    const KIND: &'static str = "uint";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        let n = parse_uint(arg)?;
        u32::try_from(n).map_err(|_| ConversionError::new(arg, "out of range for u32"))
    }
}

impl FromArg for f64 {
    const KIND: &'static str = "float";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        arg.parse()
            .map_err(|e: std::num::ParseFloatError| ConversionError::new(arg, e.to_string()))
    }
}

impl FromArg for f32 {
    const KIND: &'static str = "float";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        arg.parse()
            .map_err(|e: std::num::ParseFloatError| ConversionError::new(arg, e.to_string()))
    }
}

impl FromArg for bool {
    const KIND: &'static str = "bool";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        parse_bool(arg)
    }
}

impl FromArg for Duration {
    const KIND: &'static str = "duration";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        parse_duration(arg)
    }
}

impl FromArg for Timestamp {
    const KIND: &'static str = "time";

    fn from_arg(arg: &str) -> Result<Self, ConversionError> {
        parse_time(arg)
    }
}

// ============================================================================
// Integers
// ============================================================================

/// Pick the radix for an unsigned literal and return it with the digits.
///
/// `0x` hex, `0b` binary, `0d` decimal, `0o` octal, `0t` base 32 and `0s`
/// base 64 (either case). Any other leading `0` means octal.
fn split_radix(digits: &str) -> (u32, &str) {
    let Some(rest) = digits.strip_prefix('0') else {
        return (10, digits);
    };
    let radix = match rest.chars().next() {
        None => return (8, "0"),
        Some('x' | 'X') => 16,
        Some('b' | 'B') => 2,
        Some('d' | 'D') => 10,
        Some('o' | 'O') => 8,
        Some('t' | 'T') => 32,
        Some('s' | 'S') => 64,
        Some(_) => return (8, rest),
    };
    (radix, &rest[1..])
}

fn digit_value(c: char, radix: u32) -> Option<u32> {
    if radix <= 36 {
        return c.to_digit(radix);
    }
    // base 64: 0-9, a-z, A-Z, '-', '_'
    let v = match c {
        '0'..='9' => c as u32 - '0' as u32,
        'a'..='z' => c as u32 - 'a' as u32 + 10,
        'A'..='Z' => c as u32 - 'A' as u32 + 36,
        '-' => 62,
        '_' => 63,
        _ => return None,
    };
    (v < radix).then_some(v)
}

fn parse_magnitude(arg: &str, digits: &str) -> Result<u64, ConversionError> {
    let (radix, digits) = split_radix(digits);
    if digits.is_empty() {
        return Err(ConversionError::new(arg, "no digits"));
    }
    let mut n: u64 = 0;
    for c in digits.chars() {
        let d = digit_value(c, radix)
            .ok_or_else(|| ConversionError::new(arg, format!("invalid digit for base {}", radix)))?;
        n = n
            .checked_mul(u64::from(radix))
            .and_then(|n| n.checked_add(u64::from(d)))
            .ok_or_else(|| ConversionError::new(arg, "number too large"))?;
    }
    Ok(n)
}

pub fn parse_int(arg: &str) -> Result<i64, ConversionError> {
    let (negative, digits) = match arg.as_bytes().first() {
        Some(b'-') => (true, &arg[1..]),
        Some(b'+') => (false, &arg[1..]),
        _ => (false, arg),
    };
    let magnitude = parse_magnitude(arg, digits)?;
    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.ok_or_else(|| ConversionError::new(arg, "out of range for i64"))
}

pub fn parse_uint(arg: &str) -> Result<u64, ConversionError> {
    let digits = arg.strip_prefix('+').unwrap_or(arg);
    parse_magnitude(arg, digits)
}

// ============================================================================
// Booleans and durations
// ============================================================================

pub fn parse_bool(arg: &str) -> Result<bool, ConversionError> {
    match arg {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ConversionError::new(arg, "not a boolean")),
    }
}

/// Parse `300ms`, `1.5h` or `2h45m` style durations. Negative values are
/// rejected.
pub fn parse_duration(arg: &str) -> Result<Duration, ConversionError> {
    let text = arg.strip_prefix('+').unwrap_or(arg);
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err(ConversionError::new(arg, "empty duration"));
    }

    let mut total_ns: u128 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(ConversionError::new(arg, "expected a number"));
        }
        let amount: f64 = rest[..num_len]
            .parse()
            .map_err(|_| ConversionError::new(arg, "bad number"))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_ns: u64 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(ConversionError::new(arg, "missing unit")),
            unit => return Err(ConversionError::new(arg, format!("unknown unit {:?}", unit))),
        };
        rest = &rest[unit_len..];

        let ns = (amount * unit_ns as f64).round();
        if !ns.is_finite() || ns >= u128::MAX as f64 {
            return Err(ConversionError::new(arg, "duration too large"));
        }
        total_ns = total_ns
            .checked_add(ns as u128)
            .ok_or_else(|| ConversionError::new(arg, "duration too large"))?;
    }

    let secs = u64::try_from(total_ns / u128::from(NANOS_PER_SEC))
        .map_err(|_| ConversionError::new(arg, "duration too large"))?;
    Ok(Duration::new(secs, (total_ns % u128::from(NANOS_PER_SEC)) as u32))
}

// ============================================================================
// Timestamps
// ============================================================================

/// A point in time with the UTC offset it was written with.
pub type Timestamp = DateTime<FixedOffset>;

/// Parse an RFC 3339 timestamp such as `2006-01-02T15:04:05+07:00`.
pub fn parse_time(arg: &str) -> Result<Timestamp, ConversionError> {
    DateTime::parse_from_rfc3339(arg).map_err(|e| ConversionError::new(arg, e.to_string()))
}

/// Split a `key:value` map entry. A missing `:` yields an empty value.
pub fn split_entry(arg: &str) -> (&str, &str) {
    arg.split_once(':').unwrap_or((arg, ""))
}
