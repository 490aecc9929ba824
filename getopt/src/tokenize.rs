//! Splits an argument vector into option and positional tokens.
//!
//! The scan is driven by a getopt(3) style spec string such as `"hvo:t::"`:
//! each letter is a short option, one `:` after it means the option needs an
//! argument and `::` means the argument is optional. The spec may start with
//! any of:
//!
//! - `+` stop at the first positional (POSIX behaviour);
//! - `-` keep positionals in place instead of moving them after the options;
//! - `:` do not report errors automatically.
//!
//! Long options (`--name`, `--name=value`) need no declaration. Short letters
//! missing from the spec come out as plain flags; deciding whether they are
//! known is the registry's job.

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};

use crate::error::Error;

// ============================================================================
// Token
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An option occurrence: `-x` or `--name`, with its attached argument.
    Flag { name: String, value: Option<String> },
    /// A bare argument.
    Positional(String),
}

impl Token {
    pub fn flag(name: impl Into<String>) -> Self {
        Token::Flag {
            name: name.into(),
            value: None,
        }
    }

    pub fn flag_with(name: impl Into<String>, value: impl Into<String>) -> Self {
        Token::Flag {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn positional(value: impl Into<String>) -> Self {
        Token::Positional(value.into())
    }

    fn short(c: char) -> Self {
        Token::flag(format!("-{}", c))
    }

    fn short_with(c: char, value: &str) -> Self {
        Token::flag_with(format!("-{}", c), value)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Flag { name, .. } => Some(name),
            Token::Positional(_) => None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Token::Flag { value, .. } => value.as_deref(),
            Token::Positional(v) => Some(v),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Flag { name, value: None } => write!(f, "{}", name),
            Token::Flag {
                name,
                value: Some(v),
            } if name.starts_with("--") => write!(f, "{}='{}'", name, v),
            Token::Flag {
                name,
                value: Some(v),
            } => write!(f, "{} '{}'", name, v),
            Token::Positional(v) => write!(f, "'{}'", v),
        }
    }
}

// ============================================================================
// Spec string
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Required,
    Optional,
}

/// Parsed form of a spec string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanConfig {
    pub posix: bool,
    pub in_order: bool,
    pub quiet: bool,
    arity: HashMap<char, Arity>,
}

impl ScanConfig {
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let malformed = |reason: String| Error::Spec {
            spec: spec.to_string(),
            reason,
        };

        let mut cfg = ScanConfig::default();
        let body = spec.trim_start_matches(['+', '-', ':']);
        for marker in spec[..spec.len() - body.len()].chars() {
            match marker {
                '+' => cfg.posix = true,
                '-' => cfg.in_order = true,
                _ => cfg.quiet = true,
            }
        }

        let mut last: Option<char> = None;
        for c in body.chars() {
            match c {
                ':' => {
                    // body never starts with ':', so a letter precedes it
                    let Some(letter) = last else { continue };
                    let arity = cfg.arity.entry(letter).or_insert(Arity::None);
                    *arity = match *arity {
                        Arity::None => Arity::Required,
                        Arity::Required => Arity::Optional,
                        Arity::Optional => {
                            return Err(malformed(format!("too many ':' after '{}'", letter)))
                        }
                    };
                }
                '+' | '-' => {
                    return Err(malformed(format!("'{}' is only allowed as a prefix", c)));
                }
                _ => {
                    if cfg.arity.insert(c, Arity::None).is_some() {
                        return Err(malformed(format!("'{}' declared twice", c)));
                    }
                    last = Some(c);
                }
            }
        }
        Ok(cfg)
    }

    /// Arity of a short letter; undeclared letters take no argument.
    pub fn arity(&self, c: char) -> Arity {
        self.arity.get(&c).copied().unwrap_or(Arity::None)
    }

    /// Scan `args`, skipping `args[0]`.
    ///
    /// A lone `-` is a positional argument, not an empty cluster.
    ///
    /// Tokens are returned even when the scan fails: a required option left
    /// without its argument at the end of `args` is appended without a value.
    pub fn scan<S: AsRef<str>>(&self, args: &[S]) -> (Vec<Token>, Option<Error>) {
        let mut tokens = Vec::with_capacity(args.len());
        let mut tail = Vec::new();
        let mut pending: Option<char> = None;

        let mut rest = args.iter().skip(1).map(AsRef::as_ref);
        while let Some(arg) = rest.next() {
            if let Some(c) = pending.take() {
                tokens.push(Token::short_with(c, arg));
                continue;
            }

            if arg == "-" || !arg.starts_with('-') {
                if self.posix {
                    tokens.push(Token::positional(arg));
                    tokens.extend(rest.by_ref().map(Token::positional));
                    break;
                } else if self.in_order {
                    tokens.push(Token::positional(arg));
                } else {
                    tail.push(Token::positional(arg));
                }
                continue;
            }

            if arg == "--" {
                tokens.extend(rest.by_ref().map(Token::positional));
                break;
            }

            if arg.starts_with("--") {
                tokens.push(match arg.split_once('=') {
                    Some((name, value)) => Token::flag_with(name, value),
                    None => Token::flag(arg),
                });
                continue;
            }

            let cluster = &arg[1..];
            for (pos, c) in cluster.char_indices() {
                let attached = &cluster[pos + c.len_utf8()..];
                match self.arity(c) {
                    Arity::None => tokens.push(Token::short(c)),
                    _ if !attached.is_empty() => {
                        tokens.push(Token::short_with(c, attached));
                        break;
                    }
                    Arity::Required => pending = Some(c),
                    Arity::Optional => tokens.push(Token::short(c)),
                }
            }
        }

        let error = pending.map(|c| {
            debug!("-{} is missing its argument", c);
            tokens.push(Token::short(c));
            Error::MissingArgument(format!("-{}", c))
        });

        tokens.append(&mut tail);
        trace!("scanned {} arguments into {} tokens", args.len().saturating_sub(1), tokens.len());
        (tokens, error)
    }
}

/// Tokenize `args` against a getopt spec string.
pub fn tokenize<S: AsRef<str>>(args: &[S], spec: &str) -> (Vec<Token>, Option<Error>) {
    match ScanConfig::parse(spec) {
        Ok(cfg) => cfg.scan(args),
        Err(e) => (Vec::new(), Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positionals(tokens: &[Token]) -> Vec<&str> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Positional(v) => Some(v.as_str()),
                _ => None,
            })
            .collect()
    }

    const CLUSTER_ARGS: &[&str] = &[
        "cmd",
        "-hV",
        "-l",
        "-fiinput",
        "-o",
        "output",
        "-xt",
        "-yqquote",
        "-zr",
        "--flag=value",
        "--other",
        "zeta",
        "kappa",
        "--",
        "-o",
        "theta",
    ];

    fn cluster_options() -> Vec<Token> {
        vec![
            Token::flag("-h"),
            Token::flag("-V"),
            Token::flag("-l"),
            Token::flag("-f"),
            Token::flag_with("-i", "input"),
            Token::flag_with("-o", "output"),
            Token::flag("-x"),
            Token::flag("-t"),
            Token::flag("-y"),
            Token::flag_with("-q", "quote"),
            Token::flag("-z"),
            Token::flag("-r"),
            Token::flag_with("--flag", "value"),
            Token::flag("--other"),
        ]
    }

    // -- spec string --

    #[test]
    fn spec_empty() {
        let cfg = ScanConfig::parse("").unwrap();
        assert_eq!(cfg, ScanConfig::default());
    }

    #[test]
    fn spec_arities() {
        let cfg = ScanConfig::parse("hVi:o::").unwrap();
        assert_eq!(cfg.arity('h'), Arity::None);
        assert_eq!(cfg.arity('V'), Arity::None);
        assert_eq!(cfg.arity('i'), Arity::Required);
        assert_eq!(cfg.arity('o'), Arity::Optional);
        assert_eq!(cfg.arity('q'), Arity::None);
        assert!(!cfg.posix && !cfg.in_order && !cfg.quiet);
    }

    #[test]
    fn spec_prefix_markers() {
        let cfg = ScanConfig::parse("+hVo:").unwrap();
        assert!(cfg.posix);
        assert!(!cfg.quiet);

        let cfg = ScanConfig::parse("-hVo:").unwrap();
        assert!(cfg.in_order);
        assert!(!cfg.posix);

        let cfg = ScanConfig::parse("+:hVo:").unwrap();
        assert!(cfg.posix && cfg.quiet);
        assert_eq!(cfg.arity('o'), Arity::Required);
    }

    #[test]
    fn spec_rejects_repeated_letter() {
        assert!(matches!(ScanConfig::parse("ab:a"), Err(Error::Spec { .. })));
    }

    #[test]
    fn spec_rejects_three_colons() {
        assert!(matches!(ScanConfig::parse("a:::"), Err(Error::Spec { .. })));
    }

    #[test]
    fn spec_rejects_inner_marker() {
        assert!(matches!(ScanConfig::parse("a+b"), Err(Error::Spec { .. })));
    }

    #[test]
    fn bad_spec_yields_no_tokens() {
        let (tokens, err) = tokenize(&["cmd", "-a"], "aa");
        assert!(tokens.is_empty());
        assert!(matches!(err, Some(Error::Spec { .. })));
    }

    // -- scanning --

    #[test]
    fn gnu_mode_full_scenario() {
        let (tokens, err) = tokenize(CLUSTER_ARGS, "hVli:o:t::q::r::xyzf");
        assert!(err.is_none());
        let mut want = cluster_options();
        want.extend(["-o", "theta", "zeta", "kappa"].map(Token::positional));
        assert_eq!(tokens, want);
    }

    #[test]
    fn posix_mode_full_scenario() {
        let (tokens, err) = tokenize(CLUSTER_ARGS, "+hVli:o:t::q::r::xyzf");
        assert!(err.is_none());
        let mut want = cluster_options();
        want.extend(["zeta", "kappa", "--", "-o", "theta"].map(Token::positional));
        assert_eq!(tokens, want);
    }

    #[test]
    fn terminator_list_precedes_buffered_tail() {
        let (tokens, _) = tokenize(&["cmd", "a", "-x", "--", "b", "c"], "x");
        assert_eq!(tokens[0], Token::flag("-x"));
        assert_eq!(positionals(&tokens), ["b", "c", "a"]);
    }

    #[test]
    fn gnu_mode_moves_positionals_last() {
        let (tokens, _) = tokenize(&["cmd", "one", "-a", "two", "-b", "three"], "ab");
        assert_eq!(
            tokens,
            vec![
                Token::flag("-a"),
                Token::flag("-b"),
                Token::positional("one"),
                Token::positional("two"),
                Token::positional("three"),
            ]
        );
    }

    #[test]
    fn in_order_mode_keeps_positionals_in_place() {
        let (tokens, _) = tokenize(&["cmd", "one", "-a", "two"], "-a");
        assert_eq!(
            tokens,
            vec![
                Token::positional("one"),
                Token::flag("-a"),
                Token::positional("two"),
            ]
        );
    }

    #[test]
    fn required_last_in_cluster_takes_next_argument() {
        let (tokens, err) = tokenize(&["cmd", "-ao", "out"], "ao:");
        assert!(err.is_none());
        assert_eq!(tokens, vec![Token::flag("-a"), Token::flag_with("-o", "out")]);
    }

    #[test]
    fn required_argument_may_look_like_an_option() {
        let (tokens, err) = tokenize(&["cmd", "-n", "-5", "--", "x"], "n:");
        assert!(err.is_none());
        assert_eq!(
            tokens,
            vec![Token::flag_with("-n", "-5"), Token::positional("x")]
        );
    }

    #[test]
    fn required_argument_may_be_empty() {
        let (tokens, _) = tokenize(&["cmd", "-o", ""], "o:");
        assert_eq!(tokens, vec![Token::flag_with("-o", "")]);
    }

    #[test]
    fn required_non_last_consumes_cluster_rest() {
        let (tokens, err) = tokenize(&["cmd", "-oab"], "o:ab");
        assert!(err.is_none());
        assert_eq!(tokens, vec![Token::flag_with("-o", "ab")]);
    }

    #[test]
    fn missing_required_argument_is_an_error() {
        let (tokens, err) = tokenize(&["cmd", "pos", "-ao"], "ao:");
        assert_eq!(err, Some(Error::MissingArgument("-o".to_string())));
        assert_eq!(
            tokens,
            vec![
                Token::flag("-a"),
                Token::flag("-o"),
                Token::positional("pos"),
            ]
        );
    }

    #[test]
    fn optional_argument_is_never_taken_from_next() {
        let (tokens, err) = tokenize(&["cmd", "-t", "value"], "t::");
        assert!(err.is_none());
        assert_eq!(tokens, vec![Token::flag("-t"), Token::positional("value")]);
    }

    #[test]
    fn undeclared_letters_are_plain_flags() {
        let (tokens, err) = tokenize(&["cmd", "-qz"], "a");
        assert!(err.is_none());
        assert_eq!(tokens, vec![Token::flag("-q"), Token::flag("-z")]);
    }

    #[test]
    fn long_option_splits_on_first_equals() {
        let (tokens, _) = tokenize(&["cmd", "--define=a=b", "--empty=", "--bare"], "");
        assert_eq!(
            tokens,
            vec![
                Token::flag_with("--define", "a=b"),
                Token::flag_with("--empty", ""),
                Token::flag("--bare"),
            ]
        );
    }

    #[test]
    fn long_option_never_takes_next_argument() {
        let (tokens, _) = tokenize(&["cmd", "--str", "val"], "");
        assert_eq!(tokens, vec![Token::flag("--str"), Token::positional("val")]);
    }

    #[test]
    fn lone_dash_is_positional() {
        let (tokens, _) = tokenize(&["cmd", "-", "-a"], "a");
        assert_eq!(tokens, vec![Token::flag("-a"), Token::positional("-")]);
    }

    #[test]
    fn program_name_only() {
        let (tokens, err) = tokenize(&["cmd"], "a:");
        assert!(tokens.is_empty());
        assert!(err.is_none());
    }

    #[test]
    fn multibyte_cluster() {
        let (tokens, _) = tokenize(&["cmd", "-äöwert"], "äö:");
        assert_eq!(
            tokens,
            vec![Token::flag("-ä"), Token::flag_with("-ö", "wert")]
        );
    }

    #[test]
    fn token_display() {
        assert_eq!(Token::flag("-x").to_string(), "-x");
        assert_eq!(Token::flag_with("-o", "out").to_string(), "-o 'out'");
        assert_eq!(Token::flag_with("--out", "f").to_string(), "--out='f'");
        assert_eq!(Token::positional("p").to_string(), "'p'");
    }
}
