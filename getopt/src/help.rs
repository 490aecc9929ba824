//! Usage and version text for a [`Registry`].

// ============================================================================
// Help / version rendering
// ============================================================================

use std::io::{self, Write};

use crate::registry::{Entry, Registry};

/// Widest left column before the help text moves to its own line.
const MAX_LEFT_COL: usize = 32;

/// Left column for one option, e.g. `-o, --output=string`.
fn left_column(entry: &Entry) -> String {
    let opt = entry.opt();
    let kind = entry.slot().kind();
    let mut names: Vec<String> = opt.shorts().iter().map(|c| format!("-{}", c)).collect();
    names.extend(opt.longs().iter().cloned());
    let mut left = format!("  {}", names.join(", "));

    if !kind.is_empty() {
        if opt.longs().is_empty() {
            left.push(' ');
        } else {
            left.push('=');
        }
        left.push_str(kind);
    }
    left
}

/// Right column: `required`/`multiple` markers followed by the help text.
fn right_column(entry: &Entry) -> String {
    let mut parts = Vec::new();
    if entry.opt().is_required() {
        parts.push("required");
    }
    if entry.slot().multiple() {
        parts.push("multiple");
    }
    if !entry.opt().help().is_empty() {
        parts.push(entry.opt().help());
    }
    parts.join(", ")
}

pub fn write_help<W: Write>(registry: &Registry, out: &mut W) -> io::Result<()> {
    if !registry.name().is_empty() {
        write!(out, "Usage: {} [OPTION]...\n", registry.name())?;
    }
    for line in registry.description() {
        write!(out, "{}\n", line)?;
    }
    if registry.options().is_empty() {
        return Ok(());
    }
    if !registry.name().is_empty() || !registry.description().is_empty() {
        write!(out, "\n")?;
    }

    let rows: Vec<(String, String)> = registry
        .options()
        .iter()
        .map(|e| (left_column(e), right_column(e)))
        .collect();
    let width = rows
        .iter()
        .map(|(left, _)| left.chars().count())
        .filter(|&w| w <= MAX_LEFT_COL)
        .max()
        .unwrap_or(0)
        + 2;

    for (left, right) in rows {
        if right.is_empty() {
            write!(out, "{}\n", left)?;
        } else if left.chars().count() + 2 > width {
            write!(out, "{}\n{:width$}{}\n", left, "", right, width = width)?;
        } else {
            write!(out, "{:width$}{}\n", left, right, width = width)?;
        }
    }
    Ok(())
}

pub fn write_version<W: Write>(registry: &Registry, out: &mut W) -> io::Result<()> {
    write!(out, "{} {}\n", registry.name(), registry.version())
}

impl Registry {
    pub fn write_help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_help(self, out)
    }

    pub fn write_version<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_version(self, out)
    }

    /// Print help to stdout.
    pub fn print_help(&self) -> io::Result<()> {
        self.write_help(&mut io::stdout().lock())
    }

    pub fn print_version(&self) -> io::Result<()> {
        self.write_version(&mut io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::{Opt, Registry};

    fn render(reg: &Registry) -> String {
        let mut out = Vec::new();
        reg.write_help(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn help_lists_options_in_order() {
        let mut reg = Registry::new()
            .with_defaults("prog", "v0", &["Does things."])
            .unwrap();
        reg.scalar::<String>(Opt::new("Output file").short('o').long("output").required())
            .unwrap();
        reg.list::<i64>(Opt::new("Level").short('n')).unwrap();

        let want = "\
Usage: prog [OPTION]...
Does things.

  -h, --help           Print help
  -V, --version        Print version
  -o, --output=string  required, Output file
  -n int               multiple, Level
";
        assert_eq!(render(&reg), want);
    }

    #[test]
    fn long_left_column_wraps() {
        let mut reg = Registry::new();
        reg.flag(Opt::new("short").short('s')).unwrap();
        reg.scalar::<String>(
            Opt::new("Very long")
                .long("a-really-long-option-name-for-testing"),
        )
        .unwrap();
        let text = render(&reg);
        assert_eq!(
            text,
            "  -s  short\n  --a-really-long-option-name-for-testing=string\n      Very long\n"
        );
    }

    #[test]
    fn version_line() {
        let reg = Registry::new().with_defaults("prog", "1.2.3", &[]).unwrap();
        let mut out = Vec::new();
        reg.write_version(&mut out).unwrap();
        assert_eq!(out, b"prog 1.2.3\n");
    }
}
