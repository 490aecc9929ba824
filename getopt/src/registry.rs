//! Option declarations and the parse loop that feeds them.

use std::collections::HashMap;
use std::marker::PhantomData;

use log::{debug, trace};

use crate::convert::{parse_bool, FromArg};
use crate::error::{Error, Result};
use crate::handler::{ErrorHandler, FailFast, Flow};
use crate::slot::{Bound, Callback, Flag, List, Map, Scalar, Slot, Trigger};
use crate::tokenize::{tokenize, Token};

// ============================================================================
// Option declarations
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Opt {
    shorts: Vec<char>,
    longs: Vec<String>,
    help: String,
    required: bool,
    default_text: Option<String>,
    env: Option<String>,
}

impl Opt {
    pub fn new(help: &str) -> Self {
        Opt {
            help: help.to_string(),
            ..Opt::default()
        }
    }

    pub fn short(mut self, c: char) -> Self {
        self.shorts.push(c);
        self
    }

    /// Add a long name; a leading `--` is optional.
    pub fn long(mut self, name: &str) -> Self {
        let name = name.strip_prefix("--").unwrap_or(name);
        self.longs.push(format!("--{}", name));
        self
    }

    /// Add comma separated synonyms: one-character names are short options,
    /// anything longer a long option.
    pub fn names(mut self, synonyms: &str) -> Self {
        for name in synonyms.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self = self.short(c),
                _ => self = self.long(name),
            }
        }
        self
    }

    /// Fail the parse when the option never occurs.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Text assigned to the option at registration, before any parse.
    pub fn default_text(mut self, text: &str) -> Self {
        self.default_text = Some(text.to_string());
        self
    }

    /// Environment variable that overrides [`Opt::default_text`] when set.
    pub fn env(mut self, var: &str) -> Self {
        self.env = Some(var.to_string());
        self
    }

    pub fn shorts(&self) -> &[char] {
        &self.shorts
    }

    /// Long spellings, including the leading `--`.
    pub fn longs(&self) -> &[String] {
        &self.longs
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// First long spelling, else the first short one.
    pub fn display_name(&self) -> String {
        match (self.longs.first(), self.shorts.first()) {
            (Some(long), _) => long.clone(),
            (None, Some(c)) => format!("-{}", c),
            (None, None) => String::new(),
        }
    }

    fn spellings(&self) -> Vec<String> {
        self.shorts
            .iter()
            .map(|c| format!("-{}", c))
            .chain(self.longs.iter().cloned())
            .collect()
    }

    fn initial_text(&self) -> Option<String> {
        self.env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .or_else(|| self.default_text.clone())
    }
}

// ============================================================================
// Entries and handles
// ============================================================================

/// A registered option: its declaration, its slot and how often it was seen.
pub struct Entry {
    opt: Opt,
    slot: Box<dyn Slot>,
    count: usize,
}

impl Entry {
    pub fn opt(&self) -> &Opt {
        &self.opt
    }

    pub fn slot(&self) -> &dyn Slot {
        self.slot.as_ref()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Typed reference to a registered option's slot.
pub struct Handle<S> {
    index: usize,
    _slot: PhantomData<fn() -> S>,
}

impl<S> Handle<S> {
    fn new(index: usize) -> Self {
        Handle {
            index,
            _slot: PhantomData,
        }
    }
}

impl<S> Clone for Handle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Handle<S> {}

impl<S> std::fmt::Debug for Handle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

// ============================================================================
// Registry
// ============================================================================

pub struct Registry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    handler: Box<dyn ErrorHandler>,
    done: bool,
    name: String,
    version: String,
    description: Vec<String>,
    help_flag: Option<Handle<Flag>>,
    version_flag: Option<Handle<Flag>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: Vec::new(),
            index: HashMap::new(),
            handler: Box::new(FailFast),
            done: false,
            name: String::new(),
            version: String::new(),
            description: Vec::new(),
            help_flag: None,
            version_flag: None,
        }
    }

    pub fn set_error_handler<H: ErrorHandler + 'static>(&mut self, handler: H) {
        self.handler = Box::new(handler);
    }

    pub fn with_error_handler<H: ErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.set_error_handler(handler);
        self
    }

    /// Set the program identity and register `-h/--help` and `-V/--version`.
    pub fn add_defaults(&mut self, name: &str, version: &str, description: &[&str]) -> Result<()> {
        self.name = name.to_string();
        self.version = version.to_string();
        self.description = description.iter().map(|s| s.to_string()).collect();
        self.help_flag = Some(self.flag(Opt::new("Print help").short('h').long("help"))?);
        self.version_flag = Some(self.flag(Opt::new("Print version").short('V').long("version"))?);
        Ok(())
    }

    pub fn with_defaults(mut self, name: &str, version: &str, description: &[&str]) -> Result<Self> {
        self.add_defaults(name, version, description)?;
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Declare an option bound to `slot`.
    ///
    /// Fails, and marks the registry done, when a spelling is already taken
    /// or the declaration is unusable. Nothing is registered on failure.
    pub fn register<S: Slot>(&mut self, opt: Opt, mut slot: S) -> Result<Handle<S>> {
        if let Err(err) = self.check(&opt) {
            return self.fail(err);
        }

        if let Some(text) = opt.initial_text() {
            let applied = if slot.takes_arg() {
                slot.assign(&text)
            } else {
                parse_bool(&text).and_then(|on| if on { slot.assign("") } else { Ok(()) })
            };
            if let Err(source) = applied {
                let flag = opt.display_name();
                return self.fail(Error::Conversion { flag, source });
            }
            slot.commit_default();
        }

        let index = self.entries.len();
        for spelling in opt.spellings() {
            self.index.insert(spelling, index);
        }
        debug!("registered {} ({})", opt.display_name(), opt.help);
        self.entries.push(Entry {
            opt,
            slot: Box::new(slot),
            count: 0,
        });
        Ok(Handle::new(index))
    }

    fn check(&self, opt: &Opt) -> Result<()> {
        if let Some(&c) = opt.shorts.iter().find(|&&c| matches!(c, '-' | ':' | '+')) {
            return Err(Error::InvalidShort(c));
        }
        let spellings = opt.spellings();
        if spellings.is_empty() {
            return Err(Error::NoSpelling(opt.help.clone()));
        }
        for (i, spelling) in spellings.iter().enumerate() {
            let existing = match self.index.get(spelling) {
                Some(&idx) => Some(&self.entries[idx].opt.help),
                None if spellings[..i].contains(spelling) => Some(&opt.help),
                None => None,
            };
            if let Some(existing) = existing {
                return Err(Error::Duplicate {
                    spelling: spelling.clone(),
                    existing: existing.clone(),
                    added: opt.help.clone(),
                });
            }
        }
        Ok(())
    }

    fn fail<T>(&mut self, err: Error) -> Result<T> {
        debug!("registration failed: {}", err);
        self.done = true;
        Err(err)
    }

    pub fn flag(&mut self, opt: Opt) -> Result<Handle<Flag>> {
        self.register(opt, Flag::default())
    }

    /// A single value starting out as `T::default()`.
    pub fn scalar<T>(&mut self, opt: Opt) -> Result<Handle<Scalar<T>>>
    where
        T: FromArg + Clone + Default + 'static,
    {
        self.register(opt, Scalar::new(T::default()))
    }

    pub fn scalar_default<T>(&mut self, opt: Opt, default: T) -> Result<Handle<Scalar<T>>>
    where
        T: FromArg + Clone + 'static,
    {
        self.register(opt, Scalar::new(default))
    }

    pub fn list<T>(&mut self, opt: Opt) -> Result<Handle<List<T>>>
    where
        T: FromArg + Clone + 'static,
    {
        self.register(opt, List::default())
    }

    pub fn map<T>(&mut self, opt: Opt) -> Result<Handle<Map<T>>>
    where
        T: FromArg + Clone + 'static,
    {
        self.register(opt, Map::default())
    }

    pub fn trigger<F>(&mut self, opt: Opt, action: F) -> Result<Handle<Trigger>>
    where
        F: FnMut() -> std::result::Result<(), String> + 'static,
    {
        self.register(opt, Trigger::new(action))
    }

    pub fn callback<F>(&mut self, opt: Opt, action: F) -> Result<Handle<Callback>>
    where
        F: FnMut(&str) -> std::result::Result<(), String> + 'static,
    {
        self.register(opt, Callback::new(action))
    }

    // ------------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------------

    /// Current value behind `handle`; `None` for a handle from another
    /// registry.
    pub fn get<S: Bound>(&self, handle: &Handle<S>) -> Option<&S::Output> {
        self.slot(handle).map(|slot| slot.output())
    }

    pub fn slot<S: Slot>(&self, handle: &Handle<S>) -> Option<&S> {
        self.entries
            .get(handle.index)
            .and_then(|e| e.slot.as_any().downcast_ref::<S>())
    }

    /// How many times the option was applied successfully.
    pub fn count<S>(&self, handle: &Handle<S>) -> usize {
        self.entries.get(handle.index).map_or(0, |e| e.count)
    }

    /// Registered options in declaration order.
    pub fn options(&self) -> &[Entry] {
        &self.entries
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    /// Set once registration failed, a handler stopped a parse, or help or
    /// version was requested.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn help_requested(&self) -> bool {
        self.help_flag.as_ref().is_some_and(|h| self.count(h) > 0)
    }

    pub fn version_requested(&self) -> bool {
        self.version_flag.as_ref().is_some_and(|h| self.count(h) > 0)
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Spec string covering every short option, in declaration order.
    pub fn spec_string(&self, posix: bool) -> String {
        let mut spec = String::new();
        if posix {
            spec.push('+');
        }
        for entry in &self.entries {
            for &c in &entry.opt.shorts {
                spec.push(c);
                if entry.slot.takes_arg() {
                    spec.push(':');
                }
            }
        }
        spec
    }

    /// Parse `args` (program name first).
    ///
    /// Returns the positional arguments together with the parse error, if
    /// any. Every error goes through the error handler: a handler that stops
    /// ends the parse with its error and the positionals seen so far;
    /// otherwise the last error it kept is returned once all tokens are
    /// processed.
    pub fn parse<A: AsRef<str>>(&mut self, args: &[A], posix: bool) -> (Vec<String>, Option<Error>) {
        let mut positional = Vec::new();
        let outcome = self.parse_into(args, posix, &mut positional);
        let error = match outcome {
            Ok(kept) => kept,
            Err(stopped) => Some(stopped),
        };
        (positional, error)
    }

    /// [`Registry::parse`] for callers that treat any error as fatal.
    pub fn try_parse<A: AsRef<str>>(&mut self, args: &[A], posix: bool) -> Result<Vec<String>> {
        match self.parse(args, posix) {
            (_, Some(err)) => Err(err),
            (positional, None) => Ok(positional),
        }
    }

    /// Parse the process arguments. POSIX mode is used when
    /// `POSIXLY_CORRECT` is set.
    pub fn parse_env(&mut self) -> (Vec<String>, Option<Error>) {
        let args: Vec<String> = std::env::args().collect();
        let posix = std::env::var_os("POSIXLY_CORRECT").is_some();
        self.parse(&args, posix)
    }

    /// `Err` when the handler stopped the parse, else the kept error.
    fn parse_into<A: AsRef<str>>(
        &mut self,
        args: &[A],
        posix: bool,
        positional: &mut Vec<String>,
    ) -> Result<Option<Error>> {
        let spec = self.spec_string(posix);
        debug!("parsing {} arguments with spec {:?}", args.len(), spec);

        let (tokens, scan_error) = tokenize(args, &spec);
        let mut kept = None;
        if let Some(err) = scan_error {
            let program = Token::positional(args.first().map_or("", |a| a.as_ref()));
            self.route(err, &program, &mut kept)?;
        }

        for token in &tokens {
            trace!("token {}", token);
            let applied = match token {
                Token::Positional(value) => {
                    positional.push(value.clone());
                    continue;
                }
                Token::Flag { name, value } => self.apply(name, value.as_deref()),
            };
            if let Err(err) = applied {
                self.route(err, token, &mut kept)?;
            }
        }

        let missing: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.opt.required && e.count == 0)
            .map(|e| e.opt.display_name())
            .collect();
        for flag in missing {
            let token = Token::flag(flag.as_str());
            self.route(Error::MissingRequired(flag), &token, &mut kept)?;
        }

        if self.help_requested() || self.version_requested() {
            self.done = true;
        }
        Ok(kept)
    }

    fn apply(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| Error::UnknownOption(name.to_string()))?;
        let entry = &mut self.entries[idx];

        let arg = if !entry.slot.takes_arg() {
            ""
        } else if let Some(value) = value {
            value
        } else {
            return Err(Error::ArgumentRequired {
                flag: name.to_string(),
                help: entry.opt.help.clone(),
            });
        };

        entry.slot.assign(arg).map_err(|source| Error::Conversion {
            flag: name.to_string(),
            source,
        })?;
        entry.count += 1;
        Ok(())
    }

    fn route(&mut self, err: Error, token: &Token, kept: &mut Option<Error>) -> Result<()> {
        match self.handler.handle(err, token) {
            Flow::Stop(err) => {
                self.done = true;
                Err(err)
            }
            Flow::Continue(err) => {
                if err.is_some() {
                    *kept = err;
                }
                Ok(())
            }
        }
    }

    /// Restore every option to its pre-parse state.
    pub fn reset_all(&mut self) {
        for entry in &mut self.entries {
            entry.slot.reset();
            entry.count = 0;
        }
    }
}
