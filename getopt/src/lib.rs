//! POSIX `getopt` / GNU `getopt_long` style option parsing.
//!
//! Two layers:
//! - [`tokenize`] turns an argument vector and a getopt spec string (`"ab:c::"`)
//!   into [`Token`]s, handling clusters, attached values, `--` and the POSIX
//!   or GNU ordering of positionals;
//! - [`Registry`] holds typed option declarations, builds the spec string,
//!   feeds the tokens to each option's [`Slot`] and reports errors through a
//!   pluggable [`ErrorHandler`].
//!
//! ```
//! use getopt::{Opt, Registry};
//!
//! let mut reg = Registry::new();
//! let verbose = reg.flag(Opt::new("Talk more").names("v,verbose")).unwrap();
//! let level = reg.scalar_default(Opt::new("Level").short('l'), 3i64).unwrap();
//!
//! let (rest, err) = reg.parse(&["prog", "in.txt", "-vl0x10"], false);
//! assert!(err.is_none());
//! assert_eq!(rest, ["in.txt"]);
//! assert_eq!(reg.get(&verbose), Some(&true));
//! assert_eq!(reg.get(&level), Some(&16));
//! ```

mod convert;
mod error;
mod handler;
mod help;
mod registry;
mod slot;
mod tokenize;

pub use convert::{parse_bool, parse_duration, parse_int, parse_time, parse_uint, FromArg, Timestamp};
pub use error::{ConversionError, Error, Result};
pub use handler::{ErrorHandler, FailFast, Flow, Report};
pub use help::{write_help, write_version};
pub use registry::{Entry, Handle, Opt, Registry};
pub use slot::{Bound, Callback, Flag, List, Map, Scalar, Slot, Trigger};
pub use tokenize::{tokenize, Arity, ScanConfig, Token};
