//! hapconf configuration model
//!
//! This crate reads HAProxy-style configuration text into an editable object
//! model and prints it back in a canonical layout. Parsing then printing a
//! document produces text that parses to the same model.
//!
//! # Example
//!
//! ```rust
//! use hapconf_config::{ArgInput, Config, Proxy};
//!
//! let mut config = Config::parse("global\n    daemon\n").unwrap();
//!
//! let mut frontend = Proxy::frontend("www");
//! frontend.bind("*", 80, ArgInput::none()).unwrap();
//! config.add_frontend(frontend).unwrap();
//!
//! assert_eq!(
//!     config.to_string(),
//!     "global\n    daemon\n\nfrontend www\n    bind *:80\n"
//! );
//! ```

pub mod comment;
pub mod config;
pub mod error;
pub mod globals;
pub mod params;
pub mod parser;
pub mod proxy;
pub mod resolvers;
pub mod section;
pub mod userlist;

pub use comment::Comment;
pub use config::{Config, Leading};
pub use error::{Error, InvalidParameterError, ParseError};
pub use globals::Globals;
pub use params::{ArgInput, OrderEntry, ParamKey, ParameterBag};
pub use parser::{CursorError, TextCursor, tokenize_line};
pub use proxy::{
    ConditionTest, DEFAULT_PRINT_PRIORITY, Proxy, ProxyKind, UseBackendKey, UseBackendRule,
};
pub use resolvers::{Nameserver, Resolvers};
pub use section::SectionKind;
pub use userlist::{User, Userlist};

pub use hapconf_core::FormatOptions;
