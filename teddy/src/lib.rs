//! Teddy is an HTML templating engine whose directives are plain looking
//! HTML elements.  Templates stay valid markup: a `<loop>` or an `<if>` is
//! just another tag to an editor, and anything Teddy does not recognize is
//! passed through untouched.
//!
//! ```html
//! <ul>
//!   <loop through="users" val="user">
//!     <li>{user.name}</li>
//!   </loop>
//! </ul>
//! ```
//!
//! Teddy never builds a syntax tree.  The scanner walks the text, resolves
//! each directive against the model and feeds the result back into the
//! text until nothing changes anymore.  A budget of passes bounds this so
//! that circular includes end in an error instead of running forever.
//!
//! # Template Usage
//!
//! Create an [`Environment`], add the templates that should be available
//! to `<include>` and render.  Any [`serde`] serializable value can be the
//! model, the [`context!`] macro builds one ad hoc:
//!
//! ```
//! use teddy::{Environment, context};
//!
//! let mut env = Environment::new();
//! env.add_template("hello", "<p>Hello {name}!</p>");
//! let tmpl = env.get_template("hello").unwrap();
//! println!("{}", tmpl.render(context!(name => "John")).unwrap());
//! ```
//!
//! ```plain
//! <p>Hello John!</p>
//! ```
//!
//! For one-off templates the [`render!`] macro works a bit like [`format!`].
//!
//! # Directives
//!
//! * `{name}` prints a model value, HTML escaped.  `{name|s}` skips the
//!   escaping and `{name|p}` keeps the value from being interpreted again.
//!   `{! comments !}` are removed.
//! * `<if name>`, `<unless name>` with `<elseif>`, `<elseunless>` and `<else>`
//!   siblings select markup.  Conditions can compare against literals
//!   (`<if name='value'>`) and combine with `and`, `or`, `xor` and `not:`.
//! * `<loop through="list" key="k" val="v">` repeats its body per entry.
//! * `<include src="name">` renders another template, `<arg title>...</arg>`
//!   children become its model.  `noparse` includes the source as is.
//! * `<p if-name true="class='a'" false="class='b'">` picks attributes.
//! * `<noteddy>` content is left completely alone.
//!
//! # Loading Templates
//!
//! Templates can be added upfront with [`Environment::add_template`] or
//! loaded on demand with [`Environment::set_loader`].  With the `loader`
//! feature [`path_loader`] reads them from a directory.
//!
//! # Optional Features
//!
//! - `loader`: enables [`path_loader`].  Enabled by default.
//! - `unicode`: allows unicode identifiers in `{tokens}`.
//! - `speedups`: uses `v_htmlescape` for escaping.
//! - `stacker`: grows the stack on demand so that deeply nested includes
//!   end in [`ErrorKind::PassLimitExceeded`] rather than a stack overflow.
//!   Enabled by default.
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::get_first)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod environment;
mod error;
mod loader;
mod model;
mod scanner;
mod state;
mod template;
mod utils;

pub mod value;

#[cfg(feature = "loader")]
pub use self::loader::path_loader;

pub use self::environment::Environment;
pub use self::error::{Error, ErrorKind};
pub use self::template::Template;
pub use self::utils::{HtmlEscape, UndefinedBehavior};
pub use self::value::Value;

#[doc(hidden)]
pub use self::macros::__context;
