// `ok!` and `some!` are less bloaty alternatives to the standard library's try operator (`?`).
// Since we do not need type conversions in this crate we can fall back to much easier match
// patterns that compile faster and produce less bloaty code.

macro_rules! ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => return Err(err),
        }
    };
}

macro_rules! some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => return None,
        }
    };
}

// Diagnostics go through `tracing` but are gated by the verbosity configured
// on the environment: 1 enables warnings, 2 verbose notes, 3 debug output.

macro_rules! diag_warn {
    ($env:expr, $($arg:tt)*) => {
        if $env.verbosity() >= 1 {
            tracing::warn!($($arg)*);
        }
    };
}

macro_rules! diag_info {
    ($env:expr, $($arg:tt)*) => {
        if $env.verbosity() >= 2 {
            tracing::info!($($arg)*);
        }
    };
}

macro_rules! diag_debug {
    ($env:expr, $($arg:tt)*) => {
        if $env.verbosity() >= 3 {
            tracing::debug!($($arg)*);
        }
    };
}

/// Hidden utility module for the [`context!`](crate::context!) macro.
#[doc(hidden)]
pub mod __context {
    use crate::value::{Value, ValueMap};
    use crate::Environment;
    use std::rc::Rc;

    #[inline(always)]
    pub fn make() -> ValueMap {
        ValueMap::default()
    }

    #[inline(always)]
    pub fn add(ctx: &mut ValueMap, key: &'static str, value: Value) {
        ctx.insert(key.into(), value);
    }

    #[inline(always)]
    pub fn build(ctx: ValueMap) -> Value {
        Value::from_map(ctx)
    }

    pub fn thread_local_env() -> Rc<Environment<'static>> {
        thread_local! {
            static ENV: Rc<Environment<'static>> = Rc::new(Environment::new());
        }
        ENV.with(|x| x.clone())
    }
}

/// Creates a template model from keys and values.
///
/// ```rust
/// # use teddy::context;
/// let ctx = context!{
///     name => "Peter",
///     location => "World",
/// };
/// ```
///
/// Alternatively if the variable name matches the key name it can
/// be omitted:
///
/// ```rust
/// # use teddy::context;
/// let name = "Peter";
/// let ctx = context!{ name };
/// ```
///
/// The return value is a [`Value`](crate::value::Value).  The macro can be
/// nested to build up mappings inside of sequences:
///
/// ```rust
/// # use teddy::context;
/// let ctx = context! {
///     nav => vec![
///         context!(path => "/", title => "Index"),
///         context!(path => "/faq", title => "FAQ"),
///     ]
/// };
/// ```
///
/// Values are converted with
/// [`Value::from_serialize`](crate::value::Value::from_serialize).
#[macro_export]
macro_rules! context {
    () => {
        $crate::__context::build($crate::__context::make())
    };
    (
        $($key:ident $(=> $value:expr)?),* $(,)?
    ) => {{
        let mut ctx = $crate::__context::make();
        $(
            $crate::__context_pair!(ctx, $key $(=> $value)?);
        )*
        $crate::__context::build(ctx)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! __context_pair {
    ($ctx:ident, $key:ident) => {{
        $crate::__context_pair!($ctx, $key => $key);
    }};
    ($ctx:ident, $key:ident => $value:expr) => {
        $crate::__context::add(
            &mut $ctx,
            stringify!($key),
            $crate::value::Value::from_serialize(&$value),
        );
    };
}

/// A macro similar to [`format!`] but that renders a Teddy template.
///
/// The template source is passed first, followed by model variables in
/// the same form the [`context!`](crate::context) macro accepts.  A custom
/// environment can be supplied with the `in env,` prefix.
///
/// ```
/// # use teddy::render;
/// let rv = render!("<p>Hello {name}!</p>", name => "World");
/// assert_eq!(rv, "<p>Hello World!</p>");
/// ```
///
/// # Panics
///
/// This macro panics if rendering fails, which can only happen when the
/// pass budget of the environment is exceeded.
#[macro_export]
macro_rules! render {
    (
        in $env:expr,
        $tmpl:expr
        $(, $key:ident $(=> $value:expr)?)* $(,)?
    ) => {
        ($env).render_str($tmpl, $crate::context! { $($key $(=> $value)? ,)* })
            .expect("failed to render template")
    };
    (
        $tmpl:expr
        $(, $key:ident $(=> $value:expr)?)* $(,)?
    ) => {
        $crate::render!(in $crate::__context::thread_local_env(), $tmpl, $($key $(=> $value)? ,)*)
    }
}
