//! Debugging helpers.
//!
//! Debugging is governed by the `debug_prints` feature. When active, various
//! parts of the parser will wrap their tracing in [`debug_print!`]. The
//! feature is meant for developing the crate and is not part of its public
//! interface; builds without it compile the macro away.

#[cfg(feature = "debug_prints")]
macro_rules! debug_print {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
    }};
}

#[cfg(not(feature = "debug_prints"))]
macro_rules! debug_print {
    ($($arg:tt)*) => {{}};
}
