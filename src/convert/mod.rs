//! Source format converters to VDOM
//!
//! | Format | Module | Function |
//! |--------|--------|----------|
//! | HTML | [`html`] | [`parse_fragment()`], [`parse_body()`] |
//!
//! Converters only need to produce valid nodes; the render pipeline works on
//! the resulting tree and serializes it back with [`crate::render`].

pub mod html;

pub use self::html::{parse_body, parse_fragment};
