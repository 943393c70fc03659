//! 2D affine matrix, vector, rectangle, and cubic Bézier primitives.
//!
//! Concatenation convention: `A * B` applied to a vector `v` yields
//! `A.apply(B.apply(v))` — the right operand is applied first. This holds
//! throughout the crate; tests in [`mat2d`] pin it down explicitly since a
//! swapped convention produces visually plausible but incorrect scenes.

mod bezier;
mod mat2d;
mod rect;
mod vec2;

pub use bezier::{flatten_outline, CubicBezier};
pub use mat2d::Mat2D;
pub use rect::Rect;
pub use vec2::Vec2;
