//! Core math modules.

pub mod align;
pub mod bottom_k;
pub mod histogram;
pub mod length;
