//! Atlas grid addressing shared by the mesh combiner and the atlas compositor.
//!
//! A submesh's position in [`submesh_order`] is its cell index `t`. Both the UV
//! remap and the texture placement resolve `t` through [`GridLayout`], so the
//! two sides of a merge always agree on where a submesh lives.

mod layout;
mod order;
mod rect;

pub use layout::{CellCoord, GridError, GridLayout, wrap_unit};
pub use order::{SubmeshRef, submesh_order};
pub use rect::{PixelRect, UvRect};
