mod aabb;
mod gid;

pub use aabb::Aabb;
pub use gid::{TileFlip, TileId, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
