//! Tiled global tile ids and their flip flags.

/// Horizontal flip flag.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Diagonal (anti-diagonal transpose) flip flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Bits left for the tile id once flags are stripped.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// Raw global tile id as stored in a chunk, flip flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

/// Orientation flags decoded from the high bits of a GID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileFlip {
    /// Mirrored left to right.
    pub horizontal: bool,
    /// Mirrored top to bottom.
    pub vertical: bool,
    /// Transposed along the anti-diagonal.
    pub diagonal: bool,
}

impl TileId {
    /// The id as stored, flags included.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// The id without flip flags.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// Whether the cell holds no tile.
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
    /// [`FLIP_H`] is set.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// [`FLIP_V`] is set.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// [`FLIP_D`] is set.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }

    /// All three flip flags.
    pub fn flip(self) -> TileFlip {
        TileFlip {
            horizontal: self.flip_h(),
            vertical: self.flip_v(),
            diagonal: self.flip_d(),
        }
    }
}
