//! Addressing of remote storage: world positions, portable objects, sides.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six faces of a block. Used as the access orientation when a
/// device exposes different storage on different sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Negative Y.
    Down,
    /// Positive Y.
    Up,
    /// Negative Z.
    North,
    /// Positive Z.
    South,
    /// Negative X.
    West,
    /// Positive X.
    East,
}

impl Side {
    /// All sides in wire-index order.
    pub const ALL: [Side; 6] = [
        Side::Down,
        Side::Up,
        Side::North,
        Side::South,
        Side::West,
        Side::East,
    ];

    /// Stable index used by the wire format.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Side::Down => 0,
            Side::Up => 1,
            Side::North => 2,
            Side::South => 3,
            Side::West => 4,
            Side::East => 5,
        }
    }

    /// Inverse of [`Side::index`].
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Side> {
        match index {
            0 => Some(Side::Down),
            1 => Some(Side::Up),
            2 => Some(Side::North),
            3 => Some(Side::South),
            4 => Some(Side::West),
            5 => Some(Side::East),
            _ => None,
        }
    }
}

/// An integer world position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Identity of a portable object (an item held somewhere) as assigned by the
/// host. Both peers must agree on the numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortableId(pub u64);

impl fmt::Display for PortableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Portable({})", self.0)
    }
}

/// What a storage query is aimed at.
///
/// A `side` of `None` means "any/unspecified side".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteTarget {
    /// A device placed in the world.
    Block {
        /// Where the device sits.
        pos: BlockPos,
        /// The face being accessed.
        side: Option<Side>,
    },
    /// A portable object such as a battery item.
    Portable {
        /// Host-assigned identity of the object.
        id: PortableId,
        /// The face being accessed, rarely meaningful for items.
        side: Option<Side>,
    },
}

impl RemoteTarget {
    /// Target a world position.
    #[must_use]
    pub const fn block(pos: BlockPos, side: Option<Side>) -> Self {
        Self::Block { pos, side }
    }

    /// Target a portable object.
    #[must_use]
    pub const fn portable(id: PortableId, side: Option<Side>) -> Self {
        Self::Portable { id, side }
    }

    /// The access orientation, if any.
    #[must_use]
    pub const fn side(&self) -> Option<Side> {
        match *self {
            Self::Block { side, .. } | Self::Portable { side, .. } => side,
        }
    }

    /// The same target accessed from a different side.
    #[must_use]
    pub const fn with_side(self, side: Option<Side>) -> Self {
        match self {
            Self::Block { pos, .. } => Self::Block { pos, side },
            Self::Portable { id, .. } => Self::Portable { id, side },
        }
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block { pos, .. } => write!(f, "block {pos}")?,
            Self::Portable { id, .. } => write!(f, "{id}")?,
        }
        if let Some(side) = self.side() {
            write!(f, " @{side:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_index_roundtrip() {
        for side in Side::ALL {
            assert_eq!(Side::from_index(side.index()), Some(side));
        }
        assert_eq!(Side::from_index(6), None);
    }

    #[test]
    fn test_block_pos_at_world_limits() {
        let pos = BlockPos::new(i32::MAX, i32::MIN, 0);
        assert_eq!(pos.to_string(), "(2147483647, -2147483648, 0)");
        let t = RemoteTarget::block(pos, Some(Side::East));
        assert_eq!(t.side(), Some(Side::East));
    }

    #[test]
    fn test_target_side() {
        let t = RemoteTarget::block(BlockPos::new(0, 0, 0), Some(Side::Up));
        assert_eq!(t.side(), Some(Side::Up));
        assert_eq!(t.with_side(None).side(), None);
        let p = RemoteTarget::portable(PortableId(7), None);
        assert_eq!(p.to_string(), "Portable(7)");
        assert_eq!(t.to_string(), "block (0, 0, 0) @Up");
    }
}
