use std::fmt;

/// Horizontal flip bit.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip bit.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Diagonal (anti-diagonal) flip bit.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Hexagonal 120° rotation bit.
pub const ROTATE_HEX: u32 = 0x1000_0000; // bit 28
/// Bits left for the global tile id.
pub const GID_MASK: u32 = 0x0FFF_FFFF; // lower 28 bits

/// Orientation of a placed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlipFlags(u8);

impl FlipFlags {
    /// Mirrored around the vertical axis.
    pub const HORIZONTAL: FlipFlags = FlipFlags(1 << 0);
    /// Mirrored around the horizontal axis.
    pub const VERTICAL: FlipFlags = FlipFlags(1 << 1);
    /// Anti-diagonal flip (90° rotation when combined with H or V).
    pub const DIAGONAL: FlipFlags = FlipFlags(1 << 2);
    /// 120° rotation on hexagonal maps.
    pub const HEX: FlipFlags = FlipFlags(1 << 3);

    /// No flip.
    pub const fn empty() -> Self {
        FlipFlags(0)
    }
    /// Raw flag bits.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
    /// No flag set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
    /// Every flag of `other` is set.
    #[inline]
    pub fn contains(self, other: FlipFlags) -> bool {
        self.0 & other.0 == other.0
    }
    /// Horizontal flip set.
    #[inline] pub fn horizontal(self) -> bool { self.contains(Self::HORIZONTAL) }
    /// Vertical flip set.
    #[inline] pub fn vertical(self) -> bool { self.contains(Self::VERTICAL) }
    /// Diagonal flip set.
    #[inline] pub fn diagonal(self) -> bool { self.contains(Self::DIAGONAL) }
    /// Hex rotation set.
    #[inline] pub fn hex(self) -> bool { self.contains(Self::HEX) }
}

impl std::ops::BitOr for FlipFlags {
    type Output = FlipFlags;
    fn bitor(self, rhs: FlipFlags) -> FlipFlags {
        FlipFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for FlipFlags {
    fn bitor_assign(&mut self, rhs: FlipFlags) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitXorAssign for FlipFlags {
    fn bitxor_assign(&mut self, rhs: FlipFlags) {
        self.0 ^= rhs.0;
    }
}

impl fmt::Display for FlipFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (Self::HORIZONTAL, "horizontal"),
            (Self::VERTICAL, "vertical"),
            (Self::DIAGONAL, "diagonal"),
            (Self::HEX, "hex"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Packed cell value: global tile id plus flip bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gid(pub u32);

impl Gid {
    /// Value as stored in the layer data.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// Global tile id with the flag bits stripped.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// True for empty cells (id 0, whatever the flags).
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }

    /// Splits the value into `(tile id, flags)`.
    ///
    /// A diagonal flip composes with the other two axes: when it is set
    /// together with H or V, both H and V are toggled.
    pub fn decode(self) -> (u32, FlipFlags) {
        let gid = self.0;
        let mut flags = FlipFlags::empty();
        if gid & FLIP_H != 0 {
            flags |= FlipFlags::HORIZONTAL;
        }
        if gid & FLIP_V != 0 {
            flags |= FlipFlags::VERTICAL;
        }
        if gid & FLIP_D != 0 {
            flags |= FlipFlags::DIAGONAL;
            if flags.horizontal() || flags.vertical() {
                flags ^= FlipFlags::HORIZONTAL | FlipFlags::VERTICAL;
            }
        }
        if gid & ROTATE_HEX != 0 {
            flags |= FlipFlags::HEX;
        }
        (self.clean(), flags)
    }
}
