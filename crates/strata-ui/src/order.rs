use core::cmp::Ordering;

use strata_engine::ObjectId;

/// Highest stacking value a widget can hold.
pub const MAX_Z_ORDER: u32 = 1024;

/// Stacking value clamped to `0..=MAX_Z_ORDER`. Higher is on top.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct ZOrder(u32);

impl ZOrder {
    pub const BOTTOM: ZOrder = ZOrder(0);
    pub const TOP: ZOrder = ZOrder(MAX_Z_ORDER);

    #[inline]
    pub fn new(z: u32) -> Self {
        Self(z.min(MAX_Z_ORDER))
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// One step above, saturating at the top.
    #[inline]
    pub fn above(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// One step below, or `None` at the bottom.
    #[inline]
    pub fn below(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

/// Total stacking order of widgets.
///
/// 1) `z` ascending (back to front)
/// 2) `id` ascending: identifiers are issued in creation order, so among
///    equal z the most recently created widget is on top.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StackKey {
    pub z: ZOrder,
    pub id: ObjectId,
}

impl StackKey {
    #[inline]
    pub const fn new(z: ZOrder, id: ObjectId) -> Self {
        Self { z, id }
    }
}

impl Ord for StackKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        match self.z.cmp(&other.z) {
            Ordering::Equal => self.id.cmp(&other.id),
            o => o,
        }
    }
}

impl PartialOrd for StackKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
