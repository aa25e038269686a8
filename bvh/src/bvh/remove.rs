use super::*;
use common::aabb::Aabb;

use crate::error::BvhResult;

impl Bvh {
    /// Frees a live leaf. The index must come from [`Bvh::insert`] and must
    /// not have been removed already; that misuse is a programmer error and
    /// only debug builds diagnose it.
    pub fn remove(&mut self, index: u32) {
        debug_assert!((index as usize) < self.nodes.len(), "index out of range");
        debug_assert!(self.is_leaf(index), "remove expects a leaf");
        self.unlink(index);
        self.free_node(index);
        self.live_leaves -= 1;
        #[cfg(feature = "validate")]
        self.validate();
    }

    /// Updates a leaf's geometry. A no-op while the stored fat box still
    /// contains `aabb`, so jitter within the margin never touches topology;
    /// otherwise the leaf is unlinked, re-fattened and re-inserted.
    pub fn relocate(&mut self, index: u32, aabb: Aabb) -> BvhResult<()> {
        validate_aabb(&aabb)?;
        debug_assert!((index as usize) < self.nodes.len(), "index out of range");
        debug_assert!(self.is_leaf(index), "relocate expects a leaf");
        if self.nodes[index as usize].aabb.contains(&aabb) {
            return Ok(());
        }
        self.unlink(index);
        self.nodes[index as usize].aabb = aabb.grow(self.growth);
        // unlink released this leaf's old interior parent (or the leaf was
        // the root), so the splice below always finds a free slot
        self.link_leaf(index)?;
        #[cfg(feature = "validate")]
        self.validate();
        Ok(())
    }

    /// Detaches a leaf from the tree, collapsing its interior parent. The
    /// leaf itself is not freed; `relocate` reuses it in place.
    pub(crate) fn unlink(&mut self, index: u32) {
        // leaf was the root
        if index == self.root {
            debug_assert_eq!(self.nodes[index as usize].parent, INVALID_INDEX);
            self.root = INVALID_INDEX;
            return;
        }

        let p0 = self.nodes[index as usize].parent;
        let slot = usize::from(self.nodes[p0 as usize].child[0] != index);
        debug_assert_eq!(self.nodes[p0 as usize].child[slot], index);
        let sibling = self.nodes[p0 as usize].child[slot ^ 1];
        debug_assert!(sibling != INVALID_INDEX);
        let p1 = self.nodes[p0 as usize].parent;

        // parent was the root: the sibling node takes its place
        if p1 == INVALID_INDEX {
            self.root = sibling;
            self.nodes[sibling as usize].parent = INVALID_INDEX;
            self.free_node(p0);
            self.nodes[index as usize].parent = INVALID_INDEX;
            return;
        }

        // general case: promote the sibling into the grandparent's slot
        let p1_slot = usize::from(self.nodes[p1 as usize].child[0] != p0);
        debug_assert_eq!(self.nodes[p1 as usize].child[p1_slot], p0);
        self.nodes[p1 as usize].child[p1_slot] = sibling;
        self.nodes[sibling as usize].parent = p1;
        self.free_node(p0);
        self.nodes[index as usize].parent = INVALID_INDEX;
        self.refit_upward(p1, false);
    }
}
