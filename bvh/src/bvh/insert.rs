use super::*;
use common::aabb::Aabb;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::BvhResult;

/// Frontier entry for the best-sibling search. `cost` is the inherited
/// surface-area growth accumulated on the path from the root; the node's own
/// growth is computed when the entry is popped.
#[derive(Clone, Copy, Debug)]
struct SiblingCandidate {
    cost: f32,
    index: u32,
}

impl PartialEq for SiblingCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SiblingCandidate {}

impl Ord for SiblingCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the maximum, so compare reversed: cheapest cost
        // first, lowest index on ties. The index tie-break keeps the search
        // deterministic for identical input order.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for SiblingCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Bvh {
    /// Adds a leaf covering `aabb`, grown by the configured margin, and
    /// returns its index. The index stays valid until [`Bvh::remove`].
    ///
    /// Fails with `CapacityExceeded` when the arena is full; the tree is
    /// left untouched in that case.
    pub fn insert(&mut self, aabb: Aabb, user_data: u32) -> BvhResult<u32> {
        validate_aabb(&aabb)?;
        let leaf = self.alloc_node()?;
        self.nodes[leaf as usize] = Node {
            aabb: aabb.grow(self.growth),
            parent: INVALID_INDEX,
            child: [INVALID_INDEX, INVALID_INDEX],
            user_data,
        };
        if let Err(err) = self.link_leaf(leaf) {
            // roll the leaf back so a full arena leaves the tree intact
            self.free_node(leaf);
            return Err(err);
        }
        self.live_leaves += 1;
        #[cfg(feature = "validate")]
        self.validate();
        Ok(leaf)
    }

    /// Splices an initialized, unlinked leaf into the tree beside the
    /// sibling that minimizes the induced surface-area growth.
    pub(crate) fn link_leaf(&mut self, leaf: u32) -> BvhResult<()> {
        if self.root == INVALID_INDEX {
            self.root = leaf;
            self.nodes[leaf as usize].parent = INVALID_INDEX;
            return Ok(());
        }

        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let sibling = if self.is_leaf(self.root) {
            self.root
        } else {
            self.best_sibling(&leaf_aabb)
        };

        // allocate before touching topology so a full arena cannot corrupt
        let parent = self.alloc_node()?;
        let old_parent = self.nodes[sibling as usize].parent;
        self.nodes[parent as usize] = Node {
            aabb: leaf_aabb.union(&self.nodes[sibling as usize].aabb),
            parent: old_parent,
            child: [sibling, leaf],
            user_data: 0,
        };
        self.nodes[sibling as usize].parent = parent;
        self.nodes[leaf as usize].parent = parent;

        if old_parent == INVALID_INDEX {
            self.root = parent;
        } else {
            let old = &mut self.nodes[old_parent as usize];
            let slot = usize::from(old.child[0] != sibling);
            debug_assert_eq!(old.child[slot], sibling);
            old.child[slot] = parent;
            self.refit_upward(old_parent, true);
        }
        Ok(())
    }

    /// Branch-and-bound search for the leaf whose adoption of `aabb` grows
    /// the tree's total surface area the least.
    ///
    /// The frontier is a min-heap keyed on inherited cost; a subtree is
    /// pruned as soon as its lower bound reaches the best leaf found.
    fn best_sibling(&self, aabb: &Aabb) -> u32 {
        let mut heap = BinaryHeap::new();
        heap.push(SiblingCandidate {
            cost: 0.0,
            index: self.root,
        });
        let mut best_cost = f32::INFINITY;
        let mut best_index = self.root;

        while let Some(SiblingCandidate { cost, index }) = heap.pop() {
            if cost >= best_cost {
                // the heap is cost-ordered: nothing cheaper remains
                break;
            }
            let node = &self.nodes[index as usize];
            let growth = aabb.union(&node.aabb).area() - node.aabb.area();
            let total = cost + growth;
            if total >= best_cost {
                continue;
            }
            if node.is_leaf() {
                best_cost = total;
                best_index = index;
            } else {
                heap.push(SiblingCandidate {
                    cost: total,
                    index: node.child[0],
                });
                heap.push(SiblingCandidate {
                    cost: total,
                    index: node.child[1],
                });
            }
        }
        best_index
    }
}
