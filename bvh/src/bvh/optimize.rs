use super::*;
use rand::Rng;

impl Bvh {
    /// One incremental rebalancing pass: walks a random root-to-leaf path
    /// and applies the in-place rotator to every interior node on the way
    /// back up. The host seeds `rng`, so runs are reproducible; the RNG is
    /// not part of the tree's state.
    pub fn optimize<R: Rng>(&mut self, rng: &mut R) {
        if self.root == INVALID_INDEX {
            return;
        }
        #[cfg(feature = "validate")]
        let quality_before = self.quality();

        let mut path = NodeStack::new();
        let mut index = self.root;
        loop {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                break;
            }
            path.push(index);
            index = node.child[rng.gen_range(0..2usize)];
        }
        while let Some(index) = path.pop() {
            self.rotate(index);
        }

        #[cfg(feature = "validate")]
        {
            let quality_after = self.quality();
            assert!(
                quality_after <= quality_before + 1.0,
                "optimize regressed quality: {} -> {}",
                quality_before,
                quality_after
            );
            self.validate();
        }
    }

    /// Tries the four grandchild-for-uncle rotations at `index` and applies
    /// any that strictly shrink the affected child's box. Leaves `index`'s
    /// own box alone; the enclosing refit walk retightens it one step later.
    pub(crate) fn rotate(&mut self, index: u32) {
        if self.is_leaf(index) {
            return;
        }
        self.rotate_side(index, 0);
        self.rotate_side(index, 1);
    }

    /// Considers swapping each grandchild under `child[side]` with the
    /// opposite child. Applied only on a strict area decrease; when both
    /// candidates improve, the smaller result wins.
    fn rotate_side(&mut self, index: u32, side: usize) {
        let c = self.nodes[index as usize].child[side];
        if self.is_leaf(c) {
            return;
        }
        let uncle = self.nodes[index as usize].child[side ^ 1];
        let [x0, x1] = self.nodes[c as usize].child;

        let uncle_aabb = self.nodes[uncle as usize].aabb;
        let x0_aabb = self.nodes[x0 as usize].aabb;
        let x1_aabb = self.nodes[x1 as usize].aabb;
        let current = self.nodes[c as usize].aabb.area();
        // candidate areas of c after swapping x0 (resp. x1) with the uncle
        let swap_x0 = uncle_aabb.union(&x1_aabb);
        let swap_x1 = x0_aabb.union(&uncle_aabb);

        if swap_x0.area() < current && swap_x0.area() <= swap_x1.area() {
            self.nodes[index as usize].child[side ^ 1] = x0;
            self.nodes[x0 as usize].parent = index;
            self.nodes[c as usize].child[0] = uncle;
            self.nodes[uncle as usize].parent = c;
            self.nodes[c as usize].aabb = swap_x0;
        } else if swap_x1.area() < current {
            self.nodes[index as usize].child[side ^ 1] = x1;
            self.nodes[x1 as usize].parent = index;
            self.nodes[c as usize].child[1] = uncle;
            self.nodes[uncle as usize].parent = c;
            self.nodes[c as usize].aabb = swap_x1;
        }
    }
}
