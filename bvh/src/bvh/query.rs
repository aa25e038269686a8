use super::*;
use common::aabb::Aabb;

impl Bvh {
    /// Appends the indices of every leaf whose fat box overlaps `aabb`.
    /// Depth-first emission order, otherwise unspecified.
    pub fn find_overlaps(&self, aabb: &Aabb, out: &mut Vec<u32>) {
        self.find_overlaps_with(aabb, |index| out.push(index));
    }

    /// Appends every leaf overlapping the given leaf's fat box. The leaf
    /// itself always overlaps and is not filtered out; callers skip self
    /// matches.
    pub fn find_leaf_overlaps(&self, index: u32, out: &mut Vec<u32>) {
        debug_assert!(self.is_leaf(index), "overlap query expects a leaf");
        let aabb = self.nodes[index as usize].aabb;
        self.find_overlaps_with(&aabb, |hit| out.push(hit));
    }

    /// Callback form of the overlap query; no allocation beyond the inline
    /// traversal stack.
    pub fn find_overlaps_with<F>(&self, aabb: &Aabb, mut f: F)
    where
        F: FnMut(u32),
    {
        #[cfg(feature = "query_stats")]
        self.bump_query_call();
        if self.root == INVALID_INDEX {
            return;
        }
        let mut stack = NodeStack::new();
        stack.push(self.root);
        while let Some(index) = stack.pop() {
            #[cfg(feature = "query_stats")]
            self.bump_node_visit();
            let node = &self.nodes[index as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            if node.is_leaf() {
                #[cfg(feature = "query_stats")]
                self.bump_leaf_hit();
                f(index);
            } else {
                stack.push(node.child[0]);
                stack.push(node.child[1]);
            }
        }
    }

    /// Appends the indices of every leaf whose fat box the segment
    /// `(x0, y0) -> (x1, y1)` passes through.
    pub fn raycast(&self, x0: f32, y0: f32, x1: f32, y1: f32, out: &mut Vec<u32>) {
        #[cfg(feature = "query_stats")]
        self.bump_query_call();
        if self.root == INVALID_INDEX {
            return;
        }
        let mut stack = NodeStack::new();
        stack.push(self.root);
        while let Some(index) = stack.pop() {
            #[cfg(feature = "query_stats")]
            self.bump_node_visit();
            let node = &self.nodes[index as usize];
            if !node.aabb.intersects_segment(x0, y0, x1, y1) {
                continue;
            }
            if node.is_leaf() {
                #[cfg(feature = "query_stats")]
                self.bump_leaf_hit();
                out.push(index);
            } else {
                stack.push(node.child[0]);
                stack.push(node.child[1]);
            }
        }
    }

    /// Visits every unordered pair of leaves with overlapping fat boxes,
    /// canonicalized so the lower index comes first and each pair is seen
    /// exactly once.
    pub fn for_each_overlap_pair<F>(&self, mut f: F)
    where
        F: FnMut(u32, u32),
    {
        if self.root == INVALID_INDEX {
            return;
        }
        let mut leaves = NodeStack::new();
        let mut stack = NodeStack::new();
        stack.push(self.root);
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.is_leaf() {
                leaves.push(index);
            } else {
                stack.push(node.child[0]);
                stack.push(node.child[1]);
            }
        }
        for &leaf in leaves.iter() {
            let aabb = self.nodes[leaf as usize].aabb;
            self.find_overlaps_with(&aabb, |other| {
                if leaf < other {
                    f(leaf, other);
                }
            });
        }
    }

    #[cfg(feature = "query_stats")]
    fn bump_query_call(&self) {
        let mut stats = self.query_stats.get();
        stats.query_calls += 1;
        self.query_stats.set(stats);
    }

    #[cfg(feature = "query_stats")]
    fn bump_node_visit(&self) {
        let mut stats = self.query_stats.get();
        stats.node_visits += 1;
        self.query_stats.set(stats);
    }

    #[cfg(feature = "query_stats")]
    fn bump_leaf_hit(&self) {
        let mut stats = self.query_stats.get();
        stats.leaf_hits += 1;
        self.query_stats.set(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_grid() -> (Bvh, Vec<u32>) {
        let mut tree = Bvh::new(128, 1.0);
        let mut leaves = Vec::new();
        for row in 0..4 {
            for col in 0..4 {
                let x = col as f32 * 50.0;
                let y = row as f32 * 50.0;
                let index = tree
                    .insert(Aabb::new(x, y, x + 10.0, y + 10.0), row * 4 + col)
                    .unwrap();
                leaves.push(index);
            }
        }
        (tree, leaves)
    }

    #[test]
    fn overlap_query_matches_brute_force() {
        let (tree, leaves) = tree_with_grid();
        let query = Aabb::new(40.0, 40.0, 120.0, 120.0);
        let mut out = Vec::new();
        tree.find_overlaps(&query, &mut out);
        let mut expected: Vec<u32> = leaves
            .iter()
            .copied()
            .filter(|&leaf| tree.get(leaf).aabb.overlaps(&query))
            .collect();
        out.sort_unstable();
        expected.sort_unstable();
        assert_eq!(out, expected);
        assert!(!expected.is_empty());
    }

    #[test]
    fn leaf_query_includes_the_leaf_itself() {
        let mut tree = Bvh::new(16, 16.0);
        let a = tree.insert(Aabb::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        let b = tree.insert(Aabb::new(5.0, 5.0, 15.0, 15.0), 1).unwrap();
        let _far = tree
            .insert(Aabb::new(900.0, 900.0, 910.0, 910.0), 2)
            .unwrap();
        let mut out = Vec::new();
        tree.find_leaf_overlaps(a, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn raycast_prunes_off_segment_leaves() {
        let mut tree = Bvh::new(16, 16.0);
        let hit = tree
            .insert(Aabb::new(116.0, 116.0, 184.0, 184.0), 0)
            .unwrap();
        let _miss = tree
            .insert(Aabb::new(116.0, 416.0, 184.0, 484.0), 1)
            .unwrap();
        let mut out = Vec::new();
        tree.raycast(0.0, 150.0, 300.0, 150.0, &mut out);
        assert_eq!(out, vec![hit]);
        out.clear();
        tree.raycast(0.0, 0.0, 50.0, 50.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_tree_queries_yield_nothing() {
        let tree = Bvh::new(8, 16.0);
        let mut out = Vec::new();
        tree.find_overlaps(&Aabb::new(0.0, 0.0, 1.0, 1.0), &mut out);
        assert!(out.is_empty());
        tree.raycast(0.0, 0.0, 1.0, 1.0, &mut out);
        assert!(out.is_empty());
        tree.for_each_overlap_pair(|_, _| panic!("no pairs in an empty tree"));
    }

    #[test]
    fn overlap_pairs_are_canonical_and_unique() {
        let mut tree = Bvh::new(32, 2.0);
        let a = tree.insert(Aabb::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        let b = tree.insert(Aabb::new(8.0, 0.0, 18.0, 10.0), 1).unwrap();
        let c = tree.insert(Aabb::new(16.0, 0.0, 26.0, 10.0), 2).unwrap();
        let _far = tree
            .insert(Aabb::new(500.0, 500.0, 510.0, 510.0), 3)
            .unwrap();
        let mut pairs = Vec::new();
        tree.for_each_overlap_pair(|x, y| {
            assert!(x < y);
            pairs.push((x, y));
        });
        pairs.sort_unstable();
        let mut deduped = pairs.clone();
        deduped.dedup();
        assert_eq!(pairs, deduped, "each pair must be emitted once");
        assert!(pairs.contains(&(a.min(b), a.max(b))));
        assert!(pairs.contains(&(b.min(c), b.max(c))));
    }
}
