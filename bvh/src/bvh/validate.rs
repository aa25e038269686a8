use super::*;
use fxhash::FxHashSet;

impl Bvh {
    /// Walks the whole arena and asserts every structural invariant:
    /// parent/child agreement, leaf shape, interior containment, and the
    /// free-list/reachability partition. Debug tool; panics with a
    /// diagnostic on the first violation. With the `validate` feature
    /// enabled every public mutation calls this automatically.
    pub fn validate(&self) {
        let mut reachable = FxHashSet::default();

        if self.root != INVALID_INDEX {
            assert_eq!(
                self.nodes[self.root as usize].parent, INVALID_INDEX,
                "root must not have a parent"
            );
            let mut stack = NodeStack::new();
            stack.push(self.root);
            while let Some(index) = stack.pop() {
                assert!(
                    (index as usize) < self.nodes.len(),
                    "node index {} out of range",
                    index
                );
                assert!(
                    reachable.insert(index),
                    "node {} reachable twice; the tree has a cycle or a shared child",
                    index
                );
                let node = &self.nodes[index as usize];
                if node.is_leaf() {
                    assert_eq!(
                        node.child[1], INVALID_INDEX,
                        "leaf {} must have both child slots invalid",
                        index
                    );
                    continue;
                }
                let [c0, c1] = node.child;
                assert!(
                    c0 != INVALID_INDEX && c1 != INVALID_INDEX,
                    "interior node {} must have two children",
                    index
                );
                assert_ne!(c0, c1, "interior node {} has duplicate children", index);
                for &child in &node.child {
                    assert_eq!(
                        self.nodes[child as usize].parent, index,
                        "child {} does not point back to parent {}",
                        child, index
                    );
                    assert!(
                        node.aabb.contains(&self.nodes[child as usize].aabb),
                        "node {} does not contain child {}",
                        index,
                        child
                    );
                }
                stack.push(c0);
                stack.push(c1);
            }
        }

        // every slot is either reachable or on the free chain, never both
        let mut free_count = 0usize;
        let mut seen_free = FxHashSet::default();
        let mut cursor = self.free_list;
        while cursor != INVALID_INDEX {
            assert!(
                (cursor as usize) < self.nodes.len(),
                "free-list index {} out of range",
                cursor
            );
            assert!(
                seen_free.insert(cursor),
                "free list revisits node {}; the chain has a cycle",
                cursor
            );
            assert!(
                !reachable.contains(&cursor),
                "node {} is both reachable and on the free list",
                cursor
            );
            let node = &self.nodes[cursor as usize];
            assert_eq!(
                node.parent, INVALID_INDEX,
                "free node {} still has a parent",
                cursor
            );
            assert_eq!(
                node.child[1], INVALID_INDEX,
                "free node {} still has a second child",
                cursor
            );
            free_count += 1;
            cursor = node.child[0];
        }
        assert_eq!(
            reachable.len() + free_count,
            self.nodes.len(),
            "free list and tree must partition the arena"
        );

        let quality = self.quality();
        assert!(quality >= 0.0, "quality must be non-negative");
        if self.live_leaves <= 1 {
            assert_eq!(quality, 0.0, "a tree of at most one node has no interior");
        }
    }
}
