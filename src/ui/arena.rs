use crate::ui::snapshot::{UiElement, UiSnapshot};

#[derive(Debug, Clone)]
pub struct ArenaNode<'a> {
    pub element: &'a UiElement,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
}

/// Pre-order arena over a snapshot's element tree.
///
/// Every element gets a slot; `indexed` lists, in the same order, the slots
/// whose element carries a grounding signal (text, description or id).
#[derive(Debug, Clone)]
pub struct UiArena<'a> {
    nodes: Vec<ArenaNode<'a>>,
    indexed: Vec<usize>,
}

impl<'a> UiArena<'a> {
    pub fn from_snapshot(snapshot: &'a UiSnapshot) -> Self {
        let mut nodes: Vec<ArenaNode<'a>> = Vec::new();
        let mut indexed = Vec::new();

        // (element, parent slot, depth); roots pushed reversed so they pop in order
        let mut stack: Vec<(&'a UiElement, Option<usize>, usize)> =
            snapshot.elements.iter().rev().map(|e| (e, None, 0)).collect();

        while let Some((element, parent, depth)) = stack.pop() {
            let slot = nodes.len();
            nodes.push(ArenaNode {
                element,
                parent,
                children: Vec::with_capacity(element.children.len()),
                depth,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(slot);
            }
            if element.has_signal() {
                indexed.push(slot);
            }
            for child in element.children.iter().rev() {
                stack.push((child, Some(slot), depth + 1));
            }
        }

        Self { nodes, indexed }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, slot: usize) -> Option<&ArenaNode<'a>> {
        self.nodes.get(slot)
    }

    /// Signal-bearing elements in pre-order.
    pub fn flattened(&self) -> impl Iterator<Item = (usize, &'a UiElement)> + '_ {
        self.indexed.iter().map(|&slot| (slot, self.nodes[slot].element))
    }

    pub fn indexed_len(&self) -> usize {
        self.indexed.len()
    }

    /// Slots from `slot` up to its root, nearest first.
    pub fn ancestors(&self, slot: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(slot).and_then(|n| n.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.nodes[parent].parent;
        }
        chain
    }
}
