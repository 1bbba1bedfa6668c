//! Stable priority list that drives code tree construction.
//! Both sides of the codec merge nodes in exactly the order this list
//! hands them out, so the tie-break below is part of the stream format:
//! a counts header only reproduces the compressor's tree if equal-weight
//! entries keep their insertion order.

use crate::tools::code_tree::CodeNode;

pub struct PriorityList {
    entries: Vec<CodeNode>
}

impl PriorityList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new()
        }
    }
    /// Insert keeping ascending weight order.  The scan skips every entry
    /// whose weight is less than or equal to the new node's weight, so a
    /// newcomer lands behind all existing entries of the same weight.
    pub fn insert(&mut self,node: CodeNode) {
        let mut index = 0;
        while index < self.entries.len() && self.entries[index].weight() <= node.weight() {
            index += 1;
        }
        self.entries.insert(index,node);
    }
    /// remove and return the lowest weight entry, None if the list is empty
    pub fn remove_min(&mut self) -> Option<CodeNode> {
        match self.entries.len() {
            0 => None,
            _ => Some(self.entries.remove(0))
        }
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[test]
fn ascending_order() {
    let mut list = PriorityList::new();
    list.insert(CodeNode::leaf(10,5));
    list.insert(CodeNode::leaf(11,1));
    list.insert(CodeNode::leaf(12,3));
    assert_eq!(list.len(),3);
    assert_eq!(list.remove_min().unwrap().weight(),1);
    assert_eq!(list.remove_min().unwrap().weight(),3);
    assert_eq!(list.remove_min().unwrap().weight(),5);
    assert!(list.remove_min().is_none());
}

#[test]
fn equal_weights_keep_insertion_order() {
    let mut list = PriorityList::new();
    list.insert(CodeNode::leaf(1,2));
    list.insert(CodeNode::leaf(2,2));
    list.insert(CodeNode::leaf(3,1));
    list.insert(CodeNode::leaf(4,2));
    let order: Vec<u16> = (0..4).map(|_| {
        match list.remove_min().unwrap() {
            CodeNode::Leaf { symbol, .. } => symbol,
            _ => panic!("expected leaf")
        }
    }).collect();
    assert_eq!(order,vec![3,1,2,4]);
}
