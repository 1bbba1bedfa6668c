//! The Huffman code tree and the code table derived from it.
//! The tree is built bottom-up from a frequency table and never mutated
//! afterwards; encoding reads the table, decoding walks the tree directly.

use bit_vec::BitVec;
use crate::tools::priority_list::PriorityList;
use crate::{ALPH_SIZE,PSEUDO_EOF};

/// One node of the code tree.  Symbols live only in the leaves; an internal
/// node's weight is the sum of its children's weights.  Weights matter only
/// during construction, a tree read back from a header leaves them zero.
#[derive(Debug,PartialEq,Eq)]
pub enum CodeNode {
    Leaf { symbol: u16, weight: u64 },
    Internal { weight: u64, left: Box<CodeNode>, right: Box<CodeNode> }
}

impl CodeNode {
    pub fn leaf(symbol: u16,weight: u64) -> Self {
        Self::Leaf { symbol, weight }
    }
    /// combine two nodes, the first one removed from the list becomes the left child
    pub fn combine(left: CodeNode,right: CodeNode) -> Self {
        Self::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right)
        }
    }
    pub fn weight(&self) -> u64 {
        match self {
            Self::Leaf { weight, .. } => *weight,
            Self::Internal { weight, .. } => *weight
        }
    }
}

/// Build the code tree from a frequency table.  Leaves enter the list in
/// ascending symbol order with the pseudo-EOF last; combined with the list's
/// stable tie-break this makes compressor and decompressor converge on the
/// same tree when only the counts are transmitted.
pub fn build_tree(freqs: &[u32;ALPH_SIZE]) -> CodeNode {
    let mut list = PriorityList::new();
    for symbol in 0..ALPH_SIZE {
        if freqs[symbol] > 0 {
            list.insert(CodeNode::leaf(symbol as u16,freqs[symbol] as u64));
        }
    }
    list.insert(CodeNode::leaf(PSEUDO_EOF as u16,1));
    while list.len() > 1 {
        let left = list.remove_min().unwrap(); // list has at least 2 entries
        let right = list.remove_min().unwrap();
        list.insert(CodeNode::combine(left,right));
    }
    list.remove_min().unwrap() // the pseudo-EOF leaf guarantees one entry
}

/// Generate the code table, one bit string per leaf: the root-to-leaf path
/// with 0 for left and 1 for right.  Index is the symbol value, the slot
/// beyond the real alphabet belongs to the pseudo-EOF.  A lone root leaf
/// gets the empty code.
pub fn gen_codes(root: &CodeNode) -> Vec<Option<BitVec>> {
    let mut table: Vec<Option<BitVec>> = vec![None;ALPH_SIZE+1];
    walk(root,BitVec::new(),&mut table);
    table
}

fn walk(node: &CodeNode,path: BitVec,table: &mut Vec<Option<BitVec>>) {
    match node {
        CodeNode::Leaf { symbol, .. } => {
            table[*symbol as usize] = Some(path);
        },
        CodeNode::Internal { left, right, .. } => {
            let mut left_path = path.clone();
            left_path.push(false);
            walk(left,left_path,table);
            let mut right_path = path;
            right_path.push(true);
            walk(right,right_path,table);
        }
    }
}

#[cfg(test)]
fn code_string(table: &Vec<Option<BitVec>>,symbol: usize) -> String {
    table[symbol].as_ref().unwrap().iter().map(|b| match b { true => '1', false => '0' }).collect()
}

#[test]
fn worked_example() {
    // 'a' twice, 'b' once, plus the implied pseudo-EOF
    let mut freqs = [0u32;ALPH_SIZE];
    freqs[97] = 2;
    freqs[98] = 1;
    let tree = build_tree(&freqs);
    assert_eq!(tree.weight(),4);
    let codes = gen_codes(&tree);
    assert_eq!(code_string(&codes,97),"0");
    assert_eq!(code_string(&codes,98),"10");
    assert_eq!(code_string(&codes,PSEUDO_EOF),"11");
}

#[test]
fn empty_input_is_a_lone_eof_leaf() {
    let freqs = [0u32;ALPH_SIZE];
    let tree = build_tree(&freqs);
    assert_eq!(tree,CodeNode::leaf(PSEUDO_EOF as u16,1));
    let codes = gen_codes(&tree);
    assert_eq!(codes[PSEUDO_EOF].as_ref().unwrap().len(),0);
}

#[test]
fn construction_is_deterministic() {
    let mut freqs = [0u32;ALPH_SIZE];
    for (i,f) in [(10,3),(20,3),(30,3),(40,1),(50,7)] {
        freqs[i as usize] = f;
    }
    let first = build_tree(&freqs);
    let second = build_tree(&freqs);
    assert_eq!(first,second);
}

#[test]
fn codes_are_prefix_free() {
    let mut freqs = [0u32;ALPH_SIZE];
    for i in 0..26 {
        freqs[97+i] = (i*i + 1) as u32;
    }
    let codes = gen_codes(&build_tree(&freqs));
    let strings: Vec<String> = (0..=ALPH_SIZE).filter(|s| codes[*s].is_some())
        .map(|s| code_string(&codes,s)).collect();
    for i in 0..strings.len() {
        for j in 0..strings.len() {
            if i != j {
                assert!(!strings[i].starts_with(&strings[j]));
            }
        }
    }
}
