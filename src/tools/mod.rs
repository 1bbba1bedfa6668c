//! Supporting structures for the `standard_huff` module.

pub mod bit_io;
pub mod priority_list;
pub mod code_tree;
