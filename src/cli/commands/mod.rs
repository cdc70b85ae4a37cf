pub mod layout;
pub mod share;
pub mod stats;
pub mod token;
pub mod tree;
