pub mod check;
pub mod filter;
pub mod lifecycle;
pub mod mutate;
pub mod position;
pub mod recurrence;
pub mod sort;
pub mod tree;
