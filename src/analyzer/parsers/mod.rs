pub mod common;
pub use common::*;

pub mod expression;

#[cfg(test)]
mod tests;
