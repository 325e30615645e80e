//! japps library exports

pub mod api;
pub mod cli;
pub mod core;

#[cfg(test)]
pub mod test_support;
