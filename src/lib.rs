pub mod core;
pub mod evaluation;
pub mod metrics;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
