//! Host-based behaviour tests for the iambic keyer
//!
//! Everything runs against the simulated HAL from `cw_keyer_core::test_utils`,
//! so timings are exact heartbeat counts.

#[cfg(test)]
mod adapter_tests;
#[cfg(test)]
mod mode_behavior_tests;
#[cfg(test)]
mod squeeze_tests;
#[cfg(test)]
mod timing_tests;
