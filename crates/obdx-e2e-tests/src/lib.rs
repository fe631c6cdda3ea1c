//! Scenario tests for obdx live under `tests/`; this crate has no runtime code.
