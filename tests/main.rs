// Single main.rs for all integration tests
// https://endler.dev/2020/rust-compile-times/#combine-all-integration-tests-in-a-single-binary
//
// Suites live in subdirectories so Cargo doesn't pick them up as
// standalone test crates.

mod grid;
