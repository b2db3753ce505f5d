#![no_std]

// Control logic for the two-stage door closure.
//
// The crate stays portable across the MCU firmware and host tooling by avoiding
// the Rust standard library. Hardware is reached only through the traits in
// `motor`, `indicator` and `io`.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod dispatch;
pub mod history;
pub mod indicator;
pub mod io;
pub mod motor;
pub mod schedule;
