//! End-to-end tests running `rtcbuild build` against stand-in tool scripts.

#![cfg(unix)]

mod build_tests;
mod common;
