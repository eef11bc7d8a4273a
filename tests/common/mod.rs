#![allow(dead_code, unused_imports)]

pub use procguard_test_utils::*;
