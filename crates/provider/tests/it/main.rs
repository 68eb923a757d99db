//! Scripted integration tests for the provider tiers.

#![allow(missing_docs)]

mod common;

mod reader;
mod simulate;
mod tester;
mod wallet;
