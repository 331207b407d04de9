//! IO layer: interfaces that expose the domain to callers.

pub mod rest;
