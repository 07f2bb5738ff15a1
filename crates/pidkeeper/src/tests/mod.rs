//! Test suites for the lifecycle controller.

mod support;
