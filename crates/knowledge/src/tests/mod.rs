//! Cross-component tests.

mod pipeline;
