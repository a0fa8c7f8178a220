//! Integration tests driving the engine through its public API.

mod lifecycle;
mod simulation;
