// External process execution
//
// Runs an executable with a wall-clock timeout and bounded output capture.
// Argument semantics are the caller's business; the runner only classifies
// the outcome.

mod runner;

pub use runner::{run, ProcessInvocation, ProcessOutcome};
