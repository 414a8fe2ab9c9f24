//! Gate evaluation: which screen a user may see

mod evaluator;


pub use evaluator::{decide, GateEvaluation, GateEvaluator};
