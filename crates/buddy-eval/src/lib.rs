//! Evaluation harness: run real-world prompts through Weather Buddy and
//! record what it understood and answered.

pub mod error;
pub mod harness;
pub mod prompts;
pub mod report;

pub use error::{EvalError, EvalResult};
pub use harness::{EvalMode, EvalRecord, EvalReport, Evaluator};
pub use prompts::{builtin_cases, load_jsonl, EvalCase};
pub use report::{write_csv, write_records, CSV_HEADER};
