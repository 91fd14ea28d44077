mod doctor;
mod merge;
mod report;

pub use doctor::{Diagnosis, Doctor, FixOptions};
pub use merge::{merge_commands, merge_key};
pub use report::{FixAction, FixFailure, FixReport};
