//! The three processing stages: flatten, re-encode to budget, and the batch driver.

pub mod batch;
pub mod normalize;
pub mod reencode;

pub use batch::BatchProcessor;
pub use normalize::normalize;
pub use reencode::{
    EncodeAttempt, ImageCrateEncoder, QualityEncoder, ReencodeOutcome, Reencoder,
};
