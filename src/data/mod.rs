// mod.rs - Input data module

pub mod sequences;

pub use sequences::{detect_format, filter_records, load_sequences, InputFormat, SequenceRecord};
