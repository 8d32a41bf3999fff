// File: ./src/model/mod.rs
pub mod event;
pub mod normalize;

pub use event::{NormalizedEvent, RawEvent};
pub use normalize::{MAX_DESCRIPTION_LEN, clean_description, normalize, to_iso_date};
