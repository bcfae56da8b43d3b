//! Price analysis — history statistics and deal scoring.

pub mod history;
pub mod scorer;
