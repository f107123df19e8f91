pub mod pacing;
pub mod population;
pub mod selector;
pub mod stats;
pub mod transport;
pub mod user;
