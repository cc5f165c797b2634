pub mod audio;
pub mod jobs;
pub mod media;
pub mod pipeline;
pub mod shared;
pub mod verification;
