pub mod fact;
pub mod lesson;
pub mod scale;
pub mod snapshot;
pub mod transition;
