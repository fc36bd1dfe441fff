pub mod context;
pub mod error;
pub mod facts;
pub mod lessons;
pub mod pipeline;
pub mod registry;
pub mod scales;
pub mod transition;
pub mod validator;
pub mod voice;
