pub mod launcher;
pub mod results;
pub mod runner;
pub mod sampler;
pub mod settings;
