pub(crate) mod bootstrap;
mod input;
pub(crate) mod loop_runner;
mod renderer;
mod scene;
