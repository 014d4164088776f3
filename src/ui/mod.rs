pub mod input;
pub mod renderer;

/// Which top-level view the host is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Title,
    Playing,
    Finished,
}
