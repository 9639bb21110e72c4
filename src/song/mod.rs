//! The song compiler: turns a parsed XML arrangement tree
//! into the fully-resolved structure the binary SNG writer expects.

pub mod compile;
pub mod input;
pub mod masks;
pub mod model;

pub use compile::compile;
pub use input::SongInput;
pub use model::CompiledSong;
