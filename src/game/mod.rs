//! Game state: the height grid, workers and the player owning them.
//!
//! Only the board model is enforced here. Turn order, win conditions and move
//! legality beyond [`board::Board::find_available`] are left to callers.

pub mod board;
pub mod player;
pub mod worker;

pub use board::{Board, Cell};
pub use player::Player;
pub use worker::{Worker, WorkerPosition};
