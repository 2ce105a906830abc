pub mod board;
pub mod game;
pub mod nonogram;
pub mod search;
pub mod storage;

#[cfg(feature = "remote-advisor")]
pub mod remote;
