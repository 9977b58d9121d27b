//! Scoreboard OCR - rebuild game scoreboards from OCR detections
//!
//! Takes the text lines an OCR pass found on a scoreboard screenshot and
//! recovers the player-name column and, best effort, each player's stats.

pub mod config;
pub mod storage;
pub mod vision;

pub use config::AppConfig;
pub use vision::ScoreboardParser;
