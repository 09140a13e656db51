mod stale_sweeper;

pub use stale_sweeper::StaleSweeper;
