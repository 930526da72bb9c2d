// Commentmood: sentiment report for every comment in a Reddit thread
//
// This is the library root. `reddit` collects comment bodies, `sentiment`
// scores them, `output` renders the report.

pub mod config;
pub mod output;
pub mod reddit;
pub mod sentiment;
