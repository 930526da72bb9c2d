// Reddit thread access: OAuth session, comment tree, placeholder expansion.
//
// `collector` is the entry point; the other submodules are its plumbing.

pub mod client;
pub mod collector;
pub mod forest;
pub mod listing;
pub mod traits;
