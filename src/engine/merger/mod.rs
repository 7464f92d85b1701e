mod merge_queue;
mod params;
mod remote;
mod results_merger;


pub use params::MergeParams;
pub use results_merger::{MergerStats, PullResult, RemoteStreamMerger};
