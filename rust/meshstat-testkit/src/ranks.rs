//! Simulated process groups.

use std::thread;

use meshstat_parallel::LocalCommunicator;

/// Runs `f` once per rank of a group of `size` ranks, each on its own thread
/// with its own connected [`LocalCommunicator`]. Returns the results ordered by
/// rank.
///
/// Fails if any rank panicked.
pub fn run_ranks<T, F>(size: usize, f: F) -> anyhow::Result<Vec<T>>
where
    T: Send,
    F: Fn(LocalCommunicator) -> T + Sync,
{
    anyhow::ensure!(size > 0, "a group needs at least one rank");
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = LocalCommunicator::group(size)
            .into_iter()
            .enumerate()
            .map(|(rank, comm)| {
                thread::Builder::new()
                    .name(format!("rank-{rank}"))
                    .spawn_scoped(scope, move || f(comm))
            })
            .collect::<std::io::Result<_>>()?;
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .map_err(|_| anyhow::anyhow!("rank {rank} panicked"))
            })
            .collect()
    })
}
