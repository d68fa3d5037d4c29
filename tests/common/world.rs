use std::thread;
use uneven_matrix_multiplication::comm::{local_world, LocalCommunicator};

/// Run `f` once per rank of a fresh in-process world and collect the results
/// in rank order.
pub fn spawn_world<R, F>(size: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(LocalCommunicator) -> R + Sync,
{
    let comms = local_world(size).expect("world");
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| scope.spawn(move || f(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("participant panicked"))
            .collect()
    })
}

/// C for the built-in reference A and B
pub fn reference_c() -> Vec<i64> {
    vec![14, 32, 32, 77, 50, 122, 68, 167, 86, 212]
}
