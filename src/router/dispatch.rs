use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Result, bail};

/// Fixed-size worker pool over `items`. Each worker claims the next unclaimed
/// index and writes into that index's slot, so results come back in input
/// order whatever order the jobs finish in.
pub fn fan_out<T, R, F>(items: &[T], workers: usize, job: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send + Sync,
    F: Fn(usize, &T) -> R + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let slots = (0..items.len())
        .map(|_| OnceLock::new())
        .collect::<Vec<OnceLock<R>>>();
    let next_index = AtomicUsize::new(0);
    let workers = workers.clamp(1, items.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let index = next_index.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    let _ = slots[index].set(job(index, item));
                }
            });
        }
    });

    let mut results = Vec::<R>::with_capacity(items.len());
    for (index, slot) in slots.into_iter().enumerate() {
        let Some(result) = slot.into_inner() else {
            bail!("result slot {index} was never filled");
        };
        results.push(result);
    }
    Ok(results)
}
