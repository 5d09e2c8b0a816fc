// Bulk scanning - parallel fan-out over many targets

use super::{ScanError, ScanResult, Target, TlsScanner};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Scan many targets concurrently through a bounded worker pool.
///
/// Each scan is independent: one host's timeout never aborts or blocks the
/// others. Results come back in input order, each attributable to its own
/// target.
pub async fn scan_many(
    scanner: &TlsScanner,
    targets: &[Target],
    max_parallel: usize,
) -> Vec<(Target, Result<ScanResult, ScanError>)> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut tasks = Vec::with_capacity(targets.len());

    for target in targets {
        let target = target.clone();
        let scanner = scanner.clone();
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await.unwrap();
            let result = scanner.scan(&target.hostname, target.port).await;
            (target, result)
        });
        tasks.push(handle);
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (task, target) in tasks.into_iter().zip(targets) {
        match task.await {
            Ok(pair) => results.push(pair),
            Err(e) => {
                warn!("Scan task for {} failed: {}", target, e);
                results.push((
                    target.clone(),
                    Err(ScanError::UnexpectedIo {
                        detail: format!("scan task failed: {}", e),
                    }),
                ));
            }
        }
    }

    results
}
