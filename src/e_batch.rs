//! Rendering the merged view of every indexed file.
//!
//! Each file is an independent query against the shared index. With the `concurrent`
//! feature they run on a thread pool, so one slow read does not hold up the rest.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
#[cfg(feature = "concurrent")]
use anyhow::anyhow;

use crate::e_index::AnnotationIndex;
use crate::e_merge::MergedView;

/// Result for one file of a batch, in index order.
#[derive(Debug)]
pub struct BatchItem {
    pub path: String,
    pub output: Result<String>,
}

/// Summary of a finished batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|item| item.output.is_err()).count()
    }
}

fn render_one<F>(index: &AnnotationIndex, path: &str, render: &F) -> Result<String>
where
    F: Fn(&MergedView<'_>) -> Result<String>,
{
    let view = index.merged_view(path)?;
    render(&view)
}

/// Builds and renders the view of every file in `index`, using up to `jobs` workers.
///
/// Failures are kept per file; one unreadable file does not stop the others.
pub fn render_all<F>(index: Arc<AnnotationIndex>, jobs: usize, render: F) -> BatchReport
where
    F: Fn(&MergedView<'_>) -> Result<String> + Send + Sync + 'static,
{
    let start = Instant::now();
    let paths: Vec<String> = index.files().map(|file| file.path().to_string()).collect();
    let items: Vec<BatchItem>;

    #[cfg(feature = "concurrent")]
    {
        use std::sync::mpsc;
        use threadpool::ThreadPool;

        let pool = ThreadPool::new(jobs.max(1));
        let render = Arc::new(render);
        let (tx, rx) = mpsc::channel();
        for (slot, path) in paths.iter().enumerate() {
            let tx = tx.clone();
            let path = path.clone();
            let index = Arc::clone(&index);
            let render = Arc::clone(&render);
            pool.execute(move || {
                let output = render_one(&index, &path, render.as_ref());
                if tx.send((slot, BatchItem { path, output })).is_err() {
                    log::warn!("batch receiver went away");
                }
            });
        }
        drop(tx);
        pool.join();

        // A job that panicked never sends; its slot stays empty.
        let mut slots: Vec<Option<BatchItem>> = paths.iter().map(|_| None).collect();
        for (slot, item) in rx {
            if let Some(entry) = slots.get_mut(slot) {
                *entry = Some(item);
            }
        }
        if pool.panic_count() > 0 {
            log::error!("{} render jobs panicked", pool.panic_count());
        }
        items = slots
            .into_iter()
            .zip(paths)
            .map(|(item, path)| {
                item.unwrap_or_else(|| BatchItem {
                    output: Err(anyhow!("rendering {} did not finish", path)),
                    path,
                })
            })
            .collect();
    }

    #[cfg(not(feature = "concurrent"))]
    {
        let _ = jobs;
        items = paths
            .into_iter()
            .map(|path| {
                let output = render_one(&index, &path, &render);
                BatchItem { path, output }
            })
            .collect();
    }

    for item in &items {
        if let Err(e) = &item.output {
            log::warn!("{}: {:#}", item.path, e);
        }
    }
    log::debug!("rendered {} views in {:?}", items.len(), start.elapsed());
    BatchReport { items }
}
