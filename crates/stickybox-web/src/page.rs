#![forbid(unsafe_code)]

//! A page: one document, one registry, one macrotask queue.
//!
//! [`StickyPage`] plays the event loop. Host changes queue signals on the
//! document; [`StickyPage::pump`] delivers them synchronously, and
//! [`StickyPage::end_macrotask`] runs the deferred tick clears. A typical
//! step is "change something, [`tick`](StickyPage::tick)".

use stickybox_core::{
    Evaluation, ManualScheduler, MountRequest, NodeId, StickyConfig, StickyContext, StickyMount,
};
use tracing::trace;

use crate::document::SyntheticDocument;

#[derive(Debug)]
pub struct StickyPage {
    document: SyntheticDocument,
    context: StickyContext,
    scheduler: ManualScheduler,
}

impl StickyPage {
    #[must_use]
    pub fn new(document: SyntheticDocument) -> Self {
        Self::with_config(document, StickyConfig::default())
    }

    #[must_use]
    pub fn with_config(document: SyntheticDocument, config: StickyConfig) -> Self {
        let scheduler = ManualScheduler::new();
        let context = StickyContext::with_config(config, scheduler.clone());
        Self {
            document,
            context,
            scheduler,
        }
    }

    #[must_use]
    pub fn document(&self) -> &SyntheticDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut SyntheticDocument {
        &mut self.document
    }

    #[must_use]
    pub fn context(&self) -> &StickyContext {
        &self.context
    }

    #[must_use]
    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    pub fn mount(&mut self, element: NodeId, width: f64) -> StickyMount {
        self.context
            .mount(&mut self.document, MountRequest::new(element, width))
    }

    pub fn unmount(&mut self, mount: StickyMount) -> bool {
        self.context.unmount(&mut self.document, mount)
    }

    /// Report the element's natural height to its mount.
    pub fn measure(&mut self, mount: &mut StickyMount, height: f64) -> bool {
        mount.on_measure(&mut self.document, height)
    }

    /// Deliver queued signals until the inbox is empty.
    ///
    /// Style writes made while delivering can queue further mutation signals;
    /// those are delivered too and normally coalesce.
    pub fn pump(&mut self) -> Vec<Evaluation> {
        let mut evaluations = Vec::new();
        let mut delivered = 0usize;
        while let Some((id, signal)) = self.document.next_signal() {
            delivered += 1;
            if let Some(evaluation) = self.context.dispatch(&mut self.document, id, signal) {
                evaluations.push(evaluation);
            }
        }
        trace!(delivered, evaluated = evaluations.len(), "inbox drained");
        evaluations
    }

    /// Finish the current macrotask. Returns the number of deferred tasks run.
    pub fn end_macrotask(&mut self) -> usize {
        self.scheduler.run_pending()
    }

    /// Deliver queued signals, then finish the macrotask.
    pub fn tick(&mut self) -> Vec<Evaluation> {
        let evaluations = self.pump();
        self.end_macrotask();
        evaluations
    }

    /// Scroll the window and run one macrotask.
    pub fn scroll_to(&mut self, y: f64) -> Vec<Evaluation> {
        self.document.scroll_window_to(y);
        self.tick()
    }

    /// Re-evaluate every registered instance.
    pub fn recompute_all(&mut self) -> Vec<Evaluation> {
        self.context.recompute_all(&mut self.document)
    }
}
