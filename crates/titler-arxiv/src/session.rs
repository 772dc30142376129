//! Per-page runtime: one task owns the page DOM, everything else talks to it.
//!
//! The page task applies commands in arrival order, so title writes from the
//! resolver, the reassertion chain and inbound signals never interleave. The
//! last write wins.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use titler_core::clipboard::build_and_copy;
use titler_core::{BackoffSchedule, Clipboard, Page, TITLE_PLACEHOLDER, TitlerConfig};

use crate::citation::page_citation;
use crate::client::ArxivClient;
use crate::error::{ArxivError, Result};
use crate::identifiers::{ArxivId, extract_id, is_pdf_path};
use crate::signal::InboundSignal;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub schedule: BackoffSchedule,
    /// Class of the title element on landing pages.
    pub title_class: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            schedule: BackoffSchedule::default(),
            title_class: "title".to_string(),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &TitlerConfig) -> titler_core::Result<Self> {
        Ok(Self {
            schedule: config.backoff.schedule()?,
            title_class: config.page.title_class.clone(),
        })
    }
}

type PageJob = Box<dyn FnOnce(&mut Page) + Send>;

enum PageCommand {
    InjectTitle(String),
    TitleResolved {
        title: String,
        reassert: ReassertHandle,
    },
    Signal(InboundSignal),
    Run(PageJob),
    Unload,
}

// ─── PageHandle ───────────────────────────────────────────────────────────────

/// Cheap, cloneable sender to the task that owns a page.
#[derive(Clone)]
pub struct PageHandle {
    tx: mpsc::UnboundedSender<PageCommand>,
}

impl PageHandle {
    /// Queue a title injection. Returns false once the page is gone.
    pub fn inject_title(&self, title: impl Into<String>) -> bool {
        self.tx.send(PageCommand::InjectTitle(title.into())).is_ok()
    }

    pub fn signal(&self, signal: InboundSignal) -> bool {
        self.tx.send(PageCommand::Signal(signal)).is_ok()
    }

    /// Run `f` against the page inside its owning task.
    pub async fn with_page<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Page) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: PageJob = Box::new(move |page| {
            let _ = tx.send(f(page));
        });
        self.tx.send(PageCommand::Run(job)).ok()?;
        rx.await.ok()
    }

    /// Current display title of the page.
    pub async fn title(&self) -> Option<String> {
        self.with_page(|page| page.title()).await
    }

    /// Tear the page down. Pending reassertions stop with it.
    pub fn unload(&self) -> bool {
        self.tx.send(PageCommand::Unload).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn title_resolved(&self, title: String, reassert: ReassertHandle) -> bool {
        self.tx
            .send(PageCommand::TitleResolved { title, reassert })
            .is_ok()
    }
}

// ─── Reassertion ──────────────────────────────────────────────────────────────

/// A running reassertion chain. Dropping the handle stops the chain.
pub struct ReassertHandle {
    task: Option<JoinHandle<usize>>,
}

impl ReassertHandle {
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Wait for the chain to run out and return how many injections it made.
    pub async fn join(mut self) -> usize {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for ReassertHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Inject `title` now, then again after every delay in `schedule`.
///
/// The first injection is queued before this returns. The chain ends when the
/// schedule runs out or the page is unloaded.
pub fn schedule_reassert(
    page: PageHandle,
    title: String,
    schedule: BackoffSchedule,
) -> ReassertHandle {
    if !page.inject_title(title.clone()) {
        return ReassertHandle { task: None };
    }

    let task = tokio::spawn(async move {
        let mut injections = 1usize;
        for delay in schedule {
            tokio::time::sleep(delay).await;
            if !page.inject_title(title.clone()) {
                debug!("page closed, stopping title reassertion");
                break;
            }
            injections += 1;
            debug!(?delay, injections, "re-asserted paper title");
        }
        injections
    });

    ReassertHandle { task: Some(task) }
}

// ─── Page task ────────────────────────────────────────────────────────────────

struct PageSession {
    page: Page,
    rx: mpsc::UnboundedReceiver<PageCommand>,
    clipboard: Box<dyn Clipboard + Send>,
    /// Last successfully resolved title; read by `UpdateTitle`.
    last_title: Option<String>,
    reassert: Option<ReassertHandle>,
}

impl PageSession {
    async fn run(mut self) -> Page {
        while let Some(command) = self.rx.recv().await {
            match command {
                PageCommand::InjectTitle(title) => self.page.inject_title(&title),
                PageCommand::TitleResolved { title, reassert } => {
                    info!(%title, "resolved paper title");
                    self.last_title = Some(title);
                    if self.reassert.replace(reassert).is_some() {
                        debug!("replaced previous reassertion chain");
                    }
                }
                PageCommand::Signal(InboundSignal::UpdateTitle) => match &self.last_title {
                    Some(title) => {
                        debug!("re-asserting title on request");
                        self.page.inject_title(title);
                    }
                    None => debug!("no resolved title to re-assert"),
                },
                PageCommand::Signal(InboundSignal::CopyPaperToClipboard) => self.copy_citation(),
                PageCommand::Run(job) => job(&mut self.page),
                PageCommand::Unload => break,
            }
        }
        self.reassert.take();
        self.page
    }

    fn copy_citation(&mut self) {
        let segments = match page_citation(&self.page) {
            Ok(segments) => segments,
            Err(e) => {
                warn!(error = %e, "cannot build a citation for this page");
                return;
            }
        };
        match build_and_copy(&mut self.page.document, &segments, self.clipboard.as_mut()) {
            Ok(()) => info!("copied paper citation to clipboard"),
            Err(e) => warn!(error = %e, "clipboard export failed"),
        }
    }
}

/// Hand `page` to a new owning task.
pub fn spawn_page(page: Page, clipboard: Box<dyn Clipboard + Send>) -> (PageHandle, JoinHandle<Page>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = PageSession {
        page,
        rx,
        clipboard,
        last_title: None,
        reassert: None,
    };
    (PageHandle { tx }, tokio::spawn(session.run()))
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// A loaded page with its title logic running.
pub struct Session {
    handle: PageHandle,
    resolver: Option<JoinHandle<Option<String>>>,
    task: JoinHandle<Page>,
}

impl Session {
    pub fn handle(&self) -> PageHandle {
        self.handle.clone()
    }

    /// Wait for the metadata lookup. `None` when there was no lookup, it
    /// failed, or it was already awaited.
    pub async fn resolved(&mut self) -> Option<String> {
        let resolver = self.resolver.take()?;
        resolver.await.ok().flatten()
    }

    /// Unload the page and get its final state back.
    pub async fn close(self) -> Result<Page> {
        self.handle.unload();
        if let Some(resolver) = self.resolver {
            resolver.abort();
        }
        self.task
            .await
            .map_err(|e| ArxivError::Task(e.to_string()))
    }
}

/// Start the title logic for a freshly loaded page.
///
/// PDF viewer pages get a remote lookup followed by the reassertion chain.
/// Any other page has its title read from the title element and injected once.
pub fn open_session(
    mut page: Page,
    client: Arc<ArxivClient>,
    clipboard: Box<dyn Clipboard + Send>,
    options: SessionOptions,
) -> Session {
    let path = page.location.pathname.clone();

    if !is_pdf_path(&path) {
        let title = page.landing_title(&options.title_class).unwrap_or_else(|| {
            warn!("unable to find a title element in the page");
            TITLE_PLACEHOLDER.to_string()
        });
        page.inject_title(&title);
        let (handle, task) = spawn_page(page, clipboard);
        return Session {
            handle,
            resolver: None,
            task,
        };
    }

    let (handle, task) = spawn_page(page, clipboard);
    let resolver = match extract_id(&path) {
        Ok(id) => Some(tokio::spawn(resolve(
            handle.clone(),
            client,
            id,
            options.schedule,
        ))),
        Err(e) => {
            debug!(error = %e, "could not get submission ID");
            None
        }
    };

    Session {
        handle,
        resolver,
        task,
    }
}

async fn resolve(
    page: PageHandle,
    client: Arc<ArxivClient>,
    id: ArxivId,
    schedule: BackoffSchedule,
) -> Option<String> {
    // fetch_title logs its own failures
    let title = client.fetch_title(&id).await.ok()?;
    let reassert = schedule_reassert(page.clone(), title.clone(), schedule);
    page.title_resolved(title.clone(), reassert);
    Some(title)
}
