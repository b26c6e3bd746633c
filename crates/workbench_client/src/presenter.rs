use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use workbench_core::reveal::{
    reveal_instantly, reveal_steps, CopyButtons, DisplaySurface, PostProcessor, RevealStep,
};
use workbench_core::ContentTree;
use workbench_logging::bench_debug;

#[derive(Debug, Clone)]
pub struct PresenterSettings {
    /// Pause after each revealed character. Zero reveals without waiting.
    pub char_delay: Duration,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    /// Stopped early; the surface keeps what was shown and post-processing
    /// did not run.
    Cancelled,
}

/// Types content onto a surface one character at a time.
///
/// The surface sits behind a fair async mutex held for a whole reveal, so
/// two reveals on the same surface run one after the other in call order.
pub struct TypewriterPresenter<S> {
    surface: Arc<Mutex<S>>,
    settings: PresenterSettings,
    post: Option<Arc<dyn PostProcessor>>,
}

impl<S> Clone for TypewriterPresenter<S> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            settings: self.settings.clone(),
            post: self.post.clone(),
        }
    }
}

impl<S: DisplaySurface> TypewriterPresenter<S> {
    /// Code blocks get copy buttons once a reveal completes.
    pub fn new(surface: S, settings: PresenterSettings) -> Self {
        Self {
            surface: Arc::new(Mutex::new(surface)),
            settings,
            post: Some(Arc::new(CopyButtons)),
        }
    }

    pub fn with_post_processor(mut self, post: Option<Arc<dyn PostProcessor>>) -> Self {
        self.post = post;
        self
    }

    pub fn surface(&self) -> Arc<Mutex<S>> {
        self.surface.clone()
    }

    pub fn settings(&self) -> &PresenterSettings {
        &self.settings
    }

    pub async fn reveal(&self, tree: &ContentTree, cancel: &CancellationToken) -> RevealOutcome {
        let mut surface = self.surface.lock().await;
        surface.begin();
        let delay = self.settings.char_delay;

        for step in reveal_steps(tree) {
            if cancel.is_cancelled() {
                bench_debug!("reveal cancelled");
                return RevealOutcome::Cancelled;
            }
            surface.apply(&step);
            if matches!(step, RevealStep::Char(_)) && !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        bench_debug!("reveal cancelled");
                        return RevealOutcome::Cancelled;
                    }
                    _ = sleep(delay) => {}
                }
            }
        }

        if let Some(post) = &self.post {
            post.process(surface.content_mut());
        }
        surface.finish();
        RevealOutcome::Completed
    }

    /// Shows content at once, without post-processing.
    pub async fn present(&self, tree: &ContentTree) {
        let mut surface = self.surface.lock().await;
        reveal_instantly(&mut *surface, tree, None);
    }

    pub async fn clear(&self) {
        self.surface.lock().await.clear();
    }
}
