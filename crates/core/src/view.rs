use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::types::{CopyTag, Tab};

/// How long the "Copied!" indicator stays up.
pub const COPY_FEEDBACK_WINDOW: Duration = Duration::from_secs(5);

/// Seam to the system clipboard so the controller stays testable.
pub trait Clipboard: Send {
    fn set_contents(&mut self, text: String) -> anyhow::Result<()>;
}

struct CopiedSlot {
    tag: Option<CopyTag>,
    epoch: u64,
}

/// Pure UI state: the visible content tab and the transient copied
/// indicator. Copy timers are owned here and die with the view.
pub struct ViewState {
    active_tab: Tab,
    copied: Arc<Mutex<CopiedSlot>>,
    reset: Option<JoinHandle<()>>,
    window: Duration,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_reset_window(COPY_FEEDBACK_WINDOW)
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reset_window(window: Duration) -> Self {
        Self {
            active_tab: Tab::default(),
            copied: Arc::new(Mutex::new(CopiedSlot {
                tag: None,
                epoch: 0,
            })),
            reset: None,
            window,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn set_active_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn copied_item(&self) -> Option<CopyTag> {
        self.copied.lock().expect("copied slot poisoned").tag
    }

    /// Write `text` to the clipboard and show the indicator for `tag`.
    /// A new copy replaces the indicator and restarts the reset window; the
    /// superseded timer is cancelled and an epoch check keeps a late firing
    /// from clearing a newer indicator.
    pub fn copy(
        &mut self,
        text: &str,
        tag: CopyTag,
        clipboard: &mut dyn Clipboard,
    ) -> anyhow::Result<()> {
        clipboard.set_contents(text.to_owned())?;

        let epoch = {
            let mut slot = self.copied.lock().expect("copied slot poisoned");
            slot.epoch += 1;
            slot.tag = Some(tag);
            slot.epoch
        };

        if let Some(previous) = self.reset.take() {
            previous.abort();
        }

        let slot = Arc::clone(&self.copied);
        let window = self.window;
        self.reset = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut slot = slot.lock().expect("copied slot poisoned");
            if slot.epoch == epoch {
                slot.tag = None;
            }
        }));

        Ok(())
    }
}

impl Drop for ViewState {
    fn drop(&mut self) {
        if let Some(reset) = self.reset.take() {
            reset.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeClipboard {
        contents: Vec<String>,
    }

    impl Clipboard for FakeClipboard {
        fn set_contents(&mut self, text: String) -> anyhow::Result<()> {
            self.contents.push(text);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn indicator_resets_after_the_window() {
        let mut view = ViewState::with_reset_window(Duration::from_secs(5));
        let mut clipboard = FakeClipboard::default();

        view.copy("T", CopyTag::Transcript, &mut clipboard).unwrap();
        assert_eq!(view.copied_item(), Some(CopyTag::Transcript));
        assert_eq!(clipboard.contents, vec!["T".to_string()]);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        tokio::task::yield_now().await;
        assert_eq!(view.copied_item(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_copy_replaces_indicator_and_restarts_the_window() {
        let mut view = ViewState::with_reset_window(Duration::from_secs(5));
        let mut clipboard = FakeClipboard::default();

        view.copy("T", CopyTag::Transcript, &mut clipboard).unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        view.copy("S", CopyTag::Summary, &mut clipboard).unwrap();
        assert_eq!(view.copied_item(), Some(CopyTag::Summary));

        // Past the first copy's deadline: the stale reset must not fire.
        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(view.copied_item(), Some(CopyTag::Summary));

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        tokio::task::yield_now().await;
        assert_eq!(view.copied_item(), None);
    }

    #[tokio::test]
    async fn failed_clipboard_write_leaves_indicator_unset() {
        struct BrokenClipboard;
        impl Clipboard for BrokenClipboard {
            fn set_contents(&mut self, _text: String) -> anyhow::Result<()> {
                anyhow::bail!("no display")
            }
        }

        let mut view = ViewState::new();
        assert!(
            view.copy("T", CopyTag::Transcript, &mut BrokenClipboard)
                .is_err()
        );
        assert_eq!(view.copied_item(), None);
    }

    #[test]
    fn tab_switching_is_side_effect_free() {
        let mut view = ViewState::new();
        assert_eq!(view.active_tab(), Tab::Summary);
        view.set_active_tab(Tab::KeyPoints);
        assert_eq!(view.active_tab(), Tab::KeyPoints);
    }
}
