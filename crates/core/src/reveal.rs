use std::{
    collections::BTreeSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Notify, task::JoinHandle};

/// One-shot visibility latch for entrance animation: flips the first time
/// the element intersects the viewport and never reverts.
#[derive(Default)]
pub struct Reveal {
    visible: AtomicBool,
}

impl Reveal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an intersection. Returns `true` only on the call that revealed
    /// the element; later intersections are no-ops.
    pub fn intersected(&self) -> bool {
        !self.visible.swap(true, Ordering::SeqCst)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

struct Revealed {
    indices: Mutex<BTreeSet<usize>>,
    notify: Notify,
}

impl Revealed {
    fn insert(&self, index: usize) {
        self.indices
            .lock()
            .expect("revealed set poisoned")
            .insert(index);
        self.notify.notify_one();
    }
}

/// Staggered reveal of a container's items: the first intersection schedules
/// item `i` to reveal `i * delay` later. The revealed set only grows, and
/// independent instances share nothing. Pending timers die with the engine.
pub struct StaggeredReveal {
    item_count: usize,
    delay: Duration,
    triggered: AtomicBool,
    revealed: Arc<Revealed>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl StaggeredReveal {
    pub fn new(item_count: usize, delay: Duration) -> Self {
        Self {
            item_count,
            delay,
            triggered: AtomicBool::new(false),
            revealed: Arc::new(Revealed {
                indices: Mutex::new(BTreeSet::new()),
                notify: Notify::new(),
            }),
            timers: Mutex::new(Vec::new()),
        }
    }

    /// First intersection of the container starts the stagger; the container
    /// is effectively unobserved afterwards.
    pub fn intersected(&self) {
        if self.triggered.swap(true, Ordering::SeqCst) || self.item_count == 0 {
            return;
        }

        self.revealed.insert(0);

        let mut timers = self.timers.lock().expect("timer list poisoned");
        for index in 1..self.item_count {
            let revealed = Arc::clone(&self.revealed);
            let delay = self.delay * index as u32;
            timers.push(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                revealed.insert(index);
            }));
        }
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed
            .indices
            .lock()
            .expect("revealed set poisoned")
            .contains(&index)
    }

    pub fn revealed(&self) -> BTreeSet<usize> {
        self.revealed
            .indices
            .lock()
            .expect("revealed set poisoned")
            .clone()
    }

    pub fn is_complete(&self) -> bool {
        self.revealed
            .indices
            .lock()
            .expect("revealed set poisoned")
            .len()
            == self.item_count
    }

    /// Wake when the revealed set may have grown since the caller last
    /// looked. Spurious wakeups are possible; re-check the set.
    pub async fn wait_changed(&self) {
        self.revealed.notify.notified().await;
    }
}

impl Drop for StaggeredReveal {
    fn drop(&mut self) {
        for timer in self.timers.lock().expect("timer list poisoned").drain(..) {
            timer.abort();
        }
    }
}
