use crate::host::ToolbarHost;
use crate::layout::LayoutStorage;
use crate::session::{RestoreOutcome, Session};
use anyhow::anyhow;
use once_cell::sync::OnceCell;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Host notifications that touch the toolbar layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTrigger {
    /// The host finished starting up and every plugin has added its buttons.
    Ready,
    /// Toolbar icons were swapped; the host rebuilt the toolbar from scratch.
    IconsChanged,
    /// Checked/enabled state of commands may have changed.
    ButtonStates,
    Resized,
    ToggleWrap,
    ToggleCustomButtons,
    Save,
    /// Save and stop the worker.
    Shutdown,
}

enum Message {
    Trigger(LayoutTrigger),
    Barrier(Sender<()>),
}

type SharedSession<H, S> = Arc<Mutex<Session<H, S>>>;

/// Runs every layout operation on one worker thread, in the order the
/// triggers arrived.
pub struct LayoutService<H, S> {
    session: SharedSession<H, S>,
    tx: Sender<Message>,
    join: Option<JoinHandle<()>>,
}

impl<H, S> LayoutService<H, S>
where
    H: ToolbarHost + 'static,
    S: LayoutStorage + 'static,
{
    pub fn spawn(session: Session<H, S>) -> anyhow::Result<Self> {
        let session = Arc::new(Mutex::new(session));
        let (tx, rx) = mpsc::channel();
        let worker_session = Arc::clone(&session);
        let join = thread::Builder::new()
            .name("toolbar-layout".into())
            .spawn(move || worker_loop(worker_session, rx))?;
        Ok(Self {
            session,
            tx,
            join: Some(join),
        })
    }

    /// Queue `trigger` without waiting for it to run.
    pub fn notify(&self, trigger: LayoutTrigger) {
        if self.tx.send(Message::Trigger(trigger)).is_err() {
            tracing::warn!(?trigger, "layout worker has stopped");
        }
    }

    /// Block until everything queued so far has been handled.
    pub fn wait_idle(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.tx.send(Message::Barrier(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }

    /// Run `f` against the session while no trigger is being handled.
    pub fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session<H, S>) -> R,
    {
        match self.session.lock() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(err) => {
                tracing::error!(?err, "failed to lock toolbar session");
                None
            }
        }
    }

    /// A sender for code that cannot hold on to the service itself.
    pub fn trigger_sender(&self) -> TriggerSender {
        TriggerSender(self.tx.clone())
    }

    /// Save, stop the worker and hand the session back.
    pub fn shutdown(mut self) -> anyhow::Result<Session<H, S>> {
        self.stop();
        let session = Arc::clone(&self.session);
        drop(self);
        let mutex = Arc::try_unwrap(session)
            .map_err(|_| anyhow!("toolbar session still shared after shutdown"))?;
        mutex
            .into_inner()
            .map_err(|_| anyhow!("toolbar session lock poisoned"))
    }

    fn stop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.tx.send(Message::Trigger(LayoutTrigger::Shutdown));
            if join.join().is_err() {
                tracing::error!("layout worker panicked");
            }
        }
    }
}

impl<H, S> Drop for LayoutService<H, S> {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.tx.send(Message::Trigger(LayoutTrigger::Shutdown));
            let _ = join.join();
        }
    }
}

/// Cloneable handle that only queues triggers.
#[derive(Clone)]
pub struct TriggerSender(Sender<Message>);

impl TriggerSender {
    pub fn notify(&self, trigger: LayoutTrigger) -> bool {
        self.0.send(Message::Trigger(trigger)).is_ok()
    }
}

fn worker_loop<H: ToolbarHost, S: LayoutStorage>(
    session: SharedSession<H, S>,
    rx: Receiver<Message>,
) {
    while let Ok(message) = rx.recv() {
        let trigger = match message {
            Message::Trigger(trigger) => trigger,
            Message::Barrier(done) => {
                let _ = done.send(());
                continue;
            }
        };
        let mut guard = match session.lock() {
            Ok(guard) => guard,
            Err(err) => {
                tracing::error!(?err, "failed to lock toolbar session");
                return;
            }
        };
        tracing::debug!(?trigger, "handling layout trigger");
        handle(&mut guard, trigger);
        if trigger == LayoutTrigger::Shutdown {
            break;
        }
    }
}

fn handle<H: ToolbarHost, S: LayoutStorage>(session: &mut Session<H, S>, trigger: LayoutTrigger) {
    match trigger {
        LayoutTrigger::Ready => {
            session.capture();
            match session.restore(true) {
                RestoreOutcome::Restored => {}
                RestoreOutcome::Bootstrapped => tracing::info!("installed default toolbar layout"),
                RestoreOutcome::Recovered(err) => {
                    tracing::warn!(%err, "replaced unreadable toolbar layout with defaults")
                }
            }
            session.sync_button_states();
            session.apply_wrap();
        }
        LayoutTrigger::IconsChanged => {
            session.capture();
            session.restore(false);
        }
        LayoutTrigger::ButtonStates => session.sync_button_states(),
        LayoutTrigger::Resized => session.apply_wrap(),
        LayoutTrigger::ToggleWrap => {
            session.toggle_wrap();
        }
        LayoutTrigger::ToggleCustomButtons => {
            session.toggle_custom_buttons();
        }
        LayoutTrigger::Save | LayoutTrigger::Shutdown => {
            if let Err(err) = session.save() {
                tracing::warn!(%err, "failed to save toolbar layout");
            }
        }
    }
}

static GLOBAL_TRIGGERS: OnceCell<Mutex<Option<TriggerSender>>> = OnceCell::new();

/// Make `sender` the target of [`dispatch`], replacing any earlier one.
pub fn register(sender: Option<TriggerSender>) {
    let slot = GLOBAL_TRIGGERS.get_or_init(|| Mutex::new(None));
    match slot.lock() {
        Ok(mut guard) => *guard = sender,
        Err(err) => tracing::error!(?err, "failed to lock trigger registry"),
    }
}

/// Queue `trigger` on the registered service. Returns false when nothing is
/// registered or the worker has gone away.
pub fn dispatch(trigger: LayoutTrigger) -> bool {
    let Some(slot) = GLOBAL_TRIGGERS.get() else {
        return false;
    };
    match slot.lock() {
        Ok(guard) => guard.as_ref().is_some_and(|s| s.notify(trigger)),
        Err(err) => {
            tracing::error!(?err, "failed to lock trigger registry");
            false
        }
    }
}
