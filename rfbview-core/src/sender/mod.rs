//! Ordered outbound message pipeline
//!
//! Input events and clipboard updates originate on the UI thread, but
//! writing to the network may block. [`MessageSender`] decouples the two: any
//! thread enqueues, and one dedicated worker thread hands the messages to the
//! protocol engine strictly in enqueue order.

mod message;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use crate::config::SenderConfig;
use crate::engine::ProtocolEngine;
use crate::error::{SessionError, SessionResult};
use crate::sync::lock_or_recover;

pub use message::{OutboundMessage, XK_ALT_L, XK_CONTROL_L, XK_DELETE};

const WORKER_THREAD_NAME: &str = "rfb-sender";

/// Work item for the sender thread
enum Job {
    /// Messages written back to back
    Deliver(Vec<OutboundMessage>),
    /// Exit the worker
    Stop,
}

/// FIFO queue with one worker writing to the protocol engine
///
/// The queue lock is held only for the channel insert, so callers never wait
/// on the network. The order in which callers acquire it is the order in
/// which the engine sees their messages.
pub struct MessageSender {
    /// Queue producer; `None` after cleanup
    queue: Mutex<Option<mpsc::Sender<Job>>>,
    /// Worker thread handle
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Checked by the worker before every write
    stopped: Arc<AtomicBool>,
    /// Number of `cleanup` calls, for diagnostics
    cleanup_calls: AtomicUsize,
    config: SenderConfig,
}

impl MessageSender {
    /// Starts the worker thread for `engine`
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ThreadSpawn` if the thread cannot be created.
    pub fn spawn<E: ProtocolEngine>(engine: Arc<E>, config: SenderConfig) -> SessionResult<Self> {
        let (queue_tx, queue_rx) = mpsc::channel::<Job>();
        let stopped = Arc::new(AtomicBool::new(false));

        let worker_stopped = Arc::clone(&stopped);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(&*engine, &queue_rx, &worker_stopped))
            .map_err(|e| SessionError::ThreadSpawn {
                name: WORKER_THREAD_NAME,
                reason: e.to_string(),
            })?;

        Ok(Self {
            queue: Mutex::new(Some(queue_tx)),
            worker: Mutex::new(Some(worker)),
            stopped,
            cleanup_calls: AtomicUsize::new(0),
            config,
        })
    }

    /// Enqueues a message.
    ///
    /// Keyboard and pointer input is dropped silently in view-only mode.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn send(&self, message: OutboundMessage) -> SessionResult<()> {
        if self.config.view_only && message.is_input() {
            trace!(kind = message.kind(), "View-only, input dropped");
            return Ok(());
        }
        self.enqueue(vec![message])
    }

    /// Enqueues several messages that no other producer may interleave with
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn send_batch(&self, messages: Vec<OutboundMessage>) -> SessionResult<()> {
        let messages: Vec<_> = messages
            .into_iter()
            .filter(|message| !(self.config.view_only && message.is_input()))
            .collect();
        if messages.is_empty() {
            return Ok(());
        }
        self.enqueue(messages)
    }

    fn enqueue(&self, messages: Vec<OutboundMessage>) -> SessionResult<()> {
        let queue = lock_or_recover(&self.queue);
        let tx = queue.as_ref().ok_or(SessionError::ChannelClosed)?;
        tx.send(Job::Deliver(messages))
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Sends a key event
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn send_key(&self, keysym: u32, down: bool) -> SessionResult<()> {
        self.send(OutboundMessage::KeyEvent { keysym, down })
    }

    /// Sends a pointer event
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn send_pointer(&self, x: u16, y: u16, buttons: u8) -> SessionResult<()> {
        self.send(OutboundMessage::PointerEvent { x, y, buttons })
    }

    /// Sends clipboard text to the server
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn send_clipboard_text(&self, text: impl Into<String>) -> SessionResult<()> {
        self.send(OutboundMessage::ClipboardText(text.into()))
    }

    /// Sends the Ctrl+Alt+Del key sequence as one uninterrupted batch
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn send_ctrl_alt_del(&self) -> SessionResult<()> {
        self.send_batch(OutboundMessage::ctrl_alt_del())
    }

    /// Requests a full framebuffer refresh
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after cleanup.
    pub fn request_refresh(&self) -> SessionResult<()> {
        self.send(OutboundMessage::RefreshScreen)
    }

    /// Stops the worker and closes the queue.
    ///
    /// A write already in progress completes; nothing queued after it is
    /// written. The worker drops its engine reference when it exits. Does
    /// not wait for the worker, so it is safe to call from any thread,
    /// including while the engine is blocked. Later calls are no-ops.
    pub fn cleanup(&self) {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = lock_or_recover(&self.queue).take() {
            let _ = tx.send(Job::Stop);
        }
        debug!("Message sender closed");
    }

    /// Waits for the worker thread to exit after [`MessageSender::cleanup`]
    pub fn join(&self) {
        let handle = lock_or_recover(&self.worker).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Message sender worker panicked");
            }
        }
    }

    /// Returns true after cleanup
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Number of times `cleanup` has been called
    #[must_use]
    pub fn cleanup_calls(&self) -> usize {
        self.cleanup_calls.load(Ordering::SeqCst)
    }

    /// Returns the sender configuration
    #[must_use]
    pub const fn config(&self) -> &SenderConfig {
        &self.config
    }
}

impl std::fmt::Debug for MessageSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSender")
            .field("closed", &self.is_closed())
            .field("view_only", &self.config.view_only)
            .finish()
    }
}

impl Drop for MessageSender {
    fn drop(&mut self) {
        // Stop the worker without counting a cleanup call.
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(tx) = lock_or_recover(&self.queue).take() {
            let _ = tx.send(Job::Stop);
        }
    }
}

fn run_worker<E: ProtocolEngine + ?Sized>(
    engine: &E,
    queue: &mpsc::Receiver<Job>,
    stopped: &AtomicBool,
) {
    debug!("Message sender started");
    'outer: for job in queue {
        let Job::Deliver(messages) = job else {
            break;
        };
        for message in messages {
            if stopped.load(Ordering::SeqCst) {
                break 'outer;
            }
            trace!(kind = message.kind(), "Sending message");
            if let Err(e) = engine.send(&message) {
                warn!(kind = message.kind(), error = %e, "Failed to send message");
            }
        }
    }
    debug!("Message sender stopped");
}
