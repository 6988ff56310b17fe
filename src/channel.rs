//! Bounded command queue between execution contexts
//!
//! Producers outside the scheduler loop (keypad scanner, interrupt
//! handlers, a network task) push [`Command`](crate::console::Command)s
//! here; the director drains a bounded number per tick. Access is
//! serialized with `critical-section`, storage is a fixed
//! `heapless::Deque`.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::console::Command;

/// The queue was full; the value is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrySendError<T>(pub T);

/// Fixed-capacity multi-producer queue
pub struct Channel<T, const SIZE: usize> {
    queue: Mutex<RefCell<Deque<T, SIZE>>>,
}

impl<T, const SIZE: usize> Channel<T, SIZE> {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Producer handle. Any number may exist.
    pub const fn sender(&self) -> Sender<'_, T, SIZE> {
        Sender { channel: self }
    }

    /// Consumer handle for the scheduler
    pub const fn receiver(&self) -> Receiver<'_, T, SIZE> {
        Receiver { channel: self }
    }

    fn push(&self, value: T) -> Result<(), TrySendError<T>> {
        critical_section::with(|cs| {
            self.queue
                .borrow_ref_mut(cs)
                .push_back(value)
                .map_err(TrySendError)
        })
    }

    fn pop(&self) -> Option<T> {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.queue.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, const SIZE: usize> Default for Channel<T, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of a [`Channel`]
#[derive(Clone, Copy)]
pub struct Sender<'a, T, const SIZE: usize> {
    channel: &'a Channel<T, SIZE>,
}

impl<T, const SIZE: usize> Sender<'_, T, SIZE> {
    /// Queue `value`, or hand it back if the queue is full
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.channel.push(value)
    }
}

/// Consumer side of a [`Channel`]
#[derive(Clone, Copy)]
pub struct Receiver<'a, T, const SIZE: usize> {
    channel: &'a Channel<T, SIZE>,
}

impl<T, const SIZE: usize> Receiver<'_, T, SIZE> {
    /// Oldest queued value, if any
    pub fn try_receive(&self) -> Option<T> {
        self.channel.pop()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Queue of operator commands
pub type CommandChannel<const SIZE: usize> = Channel<Command, SIZE>;

/// Producer handle for [`CommandChannel`]
pub type CommandSender<'a, const SIZE: usize> = Sender<'a, Command, SIZE>;

/// Consumer handle for [`CommandChannel`]
pub type CommandReceiver<'a, const SIZE: usize> = Receiver<'a, Command, SIZE>;
