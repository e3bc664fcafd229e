//! Message envelopes, directions, and listener handles.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ListenerError;
use crate::payloads::RegistryEvent;

/// Side of the window boundary a message originated from, relative to the bus holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Arriving from the host page or another frame.
    In,
    /// Leaving this context toward the host page or another frame.
    Out,
}

impl Direction {
    /// Both directions, inbound first.
    pub const ALL: [Self; 2] = [Self::In, Self::Out];

    /// Wire-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }

    /// Direction the same message carries on the other side of the boundary.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Message delivered to listeners. Built at emit time and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Event name the message was emitted under.
    pub event: String,
    /// Direction supplied to `emit`.
    pub direction: Direction,
    /// JSON payload.
    pub data: Value,
}

impl Message {
    /// Decode the payload into a registered event type.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Decode`] when the payload does not match `E`.
    pub fn decode<E: RegistryEvent>(&self) -> Result<E, ListenerError> {
        E::deserialize(&self.data).map_err(|source| ListenerError::Decode {
            event: self.event.clone(),
            source,
        })
    }
}

/// Message whose payload has been decoded into a registered event type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedMessage<E> {
    /// Direction supplied to `emit`.
    pub direction: Direction,
    /// Decoded payload.
    pub data: E,
}

type Callback = dyn Fn(&Message) -> Result<(), ListenerError>;

/// Shared listener callback.
///
/// Identity is the shared handle, not the closure body: clones of one
/// `Listener` compare equal, two listeners built from identical closures do not.
#[derive(Clone)]
pub struct Listener {
    callback: Rc<Callback>,
}

impl Listener {
    /// Wrap an infallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Message) + 'static,
    {
        Self::fallible(move |message| {
            callback(message);
            Ok(())
        })
    }

    /// Wrap a callback that may fail. A failure stops delivery and surfaces
    /// from the `emit` call that triggered it.
    pub fn fallible<F>(callback: F) -> Self
    where
        F: Fn(&Message) -> Result<(), ListenerError> + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Wrap a callback that receives a decoded payload. Payloads that fail to
    /// decode surface as [`ListenerError::Decode`].
    pub fn typed<E, F>(callback: F) -> Self
    where
        E: RegistryEvent,
        F: Fn(TypedMessage<E>) + 'static,
    {
        Self::fallible(move |message| {
            let data = message.decode::<E>()?;
            callback(TypedMessage {
                direction: message.direction,
                data,
            });
            Ok(())
        })
    }

    /// Returns `true` when both handles share the same callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }

    pub(crate) fn call(&self, message: &Message) -> Result<(), ListenerError> {
        (self.callback)(message)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Listener")
            .field("handles", &Rc::strong_count(&self.callback))
            .finish()
    }
}
