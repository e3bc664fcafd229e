//! Yew binding: keep a bus listener registered for a component's lifetime.

use std::cell::RefCell;
use std::rc::Rc;

use aiera_events::{Direction, Listener, Message, MessageBus, bind};
use tracing::warn;
use yew::prelude::*;

type BusCallback = Rc<dyn Fn(&Message)>;

/// Register `callback` for `event` in `direction` while the component is
/// mounted. The registration is replaced when the bus, event, or direction
/// changes; the latest `callback` is always the one invoked.
#[hook]
pub fn use_bus_listener<F>(bus: &MessageBus, event: &str, direction: Direction, callback: F)
where
    F: Fn(&Message) + 'static,
{
    let latest: Rc<RefCell<Option<BusCallback>>> = use_mut_ref(|| None);
    *latest.borrow_mut() = Some(Rc::new(callback));

    use_effect_with_deps(
        move |(bus, event, direction): &(MessageBus, String, Direction)| {
            let listener = Listener::new(move |message| {
                let current = latest.borrow().clone();
                if let Some(callback) = current {
                    callback(message);
                }
            });
            let subscription = match bind(bus, event, listener, *direction) {
                Ok(subscription) => Some(subscription),
                Err(err) => {
                    warn!(event = %event, error = %err, "bus listener not registered");
                    None
                }
            };
            move || drop(subscription)
        },
        (bus.clone(), event.to_string(), direction),
    );
}
