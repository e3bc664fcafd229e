use std::cell::RefCell;
use std::rc::Rc;

use aiera_config::{ModuleConfig, Origin};
use aiera_events::{
    Direction, EventValidation, InstrumentSelected, Listener, Message, ModuleReady,
};
use aiera_module::AieraModule;
use aiera_test_support::fixtures::{
    HOST_ORIGIN, MODULE_ORIGIN, ROGUE_ORIGIN, envelope, foreign_envelope, instrument,
};
use aiera_test_support::mocks::{MemoryWindow, pump_until_idle};
use serde_json::json;

struct Embedding {
    host_window: MemoryWindow,
    module_window: MemoryWindow,
    host: AieraModule,
    module: AieraModule,
}

fn config_for(peer_origin: &str) -> anyhow::Result<ModuleConfig> {
    Ok(ModuleConfig::default()
        .with_validation(EventValidation::Strict)
        .with_target_origin(Origin::parse(peer_origin)?))
}

fn embed() -> anyhow::Result<Embedding> {
    let (host_window, module_window) = MemoryWindow::pair(HOST_ORIGIN, MODULE_ORIGIN);
    let host = AieraModule::load(
        config_for(MODULE_ORIGIN)?,
        host_window.peer(),
        host_window.source(),
    )?;
    let module = AieraModule::load(
        config_for(HOST_ORIGIN)?,
        module_window.peer(),
        module_window.source(),
    )?;
    Ok(Embedding {
        host_window,
        module_window,
        host,
        module,
    })
}

fn recorder() -> (Rc<RefCell<Vec<Message>>>, Listener) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let listener = Listener::new(move |message| sink.borrow_mut().push(message.clone()));
    (seen, listener)
}

#[test]
fn out_on_host_arrives_as_in_on_module_with_identical_data() -> anyhow::Result<()> {
    let embedding = embed()?;
    let (seen, listener) = recorder();
    embedding.module.on("configure", &listener, Direction::In)?;

    let data = json!({"hideSettings": true, "options": {"theme": "dark", "layers": [1, 2]}});
    embedding
        .host
        .emit("configure", data.clone(), Direction::Out)?;
    assert!(seen.borrow().is_empty());

    assert_eq!(embedding.module_window.pump(), 1);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event, "configure");
    assert_eq!(seen[0].direction, Direction::In);
    assert_eq!(seen[0].data, data);
    Ok(())
}

#[test]
fn bridged_messages_do_not_echo_back() -> anyhow::Result<()> {
    let embedding = embed()?;
    let (host_in, host_listener) = recorder();
    let (module_in, module_listener) = recorder();
    embedding
        .host
        .on("authenticate", &host_listener, Direction::In)?;
    embedding
        .module
        .on("authenticate", &module_listener, Direction::In)?;

    embedding.host.authenticate("token", None)?;
    let delivered = pump_until_idle(&embedding.host_window, &embedding.module_window);

    assert_eq!(delivered, 1);
    assert_eq!(module_in.borrow().len(), 1);
    assert!(host_in.borrow().is_empty());
    Ok(())
}

#[test]
fn instrument_selection_reaches_module_listener() -> anyhow::Result<()> {
    let embedding = embed()?;
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    embedding
        .module
        .on_event::<InstrumentSelected, _>(Direction::In, move |message| {
            sink.borrow_mut().push(message.data);
        })?;

    embedding.host.select_instrument(instrument())?;
    assert_eq!(embedding.module_window.pump(), 1);

    assert_eq!(*received.borrow(), vec![InstrumentSelected(instrument())]);
    Ok(())
}

#[test]
fn module_replies_reach_host() -> anyhow::Result<()> {
    let embedding = embed()?;
    let ready = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&ready);
    embedding
        .host
        .on_event::<ModuleReady, _>(Direction::In, move |_| *sink.borrow_mut() += 1)?;

    embedding.module.announce_ready()?;
    assert_eq!(embedding.host_window.pump(), 1);
    assert_eq!(*ready.borrow(), 1);
    Ok(())
}

#[test]
fn foreign_namespace_and_untrusted_origin_are_ignored() -> anyhow::Result<()> {
    let embedding = embed()?;
    let (seen, listener) = recorder();
    embedding.module.on("pause-audio", &listener, Direction::In)?;

    embedding
        .module_window
        .inject(HOST_ORIGIN, foreign_envelope("pause-audio", json!({})));
    embedding
        .module_window
        .inject(ROGUE_ORIGIN, envelope("pause-audio", json!({})));
    embedding
        .module_window
        .inject(HOST_ORIGIN, json!("not an envelope"));
    assert_eq!(embedding.module_window.pump(), 3);
    assert!(seen.borrow().is_empty());

    embedding
        .module_window
        .inject(HOST_ORIGIN, envelope("pause-audio", json!({})));
    assert_eq!(embedding.module_window.pump(), 1);
    assert_eq!(seen.borrow().len(), 1);
    Ok(())
}

#[test]
fn posts_to_the_wrong_origin_never_arrive() -> anyhow::Result<()> {
    let (host_window, module_window) = MemoryWindow::pair(HOST_ORIGIN, MODULE_ORIGIN);
    let host = AieraModule::load(
        config_for(ROGUE_ORIGIN)?,
        host_window.peer(),
        host_window.source(),
    )?;
    host.announce_ready()?;

    assert_eq!(module_window.pending(), 0);
    assert_eq!(module_window.discarded(), 1);
    Ok(())
}

#[test]
fn removing_one_of_two_listeners_leaves_the_other() -> anyhow::Result<()> {
    let embedding = embed()?;
    let (first_seen, first) = recorder();
    let (second_seen, second) = recorder();
    embedding.module.on("seek-audio-seconds", &first, Direction::In)?;
    embedding.module.on("seek-audio-seconds", &second, Direction::In)?;
    assert!(embedding.module.off("seek-audio-seconds", &first, Direction::In));

    embedding
        .host
        .emit("seek-audio-seconds", json!({"seconds": 42.5}), Direction::Out)?;
    assert_eq!(embedding.module_window.pump(), 1);

    assert!(first_seen.borrow().is_empty());
    assert_eq!(second_seen.borrow().len(), 1);
    Ok(())
}

#[test]
fn cleanup_stops_both_directions() -> anyhow::Result<()> {
    let embedding = embed()?;
    let (seen, listener) = recorder();
    embedding.module.on("play-audio", &listener, Direction::In)?;

    assert!(embedding.host.cleanup_window_messaging());
    embedding
        .host
        .emit("play-audio", json!({"eventId": "123"}), Direction::Out)?;
    assert_eq!(embedding.module_window.pending(), 0);

    assert!(embedding.module.cleanup_window_messaging());
    embedding
        .module_window
        .inject(HOST_ORIGIN, envelope("play-audio", json!({"eventId": "123"})));
    assert_eq!(embedding.module_window.pump(), 1);
    assert!(seen.borrow().is_empty());
    assert_eq!(embedding.module_window.listener_count(), 0);
    Ok(())
}

#[test]
fn removing_all_listeners_keeps_the_bridge_forwarding() -> anyhow::Result<()> {
    let embedding = embed()?;
    let (host_seen, host_listener) = recorder();
    let (module_seen, module_listener) = recorder();
    embedding.host.on("play-audio", &host_listener, Direction::Out)?;
    embedding.module.on("pause-audio", &module_listener, Direction::In)?;

    embedding.host.remove_all_listeners();
    embedding
        .host
        .emit("play-audio", json!({"eventId": "123"}), Direction::Out)?;
    assert!(host_seen.borrow().is_empty());
    assert_eq!(embedding.module_window.pending(), 1);

    embedding.module.remove_all_listeners();
    let (after_seen, after_listener) = recorder();
    embedding.module.on("pause-audio", &after_listener, Direction::In)?;
    embedding.host.emit("pause-audio", json!({}), Direction::Out)?;
    assert_eq!(embedding.module_window.pump(), 2);
    assert!(module_seen.borrow().is_empty());
    assert_eq!(after_seen.borrow().len(), 1);

    embedding.module.announce_ready()?;
    assert_eq!(embedding.host_window.pump(), 1);
    Ok(())
}

#[test]
fn unloading_the_module_detaches_it_from_its_window()-> anyhow::Result<()> {
    let embedding = embed()?;
    assert_eq!(embedding.module_window.listener_count(), 1);
    let Embedding {
        host_window,
        module_window,
        host,
        module,
    } = embedding;

    module.unload();
    assert_eq!(module_window.listener_count(), 0);

    host.announce_ready()?;
    assert_eq!(module_window.pump(), 1);
    assert_eq!(host_window.pending(), 0);
    Ok(())
}
