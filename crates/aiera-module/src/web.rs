//! Browser constructors: embed a module frame from the host page, or attach a
//! frame to its parent.

use std::rc::Rc;

use aiera_bridge::web::{WindowPeer, WindowSource};
use aiera_config::ModuleConfig;
use wasm_bindgen::JsCast;
use web_sys::HtmlIFrameElement;

use crate::error::{ModuleError, ModuleResult};
use crate::module::AieraModule;

/// Host side: bridge the current window to the module running in `frame`.
///
/// # Errors
///
/// Returns [`ModuleError::Bridge`] when the frame has no content window yet.
pub fn embed_frame(config: ModuleConfig, frame: &HtmlIFrameElement) -> ModuleResult<AieraModule> {
    let peer = WindowPeer::frame(frame)
        .map_err(|source| ModuleError::bridge("module.embed_frame", source))?;
    AieraModule::load(config, Rc::new(peer), Rc::new(WindowSource::current()))
}

/// Host side: look up the iframe named by `config.frame_id` and embed it.
///
/// # Errors
///
/// Returns [`ModuleError::MissingConfig`] when no frame id is configured,
/// [`ModuleError::MissingElement`] when the id does not name an iframe, and
/// otherwise the errors of [`embed_frame`].
pub fn embed_frame_by_id(config: ModuleConfig) -> ModuleResult<AieraModule> {
    let id = config
        .frame_id
        .clone()
        .ok_or(ModuleError::MissingConfig { field: "frame_id" })?;
    let frame = gloo::utils::document()
        .get_element_by_id(&id)
        .and_then(|element| element.dyn_into::<HtmlIFrameElement>().ok())
        .ok_or(ModuleError::MissingElement { id })?;
    embed_frame(config, &frame)
}

/// Frame side: bridge the current window to its parent, the host page.
///
/// # Errors
///
/// Returns [`ModuleError::Bridge`] when the parent window is unavailable.
pub fn attach_to_parent(config: ModuleConfig) -> ModuleResult<AieraModule> {
    let peer =
        WindowPeer::parent().map_err(|source| ModuleError::bridge("module.attach_to_parent", source))?;
    AieraModule::load(config, Rc::new(peer), Rc::new(WindowSource::current()))
}
