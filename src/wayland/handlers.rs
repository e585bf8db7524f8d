// SPDX-License-Identifier: GPL-2.0-only

use smithay::{
    reexports::wayland_server::backend::ClientData,
    wayland::compositor::CompositorClientState,
};

/// Per-client protocol bookkeeping smithay's compositor implementation
/// needs attached to each connection.
pub struct ClientState {
    pub compositor_state: CompositorClientState,
}

impl ClientData for ClientState {
    fn initialized(&self, _client_id: smithay::reexports::wayland_server::backend::ClientId) {}
    fn disconnected(&self, _client_id: smithay::reexports::wayland_server::backend::ClientId, _reason: smithay::reexports::wayland_server::backend::DisconnectReason) {}
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            compositor_state: CompositorClientState::default(),
        }
    }
}