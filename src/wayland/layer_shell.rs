// SPDX-License-Identifier: GPL-2.0-only

//! `wlr-layer-shell-unstable-v1` glue, grounded in the teacher's
//! `wayland/layer_shell.rs`: layer surfaces update each output's
//! [`OutputState::apply_exclusive_zones`](crate::output::OutputState)
//! instead of the teacher's per-workspace `needs_arrange` flag.

use smithay::{
    delegate_layer_shell,
    desktop::{layer_map_for_output, LayerSurface, WindowSurfaceType},
    output::Output,
    reexports::wayland_server::protocol::wl_output::WlOutput,
    wayland::shell::{
        wlr_layer::{Layer, LayerSurface as WlrLayerSurface, WlrLayerShellHandler, WlrLayerShellState},
        xdg::PopupSurface,
    },
};
use tracing::{debug, info};

use crate::server::Server;

impl WlrLayerShellHandler for Server {
    fn shell_state(&mut self) -> &mut WlrLayerShellState {
        &mut self.layer_shell_state
    }

    fn new_layer_surface(
        &mut self,
        surface: WlrLayerSurface,
        wl_output: Option<WlOutput>,
        layer: Layer,
        namespace: String,
    ) {
        info!(namespace, ?layer, "new layer surface");

        let output = wl_output
            .as_ref()
            .and_then(Output::from_resource)
            .or_else(|| self.outputs.first().map(|o| o.output.clone()));

        let Some(output) = output else {
            debug!("no output available for layer surface");
            return;
        };

        let layer_surface = LayerSurface::new(surface, namespace);
        let mut layer_map = layer_map_for_output(&output);
        if layer_map.map_layer(&layer_surface).is_err() {
            return;
        }
        let changed = layer_map.arrange();
        layer_surface.layer_surface().send_configure();
        drop(layer_map);

        if changed {
            self.recompute_exclusive_zones(&output);
        }
        self.backend.schedule_render(&output);
    }

    fn layer_destroyed(&mut self, surface: WlrLayerSurface) {
        let Some(output) = self
            .outputs
            .iter()
            .map(|o| o.output.clone())
            .find(|o| {
                layer_map_for_output(o)
                    .layer_for_surface(surface.wl_surface(), WindowSurfaceType::TOPLEVEL)
                    .is_some()
            })
        else {
            return;
        };

        {
            let mut map = layer_map_for_output(&output);
            if let Some(layer) = map
                .layer_for_surface(surface.wl_surface(), WindowSurfaceType::TOPLEVEL)
                .cloned()
            {
                map.unmap_layer(&layer);
            }
            map.arrange();
        }

        self.recompute_exclusive_zones(&output);
        self.backend.schedule_render(&output);
        self.needs_focus_refresh = true;
    }

    fn new_popup(&mut self, _parent: WlrLayerSurface, popup: PopupSurface) {
        let _ = popup.send_configure();
    }
}

impl Server {
    /// Re-derive an output's usable area from its layer map's non-exclusive
    /// zone (spec.md §3 "Output", `OutputState::apply_non_exclusive_zone`).
    fn recompute_exclusive_zones(&mut self, output: &Output) {
        let zone = layer_map_for_output(output).non_exclusive_zone();

        if let Some(state) = self
            .outputs
            .iter_mut()
            .find(|o| o.output.name() == output.name())
        {
            state.apply_non_exclusive_zone(zone);
        }
    }
}

delegate_layer_shell!(Server);
