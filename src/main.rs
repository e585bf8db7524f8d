// SPDX-License-Identifier: GPL-2.0-only

use anyhow::{Context, Result};
use smithay::{
    reexports::{calloop::EventLoop, wayland_server::Display},
    wayland::socket::ListeningSocketSource,
};
use tracing::{error, info};

use labwc_core::backend::NullBackend;
use labwc_core::config::Config;
use labwc_core::server::Server;
use labwc_core::{environment, startup, wayland};

fn main() {
    if let Err(err) = main_inner() {
        error!("error occurred in main(): {:#}", err);
        std::process::exit(1);
    }
}

struct Cli {
    startup_cmd: Option<String>,
}

fn parse_args() -> Cli {
    let mut startup_cmd = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-s" || arg == "--startup" {
            startup_cmd = args.next();
        }
    }
    Cli { startup_cmd }
}

fn main_inner() -> Result<()> {
    init_logger()?;
    info!("labwc-core starting up");

    let cli = parse_args();
    let config = Config::load();

    let mut event_loop = EventLoop::try_new().context("failed to initialize event loop")?;
    let (display, socket_name) = init_wayland_display(&mut event_loop)?;

    let mut server = Server::new(
        &display,
        socket_name.clone(),
        event_loop.handle(),
        event_loop.get_signal(),
        config,
        Box::new(NullBackend),
    )
    .context("failed to construct server state")?;

    environment::update_environment(&socket_name);
    startup::run_startup_program(cli.startup_cmd.as_deref());

    info!("starting event loop");
    event_loop.run(None, &mut server, |server| {
        if server.should_stop {
            info!("shutting down");
            server.loop_signal.stop();
            server.loop_signal.wakeup();
            return;
        }
        let _ = server.display_handle.flush_clients();
    })?;

    info!("event loop exited");
    Ok(())
}

fn init_logger() -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("labwc_core=info"));

    fmt().with_env_filter(filter).init();
    Ok(())
}

fn init_wayland_display(
    event_loop: &mut EventLoop<'static, Server>,
) -> Result<(Display<Server>, String)> {
    let display = Display::<Server>::new().context("failed to create wayland display")?;

    let listening_socket =
        ListeningSocketSource::new_auto().context("failed to create listening socket")?;
    let socket_name = listening_socket.socket_name().to_string_lossy().into_owned();
    info!(socket = %socket_name, "listening on wayland socket");

    event_loop
        .handle()
        .insert_source(listening_socket, |client_stream, _, server| {
            let _ = server.display_handle.insert_client(
                client_stream,
                std::sync::Arc::new(wayland::handlers::ClientState::new()),
            );
        })
        .context("failed to init wayland socket source")?;

    Ok((display, socket_name))
}
