use clap::Parser;
use color_eyre::Result;
use serial_switch::{
    cli,
    config::Config,
    gateway::CommandGateway,
    intake::EventIntake,
    logging,
    mock::MockBackend,
    session::SessionHandle,
};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    if let Some(command) = cli.command {
        cli::handle_command(command);

        return Ok(());
    }

    logging::init();

    let config = if let Some(config_path) = cli.config {
        debug!(?config_path, "Config from path");
        Config::new_from_path(config_path)?
    } else {
        debug!("Default config");
        Config::example()
    };
    config.validate()?;

    let (backend, _wire) = MockBackend::spawn(&config);
    let session = SessionHandle::spawn();
    let gateway = CommandGateway::new(backend.clone(), session.updater());
    let intake = EventIntake::new(backend, session.updater());

    let mut notifications = intake.notifications();
    let listeners = intake.start();

    let ports = gateway.list_ports().await?;
    for port in &ports {
        info!("{port}");
    }

    let notification_loop = async move {
        while let Ok(notification) = notifications.recv().await {
            info!("{notification}");
        }
    };

    #[cfg(unix)]
    {
        let mut hangup = signal(SignalKind::hangup())?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C, quitting")
            }
            _ = hangup.recv() => {
                info!("Told to hang up, quitting")
            }
            _ = notification_loop => {}
        }
    }

    #[cfg(not(unix))]
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C, quitting")
        }
        _ = notification_loop => {}
    }

    listeners.revoke_all();

    Ok(())
}
