//! `jig-agent` -- device-side test agent for the manufacturing JIG.
//!
//! Initialises every registered device group, announces readiness on the
//! serial line and then answers JIG requests until the line closes.
//! Responses go to the serial device (or stdout); logs go to stderr.
//!
//! See [`jig_agent::settings::AgentSettings`] for the environment
//! variables.

use jig_agent::dispatcher::Dispatcher;
use jig_agent::ethernet::EthernetModule;
use jig_agent::hardware::EthernetHardware;
use jig_agent::serial;
use jig_agent::settings::AgentSettings;
use jig_core::config::EthernetConfig;
use jig_core::protocol::Response;
use jig_core::retry::RetryPolicy;
use tokio::io::BufReader;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jig_agent=info,jig_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = AgentSettings::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid agent settings");
        std::process::exit(1);
    });

    tracing::info!(
        iface = %settings.net_iface,
        model = %settings.board_model,
        serial = ?settings.serial_device,
        "Starting jig-agent",
    );

    let config_path = settings.ethernet_config_path();
    let config = EthernetConfig::load_or_init(&config_path).unwrap_or_else(|e| {
        tracing::warn!(path = %config_path.display(), error = %e, "Using default Ethernet config");
        EthernetConfig::default()
    });

    let hardware = EthernetHardware::system(&settings).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Cannot set up Ethernet hardware");
        std::process::exit(1);
    });

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Box::new(EthernetModule::new(
        hardware,
        config,
        RetryPolicy::default(),
        settings.board_model.clone(),
    )));
    dispatcher.init_all().await;

    let result = match &settings.serial_device {
        Some(path) => {
            let port = tokio::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(path = %path.display(), error = %e, "Cannot open serial device");
                    std::process::exit(1);
                });
            let (reader, mut writer) = tokio::io::split(port);
            match serial::send(&mut writer, &Response::ready()).await {
                Ok(()) => serial::serve(&dispatcher, BufReader::new(reader), writer).await,
                Err(e) => Err(e),
            }
        }
        None => {
            let mut stdout = tokio::io::stdout();
            match serial::send(&mut stdout, &Response::ready()).await {
                Ok(()) => {
                    serial::serve(&dispatcher, BufReader::new(tokio::io::stdin()), stdout).await
                }
                Err(e) => Err(e),
            }
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Serial loop failed");
        std::process::exit(1);
    }
}
