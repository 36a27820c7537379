use std::net::{Ipv4Addr, SocketAddr};

use log::info;
use rtp_audio::{Consumer, RtpError, Transport, TransportConfig, UlawCodec};
use thiserror::Error;

use crate::consumers::ConsumerKind;
use crate::settings::Settings;

mod consumers;
mod settings;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Rtp(#[from] RtpError),
}

impl From<rtp_audio::ConfigError> for AppError {
    fn from(err: rtp_audio::ConfigError) -> Self {
        AppError::Rtp(err.into())
    }
}

pub fn run() -> Result<(), AppError> {
    info!("starting dial bridge media runtime");

    let settings = &settings::SETTINGS;
    let config = transport_config(settings)?;
    let (kind, remote, consumer) = session_consumer(settings)?;

    let mut transport = Transport::new(config, UlawCodec);
    if let Some(consumer) = consumer {
        transport.set_consumer(consumer)?;
    }
    let local = transport.bind()?;

    info!("RTP media on {local}, consumer={kind:?}, remote={remote:?}");
    transport.run()?;

    info!("RTP session ended");
    Ok(())
}

fn transport_config(settings: &Settings) -> Result<TransportConfig, AppError> {
    let listen_addr: Ipv4Addr = settings.rtp_listen_addr.parse().map_err(|err| {
        AppError::Config(format!("rtp_listen_addr {:?}: {err}", settings.rtp_listen_addr))
    })?;

    let ssrc = match settings.rtp_ssrc {
        0 => rand::random::<u32>(),
        ssrc => ssrc,
    };

    Ok(TransportConfig::new(listen_addr, settings.rtp_port).with_ssrc(ssrc))
}

// Everything here is checked before the socket is bound.
fn session_consumer(
    settings: &Settings,
) -> Result<(ConsumerKind, Option<SocketAddr>, Option<Consumer>), AppError> {
    let kind: ConsumerKind = settings.consumer.parse()?;
    let remote = remote_endpoint(settings)?;
    let consumer = consumers::build(kind, remote)?;
    Ok((kind, remote, consumer))
}

fn remote_endpoint(settings: &Settings) -> Result<Option<SocketAddr>, AppError> {
    if settings.remote_addr.is_empty() {
        return Ok(None);
    }
    let ip: Ipv4Addr = settings.remote_addr.parse().map_err(|err| {
        AppError::Config(format!("remote_addr {:?}: {err}", settings.remote_addr))
    })?;
    Ok(Some(SocketAddr::from((ip, settings.remote_port))))
}
