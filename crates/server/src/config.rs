use std::path::PathBuf;

use vanguard::{BalanceConfig, HostSettings, LevelConfig, PacketLossSimulation, load_ron};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tick_rate: u32,
    pub host: HostSettings,
    pub packet_loss: Option<PacketLossSimulation>,
    pub auto_ready: bool,
}

impl ServerConfig {
    pub fn new(bind_addr: String, host_name: String) -> Self {
        Self {
            bind_addr,
            tick_rate: vanguard::DEFAULT_TICK_RATE,
            host: HostSettings::new(host_name),
            packet_loss: None,
            auto_ready: false,
        }
    }

    /// Replaces the built-in level and balance with RON files when given.
    pub fn load_overrides(
        &mut self,
        level: Option<&PathBuf>,
        balance: Option<&PathBuf>,
    ) -> anyhow::Result<()> {
        if let Some(path) = level {
            self.host.level = load_ron::<LevelConfig>(path)?;
        }
        if let Some(path) = balance {
            self.host.balance = load_ron::<BalanceConfig>(path)?;
        }
        Ok(())
    }
}
