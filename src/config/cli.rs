use crate::config::toml_config::ProxyConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "fdo-ledger-proxy")]
#[command(about = "Reverse proxy that enriches FDO onboarding with ledger passports")]
pub struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "fdo-proxy.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override server.listen
    #[arg(long)]
    pub listen: Option<String>,

    /// Override server.backend
    #[arg(long)]
    pub backend: Option<String>,

    /// Override to2.owner_id
    #[arg(long)]
    pub owner_id: Option<String>,

    /// Disable product passport lookup during DI regardless of config
    #[arg(long)]
    pub no_product_passport: bool,
}

impl Args {
    pub fn apply_overrides(&self, config: &mut ProxyConfig) {
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
            tracing::info!("🔧 server.listen overridden to: {}", listen);
        }
        if let Some(backend) = &self.backend {
            config.server.backend = backend.clone();
            tracing::info!("🔧 server.backend overridden to: {}", backend);
        }
        if let Some(owner_id) = &self.owner_id {
            config.to2.owner_id = owner_id.clone();
            tracing::info!("🔧 to2.owner_id overridden to: {}", owner_id);
        }
        if self.no_product_passport {
            config.di.enable_product_passport = false;
            tracing::info!("🔧 product passport lookup disabled from command line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = ProxyConfig::from_toml_str(
            r#"
[server]
backend = "http://127.0.0.1:8081"

[di]
enable_product_passport = true

[to2]
owner_id = "from-file"
"#,
        )
        .unwrap();

        let args = Args::parse_from([
            "fdo-ledger-proxy",
            "--backend",
            "http://10.0.0.5:8081",
            "--owner-id",
            "from-cli",
            "--no-product-passport",
        ]);
        args.apply_overrides(&mut config);

        assert_eq!(config.server.backend, "http://10.0.0.5:8081");
        assert_eq!(config.to2.owner_id, "from-cli");
        assert!(!config.di.enable_product_passport);
        assert_eq!(args.config, "fdo-proxy.toml");
    }
}
