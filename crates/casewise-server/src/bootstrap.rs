use anyhow::Context;
use casewise_config::CasewiseConfig;
use figment::providers::Serialized;

use crate::cli::ServeArgs;

/// Load `.env`, layered configuration, and CLI overrides, then validate.
pub fn load_config(args: &ServeArgs) -> anyhow::Result<CasewiseConfig> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let config = config_figment(args)
        .extract::<CasewiseConfig>()
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn config_figment(args: &ServeArgs) -> figment::Figment {
    let mut figment = CasewiseConfig::figment();
    if let Some(host) = &args.host {
        figment = figment.merge(Serialized::default("server.host", host));
    }
    if let Some(port) = args.port {
        figment = figment.merge(Serialized::default("server.port", port));
    }
    if let Some(path) = &args.database {
        figment = figment.merge(Serialized::default("database.path", path));
    }
    figment
}
