// LedgerGate Configuration Management
//
// Configuration for all gateway subsystems: HTTP binding, the MongoDB
// connection, the network descriptor, and the two page-limit policies
// the routes enforce (the legacy block-range page sizes and the cursor
// endpoints' count range).
//
// Loading follows a simple file-or-default scheme: `config.json` in the
// working directory is read if present; otherwise defaults are written
// there and used. Any value can therefore be inspected and edited in
// place between runs.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::network::NetworkKind;

/// Root configuration object for a gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// HTTP server binding and CORS settings
    pub api: ApiConfig,

    /// MongoDB connection and paged-query clamps
    pub db: DbConfig,

    /// Network the gateway fronts (drives address derivation)
    pub network: NetworkConfig,

    /// Valid-limit set for the legacy block-range endpoints
    pub page_size: PageSizeConfig,

    /// Accepted limit range and redirect preset for cursor endpoints
    pub count_range: CountRangeConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    /// IP address to bind ("0.0.0.0" to serve externally)
    pub bind_address: String,

    /// TCP port for the REST listener
    pub port: u16,

    /// Enable permissive CORS for browser clients
    pub cors_enabled: bool,
}

/// MongoDB connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbConfig {
    /// Connection string, e.g. "mongodb://localhost:27017"
    pub url: String,

    /// Database holding the chain-state collections
    pub name: String,

    /// Lower clamp applied by the paged-documents query
    pub page_size_min: u32,

    /// Upper clamp applied by the paged-documents query
    pub page_size_max: u32,
}

/// Network selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    /// One of "mijin", "mijinTest", "public", "publicTest"
    pub name: String,
}

impl NetworkConfig {
    pub fn kind(&self) -> Result<NetworkKind> {
        NetworkKind::from_name(&self.name)
            .with_context(|| format!("unrecognized network name '{}'", self.name))
    }
}

/// Valid-limit policy for the block-range endpoints.
///
/// A requested limit is valid when it lies in `[min, max]` and sits on
/// the `step` grid anchored at `min`. Invalid limits are redirected to
/// the nearest valid value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSizeConfig {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

/// Accepted limit range for the cursor endpoints.
///
/// Out-of-range limits redirect to the same path with `preset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountRangeConfig {
    pub min: u32,
    pub max: u32,
    pub preset: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            db: DbConfig::default(),
            network: NetworkConfig::default(),
            page_size: PageSizeConfig::default(),
            count_range: CountRangeConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            cors_enabled: true,
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            name: "catapult".to_string(),
            page_size_min: 10,
            page_size_max: 100,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "publicTest".to_string(),
        }
    }
}

impl Default for PageSizeConfig {
    fn default() -> Self {
        Self {
            min: 30,
            max: 80,
            step: 25,
        }
    }
}

impl Default for CountRangeConfig {
    fn default() -> Self {
        Self {
            min: 10,
            max: 100,
            preset: 25,
        }
    }
}

impl GatewayConfig {
    const FILE: &'static str = "config.json";

    /// Load configuration from `config.json`, falling back to (and
    /// persisting) defaults when the file does not exist.
    pub async fn load() -> Result<Self> {
        let config = match tokio::fs::read_to_string(Self::FILE).await {
            Ok(content) => serde_json::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse {}", Self::FILE))?,
            Err(_) => {
                let default_config = Self::default();
                default_config.save().await?;
                default_config
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Persist the configuration as pretty-printed JSON.
    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(Self::FILE, content)
            .await
            .with_context(|| format!("failed to write {}", Self::FILE))
    }

    /// Reject configurations the routes cannot enforce coherently.
    pub fn validate(&self) -> Result<()> {
        self.network.kind()?;

        if self.page_size.min > self.page_size.max {
            bail!("pageSize.min must not exceed pageSize.max");
        }
        if self.page_size.step == 0 {
            bail!("pageSize.step must be positive");
        }
        if self.count_range.min > self.count_range.max {
            bail!("countRange.min must not exceed countRange.max");
        }
        if self.count_range.preset < self.count_range.min
            || self.count_range.preset > self.count_range.max
        {
            bail!("countRange.preset must lie within [countRange.min, countRange.max]");
        }
        if self.db.page_size_min > self.db.page_size_max {
            bail!("db.pageSizeMin must not exceed db.pageSizeMax");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        GatewayConfig::default().validate().unwrap();
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = GatewayConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GatewayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api.port, config.api.port);
        assert_eq!(parsed.db.name, config.db.name);
        assert_eq!(parsed.count_range.preset, config.count_range.preset);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let parsed: GatewayConfig =
            serde_json::from_str(r#"{"network": {"name": "public"}, "api": {"port": 3001}}"#)
                .unwrap();
        assert_eq!(parsed.network.name, "public");
        assert_eq!(parsed.api.port, 3001);
        assert_eq!(parsed.page_size.min, 30);
    }

    #[test]
    fn unknown_network_is_rejected() {
        let mut config = GatewayConfig::default();
        config.network.name = "devnet".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_count_range_is_rejected() {
        let mut config = GatewayConfig::default();
        config.count_range.min = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn preset_outside_range_is_rejected() {
        let mut config = GatewayConfig::default();
        config.count_range.preset = 5;
        assert!(config.validate().is_err());
    }
}
