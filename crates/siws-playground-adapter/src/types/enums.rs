/*
[INPUT]:  Environment values and wire strings
[OUTPUT]: Cluster and runtime environment enums with serde support
[POS]:    Data layer - closed sets of named values
[UPDATE]: When a Solana cluster or runtime mode is added
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const DEVNET_ENDPOINT: &str = "https://api.devnet.solana.com";
const TESTNET_ENDPOINT: &str = "https://api.testnet.solana.com";
const MAINNET_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";
const LOCALNET_ENDPOINT: &str = "http://localhost:8899";

/// Named Solana network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    Localnet,
    Mainnet,
    Custom,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
            Cluster::Mainnet => "mainnet",
            Cluster::Custom => "custom",
        }
    }

    /// Public RPC endpoint for the cluster, if it has a well-known one
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Cluster::Devnet => Some(DEVNET_ENDPOINT),
            Cluster::Testnet => Some(TESTNET_ENDPOINT),
            Cluster::Mainnet => Some(MAINNET_ENDPOINT),
            Cluster::Localnet => Some(LOCALNET_ENDPOINT),
            Cluster::Custom => None,
        }
    }

    /// Chain identifier embedded in sign-in messages
    pub fn chain_id(&self) -> String {
        format!("solana:{}", self.as_str())
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" => Ok(Cluster::Localnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            "custom" => Ok(Cluster::Custom),
            other => Err(format!("unknown cluster: {other}")),
        }
    }
}

impl TryFrom<String> for Cluster {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Runtime mode of the deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeEnv {
    #[default]
    Development,
    Production,
    Test,
}
