/*
[INPUT]:  Cluster, RPC endpoint and explorer path
[OUTPUT]: Solana Explorer URLs
[POS]:    Presentation helper - links for addresses and transaction signatures
[UPDATE]: When the explorer host or cluster query parameters change
*/

use url::Url;

use crate::types::Cluster;

const EXPLORER_BASE_URL: &str = "https://explorer.solana.com";

/// Explorer URL for `path` (e.g. `/tx/{signature}`) on the given cluster
pub fn explorer_url(cluster: Cluster, endpoint: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let mut url = match Url::parse(EXPLORER_BASE_URL).and_then(|base| base.join(path)) {
        Ok(url) => url,
        Err(_) => return format!("{EXPLORER_BASE_URL}/{path}"),
    };

    match cluster {
        Cluster::Mainnet => {}
        Cluster::Devnet | Cluster::Testnet => {
            url.query_pairs_mut().append_pair("cluster", cluster.as_str());
        }
        Cluster::Localnet | Cluster::Custom => {
            url.query_pairs_mut()
                .append_pair("cluster", "custom")
                .append_pair("customUrl", endpoint);
        }
    }
    url.to_string()
}

pub fn transaction_url(cluster: Cluster, endpoint: &str, signature: &str) -> String {
    explorer_url(cluster, endpoint, &format!("tx/{signature}"))
}

pub fn address_url(cluster: Cluster, endpoint: &str, address: &str) -> String {
    explorer_url(cluster, endpoint, &format!("address/{address}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_query() {
        assert_eq!(
            transaction_url(Cluster::Devnet, "", "5sig"),
            "https://explorer.solana.com/tx/5sig?cluster=devnet"
        );
        assert_eq!(
            address_url(Cluster::Mainnet, "", "Abc"),
            "https://explorer.solana.com/address/Abc"
        );
    }

    #[test]
    fn test_custom_endpoint_is_encoded() {
        assert_eq!(
            explorer_url(Cluster::Localnet, "http://localhost:8899", "/tx/1"),
            "https://explorer.solana.com/tx/1?cluster=custom&customUrl=http%3A%2F%2Flocalhost%3A8899"
        );
    }
}
