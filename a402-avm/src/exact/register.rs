//! One-call registration of the AVM exact scheme into the protocol engine.

use std::sync::Arc;

use a402::client::X402Client;
use a402::facilitator::X402Facilitator;
use a402::server::X402ResourceServer;

use crate::constants::V1_NETWORKS;
use crate::exact::v1::{ExactAvmClientV1, ExactAvmFacilitatorV1};
use crate::exact::{ExactAvmClient, ExactAvmFacilitator, ExactAvmServer};
use crate::signer::{ClientAvmSigner, FacilitatorAvmSigner};

/// Registers the AVM exact client schemes.
///
/// V2 registers under the `algorand:*` wildcard unless specific networks are
/// given; V1 registers under every legacy network name.
pub fn register_exact_avm_client(
    client: &mut X402Client,
    signer: Arc<dyn ClientAvmSigner>,
    networks: Option<Vec<String>>,
    algod_url: Option<String>,
) {
    let make_v2 = |signer: &Arc<dyn ClientAvmSigner>| {
        let scheme = ExactAvmClient::new(Arc::clone(signer));
        match &algod_url {
            Some(url) => scheme.with_algod_url(url.clone()),
            None => scheme,
        }
    };
    let make_v1 = |signer: &Arc<dyn ClientAvmSigner>| {
        let scheme = ExactAvmClientV1::new(Arc::clone(signer));
        match &algod_url {
            Some(url) => scheme.with_algod_url(url.clone()),
            None => scheme,
        }
    };

    match networks {
        Some(networks) => {
            for pattern in networks {
                client.register(pattern, Box::new(make_v2(&signer)));
            }
        }
        None => {
            // The scheme's own CAIP family is the default pattern.
            client.register_family(Box::new(make_v2(&signer)));
        }
    }

    for network in V1_NETWORKS {
        client.register_v1(*network, Box::new(make_v1(&signer)));
    }
}

/// Registers the AVM exact server scheme.
///
/// V2 only; V1 has no server-side scheme involvement.
pub fn register_exact_avm_server(server: &mut X402ResourceServer, networks: Option<Vec<String>>) {
    match networks {
        Some(networks) => {
            for pattern in networks {
                server.register(pattern, Box::new(ExactAvmServer::new()));
            }
        }
        None => {
            server.register_family(Box::new(ExactAvmServer::new()));
        }
    }
}

/// Registers the AVM exact facilitator schemes.
///
/// V2 registers under the given networks; V1 registers under every legacy
/// network name.
pub fn register_exact_avm_facilitator(
    facilitator: &mut X402Facilitator,
    signer: Arc<dyn FacilitatorAvmSigner>,
    networks: Vec<String>,
) {
    facilitator.register(
        networks,
        Arc::new(ExactAvmFacilitator::new(Arc::clone(&signer))),
    );
    facilitator.register_v1(
        V1_NETWORKS.iter().map(|n| (*n).to_owned()).collect(),
        Arc::new(ExactAvmFacilitatorV1::new(signer)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ALGORAND_MAINNET_CAIP2, ALGORAND_TESTNET_CAIP2};
    use crate::signer::SignerError;
    use a402::scheme::BoxFuture;

    struct NoopSigner;

    impl ClientAvmSigner for NoopSigner {
        fn address(&self) -> String {
            crate::test_support::address(1).to_string()
        }

        fn sign_transactions(
            &self,
            unsigned_txns: &[Vec<u8>],
            _indexes_to_sign: &[usize],
        ) -> Result<Vec<Option<Vec<u8>>>, SignerError> {
            Ok(vec![None; unsigned_txns.len()])
        }
    }

    struct NoopFacilitatorSigner;

    impl FacilitatorAvmSigner for NoopFacilitatorSigner {
        fn addresses(&self) -> Vec<String> {
            vec![crate::test_support::address(9).to_string()]
        }

        fn sign_group(
            &self,
            group: &[Vec<u8>],
            _fee_payer: &str,
            _indexes_to_sign: &[usize],
        ) -> Result<Vec<Vec<u8>>, SignerError> {
            Ok(group.to_vec())
        }

        fn simulate_group<'a>(
            &'a self,
            _group: &'a [Vec<u8>],
            _network: &'a str,
        ) -> BoxFuture<'a, Result<(), SignerError>> {
            Box::pin(async { Ok(()) })
        }

        fn send_group<'a>(
            &'a self,
            _group: &'a [Vec<u8>],
            _network: &'a str,
        ) -> BoxFuture<'a, Result<String, SignerError>> {
            Box::pin(async { Ok(String::new()) })
        }

        fn wait_for_confirmation<'a>(
            &'a self,
            _txid: &'a str,
            _network: &'a str,
            _rounds: u64,
        ) -> BoxFuture<'a, Result<(), SignerError>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn client_registration_covers_v2_wildcard_and_v1_names() {
        let mut client = X402Client::new();
        register_exact_avm_client(&mut client, Arc::new(NoopSigner), None, None);

        let offer = a402_proto::PaymentRequirements {
            scheme: "exact".into(),
            network: ALGORAND_TESTNET_CAIP2.into(),
            amount: "1".into(),
            pay_to: "B".into(),
            max_timeout_seconds: 300,
            asset: "10458941".into(),
            extra: None,
        };
        assert!(client.select_requirements_v2(std::slice::from_ref(&offer)).is_ok());

        let v1_offer = a402_proto::PaymentRequirementsV1 {
            scheme: "exact".into(),
            network: "algorand-mainnet".into(),
            max_amount_required: "1".into(),
            resource: "/r".into(),
            description: None,
            mime_type: None,
            pay_to: "B".into(),
            max_timeout_seconds: 300,
            asset: "31566704".into(),
            output_schema: None,
            extra: None,
        };
        assert!(client.select_requirements_v1(std::slice::from_ref(&v1_offer)).is_ok());
    }

    #[test]
    fn facilitator_registration_advertises_both_versions() {
        let mut facilitator = X402Facilitator::new();
        register_exact_avm_facilitator(
            &mut facilitator,
            Arc::new(NoopFacilitatorSigner),
            vec![
                ALGORAND_MAINNET_CAIP2.to_owned(),
                ALGORAND_TESTNET_CAIP2.to_owned(),
            ],
        );

        let supported = facilitator.get_supported();
        let v2_networks: Vec<&str> = supported
            .kinds
            .iter()
            .filter(|k| k.x402_version == 2)
            .map(|k| k.network.as_str())
            .collect();
        assert_eq!(v2_networks.len(), 2);
        assert!(v2_networks.contains(&ALGORAND_MAINNET_CAIP2));

        let v1_networks: Vec<&str> = supported
            .kinds
            .iter()
            .filter(|k| k.x402_version == 1)
            .map(|k| k.network.as_str())
            .collect();
        assert!(v1_networks.contains(&"algorand-mainnet"));
        assert!(v1_networks.contains(&"algorand-testnet"));

        // Every kind advertises a fee payer from the managed set.
        for kind in &supported.kinds {
            let extra = kind.extra.as_ref().unwrap();
            assert_eq!(
                extra["feePayer"],
                crate::test_support::address(9).to_string().as_str()
            );
        }

        assert!(supported.signers.contains_key("algorand:*"));
    }
}
