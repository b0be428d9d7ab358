//! Public mainchain service endpoints per network.

use shared_types::ChainId;

/// `(mainchain id, service URL)` for every known network.
pub const MAINCHAIN_SERVICES: &[(&str, &str)] = &[
    ("00000000", "https://service.lisk.com"),
    ("01000000", "https://testnet-service.lisk.com"),
    ("02000000", "https://betanet-service.lisk.com"),
    ("04000000", "https://devnet-service.liskdev.net"),
];

/// The public service of the mainchain on `chain_id`'s network.
pub fn mainchain_service_url(chain_id: &ChainId) -> Option<&'static str> {
    let mainchain = chain_id.mainchain().to_hex();
    MAINCHAIN_SERVICES
        .iter()
        .find(|(id, _)| *id == mainchain)
        .map(|(_, url)| *url)
}
