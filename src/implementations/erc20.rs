use std::{str::FromStr, sync::Arc};

use ethers::{
    abi::Token,
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use ethers_contract::{Multicall, MulticallVersion, abigen};
use once_cell::sync::Lazy;

use crate::error::{AppError, AppResult};

/// Multicall3 is deployed at the same address on every supported chain.
pub static MULTICALL3_ADDRESS: Lazy<Address> =
    Lazy::new(|| Address::from_str("0xcA11bde05977b3631167028862bE2a173976CA11").unwrap());

pub const DEFAULT_DECIMALS: u8 = 18;

const CALLS_PER_TOKEN: usize = 3;

abigen!(
    Erc20Token,
    r#"[
        function name() view returns (string)
        function symbol() view returns (string)
        function decimals() view returns (uint8)
    ]"#
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Metadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Read `name`, `symbol` and `decimals` for every address in a single Multicall3 round trip.
///
/// The output is aligned with `addresses`. An entry is `None` when the name or symbol read failed
/// (or the address is not a valid hex address); a failed decimals read falls back to 18.
pub async fn batch_read_metadata<M>(
    provider: Arc<M>,
    multicall: Address,
    addresses: &[String],
) -> AppResult<Vec<Option<Erc20Metadata>>>
where
    M: Middleware + 'static,
{
    let parsed: Vec<Option<Address>> = addresses
        .iter()
        .map(|raw| Address::from_str(raw.trim()).ok())
        .collect();

    let valid = parsed.iter().flatten().count();
    if valid == 0 {
        return Ok(vec![None; addresses.len()]);
    }

    let mut batch = Multicall::new_with_chain_id(provider.clone(), Some(multicall), None::<u64>)
        .map_err(|err| AppError::ChainRead(format!("failed to set up multicall: {err}")))?
        .version(MulticallVersion::Multicall3);

    for address in parsed.iter().flatten() {
        let contract = Erc20Token::new(*address, provider.clone());
        batch
            .add_call(contract.name(), true)
            .add_call(contract.symbol(), true)
            .add_call(contract.decimals(), true);
    }

    let results = batch
        .call_raw()
        .await
        .map_err(|err| AppError::ChainRead(format!("multicall request failed: {err}")))?;

    let expected = valid * CALLS_PER_TOKEN;
    if results.len() != expected {
        return Err(AppError::ChainRead(format!(
            "multicall returned {} results for {expected} calls",
            results.len()
        )));
    }

    let mut chunks = results.chunks(CALLS_PER_TOKEN);
    let metadata = parsed
        .iter()
        .map(|address| {
            address.as_ref()?;
            let chunk = chunks.next()?;
            let name = decode_string(&chunk[0])?;
            let symbol = decode_string(&chunk[1])?;
            let decimals = decode_u8(&chunk[2]).unwrap_or(DEFAULT_DECIMALS);
            Some(Erc20Metadata {
                name,
                symbol,
                decimals,
            })
        })
        .collect();

    Ok(metadata)
}

fn decode_string(result: &Result<Token, Bytes>) -> Option<String> {
    match result {
        Ok(Token::String(value)) => Some(value.clone()),
        _ => None,
    }
}

fn decode_u8(result: &Result<Token, Bytes>) -> Option<u8> {
    match result {
        Ok(Token::Uint(value)) if *value <= U256::from(u8::MAX) => Some(value.as_u32() as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        abi,
        providers::{MockProvider, Provider},
    };

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const BROKEN: &str = "0x00000000000000000000000000000000000000bb";

    fn ok_string(value: &str) -> Token {
        Token::Tuple(vec![
            Token::Bool(true),
            Token::Bytes(abi::encode(&[Token::String(value.to_string())])),
        ])
    }

    fn ok_uint(value: u64) -> Token {
        Token::Tuple(vec![
            Token::Bool(true),
            Token::Bytes(abi::encode(&[Token::Uint(U256::from(value))])),
        ])
    }

    fn failed() -> Token {
        Token::Tuple(vec![Token::Bool(false), Token::Bytes(vec![])])
    }

    fn mock_with(results: Vec<Token>) -> Arc<Provider<MockProvider>> {
        let mock = MockProvider::new();
        let encoded = abi::encode(&[Token::Array(results)]);
        mock.push::<String, _>(format!("0x{}", hex::encode(encoded)))
            .unwrap();
        Arc::new(Provider::new(mock))
    }

    #[tokio::test]
    async fn keeps_successful_reads_and_drops_failed_names() {
        let provider = mock_with(vec![
            ok_string("USD Coin"),
            ok_string("USDC"),
            ok_uint(6),
            failed(),
            ok_string("BRK"),
            ok_uint(9),
        ]);

        let addresses = vec![USDC.to_string(), BROKEN.to_string()];
        let out = batch_read_metadata(provider, *MULTICALL3_ADDRESS, &addresses)
            .await
            .unwrap();

        assert_eq!(
            out,
            vec![
                Some(Erc20Metadata {
                    name: "USD Coin".into(),
                    symbol: "USDC".into(),
                    decimals: 6,
                }),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn failed_decimals_default_to_eighteen() {
        let provider = mock_with(vec![ok_string("Token"), ok_string("TKN"), failed()]);

        let out = batch_read_metadata(provider, *MULTICALL3_ADDRESS, &[USDC.to_string()])
            .await
            .unwrap();

        assert_eq!(out[0].as_ref().unwrap().decimals, DEFAULT_DECIMALS);
    }

    #[tokio::test]
    async fn invalid_addresses_are_skipped_in_place() {
        let provider = mock_with(vec![ok_string("Token"), ok_string("TKN"), ok_uint(8)]);

        let addresses = vec!["not-an-address".to_string(), USDC.to_string()];
        let out = batch_read_metadata(provider, *MULTICALL3_ADDRESS, &addresses)
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert!(out[0].is_none());
        assert_eq!(out[1].as_ref().unwrap().symbol, "TKN");
    }

    #[tokio::test]
    async fn no_valid_addresses_means_no_round_trip() {
        // An empty mock would fail any request, so success proves nothing was sent.
        let provider = Arc::new(Provider::new(MockProvider::new()));
        let out = batch_read_metadata(provider, *MULTICALL3_ADDRESS, &["zzz".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec![None]);
    }

    #[tokio::test]
    async fn short_multicall_result_is_an_error() {
        let provider = mock_with(vec![ok_string("Token")]);
        let err = batch_read_metadata(provider, *MULTICALL3_ADDRESS, &[USDC.to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ChainRead(_)));
    }

    #[test]
    fn oversized_decimals_do_not_decode() {
        assert_eq!(decode_u8(&Ok(Token::Uint(U256::from(300u64)))), None);
        assert_eq!(decode_u8(&Ok(Token::Uint(U256::from(6u64)))), Some(6));
        assert_eq!(decode_u8(&Err(Bytes::new())), None);
    }

    #[tokio::test]
    async fn empty_return_data_counts_as_failed_read() {
        // A call to an address without code succeeds with no data.
        let empty = Token::Tuple(vec![Token::Bool(true), Token::Bytes(vec![])]);
        let provider = mock_with(vec![empty.clone(), empty.clone(), empty]);

        let out = batch_read_metadata(provider, *MULTICALL3_ADDRESS, &[BROKEN.to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec![None]);
    }
}
