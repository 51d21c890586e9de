pub mod chain;
pub mod conversion;
pub mod erc20;
pub mod pricing;
