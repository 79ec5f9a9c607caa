pub mod extractor;
pub mod marketplace;

pub use extractor::extract_purchase_link;
pub use marketplace::MarketplaceProbe;
