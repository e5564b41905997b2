pub mod jd_client;
pub mod traits;

pub use jd_client::JdPriceClient;
pub use traits::PriceProvider;
