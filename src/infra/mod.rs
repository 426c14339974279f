// Concrete adapters behind the application ports

pub mod http_client;
pub mod ned_client;
pub mod sky_match;
pub mod table_store;
pub mod tsv;
pub mod vizier_client;

pub use http_client::ReqwestHttp;
pub use ned_client::NedClient;
pub use sky_match::SkyMatcher;
pub use table_store::JsonTableStore;
pub use vizier_client::VizierClient;
