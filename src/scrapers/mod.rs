pub mod fixture;
pub mod realtor;
pub mod traits;
pub mod types;

pub use fixture::FixtureScraper;
pub use realtor::RealtorScraper;
pub use traits::ScraperTrait;
pub use types::SearchParams;
