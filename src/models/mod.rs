pub mod catalog;

pub use catalog::{
    CatalogResponse, ContentItem, CountryField, MediaKind, MetaResponse, NormalizedMetadata,
};
