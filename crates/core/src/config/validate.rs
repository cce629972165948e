use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog batch size is not 0
/// - Listing URLs are present and the page URL carries a `{page}` placeholder
/// - Listing selectors are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.catalog.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.batch_size cannot be 0".to_string(),
        ));
    }

    let listing = &config.listing;
    if listing.index_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "listing.index_url cannot be empty".to_string(),
        ));
    }
    if !listing.page_url.contains("{page}") {
        return Err(ConfigError::ValidationError(
            "listing.page_url must contain a {page} placeholder".to_string(),
        ));
    }

    let selectors = [
        ("pagination", &listing.selectors.pagination),
        ("entry", &listing.selectors.entry),
        ("title", &listing.selectors.title),
        ("artist", &listing.selectors.artist),
        ("date", &listing.selectors.date),
    ];
    for (name, selector) in selectors {
        if selector.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "listing.selectors.{} cannot be empty",
                name
            )));
        }
    }

    Ok(())
}
