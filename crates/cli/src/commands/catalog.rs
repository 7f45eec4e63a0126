use loja_core::catalog::Catalog;
use loja_core::presentation;

use crate::commands::{load_config, CommandResult};

/// Renders every category exactly as the bot would list it.
pub fn run() -> CommandResult {
    let config = match load_config("catalog") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let catalog = match Catalog::load_or_builtin(config.catalog.path.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("catalog", "catalog_load", error.to_string(), 6);
        }
    };

    CommandResult { exit_code: 0, output: render(&catalog) }
}

pub fn render(catalog: &Catalog) -> String {
    catalog
        .categories()
        .iter()
        .map(|category| {
            format!(
                "[{}] {}\n{}",
                category.key,
                presentation::category_label(category),
                presentation::render_category(category)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
