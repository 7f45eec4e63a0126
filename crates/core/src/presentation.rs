//! User-facing text. Everything here is a pure function of its inputs.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog::{AddItemOutcome, Catalog, Category};
use crate::domain::cart::Cart;
use crate::flows::states::{Menu, OrderSummary};

pub const CURRENCY_PREFIX: &str = "R$";

pub mod labels {
    pub const VIEW_CATEGORY_PREFIX: &str = "Ver ";
    pub const VIEW_CART: &str = "Ver Carrinho";
    pub const BACK_TO_CATEGORIES: &str = "Voltar às categorias";
    pub const CHECKOUT: &str = "Finalizar Compra";
    pub const CONTINUE_SHOPPING: &str = "Continuar a comprar";
}

pub const EMPTY_CART: &str = "--- O seu carrinho está vazio. ---";
pub const NOT_UNDERSTOOD: &str = "Não entendi. Por favor, use os botões.";
pub const INVALID_CART_OPTION: &str = "Opção inválida. Use os botões.";
pub const SHOWING_CATEGORIES: &str = "A mostrar categorias...";
pub const CHECKOUT_EMPTY_CART: &str = "O seu carrinho está vazio! Não pode finalizar.";
pub const ASK_NAME: &str =
    "Ótimo! Para finalizar, preciso de alguns dados.\nQual o seu NOME completo?";
pub const CANCELLED: &str =
    "Ação cancelada. A limpar o seu carrinho e estado. A voltar ao início.";
pub const PURCHASE_COMPLETED: &str = "Compra finalizada com sucesso! 👋\nPara iniciar uma nova compra, clique em /start ou use os botões.";
pub const UNKNOWN_COMMAND: &str =
    "Comando desconhecido. Use /start para começar ou /cancel para cancelar.";
pub const DEFAULT_CUSTOMER_NAME: &str = "Cliente";

const LISTING_SEPARATOR: &str = "-------------------";
const TOTAL_SEPARATOR: &str = "---------------------------------";

pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{CURRENCY_PREFIX} {rounded:.2}")
}

pub fn greeting(first_name: Option<&str>) -> String {
    let salutation = match first_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("Olá {name}!"),
        None => "Olá!".to_owned(),
    };
    format!(
        "{salutation} Bem-vindo à Loja Virtual. 🤖\nEu sou o seu assistente de vendas. Use os botões para navegar."
    )
}

/// Lists every product of the category in catalog order, or explains that it does not exist.
pub fn list_category(catalog: &Catalog, name: &str) -> String {
    match catalog.category(name) {
        Some(category) => render_category(category),
        None => format!("Desculpe, categoria '{name}' não encontrada."),
    }
}

pub fn render_category(category: &Category) -> String {
    let mut text = format!("--- MOSTRANDO {} ---\n\n", category.label.to_uppercase());
    for product in &category.products {
        text.push_str(&format!("Código: {}\n", product.code));
        text.push_str(&format!("  Nome: {}\n", product.name));
        text.push_str(&format!("  Preço: {}\n", format_price(product.price)));
        text.push_str(LISTING_SEPARATOR);
        text.push('\n');
    }

    match category.products.first() {
        Some(example) => text.push_str(&format!(
            "\nDigite o código do produto (ex: '{}') para adicionar.",
            example.code
        )),
        None => text.push_str("\nNão há produtos nesta categoria de momento."),
    }
    text
}

pub fn describe_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return EMPTY_CART.to_owned();
    }

    let mut text = String::from("--- SEU CARRINHO ATUAL ---\n");
    for line in cart.lines() {
        text.push_str(&format!(
            "{}x {} ({}) - Sub: {}\n",
            line.quantity,
            line.name,
            format_price(line.unit_price),
            format_price(line.subtotal())
        ));
    }
    text.push_str(TOTAL_SEPARATOR);
    text.push('\n');
    text.push_str(&format!("TOTAL DO PEDIDO: {}", format_price(cart.total())));
    text
}

pub fn add_item_confirmation(outcome: &AddItemOutcome<'_>) -> String {
    match outcome {
        AddItemOutcome::Added { product, .. } => {
            format!("✅ Adicionado '{}' ao carrinho.", product.name)
        }
        AddItemOutcome::NotFound { code } => {
            format!("Desculpe, não encontrei o produto com o código '{code}'.")
        }
    }
}

/// Adds `code` to `cart` and returns the text shown to the user.
pub fn add_item(catalog: &Catalog, cart: &mut Cart, code: &str) -> String {
    add_item_confirmation(&catalog.add_item(cart, code))
}

pub fn ask_address(name: &str) -> String {
    format!("Obrigado, {name}.\nAgora, por favor, escreva a sua MORADA de entrega.")
}

pub fn order_confirmation(order: &OrderSummary, cart_summary: &str) -> String {
    format!(
        "--- PEDIDO CONCLUÍDO! ---\nObrigado, {}!\n\nResumo da Compra:\n{cart_summary}\n\nMorada de Entrega:\n{}\n\n(Um assistente humano contactará para o pagamento.)",
        order.customer_name, order.address
    )
}

pub fn category_label(category: &Category) -> String {
    format!("{}{}", labels::VIEW_CATEGORY_PREFIX, category.label)
}

/// Two category buttons per row, then the cart button.
pub fn category_menu(catalog: &Catalog) -> Menu {
    let mut rows: Vec<Vec<String>> = catalog
        .categories()
        .chunks(2)
        .map(|pair| pair.iter().map(category_label).collect())
        .collect();
    rows.push(vec![labels::VIEW_CART.to_owned()]);
    Menu::new(rows)
}

pub fn product_menu() -> Menu {
    Menu::new(vec![vec![labels::BACK_TO_CATEGORIES.to_owned()]])
}

pub fn cart_menu() -> Menu {
    Menu::new(vec![vec![labels::CHECKOUT.to_owned()], vec![labels::CONTINUE_SHOPPING.to_owned()]])
}
