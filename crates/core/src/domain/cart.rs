use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductCode};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub code: ProductCode,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// Saturates at `Decimal::MAX` instead of overflowing.
    pub fn subtotal(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartChange {
    Inserted,
    Incremented { quantity: u32 },
}

/// Lines keep the order in which products were first added.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, code: &ProductCode) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.code == code)
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Increments an existing line, or copies the product's current name and price
    /// into a new line with quantity 1.
    pub fn add(&mut self, product: &Product) -> CartChange {
        if let Some(line) = self.lines.iter_mut().find(|line| line.code == product.code) {
            line.quantity = line.quantity.saturating_add(1);
            return CartChange::Incremented { quantity: line.quantity };
        }

        self.lines.push(CartLine {
            code: product.code.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
        });
        CartChange::Inserted
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Cart, CartChange};
    use crate::domain::product::{Product, ProductCode};

    fn camiseta() -> Product {
        Product::new("cam001", "Camiseta Branca Básica", Decimal::new(5_000, 2))
    }

    fn calca() -> Product {
        Product::new("cal002", "Calça Moletom Cinza", Decimal::new(9_000, 2))
    }

    #[test]
    fn repeat_add_increments_single_line() {
        let mut cart = Cart::new();

        assert_eq!(cart.add(&camiseta()), CartChange::Inserted);
        assert_eq!(cart.add(&camiseta()), CartChange::Incremented { quantity: 2 });

        assert_eq!(cart.lines().len(), 1);
        let line = cart.line(&ProductCode::normalized("cam001")).expect("line exists");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Decimal::new(5_000, 2));
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let mut cart = Cart::new();
        cart.add(&camiseta());
        cart.add(&calca());
        cart.add(&calca());

        let expected: Decimal =
            cart.lines().iter().map(|line| line.unit_price * Decimal::from(line.quantity)).sum();
        assert_eq!(cart.total(), expected);
        assert_eq!(cart.total(), Decimal::new(23_000, 2));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add(&calca());
        cart.add(&camiseta());
        cart.add(&calca());

        let codes: Vec<&str> = cart.lines().iter().map(|line| line.code.as_str()).collect();
        assert_eq!(codes, vec!["cal002", "cam001"]);
    }

    #[test]
    fn oversized_prices_saturate_instead_of_panicking() {
        let huge = Product::new("big1", "Big", Decimal::MAX);
        let mut cart = Cart::new();
        cart.add(&huge);
        cart.add(&huge);
        cart.add(&camiseta());

        assert_eq!(cart.lines()[0].subtotal(), Decimal::MAX);
        assert_eq!(cart.total(), Decimal::MAX);
    }

    #[test]
    fn empty_cart_totals_zero() {
        let mut cart = Cart::new();
        cart.add(&camiseta());
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }
}
