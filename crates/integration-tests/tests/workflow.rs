//! Order and return workflows over the pure domain rules, without a database.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stern_core::cart::{CartProduct, CartStore, MemoryCartStorage};
use stern_core::order::{
    OrderItem, PricingError, PricingPolicy, ProductSnapshot, price_order, restore_stock,
};
use stern_core::returns::{ReturnContext, ReturnError, ReturnableLine, assess_return};
use stern_core::{OrderStatus, ProductId};

fn product(id: i64, price: Decimal, stock: i32) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        name: format!("Producto {id}"),
        price,
        stock,
        active: true,
    }
}

fn catalog(products: Vec<ProductSnapshot>) -> BTreeMap<ProductId, ProductSnapshot> {
    products.into_iter().map(|p| (p.product_id, p)).collect()
}

fn item(id: i64, quantity: i32) -> OrderItem {
    OrderItem {
        product_id: ProductId::new(id),
        quantity,
    }
}

fn take(
    stock: &mut BTreeMap<ProductId, ProductSnapshot>,
    deltas: impl Iterator<Item = (ProductId, i32)>,
) {
    for (id, quantity) in deltas {
        if let Some(p) = stock.get_mut(&id) {
            p.stock -= quantity;
        }
    }
}

#[test]
fn test_order_then_two_returns_reaches_full_refund() {
    let p = ProductId::new(1);
    let mut products = catalog(vec![product(1, dec!(100), 10)]);

    let priced = price_order(&[item(1, 2)], &products, PricingPolicy::Strict).unwrap();
    assert_eq!(priced.total, dec!(200));
    take(&mut products, priced.stock_deltas());
    assert_eq!(products[&p].stock, 8);

    let line = priced.lines.first().map(|l| ReturnableLine {
        quantity: l.quantity,
        unit_price: l.unit_price,
    });
    let mut ctx = ReturnContext {
        order_status: OrderStatus::Paid,
        order_total: priced.total,
        product_id: p,
        line,
        already_returned: 0,
    };

    let first = assess_return(&ctx, 1).unwrap();
    assert_eq!(first.refund_amount, dec!(100));
    assert_eq!(first.new_total, dec!(100));
    assert_eq!(first.new_status, OrderStatus::PartiallyRefunded);
    products = restore_stock(products, [(p, first.quantity)]);
    assert_eq!(products[&p].stock, 9);

    ctx.order_status = first.new_status;
    ctx.order_total = first.new_total;
    ctx.already_returned += first.quantity;

    let second = assess_return(&ctx, 1).unwrap();
    assert_eq!(second.refund_amount, dec!(100));
    assert_eq!(second.new_total, Decimal::ZERO);
    assert_eq!(second.new_status, OrderStatus::Refunded);
    products = restore_stock(products, [(p, second.quantity)]);
    assert_eq!(products[&p].stock, 10);

    ctx.order_status = second.new_status;
    ctx.order_total = second.new_total;
    ctx.already_returned += second.quantity;

    assert_eq!(
        assess_return(&ctx, 1),
        Err(ReturnError::ExceedsAvailable {
            available: 0,
            requested: 1
        })
    );
}

#[test]
fn test_edit_nets_old_against_new_quantities() {
    let p = ProductId::new(1);
    let mut products = catalog(vec![product(1, dec!(50), 5)]);

    let original = price_order(&[item(1, 3)], &products, PricingPolicy::Strict).unwrap();
    take(&mut products, original.stock_deltas());
    assert_eq!(products[&p].stock, 2);

    // Five units only fit once the three already held by the order go back.
    assert!(matches!(
        price_order(&[item(1, 5)], &products, PricingPolicy::Strict),
        Err(PricingError::InsufficientStock { .. })
    ));

    let mut restored = restore_stock(products, original.stock_deltas());
    let edited = price_order(&[item(1, 5)], &restored, PricingPolicy::Strict).unwrap();
    take(&mut restored, edited.stock_deltas());

    // pre-edit stock + old quantity - new quantity
    assert_eq!(restored[&p].stock, 2 + 3 - 5);
    assert_eq!(edited.subtotal, dec!(250));
}

#[test]
fn test_cart_contents_price_at_checkout() {
    let mut store = CartStore::new(MemoryCartStorage::new());
    for (id, price, quantity) in [(1, dec!(120), 2), (2, dec!(80), 1), (3, dec!(10), 4)] {
        let cart_product = CartProduct {
            product_id: ProductId::new(id),
            name: format!("Producto {id}"),
            category: None,
            price,
            stock: Some(10),
            image_url: None,
        };
        store.add(&cart_product, quantity);
    }
    assert_eq!(store.subtotal(), dec!(360));

    let items: Vec<OrderItem> = store
        .read()
        .iter()
        .map(|line| item(line.product_id.as_i64(), line.quantity))
        .collect();

    // Product 3 was withdrawn after it went into the cart.
    let mut withdrawn = product(3, dec!(10), 10);
    withdrawn.active = false;
    let products = catalog(vec![
        product(1, dec!(120), 10),
        product(2, dec!(80), 10),
        withdrawn,
    ]);

    let priced = price_order(&items, &products, PricingPolicy::Lenient).unwrap();
    assert_eq!(priced.lines.len(), 2);
    assert_eq!(priced.total, dec!(320));

    assert!(matches!(
        price_order(&items, &products, PricingPolicy::Strict),
        Err(PricingError::InactiveProduct(_))
    ));
}
