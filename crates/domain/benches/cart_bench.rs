use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CartService, CatalogService, ChatId, Money, NewMenuItem, NotificationDispatcher, Quantity,
    RecordingNotifier, Repositories, TransitionPolicy,
};
use store::InMemoryDocumentStore;

struct Bench {
    catalog: CatalogService<InMemoryDocumentStore>,
    carts: CartService<InMemoryDocumentStore>,
}

fn setup() -> Bench {
    let repos = Repositories::new(InMemoryDocumentStore::new(), 1024);
    let dispatcher = NotificationDispatcher::new(Arc::new(RecordingNotifier::new()), ChatId::new(1));
    Bench {
        catalog: CatalogService::new(&repos),
        carts: CartService::new(&repos, dispatcher, TransitionPolicy::Strict),
    }
}

fn item() -> NewMenuItem {
    NewMenuItem::new(
        "Benchmark Item",
        vec![
            Quantity::new("Option 1", "1/8", Money::from_units(25)),
            Quantity::new("Option 2", "1/4", Money::from_units(45)),
        ],
    )
}

fn bench_add_to_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let bench = setup();
    let menu_item = rt.block_on(bench.catalog.add_item(item())).unwrap();

    c.bench_function("cart/add_to_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                bench
                    .carts
                    .add_to_cart(ChatId::new(7), &menu_item.id, 1)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_add_and_confirm(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let bench = setup();
    let menu_item = rt.block_on(bench.catalog.add_item(item())).unwrap();

    c.bench_function("cart/add_confirm", |b| {
        b.iter(|| {
            rt.block_on(async {
                let chat = ChatId::new(8);
                bench.carts.add_to_cart(chat, &menu_item.id, 0).await.unwrap();
                bench.carts.add_to_cart(chat, &menu_item.id, 1).await.unwrap();
                bench
                    .carts
                    .confirm_order(chat, "Bench", Some("bench"))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_add_to_cart, bench_add_and_confirm);
criterion_main!(benches);
