mod common;

use common::{BOT_TOKEN, TestContext, alice, signed_init_data};
use idlecoin::domain::account::{AccountUpdate, Slot};
use idlecoin::domain::ports::AccountStore;
use idlecoin::domain::principal::Principal;
use idlecoin::domain::worker::WorkerCategory;
use idlecoin::error::{EconomyError, ErrorKind};
use idlecoin::interfaces::telegram::TelegramAuthenticator;

#[tokio::test]
async fn test_signed_caller_gets_default_account() {
    let ctx = TestContext::new().await;
    let principal = TelegramAuthenticator::new(BOT_TOKEN)
        .unwrap()
        .authenticate(&signed_init_data(&alice()))
        .unwrap();
    assert_eq!(principal, alice());

    let view = ctx.engine.fetch_account(&principal).await.unwrap();

    assert_eq!(view.username, "alice");
    assert_eq!((view.balance, view.level), (0, 1));
    assert_eq!((view.energy, view.max_energy), (100, 100));
    assert_eq!(view.equipment.get(Slot::Head), None);
}

#[tokio::test]
async fn test_fetch_accrues_with_per_minute_truncation() {
    let ctx = TestContext::new().await;
    ctx.engine.fetch_account(&alice()).await.unwrap();
    let id = ctx.account(&alice()).await.id;
    ctx.stores
        .accounts
        .update(id, AccountUpdate::ProfitPerHour(119))
        .await
        .unwrap();

    ctx.clock.advance(chrono::Duration::minutes(125));
    let view = ctx.engine.fetch_account(&alice()).await.unwrap();
    assert_eq!(view.balance, 125);

    // Same instant again: nothing more to credit.
    let again = ctx.engine.fetch_account(&alice()).await.unwrap();
    assert_eq!(again.balance, 125);
}

#[tokio::test]
async fn test_equip_swap_in_same_slot() {
    let ctx = TestContext::new().await;
    ctx.engine.buy_clothing(&alice(), 1).await.unwrap();
    ctx.engine.buy_clothing(&alice(), 2).await.unwrap();

    ctx.engine.equip_clothing(&alice(), 1).await.unwrap();
    assert_eq!(ctx.account(&alice()).await.profit_per_tap, 5);
    assert_eq!(ctx.engine.tap(&alice()).await.unwrap().profit, 5);

    let detail = ctx.engine.equip_clothing(&alice(), 2).await.unwrap();
    assert!(detail.is_equipped);
    let account = ctx.account(&alice()).await;
    assert_eq!(account.profit_per_tap, 8);
    assert_eq!(account.max_energy, 110);
    assert_eq!(account.equipment.get(Slot::Head), Some("helmet.png"));

    let cap = ctx.engine.clothing_detail(&alice(), 1).await.unwrap();
    assert!(cap.is_bought);
    assert!(!cap.is_equipped);
}

#[tokio::test]
async fn test_purchase_rejected_without_funds() {
    let ctx = TestContext::new().await;
    for _ in 0..30 {
        ctx.engine.tap(&alice()).await.unwrap();
    }

    let result = ctx.engine.buy_clothing(&alice(), 3).await;
    assert!(matches!(
        result,
        Err(EconomyError::InsufficientFunds {
            balance: 30,
            required: 50
        })
    ));

    let listing = ctx.engine.list_clothes(&alice()).await.unwrap();
    assert!(listing.iter().all(|item| !item.is_bought));
    assert_eq!(ctx.account(&alice()).await.balance, 30);
}

#[tokio::test]
async fn test_equip_unowned_item() {
    let ctx = TestContext::new().await;
    let err = ctx.engine.equip_clothing(&alice(), 1).await.unwrap_err();
    assert!(matches!(err, EconomyError::NotOwned { item: 1 }));
    assert_eq!(err.kind(), ErrorKind::DomainRule);
}

#[tokio::test]
async fn test_worker_ladder_to_max_level() {
    let ctx = TestContext::new().await;

    let first = ctx.engine.upgrade_worker(&alice(), 1).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!((first[0].level, first[0].profit), (1, 60));

    let second = ctx.engine.upgrade_worker(&alice(), 1).await.unwrap();
    assert_eq!((second[0].level, second[0].profit, second[0].cost), (2, 150, 0));
    assert!(!second[0].can_upgrade);
    assert_eq!(ctx.account(&alice()).await.profit_per_hour, 150);

    let err = ctx.engine.upgrade_worker(&alice(), 1).await.unwrap_err();
    assert!(matches!(err, EconomyError::MaxLevelReached { worker: 1 }));
}

#[tokio::test]
async fn test_army_listing_is_separate() {
    let ctx = TestContext::new().await;

    let army = ctx.engine.list_workers(&alice(), WorkerCategory::Army).await.unwrap();

    assert_eq!(army.len(), 1);
    assert_eq!(army[0].image_ref, "scout.png");
    assert_eq!(army[0].cost, 300);
    assert!(!army[0].can_upgrade);
}

#[tokio::test]
async fn test_unknown_catalog_entries() {
    let ctx = TestContext::new().await;
    assert_eq!(
        ctx.engine.clothing_detail(&alice(), 99).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        ctx.engine.upgrade_worker(&alice(), 99).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_accounts_are_per_principal() {
    let ctx = TestContext::new().await;
    let bob = Principal {
        id: 2002,
        username: "bob".into(),
    };

    ctx.engine.tap(&alice()).await.unwrap();
    let view = ctx.engine.fetch_account(&bob).await.unwrap();

    assert_eq!(view.username, "bob");
    assert_eq!(view.balance, 0);
    assert_eq!(ctx.account(&alice()).await.balance, 1);
}

#[tokio::test]
async fn test_tap_drives_energy_negative() {
    let ctx = TestContext::new().await;
    ctx.engine.fetch_account(&alice()).await.unwrap();
    let id = ctx.account(&alice()).await.id;
    ctx.stores
        .accounts
        .update(id, AccountUpdate::Tap { balance: 0, energy: 0 })
        .await
        .unwrap();

    ctx.engine.tap(&alice()).await.unwrap();

    assert_eq!(ctx.account(&alice()).await.energy, -1);
}

#[tokio::test]
async fn test_counter_flow() {
    let ctx = TestContext::new().await;

    assert_eq!(ctx.engine.counter_get().await.unwrap(), 0);
    ctx.engine.counter_add(7).await.unwrap();

    let doubled = ctx.engine.counter_double().await.unwrap();
    assert_eq!((doubled.old_value, doubled.new_value), (7, 14));

    let err = ctx.engine.counter_double().await.unwrap_err();
    assert!(matches!(err, EconomyError::InvalidState(_)));

    ctx.engine.counter_increment();
    ctx.engine.shutdown().await;
    assert_eq!(ctx.engine.counter_get().await.unwrap(), 15);
}
