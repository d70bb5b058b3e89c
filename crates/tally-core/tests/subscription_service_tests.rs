mod common;

use chrono::Weekday;

use common::{date, open_ledger, ScriptedPicker, SharedGlobal, SharedShards};

use tally_core::{CategoryChoice, SubscriptionService};
use tally_domain::{Category, MonthKey, Period, Subscription};

fn monthly_sub(day: u32, last_updated: chrono::NaiveDate) -> Subscription {
    Subscription {
        name: "streaming".into(),
        expense: true,
        amount: 9.99,
        period: Period::Monthly(day),
        start: date(2023, 1, 1),
        end: None,
        last_updated,
        category: "media".into(),
    }
}

#[test]
fn monthly_catch_up_materializes_each_missed_occurrence() {
    let shards = SharedShards::new();
    let global = SharedGlobal::with_defaults(500.0, vec![Category::new("media", 25.0)]);
    global.push_subscription(monthly_sub(15, date(2024, 1, 15)));

    let today = date(2024, 4, 20);
    let mut ledger = open_ledger(&shards, &global, today);
    let mut picker = ScriptedPicker::default();
    let created = SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("catch up");

    assert_eq!(created, 3);
    assert!(picker.calls.is_empty());
    for month in [2, 3, 4] {
        let shard = shards.snapshot(MonthKey::new(2024, month));
        assert_eq!(shard.txns.len(), 1);
        assert_eq!(shard.txns[0].date, date(2024, month, 15));
        assert_eq!(shard.txns[0].description, "streaming");
        assert_eq!(shard.txns[0].category, Some(0));
        assert_eq!(shard.categories[0].spent, 9.99);
    }

    // The cursor lands on today, not on the last occurrence.
    assert_eq!(global.snapshot().subscriptions[0].last_updated, today);
    assert_eq!(ledger.subscriptions()[0].last_updated, today);
}

#[test]
fn rerun_after_catch_up_creates_nothing_new() {
    let shards = SharedShards::new();
    let global = SharedGlobal::with_defaults(500.0, vec![Category::new("media", 25.0)]);
    global.push_subscription(monthly_sub(15, date(2024, 1, 15)));

    let today = date(2024, 4, 20);
    let mut ledger = open_ledger(&shards, &global, today);
    let mut picker = ScriptedPicker::default();
    SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("catch up");
    let created = SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("again");

    assert_eq!(created, 0);
    assert_eq!(shards.snapshot(MonthKey::new(2024, 4)).txns.len(), 1);
}

#[test]
fn missing_category_falls_back_to_the_picker() {
    let shards = SharedShards::new();
    let global = SharedGlobal::new();
    global.push_subscription(Subscription {
        name: "rent".into(),
        expense: true,
        amount: 900.0,
        period: Period::Monthly(1),
        start: date(2023, 1, 1),
        end: None,
        last_updated: date(2024, 3, 20),
        category: "housing".into(),
    });

    let today = date(2024, 4, 20);
    let mut ledger = open_ledger(&shards, &global, today);
    let mut picker = ScriptedPicker::new(vec![CategoryChoice::Create(Category::new(
        "housing", 1000.0,
    ))]);
    let created = SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("catch up");

    assert_eq!(created, 1);
    assert_eq!(picker.calls.len(), 1);
    let (month, subject, missing) = &picker.calls[0];
    assert_eq!(*month, MonthKey::new(2024, 4));
    assert_eq!(subject, "rent");
    assert_eq!(missing.as_deref(), Some("housing"));

    let shard = shards.snapshot(MonthKey::new(2024, 4));
    assert_eq!(shard.categories[0].name, "housing");
    assert_eq!(shard.category_count, 1);
    assert_eq!(shard.txns[0].category, Some(0));
    assert_eq!(shard.categories[0].spent, 900.0);
}

#[test]
fn subscriptions_outside_their_window_do_not_run() {
    let shards = SharedShards::new();
    let global = SharedGlobal::new();
    let cursor = date(2024, 1, 15);
    let mut not_started = monthly_sub(15, cursor);
    not_started.start = date(2025, 1, 1);
    global.push_subscription(not_started);
    let mut ended = monthly_sub(15, cursor);
    ended.end = Some(date(2024, 2, 1));
    global.push_subscription(ended);

    let today = date(2024, 4, 20);
    let mut ledger = open_ledger(&shards, &global, today);
    let mut picker = ScriptedPicker::default();
    let created = SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("catch up");

    assert_eq!(created, 0);
    // Cursors stay untouched when the window check short-circuits.
    let state = global.snapshot();
    assert_eq!(state.subscriptions[0].last_updated, cursor);
    assert_eq!(state.subscriptions[1].last_updated, cursor);
}

#[test]
fn weekly_catch_up_hits_each_weekday_occurrence() {
    let shards = SharedShards::new();
    let global = SharedGlobal::with_defaults(0.0, vec![Category::new("media", 25.0)]);
    global.push_subscription(Subscription {
        name: "cleaner".into(),
        expense: true,
        amount: 40.0,
        period: Period::Weekly(Weekday::Fri),
        start: date(2024, 1, 1),
        end: None,
        last_updated: date(2024, 4, 15),
        category: "media".into(),
    });

    // 2024-04-15 is a Monday; Fridays through the 28th: the 19th and 26th.
    let today = date(2024, 4, 28);
    let mut ledger = open_ledger(&shards, &global, today);
    let mut picker = ScriptedPicker::default();
    let created = SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("catch up");

    assert_eq!(created, 2);
    let shard = shards.snapshot(MonthKey::new(2024, 4));
    let dates: Vec<_> = shard.txns.iter().map(|t| t.date).collect();
    assert_eq!(dates, [date(2024, 4, 19), date(2024, 4, 26)]);
}

#[test]
fn catch_up_into_the_loaded_month_updates_the_index() {
    let shards = SharedShards::new();
    let global = SharedGlobal::with_defaults(0.0, vec![Category::new("media", 25.0)]);
    global.push_subscription(monthly_sub(15, date(2024, 3, 20)));

    let today = date(2024, 4, 20);
    let mut ledger = open_ledger(&shards, &global, today);
    ledger.load_month(MonthKey::of(today)).expect("load month");
    let mut picker = ScriptedPicker::default();
    SubscriptionService::catch_up_all(&mut ledger, &mut picker).expect("catch up");

    assert_eq!(ledger.transaction_count(), 1);
    assert_eq!(
        ledger.transaction(0).unwrap().date,
        date(2024, 4, 15)
    );
    assert_eq!(ledger.category(0).unwrap().spent, 9.99);
}
