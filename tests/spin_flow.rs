#![allow(non_snake_case)]
use lucky_grid::{
    GameConfig,
    GameError,
    GameEvent,
    MessageState,
    animator::Highlight,
    config::ConfigError,
    store::{
        HISTORY_KEY,
        KeyValueStore,
    },
    test_helpers::*,
};
use std::time::Duration;
use tokio::time::{
    self,
    Instant,
};

fn always_win() -> GameConfig {
    GameConfig {
        ticket_price: 5,
        win_threshold: 5,
        ..GameConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn spin__animates_thirty_ticks_then_settles_after_hold() {
    let mut ctx = TestContext::builder().seed(11).build();

    // given
    ctx.connect_and_buy(1).await;
    let started_at = Instant::now();

    // when
    let run = ctx.spin_to_settlement().await;

    // then
    assert_eq!(started_at.elapsed(), Duration::from_millis(3500));
    assert_eq!(run.highlights.len(), 1 + 30 + 1);
    assert_eq!(run.highlights[0], Highlight::Cleared);
    assert!(
        run.highlights[1..31]
            .iter()
            .all(|h| matches!(h, Highlight::Cosmetic(i) if *i < 9))
    );
    assert_eq!(
        run.highlights[31],
        Highlight::Forced(run.started.winning_index)
    );
    assert_eq!(
        run.settlement.outcome.prize,
        ctx.controller.catalog().entries()[run.started.winning_index]
    );
    assert!(!ctx.controller.is_spinning());
}

#[tokio::test(start_paused = true)]
async fn spin__loss_settles_with_ready_message_and_no_history() {
    let mut ctx = TestContext::builder().build();

    // given
    ctx.connect_and_buy(1).await;

    // when
    let run = ctx.spin_to_settlement().await;

    // then
    assert!(run.settlement.outcome.is_loss);
    assert_eq!(
        run.settlement.message,
        MessageState::Ready("Better luck next time!".to_string())
    );
    assert!(ctx.controller.history().is_empty());
    assert_eq!(ctx.store.get(HISTORY_KEY).unwrap(), None);
    assert!(ctx.messages.prompts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn spin__win_records_history_and_delivers_generated_message() {
    let mut ctx = TestContext::builder()
        .config(always_win())
        .messages(ScriptedMessages::replying("Stacking sats!"))
        .build();

    // given
    ctx.connect_and_buy(1).await;

    // when
    let run = ctx.spin_to_settlement().await;
    let (spin_id, text) = ctx.next_message().await;

    // then
    assert!(run.started.forced_win);
    assert!(!run.settlement.outcome.is_loss);
    assert_eq!(run.settlement.message, MessageState::Pending);
    assert_eq!(spin_id, run.started.spin_id);
    assert_eq!(text, "Stacking sats!");
    assert_eq!(
        ctx.messages.prompts(),
        vec![run.settlement.outcome.prize.label.clone()]
    );
    assert_eq!(ctx.controller.history().len(), 1);
    assert_eq!(
        ctx.controller.history()[0].prize,
        run.settlement.outcome.prize
    );
}

#[tokio::test(start_paused = true)]
async fn spin__failed_message_generation_falls_back_to_congrats() {
    let mut ctx = TestContext::builder()
        .config(always_win())
        .messages(ScriptedMessages::failing())
        .build();

    // given
    ctx.connect_and_buy(1).await;

    // when
    let run = ctx.spin_to_settlement().await;
    let (_, text) = ctx.next_message().await;

    // then
    assert!(!run.settlement.outcome.is_loss);
    assert_eq!(text, "Congrats!");
    assert_eq!(ctx.controller.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn spin__new_win_supersedes_a_pending_message() {
    let mut ctx = TestContext::builder()
        .config(always_win())
        .messages(ScriptedMessages::replying("late").with_delay(Duration::from_secs(10)))
        .build();

    // given
    ctx.connect_and_buy(2).await;
    let first = ctx.spin_to_settlement().await;

    // when
    let second = ctx.spin_to_settlement().await;
    let (spin_id, _) = ctx.next_message().await;

    // then
    assert_ne!(first.started.spin_id, second.started.spin_id);
    assert_eq!(spin_id, second.started.spin_id);
    assert_eq!(ctx.controller.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn spin__second_request_while_spinning_is_rejected_without_cost() {
    let mut ctx = TestContext::builder().build();

    // given
    ctx.connect_and_buy(3).await;
    ctx.controller.request_spin().unwrap();
    let during = ctx.controller.economy();

    // when
    let err = ctx.controller.request_spin().unwrap_err();

    // then
    assert!(matches!(err, GameError::SpinInProgress));
    assert_eq!(ctx.controller.economy(), during);
}

#[tokio::test(start_paused = true)]
async fn spin__decision_is_accounted_before_the_animation_finishes() {
    let mut ctx = TestContext::builder().build();

    // given
    ctx.connect_and_buy(1).await;

    // when
    let started = ctx.controller.request_spin().unwrap();

    // then
    assert_eq!(started.economy.ticket_balance, 0);
    assert_eq!(started.economy.cumulative_spend, 5);
    assert!(ctx.controller.is_spinning());
    assert!(ctx.controller.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn teardown__stops_the_spin_and_pending_message() {
    let mut ctx = TestContext::builder()
        .config(always_win())
        .messages(ScriptedMessages::replying("never").with_delay(Duration::from_secs(1)))
        .build();

    // given
    ctx.connect_and_buy(2).await;
    ctx.spin_to_settlement().await;
    let history_len = ctx.controller.history().len();
    ctx.controller.request_spin().unwrap();
    let economy = ctx.controller.economy();

    // when
    ctx.controller.teardown();

    // then
    let waited = time::timeout(Duration::from_secs(30), ctx.controller.next_event()).await;
    assert!(waited.is_err());
    assert_eq!(ctx.controller.history().len(), history_len);
    assert_eq!(ctx.controller.economy(), economy);
    assert!(!ctx.controller.is_spinning());
}

#[tokio::test(start_paused = true)]
async fn spin__can_start_again_after_settlement() {
    let mut ctx = TestContext::builder().build();

    // given
    ctx.connect_and_buy(2).await;
    let first = ctx.spin_to_settlement().await;

    // when
    let event = {
        ctx.controller.request_spin().unwrap();
        ctx.controller.next_event().await
    };

    // then
    assert!(matches!(
        event,
        GameEvent::Highlight { spin_id, highlight: Highlight::Cleared } if spin_id == first.started.spin_id + 1
    ));
}

#[tokio::test(start_paused = true)]
async fn spin__later_loss_drops_the_message_of_an_earlier_win() {
    let mut ctx = TestContext::builder()
        .config(GameConfig {
            ticket_price: 5,
            win_threshold: 10,
            ..GameConfig::default()
        })
        .messages(ScriptedMessages::replying("You are rich!").with_delay(Duration::from_secs(10)))
        .build();

    // given
    ctx.connect_and_buy(3).await;
    let first = ctx.spin_to_settlement().await;
    let win = ctx.spin_to_settlement().await;

    // when
    let loss = ctx.spin_to_settlement().await;

    // then
    assert!(first.settlement.outcome.is_loss);
    assert_eq!(win.settlement.message, MessageState::Pending);
    assert_eq!(
        loss.settlement.message,
        MessageState::Ready("Better luck next time!".to_string())
    );
    let waited = time::timeout(Duration::from_secs(30), ctx.controller.next_event()).await;
    assert!(waited.is_err());
}

#[tokio::test(start_paused = true)]
async fn new__rejects_a_zero_tick_period_before_any_spin() {
    // given
    let config = GameConfig {
        tick_period_ms: 0,
        ..GameConfig::default()
    };

    // when
    let built = TestContext::builder().config(config).try_build();

    // then
    assert!(matches!(built, Err(ConfigError::Invalid(_))));
}
