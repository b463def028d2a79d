//! End-to-end scenarios through a cast

use async_trait::async_trait;
use futures::FutureExt;
use pretty_assertions::assert_eq;
use screenplay_core::prelude::*;
use screenplay_core::{CastEventKind, ElapsedTime, FormatterBuilder, StartStopwatch, Stopwatch};
use screenplay_format::FnStrategy;
use screenplay_test_utils::{
    memory_cast, memory_cast_with, texts, Add, Addition, Browsing, Fail, Nested, OpenPage,
    Total, Wait, WaitBoth, WorkThenWait,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

struct Explode;

#[async_trait]
impl Performable for Explode {
    type Output = ();

    async fn perform(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<(), ScreenplayError> {
        panic!("performable bug")
    }
}

#[tokio::test]
async fn joe_adds_numbers() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    joe.can(Addition::new()).unwrap();

    joe.attempts_to(&Add(2)).await.unwrap();
    joe.attempts_to(&Add(3)).await.unwrap();
    let total = joe.asks_for(&Total).await.unwrap();

    assert_eq!(total, 5);
    assert_eq!(
        texts(&sink),
        vec!["Joe adds 2", "Joe adds 3", "Joe asks for the total"]
    );
    assert!(sink.fragments().iter().all(|f| f.outcome().is_passed()));
}

#[tokio::test]
async fn ann_cannot_browse_without_the_ability() {
    let (cast, sink) = memory_cast();
    let ann = cast.actor_called("Ann");

    let err = ann.attempts_to(&OpenPage("/home".into())).await.unwrap_err();

    assert!(matches!(
        err,
        ScreenplayError::CapabilityNotGranted { capability: "Browsing", ref actor } if actor == "Ann"
    ));
    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].text(), "Ann opens /home");
    match fragments[0].outcome() {
        Outcome::Failed { reason } => assert!(reason.contains("Browsing")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn ann_browses_once_granted() {
    let (cast, sink) = memory_cast();
    let ann = cast.actor_called("Ann");
    ann.can(Browsing::at("https://example.com")).unwrap();

    let url = ann.attempts_to(&OpenPage("/home".into())).await.unwrap();

    assert_eq!(url, "https://example.com/home");
    let events: Vec<_> = sink.events().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        events,
        vec![
            CastEventKind::ActorCreated { actor: "Ann".into() },
            CastEventKind::AbilityGained {
                actor: "Ann".into(),
                ability: "Browsing".into(),
                narration: "Ann can browse https://example.com".into(),
            },
        ]
    );
}

#[tokio::test]
async fn invalid_ability_is_rejected() {
    let (cast, _) = memory_cast();
    let ann = cast.actor_called("Ann");

    let err = ann.can(Browsing::at("")).unwrap_err();

    assert!(matches!(err, ScreenplayError::InvalidCapability { capability: "Browsing", .. }));
    assert!(!ann.has_ability::<Browsing>());
}

#[tokio::test]
async fn nested_steps_form_a_tree() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");

    joe.attempts_to(&Nested(2)).await.unwrap();

    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 1);
    let root = &fragments[0];
    assert_eq!(root.depth(), 3);
    let walked: Vec<_> = root.walk().iter().map(|f| f.text().to_string()).collect();
    assert_eq!(
        walked,
        vec![
            "Joe descends to level 2",
            "Joe descends to level 1",
            "Joe descends to level 0",
        ]
    );
    assert_eq!(joe.steps_in_progress(), 0);
}

#[tokio::test]
async fn failure_propagates_through_parents() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    joe.can(Addition::new()).unwrap();
    let chore = Sequence::new()
        .then(Add(1))
        .then(Fail("disk full"))
        .then(Add(10))
        .described_as("does chores");

    let err = joe.attempts_to(&chore).await.unwrap_err();

    assert_eq!(err.to_string(), "disk full");
    assert!(err.is_retryable());
    let root = &sink.fragments()[0];
    assert_eq!(root.text(), "Joe does chores");
    assert_eq!(root.outcome(), &Outcome::failed("disk full"));
    let children: Vec<_> = root.children().iter().map(|f| f.text().to_string()).collect();
    assert_eq!(children, vec!["Joe adds 1", "Joe performs Fail."]);
    assert_eq!(joe.ability::<Addition>().unwrap().total(), 1);
}

#[tokio::test]
async fn cancel_mid_chain_keeps_started_fragments() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    joe.can(Addition::new()).unwrap();

    let work = WorkThenWait {
        add: 2,
        wait: Duration::from_secs(10),
    };
    let (result, ()) = tokio::join!(
        joe.attempts_to(&work),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cast.cancel();
        }
    );

    assert!(result.unwrap_err().is_canceled());
    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 1);
    let root = &fragments[0];
    assert_eq!(root.outcome(), &Outcome::Canceled);

    let children: Vec<_> = root
        .children()
        .iter()
        .map(|f| (f.text().to_string(), f.outcome().clone()))
        .collect();
    assert_eq!(
        children,
        vec![
            ("Joe adds 2".to_string(), Outcome::Passed),
            ("Joe waits for 10.000s".to_string(), Outcome::Canceled),
        ]
    );
    assert_eq!(joe.steps_in_progress(), 0);
}

#[tokio::test]
async fn canceled_actor_does_not_start_new_steps() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    let addition = joe.can(Addition::new()).unwrap();
    joe.cancellation().cancel();

    let err = joe.attempts_to(&Add(1)).await.unwrap_err();

    assert!(err.is_canceled());
    assert_eq!(addition.total(), 0);
    assert_eq!(sink.fragments()[0].outcome(), &Outcome::Canceled);
}

#[tokio::test]
async fn dropped_call_still_reports() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");

    let timed_out = tokio::time::timeout(
        Duration::from_millis(10),
        joe.attempts_to(&Wait(Duration::from_secs(10))),
    )
    .await;

    assert!(timed_out.is_err());
    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].outcome(), &Outcome::Canceled);
}

#[tokio::test]
async fn actors_run_concurrently_in_isolation() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    let ann = cast.actor_called("Ann");
    joe.can(Addition::new()).unwrap();
    ann.can(Addition::new()).unwrap();

    let joe_chain = async {
        joe.attempts_to(&Add(1)).await?;
        joe.attempts_to(&Wait(Duration::from_millis(5))).await?;
        Ok::<_, ScreenplayError>(joe.asks_for(&Total).await?)
    };
    let ann_chain = async {
        ann.attempts_to(&Add(40)).await?;
        ann.attempts_to(&Add(2)).await?;
        Ok::<_, ScreenplayError>(ann.asks_for(&Total).await?)
    };
    let (joe_total, ann_total) = futures::join!(joe_chain, ann_chain);

    assert_eq!(joe_total.unwrap(), 1);
    assert_eq!(ann_total.unwrap(), 42);

    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 6);
    assert!(fragments.iter().all(|f| f.children().is_empty()));
    let joes: Vec<_> = fragments
        .iter()
        .filter(|f| f.actor() == "Joe")
        .map(|f| f.text().to_string())
        .collect();
    assert_eq!(
        joes,
        vec!["Joe adds 1", "Joe waits for 0.005s", "Joe asks for the total"]
    );
}

#[tokio::test]
async fn ensure_checks_answers() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    joe.can(Addition::new()).unwrap();
    joe.attempts_to(&Add(5)).await.unwrap();

    joe.should(&Ensure::equals(Total, 5)).await.unwrap();
    let err = joe
        .should(&Ensure::that(Total, "is negative", |total: &i64| *total < 0))
        .await
        .unwrap_err();

    assert!(matches!(err, ScreenplayError::Assertion { .. }));
    assert!(err.to_string().contains("Total is negative"));

    let fragments = sink.fragments();
    assert_eq!(fragments[1].text(), "Joe should see that Total is 5");
    assert_eq!(fragments[1].kind(), StepKind::Assertion);
    assert_eq!(fragments[1].children()[0].kind(), StepKind::Question);
    assert_eq!(fragments[1].children()[0].text(), "Joe asks for the total");
    assert!(matches!(fragments[2].outcome(), Outcome::Failed { .. }));
}

#[tokio::test]
async fn stopwatch_times_the_scenario() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    joe.can(Stopwatch::new()).unwrap();

    joe.was_able_to(&StartStopwatch).await.unwrap();
    joe.attempts_to(&Wait(Duration::from_millis(5))).await.unwrap();
    let elapsed = joe.asks_for(&ElapsedTime::stopping()).await.unwrap();

    assert!(elapsed >= Duration::from_millis(5));
    assert_eq!(sink.fragments()[0].kind(), StepKind::Setup);
}

#[tokio::test]
async fn replacing_an_ability_releases_the_old_one() {
    let (cast, _) = memory_cast();
    let joe = cast.actor_called("Joe");
    let first = joe.can(Addition::new()).unwrap();
    joe.attempts_to(&Add(3)).await.unwrap();

    let second = joe.can(Addition::new()).unwrap();

    assert_eq!(first.times_released(), 1);
    assert_eq!(second.times_released(), 0);
    assert_eq!(joe.asks_for(&Total).await.unwrap(), 0);
}

#[tokio::test]
async fn dismissal_releases_every_ability() {
    let (cast, _) = memory_cast();
    let joe = cast.actor_called("Joe");
    let addition = joe.can(Addition::new()).unwrap();

    cast.dismiss();
    cast.dismiss();

    assert_eq!(addition.times_released(), 1);
    assert!(matches!(
        joe.can(Addition::new()),
        Err(ScreenplayError::ActorRetired { .. })
    ));
}

#[tokio::test]
async fn custom_fallback_verb_and_truncation() {
    let config = ScreenplayConfig::new()
        .with_fallback_verb("attempts")
        .with_max_argument_len(6);
    let (cast, sink) = memory_cast_with(config);
    let joe = cast.actor_called("Joe");

    let _ = joe.attempts_to(&Fail("boom")).await;
    let _ = joe
        .attempts_to(&OpenPage("/a/very/long/path".into()))
        .await;

    assert_eq!(
        texts(&sink),
        vec!["Joe attempts Fail.", "Joe opens /a/ve…"]
    );
}

#[tokio::test]
async fn scenario_report_summarizes_the_run() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");
    joe.can(Addition::new()).unwrap();
    joe.attempts_to(&Add(1)).await.unwrap();
    let _ = joe.attempts_to(&Fail("nope")).await;

    let report = sink.report("adding up");
    let summary = report.summary();

    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert!(!report.is_success());
    let json = report.to_json().unwrap();
    assert!(json.contains("Joe adds 1"));
}

#[tokio::test]
async fn concurrent_children_are_siblings() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");

    joe.attempts_to(&WaitBoth(Duration::from_millis(30), Duration::from_millis(5)))
        .await
        .unwrap();

    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 1);
    let root = &fragments[0];
    assert_eq!(root.depth(), 2);
    let children: Vec<_> = root
        .children()
        .iter()
        .map(|f| (f.text().to_string(), f.outcome().clone()))
        .collect();
    assert_eq!(
        children,
        vec![
            ("Joe waits for 0.030s".to_string(), Outcome::Passed),
            ("Joe waits for 0.005s".to_string(), Outcome::Passed),
        ]
    );
    assert_eq!(joe.steps_in_progress(), 0);
}

#[tokio::test]
async fn separate_top_level_calls_do_not_nest() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");

    let slow_wait = Wait(Duration::from_millis(20));
    let fast_wait = Wait(Duration::from_millis(1));
    let (slow, fast) = futures::join!(
        joe.attempts_to(&slow_wait),
        joe.attempts_to(&fast_wait),
    );
    slow.unwrap();
    fast.unwrap();

    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 2);
    assert!(fragments.iter().all(|f| f.children().is_empty() && f.outcome().is_passed()));
}

#[tokio::test]
async fn panicking_predicate_does_not_break_the_step() {
    let formatter = FormatterBuilder::new()
        .register(FnStrategy::new(
            "broken",
            0,
            |_| panic!("predicate bug"),
            |_, _| Ok(String::new()),
        ))
        .build();
    let sink = Arc::new(MemorySink::new());
    let cast = Cast::with_config(ScreenplayConfig::new(), Arc::new(formatter), sink.clone()).unwrap();
    let joe = cast.actor_called("Joe");

    joe.attempts_to(&Wait(Duration::from_millis(1))).await.unwrap();

    assert_eq!(texts(&sink), vec!["Joe waits for 1ms"]);
}

#[tokio::test]
async fn panicking_step_is_reported_as_failed() {
    let (cast, sink) = memory_cast();
    let joe = cast.actor_called("Joe");

    let outcome = AssertUnwindSafe(joe.attempts_to(&Explode)).catch_unwind().await;

    assert!(outcome.is_err());
    let fragments = sink.fragments();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].text(), "Joe performs Explode.");
    assert_eq!(fragments[0].outcome(), &Outcome::failed("panicked: performable bug"));
}
