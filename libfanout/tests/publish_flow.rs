//! End-to-end compose flows through `FanoutService` against the mock backend

use std::sync::Arc;

use chrono::{Duration, Local};
use libfanout::api::mock::{MockApi, MockCall, PublishBehavior};
use libfanout::api::RecordStatus;
use libfanout::error::{ApiError, SubmitError, UploadError, ValidationError};
use libfanout::media::{LocalFile, MediaLimits, MemoryBlobStore};
use libfanout::service::enrichment::GenerateOptions;
use libfanout::service::events::Event;
use libfanout::{
    AccountId, Config, Draft, DraftAction, DraftStatus, FanoutError, FanoutService, PlatformId,
    Schedule,
};

fn service_with(api: &MockApi) -> FanoutService {
    FanoutService::with_api(Config::default_config(), Arc::new(api.clone()))
}

fn twitter() -> PlatformId {
    PlatformId::new("twitter")
}

fn instagram() -> PlatformId {
    PlatformId::new("instagram")
}

fn image(name: &str) -> LocalFile {
    LocalFile::new(name, "image/png", vec![0; 64])
}

fn compose(draft: &mut Draft, content: &str) {
    draft.apply(DraftAction::SetContent(content.to_string()));
    draft.apply(DraftAction::SetPlatforms(vec![twitter(), instagram()]));
    draft.apply(DraftAction::SelectAccount {
        platform: twitter(),
        account: AccountId::new("tw-main"),
    });
    draft.apply(DraftAction::SelectAccount {
        platform: instagram(),
        account: AccountId::new("ig-brand"),
    });
}

#[tokio::test]
async fn test_compose_upload_and_publish() {
    let api = MockApi::success();
    let service = service_with(&api);
    let mut events = service.subscribe();
    let mut draft = service.new_draft();

    compose(&mut draft, "Launch **today**");
    draft.apply(DraftAction::SetHashtagsText("#launch #rust launch".to_string()));
    service
        .uploads()
        .upload(&mut draft, vec![image("a.png"), image("b.png")])
        .await
        .unwrap();

    let outcome = service.publisher().submit(&mut draft).await.unwrap();

    assert_eq!(outcome.post_id, "post-1");
    assert_eq!(outcome.status, DraftStatus::Published);
    assert_eq!(outcome.scheduled_at, None);

    // Create strictly before publish
    let calls: Vec<_> = api
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, MockCall::Upload(_)))
        .collect();
    assert_eq!(calls, vec![MockCall::Create, MockCall::Publish("post-1".to_string())]);

    let payload = &api.created_payloads()[0];
    assert_eq!(payload.status, None);
    assert_eq!(payload.hashtags, vec!["#launch", "#rust"]);
    assert_eq!(payload.images.len(), 2);
    assert_eq!(payload.images[0].url, "https://cdn.example.com/a.png");
    assert_eq!(payload.images[1].url, "https://cdn.example.com/b.png");
    assert!(!payload.content.contains("**"));
    assert_eq!(
        payload.selected_accounts[&instagram()],
        vec![AccountId::new("ig-brand")]
    );

    // Draft is back to an empty composing state
    assert_eq!(draft.status(), DraftStatus::Composing);
    assert!(draft.content().is_empty());
    assert!(draft.media().is_empty());

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&Event::PostPublished {
        post_id: "post-1".to_string()
    }));
}

#[tokio::test]
async fn test_validation_failure_makes_no_calls() {
    let api = MockApi::success();
    let service = service_with(&api);
    let mut draft = service.new_draft();

    draft.apply(DraftAction::SetContent("x".repeat(281)));
    draft.apply(DraftAction::SelectPlatform(twitter()));

    let err = service.publisher().submit(&mut draft).await.unwrap_err();
    let FanoutError::Validation(errors) = &err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert!(errors.contains(&ValidationError::MediaRequired));
    assert!(errors.contains(&ValidationError::AccountRequired {
        platform: twitter()
    }));
    assert!(errors.contains(&ValidationError::ContentTooLong {
        platform: twitter(),
        length: 281,
        limit: 280,
    }));

    assert!(api.calls().is_empty());
    assert_eq!(draft.status(), DraftStatus::Composing);
}

#[tokio::test]
async fn test_create_failure_never_publishes() {
    let api = MockApi::create_failure(ApiError::Network("connection reset".to_string()));
    let service = service_with(&api);
    let mut draft = service.new_draft();

    compose(&mut draft, "Hello");
    service
        .uploads()
        .upload(&mut draft, vec![image("a.png")])
        .await
        .unwrap();

    let err = service.publisher().submit(&mut draft).await.unwrap_err();
    assert!(matches!(
        err,
        FanoutError::Submit(SubmitError::CreateFailed(ApiError::Network(_)))
    ));
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.publish_calls(), 0);

    // Content kept for another attempt
    assert_eq!(draft.status(), DraftStatus::Composing);
    assert_eq!(draft.content(), "Hello");
    assert!(draft.last_error().is_some());
}

#[tokio::test]
async fn test_created_not_published_then_retry() {
    let api = MockApi::publish_failure(PublishBehavior::Reject("instagram token expired".to_string()));
    let service = service_with(&api);
    let mut draft = service.new_draft();

    compose(&mut draft, "Hello");
    service
        .uploads()
        .upload(&mut draft, vec![image("a.png")])
        .await
        .unwrap();

    let err = service.publisher().submit(&mut draft).await.unwrap_err();
    let post_id = match &err {
        FanoutError::Submit(e @ SubmitError::CreatedNotPublished { reason, .. }) => {
            assert!(reason.contains("token expired"));
            e.created_post_id().unwrap().to_string()
        }
        other => panic!("expected CreatedNotPublished, got {other:?}"),
    };
    assert_eq!(err.exit_code(), 4);
    assert_eq!(post_id, "post-1");
    assert_eq!(draft.status(), DraftStatus::Composing);
    assert_eq!(draft.content(), "Hello");
    // No automatic second attempt
    assert_eq!(api.publish_calls(), 1);

    let retry_api = MockApi::success();
    let retry_service = service_with(&retry_api);
    let outcome = retry_service
        .publisher()
        .retry_publish(&mut draft, &post_id)
        .await
        .unwrap();
    assert_eq!(outcome.status, DraftStatus::Published);
    assert_eq!(retry_api.calls(), vec![MockCall::Publish(post_id)]);
}

#[tokio::test]
async fn test_scheduled_submit_creates_once() {
    let api = MockApi::success();
    let service = service_with(&api);
    let mut draft = service.new_draft();

    compose(&mut draft, "Tomorrow");
    service
        .uploads()
        .upload(&mut draft, vec![image("a.png")])
        .await
        .unwrap();
    let when = Local::now() + Duration::days(1);
    draft.apply(DraftAction::SetSchedule(Schedule::later(
        when.date_naive(),
        when.format("%H:%M").to_string(),
    )));

    let outcome = service.publisher().submit(&mut draft).await.unwrap();

    assert_eq!(outcome.status, DraftStatus::Scheduled);
    let scheduled_at = outcome.scheduled_at.unwrap();
    assert!(scheduled_at.ends_with('Z'));
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.publish_calls(), 0);

    let payload = &api.created_payloads()[0];
    assert_eq!(payload.status, Some(RecordStatus::Scheduled));
    assert_eq!(payload.scheduled_date.as_deref(), Some(scheduled_at.as_str()));
}

#[tokio::test]
async fn test_save_draft_keeps_composition() {
    let api = MockApi::success();
    let service = service_with(&api);
    let mut draft = service.new_draft();

    draft.apply(DraftAction::SetContent("Half an idea".to_string()));
    let post_id = service.publisher().save_draft(&mut draft).await.unwrap();

    assert_eq!(post_id, "post-1");
    assert_eq!(draft.content(), "Half an idea");
    assert_eq!(api.publish_calls(), 0);
    assert_eq!(api.created_payloads()[0].status, Some(RecordStatus::Draft));
}

#[tokio::test]
async fn test_failed_upload_rolls_back_and_releases_previews() {
    let api = MockApi::upload_failure(ApiError::Http {
        status: 500,
        message: "storage offline".to_string(),
    });
    let service = service_with(&api);
    let blobs = Arc::new(MemoryBlobStore::new());
    let mut draft = Draft::new(blobs.clone(), MediaLimits::default());

    draft
        .media_mut()
        .push_remote(libfanout::media::MediaRef::remote(
            "https://cdn.example.com/kept.png",
            "kept.png",
            libfanout::types::FileType::Image,
        ));

    let err = service
        .uploads()
        .upload(&mut draft, vec![image("a.png"), image("b.png")])
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Failed { .. }));

    // Only the failed batch is rolled back
    assert_eq!(draft.media().len(), 1);
    assert_eq!(draft.media().items()[0].url, "https://cdn.example.com/kept.png");
    assert_eq!(blobs.live_count(), 0);
    assert_eq!(blobs.released().len(), 2);
}

#[tokio::test]
async fn test_reset_during_upload_discards_late_result() {
    let api = MockApi::success();
    let service = service_with(&api);
    let blobs = Arc::new(MemoryBlobStore::new());
    let mut draft = Draft::new(blobs.clone(), MediaLimits::default());
    compose(&mut draft, "Hello");

    let pending = service
        .uploads()
        .begin(&mut draft, vec![image("a.png")])
        .unwrap();
    let response = service.uploads().send(&pending).await;
    draft.reset();
    let report = service.uploads().finish(&mut draft, pending, response).unwrap();

    assert!(report.discarded);
    assert!(draft.media().is_empty());
    assert_eq!(blobs.live_count(), 0);
}

#[tokio::test]
async fn test_generated_suggestion_applies_to_one_platform() {
    let api = MockApi::success();
    let service = service_with(&api);
    let mut draft = service.new_draft();
    compose(&mut draft, "old text");

    let suggestions = service
        .enrichment()
        .generate_content(
            "spring sale",
            &[twitter(), instagram()],
            &GenerateOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].platform, twitter());

    service
        .enrichment()
        .apply_suggestion(&mut draft, &suggestions[1]);

    assert_eq!(draft.content(), suggestions[1].content);
    assert_eq!(
        draft.platforms().iter().cloned().collect::<Vec<_>>(),
        vec![instagram()]
    );
    assert_eq!(draft.valid_accounts(&twitter()).count(), 0);
    assert_eq!(draft.valid_accounts(&instagram()).count(), 1);
}
