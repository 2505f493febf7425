//! End-to-end tests of the de-identified pipelines: log events, cross the
//! day boundary, generate observations, inspect the upload queue.

use chrono::Duration;
use cobalt_core::ObservationPayload;
use integration_tests::fixtures::{
    deid_report, occurrence_metric, registry, string_metric, string_report, Engine,
    DEID_REPORT_ID, OCCURRENCE_METRIC_ID, STRING_METRIC_ID, TODAY,
};

async fn occurrence_engine(event_vector_buffer_max: u64) -> Engine {
    Engine::new(registry(vec![occurrence_metric(vec![deid_report(
        event_vector_buffer_max,
    )])]))
    .await
}

#[tokio::test]
async fn two_events_one_profile_become_one_observation() {
    let engine = occurrence_engine(0).await;
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 3, vec![1, 5])
        .await
        .unwrap();
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 17, vec![2, 6])
        .await
        .unwrap();

    engine.clock.advance(Duration::days(1));
    engine.job.generate_observations().await.unwrap();

    let queued = engine.job.observations_to_send().await.unwrap();
    assert_eq!(queued.len(), 1);
    let batch = &queued[0].batch;
    assert_eq!(batch.day_index, TODAY);
    assert_eq!(batch.report_key.report_id, DEID_REPORT_ID);
    assert_eq!(batch.observation_count(), 1);

    let ObservationPayload::Integer(ref integer) = batch.observations[0].payload else {
        panic!("expected an integer payload");
    };
    let mut pairs: Vec<(Vec<u32>, i64)> = integer
        .values
        .iter()
        .map(|v| (v.event_codes.clone(), v.value))
        .collect();
    pairs.sort();
    assert_eq!(pairs, vec![(vec![1, 5], 3), (vec![2, 6], 17)]);
}

#[tokio::test]
async fn repeated_events_merge_into_one_count() {
    let engine = occurrence_engine(0).await;
    for _ in 0..5 {
        engine
            .logger
            .log_occurrence(OCCURRENCE_METRIC_ID, 2, vec![1, 5])
            .await
            .unwrap();
    }

    engine.clock.advance(Duration::days(1));
    engine.job.generate_observations().await.unwrap();

    let queued = engine.job.observations_to_send().await.unwrap();
    let ObservationPayload::Integer(ref integer) = queued[0].batch.observations[0].payload else {
        panic!("expected an integer payload");
    };
    assert_eq!(integer.values.len(), 1);
    assert_eq!(integer.values[0].value, 10);
}

#[tokio::test]
async fn event_vector_buffer_cap_drops_only_new_vectors() {
    let engine = occurrence_engine(1).await;
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 1, vec![1, 5])
        .await
        .unwrap();
    // Second distinct vector exceeds the cap of 1 and is dropped.
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 1, vec![2, 6])
        .await
        .unwrap();
    // The stored vector keeps aggregating.
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 4, vec![1, 5])
        .await
        .unwrap();

    assert_eq!(engine.op_logger.event_vector_exceeded_count(), 1);

    engine.clock.advance(Duration::days(1));
    engine.job.generate_observations().await.unwrap();

    let queued = engine.job.observations_to_send().await.unwrap();
    let ObservationPayload::Integer(ref integer) = queued[0].batch.observations[0].payload else {
        panic!("expected an integer payload");
    };
    assert_eq!(integer.values.len(), 1);
    assert_eq!(integer.values[0].event_codes, vec![1, 5]);
    assert_eq!(integer.values[0].value, 5);
}

#[tokio::test]
async fn string_events_become_a_compacted_histogram() {
    let engine = Engine::new(registry(vec![string_metric(vec![string_report(0)])])).await;
    for value in ["com.example.app", "com.example.app", "com.other.app"] {
        engine
            .logger
            .log_string(STRING_METRIC_ID, value, vec![])
            .await
            .unwrap();
    }

    engine.clock.advance(Duration::days(1));
    engine.job.generate_observations().await.unwrap();

    let queued = engine.job.observations_to_send().await.unwrap();
    assert_eq!(queued.len(), 1);
    let ObservationPayload::StringHistogram(ref histogram) =
        queued[0].batch.observations[0].payload
    else {
        panic!("expected a string histogram payload");
    };
    assert_eq!(histogram.string_hashes_ff64.len(), 2);
    assert_eq!(histogram.string_histograms.len(), 1);
    let mut counts = histogram.string_histograms[0].bucket_counts.clone();
    counts.sort();
    assert_eq!(counts, vec![1, 2]);
}

#[tokio::test]
async fn string_buffer_cap_drops_new_strings() {
    let engine = Engine::new(registry(vec![string_metric(vec![string_report(1)])])).await;
    engine
        .logger
        .log_string(STRING_METRIC_ID, "kept", vec![])
        .await
        .unwrap();
    engine
        .logger
        .log_string(STRING_METRIC_ID, "dropped", vec![])
        .await
        .unwrap();
    assert_eq!(engine.op_logger.string_exceeded_count(), 1);
}

#[tokio::test]
async fn disabled_logger_produces_no_observations() {
    let engine = occurrence_engine(0).await;
    engine.logger.set_enabled(false).await.unwrap();
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 1, vec![1, 5])
        .await
        .unwrap();

    engine.clock.advance(Duration::days(1));
    engine.logger.set_enabled(true).await.unwrap();
    engine.job.generate_observations().await.unwrap();
    assert!(engine.job.observations_to_send().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_queue_round_trip() {
    let engine = occurrence_engine(0).await;
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 1, vec![1, 5])
        .await
        .unwrap();
    engine.clock.advance(Duration::days(1));
    engine.job.generate_observations().await.unwrap();

    let queued = engine.job.observations_to_send().await.unwrap();
    assert_eq!(queued.len(), 1);
    engine.job.mark_sent(&[queued[0].id]).await.unwrap();
    assert!(engine.job.observations_to_send().await.unwrap().is_empty());

    // A second pass for the same day generates nothing new.
    engine.job.generate_observations().await.unwrap();
    assert!(engine.job.observations_to_send().await.unwrap().is_empty());
}

#[tokio::test]
async fn cleanup_prunes_reports_dropped_from_the_registry() {
    let engine = occurrence_engine(0).await;
    engine
        .logger
        .log_occurrence(OCCURRENCE_METRIC_ID, 1, vec![1, 5])
        .await
        .unwrap();

    // A job wired with an empty registry considers every report stale.
    let empty_job = cobalt::CobaltPeriodicJob::new(
        engine.data_service.clone(),
        registry(vec![]),
        cobalt_observations::ObservationGeneratorFactory::new(
            integration_tests::fixtures::device_profile(),
        ),
        engine.clock.clone(),
        30,
    );
    empty_job.cleanup().await.unwrap();

    engine.clock.advance(Duration::days(1));
    engine.job.generate_observations().await.unwrap();
    assert!(engine.job.observations_to_send().await.unwrap().is_empty());
}
