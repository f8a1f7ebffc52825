/// Reconciliation engine tests
///
/// Tests cover:
/// - One record per distinct valid person key, first occurrence wins
/// - Rejects for unusable keys and names, never grouped
/// - Create / update / skip against a loaded snapshot
/// - Dry-run summary counts
mod utils;

use clinic_import::modules::reconciliation::domain::{
    INVALID_NAME, INVALID_ORGANIZATION_IDENTIFIER, INVALID_PERSON_IDENTIFIER,
};
use clinic_import::modules::reconciliation::{
    ExistingEntitySnapshot, ReconciliationEngine, ReconciliationOutcome, SnapshotReader,
};
use clinic_import::modules::records::{CandidateRecord, ReconcileAction, ResultStatus};
use std::collections::HashSet;
use utils::doubles::InMemoryEntityStore;
use utils::clinic_id;
use utils::factories::{CandidateFactory, GLOBEX_KEY};

const ACME: &str = "11111111000111";
const GLOBEX: &str = "22222222000122";

async fn reconcile(
    store: &InMemoryEntityStore,
    candidates: Vec<CandidateRecord>,
) -> (ReconciliationOutcome, ExistingEntitySnapshot) {
    let (person_keys, org_keys) = ReconciliationEngine::snapshot_keys(&candidates);
    let snapshot = store
        .load_snapshot(clinic_id(), &person_keys, &org_keys)
        .await
        .unwrap();
    (ReconciliationEngine::reconcile(candidates, &snapshot), snapshot)
}

#[tokio::test]
async fn every_candidate_is_accounted_for() {
    let store = InMemoryEntityStore::new();
    store.seed_employer(ACME, "Acme Comércio");
    store.seed_member("00000000002", ACME, Some("Acme Comércio"), true);

    let mut candidates = CandidateFactory::many(6);
    candidates.push(CandidateFactory::numbered(0).org("Globex", GLOBEX_KEY).build());
    candidates.push(CandidateFactory::new().person("Bo", "999.888.777-66").build());
    candidates.push(CandidateFactory::new().person("Sem Documento", "").build());

    let total = candidates.len();
    let (outcome, _) = reconcile(&store, candidates).await;

    assert_eq!(outcome.total_records, total);
    assert_eq!(outcome.records.len() + outcome.duplicates_dropped, total);
    assert_eq!(outcome.duplicates_dropped, 1);

    let valid_keys: Vec<_> = outcome
        .records
        .iter()
        .filter(|r| r.action != ReconcileAction::Reject)
        .map(|r| r.canonical_person_key.clone())
        .collect();
    let distinct: HashSet<_> = valid_keys.iter().collect();
    assert_eq!(distinct.len(), valid_keys.len());

    // nothing has executed yet
    assert!(outcome
        .records
        .iter()
        .all(|r| r.result_status == ResultStatus::Pending && r.entity_id.is_none()));
}

#[tokio::test]
async fn first_occurrence_of_a_person_wins() {
    let store = InMemoryEntityStore::new();
    let candidates = vec![
        CandidateFactory::new().role("Caixa").build(),
        CandidateFactory::numbered(7).build(),
        CandidateFactory::new()
            .person("Ana S. Souza", "11122233344")
            .org("Globex", GLOBEX_KEY)
            .role("Gerente")
            .build(),
    ];

    let (outcome, _) = reconcile(&store, candidates).await;

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.duplicates_dropped, 1);
    let ana = &outcome.records[0];
    assert_eq!(ana.canonical_person_key, "11122233344");
    assert_eq!(ana.canonical_org_key, ACME);
    assert_eq!(ana.candidate.role.as_deref(), Some("Caixa"));
    assert_eq!(ana.action, ReconcileAction::Create);
}

#[tokio::test]
async fn unusable_person_keys_are_rejected_one_by_one() {
    let store = InMemoryEntityStore::new();
    let candidates = vec![
        CandidateFactory::new().person("Carla Dias", "123").build(),
        CandidateFactory::new().person("Davi Reis", "123").build(),
        CandidateFactory::new().person("Eva Luz", "").build(),
    ];

    let (outcome, _) = reconcile(&store, candidates).await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.duplicates_dropped, 0);
    for record in &outcome.records {
        assert_eq!(record.action, ReconcileAction::Reject);
        assert_eq!(record.error_message.as_deref(), Some(INVALID_PERSON_IDENTIFIER));
    }
}

#[tokio::test]
async fn rules_apply_in_order() {
    let store = InMemoryEntityStore::new();
    let candidates = vec![
        // bad person key and bad org key: the person rule fires first
        CandidateFactory::new().person("Fábio Melo", "12").org("X", "99").build(),
        CandidateFactory::numbered(1).org("Acme", "11.111.111/0001").build(),
        CandidateFactory::numbered(2).person("Jo", "00000000003").build(),
        CandidateFactory::numbered(3).person("   Li  ", "00000000004").build(),
    ];

    let (outcome, _) = reconcile(&store, candidates).await;
    let messages: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.error_message.as_deref())
        .collect();

    assert_eq!(
        messages,
        vec![
            Some(INVALID_PERSON_IDENTIFIER),
            Some(INVALID_ORGANIZATION_IDENTIFIER),
            Some(INVALID_NAME),
            Some(INVALID_NAME),
        ]
    );
}

#[tokio::test]
async fn known_members_update_or_skip() {
    let store = InMemoryEntityStore::new();
    store.seed_employer(ACME, "Acme Comércio");
    let moved = store.seed_member("00000000001", GLOBEX, Some("Globex"), true);
    let unflagged = store.seed_member("00000000002", ACME, Some("Acme Comércio"), false);
    let unnamed = store.seed_member("00000000003", ACME, Some("  "), true);
    let settled = store.seed_member("00000000004", ACME, Some("Acme Comércio"), true);

    let candidates = CandidateFactory::many(5);
    let (outcome, _) = reconcile(&store, candidates).await;

    let actions: Vec<_> = outcome
        .records
        .iter()
        .map(|r| (r.action, r.matched_entity_id))
        .collect();
    assert_eq!(
        actions,
        vec![
            (ReconcileAction::Update, Some(moved)),
            (ReconcileAction::Update, Some(unflagged)),
            (ReconcileAction::Update, Some(unnamed)),
            (ReconcileAction::Skip, Some(settled)),
            (ReconcileAction::Create, None),
        ]
    );
}

#[tokio::test]
async fn summary_counts_new_organizations_once() {
    let store = InMemoryEntityStore::new();
    store.seed_employer(ACME, "Acme Comércio");
    store.seed_member("00000000001", ACME, Some("Acme Comércio"), true);

    let candidates = vec![
        CandidateFactory::numbered(0).build(),
        CandidateFactory::numbered(1).org("Globex", GLOBEX_KEY).build(),
        CandidateFactory::numbered(2).org("Globex", GLOBEX_KEY).build(),
        CandidateFactory::numbered(3).org("Initech", "33.333.333/0001-33").build(),
        CandidateFactory::numbered(4)
            .person("Al", "00000000005")
            .org("Umbrella", "44.444.444/0001-44")
            .build(),
        CandidateFactory::numbered(2).build(),
    ];

    let (outcome, snapshot) = reconcile(&store, candidates).await;
    let summary = ReconciliationEngine::summarize(&outcome, &snapshot);

    assert_eq!(summary.total_records, 6);
    assert_eq!(summary.to_create, 3);
    assert_eq!(summary.to_update, 0);
    assert_eq!(summary.to_skip, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.duplicates_dropped, 1);
    // Globex and Initech; the rejected record's organization does not count
    assert_eq!(summary.new_organizations, 2);
    assert_eq!(
        outcome.new_org_keys(&snapshot),
        vec![GLOBEX.to_string(), "33333333000133".to_string()]
    );
}

#[test]
fn snapshot_keys_are_canonical_and_distinct() {
    let candidates = vec![
        CandidateFactory::new().build(),
        CandidateFactory::new().person("Ana", "11122233344").org("Acme", ACME).build(),
        CandidateFactory::new().person("Sem Documento", "12.3").build(),
    ];

    let (person_keys, org_keys) = ReconciliationEngine::snapshot_keys(&candidates);

    assert_eq!(person_keys, vec!["11122233344".to_string()]);
    assert_eq!(org_keys, vec![ACME.to_string()]);
}
