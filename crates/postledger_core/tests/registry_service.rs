use postledger_core::db::{open_db, open_db_in_memory};
use postledger_core::{
    Address, PostLookup, RegistryError, RegistryEvent, RegistryService, ServiceError,
};
use rusqlite::Connection;

fn owner() -> Address {
    Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap()
}

fn stranger() -> Address {
    Address::parse("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap()
}

fn deployed(conn: &mut Connection) -> RegistryService<'_, Vec<RegistryEvent>> {
    let mut service = RegistryService::new(conn, Vec::new());
    service.deploy("My blog", owner()).unwrap();
    service
}

fn assert_unauthorized(err: ServiceError) {
    assert!(
        matches!(err, ServiceError::Registry(RegistryError::Unauthorized { .. })),
        "unexpected error: {err}"
    );
    assert_eq!(err.code(), "unauthorized");
}

#[test]
fn should_create_a_post() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    service
        .create_post(&owner(), "My first post", "12345")
        .unwrap();

    let posts = service.fetch_posts().unwrap();
    assert_eq!(posts[0].title, "My first post");
    assert_eq!(posts[0].id, 1);
    assert!(!posts[0].published);
    assert_eq!(posts[0].author, owner());
}

#[test]
fn should_update_the_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    assert_eq!(service.name().unwrap(), "My blog");
    service.rename(&owner(), "My new blog").unwrap();
    assert_eq!(service.name().unwrap(), "My new blog");
}

#[test]
fn rename_by_non_owner_fails_and_keeps_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    assert_unauthorized(service.rename(&stranger(), "My new blog").unwrap_err());
    assert_eq!(service.name().unwrap(), "My blog");
}

#[test]
fn should_edit_a_post_by_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);
    service.create_post(&owner(), "My first post", "12345").unwrap();
    service.create_post(&owner(), "My Second post", "67890").unwrap();

    let updated = service
        .update_post(&owner(), 1, "My updated post", "23456", true)
        .unwrap();
    assert_eq!(updated.id, 1);

    let posts = service.fetch_posts().unwrap();
    assert_eq!(posts[0].title, "My updated post");
    assert_eq!(posts[0].content_hash, "23456");
    assert!(posts[0].published);
    assert_eq!(posts[1].title, "My Second post");
    assert_eq!(posts[1].content_hash, "67890");
    assert!(!posts[1].published);
}

#[test]
fn fetch_post_by_hash_finds_matching_post() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);
    service.create_post(&owner(), "TESTING!", "12345").unwrap();

    let post = service.fetch_post_by_hash("12345").unwrap();
    assert_eq!(post.title, "TESTING!");

    let err = service.fetch_post_by_hash("99999").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Registry(RegistryError::NotFound(PostLookup::ContentHash(ref hash))) if hash == "99999"
    ));
}

#[test]
fn ids_are_sequential_from_one() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    for index in 0..5 {
        service
            .create_post(&owner(), format!("post {index}"), format!("hash-{index}"))
            .unwrap();
    }

    let ids: Vec<u64> = service
        .fetch_posts()
        .unwrap()
        .iter()
        .map(|post| post.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(service.fetch_post(3).unwrap().title, "post 2");
}

#[test]
fn update_unknown_id_fails_and_leaves_posts_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);
    service.create_post(&owner(), "only", "111").unwrap();
    let before = service.fetch_posts().unwrap();

    let err = service
        .update_post(&owner(), 2, "ghost", "000", true)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Registry(RegistryError::NotFound(PostLookup::Id(2)))
    ));
    assert_eq!(err.code(), "not_found");
    assert_eq!(service.fetch_posts().unwrap(), before);
}

#[test]
fn non_owner_mutations_fail_without_state_change_or_events() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);
    service.create_post(&owner(), "mine", "111").unwrap();
    let before = service.registry().unwrap();
    let events_before = service.sink().len();

    assert_unauthorized(service.create_post(&stranger(), "t", "h").unwrap_err());
    assert_unauthorized(
        service
            .update_post(&stranger(), 1, "t", "h", true)
            .unwrap_err(),
    );
    assert_unauthorized(service.rename(&stranger(), "hijacked").unwrap_err());
    assert_unauthorized(
        service
            .transfer_ownership(&stranger(), stranger())
            .unwrap_err(),
    );

    assert_eq!(service.registry().unwrap(), before);
    assert_eq!(service.sink().len(), events_before);
}

#[test]
fn transfer_ownership_hands_over_mutation_rights() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    service.transfer_ownership(&owner(), stranger()).unwrap();
    assert_eq!(service.owner().unwrap(), stranger());

    assert_unauthorized(service.rename(&owner(), "old owner").unwrap_err());
    service.rename(&stranger(), "new owner").unwrap();
    let post = service.create_post(&stranger(), "t", "h").unwrap();
    assert_eq!(post.author, stranger());
}

#[test]
fn events_reach_sink_in_commit_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    service.create_post(&owner(), "draft", "111").unwrap();
    service
        .update_post(&owner(), 1, "final", "222", true)
        .unwrap();
    service.rename(&owner(), "renamed").unwrap();

    let events = service.into_sink();
    assert_eq!(
        events,
        vec![
            RegistryEvent::PostCreated {
                id: 1,
                title: "draft".to_string(),
                content_hash: "111".to_string(),
            },
            RegistryEvent::PostUpdated {
                id: 1,
                title: "final".to_string(),
                content_hash: "222".to_string(),
                published: true,
            },
        ]
    );
}

#[test]
fn fetch_posts_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);
    service.create_post(&owner(), "a", "1").unwrap();
    service.create_post(&owner(), "b", "2").unwrap();

    assert_eq!(service.fetch_posts().unwrap(), service.fetch_posts().unwrap());
}

#[test]
fn operations_before_deploy_report_not_deployed() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RegistryService::new(&mut conn, Vec::new());

    assert!(matches!(service.registry().unwrap_err(), ServiceError::NotDeployed));
    let err = service.create_post(&owner(), "t", "h").unwrap_err();
    assert!(matches!(err, ServiceError::NotDeployed));
    assert!(service.sink().is_empty());
}

#[test]
fn second_deploy_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = deployed(&mut conn);

    let err = service.deploy("Another blog", stranger()).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyDeployed));
    assert_eq!(service.name().unwrap(), "My blog");
    assert_eq!(service.owner().unwrap(), owner());
}

#[test]
fn failed_write_rolls_back_partial_changes() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut service = deployed(&mut conn);
        service.create_post(&owner(), "one", "111").unwrap();
    }
    // The trigger fails the insert of post 2 after the aggregate accepted it.
    conn.execute_batch(
        "CREATE TRIGGER block_second_post BEFORE INSERT ON posts
         WHEN NEW.id = 2
         BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
    )
    .unwrap();

    let mut service = RegistryService::new(&mut conn, Vec::new());
    let err = service.create_post(&owner(), "two", "222").unwrap_err();
    assert_eq!(err.code(), "storage");
    assert!(service.sink().is_empty());
    assert_eq!(service.fetch_posts().unwrap().len(), 1);
}

#[test]
fn registry_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("postledger.sqlite3");

    let deployed_id = {
        let mut conn = open_db(&path).unwrap();
        let mut service = RegistryService::new(&mut conn, Vec::new());
        let registry = service.deploy("NEW BLOG!!", owner()).unwrap();
        service.create_post(&owner(), "persisted", "cid").unwrap();
        registry.registry_id()
    };

    let mut conn = open_db(&path).unwrap();
    let service = RegistryService::new(&mut conn, Vec::new());
    let registry = service.registry().unwrap();
    assert_eq!(registry.registry_id(), deployed_id);
    assert_eq!(registry.name(), "NEW BLOG!!");
    assert_eq!(registry.fetch_by_hash("cid").unwrap().title, "persisted");
}
