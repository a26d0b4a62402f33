use postledger_core::{Address, Post, RegistryEvent};

fn owner() -> Address {
    Address::parse("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266").unwrap()
}

#[test]
fn post_new_starts_unpublished() {
    let post = Post::new(1, "hello", "cid", owner());

    assert_eq!(post.id, 1);
    assert_eq!(post.title, "hello");
    assert_eq!(post.content_hash, "cid");
    assert!(!post.published);
    assert_eq!(post.author, owner());
}

#[test]
fn post_serialization_uses_expected_wire_fields() {
    let mut post = Post::new(3, "My first post", "12345", owner());
    post.published = true;

    let json = serde_json::to_value(&post).unwrap();
    assert_eq!(json["id"], 3);
    assert_eq!(json["title"], "My first post");
    assert_eq!(json["content_hash"], "12345");
    assert_eq!(json["published"], true);
    assert_eq!(json["author"], "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    let decoded: Post = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, post);
}

#[test]
fn deserialize_rejects_malformed_author() {
    let value = serde_json::json!({
        "id": 1,
        "title": "t",
        "content_hash": "h",
        "published": false,
        "author": "not-an-address"
    });

    let err = serde_json::from_value::<Post>(value).unwrap_err();
    assert!(
        err.to_string().contains("40 hex digits"),
        "unexpected error: {err}"
    );
}

#[test]
fn events_serialize_with_snake_case_tag() {
    let created = RegistryEvent::PostCreated {
        id: 1,
        title: "t".to_string(),
        content_hash: "h".to_string(),
    };
    let json = serde_json::to_value(&created).unwrap();
    assert_eq!(json["event"], "post_created");
    assert_eq!(json["id"], 1);
    assert_eq!(json["content_hash"], "h");

    let updated = RegistryEvent::PostUpdated {
        id: 2,
        title: "t".to_string(),
        content_hash: "h".to_string(),
        published: true,
    };
    let json = serde_json::to_value(&updated).unwrap();
    assert_eq!(json["event"], "post_updated");
    assert_eq!(json["published"], true);
}
