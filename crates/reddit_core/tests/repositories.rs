use reddit_core::db::migrations::latest_version;
use reddit_core::db::open_db_in_memory;
use reddit_core::{
    EntityKind, NewPost, NewSubreddit, NewUser, PostRepository, RepoError, SqlitePostRepository,
    SqliteSubredditRepository, SqliteUserRepository, Subreddit, SubredditRepository, User,
    UserRepository, ValidationError,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

#[test]
fn subreddit_save_and_find_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let repo = SqliteSubredditRepository::try_new(&conn).unwrap();

    let new_subreddit = NewSubreddit::new("rust", "All about crabs", alice.id);
    let saved = repo.save(&new_subreddit).unwrap();
    assert_eq!(saved.id, new_subreddit.id);
    assert_eq!(saved.name, "rust");
    assert_eq!(saved.description, "All about crabs");
    assert_eq!(saved.owner_id, alice.id);
    assert!(saved.created_at > 0);
    assert!(saved.post_ids.is_empty());

    let by_id = repo.find_by_id(saved.id).unwrap().unwrap();
    assert_eq!(by_id, saved);
    let by_name = repo.find_by_name("rust").unwrap().unwrap();
    assert_eq!(by_name.id, saved.id);
    assert!(repo.find_by_name("Rust").unwrap().is_none());
    assert!(repo.find_by_id(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn subreddit_save_rejects_duplicate_name() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let repo = SqliteSubredditRepository::try_new(&conn).unwrap();

    repo.save(&NewSubreddit::new("rust", "first", alice.id))
        .unwrap();
    let err = repo
        .save(&NewSubreddit::new("rust", "second", alice.id))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn subreddit_save_validates_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let repo = SqliteSubredditRepository::try_new(&conn).unwrap();

    let err = repo
        .save(&NewSubreddit::new("   ", "desc", alice.id))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankSubredditName)
    ));
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn subreddit_save_requires_existing_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSubredditRepository::try_new(&conn).unwrap();

    let err = repo
        .save(&NewSubreddit::new("rust", "crabs", Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn find_all_lists_in_creation_order_with_post_collections() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let first = create_subreddit(&conn, "first", alice.id);
    let second = create_subreddit(&conn, "second", alice.id);
    set_created_at(&conn, "subreddits", first.id, 2_000);
    set_created_at(&conn, "subreddits", second.id, 1_000);

    let post_a = create_post(&conn, "a", alice.id, first.id);
    let post_b = create_post(&conn, "b", alice.id, first.id);
    set_created_at(&conn, "posts", post_a, 20);
    set_created_at(&conn, "posts", post_b, 10);

    let repo = SqliteSubredditRepository::try_new(&conn).unwrap();
    let all = repo.find_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.id);
    assert_eq!(all[1].id, first.id);
    assert_eq!(all[1].post_ids, vec![post_b, post_a]);
    assert_eq!(all[1].post_count(), count_posts(&conn, first.id));
    assert_eq!(all[0].post_count(), 0);
}

#[test]
fn listings_follow_insertion_order_within_same_millisecond() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let subreddit_repo = SqliteSubredditRepository::try_new(&conn).unwrap();
    let post_repo = SqlitePostRepository::try_new(&conn).unwrap();

    let mut expected_subreddits = Vec::new();
    for round in 0..20 {
        let subreddit = create_subreddit(&conn, &format!("sub{round}"), alice.id);
        let first = create_post(&conn, "first", alice.id, subreddit.id);
        let second = create_post(&conn, "second", alice.id, subreddit.id);

        let posts = post_repo.find_all_by_subreddit(subreddit.id).unwrap();
        let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![first, second], "round {round}");
        assert!(posts[0].created_at <= posts[1].created_at);

        let loaded = subreddit_repo.find_by_id(subreddit.id).unwrap().unwrap();
        assert_eq!(loaded.post_ids, vec![first, second], "round {round}");
        expected_subreddits.push(subreddit.id);
    }

    let listed: Vec<Uuid> = subreddit_repo
        .find_all()
        .unwrap()
        .into_iter()
        .map(|subreddit| subreddit.id)
        .collect();
    assert_eq!(listed, expected_subreddits);
}

#[test]
fn created_at_is_stamped_in_epoch_milliseconds() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let rust = create_subreddit(&conn, "rust", alice.id);

    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    for created_at in [alice.created_at, rust.created_at] {
        assert!((now_ms - created_at).abs() < 60_000, "created_at={created_at}");
    }
}

#[test]
fn post_save_joins_author_and_subreddit_names() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let rust = create_subreddit(&conn, "rust", alice.id);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let mut new_post = NewPost::new("Hello", alice.id, rust.id);
    new_post.url = Some("https://www.rust-lang.org".to_string());
    new_post.description = "first!".to_string();
    let saved = repo.save(&new_post).unwrap();

    assert_eq!(saved.id, new_post.id);
    assert_eq!(saved.author_name, "alice");
    assert_eq!(saved.subreddit_name, "rust");
    assert_eq!(saved.vote_count, 0);
    assert_eq!(saved.url.as_deref(), Some("https://www.rust-lang.org"));
    assert_eq!(repo.find_by_id(saved.id).unwrap(), Some(saved));
}

#[test]
fn post_listing_is_scoped_to_one_subreddit() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let rust = create_subreddit(&conn, "rust", alice.id);
    let go = create_subreddit(&conn, "golang", alice.id);
    let in_rust = create_post(&conn, "crab", alice.id, rust.id);
    create_post(&conn, "gopher", alice.id, go.id);

    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let posts = repo.find_all_by_subreddit(rust.id).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, in_rust);
    assert!(repo
        .find_all_by_subreddit(Uuid::new_v4())
        .unwrap()
        .is_empty());
}

#[test]
fn post_save_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let rust = create_subreddit(&conn, "rust", alice.id);
    let repo = SqlitePostRepository::try_new(&conn).unwrap();

    let err = repo
        .save(&NewPost::new(" ", alice.id, rust.id))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankPostName)
    ));
}

#[test]
fn user_lookup_by_username_ignores_case() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let found = repo.find_by_username("ALICE").unwrap().unwrap();
    assert_eq!(found.id, alice.id);
    assert!(repo.find_by_username("bob").unwrap().is_none());
}

#[test]
fn user_create_rejects_duplicate_username() {
    let conn = open_db_in_memory().unwrap();
    create_user(&conn, "alice");
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo
        .create_user(&NewUser::new("Alice", "other@example.com"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn user_save_syncs_membership_set() {
    let conn = open_db_in_memory().unwrap();
    let mut alice = create_user(&conn, "alice");
    let rust = create_subreddit(&conn, "rust", alice.id);
    let go = create_subreddit(&conn, "golang", alice.id);
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    alice.join(rust.id);
    alice.join(go.id);
    repo.save(&alice).unwrap();
    let loaded = repo.find_by_id(alice.id).unwrap().unwrap();
    assert_eq!(loaded.subreddits, alice.subreddits);

    alice.subreddits.remove(&go.id);
    repo.save(&alice).unwrap();
    let loaded = repo.find_by_id(alice.id).unwrap().unwrap();
    assert!(loaded.is_member_of(rust.id));
    assert!(!loaded.is_member_of(go.id));
    assert_eq!(membership_rows(&conn, alice.id), 1);
}

#[test]
fn user_save_rolls_back_partial_writes() {
    let conn = open_db_in_memory().unwrap();
    let mut alice = create_user(&conn, "alice");
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    alice.email = "changed@example.com".to_string();
    alice.join(Uuid::new_v4());
    let err = repo.save(&alice).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    let loaded = repo.find_by_id(alice.id).unwrap().unwrap();
    assert_eq!(loaded.email, "alice@example.com");
    assert!(loaded.subreddits.is_empty());
}

#[test]
fn user_save_unknown_user_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let mut ghost = create_user(&conn, "ghost");
    ghost.id = Uuid::new_v4();

    let err = repo.save(&ghost).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: EntityKind::User, id } if id == ghost.id
    ));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteSubredditRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteUserRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("users"))
    ));
}

fn create_user(conn: &Connection, username: &str) -> User {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&NewUser::new(username, format!("{username}@example.com")))
        .unwrap()
}

fn create_subreddit(conn: &Connection, name: &str, owner_id: Uuid) -> Subreddit {
    SqliteSubredditRepository::try_new(conn)
        .unwrap()
        .save(&NewSubreddit::new(name, format!("about {name}"), owner_id))
        .unwrap()
}

fn create_post(conn: &Connection, title: &str, author_id: Uuid, subreddit_id: Uuid) -> Uuid {
    SqlitePostRepository::try_new(conn)
        .unwrap()
        .save(&NewPost::new(title, author_id, subreddit_id))
        .unwrap()
        .id
}

fn set_created_at(conn: &Connection, table: &str, id: Uuid, created_at: i64) {
    conn.execute(
        &format!("UPDATE {table} SET created_at = ?1 WHERE uuid = ?2;"),
        params![created_at, id.to_string()],
    )
    .unwrap();
}

fn count_posts(conn: &Connection, subreddit_id: Uuid) -> usize {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM posts WHERE subreddit_uuid = ?1;",
            [subreddit_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    usize::try_from(count).unwrap()
}

fn membership_rows(conn: &Connection, user_id: Uuid) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM user_subreddits WHERE user_uuid = ?1;",
        [user_id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
