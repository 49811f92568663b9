use serial_test::serial;
use tagorm::{
    global_registry, register_models, reset_model_cache, LifecycleError, Model, ModelRegistry,
    OrmError, RegistrationError, RelationKind,
};

tagorm::model! {
    #[derive(Debug, Default)]
    pub struct User {
        pub id: i64,
        #[orm("size(30);unique")]
        pub name: String,
        #[orm("reverse(many)")]
        pub posts: Vec<Post>,
    }
}

tagorm::model! {
    #[derive(Debug)]
    pub struct Post {
        pub id: i64,
        #[orm("size(100)")]
        pub title: String,
        #[orm("rel(fk)")]
        pub author: Box<User>,
    }
}

tagorm::model! {
    pub struct Member {
        pub id: i64,
        #[orm("rel(m2m)")]
        pub roles: Vec<Role>,
    }
}

tagorm::model! {
    pub struct Role {
        pub id: i32,
        #[orm("size(20)")]
        pub name: String,
    }
}

tagorm::model! {
    pub struct Writer {
        pub id: i64,
    }
}

tagorm::model! {
    pub struct Article {
        pub id: i64,
        #[orm("rel(fk)")]
        pub author: Box<Writer>,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_user_post_foreign_key_pairing() {
    init_tracing();
    let registry = ModelRegistry::new();
    register_models!(registry => User, Post).unwrap();
    let summary = registry.bootstrap().unwrap();
    assert_eq!(summary.models, 2);
    assert_eq!(summary.reverse_fields, 0);

    let view = registry.view();
    let user = view.get_by_type::<User>().unwrap();
    let post = view.get_by_type::<Post>().unwrap();
    assert_eq!(user.table, "user");
    assert_eq!(post.table, "post");

    let author = post.fields.get("author").unwrap();
    assert_eq!(author.relation, RelationKind::ForeignKey);
    assert_eq!(author.column, "author_id");
    assert_eq!(author.related_model, Some(user.id));

    let posts = user.fields.get("posts").unwrap();
    assert_eq!(posts.relation, RelationKind::ReverseMany);
    let paired = posts.paired_field().unwrap();
    assert_eq!(view.field(paired.id).unwrap().full_name, author.full_name);
    assert_eq!(author.paired_field().unwrap().name, "posts");
}

#[test]
fn test_foreign_key_synthesizes_reverse_many() {
    init_tracing();
    let registry = ModelRegistry::new();
    register_models!(registry => Writer, Article).unwrap();
    let summary = registry.bootstrap().unwrap();
    assert_eq!(summary.reverse_fields, 1);

    let view = registry.view();
    let writer = view.get_by_type::<Writer>().unwrap();
    let article = view.get_by_type::<Article>().unwrap();

    let articles = writer.fields.get("article").unwrap();
    assert_eq!(articles.relation, RelationKind::ReverseMany);
    assert_eq!(articles.related_model, Some(article.id));
    assert!(!articles.in_model);
    assert!(!articles.db_col);

    let author = article.fields.get("author").unwrap();
    let forward = articles.reverse_field.as_ref().unwrap();
    assert_eq!(view.field(forward.id).unwrap().full_name, author.full_name);
    let back = author.reverse_field.as_ref().unwrap();
    assert_eq!(back.name, "article");
    assert_eq!(view.field(back.id).unwrap().full_name, articles.full_name);
}

#[test]
fn test_member_role_junction() {
    init_tracing();
    let registry = ModelRegistry::new();
    register_models!(registry => Member, Role).unwrap();
    let summary = registry.bootstrap().unwrap();
    assert_eq!(summary.junctions, 1);

    let view = registry.view();
    let tables: Vec<_> = view.all_ordered().map(|mi| mi.table.as_str()).collect();
    assert_eq!(tables, vec!["member", "role", "member_roles"]);

    let junction = view.get("member_roles").unwrap();
    assert!(junction.is_through);
    assert!(!junction.manual);
    assert_eq!(junction.through_unique, vec!["member_id", "role_id"]);

    let roles = view.get("member").unwrap().fields.get("roles").unwrap();
    assert_eq!(roles.through_model, Some(junction.id));
    let back = view.field(roles.paired_field().unwrap().id).unwrap();
    assert_eq!(back.relation, RelationKind::ReverseMany);
    assert_eq!(back.through_model, Some(junction.id));
}

#[test]
fn test_bootstrap_is_idempotent() {
    let registry = ModelRegistry::new();
    register_models!(registry => User, Post, Member, Role).unwrap();

    let first = registry.bootstrap().unwrap();
    let snapshot: Vec<_> = registry.view().all_ordered().cloned().collect();

    let second = registry.bootstrap().unwrap();
    let again: Vec<_> = registry.view().all_ordered().cloned().collect();
    assert_eq!(first, second);
    assert_eq!(snapshot, again);
}

#[test]
fn test_duplicate_table_keeps_registry_unchanged() {
    let registry = ModelRegistry::new();
    register_models!(registry => User).unwrap();

    let err = register_models!(registry => Role, User).unwrap_err();
    assert!(matches!(
        err,
        OrmError::Registration(RegistrationError::DuplicateModel { ref table, .. }) if table == "user"
    ));
    assert_eq!(registry.len(), 1);
    assert!(registry.view().get("role").is_none());
}

#[test]
fn test_registry_closed_after_bootstrap() {
    let registry = ModelRegistry::new();
    register_models!(registry => Role).unwrap();
    registry.bootstrap().unwrap();

    assert_eq!(
        registry.register_model::<User>().unwrap_err(),
        OrmError::Lifecycle(LifecycleError::RegistryClosed)
    );
}

#[test]
fn test_concurrent_readers() {
    let registry = ModelRegistry::new();
    register_models!(registry => User, Post, Member, Role).unwrap();
    registry.bootstrap().unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let view = registry.view();
                assert_eq!(view.len(), 5);
                assert!(view.get_by_type::<Post>().is_some());
                assert!(view.get("member_roles").is_some());
            });
        }
    });
}

#[test]
#[serial]
fn test_global_registry_flow() {
    reset_model_cache();
    register_models!(User, Post).unwrap();
    global_registry().bootstrap().unwrap();

    {
        let view = global_registry().view();
        assert_eq!(view.get_by_full_name(&User::describe().type_name).unwrap().table, "user");
    }

    reset_model_cache();
    assert!(global_registry().is_empty());
    assert!(!global_registry().is_bootstrapped());
}
