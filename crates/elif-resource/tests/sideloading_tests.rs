//! End-to-end sideloading tests
//!
//! These tests render a small blog graph (posts, authors, comments, tags)
//! and verify:
//! - full vs identifier field selection driven by `include`
//! - condition gating
//! - nested collection pagination
//! - absent singular associations
//! - redeclaration semantics
//! - cycle and depth handling

use elif_resource::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn comment(id: u64) -> Arc<dyn Entity> {
    Record::new("Comment", id)
        .with_attribute("body", format!("comment {}", id))
        .into_shared()
}

fn author() -> Arc<dyn Entity> {
    Record::new("Author", 10)
        .with_attribute("name", "Ada")
        .with_many("posts", vec![Record::new("Post", 1).into_shared()])
        .into_shared()
}

fn post() -> Record {
    Record::new("Post", 1)
        .with_attribute("title", "Sideloading")
        .with_one("author", author())
        .with_none("editor")
        .with_many("comments", (1..=5).map(comment).collect())
        .with_many(
            "tags",
            vec![
                Record::new("Tag", "rust").with_attribute("label", "Rust").into_shared(),
                Record::new("Tag", "api").with_attribute("label", "API").into_shared(),
            ],
        )
}

fn is_admin(_: &ConditionContext<'_>, options: &UserOptions) -> ResourceResult<bool> {
    Ok(options
        .current_user()
        .and_then(|user| user.get("admin"))
        .and_then(Value::as_bool)
        .unwrap_or(false))
}

fn post_representer() -> Representer {
    Representer::new("Post")
        .property("id")
        .property("title")
        .belongs_to("author", AssociationOptions::new().expose_identifier(true))
        .unwrap()
        .belongs_to(
            "editor",
            AssociationOptions::new()
                .expose_identifier(true)
                .with_target("Author"),
        )
        .unwrap()
        .has_many("comments", AssociationOptions::new().expose_identifier(true))
        .unwrap()
        .has_and_belongs_to_many("tags", AssociationOptions::new())
        .unwrap()
        .has_many(
            "moderation",
            AssociationOptions::new()
                .with_accessor("comments")
                .with_target("ModeratedComment")
                .expose_identifier(true)
                .with_condition(is_admin),
        )
        .unwrap()
}

fn renderer() -> Renderer {
    let registry = RepresenterRegistry::new();
    registry.register(post_representer());
    registry.register(
        Representer::new("Author")
            .property("id")
            .property("name")
            .has_many("posts", AssociationOptions::new().expose_identifier(true))
            .unwrap(),
    );
    registry.register(Representer::new("Comment").property("id").property("body"));
    registry.register(
        Representer::new("ModeratedComment")
            .property("id")
            .computed("flagged", |_, _| Ok(json!(false))),
    );
    registry.register(Representer::new("Tag").property("id").property("label"));
    registry.validate().unwrap();

    Renderer::new(registry)
        .with_config(ResourceConfig::new().with_per_page(2))
        .unwrap()
}

fn render(query: &str) -> Value {
    let renderer = renderer();
    let options = renderer.options_from_query(query).unwrap();
    renderer.render(&post(), &options).unwrap()
}

#[test]
fn test_identifiers_by_default() {
    let output = render("");

    assert_eq!(output["comment_ids"], json!([1, 2, 3, 4, 5]));
    assert!(output.get("comments").is_none());
    assert_eq!(output["author_id"], json!(10));
    assert!(output.get("author").is_none());
}

#[test]
fn test_included_collection_is_embedded() {
    let output = render("include=comments");

    let comments = output["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 5);
    assert_eq!(comments[0], json!({"id": 1, "body": "comment 1"}));
    assert!(output.get("comment_ids").is_none());
}

#[test]
fn test_association_without_identifier_is_omitted() {
    let output = render("");
    assert!(output.get("tags").is_none());
    assert!(output.get("tag_ids").is_none());

    let output = render("include=tags");
    assert_eq!(
        output["tags"],
        json!([{"id": "rust", "label": "Rust"}, {"id": "api", "label": "API"}])
    );
}

#[test]
fn test_absent_singular_association() {
    let output = render("");
    assert_eq!(output.get("editor_id"), Some(&Value::Null));

    let output = render("include=editor");
    assert!(output.get("editor").is_none());
    assert!(output.get("editor_id").is_none());
}

#[test]
fn test_nested_pagination() {
    let output = render("include=comments&commentsPage=2");
    assert_eq!(
        output["comments"],
        json!([
            {"id": 3, "body": "comment 3"},
            {"id": 4, "body": "comment 4"}
        ])
    );

    let output = render("include=comments&commentsPage=3");
    assert_eq!(output["comments"], json!([{"id": 5, "body": "comment 5"}]));

    let output = render("include=comments&commentsPage=9");
    assert_eq!(output["comments"], json!([]));
}

#[test]
fn test_listing_page_params_do_not_break_render() {
    let output = render("include=comments&perPage=all&commentsPage=3");
    assert_eq!(output["comments"], json!([{"id": 5, "body": "comment 5"}]));

    let output = render("perPage=all");
    assert_eq!(output["comment_ids"], json!([1, 2, 3, 4, 5]));
}

#[test]
fn test_identifier_mode_ignores_pages() {
    let output = render("commentsPage=2");
    assert_eq!(output["comment_ids"], json!([1, 2, 3, 4, 5]));
}

#[test]
fn test_per_association_page_size() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Post")
            .has_many("comments", AssociationOptions::new().with_per_page(3))
            .unwrap(),
    );
    registry.register(Representer::new("Comment").property("id"));
    let renderer = Renderer::new(registry);

    let options = UserOptions::new().include("comments").with_page("comments", 2);
    let output = renderer.render(&post(), &options).unwrap();
    assert_eq!(output, json!({"comments": [{"id": 4}, {"id": 5}]}));
}

#[test]
fn test_conditions_gate_both_fields() {
    let output = render("include=moderation");
    assert!(output.get("moderation").is_none());
    assert!(output.get("moderation_ids").is_none());

    let renderer = renderer();
    let admin = UserOptions::new().with_current_user(json!({"id": 1, "admin": true}));
    let output = renderer.render(&post(), &admin).unwrap();
    assert_eq!(output["moderation_ids"], json!([1, 2, 3, 4, 5]));
    assert!(output.get("moderation").is_none());

    let output = renderer
        .render(&post(), &admin.clone().include("moderation"))
        .unwrap();
    assert_eq!(output["moderation"][0], json!({"id": 1, "flagged": false}));
    assert!(output.get("moderation_ids").is_none());
}

#[test]
fn test_fields_never_both_active() {
    let renderer = renderer();
    let queries = [
        "",
        "include=comments",
        "include=comments,comments",
        "include=comments&include=comments",
        "include=,comments,",
        "include=%20comments%20",
        "include=Comments",
        "include=comment_ids",
        "include=comments.author",
    ];

    for query in queries {
        let options = renderer.options_from_query(query).unwrap();
        let output = renderer.render(&post(), &options).unwrap();
        let full = output.get("comments").is_some();
        let ids = output.get("comment_ids").is_some();
        assert!(full ^ ids, "query {:?} produced full={} ids={}", query, full, ids);
    }
}

#[test]
fn test_rendering_is_idempotent() {
    let renderer = renderer();
    let options = renderer
        .options_from_query("include=author,comments,tags&commentsPage=2")
        .unwrap();
    let post = post();

    let first = renderer.to_json_string(&post, &options).unwrap();
    let second = renderer.to_json_string(&post, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_output_follows_declaration_order() {
    let output = render("include=author");
    let keys: Vec<&String> = output.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec!["id", "title", "author", "editor_id", "comment_ids"]
    );
}

#[test]
fn test_redeclaration_last_wins() {
    let representer = Representer::new("Post")
        .has_many("comments", AssociationOptions::new().expose_identifier(true))
        .unwrap()
        .has_many(
            "comments",
            AssociationOptions::new().with_condition(|_, options| {
                Ok(options.attribute("show_comments") == Some(&json!(true)))
            }),
        )
        .unwrap();

    assert_eq!(representer.fields().for_association("comments").len(), 1);
    assert!(representer.fields().get("comment_ids").is_none());

    let registry = RepresenterRegistry::new();
    registry.register(representer);
    registry.register(Representer::new("Comment").property("id"));
    let renderer = Renderer::new(registry);

    // Second declaration: no identifier field, and gated by the new condition
    let output = renderer.render(&post(), &UserOptions::new()).unwrap();
    assert_eq!(output, json!({}));

    let output = renderer
        .render(&post(), &UserOptions::new().include("comments"))
        .unwrap();
    assert_eq!(output, json!({}));

    let options = UserOptions::new()
        .include("comments")
        .with_attribute("show_comments", true);
    let output = renderer.render(&post(), &options).unwrap();
    assert_eq!(output["comments"].as_array().unwrap().len(), 5);
}

#[test]
fn test_back_reference_emits_identifier() {
    let output = render("include=author,posts");

    // The author's post is the root post, already on the render stack
    assert_eq!(output["author"]["posts"], json!([1]));
    assert_eq!(output["author"]["name"], json!("Ada"));
}

#[test]
fn test_nested_identifiers_without_include() {
    let output = render("include=author");
    assert_eq!(output["author"], json!({"id": 10, "name": "Ada", "post_ids": [1]}));
}

struct Chain {
    depth: u64,
}

impl Entity for Chain {
    fn entity_type(&self) -> &str {
        "Chain"
    }

    fn identifier(&self) -> Value {
        json!(self.depth)
    }

    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    fn related(&self, accessor: &str) -> Option<Related> {
        match accessor {
            "next" => Some(Related::One(Some(Arc::new(Chain {
                depth: self.depth + 1,
            })))),
            _ => None,
        }
    }
}

#[test]
fn test_depth_limit() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Chain")
            .has_one("next", AssociationOptions::new())
            .unwrap(),
    );
    let renderer = Renderer::new(registry)
        .with_config(ResourceConfig::new().with_max_depth(3))
        .unwrap();

    let err = renderer
        .render(&Chain { depth: 0 }, &UserOptions::new().include("next"))
        .unwrap_err();
    assert!(matches!(err, ResourceError::DepthExceeded { max_depth: 3 }));

    let output = renderer
        .render(&Chain { depth: 0 }, &UserOptions::new())
        .unwrap();
    assert_eq!(output, json!({}));
}

#[test]
fn test_missing_accessor_fails_render() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Post")
            .has_many("reviews", AssociationOptions::new().expose_identifier(true))
            .unwrap(),
    );
    let renderer = Renderer::new(registry);

    let err = renderer.render(&post(), &UserOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        ResourceError::MissingAccessor { ref accessor, .. } if accessor == "reviews"
    ));
}

#[test]
fn test_missing_target_representer_fails_render() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Post")
            .has_many("comments", AssociationOptions::new())
            .unwrap(),
    );
    let renderer = Renderer::new(registry);

    let err = renderer
        .render(&post(), &UserOptions::new().include("comments"))
        .unwrap_err();
    assert!(matches!(
        err,
        ResourceError::MissingRepresenter { ref entity_type } if entity_type == "Comment"
    ));

    // Identifier mode never touches the target representer
    assert!(renderer.render(&post(), &UserOptions::new()).is_ok());
}

#[test]
fn test_nested_render_errors_propagate() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Post")
            .belongs_to("author", AssociationOptions::new())
            .unwrap(),
    );
    registry.register(
        Representer::new("Author")
            .computed("avatar", |entity, _| {
                Err(ResourceError::render(
                    entity.entity_type(),
                    "avatar service misconfigured",
                ))
            }),
    );
    let renderer = Renderer::new(registry);

    let err = renderer
        .render(&post(), &UserOptions::new().include("author"))
        .unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Render { ref entity_type, .. } if entity_type == "Author"
    ));
}

#[test]
fn test_condition_errors_propagate() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Post")
            .has_many(
                "comments",
                AssociationOptions::new()
                    .with_condition(|ctx, _| {
                        Err(ResourceError::condition(
                            ctx.association,
                            "policy store unreachable",
                        ))
                    }),
            )
            .unwrap(),
    );
    let renderer = Renderer::new(registry);

    let err = renderer
        .render(&post(), &UserOptions::new().include("comments"))
        .unwrap_err();
    assert!(matches!(err, ResourceError::ConditionEvaluation { .. }));
}

#[test]
fn test_condition_context() {
    let registry = RepresenterRegistry::new();
    registry.register(
        Representer::new("Post")
            .belongs_to("author", AssociationOptions::new())
            .unwrap(),
    );
    registry.register(
        Representer::new("Author")
            .property("name")
            .has_many(
                "posts",
                AssociationOptions::new()
                    .expose_identifier(true)
                    .with_condition(|ctx, _| Ok(ctx.depth == 0 && ctx.representer == "Author")),
            )
            .unwrap(),
    );
    let renderer = Renderer::new(registry);

    // Nested below a post the author is at depth 1, so its posts are hidden
    let output = renderer
        .render(&post(), &UserOptions::new().include("author"))
        .unwrap();
    assert_eq!(output, json!({"author": {"name": "Ada"}}));

    // Rendered on its own the author is the root
    let output = renderer.render(author().as_ref(), &UserOptions::new()).unwrap();
    assert_eq!(output, json!({"name": "Ada", "post_ids": [1]}));
}

#[test]
fn test_concurrent_renders_share_renderer() {
    let renderer = renderer();
    let post = post();

    std::thread::scope(|s| {
        let handles: Vec<_> = ["", "include=comments", "include=author,tags"]
            .into_iter()
            .map(|query| {
                let renderer = &renderer;
                let post = &post;
                s.spawn(move || {
                    let options = renderer.options_from_query(query).unwrap();
                    renderer.to_json_string(post, &options).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(!handle.join().unwrap().is_empty());
        }
    });
}
